use crate::domain::model::{EvaluationPeriod, EvaluationYear, StudentEvaluation, SubjectEvaluation};

/// 依 (年度, 學期) 排序並分組成巢狀報表；同一學期內同一科目只保留一筆。
///
/// 年度、學期與評量值一律以字串比較，因此 `"9"` 勝過 `"10"`。
pub fn sort_and_dedup(mut records: Vec<StudentEvaluation>) -> Vec<EvaluationYear> {
    // 穩定排序：同學期的科目維持首次出現的順序
    records.sort_by(|a, b| {
        (a.year.as_str(), a.period.as_str()).cmp(&(b.year.as_str(), b.period.as_str()))
    });

    let mut years: Vec<EvaluationYear> = Vec::new();
    for record in records {
        let year = current_group(
            &mut years,
            |y| y.year == record.year,
            || EvaluationYear {
                year: record.year.clone(),
                periods: Vec::new(),
            },
        );
        let period = current_group(
            &mut year.periods,
            |p| p.period == record.period,
            || EvaluationPeriod {
                period: record.period.clone(),
                evaluations: Vec::new(),
            },
        );

        keep_best(
            &mut period.evaluations,
            SubjectEvaluation {
                subject: record.subject_name,
                eval: record.eval_value,
            },
        );
    }

    years
}

/// 最後一個群組若不符合就開新群組，回傳目前群組
fn current_group<T>(
    groups: &mut Vec<T>,
    is_current: impl Fn(&T) -> bool,
    open: impl FnOnce() -> T,
) -> &mut T {
    if !groups.last().is_some_and(is_current) {
        groups.push(open());
    }
    let last = groups.len() - 1;
    &mut groups[last]
}

fn keep_best(evaluations: &mut Vec<SubjectEvaluation>, candidate: SubjectEvaluation) {
    match evaluations
        .iter_mut()
        .find(|existing| existing.subject == candidate.subject)
    {
        Some(existing) => {
            if candidate.eval > existing.eval {
                existing.eval = candidate.eval;
            }
        }
        None => evaluations.push(candidate),
    }
}
