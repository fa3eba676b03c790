use crate::domain::model::StudentEvaluation;
use crate::domain::ports::EvaluationStore;
use crate::utils::error::{RegError, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStage {
    Student,
    EvaluationLinks,
    EvaluationValue,
    MatriculatedSubject,
    Subject,
    SubjectName,
}

impl fmt::Display for LookupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LookupStage::Student => "student",
            LookupStage::EvaluationLinks => "evaluation_links",
            LookupStage::EvaluationValue => "evaluation_value",
            LookupStage::MatriculatedSubject => "matriculated_subject",
            LookupStage::Subject => "subject",
            LookupStage::SubjectName => "subject_name",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// 每個階段同時進行的查詢數上限
    pub concurrent_lookups: usize,
    pub lookup_timeout: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            concurrent_lookups: 4,
            lookup_timeout: Duration::from_secs(5),
        }
    }
}

/// 一筆評量在解析鏈中逐步補齊的欄位。
///
/// 每個階段都在同一個 draft 上填值，評量值與科目資料不靠陣列位置對齊。
#[derive(Debug, Clone, Default)]
struct EvaluationDraft {
    evaluation_value_id: String,
    matriculated_subject_id: String,
    eval_value: String,
    subject_id: String,
    subject_name_id: String,
    period: String,
    year: String,
    subject_name: String,
}

impl EvaluationDraft {
    fn into_evaluation(self) -> StudentEvaluation {
        StudentEvaluation {
            subject_name: self.subject_name,
            eval_value: self.eval_value,
            period: self.period,
            year: self.year,
        }
    }
}

/// 從學生識別碼出發，沿外鍵逐層查出所有評量。
pub struct EvaluationResolver<S: EvaluationStore> {
    store: S,
    settings: ResolverSettings,
}

impl<S: EvaluationStore> EvaluationResolver<S> {
    pub fn new(store: S, settings: ResolverSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub async fn resolve(&self, identification: &str) -> Result<Vec<StudentEvaluation>> {
        let start_time = Instant::now();

        let student_id = self
            .bounded(LookupStage::Student, self.store.student_id(identification))
            .await?;
        let Some(student_id) = student_id else {
            tracing::info!("No student registered for the given identification");
            return Ok(Vec::new());
        };

        let links = self
            .bounded(
                LookupStage::EvaluationLinks,
                self.store.evaluation_links(&student_id),
            )
            .await?;
        let total_links = links.len();
        let drafts: Vec<EvaluationDraft> = links
            .into_iter()
            .filter_map(|link| {
                Some(EvaluationDraft {
                    evaluation_value_id: link.evaluation_value_id?,
                    matriculated_subject_id: link.matriculated_subject_id?,
                    ..EvaluationDraft::default()
                })
            })
            .collect();
        if drafts.len() < total_links {
            tracing::debug!(
                "Skipped {} evaluation rows with a NULL reference",
                total_links - drafts.len()
            );
        }

        let drafts = self.fan_out(LookupStage::EvaluationValue, drafts).await?;
        let drafts = self.fan_out(LookupStage::MatriculatedSubject, drafts).await?;
        let drafts = self.fan_out(LookupStage::Subject, drafts).await?;
        let drafts = self.fan_out(LookupStage::SubjectName, drafts).await?;

        tracing::debug!(
            "🔄 Resolved {} evaluations in {:?}",
            drafts.len(),
            start_time.elapsed()
        );

        Ok(drafts.into_iter().map(EvaluationDraft::into_evaluation).collect())
    }

    /// 對每筆 draft 執行同一階段的查詢。`buffered` 保持輸入順序，
    /// 第一個錯誤出現時其餘查詢隨 stream 一起被丟棄。
    async fn fan_out(
        &self,
        stage: LookupStage,
        drafts: Vec<EvaluationDraft>,
    ) -> Result<Vec<EvaluationDraft>> {
        if drafts.is_empty() {
            return Ok(drafts);
        }
        tracing::debug!("Stage {}: {} lookups", stage, drafts.len());

        stream::iter(drafts)
            .map(|draft| self.bounded(stage, self.fill(stage, draft)))
            .buffered(self.settings.concurrent_lookups.max(1))
            .try_collect()
            .await
    }

    async fn fill(&self, stage: LookupStage, mut draft: EvaluationDraft) -> Result<EvaluationDraft> {
        match stage {
            LookupStage::EvaluationValue => {
                let value = self.store.evaluation_value(&draft.evaluation_value_id).await?;
                draft.eval_value = or_missing(stage, &draft.evaluation_value_id, value);
            }
            LookupStage::MatriculatedSubject => {
                let subject_id = self
                    .store
                    .matriculated_subject(&draft.matriculated_subject_id)
                    .await?;
                draft.subject_id = or_missing(stage, &draft.matriculated_subject_id, subject_id);
            }
            LookupStage::Subject => match self.store.subject(&draft.subject_id).await? {
                Some(row) => {
                    draft.subject_name_id = row.subject_name_id;
                    draft.period = row.period;
                    draft.year = row.year;
                }
                None => tracing::warn!("Stage {}: no row for key {}", stage, draft.subject_id),
            },
            LookupStage::SubjectName => {
                let name = self.store.subject_name(&draft.subject_name_id).await?;
                draft.subject_name = or_missing(stage, &draft.subject_name_id, name);
            }
            LookupStage::Student | LookupStage::EvaluationLinks => {}
        }
        Ok(draft)
    }

    /// 套用單次查詢逾時，並把任何失敗包成帶階段名稱的 ResolutionFailure
    async fn bounded<T>(
        &self,
        stage: LookupStage,
        lookup: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        let timeout = self.settings.lookup_timeout;
        match tokio::time::timeout(timeout, lookup).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::error!("❌ Lookup failed at stage {}: {}", stage, e);
                Err(into_resolution_failure(stage, e))
            }
            Err(_) => {
                tracing::error!("❌ Lookup timed out at stage {} after {:?}", stage, timeout);
                Err(RegError::ResolutionFailure {
                    stage: stage.to_string(),
                    details: format!("lookup timed out after {:?}", timeout),
                })
            }
        }
    }
}

fn into_resolution_failure(stage: LookupStage, error: RegError) -> RegError {
    match error {
        already @ RegError::ResolutionFailure { .. } => already,
        other => RegError::ResolutionFailure {
            stage: stage.to_string(),
            details: other.to_string(),
        },
    }
}

/// 單筆查詢沒有資料時以空字串代替
fn or_missing(stage: LookupStage, key: &str, value: Option<String>) -> String {
    value.unwrap_or_else(|| {
        tracing::warn!("Stage {}: no row for key {}", stage, key);
        String::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{EvaluationLink, SubjectRow};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::assert_ok;

    #[derive(Default)]
    struct MockStore {
        students: HashMap<String, String>,
        links: HashMap<String, Vec<EvaluationLink>>,
        values: HashMap<String, String>,
        matriculated: HashMap<String, String>,
        subjects: HashMap<String, SubjectRow>,
        names: HashMap<String, String>,
        fail_stage: Option<LookupStage>,
        slow_stage: Option<LookupStage>,
        calls: AtomicUsize,
    }

    impl MockStore {
        fn check(&self, stage: LookupStage) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_stage == Some(stage) {
                return Err(RegError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset",
                )));
            }
            Ok(())
        }

        async fn maybe_stall(&self, stage: LookupStage) {
            if self.slow_stage == Some(stage) {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
        }

        /// 學生 S1：兩門課（數學兩筆重複、物理一筆）與一筆 NULL 參照
        fn seeded() -> Self {
            let mut store = MockStore::default();
            store.students.insert("ID-001".to_string(), "S1".to_string());
            store.links.insert(
                "S1".to_string(),
                vec![
                    link(Some("EV1"), Some("MS1")),
                    link(Some("EV2"), Some("MS2")),
                    link(None, Some("MS3")),
                    link(Some("EV3"), Some("MS3")),
                    link(Some("EV4"), None),
                ],
            );
            for (id, value) in [("EV1", "7"), ("EV2", "9"), ("EV3", "10"), ("EV4", "1")] {
                store.values.insert(id.to_string(), value.to_string());
            }
            for (id, subject) in [("MS1", "SUB1"), ("MS2", "SUB1"), ("MS3", "SUB2")] {
                store.matriculated.insert(id.to_string(), subject.to_string());
            }
            store.subjects.insert("SUB1".to_string(), row("N1", "P1", "2020"));
            store.subjects.insert("SUB2".to_string(), row("N2", "P2", "2019"));
            store.names.insert("N1".to_string(), "Math".to_string());
            store.names.insert("N2".to_string(), "Phys".to_string());
            store
        }
    }

    fn link(value: Option<&str>, matriculated: Option<&str>) -> EvaluationLink {
        EvaluationLink {
            evaluation_value_id: value.map(str::to_string),
            matriculated_subject_id: matriculated.map(str::to_string),
        }
    }

    fn row(name_id: &str, period: &str, year: &str) -> SubjectRow {
        SubjectRow {
            subject_name_id: name_id.to_string(),
            period: period.to_string(),
            year: year.to_string(),
        }
    }

    #[async_trait]
    impl EvaluationStore for MockStore {
        async fn student_id(&self, identification: &str) -> Result<Option<String>> {
            self.check(LookupStage::Student)?;
            Ok(self.students.get(identification).cloned())
        }

        async fn evaluation_links(&self, student_id: &str) -> Result<Vec<EvaluationLink>> {
            self.check(LookupStage::EvaluationLinks)?;
            Ok(self.links.get(student_id).cloned().unwrap_or_default())
        }

        async fn evaluation_value(&self, evaluation_value_id: &str) -> Result<Option<String>> {
            self.check(LookupStage::EvaluationValue)?;
            self.maybe_stall(LookupStage::EvaluationValue).await;
            Ok(self.values.get(evaluation_value_id).cloned())
        }

        async fn matriculated_subject(&self, matriculated_subject_id: &str) -> Result<Option<String>> {
            self.check(LookupStage::MatriculatedSubject)?;
            Ok(self.matriculated.get(matriculated_subject_id).cloned())
        }

        async fn subject(&self, subject_id: &str) -> Result<Option<SubjectRow>> {
            self.check(LookupStage::Subject)?;
            Ok(self.subjects.get(subject_id).cloned())
        }

        async fn subject_name(&self, subject_name_id: &str) -> Result<Option<String>> {
            self.check(LookupStage::SubjectName)?;
            Ok(self.names.get(subject_name_id).cloned())
        }
    }

    fn evaluation(subject: &str, eval: &str, period: &str, year: &str) -> StudentEvaluation {
        StudentEvaluation {
            subject_name: subject.to_string(),
            eval_value: eval.to_string(),
            period: period.to_string(),
            year: year.to_string(),
        }
    }

    #[tokio::test]
    async fn test_resolves_full_chain_in_order() {
        let resolver = EvaluationResolver::new(MockStore::seeded(), ResolverSettings::default());

        let evaluations = assert_ok!(resolver.resolve("ID-001").await);

        assert_eq!(
            evaluations,
            vec![
                evaluation("Math", "7", "P1", "2020"),
                evaluation("Math", "9", "P1", "2020"),
                evaluation("Phys", "10", "P2", "2019"),
            ]
        );
    }

    #[tokio::test]
    async fn test_sequential_fan_out_gives_same_result() {
        let settings = ResolverSettings {
            concurrent_lookups: 1,
            ..ResolverSettings::default()
        };
        let sequential = EvaluationResolver::new(MockStore::seeded(), settings);
        let parallel = EvaluationResolver::new(
            MockStore::seeded(),
            ResolverSettings {
                concurrent_lookups: 16,
                ..ResolverSettings::default()
            },
        );

        assert_eq!(
            sequential.resolve("ID-001").await.unwrap(),
            parallel.resolve("ID-001").await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_unknown_student_yields_empty_list() {
        let resolver = EvaluationResolver::new(MockStore::seeded(), ResolverSettings::default());

        let evaluations = resolver.resolve("NOBODY").await.unwrap();

        assert!(evaluations.is_empty());
        assert_eq!(resolver.store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_rows_become_empty_strings() {
        let mut store = MockStore::seeded();
        store.values.remove("EV3");
        store.names.remove("N2");
        let resolver = EvaluationResolver::new(store, ResolverSettings::default());

        let evaluations = resolver.resolve("ID-001").await.unwrap();

        assert_eq!(evaluations[2], evaluation("", "", "P2", "2019"));
    }

    #[tokio::test]
    async fn test_stage_failure_aborts_with_stage_name() {
        for stage in [
            LookupStage::Student,
            LookupStage::EvaluationLinks,
            LookupStage::EvaluationValue,
            LookupStage::MatriculatedSubject,
            LookupStage::Subject,
            LookupStage::SubjectName,
        ] {
            let mut store = MockStore::seeded();
            store.fail_stage = Some(stage);
            let resolver = EvaluationResolver::new(store, ResolverSettings::default());

            match resolver.resolve("ID-001").await {
                Err(RegError::ResolutionFailure { stage: failed, .. }) => {
                    assert_eq!(failed, stage.to_string())
                }
                other => panic!("expected resolution failure at {}, got {:?}", stage, other),
            }
        }
    }

    #[tokio::test]
    async fn test_failure_stops_remaining_lookups() {
        // 學生 1 次 + 評量連結 1 次 + 第一筆評量值 1 次
        for (stage, expected_calls) in [
            (LookupStage::Student, 1),
            (LookupStage::EvaluationLinks, 2),
            (LookupStage::EvaluationValue, 3),
        ] {
            let mut store = MockStore::seeded();
            store.fail_stage = Some(stage);
            let resolver = EvaluationResolver::new(
                store,
                ResolverSettings {
                    concurrent_lookups: 1,
                    ..ResolverSettings::default()
                },
            );

            assert!(resolver.resolve("ID-001").await.is_err());
            assert_eq!(
                resolver.store.calls.load(Ordering::SeqCst),
                expected_calls,
                "lookups after a failure at {}",
                stage
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_lookup_times_out() {
        let mut store = MockStore::seeded();
        store.slow_stage = Some(LookupStage::EvaluationValue);
        let resolver = EvaluationResolver::new(
            store,
            ResolverSettings {
                concurrent_lookups: 2,
                lookup_timeout: Duration::from_millis(50),
            },
        );

        let err = resolver.resolve("ID-001").await.unwrap_err();

        match err {
            RegError::ResolutionFailure { stage, details } => {
                assert_eq!(stage, "evaluation_value");
                assert!(details.contains("timed out"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
