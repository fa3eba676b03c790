use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// 登入請求的帳號密碼，只存在於單一請求期間。
#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(rename = "User")]
    pub user: String,
    #[serde(rename = "Pass")]
    pub pass: SecretString,
}

impl Credentials {
    pub fn new(user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            pass: SecretString::from(pass.into()),
        }
    }
}

/// 解析鏈產出的扁平評量記錄，尚未去重。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentEvaluation {
    pub subject_name: String,
    pub eval_value: String,
    pub period: String,
    pub year: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectEvaluation {
    pub subject: String,
    pub eval: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationPeriod {
    pub period: String,
    #[serde(rename = "evs")]
    pub evaluations: Vec<SubjectEvaluation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationYear {
    pub year: String,
    pub periods: Vec<EvaluationPeriod>,
}

/// `evaluation` 表的一列；任一外鍵可能為 NULL。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationLink {
    pub evaluation_value_id: Option<String>,
    pub matriculated_subject_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectRow {
    pub subject_name_id: String,
    pub period: String,
    pub year: String,
}
