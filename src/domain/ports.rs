use crate::domain::model::{EvaluationLink, SubjectRow};
use crate::utils::error::Result;
use async_trait::async_trait;
use secrecy::SecretString;
use std::collections::HashMap;

/// 目錄服務（LDAP）提供的兩項能力。
#[async_trait]
pub trait Directory: Send + Sync {
    async fn authenticate(&self, user: &str, pass: &SecretString) -> Result<()>;

    /// 回傳使用者目錄記錄的全部屬性。
    async fn full_record(&self, user: &str) -> Result<HashMap<String, Vec<String>>>;
}

/// 評量資料的關聯式查詢，每個方法對應解析鏈中的一個階段。
/// 單筆查詢找不到資料時回傳 `None`。
#[async_trait]
pub trait EvaluationStore: Send + Sync {
    async fn student_id(&self, identification: &str) -> Result<Option<String>>;

    async fn evaluation_links(&self, student_id: &str) -> Result<Vec<EvaluationLink>>;

    async fn evaluation_value(&self, evaluation_value_id: &str) -> Result<Option<String>>;

    async fn matriculated_subject(&self, matriculated_subject_id: &str) -> Result<Option<String>>;

    async fn subject(&self, subject_id: &str) -> Result<Option<SubjectRow>>;

    async fn subject_name(&self, subject_name_id: &str) -> Result<Option<String>>;
}
