use crate::core::report::sort_and_dedup;
use crate::core::resolver::EvaluationResolver;
use crate::core::token::TokenCodec;
use crate::domain::model::{Credentials, EvaluationYear};
use crate::domain::ports::{Directory, EvaluationStore};
use crate::utils::error::{RegError, Result};
use axum::http::HeaderMap;
use std::collections::HashMap;

/// 目錄記錄中存放學生識別碼的預設屬性
pub const EMPLOYEE_ID: &str = "employeeID";

/// 登入與評量查詢的組合：目錄驗證 → token，token → 目錄記錄 → 解析鏈 → 報表。
pub struct RegService<D: Directory, S: EvaluationStore> {
    directory: D,
    resolver: EvaluationResolver<S>,
    codec: TokenCodec,
    identification_attribute: String,
}

impl<D: Directory, S: EvaluationStore> RegService<D, S> {
    pub fn new(
        directory: D,
        resolver: EvaluationResolver<S>,
        codec: TokenCodec,
        identification_attribute: impl Into<String>,
    ) -> Self {
        Self {
            directory,
            resolver,
            codec,
            identification_attribute: identification_attribute.into(),
        }
    }

    pub fn identification_attribute(&self) -> &str {
        &self.identification_attribute
    }

    pub async fn authenticate(&self, credentials: &Credentials) -> Result<String> {
        self.directory
            .authenticate(&credentials.user, &credentials.pass)
            .await?;
        let token = self.codec.encrypt(credentials)?;

        tracing::info!(user = %credentials.user, "✅ Token issued");
        Ok(token)
    }

    pub async fn evaluations(&self, headers: &HeaderMap) -> Result<Vec<EvaluationYear>> {
        let user = self.codec.decrypt_headers(headers)?;
        self.evaluations_for(&user).await
    }

    /// 已驗證身分的使用者之評量報表
    pub async fn evaluations_for(&self, user: &str) -> Result<Vec<EvaluationYear>> {
        let record = self.directory.full_record(user).await?;
        let identification =
            business_identification(&record, &self.identification_attribute, user)?;

        let evaluations = self.resolver.resolve(&identification).await?;
        let found = evaluations.len();
        let report = sort_and_dedup(evaluations);

        tracing::info!(
            user = %user,
            records = found,
            years = report.len(),
            "📥 Evaluation report built"
        );
        Ok(report)
    }
}

/// 取屬性的第一個值並去除空白；缺少或為空時回報錯誤，而不是當作沒有評量。
pub fn business_identification(
    record: &HashMap<String, Vec<String>>,
    attribute: &str,
    user: &str,
) -> Result<String> {
    record
        .get(attribute)
        .and_then(|values| values.first())
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| RegError::MissingIdentificationAttribute {
            attribute: attribute.to_string(),
            user: user.to_string(),
        })
}
