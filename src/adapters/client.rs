use crate::adapters::http::{AUTH_PATH, EVAL_PATH};
use crate::core::token::AUTH_HEADER;
use crate::domain::model::EvaluationYear;
use crate::utils::error::{RegError, Result};
use crate::utils::validation::validate_url;
use reqwest::{Client, Response};

/// regapi 的 HTTP 用戶端：先登入取得 token，再以 token 取評量報表。
pub struct RegClient {
    base_url: String,
    client: Client,
}

impl RegClient {
    pub fn new(base_url: &str) -> Result<Self> {
        validate_url("address", base_url, &["http", "https"])?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        })
    }

    pub async fn login(&self, user: &str, pass: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, AUTH_PATH);
        tracing::debug!("Making API request to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "User": user, "Pass": pass }))
            .send()
            .await?;

        Self::body_of(response).await
    }

    pub async fn evaluations(&self, token: &str) -> Result<Vec<EvaluationYear>> {
        let body = self.evaluations_raw(token).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// 原樣回傳伺服器的 JSON
    pub async fn evaluations_raw(&self, token: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, EVAL_PATH);
        tracing::debug!("Making API request to: {}", url);

        let response = self
            .client
            .get(&url)
            .header(AUTH_HEADER, token)
            .send()
            .await?;

        Self::body_of(response).await
    }

    async fn body_of(response: Response) -> Result<String> {
        let status = response.status();
        tracing::debug!("API response status: {}", status);

        let body = response.text().await?;
        if !status.is_success() {
            return Err(RegError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}
