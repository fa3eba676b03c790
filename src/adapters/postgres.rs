use crate::config::service_config::DatabaseConfig;
use crate::domain::model::{EvaluationLink, SubjectRow};
use crate::domain::ports::EvaluationStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

// 鍵欄位一律以 ::text 比較，識別碼在整條解析鏈中都以字串傳遞
const STUDENT_ID: &str =
    "SELECT id_student::text FROM student WHERE identification::text = $1 LIMIT 1";
const EVALUATION_LINKS: &str = "SELECT evaluation_value_fk::text, matriculated_subject_fk::text \
     FROM evaluation WHERE student_fk::text = $1";
const EVALUATION_VALUE: &str =
    "SELECT value::text FROM evaluation_value WHERE id_evaluation_value::text = $1 LIMIT 1";
const MATRICULATED_SUBJECT: &str = "SELECT subject_fk::text FROM matriculated_subject \
     WHERE matriculated_subject_id::text = $1 LIMIT 1";
const SUBJECT: &str = "SELECT subject_name_fk::text, period::text, year::text FROM subject \
     WHERE subject_id::text = $1 LIMIT 1";
const SUBJECT_NAME: &str =
    "SELECT name::text FROM subject_name WHERE subject_name_id::text = $1 LIMIT 1";

pub struct PgEvaluationStore {
    pool: PgPool,
}

impl PgEvaluationStore {
    /// 建立連線池但不立即連線；第一次查詢時才建立連線。
    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port())
            .database(&config.name)
            .username(&config.user)
            .password(config.password.expose_secret());

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections())
            .acquire_timeout(config.acquire_timeout())
            .connect_lazy_with(options);

        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl EvaluationStore for PgEvaluationStore {
    async fn student_id(&self, identification: &str) -> Result<Option<String>> {
        let id = sqlx::query_scalar::<_, String>(STUDENT_ID)
            .bind(identification)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn evaluation_links(&self, student_id: &str) -> Result<Vec<EvaluationLink>> {
        let rows = sqlx::query_as::<_, (Option<String>, Option<String>)>(EVALUATION_LINKS)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(evaluation_value_id, matriculated_subject_id)| EvaluationLink {
                evaluation_value_id,
                matriculated_subject_id,
            })
            .collect())
    }

    async fn evaluation_value(&self, evaluation_value_id: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(EVALUATION_VALUE)
            .bind(evaluation_value_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn matriculated_subject(&self, matriculated_subject_id: &str) -> Result<Option<String>> {
        let subject_id = sqlx::query_scalar::<_, String>(MATRICULATED_SUBJECT)
            .bind(matriculated_subject_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(subject_id)
    }

    async fn subject(&self, subject_id: &str) -> Result<Option<SubjectRow>> {
        let row = sqlx::query_as::<_, (String, String, String)>(SUBJECT)
            .bind(subject_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(subject_name_id, period, year)| SubjectRow {
            subject_name_id,
            period,
            year,
        }))
    }

    async fn subject_name(&self, subject_name_id: &str) -> Result<Option<String>> {
        let name = sqlx::query_scalar::<_, String>(SUBJECT_NAME)
            .bind(subject_name_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(name)
    }
}
