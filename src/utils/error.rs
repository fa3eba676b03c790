use crate::core::token::TokenError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegError {
    #[error("Authentication failed for {user}: {reason}")]
    AuthenticationFailure { user: String, reason: String },

    #[error("Token rejected: {0}")]
    DecodeFailure(#[from] TokenError),

    #[error("No {attribute} field found for {user}")]
    MissingIdentificationAttribute { attribute: String, user: String },

    #[error("Evaluation resolution failed at stage '{stage}': {details}")]
    ResolutionFailure { stage: String, details: String },

    #[error("Directory error: {0}")]
    Directory(#[from] ldap3::LdapError),

    #[error("No directory entry for {user}")]
    DirectoryEntryNotFound { user: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Token encoding failed: {0}")]
    TokenEncoding(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API responded with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 使用者需要重新登入
    Authentication,
    /// 目錄記錄缺少學生識別碼
    Identity,
    Resolution,
    /// 外部服務（目錄、資料庫、遠端 API）無法使用
    Upstream,
    Configuration,
    Internal,
}

impl RegError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RegError::AuthenticationFailure { .. } | RegError::DecodeFailure(_) => {
                ErrorCategory::Authentication
            }
            RegError::MissingIdentificationAttribute { .. }
            | RegError::DirectoryEntryNotFound { .. } => ErrorCategory::Identity,
            RegError::ResolutionFailure { .. } | RegError::Database(_) => {
                ErrorCategory::Resolution
            }
            RegError::Directory(_) | RegError::Http(_) | RegError::Api { .. } => {
                ErrorCategory::Upstream
            }
            RegError::ConfigError { .. }
            | RegError::InvalidConfigValueError { .. }
            | RegError::MissingConfigError { .. } => ErrorCategory::Configuration,
            RegError::TokenEncoding(_) | RegError::Serialization(_) | RegError::Io(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// 給呼叫端看的訊息。解析鏈與目錄的內部細節只寫進日誌。
    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Resolution => "evaluation resolution failed".to_string(),
            ErrorCategory::Internal => "internal error".to_string(),
            ErrorCategory::Upstream if matches!(self, RegError::Directory(_)) => {
                "directory service unavailable".to_string()
            }
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Authentication => "Authenticate again at /auth to obtain a fresh token",
            ErrorCategory::Identity => "Ask the directory administrator to fill in the identification attribute",
            ErrorCategory::Resolution => "Check database connectivity and the evaluation tables",
            ErrorCategory::Upstream => "Check that the upstream service is reachable",
            ErrorCategory::Configuration => "Review the configuration file and environment variables",
            ErrorCategory::Internal => "Retry the request; report it if the problem persists",
        }
    }
}

pub type Result<T> = std::result::Result<T, RegError>;
