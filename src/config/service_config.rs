use crate::core::resolver::ResolverSettings;
use crate::core::service::EMPLOYEE_ID;
use crate::utils::error::{RegError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub directory: DirectoryConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub token: TokenConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub address: String,
    /// 單一請求（含讀取主體）可花費的最長時間
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct DirectoryConfig {
    pub url: String,
    pub account_suffix: Option<String>,
    pub base_dn: String,
    pub bind_user: String,
    pub bind_password: SecretString,
    pub identification_attribute: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: Option<u16>,
    pub name: String,
    pub user: String,
    pub password: SecretString,
    pub max_connections: Option<u32>,
    pub acquire_timeout_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenConfig {
    /// 未設定時啟動時隨機產生
    pub secret: Option<SecretString>,
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResolverConfig {
    pub concurrent_lookups: Option<usize>,
    pub lookup_timeout_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingConfig {
    pub json: Option<bool>,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.unwrap_or(10))
    }
}

impl DirectoryConfig {
    pub fn account_suffix(&self) -> &str {
        self.account_suffix.as_deref().unwrap_or("")
    }

    pub fn identification_attribute(&self) -> &str {
        self.identification_attribute.as_deref().unwrap_or(EMPLOYEE_ID)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(10))
    }
}

impl DatabaseConfig {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(5432)
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections.unwrap_or(10)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds.unwrap_or(5))
    }
}

impl TokenConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds.unwrap_or(3600))
    }
}

impl ResolverConfig {
    pub fn settings(&self) -> ResolverSettings {
        let defaults = ResolverSettings::default();
        ResolverSettings {
            concurrent_lookups: self
                .concurrent_lookups
                .unwrap_or(defaults.concurrent_lookups),
            lookup_timeout: self
                .lookup_timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.lookup_timeout),
        }
    }
}

impl ServiceConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RegError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${LDAP_PASSWORD})；未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RegError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        self.server
            .address
            .parse::<SocketAddr>()
            .map_err(|e| RegError::InvalidConfigValueError {
                field: "server.address".to_string(),
                value: self.server.address.clone(),
                reason: e.to_string(),
            })?;

        validation::validate_range(
            "server.request_timeout_seconds",
            self.server.request_timeout().as_secs(),
            1,
            300,
        )?;

        validation::validate_url("directory.url", &self.directory.url, &["ldap", "ldaps"])?;
        validation::validate_non_empty_string("directory.base_dn", &self.directory.base_dn)?;
        validation::validate_non_empty_string("directory.bind_user", &self.directory.bind_user)?;
        validation::validate_non_empty_string(
            "directory.identification_attribute",
            self.directory.identification_attribute(),
        )?;
        validation::validate_secret_resolved(
            "directory.bind_password",
            &self.directory.bind_password,
        )?;

        validation::validate_non_empty_string("database.host", &self.database.host)?;
        validation::validate_non_empty_string("database.name", &self.database.name)?;
        validation::validate_non_empty_string("database.user", &self.database.user)?;
        validation::validate_secret_resolved("database.password", &self.database.password)?;
        validation::validate_positive_number(
            "database.max_connections",
            self.database.max_connections() as usize,
            1,
        )?;

        if let Some(secret) = &self.token.secret {
            validation::validate_secret_resolved("token.secret", secret)?;
            if secret.expose_secret().len() < 16 {
                return Err(RegError::InvalidConfigValueError {
                    field: "token.secret".to_string(),
                    value: "[REDACTED]".to_string(),
                    reason: "Secret must be at least 16 bytes".to_string(),
                });
            }
        }
        validation::validate_range("token.ttl_seconds", self.token.ttl().as_secs(), 60, 7 * 24 * 3600)?;

        let resolver = self.resolver.settings();
        validation::validate_range("resolver.concurrent_lookups", resolver.concurrent_lookups, 1, 64)?;
        validation::validate_positive_number(
            "resolver.lookup_timeout_seconds",
            resolver.lookup_timeout.as_secs() as usize,
            1,
        )?;

        Ok(())
    }

    pub fn json_logs(&self) -> bool {
        self.logging.json.unwrap_or(false)
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
