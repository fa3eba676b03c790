use crate::config::service_config::DirectoryConfig;
use crate::domain::ports::Directory;
use crate::utils::error::{RegError, Result};
use async_trait::async_trait;
use ldap3::{ldap_escape, Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::time::Duration;

/// LDAP result code for a rejected bind
const INVALID_CREDENTIALS: u32 = 49;

/// Active Directory 風格的目錄：使用者以 `帳號 + 後綴` 綁定驗證，
/// 記錄查詢則以服務帳號綁定後依 sAMAccountName 搜尋。
pub struct LdapDirectory {
    url: String,
    account_suffix: String,
    base_dn: String,
    bind_user: String,
    bind_password: SecretString,
    timeout: Duration,
}

impl LdapDirectory {
    pub fn new(config: &DirectoryConfig) -> Self {
        Self {
            url: config.url.clone(),
            account_suffix: config.account_suffix().to_string(),
            base_dn: config.base_dn.clone(),
            bind_user: config.bind_user.clone(),
            bind_password: SecretString::from(config.bind_password.expose_secret()),
            timeout: config.timeout(),
        }
    }

    async fn connect(&self) -> Result<Ldap> {
        let settings = LdapConnSettings::new().set_conn_timeout(self.timeout);
        let (conn, ldap) = LdapConnAsync::with_settings(settings, &self.url).await?;
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                tracing::warn!("LDAP connection error: {}", e);
            }
        });
        Ok(ldap)
    }

    async fn close(mut ldap: Ldap) {
        if let Err(e) = ldap.unbind().await {
            tracing::debug!("LDAP unbind failed: {}", e);
        }
    }
}

#[async_trait]
impl Directory for LdapDirectory {
    async fn authenticate(&self, user: &str, pass: &SecretString) -> Result<()> {
        // 空密碼在 LDAP 會變成匿名綁定而「成功」，必須先擋下
        if user.trim().is_empty() || pass.expose_secret().is_empty() {
            return Err(RegError::AuthenticationFailure {
                user: user.to_string(),
                reason: "empty user name or password".to_string(),
            });
        }

        let mut ldap = self.connect().await?;
        let bind_dn = format!("{}{}", user, self.account_suffix);
        let result = ldap
            .with_timeout(self.timeout)
            .simple_bind(&bind_dn, pass.expose_secret())
            .await;
        Self::close(ldap).await;

        let result = result?;
        match result.rc {
            0 => {
                tracing::debug!(user = %user, "Directory bind succeeded");
                Ok(())
            }
            INVALID_CREDENTIALS => Err(RegError::AuthenticationFailure {
                user: user.to_string(),
                reason: "invalid credentials".to_string(),
            }),
            rc => Err(RegError::AuthenticationFailure {
                user: user.to_string(),
                reason: format!("directory refused bind (rc={})", rc),
            }),
        }
    }

    async fn full_record(&self, user: &str) -> Result<HashMap<String, Vec<String>>> {
        let mut ldap = self.connect().await?;

        let lookup = async {
            ldap.with_timeout(self.timeout)
                .simple_bind(&self.bind_user, self.bind_password.expose_secret())
                .await?
                .success()?;

            let filter = format!("(sAMAccountName={})", ldap_escape(user));
            let (entries, _) = ldap
                .with_timeout(self.timeout)
                .search(&self.base_dn, Scope::Subtree, &filter, vec!["*"])
                .await?
                .success()?;
            Ok::<_, RegError>(entries)
        }
        .await;
        Self::close(ldap).await;

        let entry = lookup?
            .into_iter()
            .next()
            .ok_or_else(|| RegError::DirectoryEntryNotFound {
                user: user.to_string(),
            })?;

        Ok(SearchEntry::construct(entry).attrs)
    }
}
