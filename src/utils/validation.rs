use crate::utils::error::{RegError, Result};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str, allowed_schemes: &[&str]) -> Result<()> {
    if url_str.is_empty() {
        return Err(RegError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) if allowed_schemes.contains(&url.scheme()) => Ok(()),
        Ok(url) => Err(RegError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!(
                "Unsupported URL scheme: {}. Allowed schemes: {}",
                url.scheme(),
                allowed_schemes.join(", ")
            ),
        }),
        Err(e) => Err(RegError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(RegError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RegError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 密碼類欄位：不可為空，也不可是未被替換的 `${VAR}`。錯誤訊息不帶值。
pub fn validate_secret_resolved(field_name: &str, secret: &SecretString) -> Result<()> {
    let value = secret.expose_secret();
    if value.is_empty() || (value.starts_with("${") && value.ends_with('}')) {
        return Err(RegError::MissingConfigError {
            field: field_name.to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(RegError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        let web = ["http", "https"];
        assert!(validate_url("server_url", "https://example.com", &web).is_ok());
        assert!(validate_url("server_url", "http://example.com", &web).is_ok());
        assert!(validate_url("server_url", "", &web).is_err());
        assert!(validate_url("server_url", "invalid-url", &web).is_err());
        assert!(validate_url("server_url", "ftp://example.com", &web).is_err());

        let directory = ["ldap", "ldaps"];
        assert!(validate_url("directory.url", "ldaps://ad.example.edu:636", &directory).is_ok());
        assert!(validate_url("directory.url", "https://ad.example.edu", &directory).is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("max_connections", 5, 1).is_ok());
        assert!(validate_positive_number("max_connections", 0, 1).is_err());
    }

    #[test]
    fn test_validate_secret_resolved() {
        assert!(validate_secret_resolved("password", &SecretString::from("pw")).is_ok());
        assert!(validate_secret_resolved("password", &SecretString::from("")).is_err());
        assert!(validate_secret_resolved("password", &SecretString::from("${DB_PASS}")).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("ttl", 60u64, 60, 120).is_ok());
        assert!(validate_range("ttl", 121u64, 60, 120).is_err());
    }
}
