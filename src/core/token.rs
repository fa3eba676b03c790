use crate::domain::model::Credentials;
use crate::utils::error::Result;
use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 攜帶 token 的 HTTP 標頭名稱
pub const AUTH_HEADER: &str = "AuthHd";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("missing {} header", AUTH_HEADER)]
    MissingToken,

    #[error("malformed token")]
    Malformed,

    #[error("token signature does not verify")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// 無狀態的登入憑證：HS256 簽章的 JWT，只帶使用者名稱與有效期限，不帶密碼。
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &SecretString, ttl: std::time::Duration) -> Self {
        Self::from_secret_bytes(secret.expose_secret().as_bytes(), ttl)
    }

    /// 未設定密鑰時使用；重新啟動後先前發出的 token 全部失效。
    pub fn with_random_secret(ttl: std::time::Duration) -> Self {
        let mut secret = [0u8; 32];
        OsRng.fill_bytes(&mut secret);
        Self::from_secret_bytes(&secret, ttl)
    }

    fn from_secret_bytes(secret: &[u8], ttl: std::time::Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::hours(1)),
        }
    }

    pub fn encrypt(&self, credentials: &Credentials) -> Result<String> {
        self.encrypt_at(credentials, Utc::now())
    }

    fn encrypt_at(&self, credentials: &Credentials, issued_at: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            sub: credentials.user.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// 驗證 token 並取回使用者名稱
    pub fn decrypt(&self, token: &str) -> std::result::Result<String, TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::MissingToken);
        }

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })?;

        Ok(data.claims.sub)
    }

    pub fn decrypt_headers(&self, headers: &HeaderMap) -> std::result::Result<String, TokenError> {
        let value = headers.get(AUTH_HEADER).ok_or(TokenError::MissingToken)?;
        let token = value.to_str().map_err(|_| TokenError::Malformed)?;
        self.decrypt(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use tokio_test::{assert_err, assert_ok};

    fn codec() -> TokenCodec {
        TokenCodec::new(
            &SecretString::from("unit-test-signing-secret"),
            std::time::Duration::from_secs(3600),
        )
    }

    #[test]
    fn test_round_trip_yields_identity() {
        let codec = codec();
        let token = assert_ok!(codec.encrypt(&Credentials::new("alice", "s3cret")));

        assert_eq!(codec.decrypt(&token), Ok("alice".to_string()));
    }

    #[test]
    fn test_token_does_not_carry_password() {
        let codec = codec();
        let token = codec.encrypt(&Credentials::new("alice", "hunter2-password")).unwrap();

        let mut unverified = Validation::new(Algorithm::HS256);
        unverified.insecure_disable_signature_validation();
        let claims = jsonwebtoken::decode::<serde_json::Value>(
            &token,
            &DecodingKey::from_secret(b""),
            &unverified,
        )
        .unwrap()
        .claims;

        assert_eq!(claims["sub"], "alice");
        assert!(!claims.to_string().contains("hunter2-password"));
    }

    #[test]
    fn test_swapped_signature_is_rejected() {
        let codec = codec();
        let alice = codec.encrypt(&Credentials::new("alice", "a")).unwrap();
        let mallory = codec.encrypt(&Credentials::new("mallory", "m")).unwrap();

        let alice_parts: Vec<&str> = alice.split('.').collect();
        let mallory_parts: Vec<&str> = mallory.split('.').collect();
        let forged = format!("{}.{}.{}", mallory_parts[0], mallory_parts[1], alice_parts[2]);

        assert_eq!(codec.decrypt(&forged), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let other = TokenCodec::new(
            &SecretString::from("another-secret"),
            std::time::Duration::from_secs(3600),
        );
        let token = other.encrypt(&Credentials::new("alice", "a")).unwrap();

        assert_eq!(codec().decrypt(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_random_secret_codecs_do_not_trust_each_other() {
        let ttl = std::time::Duration::from_secs(60);
        let first = TokenCodec::with_random_secret(ttl);
        let second = TokenCodec::with_random_secret(ttl);
        let token = first.encrypt(&Credentials::new("alice", "a")).unwrap();

        assert_ok!(first.decrypt(&token));
        assert_err!(second.decrypt(&token));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let codec = codec();
        let issued_at = Utc::now() - Duration::hours(2);
        let token = codec
            .encrypt_at(&Credentials::new("alice", "a"), issued_at)
            .unwrap();

        assert_eq!(codec.decrypt(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_garbage_and_empty_tokens() {
        let codec = codec();
        assert_eq!(codec.decrypt("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(codec.decrypt("   "), Err(TokenError::MissingToken));
    }

    #[test]
    fn test_decrypt_headers() {
        let codec = codec();
        let token = codec.encrypt(&Credentials::new("bob", "b")).unwrap();

        let mut headers = HeaderMap::new();
        assert_eq!(codec.decrypt_headers(&headers), Err(TokenError::MissingToken));

        headers.insert(AUTH_HEADER, HeaderValue::from_str(&token).unwrap());
        assert_eq!(codec.decrypt_headers(&headers), Ok("bob".to_string()));
    }
}
