//! Token issuing and password hashing

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::JwtConfig;
use crate::errors::Error;
use crate::models::AuthUser;

/// Audience every issued token is bound to
pub const AUDIENCE: &str = "auth";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token; {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("password hashing failed; {0}")]
    Hash(String),

    #[error("invalid token subject {0:?}")]
    Subject(String),
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        Error::foreign(err)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub iat: i64,
    pub exp: i64,
    pub aud: String,
    pub iss: String,
}

/// Sign a token for `user_id`
pub fn issue(user_id: i64, config: &JwtConfig) -> Result<String, AuthError> {
    issue_at(user_id, config, Utc::now().timestamp())
}

fn issue_at(user_id: i64, config: &JwtConfig, now: i64) -> Result<String, AuthError> {
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + config.expire_in.as_secs() as i64,
        aud: AUDIENCE.to_string(),
        iss: config.issuer.clone(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;
    Ok(token)
}

/// Check signature, expiry, audience and issuer, then extract the user
pub fn verify(token: &str, config: &JwtConfig) -> Result<AuthUser, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[AUDIENCE]);
    validation.set_issuer(&[config.issuer.as_str()]);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;

    let id = data
        .claims
        .sub
        .parse::<i64>()
        .map_err(|_| AuthError::Subject(data.claims.sub.clone()))?;
    Ok(AuthUser { id })
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-for-unit-tests-only".to_string(),
            expire_in: Duration::from_secs(30),
            issuer: "boiler".to_string(),
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let token = issue(42, &config()).unwrap();
        let user = verify(&token, &config()).unwrap();
        assert_eq!(user.id, 42);
    }

    #[test]
    fn test_wrong_secret_fails() {
        let token = issue(42, &config()).unwrap();
        let other = JwtConfig {
            secret: "another".to_string(),
            ..config()
        };
        assert!(verify(&token, &other).is_err());
    }

    #[test]
    fn test_wrong_issuer_fails() {
        let token = issue(42, &config()).unwrap();
        let other = JwtConfig {
            issuer: "someone-else".to_string(),
            ..config()
        };
        assert!(verify(&token, &other).is_err());
    }

    #[test]
    fn test_expired_token_fails() {
        let long_ago = Utc::now().timestamp() - 3600;
        let token = issue_at(42, &config(), long_ago).unwrap();
        assert!(verify(&token, &config()).is_err());
    }

    #[test]
    fn test_malformed_token_fails() {
        assert!(verify("not.a.valid.jwt", &config()).is_err());
        assert!(verify("", &config()).is_err());
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("secure-password-123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secure-password-123", &hash));
        assert!(!verify_password("wrong-password", &hash));
        assert!(!verify_password("secure-password-123", "not-a-hash"));
    }
}
