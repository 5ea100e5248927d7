use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};

use crate::core::config::Settings;

const ARGON2_MEMORY_KIB: u32 = 102_400;
const ARGON2_TIME: u32 = 2;
const ARGON2_PARALLELISM: u32 = 8;

#[derive(Debug, Error)]
pub(crate) enum SecurityError {
    #[error("password hashing failed")]
    Hashing,
    #[error("password verification failed")]
    Verification,
    #[error("jwt encoding failed")]
    JwtEncoding,
    #[error("jwt decoding failed")]
    JwtDecoding,
    #[error("token has wrong type")]
    WrongTokenKind,
    #[error("unsupported jwt algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Claims {
    pub(crate) sub: String,
    pub(crate) exp: i64,
    pub(crate) typ: TokenKind,
    /// Set for tokens issued by device login; the token dies with the device row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) device: Option<String>,
}

pub(crate) struct IssuedToken {
    pub(crate) token: String,
    pub(crate) expires_at: OffsetDateTime,
}

fn argon2() -> Result<Argon2<'static>, argon2::Error> {
    let params = argon2::Params::new(ARGON2_MEMORY_KIB, ARGON2_TIME, ARGON2_PARALLELISM, None)?;
    Ok(Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params))
}

pub(crate) fn hash_password(password: &str) -> Result<String, SecurityError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = argon2().map_err(|_| SecurityError::Hashing)?;

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| SecurityError::Hashing)?
        .to_string();

    Ok(hash)
}

pub(crate) fn verify_password(password: &str, hash: &str) -> Result<bool, SecurityError> {
    let parsed = PasswordHash::new(hash).map_err(|_| SecurityError::Verification)?;
    let argon2 = argon2().map_err(|_| SecurityError::Verification)?;

    match argon2.verify_password(password.as_bytes(), &parsed) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(_) => Err(SecurityError::Verification),
    }
}

pub(crate) fn create_access_token(
    subject: &str,
    settings: &Settings,
    expires_in: Option<Duration>,
) -> Result<String, SecurityError> {
    let lifetime = expires_in.unwrap_or_else(|| {
        Duration::minutes(settings.security().access_token_expire_minutes as i64)
    });
    issue(subject, TokenKind::Access, None, lifetime, settings).map(|issued| issued.token)
}

pub(crate) fn create_refresh_token(
    subject: &str,
    settings: &Settings,
) -> Result<String, SecurityError> {
    let lifetime = Duration::minutes(settings.security().refresh_token_expire_minutes as i64);
    issue(subject, TokenKind::Refresh, None, lifetime, settings).map(|issued| issued.token)
}

pub(crate) fn create_device_token(
    subject: &str,
    device_id: &str,
    settings: &Settings,
) -> Result<IssuedToken, SecurityError> {
    let lifetime = Duration::minutes(settings.security().device_token_expire_minutes as i64);
    issue(subject, TokenKind::Access, Some(device_id), lifetime, settings)
}

fn issue(
    subject: &str,
    typ: TokenKind,
    device: Option<&str>,
    lifetime: Duration,
    settings: &Settings,
) -> Result<IssuedToken, SecurityError> {
    let algorithm = algorithm_from_settings(settings)?;
    let expires_at = OffsetDateTime::now_utc() + lifetime;

    let claims = Claims {
        sub: subject.to_string(),
        exp: expires_at.unix_timestamp(),
        typ,
        device: device.map(str::to_string),
    };

    let token = encode(
        &jsonwebtoken::Header::new(algorithm),
        &claims,
        &EncodingKey::from_secret(settings.security().secret_key.as_bytes()),
    )
    .map_err(|_| SecurityError::JwtEncoding)?;

    Ok(IssuedToken { token, expires_at })
}

pub(crate) fn verify_token(token: &str, settings: &Settings) -> Result<Claims, SecurityError> {
    let algorithm = algorithm_from_settings(settings)?;
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = true;
    validation.leeway = 0;
    validation.required_spec_claims.insert("exp".to_string());
    validation.required_spec_claims.insert("sub".to_string());

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.security().secret_key.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| SecurityError::JwtDecoding)
}

pub(crate) fn verify_token_kind(
    token: &str,
    kind: TokenKind,
    settings: &Settings,
) -> Result<Claims, SecurityError> {
    let claims = verify_token(token, settings)?;
    if claims.typ != kind {
        return Err(SecurityError::WrongTokenKind);
    }
    Ok(claims)
}

fn algorithm_from_settings(settings: &Settings) -> Result<Algorithm, SecurityError> {
    match settings.security().algorithm.as_str() {
        "HS256" => Ok(Algorithm::HS256),
        other => Err(SecurityError::UnsupportedAlgorithm(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    async fn settings() -> (tokio::sync::OwnedMutexGuard<()>, Settings) {
        let guard = test_support::env_lock().await;
        test_support::set_test_env();
        (guard, Settings::load().expect("settings"))
    }

    #[test]
    fn password_hash_roundtrip() {
        let hash = hash_password("correct-horse-battery-staple").expect("hash");
        assert!(verify_password("correct-horse-battery-staple", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[tokio::test]
    async fn refresh_token_is_not_an_access_token() {
        let (_guard, settings) = settings().await;

        let refresh = create_refresh_token("user-123", &settings).expect("refresh");
        let claims = verify_token_kind(&refresh, TokenKind::Refresh, &settings).expect("claims");
        assert_eq!(claims.sub, "user-123");

        let err = verify_token_kind(&refresh, TokenKind::Access, &settings).expect_err("kind");
        assert!(matches!(err, SecurityError::WrongTokenKind));
    }

    #[tokio::test]
    async fn device_token_carries_device_claim() {
        let (_guard, settings) = settings().await;

        let issued = create_device_token("user-123", "device-9", &settings).expect("token");
        let claims = verify_token(&issued.token, &settings).expect("claims");

        assert_eq!(claims.typ, TokenKind::Access);
        assert_eq!(claims.device.as_deref(), Some("device-9"));
        assert!(issued.expires_at > OffsetDateTime::now_utc());
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let (_guard, settings) = settings().await;

        let token =
            create_access_token("user-123", &settings, Some(Duration::minutes(-5))).expect("token");
        assert!(verify_token(&token, &settings).is_err());
    }
}
