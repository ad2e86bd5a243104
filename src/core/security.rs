use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};

use crate::core::config::Settings;

#[derive(Debug, Error)]
pub(crate) enum SecurityError {
    #[error("jwt encoding failed")]
    JwtEncoding,
    #[error("jwt decoding failed")]
    JwtDecoding,
    #[error("unsupported jwt algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Claims {
    pub(crate) sub: String,
    pub(crate) exp: i64,
}

/// Resolves a bearer token to the user id it was issued for.
///
/// Both the REST extractors and the WebSocket `authenticate` handshake go
/// through this seam, so the verification scheme lives in one place.
pub(crate) trait IdentityProvider: Send + Sync {
    fn resolve(&self, token: &str) -> Result<String, SecurityError>;
}

/// HMAC-signed JWT issuer and verifier.
#[derive(Clone)]
pub(crate) struct JwtKeys {
    secret: String,
    algorithm: Algorithm,
    default_ttl: Duration,
}

impl JwtKeys {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self, SecurityError> {
        let security = settings.security();
        Ok(Self {
            secret: security.secret_key.clone(),
            algorithm: parse_algorithm(&security.algorithm)?,
            default_ttl: Duration::minutes(security.access_token_expire_minutes as i64),
        })
    }

    #[cfg(test)]
    pub(crate) fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into(), algorithm: Algorithm::HS256, default_ttl: Duration::days(7) }
    }

    pub(crate) fn issue(
        &self,
        subject: &str,
        expires_in: Option<Duration>,
    ) -> Result<String, SecurityError> {
        let expire = OffsetDateTime::now_utc() + expires_in.unwrap_or(self.default_ttl);
        let claims = Claims { sub: subject.to_string(), exp: expire.unix_timestamp() };

        encode(&Header::new(self.algorithm), &claims, &EncodingKey::from_secret(self.secret.as_bytes()))
            .map_err(|_| SecurityError::JwtEncoding)
    }

    pub(crate) fn verify(&self, token: &str) -> Result<Claims, SecurityError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.required_spec_claims.insert("exp".to_string());
        validation.required_spec_claims.insert("sub".to_string());

        decode::<Claims>(token, &DecodingKey::from_secret(self.secret.as_bytes()), &validation)
            .map(|data| data.claims)
            .map_err(|_| SecurityError::JwtDecoding)
    }
}

impl IdentityProvider for JwtKeys {
    fn resolve(&self, token: &str) -> Result<String, SecurityError> {
        self.verify(token).map(|claims| claims.sub)
    }
}

fn parse_algorithm(value: &str) -> Result<Algorithm, SecurityError> {
    match value {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(SecurityError::UnsupportedAlgorithm(other.to_string())),
    }
}
