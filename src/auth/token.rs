//! HS256 session tokens.
//!
//! A token is a compact JWT carrying [`SessionClaims`]. Its unsigned
//! `header.payload` prefix is the fingerprint stored server-side so a token
//! can be revoked before it expires.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::SessionClaims;

/// Algorithms a presented token may declare.
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Reasons a token cannot be issued or accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token signature does not match")]
    InvalidSignature,

    #[error("token declares an unexpected algorithm")]
    UnexpectedAlgorithm,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(msg) => AppError::Signing(msg),
            other => AppError::Unauthorized(format!("Invalid token: {other}")),
        }
    }
}

/// Signs and verifies session tokens with a shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    secret: SecretString,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: SecretString, ttl_days: i64) -> Self {
        Self {
            secret,
            ttl: Duration::days(ttl_days),
        }
    }

    /// Issue a token for `uid` in account `aid`, valid from now for the configured lifetime.
    pub fn issue(&self, uid: Uuid, aid: Uuid) -> Result<String, TokenError> {
        let iss = Utc::now().timestamp();
        self.sign(&SessionClaims {
            uid,
            aid,
            iss,
            exp: iss + self.ttl.num_seconds(),
        })
    }

    /// Sign arbitrary claims with HS256.
    pub fn sign(&self, claims: &SessionClaims) -> Result<String, TokenError> {
        let secret = self.secret.expose_secret();
        if secret.is_empty() {
            return Err(TokenError::Signing("signing secret is empty".to_string()));
        }

        let key = EncodingKey::from_secret(secret.as_bytes());
        encode(&Header::new(Algorithm::HS256), claims, &key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature, algorithm family and expiry, then return the claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let alg = declared_algorithm(token).ok_or(TokenError::Malformed)?;
        match alg.parse::<Algorithm>() {
            Ok(alg) if HMAC_ALGORITHMS.contains(&alg) => {}
            _ => return Err(TokenError::UnexpectedAlgorithm),
        }

        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.leeway = 0;
        validation.validate_aud = false;

        decode::<SessionClaims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::InvalidAlgorithm => TokenError::UnexpectedAlgorithm,
                _ => TokenError::Malformed,
            })
    }

    /// `header.payload` of a compact token, or `None` if it is not three segments.
    pub fn fingerprint(token: &str) -> Option<String> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(_signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return None;
        };
        if header.is_empty() || payload.is_empty() {
            return None;
        }
        Some(format!("{header}.{payload}"))
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &"[REDACTED]")
            .field("ttl_days", &self.ttl.num_days())
            .finish()
    }
}

/// Read `alg` from the header without trusting anything else in the token.
fn declared_algorithm(token: &str) -> Option<String> {
    let header = token.split('.').next()?;
    let bytes = URL_SAFE_NO_PAD.decode(header).ok()?;
    let value: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    value.get("alg")?.as_str().map(str::to_string)
}
