//! Token to user resolution.
//!
//! A presented token is trusted only if its fingerprint is on record, its
//! signature and expiry verify, and the user it names still exists in the
//! account it claims.

use sea_orm::DatabaseConnection;
use tracing::debug;

use super::store::TokenStore;
use super::token::{TokenCodec, TokenError};
use crate::db::users;
use crate::error::AppError;
use crate::models::User;

/// Why a token did not resolve to a user.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Fingerprint not on record, or the claimed user is gone
    #[error("unknown token")]
    Unknown,

    #[error(transparent)]
    Invalid(#[from] TokenError),

    #[error("token lookup failed: {0}")]
    Store(AppError),
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Store(e) => e,
            ResolveError::Unknown => AppError::Unauthorized("Invalid or revoked token".to_string()),
            ResolveError::Invalid(e) => AppError::from(e),
        }
    }
}

/// Resolve `token` to the user it was issued to.
pub async fn resolve(
    db: &DatabaseConnection,
    codec: &TokenCodec,
    store: &TokenStore,
    token: &str,
) -> Result<User, ResolveError> {
    let fingerprint = TokenCodec::fingerprint(token).ok_or(TokenError::Malformed)?;

    let record = store
        .exists(&fingerprint)
        .await
        .map_err(ResolveError::Store)?
        .ok_or(ResolveError::Unknown)?;

    let claims = codec.verify(token)?;

    if record.user_id != claims.uid {
        debug!("Token record belongs to a different user than its claims");
        return Err(ResolveError::Unknown);
    }

    let mut user = users::find_in_account(db, claims.uid, claims.aid)
        .await
        .map_err(ResolveError::Store)?
        .ok_or(ResolveError::Unknown)?;

    user.token = Some(token.to_string());
    Ok(user)
}
