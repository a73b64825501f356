//! Session token models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by a signed session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub uid: Uuid,
    /// Account id the user belongs to
    pub aid: Uuid,
    /// Issue time (unix seconds)
    pub iss: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
}

/// Server-side record of an issued token.
#[derive(Debug, Clone)]
pub struct TokenRecord {
    pub id: Uuid,
    /// Unsigned `header.payload` portion of the token
    pub fingerprint: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}
