//! Account and account key models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::PublicUser;

/// Account (tenant) stored in database.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account key stored in database.
///
/// The id is the secret: presenting it in the `Account-Key` header proves
/// membership of the owning account.
#[derive(Debug, Clone, Serialize)]
pub struct AccountKey {
    pub id: Uuid,
    pub account_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to onboard a new tenant with its owner user.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAccountRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            name: a.name,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct KeyResponse {
    /// The key value; send it as the `Account-Key` header
    pub id: Uuid,
    pub account_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<AccountKey> for KeyResponse {
    fn from(k: AccountKey) -> Self {
        Self {
            id: k.id,
            account_id: k.account_id,
            created_at: k.created_at,
        }
    }
}

/// Response when an account is created.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateAccountResponse {
    pub account: AccountResponse,
    pub key: KeyResponse,
    pub owner: PublicUser,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListKeysResponse {
    pub keys: Vec<KeyResponse>,
}
