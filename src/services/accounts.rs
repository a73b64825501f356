//! Account and account key registry.

use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::info;
use uuid::Uuid;

use super::users::require_credentials;
use crate::auth::CredentialHasher;
use crate::db::{accounts, keys, users};
use crate::error::{AppError, AppResult};
use crate::models::user::ROLE_OWNER;
use crate::models::{Account, AccountKey, CreateAccountRequest, Metadata, NewUser, User};

/// Everything created when a tenant is onboarded.
#[derive(Debug)]
pub struct NewTenant {
    pub account: Account,
    pub key: AccountKey,
    pub owner: User,
}

/// Create an account, its first key and its owner user.
///
/// All three rows are written in one transaction, so a failure at any step
/// leaves nothing behind. No session token is issued here.
pub async fn create_account(
    db: &DatabaseConnection,
    hasher: &CredentialHasher,
    req: &CreateAccountRequest,
) -> AppResult<NewTenant> {
    require_credentials(&req.username, &req.password)?;
    let password_hash = hasher.hash(&req.password).await?;

    let txn = db.begin().await?;

    let account = accounts::insert(&txn, req.name.trim())
        .await
        .map_err(|e| step_failed("account", e))?;

    let key = keys::insert(&txn, account.id)
        .await
        .map_err(|e| step_failed("account key", e))?;

    let owner = users::insert(
        &txn,
        NewUser {
            account_id: account.id,
            username: req.username.clone(),
            password_hash,
            role: ROLE_OWNER.to_string(),
            metadata: Metadata::new(),
        },
    )
    .await
    .map_err(|e| step_failed("owner user", e))?;

    txn.commit().await?;

    info!("Created account {} with owner {}", account.id, owner.id);

    Ok(NewTenant {
        account,
        key,
        owner,
    })
}

fn step_failed(step: &str, err: AppError) -> AppError {
    match err {
        AppError::Database(msg) => AppError::Database(format!("Failed to create {step}: {msg}")),
        other => other,
    }
}

/// Resolve a presented account key to its account. Unparseable keys resolve to `None`.
pub async fn validate_key(db: &DatabaseConnection, raw: &str) -> AppResult<Option<Uuid>> {
    let Ok(key_id) = Uuid::parse_str(raw) else {
        return Ok(None);
    };

    Ok(keys::find_by_id(db, key_id).await?.map(|k| k.account_id))
}

/// Resolve a raw account id presented in the legacy header.
pub async fn validate_account_id(db: &DatabaseConnection, raw: &str) -> AppResult<Option<Uuid>> {
    let Ok(account_id) = Uuid::parse_str(raw) else {
        return Ok(None);
    };

    Ok(accounts::find_by_id(db, account_id).await?.map(|a| a.id))
}

/// List the keys of an account.
pub async fn list_keys(db: &DatabaseConnection, account_id: Uuid) -> AppResult<Vec<AccountKey>> {
    keys::list_for_account(db, account_id).await
}

/// Mint an additional key for an existing account.
pub async fn create_key(db: &DatabaseConnection, account_id: Uuid) -> AppResult<AccountKey> {
    if accounts::find_by_id(db, account_id).await?.is_none() {
        return Err(AppError::NotFound("Account".to_string()));
    }

    let key = keys::insert(db, account_id).await?;
    info!("Created key {} for account {}", key.id, account_id);
    Ok(key)
}
