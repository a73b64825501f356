//! Database operations for account keys.

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::entity::key;
use crate::error::AppResult;
use crate::models::AccountKey;

/// Insert a new key bound to `account_id`. The generated id is the secret.
pub async fn insert<C: ConnectionTrait>(db: &C, account_id: Uuid) -> AppResult<AccountKey> {
    let now = Utc::now();

    let model = key::ActiveModel {
        id: Set(Uuid::new_v4()),
        account_id: Set(account_id),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let inserted = model.insert(db).await?;
    Ok(model_to_key(inserted))
}

/// Find a key by its id (the presented secret).
pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<Option<AccountKey>> {
    let result = key::Entity::find_by_id(id).one(db).await?;
    Ok(result.map(model_to_key))
}

/// List all keys of an account, oldest first.
pub async fn list_for_account<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
) -> AppResult<Vec<AccountKey>> {
    let results = key::Entity::find()
        .filter(key::Column::AccountId.eq(account_id))
        .order_by_asc(key::Column::CreatedAt)
        .all(db)
        .await?;

    Ok(results.into_iter().map(model_to_key).collect())
}

fn model_to_key(m: key::Model) -> AccountKey {
    AccountKey {
        id: m.id,
        account_id: m.account_id,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}
