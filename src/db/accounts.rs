//! Database operations for accounts.

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::entity::account;
use crate::error::AppResult;
use crate::models::Account;

/// Insert a new account.
pub async fn insert<C: ConnectionTrait>(db: &C, name: &str) -> AppResult<Account> {
    let now = Utc::now();

    let model = account::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let inserted = model.insert(db).await?;
    Ok(model_to_account(inserted))
}

/// Find an account by ID.
pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<Option<Account>> {
    let result = account::Entity::find_by_id(id).one(db).await?;
    Ok(result.map(model_to_account))
}

fn model_to_account(m: account::Model) -> Account {
    Account {
        id: m.id,
        name: m.name,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}
