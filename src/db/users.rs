//! Database operations for users.

use chrono::Utc;
use sea_orm::*;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::entity::user;
use crate::error::{AppError, AppResult, USERNAME_TAKEN_MSG};
use crate::models::{Metadata, NewUser, User, UserChanges};

/// Insert a new user. A clash on `(account_id, username)` becomes `Conflict`.
pub async fn insert<C: ConnectionTrait>(db: &C, new_user: NewUser) -> AppResult<User> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let model = user::ActiveModel {
        id: Set(id),
        account_id: Set(new_user.account_id),
        username: Set(new_user.username),
        password_hash: Set(new_user.password_hash),
        role: Set(new_user.role),
        metadata: Set(Some(JsonValue::Object(new_user.metadata))),
        created_at: Set(now),
        updated_at: Set(now),
    };

    user::Entity::insert(model)
        .exec(db)
        .await
        .map_err(map_unique_violation)?;

    let inserted = user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Database("Failed to fetch newly inserted user".to_string()))?;

    Ok(model_to_user(inserted))
}

/// Find a user by ID, regardless of account.
pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<Option<User>> {
    let result = user::Entity::find_by_id(id).one(db).await?;
    Ok(result.map(model_to_user))
}

/// Find a user by ID that belongs to `account_id`.
pub async fn find_in_account<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    account_id: Uuid,
) -> AppResult<Option<User>> {
    let result = user::Entity::find_by_id(id)
        .filter(user::Column::AccountId.eq(account_id))
        .one(db)
        .await?;

    Ok(result.map(model_to_user))
}

/// Find a user by username inside an account.
pub async fn find_by_username<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
    username: &str,
) -> AppResult<Option<User>> {
    let result = user::Entity::find()
        .filter(user::Column::AccountId.eq(account_id))
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?;

    Ok(result.map(model_to_user))
}

/// List users, optionally restricted to one account.
pub async fn list<C: ConnectionTrait>(db: &C, account_id: Option<Uuid>) -> AppResult<Vec<User>> {
    let mut query = user::Entity::find();
    if let Some(account_id) = account_id {
        query = query.filter(user::Column::AccountId.eq(account_id));
    }

    let results = query
        .order_by_asc(user::Column::CreatedAt)
        .all(db)
        .await?;

    Ok(results.into_iter().map(model_to_user).collect())
}

/// Replace the stored password hash. Returns false if the user is gone.
pub async fn update_password<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    password_hash: &str,
) -> AppResult<bool> {
    let Some(existing) = user::Entity::find_by_id(id).one(db).await? else {
        return Ok(false);
    };

    let mut active: user::ActiveModel = existing.into();
    active.password_hash = Set(password_hash.to_string());
    active.updated_at = Set(Utc::now());
    active.update(db).await?;

    Ok(true)
}

/// Replace only the metadata column.
pub async fn update_metadata<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    metadata: Metadata,
) -> AppResult<Option<User>> {
    let Some(existing) = user::Entity::find_by_id(id).one(db).await? else {
        return Ok(None);
    };

    let mut active: user::ActiveModel = existing.into();
    active.metadata = Set(Some(JsonValue::Object(metadata)));
    active.updated_at = Set(Utc::now());
    let updated = active.update(db).await?;

    Ok(Some(model_to_user(updated)))
}

/// Apply a partial update. Returns `None` if the user does not exist.
pub async fn update<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    changes: UserChanges,
) -> AppResult<Option<User>> {
    let Some(existing) = user::Entity::find_by_id(id).one(db).await? else {
        return Ok(None);
    };

    if changes.is_empty() {
        return Ok(Some(model_to_user(existing)));
    }

    let mut active: user::ActiveModel = existing.into();
    if let Some(username) = changes.username {
        active.username = Set(username);
    }
    if let Some(password_hash) = changes.password_hash {
        active.password_hash = Set(password_hash);
    }
    if let Some(role) = changes.role {
        active.role = Set(role);
    }
    if let Some(metadata) = changes.metadata {
        active.metadata = Set(Some(JsonValue::Object(metadata)));
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(db).await.map_err(map_unique_violation)?;
    Ok(Some(model_to_user(updated)))
}

/// Delete a user and every token issued to them. Returns false if no user row was removed.
pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<bool> {
    super::tokens::delete_for_user(db, id).await?;

    let result = user::Entity::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}

fn map_unique_violation(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict(USERNAME_TAKEN_MSG.to_string())
        }
        _ => AppError::from(err),
    }
}

fn model_to_user(m: user::Model) -> User {
    let metadata = match m.metadata {
        Some(JsonValue::Object(map)) => map,
        _ => Metadata::new(),
    };

    User {
        id: m.id,
        account_id: m.account_id,
        username: m.username,
        password_hash: m.password_hash,
        role: m.role,
        metadata,
        created_at: m.created_at,
        updated_at: m.updated_at,
        token: None,
    }
}
