//! Database operations for issued token fingerprints.

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::entity::token;
use crate::error::{AppError, AppResult};
use crate::models::TokenRecord;

/// Insert a fingerprint for `user_id`.
///
/// A fingerprint that is already stored yields `Conflict`; identical claims
/// issued within the same second produce identical tokens.
pub async fn insert<C: ConnectionTrait>(
    db: &C,
    fingerprint: &str,
    user_id: Uuid,
) -> AppResult<TokenRecord> {
    let now = Utc::now();

    let model = token::ActiveModel {
        id: Set(Uuid::new_v4()),
        value: Set(fingerprint.to_string()),
        user_id: Set(user_id),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let inserted = model.insert(db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Token already recorded".to_string())
        }
        _ => AppError::from(e),
    })?;
    Ok(model_to_record(inserted))
}

/// Find a token record by fingerprint.
pub async fn find_by_fingerprint<C: ConnectionTrait>(
    db: &C,
    fingerprint: &str,
) -> AppResult<Option<TokenRecord>> {
    let result = token::Entity::find()
        .filter(token::Column::Value.eq(fingerprint))
        .one(db)
        .await?;

    Ok(result.map(model_to_record))
}

/// Delete every record matching `fingerprint`. Returns the number removed.
pub async fn delete_by_fingerprint<C: ConnectionTrait>(db: &C, fingerprint: &str) -> AppResult<u64> {
    let result = token::Entity::delete_many()
        .filter(token::Column::Value.eq(fingerprint))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// Delete every token issued to `user_id`.
pub async fn delete_for_user<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<u64> {
    let result = token::Entity::delete_many()
        .filter(token::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

fn model_to_record(m: token::Model) -> TokenRecord {
    TokenRecord {
        id: m.id,
        fingerprint: m.value,
        user_id: m.user_id,
        created_at: m.created_at,
    }
}
