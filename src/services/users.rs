//! User registry: self-service registration and login, password and
//! metadata changes, and the admin user-management surface.

use sea_orm::DatabaseConnection;
use tracing::info;
use uuid::Uuid;

use crate::auth::CredentialHasher;
use crate::db::{accounts, users};
use crate::error::{AppError, AppResult, USERNAME_TAKEN_MSG};
use crate::models::user::ROLE_STANDARD;
use crate::models::{
    AdminCreateUserRequest, AdminUpdateUserRequest, Metadata, NewUser, User, UserChanges,
};
use crate::services::background::{BackgroundJob, BackgroundWriter};

/// Reject an empty username or password.
pub fn require_credentials(username: &str, password: &str) -> AppResult<()> {
    if username.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".to_string(),
        ));
    }
    Ok(())
}

/// Create a user in `account_id` with the given role.
///
/// The pre-check gives a clean conflict in the common case; the unique index
/// catches concurrent registrations that both pass it.
pub async fn create_user(
    db: &DatabaseConnection,
    hasher: &CredentialHasher,
    account_id: Uuid,
    username: &str,
    password: &str,
    role: &str,
    metadata: Metadata,
) -> AppResult<User> {
    require_credentials(username, password)?;

    if users::find_by_username(db, account_id, username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(USERNAME_TAKEN_MSG.to_string()));
    }

    let password_hash = hasher.hash(password).await?;

    let user = users::insert(
        db,
        NewUser {
            account_id,
            username: username.to_string(),
            password_hash,
            role: role.to_string(),
            metadata,
        },
    )
    .await?;

    info!("Created user {} in account {}", user.id, account_id);
    Ok(user)
}

/// Self-registration. The role is always standard, whatever the client sent.
pub async fn register(
    db: &DatabaseConnection,
    hasher: &CredentialHasher,
    account_id: Uuid,
    username: &str,
    password: &str,
) -> AppResult<User> {
    create_user(
        db,
        hasher,
        account_id,
        username,
        password,
        ROLE_STANDARD,
        Metadata::new(),
    )
    .await
}

/// Check credentials. Unknown user and wrong password fail identically.
pub async fn login(
    db: &DatabaseConnection,
    hasher: &CredentialHasher,
    account_id: Uuid,
    username: &str,
    password: &str,
) -> AppResult<User> {
    require_credentials(username, password)?;

    let Some(user) = users::find_by_username(db, account_id, username).await? else {
        return Err(AppError::InvalidCredentials);
    };

    if !hasher.verify(password, &user.password_hash).await {
        return Err(AppError::InvalidCredentials);
    }

    Ok(user)
}

/// Change a user's own password after checking the current one.
pub async fn change_password(
    db: &DatabaseConnection,
    hasher: &CredentialHasher,
    user: &User,
    current_password: &str,
    new_password: &str,
) -> AppResult<()> {
    if !hasher.verify(current_password, &user.password_hash).await {
        return Err(AppError::InvalidCredentials);
    }
    if new_password.is_empty() {
        return Err(AppError::Validation("New password is required".to_string()));
    }

    let password_hash = hasher.hash(new_password).await?;
    if !users::update_password(db, user.id, &password_hash).await? {
        return Err(AppError::NotFound("User".to_string()));
    }

    info!("Password changed for user {}", user.id);
    Ok(())
}

/// Replace a user's metadata. No other field is written.
pub async fn update_metadata(
    db: &DatabaseConnection,
    user_id: Uuid,
    metadata: Metadata,
) -> AppResult<User> {
    users::update_metadata(db, user_id, metadata)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))
}

/// List users visible to an admin. `scope` of `None` means every account.
pub async fn list_users(db: &DatabaseConnection, scope: Option<Uuid>) -> AppResult<Vec<User>> {
    users::list(db, scope).await
}

/// Fetch one user visible to an admin.
pub async fn get_user(db: &DatabaseConnection, id: Uuid, scope: Option<Uuid>) -> AppResult<User> {
    find_scoped(db, id, scope)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))
}

/// Admin create. Unlike registration the role may be set.
pub async fn admin_create_user(
    db: &DatabaseConnection,
    hasher: &CredentialHasher,
    caller: &User,
    scope: Option<Uuid>,
    req: AdminCreateUserRequest,
) -> AppResult<User> {
    let account_id = req.account_id.unwrap_or(caller.account_id);

    if let Some(allowed) = scope
        && allowed != account_id
    {
        return Err(AppError::Forbidden(
            "Cannot create users in another account".to_string(),
        ));
    }

    if accounts::find_by_id(db, account_id).await?.is_none() {
        return Err(AppError::NotFound("Account".to_string()));
    }

    create_user(
        db,
        hasher,
        account_id,
        &req.username,
        &req.password,
        req.role.as_deref().unwrap_or(ROLE_STANDARD),
        req.metadata.unwrap_or_default(),
    )
    .await
}

/// Admin partial update. Omitted fields are kept; a new password is re-hashed.
pub async fn admin_update_user(
    db: &DatabaseConnection,
    hasher: &CredentialHasher,
    id: Uuid,
    scope: Option<Uuid>,
    req: AdminUpdateUserRequest,
) -> AppResult<User> {
    let existing = get_user(db, id, scope).await?;

    if matches!(req.username.as_deref(), Some("")) {
        return Err(AppError::Validation("Username must not be empty".to_string()));
    }
    if matches!(req.password.as_deref(), Some("")) {
        return Err(AppError::Validation("Password must not be empty".to_string()));
    }

    if let Some(ref username) = req.username
        && username != &existing.username
        && users::find_by_username(db, existing.account_id, username)
            .await?
            .is_some()
    {
        return Err(AppError::Conflict(USERNAME_TAKEN_MSG.to_string()));
    }

    let password_hash = match req.password {
        Some(ref password) => Some(hasher.hash(password).await?),
        None => None,
    };

    let changes = UserChanges {
        username: req.username,
        password_hash,
        role: req.role,
        metadata: req.metadata,
    };

    users::update(db, existing.id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))
}

/// Queue deletion of a user and their tokens. Reports nothing back, so a
/// caller cannot tell whether the id existed.
pub async fn admin_delete_user(
    db: &DatabaseConnection,
    writer: &BackgroundWriter,
    id: Uuid,
    scope: Option<Uuid>,
) -> AppResult<()> {
    if let Some(account_id) = scope
        && users::find_in_account(db, id, account_id).await?.is_none()
    {
        return Ok(());
    }

    writer.dispatch(BackgroundJob::DeleteUser { user_id: id });
    Ok(())
}

async fn find_scoped(
    db: &DatabaseConnection,
    id: Uuid,
    scope: Option<Uuid>,
) -> AppResult<Option<User>> {
    match scope {
        Some(account_id) => users::find_in_account(db, id, account_id).await,
        None => users::find_by_id(db, id).await,
    }
}
