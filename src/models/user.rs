//! User models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Standard (non-privileged) role.
pub const ROLE_STANDARD: &str = "";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_OWNER: &str = "owner";

/// Opaque metadata bag. Key order is preserved and values are never interpreted.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// User stored in database.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub account_id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bearer token for this request; never persisted
    pub token: Option<String>,
}

impl User {
    pub fn is_privileged(&self) -> bool {
        super::is_privileged_role(&self.role)
    }
}

/// Client-facing user, password hash stripped.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicUser {
    pub id: Uuid,
    /// Only present on login, register and self-fetch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub username: String,
    pub role: String,
    pub account_id: Uuid,
    #[schema(value_type = Object)]
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            token: u.token,
            username: u.username,
            role: u.role,
            account_id: u.account_id,
            metadata: u.metadata,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Input for inserting a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub account_id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub metadata: Metadata,
}

/// Partial update applied by the admin surface. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<Metadata>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.password_hash.is_none()
            && self.role.is_none()
            && self.metadata.is_none()
    }
}

/// Register / login body. Any other field (including `role`) is ignored.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Change-password body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    /// Current password
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "newPassword")]
    pub new_password: String,
}

/// Update-metadata body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMetadataRequest {
    #[serde(default)]
    #[schema(value_type = Object)]
    pub metadata: Metadata,
}

/// Admin create-user body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminCreateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Metadata>,
    /// Target account; defaults to the caller's own account
    #[serde(default)]
    pub account_id: Option<Uuid>,
}

/// Admin update-user body. Omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AdminUpdateUserRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListUsersResponse {
    pub users: Vec<PublicUser>,
}

/// Body returned by operations that always report success.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
