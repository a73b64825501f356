//! Domain models and request/response types.

pub mod account;
pub mod token;
pub mod user;

pub use account::{
    Account, AccountKey, AccountResponse, CreateAccountRequest, CreateAccountResponse,
    KeyResponse, ListKeysResponse,
};
pub use token::{SessionClaims, TokenRecord};
pub use user::{
    AdminCreateUserRequest, AdminUpdateUserRequest, ChangePasswordRequest, CredentialsRequest,
    ListUsersResponse, Metadata, NewUser, PublicUser, SuccessResponse, UpdateMetadataRequest,
    User, UserChanges,
};

/// Roles that grant access to the admin surface.
pub const PRIVILEGED_ROLES: [&str; 2] = [user::ROLE_ADMIN, user::ROLE_OWNER];

/// Check whether a role string is admin-tier.
pub fn is_privileged_role(role: &str) -> bool {
    PRIVILEGED_ROLES.contains(&role)
}
