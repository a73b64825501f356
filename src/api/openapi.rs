//! OpenAPI documentation configuration.

use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};

use crate::config::{ACCOUNT_KEY_HEADER, ADMIN_KEY_HEADER};
use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tenant Auth Server",
        version = "0.1.0",
        description = "Multi-tenant accounts, account keys, users and revocable session tokens"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Account endpoints
        api::accounts::create_account,
        api::accounts::list_keys,
        api::accounts::create_key,
        // Session endpoints
        api::auth::register,
        api::auth::login,
        api::auth::me,
        api::auth::logout,
        api::auth::change_password,
        // User endpoints
        api::users::update_own_metadata,
        api::users::list_users,
        api::users::create_user,
        api::users::get_user,
        api::users::update_user,
        api::users::delete_user,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            models::SuccessResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Accounts
            models::CreateAccountRequest,
            models::CreateAccountResponse,
            models::AccountResponse,
            models::KeyResponse,
            models::ListKeysResponse,
            // Users
            models::PublicUser,
            models::CredentialsRequest,
            models::ChangePasswordRequest,
            models::UpdateMetadataRequest,
            models::AdminCreateUserRequest,
            models::AdminUpdateUserRequest,
            models::ListUsersResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Accounts", description = "Tenant onboarding and account keys"),
        (name = "Auth", description = "Registration, login and session tokens"),
        (name = "Users", description = "User metadata and admin user management")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Register the bearer token, account key and admin key schemes.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "account_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(ACCOUNT_KEY_HEADER))),
            );
            components.add_security_scheme(
                "admin_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(ADMIN_KEY_HEADER))),
            );
        }
    }
}
