//! Account onboarding and account key endpoints.

use actix_web::{HttpResponse, get, post, web};

use crate::auth::{AdminUser, AuthContext, BootstrapAdmin};
use crate::error::AppResult;
use crate::models::{
    AccountResponse, CreateAccountRequest, CreateAccountResponse, KeyResponse, ListKeysResponse,
    PublicUser,
};
use crate::services::accounts;

/// Configure account routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_account)
        .service(list_keys)
        .service(create_key);
}

/// Onboard a tenant: account, first key and owner user.
///
/// POST /api/v1/accounts
/// Authorization: X-Admin-Key (bootstrap)
#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    tag = "Accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = CreateAccountResponse),
        (status = 400, description = "Missing owner username or password"),
        (status = 401, description = "Missing or invalid admin key")
    ),
    security(
        ("admin_key" = [])
    )
)]
#[post("/accounts")]
pub async fn create_account(
    _admin: BootstrapAdmin,
    body: web::Json<CreateAccountRequest>,
    ctx: web::Data<AuthContext>,
) -> AppResult<HttpResponse> {
    let tenant = accounts::create_account(&ctx.db, &ctx.hasher, &body).await?;

    let mut owner = tenant.owner;
    ctx.attach_session(&mut owner);

    Ok(HttpResponse::Created().json(CreateAccountResponse {
        account: AccountResponse::from(tenant.account),
        key: KeyResponse::from(tenant.key),
        owner: PublicUser::from(owner),
    }))
}

/// List the keys of the caller's account.
#[utoipa::path(
    get,
    path = "/api/v1/accounts/keys",
    tag = "Accounts",
    responses(
        (status = 200, description = "Account keys", body = ListKeysResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin or owner role required")
    ),
    security(
        ("bearer_token" = [])
    )
)]
#[get("/accounts/keys")]
pub async fn list_keys(admin: AdminUser, ctx: web::Data<AuthContext>) -> AppResult<HttpResponse> {
    let keys = accounts::list_keys(&ctx.db, admin.user.account_id).await?;

    Ok(HttpResponse::Ok().json(ListKeysResponse {
        keys: keys.into_iter().map(KeyResponse::from).collect(),
    }))
}

/// Mint an additional key for the caller's account.
#[utoipa::path(
    post,
    path = "/api/v1/accounts/keys",
    tag = "Accounts",
    responses(
        (status = 201, description = "Key created", body = KeyResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin or owner role required")
    ),
    security(
        ("bearer_token" = [])
    )
)]
#[post("/accounts/keys")]
pub async fn create_key(admin: AdminUser, ctx: web::Data<AuthContext>) -> AppResult<HttpResponse> {
    let key = accounts::create_key(&ctx.db, admin.user.account_id).await?;
    Ok(HttpResponse::Created().json(KeyResponse::from(key)))
}
