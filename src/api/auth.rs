//! Session endpoints: register, login, current user, logout, password change.

use actix_web::{HttpResponse, get, post, put, web};
use tracing::{debug, info, warn};

use crate::auth::{AccountScope, AuthContext, AuthenticatedUser, OptionalUser, TokenCodec};
use crate::error::AppResult;
use crate::models::{ChangePasswordRequest, CredentialsRequest, PublicUser, SuccessResponse};
use crate::services::users;

/// Configure session routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(login)
        .service(me)
        .service(logout)
        .service(change_password);
}

/// Register a standard user in the account named by `Account-Key`.
///
/// Any `role` in the body is ignored.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User registered", body = PublicUser),
        (status = 400, description = "Missing username or password"),
        (status = 401, description = "Missing or invalid account key"),
        (status = 409, description = "Username already taken in this account")
    ),
    security(
        ("account_key" = [])
    )
)]
#[post("/auth/register")]
pub async fn register(
    scope: AccountScope,
    body: web::Json<CredentialsRequest>,
    ctx: web::Data<AuthContext>,
) -> AppResult<HttpResponse> {
    let mut user = users::register(
        &ctx.db,
        &ctx.hasher,
        scope.account_id,
        &body.username,
        &body.password,
    )
    .await?;

    ctx.attach_session(&mut user);

    Ok(HttpResponse::Created().json(PublicUser::from(user)))
}

/// Log in to the account named by `Account-Key`.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Logged in", body = PublicUser),
        (status = 400, description = "Missing username or password"),
        (status = 401, description = "Invalid credentials or account key")
    ),
    security(
        ("account_key" = [])
    )
)]
#[post("/auth/login")]
pub async fn login(
    scope: AccountScope,
    body: web::Json<CredentialsRequest>,
    ctx: web::Data<AuthContext>,
) -> AppResult<HttpResponse> {
    let mut user = users::login(
        &ctx.db,
        &ctx.hasher,
        scope.account_id,
        &body.username,
        &body.password,
    )
    .await?;

    ctx.attach_session(&mut user);
    info!("User {} logged in", user.id);

    Ok(HttpResponse::Ok().json(PublicUser::from(user)))
}

/// Current user, or `null` when no valid token was presented.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user or null", body = Option<PublicUser>)
    ),
    security(
        (),
        ("bearer_token" = [])
    )
)]
#[get("/auth/me")]
pub async fn me(current: OptionalUser) -> HttpResponse {
    HttpResponse::Ok().json(current.0.map(PublicUser::from))
}

/// Revoke the presented token. Always reports success.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Logged out", body = SuccessResponse)
    ),
    security(
        (),
        ("bearer_token" = [])
    )
)]
#[post("/auth/logout")]
pub async fn logout(current: OptionalUser, ctx: web::Data<AuthContext>) -> HttpResponse {
    if let Some(fingerprint) = current
        .0
        .as_ref()
        .and_then(|u| u.token.as_deref())
        .and_then(TokenCodec::fingerprint)
    {
        match ctx.store.revoke(&fingerprint).await {
            Ok(removed) => debug!("Revoked {} token record(s)", removed),
            Err(e) => warn!("Token revocation failed: {}", e),
        }
    }

    HttpResponse::Ok().json(SuccessResponse::ok())
}

/// Change the caller's password.
#[utoipa::path(
    put,
    path = "/api/v1/auth/password",
    tag = "Auth",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = SuccessResponse),
        (status = 400, description = "New password missing"),
        (status = 401, description = "Not authenticated or current password wrong")
    ),
    security(
        ("bearer_token" = [])
    )
)]
#[put("/auth/password")]
pub async fn change_password(
    auth: AuthenticatedUser,
    body: web::Json<ChangePasswordRequest>,
    ctx: web::Data<AuthContext>,
) -> AppResult<HttpResponse> {
    users::change_password(
        &ctx.db,
        &ctx.hasher,
        &auth.user,
        &body.password,
        &body.new_password,
    )
    .await?;

    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}
