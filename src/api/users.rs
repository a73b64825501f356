//! User endpoints: own metadata update and the admin user-management surface.

use actix_web::{HttpResponse, delete, get, patch, post, put, web};
use uuid::Uuid;

use crate::auth::{AdminUser, AuthContext, AuthenticatedUser};
use crate::error::{AppError, AppResult};
use crate::models::{
    AdminCreateUserRequest, AdminUpdateUserRequest, ListUsersResponse, PublicUser,
    SuccessResponse, UpdateMetadataRequest,
};
use crate::services::users;

/// Configure user routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(update_own_metadata)
        .service(list_users)
        .service(create_user)
        .service(get_user)
        .service(update_user)
        .service(delete_user);
}

fn parse_user_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("User".to_string()))
}

/// Replace the caller's own metadata. No other field changes.
#[utoipa::path(
    patch,
    path = "/api/v1/users",
    tag = "Users",
    request_body = UpdateMetadataRequest,
    responses(
        (status = 200, description = "Metadata updated", body = PublicUser),
        (status = 401, description = "Not authenticated")
    ),
    security(
        ("bearer_token" = [])
    )
)]
#[patch("/users")]
pub async fn update_own_metadata(
    auth: AuthenticatedUser,
    body: web::Json<UpdateMetadataRequest>,
    ctx: web::Data<AuthContext>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let mut updated = users::update_metadata(&ctx.db, auth.user.id, body.metadata).await?;
    updated.token = auth.user.token;

    Ok(HttpResponse::Ok().json(PublicUser::from(updated)))
}

/// List users.
///
/// Every account in global admin scope, the caller's account in tenant scope.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    responses(
        (status = 200, description = "Users", body = ListUsersResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin or owner role required")
    ),
    security(
        ("bearer_token" = [])
    )
)]
#[get("/users")]
pub async fn list_users(
    admin: AdminUser,
    ctx: web::Data<AuthContext>,
) -> AppResult<HttpResponse> {
    let scope = ctx.admin_account_filter(&admin.user);
    let users = users::list_users(&ctx.db, scope).await?;

    Ok(HttpResponse::Ok().json(ListUsersResponse {
        users: users.into_iter().map(PublicUser::from).collect(),
    }))
}

/// Create a user with any role.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    request_body = AdminCreateUserRequest,
    responses(
        (status = 201, description = "User created", body = PublicUser),
        (status = 400, description = "Missing username or password"),
        (status = 403, description = "Admin or owner role required"),
        (status = 404, description = "Target account not found"),
        (status = 409, description = "Username already taken in this account")
    ),
    security(
        ("bearer_token" = [])
    )
)]
#[post("/users")]
pub async fn create_user(
    admin: AdminUser,
    body: web::Json<AdminCreateUserRequest>,
    ctx: web::Data<AuthContext>,
) -> AppResult<HttpResponse> {
    let scope = ctx.admin_account_filter(&admin.user);
    let user =
        users::admin_create_user(&ctx.db, &ctx.hasher, &admin.user, scope, body.into_inner())
            .await?;

    Ok(HttpResponse::Created().json(PublicUser::from(user)))
}

/// Get a user by ID.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User", body = PublicUser),
        (status = 403, description = "Admin or owner role required"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_token" = [])
    )
)]
#[get("/users/{id}")]
pub async fn get_user(
    admin: AdminUser,
    path: web::Path<String>,
    ctx: web::Data<AuthContext>,
) -> AppResult<HttpResponse> {
    let id = parse_user_id(&path)?;
    let scope = ctx.admin_account_filter(&admin.user);
    let user = users::get_user(&ctx.db, id, scope).await?;

    Ok(HttpResponse::Ok().json(PublicUser::from(user)))
}

/// Partially update a user. Omitted fields are left unchanged.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    request_body = AdminUpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = PublicUser),
        (status = 400, description = "Empty username or password"),
        (status = 403, description = "Admin or owner role required"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Username already taken in this account")
    ),
    security(
        ("bearer_token" = [])
    )
)]
#[put("/users/{id}")]
pub async fn update_user(
    admin: AdminUser,
    path: web::Path<String>,
    body: web::Json<AdminUpdateUserRequest>,
    ctx: web::Data<AuthContext>,
) -> AppResult<HttpResponse> {
    let id = parse_user_id(&path)?;
    let scope = ctx.admin_account_filter(&admin.user);
    let user = users::admin_update_user(&ctx.db, &ctx.hasher, id, scope, body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(PublicUser::from(user)))
}

/// Delete a user and their tokens in the background.
///
/// Always reports success, whether or not the user existed.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Deletion queued", body = SuccessResponse),
        (status = 403, description = "Admin or owner role required")
    ),
    security(
        ("bearer_token" = [])
    )
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    admin: AdminUser,
    path: web::Path<String>,
    ctx: web::Data<AuthContext>,
) -> AppResult<HttpResponse> {
    if let Ok(id) = Uuid::parse_str(&path) {
        let scope = ctx.admin_account_filter(&admin.user);
        users::admin_delete_user(&ctx.db, &ctx.writer, id, scope).await?;
    }

    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}
