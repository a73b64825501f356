//! Actix-web extractors acting as request guards.
//!
//! - [`AccountScope`]: a valid `Account-Key` (or, when enabled, `Account-Id`)
//! - [`OptionalUser`]: the caller's user if a valid token was presented, never fails
//! - [`AuthenticatedUser`]: a valid session token
//! - [`AdminUser`]: a valid session token whose user holds a privileged role
//! - [`BootstrapAdmin`]: the configured `X-Admin-Key`
//!
//! Presented secrets are wrapped in `SecretString` as soon as they are read.

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::LocalBoxFuture;
use secrecy::{ExposeSecret, SecretString};
use std::future::{Ready, ready};
use tracing::debug;
use uuid::Uuid;

use super::{AdminKey, AuthContext};
use crate::config::{ACCOUNT_ID_HEADER, ACCOUNT_KEY_HEADER, ADMIN_KEY_HEADER, LEGACY_TOKEN_HEADER};
use crate::error::AppError;
use crate::models::User;
use crate::services::accounts;

/// Extract a secret header value, wrapping it in SecretString.
/// Returns None if the header is missing, empty or invalid UTF-8.
fn extract_secret_header(req: &HttpRequest, header_name: &str) -> Option<SecretString> {
    req.headers()
        .get(header_name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| SecretString::from(s.to_string()))
}

/// Session token from `Authorization: Bearer`, falling back to `X-Token`.
fn extract_token(req: &HttpRequest) -> Option<SecretString> {
    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            v.strip_prefix("Bearer ")
                .or_else(|| v.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| SecretString::from(s.to_string()));

    bearer.or_else(|| extract_secret_header(req, LEGACY_TOKEN_HEADER))
}

fn auth_context(req: &HttpRequest) -> Result<web::Data<AuthContext>, AppError> {
    req.app_data::<web::Data<AuthContext>>()
        .cloned()
        .ok_or_else(|| AppError::Internal("AuthContext is not registered".to_string()))
}

/// Tenant the request is scoped to.
#[derive(Debug, Clone, Copy)]
pub struct AccountScope {
    pub account_id: Uuid,
}

impl FromRequest for AccountScope {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let ctx = auth_context(req);
        let account_key = extract_secret_header(req, ACCOUNT_KEY_HEADER);
        let account_id = extract_secret_header(req, ACCOUNT_ID_HEADER);

        Box::pin(async move {
            let ctx = ctx?;

            if let Some(key) = account_key {
                let account_id = accounts::validate_key(&ctx.db, key.expose_secret())
                    .await?
                    .ok_or_else(|| AppError::Unauthorized("Invalid account key".to_string()))?;
                return Ok(AccountScope { account_id });
            }

            if ctx.accept_account_id_header
                && let Some(raw) = account_id
            {
                let account_id = accounts::validate_account_id(&ctx.db, raw.expose_secret())
                    .await?
                    .ok_or_else(|| AppError::Unauthorized("Invalid account id".to_string()))?;
                return Ok(AccountScope { account_id });
            }

            Err(AppError::Unauthorized(format!(
                "Missing account key. Provide {} header.",
                ACCOUNT_KEY_HEADER
            )))
        })
    }
}

/// Caller's user when a valid token was presented, otherwise `None`.
#[derive(Debug)]
pub struct OptionalUser(pub Option<User>);

impl FromRequest for OptionalUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let ctx = auth_context(req);
        let token = extract_token(req);

        Box::pin(async move {
            let ctx = ctx?;
            let Some(token) = token else {
                return Ok(OptionalUser(None));
            };

            match ctx.resolve(token.expose_secret()).await {
                Ok(user) => Ok(OptionalUser(Some(user))),
                Err(e) => {
                    debug!("Presented token did not resolve: {}", e);
                    Ok(OptionalUser(None))
                }
            }
        })
    }
}

/// Caller holding a valid session token.
#[derive(Debug)]
pub struct AuthenticatedUser {
    pub user: User,
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let ctx = auth_context(req);
        let token = extract_token(req);

        Box::pin(async move {
            let ctx = ctx?;
            let token = token.ok_or_else(|| {
                AppError::Unauthorized("Missing session token. Provide a Bearer token.".to_string())
            })?;

            let user = ctx.resolve(token.expose_secret()).await?;
            Ok(AuthenticatedUser { user })
        })
    }
}

/// Caller holding a valid session token and the `admin` or `owner` role.
#[derive(Debug)]
pub struct AdminUser {
    pub user: User,
}

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let authenticated = AuthenticatedUser::from_request(req, payload);

        Box::pin(async move {
            let AuthenticatedUser { user } = authenticated.await?;
            if !user.is_privileged() {
                return Err(AppError::Forbidden(
                    "Admin or owner role required".to_string(),
                ));
            }
            Ok(AdminUser { user })
        })
    }
}

/// Caller presenting the configured bootstrap admin key.
#[derive(Debug)]
pub struct BootstrapAdmin;

impl FromRequest for BootstrapAdmin {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(stored) = req.app_data::<web::Data<AdminKey>>() else {
            return ready(Err(AppError::Internal(
                "AdminKey is not registered".to_string(),
            )));
        };

        let provided = extract_secret_header(req, ADMIN_KEY_HEADER);
        match provided {
            Some(ref key) if stored.verify(key.expose_secret()) => ready(Ok(BootstrapAdmin)),
            Some(_) => ready(Err(AppError::Unauthorized("Invalid admin key".to_string()))),
            None => ready(Err(AppError::Unauthorized(format!(
                "Missing admin key. Provide {} header.",
                ADMIN_KEY_HEADER
            )))),
        }
    }
}
