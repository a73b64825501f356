//! API endpoint modules.

pub mod accounts;
pub mod auth;
pub mod health;
pub mod openapi;
pub mod users;

use actix_web::web;

use crate::error::AppError;

pub use health::configure_health_routes;
pub use openapi::ApiDoc;

/// Mount every `/api/v1` route.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health_routes)
        .configure(accounts::configure_routes)
        .configure(auth::configure_routes)
        .configure(users::configure_routes);
}

/// JSON body config that reports malformed bodies as `INVALID_INPUT`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| AppError::Validation(err.to_string()).into())
}
