//! Liveness and readiness endpoints.
//!
//! Readiness means the database answers and every schema migration has been
//! applied, so the token and user tables the auth guards query exist.

use actix_web::{HttpResponse, get, web};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::DbPool;

/// Liveness response.
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

/// Readiness response.
#[derive(Serialize, ToSchema)]
pub struct ReadyResponse {
    status: &'static str,
    database: &'static str,
    pending_migrations: usize,
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Process is up", body = HealthResponse)
    )
)]
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Database reachable and schema current", body = ReadyResponse),
        (status = 503, description = "Database unreachable or migrations pending", body = ReadyResponse)
    )
)]
#[get("/ready")]
pub async fn ready(pool: web::Data<DbPool>) -> HttpResponse {
    match pool.pending_migrations().await {
        Ok(0) => HttpResponse::Ok().json(ReadyResponse {
            status: "ready",
            database: "connected",
            pending_migrations: 0,
        }),
        Ok(pending) => {
            tracing::warn!("Not ready: {} migration(s) pending", pending);
            HttpResponse::ServiceUnavailable().json(ReadyResponse {
                status: "migrating",
                database: "connected",
                pending_migrations: pending,
            })
        }
        Err(e) => {
            tracing::warn!("Readiness check failed: {}", e);
            HttpResponse::ServiceUnavailable().json(ReadyResponse {
                status: "unavailable",
                database: "unreachable",
                pending_migrations: 0,
            })
        }
    }
}

/// Configure health routes.
pub fn configure_health_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(ready);
}
