//! Tenant auth server - main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tenant_auth_lib::api::{self, ApiDoc};
use tenant_auth_lib::auth::{AdminKey, AuthContext};
use tenant_auth_lib::config::{
    ACCOUNT_ID_HEADER, ACCOUNT_KEY_HEADER, ADMIN_KEY_HEADER, Config, LEGACY_TOKEN_HEADER,
};
use tenant_auth_lib::db::DbPool;
use tenant_auth_lib::middleware::RequestLogger;

/// Perform health check (for Docker healthcheck).
fn health_check() -> bool {
    Config::from_env().is_ok()
}

fn allowed_headers() -> Vec<header::HeaderName> {
    vec![
        header::AUTHORIZATION,
        header::ACCEPT,
        header::CONTENT_TYPE,
        header::HeaderName::from_static("account-key"),
        header::HeaderName::from_static("account-id"),
        header::HeaderName::from_static("x-admin-key"),
        header::HeaderName::from_static("x-token"),
    ]
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Check for --health-check flag (used by Docker HEALTHCHECK)
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(if health_check() { 0 } else { 1 });
    }

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL and TAS_JWT_SECRET must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Tenant Auth Server");
    info!("  Environment: {}", config.environment);
    info!("  Admin scope: {}", config.admin_scope);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }
    if config.accept_account_id_header {
        warn!(
            "{} header accepted as tenant scope alongside {}",
            ACCOUNT_ID_HEADER, ACCOUNT_KEY_HEADER
        );
    }
    if config.admin_key.is_none() {
        info!(
            "No {} configured; account creation over HTTP is disabled",
            ADMIN_KEY_HEADER
        );
    }

    let pool = match DbPool::new(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = pool.run_migrations().await {
        error!("Failed to run migrations: {}", e);
        std::process::exit(1);
    }
    info!("Database migrations complete");

    let auth_context = match AuthContext::new(&config, pool.connection().clone()) {
        Ok(ctx) => web::Data::new(ctx),
        Err(e) => {
            error!("Failed to initialize authentication: {}", e);
            std::process::exit(1);
        }
    };

    // Prepare shared state
    let bind_address = config.bind_address();
    let admin_key = web::Data::new(AdminKey::new(config.admin_key.clone()));
    let pool_data = web::Data::new(pool);
    let is_development = config.is_development();
    let config_data = web::Data::new(config);

    let worker_count = if is_development { 4 } else { num_cpus::get() };
    info!(
        "Starting server at http://{} ({} workers), legacy token header {}",
        bind_address, worker_count, LEGACY_TOKEN_HEADER
    );

    HttpServer::new(move || {
        let cors = if is_development {
            // Permissive CORS for development
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
                .allowed_headers(allowed_headers())
                .max_age(3600)
        } else {
            // Restrictive CORS for production (same-origin only)
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
                .allowed_headers(allowed_headers())
                .max_age(3600)
        };

        App::new()
            // CORS must wrap everything else
            .wrap(cors)
            .wrap(RequestLogger)
            .app_data(pool_data.clone())
            .app_data(auth_context.clone())
            .app_data(admin_key.clone())
            .app_data(config_data.clone())
            .app_data(api::json_config())
            .service(web::scope("/api/v1").configure(api::configure_routes))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .workers(worker_count)
    .bind(&bind_address)?
    .run()
    .await
}
