//! Shared test helpers for API E2E tests.

use actix_web::dev::ServiceResponse;
use actix_web::{App, test, web};
use secrecy::SecretString;
use serde_json::Value;
use tenant_auth_lib::api;
use tenant_auth_lib::auth::{AdminKey, AuthContext};
use tenant_auth_lib::config::{AdminScope, Config, DatabaseSettings, Environment, HashCost};
use tenant_auth_lib::db::DbPool;

/// Admin key used in tests.
pub const TEST_ADMIN_KEY: &str = "test-admin-key-for-api-e2e";

/// Signing secret used in tests.
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-api-e2e";

/// Per-test server state.
pub struct TestEnv {
    pub pool: DbPool,
    pub ctx: web::Data<AuthContext>,
    pub config: Config,
}

impl TestEnv {
    /// Wait for background token records and deletions to land.
    ///
    /// Token fingerprints are written asynchronously after login, so a token
    /// used immediately may not resolve yet. Tests that need the record call
    /// this instead of racing the writer. The window itself is exercised by
    /// the resolver unit tests.
    pub async fn settle(&self) {
        self.ctx.store.flush().await;
    }
}

pub fn test_config(admin_scope: AdminScope, accept_account_id_header: bool) -> Config {
    Config {
        environment: Environment::Development,
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        jwt_secret: SecretString::from(TEST_JWT_SECRET.to_string()),
        token_ttl_days: 14,
        admin_key: Some(TEST_ADMIN_KEY.to_string()),
        admin_scope,
        accept_account_id_header,
        // Cheap enough for tests
        hash_cost: HashCost {
            memory_kib: 8,
            time_cost: 1,
            parallelism: 1,
        },
    }
}

/// Fresh migrated database plus auth context, default settings.
pub async fn create_test_env() -> TestEnv {
    create_test_env_with(test_config(AdminScope::Global, false)).await
}

pub async fn create_test_env_with(config: Config) -> TestEnv {
    let pool = DbPool::new(&config)
        .await
        .expect("Failed to open in-memory database");
    pool.run_migrations()
        .await
        .expect("Failed to run migrations");

    let ctx = AuthContext::new(&config, pool.connection().clone())
        .expect("Failed to build auth context");

    TestEnv {
        pool,
        ctx: web::Data::new(ctx),
        config,
    }
}

/// Create a test app wired like the server.
pub async fn create_test_app(
    env: &TestEnv,
) -> impl actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>
{
    let admin_key = AdminKey::new(env.config.admin_key.clone());

    test::init_service(
        App::new()
            .app_data(web::Data::new(env.pool.clone()))
            .app_data(env.ctx.clone())
            .app_data(web::Data::new(admin_key))
            .app_data(web::Data::new(env.config.clone()))
            .app_data(api::json_config())
            .service(web::scope("/api/v1").configure(api::configure_routes)),
    )
    .await
}

/// Send a request and return status plus JSON body.
pub async fn send<S>(app: &S, req: actix_http::Request) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let body = test::read_body(resp).await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Tenant created through the bootstrap endpoint.
pub struct Tenant {
    pub account_id: String,
    pub key: String,
    pub owner_id: String,
    pub owner_token: String,
}

/// Create an account via the bootstrap endpoint and wait for the owner's token to be recorded.
pub async fn create_tenant<S>(env: &TestEnv, app: &S, owner: &str, password: &str) -> Tenant
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/accounts")
        .insert_header(("X-Admin-Key", TEST_ADMIN_KEY))
        .set_json(serde_json::json!({
            "name": format!("{owner}'s account"),
            "username": owner,
            "password": password,
        }))
        .to_request();

    let (status, body) = send(app, req).await;
    assert_eq!(status, 201, "Failed to create account: {}", body);
    env.settle().await;

    Tenant {
        account_id: body["account"]["id"].as_str().unwrap().to_string(),
        key: body["key"]["id"].as_str().unwrap().to_string(),
        owner_id: body["owner"]["id"].as_str().unwrap().to_string(),
        owner_token: body["owner"]["token"].as_str().unwrap().to_string(),
    }
}

/// POST credentials to `/auth/register` or `/auth/login` with an account key.
pub async fn credentials<S>(
    app: &S,
    path: &str,
    account_key: &str,
    username: &str,
    password: &str,
) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/auth/{path}"))
        .insert_header(("Account-Key", account_key))
        .set_json(serde_json::json!({
            "username": username,
            "password": password,
        }))
        .to_request();
    send(app, req).await
}

/// Register a user and wait for their token to be recorded. Returns the body.
pub async fn register_user<S>(
    env: &TestEnv,
    app: &S,
    account_key: &str,
    username: &str,
    password: &str,
) -> Value
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let (status, body) = credentials(app, "register", account_key, username, password).await;
    assert_eq!(status, 201, "Failed to register {}: {}", username, body);
    env.settle().await;
    body
}

/// GET with a bearer token.
pub async fn get_with_token<S>(app: &S, uri: &str, token: &str) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::get()
        .uri(uri)
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    send(app, req).await
}

/// Request with a bearer token and JSON body.
pub async fn json_with_token<S>(
    app: &S,
    req: test::TestRequest,
    token: &str,
    body: Value,
) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = req
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(body)
        .to_request();
    send(app, req).await
}
