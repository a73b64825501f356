//! E2E tests: register, login, token resolution and logout.

use actix_web::test;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use secrecy::SecretString;
use tenant_auth_lib::auth::TokenCodec;
use tenant_auth_lib::config::AdminScope;
use tenant_auth_lib::db::tokens;
use tenant_auth_lib::models::SessionClaims;
use uuid::Uuid;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_register_login_resolve_round_trip() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let tenant = create_tenant(&env, &app, "root", "pw").await;

    let registered = register_user(&env, &app, &tenant.key, "alice", "secret").await;
    assert!(registered["token"].is_string());
    assert_eq!(registered["role"], "");

    let (status, logged_in) = credentials(&app, "login", &tenant.key, "alice", "secret").await;
    assert_eq!(status, 200);
    assert_eq!(logged_in["id"], registered["id"]);
    env.settle().await;

    let token = logged_in["token"].as_str().unwrap();
    let (status, me) = get_with_token(&app, "/api/v1/auth/me", token).await;
    assert_eq!(status, 200);
    assert_eq!(me["id"], registered["id"]);
    assert_eq!(me["username"], "alice");
    assert_eq!(me["token"], token);
}

#[actix_rt::test]
async fn test_login_errors_do_not_reveal_existence() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let tenant = create_tenant(&env, &app, "root", "pw").await;
    register_user(&env, &app, &tenant.key, "bob", "right").await;

    let (wrong_status, wrong_body) = credentials(&app, "login", &tenant.key, "bob", "wrong").await;
    let (ghost_status, ghost_body) = credentials(&app, "login", &tenant.key, "ghost", "right").await;

    assert_eq!(wrong_status, 401);
    assert_eq!(ghost_status, 401);
    assert_eq!(wrong_body, ghost_body);
    assert_eq!(wrong_body["error"], "INVALID_CREDENTIALS");
}

#[actix_rt::test]
async fn test_register_ignores_requested_role() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let tenant = create_tenant(&env, &app, "root", "pw").await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .insert_header(("Account-Key", tenant.key.as_str()))
        .set_json(serde_json::json!({
            "username": "mallory",
            "password": "pw",
            "role": "owner",
        }))
        .to_request();
    let (status, body) = send(&app, req).await;

    assert_eq!(status, 201);
    assert_eq!(body["role"], "");
}

#[actix_rt::test]
async fn test_register_requires_credentials_and_key() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let tenant = create_tenant(&env, &app, "root", "pw").await;

    let (status, body) = credentials(&app, "register", &tenant.key, "", "pw").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_INPUT");

    let (status, _) = credentials(&app, "register", &Uuid::new_v4().to_string(), "u", "pw").await;
    assert_eq!(status, 401);

    let (status, _) = credentials(&app, "register", "not-a-uuid", "u", "pw").await;
    assert_eq!(status, 401);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(serde_json::json!({"username": "u", "password": "pw"}))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 401);
}

#[actix_rt::test]
async fn test_logout_revokes_token() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let tenant = create_tenant(&env, &app, "root", "pw").await;
    let user = register_user(&env, &app, &tenant.key, "carol", "pw").await;
    let token = user["token"].as_str().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);

    let (status, me) = get_with_token(&app, "/api/v1/auth/me", token).await;
    assert_eq!(status, 200);
    assert!(me.is_null());

    let (status, _) = json_with_token(
        &app,
        test::TestRequest::patch().uri("/api/v1/users"),
        token,
        serde_json::json!({"metadata": {}}),
    )
    .await;
    assert_eq!(status, 401);

    // Signature still verifies; only the record is gone
    assert!(env.ctx.codec.verify(token).is_ok());
}

#[actix_rt::test]
async fn test_logout_always_succeeds() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .insert_header(("Authorization", "Bearer garbage.token.value"))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
}

#[actix_rt::test]
async fn test_me_without_token_is_null() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;

    let req = test::TestRequest::get().uri("/api/v1/auth/me").to_request();
    let (status, body) = send(&app, req).await;

    assert_eq!(status, 200);
    assert!(body.is_null());
}

#[actix_rt::test]
async fn test_forged_tokens_rejected_even_when_fingerprint_recorded() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let tenant = create_tenant(&env, &app, "root", "pw").await;
    let user_id = Uuid::parse_str(&tenant.owner_id).unwrap();
    let account_id = Uuid::parse_str(&tenant.account_id).unwrap();

    // Wrong secret; distinct iss so the fingerprint differs from the owner's real token
    let now = Utc::now().timestamp();
    let forger = TokenCodec::new(SecretString::from("not-the-secret".to_string()), 14);
    let forged = forger
        .sign(&SessionClaims {
            uid: user_id,
            aid: account_id,
            iss: now - 5,
            exp: now + 3600,
        })
        .unwrap();
    let fingerprint = TokenCodec::fingerprint(&forged).unwrap();
    tokens::insert(env.pool.connection(), &fingerprint, user_id)
        .await
        .unwrap();

    let (status, _) = get_with_token(&app, "/api/v1/accounts/keys", &forged).await;
    assert_eq!(status, 401);

    // alg "none", reusing a genuine recorded header.payload
    let genuine = tenant.owner_token.as_str();
    let (_, payload_and_sig) = genuine.split_once('.').unwrap();
    let (payload, _) = payload_and_sig.split_once('.').unwrap();
    let none_header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let unsigned = format!("{none_header}.{payload}.");
    tokens::insert(
        env.pool.connection(),
        &format!("{none_header}.{payload}"),
        user_id,
    )
    .await
    .unwrap();

    let (status, _) = get_with_token(&app, "/api/v1/accounts/keys", &unsigned).await;
    assert_eq!(status, 401);
}

#[actix_rt::test]
async fn test_token_for_other_account_is_rejected() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let tenant = create_tenant(&env, &app, "root", "pw").await;
    let user_id = Uuid::parse_str(&tenant.owner_id).unwrap();

    // Correctly signed, recorded, but claims the wrong account
    let now = Utc::now().timestamp();
    let token = env
        .ctx
        .codec
        .sign(&SessionClaims {
            uid: user_id,
            aid: Uuid::new_v4(),
            iss: now,
            exp: now + 3600,
        })
        .unwrap();
    tokens::insert(
        env.pool.connection(),
        &TokenCodec::fingerprint(&token).unwrap(),
        user_id,
    )
    .await
    .unwrap();

    let (status, me) = get_with_token(&app, "/api/v1/auth/me", &token).await;
    assert_eq!(status, 200);
    assert!(me.is_null());
}

#[actix_rt::test]
async fn test_legacy_token_header_is_accepted() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let tenant = create_tenant(&env, &app, "root", "pw").await;

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(("X-Token", tenant.owner_token.as_str()))
        .to_request();
    let (status, me) = send(&app, req).await;

    assert_eq!(status, 200);
    assert_eq!(me["id"], tenant.owner_id.as_str());
}

#[actix_rt::test]
async fn test_account_id_header_only_when_enabled() {
    for enabled in [false, true] {
        let env = create_test_env_with(test_config(AdminScope::Global, enabled)).await;
        let app = create_test_app(&env).await;
        let tenant = create_tenant(&env, &app, "root", "pw").await;

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .insert_header(("Account-Id", tenant.account_id.as_str()))
            .set_json(serde_json::json!({"username": "root", "password": "pw"}))
            .to_request();
        let (status, _) = send(&app, req).await;

        assert_eq!(status, if enabled { 200 } else { 401 });
    }
}

#[actix_rt::test]
async fn test_change_password() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let tenant = create_tenant(&env, &app, "root", "pw").await;
    let user = register_user(&env, &app, &tenant.key, "dave", "old").await;
    let token = user["token"].as_str().unwrap();

    let (status, body) = json_with_token(
        &app,
        test::TestRequest::put().uri("/api/v1/auth/password"),
        token,
        serde_json::json!({"password": "wrong", "newPassword": "new"}),
    )
    .await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "INVALID_CREDENTIALS");

    let (status, body) = json_with_token(
        &app,
        test::TestRequest::put().uri("/api/v1/auth/password"),
        token,
        serde_json::json!({"password": "old", "newPassword": ""}),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_INPUT");

    let (status, body) = json_with_token(
        &app,
        test::TestRequest::put().uri("/api/v1/auth/password"),
        token,
        serde_json::json!({"password": "old", "newPassword": "new"}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);

    let (status, _) = credentials(&app, "login", &tenant.key, "dave", "old").await;
    assert_eq!(status, 401);
    let (status, _) = credentials(&app, "login", &tenant.key, "dave", "new").await;
    assert_eq!(status, 200);
}

#[actix_rt::test]
async fn test_malformed_body_is_invalid_input() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let tenant = create_tenant(&env, &app, "root", "pw").await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .insert_header(("Account-Key", tenant.key.as_str()))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let (status, body) = send(&app, req).await;

    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_INPUT");
}
