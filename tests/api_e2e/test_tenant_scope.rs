//! E2E tests: per-account username uniqueness and admin reach across accounts.

use actix_web::test;
use tenant_auth_lib::config::AdminScope;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_username_unique_per_account() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let first = create_tenant(&env, &app, "root", "pw").await;
    let second = create_tenant(&env, &app, "other", "pw").await;

    // Same username as the first owner, same account
    let (status, body) = credentials(&app, "register", &first.key, "root", "pw2").await;
    assert_eq!(status, 409);
    assert_eq!(body["error"], "CONFLICT");

    // Same username, different account
    let (status, body) = credentials(&app, "register", &second.key, "root", "pw2").await;
    assert_eq!(status, 201);
    assert_eq!(body["account_id"], second.account_id.as_str());
}

#[actix_rt::test]
async fn test_global_scope_spans_accounts() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let first = create_tenant(&env, &app, "root", "pw").await;
    let second = create_tenant(&env, &app, "other", "pw").await;

    let (status, body) = get_with_token(&app, "/api/v1/users", &first.owner_token).await;
    assert_eq!(status, 200);
    assert_eq!(body["users"].as_array().unwrap().len(), 2);

    let (status, _) = get_with_token(
        &app,
        &format!("/api/v1/users/{}", second.owner_id),
        &first.owner_token,
    )
    .await;
    assert_eq!(status, 200);
}

#[actix_rt::test]
async fn test_tenant_scope_filters_to_callers_account() {
    let env = create_test_env_with(test_config(AdminScope::Tenant, false)).await;
    let app = create_test_app(&env).await;
    let first = create_tenant(&env, &app, "root", "pw").await;
    let second = create_tenant(&env, &app, "other", "pw").await;

    let (status, body) = get_with_token(&app, "/api/v1/users", &first.owner_token).await;
    assert_eq!(status, 200);
    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"], first.owner_id.as_str());

    let (status, _) = get_with_token(
        &app,
        &format!("/api/v1/users/{}", second.owner_id),
        &first.owner_token,
    )
    .await;
    assert_eq!(status, 404);

    let (status, _) = json_with_token(
        &app,
        test::TestRequest::post().uri("/api/v1/users"),
        &first.owner_token,
        serde_json::json!({
            "username": "intruder",
            "password": "pw",
            "account_id": second.account_id,
        }),
    )
    .await;
    assert_eq!(status, 403);

    // Delete across accounts reports success but does nothing
    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/users/{}", second.owner_id))
        .insert_header(("Authorization", format!("Bearer {}", first.owner_token)))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    env.settle().await;

    let (status, _) = get_with_token(
        &app,
        &format!("/api/v1/users/{}", second.owner_id),
        &second.owner_token,
    )
    .await;
    assert_eq!(status, 200);
}
