//! E2E tests: own metadata update and the admin user surface.

use actix_web::test;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_admin_gate() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let tenant = create_tenant(&env, &app, "root", "pw").await;
    let user = register_user(&env, &app, &tenant.key, "plain", "pw").await;

    let req = test::TestRequest::get().uri("/api/v1/users").to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 401);

    let (status, _) = get_with_token(&app, "/api/v1/users", user["token"].as_str().unwrap()).await;
    assert_eq!(status, 403);

    let (status, body) = get_with_token(&app, "/api/v1/users", &tenant.owner_token).await;
    assert_eq!(status, 200);
    assert_eq!(body["users"].as_array().unwrap().len(), 2);
}

#[actix_rt::test]
async fn test_update_own_metadata_only() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let tenant = create_tenant(&env, &app, "root", "pw").await;
    let user = register_user(&env, &app, &tenant.key, "erin", "pw").await;
    let token = user["token"].as_str().unwrap();

    let (status, body) = json_with_token(
        &app,
        test::TestRequest::patch().uri("/api/v1/users"),
        token,
        serde_json::json!({
            "metadata": {"zeta": 1, "alpha": {"nested": [1, 2]}},
            "role": "owner",
            "username": "hijack",
        }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["role"], "");
    assert_eq!(body["username"], "erin");
    assert_eq!(body["metadata"]["alpha"]["nested"][1], 2);

    // Key order preserved verbatim
    let keys: Vec<&String> = body["metadata"].as_object().unwrap().keys().collect();
    assert_eq!(keys, ["zeta", "alpha"]);

    // Password untouched
    let (status, _) = credentials(&app, "login", &tenant.key, "erin", "pw").await;
    assert_eq!(status, 200);
}

#[actix_rt::test]
async fn test_admin_create_get_update() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let tenant = create_tenant(&env, &app, "root", "pw").await;

    let (status, created) = json_with_token(
        &app,
        test::TestRequest::post().uri("/api/v1/users"),
        &tenant.owner_token,
        serde_json::json!({
            "username": "helper",
            "password": "pw",
            "role": "admin",
            "metadata": {"team": "ops"},
        }),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(created["role"], "admin");
    assert_eq!(created["account_id"], tenant.account_id.as_str());
    assert!(created.get("token").is_none());

    let id = created["id"].as_str().unwrap();
    let (status, fetched) =
        get_with_token(&app, &format!("/api/v1/users/{id}"), &tenant.owner_token).await;
    assert_eq!(status, 200);
    assert_eq!(fetched["metadata"]["team"], "ops");

    let (status, updated) = json_with_token(
        &app,
        test::TestRequest::put().uri(&format!("/api/v1/users/{id}")),
        &tenant.owner_token,
        serde_json::json!({"username": "helper2", "password": "pw2"}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(updated["username"], "helper2");
    assert_eq!(updated["role"], "admin");
    assert_eq!(updated["metadata"]["team"], "ops");

    let (status, _) = credentials(&app, "login", &tenant.key, "helper2", "pw2").await;
    assert_eq!(status, 200);
}

#[actix_rt::test]
async fn test_admin_get_unknown_user_is_not_found() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let tenant = create_tenant(&env, &app, "root", "pw").await;

    let (status, body) = get_with_token(
        &app,
        &format!("/api/v1/users/{}", uuid::Uuid::new_v4()),
        &tenant.owner_token,
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "NOT_FOUND");

    let (status, _) =
        get_with_token(&app, "/api/v1/users/not-a-uuid", &tenant.owner_token).await;
    assert_eq!(status, 404);
}

#[actix_rt::test]
async fn test_admin_delete_always_succeeds() {
    let env = create_test_env().await;
    let app = create_test_app(&env).await;
    let tenant = create_tenant(&env, &app, "root", "pw").await;
    let user = register_user(&env, &app, &tenant.key, "gone", "pw").await;
    let id = user["id"].as_str().unwrap();
    let user_token = user["token"].as_str().unwrap();

    for target in [id.to_string(), uuid::Uuid::new_v4().to_string(), "junk".to_string()] {
        let req = test::TestRequest::delete()
            .uri(&format!("/api/v1/users/{target}"))
            .insert_header(("Authorization", format!("Bearer {}", tenant.owner_token)))
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, 200);
        assert_eq!(body["success"], true);
    }

    env.settle().await;

    let (status, _) =
        get_with_token(&app, &format!("/api/v1/users/{id}"), &tenant.owner_token).await;
    assert_eq!(status, 404);

    // The deleted user's tokens went with them
    let (_, me) = get_with_token(&app, "/api/v1/auth/me", user_token).await;
    assert!(me.is_null());
}
