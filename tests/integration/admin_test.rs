//! Admin-only endpoints over HTTP.

use axum::http::StatusCode;
use serde_json::json;

use tokengate_entity::Role;

use crate::helpers::TestApp;

const ADMIN: &str = "79990000100";
const USER: &str = "79990000001";

#[tokio::test]
async fn test_change_role_revokes_target() {
    let app = TestApp::new();
    app.register_with_role(ADMIN, Role::Admin).await;
    let user_id = app.register(USER).await;
    let admin = app.login(ADMIN).await;
    let user = app.login(USER).await;
    assert_eq!(app.me_status(&user.access).await, StatusCode::OK);

    let res = app
        .post(
            "/v1/idm/change_role",
            json!({ "user_id": user_id, "role": "moderator" }),
            Some(&admin.access),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["role"], "moderator");

    assert_eq!(app.me_status(&user.access).await, StatusCode::UNAUTHORIZED);
    let user = app.login(USER).await;
    let me = app.get("/v1/idm/me", Some(&user.access)).await;
    assert_eq!(me.data()["role"], "moderator");
}

#[tokio::test]
async fn test_change_role_is_admin_only() {
    let app = TestApp::new();
    let admin_id = app.register_with_role(ADMIN, Role::Admin).await;
    let user_id = app.register(USER).await;
    let admin = app.login(ADMIN).await;
    let user = app.login(USER).await;

    let res = app
        .post(
            "/v1/idm/change_role",
            json!({ "user_id": admin_id, "role": "user" }),
            Some(&user.access),
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .post(
            "/v1/idm/change_role",
            json!({ "user_id": admin_id, "role": "user" }),
            Some(&admin.access),
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .post(
            "/v1/idm/change_role",
            json!({ "user_id": user_id, "role": "root" }),
            Some(&admin.access),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_users_paging() {
    let app = TestApp::new();
    app.register_with_role(ADMIN, Role::Admin).await;
    for i in 0..3 {
        app.register(&format!("7999000001{i}")).await;
    }
    let admin = app.login(ADMIN).await;

    let res = app.get("/v1/idm/users?limit=2&offset=1", Some(&admin.access)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["total"], 4);
    assert_eq!(res.data()["limit"], 2);
    assert_eq!(res.data()["items"].as_array().unwrap().len(), 2);
    assert!(res.data()["items"][0].get("password_hash").is_none());

    let res = app.get("/v1/idm/users?limit=1000", Some(&admin.access)).await;
    assert_eq!(res.data()["limit"], 20);
}

#[tokio::test]
async fn test_list_users_forbidden_for_users() {
    let app = TestApp::new();
    app.register(USER).await;
    let user = app.login(USER).await;

    let res = app.get("/v1/idm/users", Some(&user.access)).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_resets_another_subject() {
    let app = TestApp::new();
    app.register_with_role(ADMIN, Role::Admin).await;
    let user_id = app.register(USER).await;
    let admin = app.login(ADMIN).await;
    let user = app.login(USER).await;

    let res = app
        .post("/v1/idm/reset_token", json!({ "user_id": user_id }), Some(&admin.access))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(app.me_status(&user.access).await, StatusCode::UNAUTHORIZED);
    assert_eq!(app.me_status(&admin.access).await, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_digs_up_deleted_user() {
    let app = TestApp::new();
    app.register_with_role(ADMIN, Role::Admin).await;
    let user_id = app.register(USER).await;
    let admin = app.login(ADMIN).await;

    let res = app
        .post("/v1/idm/delete_user", json!({ "user_id": user_id }), Some(&admin.access))
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app
        .post("/v1/idm/digup_user", json!({ "user_id": user_id }), Some(&admin.access))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["id"], user_id);

    app.login(USER).await;
}
