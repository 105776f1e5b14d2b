//! Self-service deletion and restoration over HTTP.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::{PASSWORD, TestApp};

#[tokio::test]
async fn test_delete_self_frees_phone() {
    let app = TestApp::new();
    let id = app.register("79990000001").await;
    let tokens = app.login("79990000001").await;

    let res = app
        .post("/v1/idm/delete_user", json!({ "user_id": id }), Some(&tokens.access))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(app.me_status(&tokens.access).await, StatusCode::UNAUTHORIZED);

    let login = app
        .post(
            "/v1/idm/login",
            json!({ "phone": "79990000001", "password": PASSWORD }),
            None,
        )
        .await;
    assert_eq!(login.status, StatusCode::UNAUTHORIZED);

    // The phone is free again while the account is deleted.
    let other = app.register("79990000001").await;
    assert_ne!(other, id);
}

#[tokio::test]
async fn test_deleted_user_cannot_dig_up_self() {
    let app = TestApp::new();
    let id = app.register("79990000001").await;
    let tokens = app.login("79990000001").await;

    let res = app
        .post("/v1/idm/delete_user", json!({ "user_id": id }), Some(&tokens.access))
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app
        .post("/v1/idm/digup_user", json!({ "user_id": id }), Some(&tokens.access))
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let login = app
        .post(
            "/v1/idm/login",
            json!({ "phone": "79990000001", "password": PASSWORD }),
            None,
        )
        .await;
    assert_eq!(login.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_cannot_delete_someone_else() {
    let app = TestApp::new();
    app.register("79990000001").await;
    let victim = app.register("79990000002").await;
    let tokens = app.login("79990000001").await;

    let res = app
        .post("/v1/idm/delete_user", json!({ "user_id": victim }), Some(&tokens.access))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.error(), "PERMISSION_DENIED");
}

#[tokio::test]
async fn test_delete_rejects_invalid_body() {
    let app = TestApp::new();
    app.register("79990000001").await;
    let tokens = app.login("79990000001").await;

    let res = app
        .post("/v1/idm/delete_user", json!({ "user_id": 0 }), Some(&tokens.access))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}
