//! Logout, session resets, and cascade revocation over HTTP.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::{PASSWORD, TestApp};

#[tokio::test]
async fn test_logout_revokes_only_current_pair() {
    let app = TestApp::new();
    app.register("79990000001").await;
    let phone = app.login("79990000001").await;
    let laptop = app.login("79990000001").await;

    // Warm the cache for the pair about to be revoked.
    assert_eq!(app.me_status(&phone.access).await, StatusCode::OK);

    let res = app.post("/v1/idm/logout", json!({}), Some(&phone.access)).await;
    assert_eq!(res.status, StatusCode::OK);

    assert_eq!(app.me_status(&phone.access).await, StatusCode::UNAUTHORIZED);
    assert_eq!(app.me_status(&laptop.access).await, StatusCode::OK);

    let res = app
        .post("/v1/idm/refresh", json!({ "refresh_token": phone.refresh }), None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reset_token_revokes_every_session() {
    let app = TestApp::new();
    let id = app.register("79990000001").await;
    let a = app.login("79990000001").await;
    let b = app.login("79990000001").await;
    assert_eq!(app.me_status(&a.access).await, StatusCode::OK);

    let res = app.post("/v1/idm/reset_token", json!({}), Some(&a.access)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["user_id"], id);

    assert_eq!(app.me_status(&a.access).await, StatusCode::UNAUTHORIZED);
    assert_eq!(app.me_status(&b.access).await, StatusCode::UNAUTHORIZED);

    let res = app
        .post("/v1/idm/refresh", json!({ "refresh_token": b.refresh }), None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    // Signing in again works.
    let fresh = app.login("79990000001").await;
    assert_eq!(app.me_status(&fresh.access).await, StatusCode::OK);
}

#[tokio::test]
async fn test_password_change_revokes_sessions() {
    let app = TestApp::new();
    app.register("79990000001").await;
    let tokens = app.login("79990000001").await;
    assert_eq!(app.me_status(&tokens.access).await, StatusCode::OK);

    let res = app
        .post("/v1/idm/update", json!({ "password": "new-secret" }), Some(&tokens.access))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(app.me_status(&tokens.access).await, StatusCode::UNAUTHORIZED);

    let old = app
        .post(
            "/v1/idm/login",
            json!({ "phone": "79990000001", "password": PASSWORD }),
            None,
        )
        .await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);

    let new = app
        .post(
            "/v1/idm/login",
            json!({ "phone": "79990000001", "password": "new-secret" }),
            None,
        )
        .await;
    assert_eq!(new.status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_requires_a_field() {
    let app = TestApp::new();
    app.register("79990000001").await;
    let tokens = app.login("79990000001").await;

    let res = app.post("/v1/idm/update", json!({}), Some(&tokens.access)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.me_status(&tokens.access).await, StatusCode::OK);
}
