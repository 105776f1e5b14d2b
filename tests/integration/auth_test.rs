//! Registration, login, refresh, and token validation over HTTP.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::{PASSWORD, TestApp};

#[tokio::test]
async fn test_ping() {
    let app = TestApp::new();
    let res = app.get("/v1/idm/ping", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["success"], true);
    assert_eq!(res.data()["status"], "ok");
    assert_eq!(res.data()["database"], true);
    assert_eq!(res.data()["cache"], true);
}

#[tokio::test]
async fn test_register_and_login() {
    let app = TestApp::new();
    let id = app.register("79990000001").await;
    let tokens = app.login("79990000001").await;

    let res = app.get("/v1/idm/me", Some(&tokens.access)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["id"], id);
    assert_eq!(res.data()["role"], "user");
    assert_eq!(res.data()["phone"], "79990000001");
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = TestApp::new();
    app.register("79990000001").await;

    let res = app
        .post(
            "/v1/idm/registration",
            json!({ "phone": "79990000001", "password": "other" }),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.error(), "CONFLICT");
}

#[tokio::test]
async fn test_registration_validates_body() {
    let app = TestApp::new();

    let res = app
        .post("/v1/idm/registration", json!({ "phone": "", "password": PASSWORD }), None)
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .post("/v1/idm/registration", json!({ "phone": "79990000001" }), None)
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::new();
    app.register("79990000001").await;

    let wrong_password = app
        .post(
            "/v1/idm/login",
            json!({ "phone": "79990000001", "password": "nope" }),
            None,
        )
        .await;
    let unknown_phone = app
        .post(
            "/v1/idm/login",
            json!({ "phone": "79990000009", "password": PASSWORD }),
            None,
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_phone.body);
}

#[tokio::test]
async fn test_missing_or_garbage_token_is_unauthorized() {
    let app = TestApp::new();

    let res = app.get("/v1/idm/me", None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.error(), "INVALID_TOKEN");

    assert_eq!(app.me_status("not-a-jwt").await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_issues_working_pair() {
    let app = TestApp::new();
    app.register("79990000001").await;
    let first = app.login("79990000001").await;

    let res = app
        .post("/v1/idm/refresh", json!({ "refresh_token": first.refresh }), None)
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let access = res.data()["access_token"].as_str().unwrap();
    assert_ne!(access, first.access);
    assert_eq!(app.me_status(access).await, StatusCode::OK);

    // The previous pair is left untouched by a refresh.
    assert_eq!(app.me_status(&first.access).await, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_with_unknown_token() {
    let app = TestApp::new();
    let res = app
        .post("/v1/idm/refresh", json!({ "refresh_token": "unknown" }), None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}
