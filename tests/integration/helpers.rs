//! Shared test helpers for integration tests.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use tokengate_api::AppState;
use tokengate_auth::{Argon2CredentialHasher, AuthorizationGate, SessionManager, TokenSigner};
use tokengate_cache::memory::MemoryCacheProvider;
use tokengate_cache::{CacheManager, ValidationCache};
use tokengate_core::config::{AppConfig, MemoryCacheConfig};
use tokengate_database::Stores;
use tokengate_entity::Role;
use tokengate_service::{AccountService, AdminAccountService};

pub const PASSWORD: &str = "correct-horse";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Stores for direct setup that has no HTTP surface
    pub stores: Stores,
}

/// Decoded response
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    /// `data` member of a success envelope.
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// `error` code of a failure body.
    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

/// Issued pair as returned by `/login` and `/refresh`.
pub struct Tokens {
    pub access: String,
    pub refresh: String,
}

impl TestApp {
    pub fn new() -> Self {
        let config = AppConfig::default();
        let stores = Stores::in_memory();
        let access_ttl = config.auth.access_ttl();

        let provider = Arc::new(MemoryCacheProvider::new(&MemoryCacheConfig::default()));
        let cache = CacheManager::from_provider(provider);
        let hasher = Arc::new(Argon2CredentialHasher::fast(b"test-pepper", 16));
        let sessions = Arc::new(SessionManager::new(
            Arc::new(TokenSigner::with_ttl(b"test-signing-secret", access_ttl)),
            hasher.clone(),
            Arc::clone(&stores.identities),
            Arc::clone(&stores.refresh),
            ValidationCache::new(Arc::new(cache.clone()), access_ttl),
            Duration::from_secs(3600),
        ));
        let gate = Arc::new(AuthorizationGate::new());

        let state = AppState {
            stores: stores.clone(),
            cache,
            accounts: Arc::new(AccountService::new(
                Arc::clone(&stores.identities),
                hasher,
                16,
                Arc::clone(&sessions),
                Arc::clone(&gate),
            )),
            admin: Arc::new(AdminAccountService::new(
                Arc::clone(&stores.identities),
                Arc::clone(&sessions),
                gate,
            )),
            sessions,
        };

        Self {
            router: tokengate_api::build_app(state, &config.server.cors),
            stores,
        }
    }

    /// Send a request and decode the JSON body.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    pub async fn post(&self, path: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.request("POST", path, Some(body), token).await
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.request("GET", path, None, token).await
    }

    /// Register `phone` and return its subject id.
    pub async fn register(&self, phone: &str) -> i64 {
        let res = self
            .post(
                "/v1/idm/registration",
                json!({ "phone": phone, "password": PASSWORD }),
                None,
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
        res.data()["id"].as_i64().unwrap()
    }

    /// Register `phone` with `role` assigned directly in the store.
    pub async fn register_with_role(&self, phone: &str, role: Role) -> i64 {
        let id = self.register(phone).await;
        if role != Role::User {
            self.stores.identities.change_role(id, role).await.unwrap();
        }
        id
    }

    pub async fn login(&self, phone: &str) -> Tokens {
        let res = self
            .post(
                "/v1/idm/login",
                json!({ "phone": phone, "password": PASSWORD }),
                None,
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "{}", res.body);
        Tokens {
            access: res.data()["access_token"].as_str().unwrap().to_string(),
            refresh: res.data()["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    /// Status of `GET /me` with `token`.
    pub async fn me_status(&self, token: &str) -> StatusCode {
        self.get("/v1/idm/me", Some(token)).await.status
    }
}
