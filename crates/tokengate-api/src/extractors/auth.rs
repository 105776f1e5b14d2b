//! `AuthUser` and `BearerToken` extractors.
//!
//! Both read request extensions populated by [`crate::middleware::auth::require_auth`];
//! using them on a route outside that middleware yields 401.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use tokengate_core::error::AppError;
use tokengate_entity::AuthenticatedIdentity;

use crate::error::ApiError;

/// The validated caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthenticatedIdentity);

impl std::ops::Deref for AuthUser {
    type Target = AuthenticatedIdentity;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::invalid_token("Missing authentication").into())
    }
}

/// The raw access token the caller authenticated with.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<BearerToken>()
            .cloned()
            .ok_or_else(|| AppError::invalid_token("Missing authentication").into())
    }
}

/// Token from an `Authorization: Bearer <token>` header, if present.
pub fn bearer_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
