//! # tokengate-api
//!
//! HTTP API layer for TokenGate built on Axum. Exposes the identity
//! endpoints under `/v1/idm`, the bearer-token middleware, request/response
//! DTOs, and the mapping from [`tokengate_core::AppError`] to HTTP status codes.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use state::AppState;
