//! # tokengate-entity
//!
//! Domain entity models for TokenGate. Database rows derive
//! `sqlx::FromRow`; value objects that travel through the cache or the
//! HTTP layer derive `Serialize`/`Deserialize`.

pub mod identity;
pub mod token;

pub use identity::{AuthenticatedIdentity, Identity, IdentitySnapshot, NewIdentity, Role};
pub use token::RefreshTokenRecord;
