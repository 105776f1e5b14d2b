//! # tokengate-database
//!
//! Durable store for TokenGate: the [`RefreshStore`] and
//! [`IdentityRepository`] contracts, their PostgreSQL implementations,
//! and in-memory implementations for development and tests.

#[cfg(feature = "memory")]
pub mod memory;
pub mod pool;
pub mod provider;
pub mod repositories;
pub mod store;

pub use provider::Stores;
pub use store::{IdentityRepository, RefreshStore};
