//! # tokengate-service
//!
//! Account use cases for TokenGate. Each service orchestrates the identity
//! repository, the credential hasher, the authorization gate, and the
//! session manager, so every security-sensitive mutation is followed by
//! session revocation.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod account;

pub use account::{AccountService, AdminAccountService, AccountUpdate};

#[cfg(test)]
pub(crate) mod testing;
