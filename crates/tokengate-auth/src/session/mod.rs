//! Session lifecycle: validation, issuance, rotation, and revocation.

pub mod manager;

pub use manager::{SessionManager, TokenPair};
