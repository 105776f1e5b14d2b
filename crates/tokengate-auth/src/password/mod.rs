//! Credential hashing and refresh token generation.

pub mod hasher;
pub mod refresh;

pub use hasher::{Argon2CredentialHasher, CredentialHasher};
pub use refresh::RefreshTokenGenerator;
