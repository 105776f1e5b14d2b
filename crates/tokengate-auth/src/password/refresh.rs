//! Opaque refresh token generation.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Random bytes per refresh token.
const REFRESH_TOKEN_BYTES: usize = 48;

/// `len` random bytes from the OS CSPRNG, base64url without padding.
pub(crate) fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generates unpredictable refresh tokens unrelated to any access token.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshTokenGenerator;

impl RefreshTokenGenerator {
    /// Create a new generator.
    pub fn new() -> Self {
        Self
    }

    /// A fresh refresh token.
    pub fn generate(&self) -> String {
        random_token(REFRESH_TOKEN_BYTES)
    }
}
