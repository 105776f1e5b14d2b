//! Peppered Argon2id credential hashing.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use subtle::ConstantTimeEq;

use tokengate_core::config::AuthConfig;
use tokengate_core::error::AppError;
use tokengate_core::result::AppResult;

/// Digest length in bytes.
const DIGEST_LEN: usize = 32;

/// Salted, keyed password digests.
///
/// `hash` is deterministic for a given password, salt and secret, so a
/// stored digest is checked by recomputing it and comparing in constant time.
pub trait CredentialHasher: Send + Sync + std::fmt::Debug + 'static {
    /// Digest of `password` under `salt` and the hasher's secret.
    fn hash(&self, password: &str, salt: &[u8]) -> AppResult<String>;

    /// `size` bytes from the operating system's CSPRNG.
    fn random_salt(&self, size: usize) -> Vec<u8>;

    /// Constant-time equality.
    fn constant_time_eq(&self, a: &[u8], b: &[u8]) -> bool;

    /// Whether `password` produces `digest` under `salt`.
    fn verify(&self, password: &str, salt: &[u8], digest: &str) -> AppResult<bool> {
        let candidate = self.hash(password, salt)?;
        Ok(self.constant_time_eq(candidate.as_bytes(), digest.as_bytes()))
    }
}

/// Argon2id keyed with a server-side pepper.
#[derive(Clone)]
pub struct Argon2CredentialHasher {
    secret: Vec<u8>,
    salt_size: usize,
    params: Params,
}

impl std::fmt::Debug for Argon2CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2CredentialHasher")
            .field("salt_size", &self.salt_size)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Argon2CredentialHasher {
    /// Create a hasher from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self::with_secret(config.password_secret.as_bytes(), config.salt_size)
    }

    /// Create a hasher from a raw pepper and salt size with default Argon2 costs.
    pub fn with_secret(secret: &[u8], salt_size: usize) -> Self {
        Self::with_params(secret, salt_size, Params::default())
    }

    /// Create a hasher with explicit Argon2 cost parameters.
    pub fn with_params(secret: &[u8], salt_size: usize, params: Params) -> Self {
        Self {
            secret: secret.to_vec(),
            salt_size,
            params,
        }
    }

    /// Cheap parameters for tests and local development.
    pub fn fast(secret: &[u8], salt_size: usize) -> Self {
        let params = Params::new(Params::MIN_M_COST.max(64), 1, 1, None).unwrap_or_default();
        Self::with_params(secret, salt_size, params)
    }

    /// A salt of the configured size.
    pub fn new_salt(&self) -> Vec<u8> {
        self.random_salt(self.salt_size)
    }
}

impl CredentialHasher for Argon2CredentialHasher {
    fn hash(&self, password: &str, salt: &[u8]) -> AppResult<String> {
        let argon2 = Argon2::new_with_secret(
            &self.secret,
            Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        )
        .map_err(|e| AppError::internal(format!("Argon2 setup failed: {e}")))?;

        let mut digest = [0u8; DIGEST_LEN];
        argon2
            .hash_password_into(password.as_bytes(), salt, &mut digest)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

        Ok(STANDARD_NO_PAD.encode(digest))
    }

    fn random_salt(&self, size: usize) -> Vec<u8> {
        let mut salt = vec![0u8; size];
        OsRng.fill_bytes(&mut salt);
        salt
    }

    fn constant_time_eq(&self, a: &[u8], b: &[u8]) -> bool {
        a.ct_eq(b).into()
    }
}
