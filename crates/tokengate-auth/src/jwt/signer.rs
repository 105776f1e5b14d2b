//! Access token signing and verification (HS512).

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use tokengate_core::config::AuthConfig;
use tokengate_core::error::{AppError, ErrorKind};
use tokengate_entity::Identity;

use super::claims::Claims;
use crate::password::refresh::random_token;

/// Length in bytes of the random `jti` claim.
const JTI_BYTES: usize = 12;

/// Why a token could not be issued or trusted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The signature does not match the payload.
    #[error("invalid token signature")]
    InvalidSignature,
    /// The token reached its expiry.
    #[error("token has expired")]
    Expired,
    /// The token could not be decoded.
    #[error("malformed token")]
    Malformed,
    /// The signing key could not produce a token.
    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Signing(_) => AppError::with_source(ErrorKind::Internal, "Token signing failed", e),
            other => AppError::with_source(ErrorKind::InvalidToken, "Invalid or expired token", other),
        }
    }
}

/// A freshly minted access token and its claims.
#[derive(Debug, Clone)]
pub struct SignedToken {
    /// Encoded token.
    pub token: String,
    /// Claims inside `token`.
    pub claims: Claims,
}

/// Mints and verifies self-contained access tokens.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// Create a signer from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self::with_ttl(config.jwt_secret.as_bytes(), config.access_ttl())
    }

    /// Create a signer from a raw secret and access token TTL.
    pub fn with_ttl(secret: &[u8], ttl: Duration) -> Self {
        // Expiry is checked by hand so that `exp == now` counts as expired.
        let mut validation = Validation::new(Algorithm::HS512);
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Access token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a token for `identity` valid from now for the configured TTL.
    pub fn issue(&self, identity: &Identity) -> Result<SignedToken, TokenError> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs())
            .map_err(|_| TokenError::Signing("access token TTL out of range".to_string()))?;

        let claims = Claims {
            uid: identity.id,
            role_id: identity.role.id(),
            iat: now,
            exp: now.saturating_add(ttl),
            jti: random_token(JTI_BYTES),
        };

        let token = encode(&Header::new(Algorithm::HS512), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(SignedToken { token, claims })
    }

    /// Verify signature and expiry against the current time.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify signature and expiry against `now` (seconds since epoch).
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

        if data.claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }
}
