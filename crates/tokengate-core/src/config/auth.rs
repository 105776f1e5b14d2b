//! Authentication configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Longest accepted refresh lifetime: ten years.
const MAX_REFRESH_TTL_HOURS: u64 = 87_600;

/// Token lifetimes and credential secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing access tokens.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_minutes: u64,
    /// Refresh token TTL in hours.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_hours: u64,
    /// Server-side pepper mixed into every password digest.
    #[serde(default = "default_password_secret")]
    pub password_secret: String,
    /// Size of freshly generated password salts in bytes.
    #[serde(default = "default_salt_size")]
    pub salt_size: usize,
}

impl AuthConfig {
    /// Access token lifetime.
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_ttl_minutes.saturating_mul(60))
    }

    /// Refresh token lifetime.
    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_ttl_hours.saturating_mul(3600))
    }

    /// Reject configurations the token signer cannot work with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt_secret.is_empty() {
            return Err(AppError::configuration("auth.jwt_secret must not be empty"));
        }
        if self.access_token_ttl_minutes == 0 {
            return Err(AppError::configuration(
                "auth.access_token_ttl_minutes must be positive",
            ));
        }
        if self.refresh_token_ttl_hours > MAX_REFRESH_TTL_HOURS {
            return Err(AppError::configuration(format!(
                "auth.refresh_token_ttl_hours must not exceed {MAX_REFRESH_TTL_HOURS}"
            )));
        }
        if self.access_ttl() >= self.refresh_ttl() {
            return Err(AppError::configuration(
                "auth.access_token_ttl_minutes must be shorter than auth.refresh_token_ttl_hours",
            ));
        }
        if self.salt_size < 8 {
            return Err(AppError::configuration("auth.salt_size must be at least 8"));
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            access_token_ttl_minutes: default_access_ttl(),
            refresh_token_ttl_hours: default_refresh_ttl(),
            password_secret: default_password_secret(),
            salt_size: default_salt_size(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_access_ttl() -> u64 {
    15
}

fn default_refresh_ttl() -> u64 {
    720
}

fn default_password_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_salt_size() -> usize {
    16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AuthConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.access_ttl(), Duration::from_secs(900));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let config = AuthConfig {
            jwt_secret: String::new(),
            ..AuthConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_access_ttl_must_be_shorter_than_refresh() {
        let config = AuthConfig {
            access_token_ttl_minutes: 120,
            refresh_token_ttl_hours: 1,
            ..AuthConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_ttls_rejected_without_overflow() {
        let config = AuthConfig {
            access_token_ttl_minutes: u64::MAX,
            refresh_token_ttl_hours: u64::MAX,
            ..AuthConfig::default()
        };
        assert_eq!(config.access_ttl(), Duration::from_secs(u64::MAX));
        assert_eq!(config.refresh_ttl(), Duration::from_secs(u64::MAX));
        assert!(config.validate().is_err());

        let config = AuthConfig {
            refresh_token_ttl_hours: MAX_REFRESH_TTL_HOURS,
            ..AuthConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
