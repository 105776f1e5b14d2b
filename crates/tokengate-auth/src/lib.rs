//! # tokengate-auth
//!
//! Token lifecycle and authorization for TokenGate.
//!
//! ## Modules
//!
//! - `jwt`: signed access token issuance and verification
//! - `password`: peppered Argon2id credential hashing and refresh token generation
//! - `session`: validation, login, rotation, and revocation
//! - `rbac`: role and ownership rules for account operations

pub mod jwt;
pub mod password;
pub mod rbac;
pub mod session;

pub use jwt::{Claims, SignedToken, TokenError, TokenSigner};
pub use password::{Argon2CredentialHasher, CredentialHasher, RefreshTokenGenerator};
pub use rbac::AuthorizationGate;
pub use session::{SessionManager, TokenPair};
