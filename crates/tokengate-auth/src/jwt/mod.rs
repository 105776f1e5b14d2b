//! Signed access tokens.

pub mod claims;
pub mod signer;

pub use claims::Claims;
pub use signer::{SignedToken, TokenError, TokenSigner};
