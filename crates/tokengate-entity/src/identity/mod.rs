//! Identity domain entities.

pub mod model;
pub mod role;
pub mod snapshot;

pub use model::{Identity, NewIdentity};
pub use role::Role;
pub use snapshot::{AuthenticatedIdentity, IdentitySnapshot};
