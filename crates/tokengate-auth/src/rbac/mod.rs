//! Role and ownership rules.

pub mod gate;

pub use gate::AuthorizationGate;
