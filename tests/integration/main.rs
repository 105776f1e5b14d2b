//! HTTP-level tests against the in-memory store and moka cache.

mod helpers;

mod account_test;
mod admin_test;
mod auth_test;
mod revocation_test;
