//! Core traits defined in `tokengate-core` and implemented by other crates.

pub mod cache;

pub use cache::CacheProvider;
