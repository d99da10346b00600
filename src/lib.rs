//! ferrumkv - A minimal key-value store served over HTTP
//!
//! - `store`: the `Store` trait with a file backend and a memory backend
//! - `web`: the axum router translating requests into store calls
//! - `config`: startup configuration

pub mod config;
pub mod store;
pub mod web;

/// Re-export commonly used types
pub use config::{Backend, Config};
pub use store::{FileStore, MemoryStore, StorageError, StorageResult, Store};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
