//! Cache-related MCP tools.
//!
//! Read-only views of the generations stored in the SQLite cache.

pub mod get;
pub mod keys;

pub use get::{CacheGetParams, get_impl};
pub use keys::{CacheKeysParams, keys_impl};
