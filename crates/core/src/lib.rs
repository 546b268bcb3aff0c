//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - Cache Storage engine (versioned generations) with SQLite backend
//! - Outbox queue for offline-originated writes
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CacheEntry, Generation, GenerationInfo, OutboxEntry, RequestKey, StoredResponse};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
