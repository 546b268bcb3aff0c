//! SQLite-backed Cache Storage for versioned response generations.
//!
//! This module provides a persistent request/response cache using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Named cache generations (`<app>-v<semver>`), one per deployed version
//! - Entries keyed by request identity (method + URL) hashed with SHA-256
//! - Transactional bulk stores so a manifest install is all-or-nothing
//! - Cascading deletes when a generation is evicted
//! - An outbox of queued writes replayed on background sync

pub mod connection;
pub mod entries;
pub mod generations;
pub mod hash;
pub mod migrations;
pub mod outbox;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{CacheEntry, RequestKey, StoredResponse};
pub use generations::{Generation, GenerationInfo};
pub use outbox::OutboxEntry;
