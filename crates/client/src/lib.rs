//! Client side of swcache.
//!
//! This crate provides the network contract and the offline cache worker
//! shared by the server and any other host runtime.

pub mod fetch;
pub mod worker;

#[cfg(test)]
mod testing;

pub use fetch::{FetchClient, FetchConfig, Network, Request, Response, ResponseKind, ResponseSource};

pub use worker::{
    ActivationReport, Event, EventOutcome, Host, LifecycleState, MessageOutcome, Notification, NotificationClick,
    LoggingHost, OutboxSync, RecordingHost, SyncHandler, SyncReport, Worker, WorkerConfig,
};
