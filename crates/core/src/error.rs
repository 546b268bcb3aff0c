//! Unified error types for swcache.
//!
//! Every message is prefixed with a stable code so hosts can match on it
//! without parsing the rest of the text.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the offline cache manager.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// URL could not be parsed or resolved against the worker origin.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Lifecycle operation requested from the wrong state.
    #[error("INVALID_STATE: {0}")]
    InvalidState(String),

    /// A manifest asset could not be fetched or stored during install.
    #[error("INSTALL_ERROR: {url}: {reason}")]
    Install { url: String, reason: String },

    /// Transport-level failure (offline, DNS, timeout).
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Storing a response into a generation failed.
    #[error("CACHE_WRITE_ERROR: {0}")]
    CacheWrite(String),

    /// No cache entry found for the given key.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored row could not be decoded.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Replaying the outbox did not complete.
    #[error("SYNC_FAILED: {0}")]
    SyncFailed(String),
}

impl Error {
    /// Whether the error came from the transport rather than the cache.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidInput(_) => -32602,
            Error::Install { .. } => -32000,
            Error::CacheMiss(_) => -32001,
            Error::Database(_) | Error::MigrationFailed(_) | Error::CorruptEntry(_) => -32002,
            Error::InvalidUrl(_) => -32003,
            Error::InvalidState(_) => -32004,
            Error::Network(_) => -32005,
            Error::CacheWrite(_) => -32006,
            Error::FetchTooLarge(_) => -32007,
            Error::SyncFailed(_) => -32008,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Install { url: "http://localhost:3000/missing".into(), reason: "status 404".into() };
        assert!(err.to_string().starts_with("INSTALL_ERROR"));
        assert!(err.to_string().contains("/missing"));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::CacheMiss("abc123".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32001);
        assert!(mcp_err.message.contains("abc123"));
    }

    #[test]
    fn test_is_network() {
        assert!(Error::Network("connection refused".into()).is_network());
        assert!(!Error::CacheWrite("disk full".into()).is_network());
    }
}
