//! Interfaces to the share layer consumed by the handle pool
//!
//! The pool itself never speaks the wire protocol. It works against three
//! seams: a connection provider that hands out and takes back live
//! connections, connections that can open files, and the open file handles
//! chunk writers use. Production code plugs the real protocol client in
//! behind these traits; tests plug in mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by the share layer
#[derive(Debug, Error)]
pub enum ShareError {
    #[error("failed to connect: {0}")]
    Connect(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("operation timed out")]
    Timeout,
}

/// File open disposition used when the pool opens the target file
///
/// Fixed at pool construction; every handle the pool opens for the same
/// target uses the same mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    /// Open for write without touching existing contents (chunk writers
    /// position every write themselves)
    Write,

    /// Create the file if missing and truncate any existing contents
    CreateTruncate,
}

/// An open file handle on a remote share
#[async_trait]
pub trait RemoteFile: Send + Sync {
    /// Write a chunk at the given offset, returning the number of bytes
    /// written
    async fn write_at(&self, offset: u64, data: &[u8]) -> Result<usize, ShareError>;

    /// Close the remote handle, releasing it on the endpoint
    async fn close(&self) -> Result<(), ShareError>;
}

/// A live connection to a share, able to open files on it
#[async_trait]
pub trait ShareConnection: Send + Sync {
    /// Open a file on this connection for writing
    async fn open_file(&self, path: &str, mode: OpenMode)
        -> Result<Box<dyn RemoteFile>, ShareError>;
}

/// Supplies live connections for a share and takes them back afterwards
///
/// Ownership of a connection is shared between the provider's bookkeeping
/// and whoever is currently using it; `put_connection` hands the user's
/// share back so the provider can recycle or retire the connection.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Obtain a usable connection for the named share
    ///
    /// May perform network setup; fails with a connectivity or auth error.
    async fn get_connection(&self, share: &str) -> Result<Arc<dyn ShareConnection>, ShareError>;

    /// Return a connection, tagging it with the error that ended its use
    /// (if any) so the provider can retire an unhealthy connection instead
    /// of recycling it
    async fn put_connection(&self, conn: Arc<dyn ShareConnection>, outcome: Option<&ShareError>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_mode_serde_names() {
        let mode: OpenMode = serde_yaml::from_str("write").unwrap();
        assert_eq!(mode, OpenMode::Write);

        let mode: OpenMode = serde_yaml::from_str("create_truncate").unwrap();
        assert_eq!(mode, OpenMode::CreateTruncate);
    }

    #[test]
    fn share_error_display() {
        let err = ShareError::Connect("share unreachable".to_string());
        assert_eq!(err.to_string(), "failed to connect: share unreachable");

        let err = ShareError::Timeout;
        assert_eq!(err.to_string(), "operation timed out");
    }
}
