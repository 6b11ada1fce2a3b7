//! The unit of reuse: an open remote file plus its connection

use std::fmt;
use std::sync::Arc;

use crate::share::{RemoteFile, ShareConnection};

/// An open remote file handle bundled with the connection it was opened over
///
/// Handed to exactly one chunk-write worker at a time. While a worker holds
/// it, the pool does not track it; giving it back to
/// [`HandlePool::release`](super::HandlePool::release) consumes it, so a
/// released handle cannot be written to again or double-released.
pub struct PooledHandle {
    file: Box<dyn RemoteFile>,
    conn: Arc<dyn ShareConnection>,
}

impl PooledHandle {
    pub(crate) fn new(file: Box<dyn RemoteFile>, conn: Arc<dyn ShareConnection>) -> Self {
        Self { file, conn }
    }

    /// The open remote file, for the caller's chunk write
    pub fn file(&self) -> &dyn RemoteFile {
        self.file.as_ref()
    }

    /// Split the handle into its file and connection for teardown
    pub(crate) fn into_parts(self) -> (Box<dyn RemoteFile>, Arc<dyn ShareConnection>) {
        (self.file, self.conn)
    }
}

impl fmt::Debug for PooledHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledHandle").finish_non_exhaustive()
    }
}
