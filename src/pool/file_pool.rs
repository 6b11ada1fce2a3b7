//! The chunk-writer handle pool: acquire, release, drain
//!
//! Opening a remote file handle costs a live session plus a round-trip open
//! call, so chunk-write workers reuse handles that already proved usable.
//! The pool hands out an idle handle when it has one, opens a fresh one
//! otherwise, takes handles back after successful chunk writes, and tears
//! down handle + connection + session when a write failed. At upload
//! completion `drain` closes every still-idle handle concurrently and
//! reports the union of close failures.

use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::PoolConfig;
use crate::session::SessionCounter;
use crate::share::{ConnectionProvider, ShareError};

use super::handle::PooledHandle;

/// Errors from pool operations
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to connect to share {share}: {source}")]
    Connect { share: String, source: ShareError },

    #[error("failed to open {path}: {source}")]
    Open { path: String, source: ShareError },

    #[error(transparent)]
    Drain(#[from] DrainError),
}

/// Aggregated close failures from [`HandlePool::drain`]
///
/// Drain never stops at the first failed close; every idle handle is closed
/// and every failure is carried here.
#[derive(Debug)]
pub struct DrainError {
    errors: Vec<ShareError>,
}

impl DrainError {
    /// The individual close failures, one per handle that failed to close
    pub fn errors(&self) -> &[ShareError] {
        &self.errors
    }
}

impl fmt::Display for DrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to close {} pooled handle(s)", self.errors.len())?;
        for err in &self.errors {
            write!(f, "; {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for DrainError {}

/// Statistics for a handle pool
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Total handles opened fresh
    pub total_opened: u64,

    /// Total handles handed out from the idle set
    pub total_reused: u64,

    /// Total handles torn down after a failed chunk write
    pub total_discarded: u64,

    /// Handles currently idle in the pool
    pub idle_handles: usize,
}

/// Synchronized pool of idle remote file handles for one upload target
///
/// The idle set is the only shared mutable state; its lock is scoped to the
/// sequence access itself and is never held across network I/O, so one
/// worker's blocking open or close never stalls another worker's pool
/// access. Handles currently lent to a worker are not tracked here.
pub struct HandlePool {
    idle: Mutex<Vec<PooledHandle>>,
    provider: Arc<dyn ConnectionProvider>,
    sessions: Arc<SessionCounter>,
    config: PoolConfig,
    total_opened: AtomicU64,
    total_reused: AtomicU64,
    total_discarded: AtomicU64,
}

impl HandlePool {
    /// Create a pool for one upload target
    pub fn new(
        config: PoolConfig,
        provider: Arc<dyn ConnectionProvider>,
        sessions: Arc<SessionCounter>,
    ) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            provider,
            sessions,
            config,
            total_opened: AtomicU64::new(0),
            total_reused: AtomicU64::new(0),
            total_discarded: AtomicU64::new(0),
        }
    }

    /// Get a ready-to-write handle, reusing an idle one when possible
    ///
    /// A fresh open registers the session before any network work and
    /// unwinds it on every failure: a session increment on this path is
    /// always matched by exactly one decrement, immediately on failure or
    /// later via [`release`](Self::release) or [`drain`](Self::drain).
    pub async fn acquire(&self) -> Result<PooledHandle, PoolError> {
        if let Some(handle) = self.lock_idle().pop() {
            self.total_reused.fetch_add(1, Ordering::Relaxed);
            debug!(
                share = %self.config.share,
                path = %self.config.path,
                "reusing pooled handle"
            );
            return Ok(handle);
        }

        // Fresh open. Show the session in use first so the count never
        // understates what the endpoint may see.
        self.sessions.add_session();

        let open_timeout = self.config.open_timeout();

        let conn = match timeout(open_timeout, self.provider.get_connection(&self.config.share))
            .await
        {
            Ok(Ok(conn)) => conn,
            Ok(Err(source)) => {
                self.sessions.remove_session();
                return Err(PoolError::Connect {
                    share: self.config.share.clone(),
                    source,
                });
            }
            Err(_) => {
                self.sessions.remove_session();
                return Err(PoolError::Connect {
                    share: self.config.share.clone(),
                    source: ShareError::Timeout,
                });
            }
        };

        let file = match timeout(
            open_timeout,
            conn.open_file(&self.config.path, self.config.mode),
        )
        .await
        {
            Ok(Ok(file)) => file,
            Ok(Err(source)) => {
                self.provider
                    .put_connection(Arc::clone(&conn), Some(&source))
                    .await;
                self.sessions.remove_session();
                return Err(PoolError::Open {
                    path: self.config.path.clone(),
                    source,
                });
            }
            Err(_) => {
                let source = ShareError::Timeout;
                self.provider
                    .put_connection(Arc::clone(&conn), Some(&source))
                    .await;
                self.sessions.remove_session();
                return Err(PoolError::Open {
                    path: self.config.path.clone(),
                    source,
                });
            }
        };

        self.total_opened.fetch_add(1, Ordering::Relaxed);
        debug!(
            share = %self.config.share,
            path = %self.config.path,
            sessions = self.sessions.active(),
            "opened new pooled handle"
        );

        Ok(PooledHandle::new(file, conn))
    }

    /// Give a handle back after a chunk write
    ///
    /// Call exactly once per handle obtained from [`acquire`](Self::acquire),
    /// with the error of the chunk write if it failed. The handle is moved
    /// in, so the caller's binding is gone either way.
    ///
    /// A failed write is treated as presumptive evidence the handle or its
    /// connection is unhealthy: the handle is closed and torn down, never
    /// pooled again. A successful write returns the handle to the idle set
    /// with no session or connection action.
    pub async fn release(&self, handle: PooledHandle, outcome: Option<&ShareError>) {
        let Some(err) = outcome else {
            self.lock_idle().push(handle);
            return;
        };

        self.total_discarded.fetch_add(1, Ordering::Relaxed);
        debug!(
            share = %self.config.share,
            path = %self.config.path,
            error = %err,
            "discarding handle after failed write"
        );

        let (file, conn) = handle.into_parts();

        // The write failure dominates what the caller reports; a close
        // failure here is noted and dropped.
        if let Err(close_err) = file.close().await {
            debug!(error = %close_err, "close failed while discarding handle");
        }

        self.provider.put_connection(conn, Some(err)).await;
        self.sessions.remove_session();
    }

    /// Close every idle handle concurrently and release its connection and
    /// session
    ///
    /// Called once, after all workers have released their handles. Never
    /// aborts early: every idle handle gets a close attempt, and connection
    /// and session bookkeeping is released whether or not the close
    /// succeeded. Returns the union of close failures, or `Ok(())` if none.
    /// The idle set is empty afterwards regardless.
    pub async fn drain(&self) -> Result<(), PoolError> {
        let idle = mem::take(&mut *self.lock_idle());
        if idle.is_empty() {
            return Ok(());
        }

        debug!(
            count = idle.len(),
            share = %self.config.share,
            "closing unused file handles"
        );

        let open_timeout = self.config.open_timeout();
        let mut tasks = JoinSet::new();

        for handle in idle {
            let provider = Arc::clone(&self.provider);
            let sessions = Arc::clone(&self.sessions);

            tasks.spawn(async move {
                let (file, conn) = handle.into_parts();

                let result = match timeout(open_timeout, file.close()).await {
                    Ok(result) => result,
                    Err(_) => Err(ShareError::Timeout),
                };

                provider.put_connection(conn, result.as_ref().err()).await;
                sessions.remove_session();
                result
            });
        }

        let mut errors = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(error = %err, "failed to close pooled handle");
                    errors.push(err);
                }
                Err(join_err) => {
                    warn!(error = %join_err, "handle close task failed");
                    errors.push(ShareError::Protocol(format!(
                        "close task failed: {join_err}"
                    )));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DrainError { errors }.into())
        }
    }

    /// Handles currently idle in the pool
    pub fn idle_count(&self) -> usize {
        self.lock_idle().len()
    }

    /// Snapshot of pool statistics
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            total_opened: self.total_opened.load(Ordering::Relaxed),
            total_reused: self.total_reused.load(Ordering::Relaxed),
            total_discarded: self.total_discarded.load(Ordering::Relaxed),
            idle_handles: self.idle_count(),
        }
    }

    fn lock_idle(&self) -> MutexGuard<'_, Vec<PooledHandle>> {
        // A panicked worker cannot leave the Vec in a broken state; the
        // poison flag carries no information we act on.
        self.idle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
