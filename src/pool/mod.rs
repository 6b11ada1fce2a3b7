//! Handle pooling for chunked uploads
//!
//! This module provides:
//! - Reuse of open remote file handles across chunk-write workers
//! - Paired session/connection accounting on every acquire and release path
//! - Concurrent teardown of all idle handles at upload completion

pub mod file_pool;
pub mod handle;

pub use file_pool::{DrainError, HandlePool, PoolError, PoolStats};
pub use handle::PooledHandle;
