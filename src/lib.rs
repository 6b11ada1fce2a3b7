//! sharepool - bounded reuse pool of remote file handles for chunked uploads

pub mod config;
pub mod pool;
pub mod session;
pub mod share;

pub use config::PoolConfig;
pub use pool::{DrainError, HandlePool, PoolError, PoolStats, PooledHandle};
pub use session::SessionCounter;
pub use share::{ConnectionProvider, OpenMode, RemoteFile, ShareConnection, ShareError};
