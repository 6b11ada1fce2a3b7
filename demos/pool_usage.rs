//! Example demonstrating handle pool usage
//!
//! This example shows how to:
//! 1. Plug a connection provider in behind the pool
//! 2. Run concurrent chunk-write workers that share pooled handles
//! 3. Drain the pool at upload completion
//! 4. Inspect pool and session statistics
//!
//! The provider here keeps everything in memory; a real deployment would
//! back these traits with an actual file-share protocol client.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

use sharepool::{
    ConnectionProvider, HandlePool, OpenMode, PoolConfig, RemoteFile, SessionCounter,
    ShareConnection, ShareError,
};

/// In-memory stand-in for the target file on a share
#[derive(Default)]
struct MemoryShare {
    contents: Mutex<Vec<u8>>,
}

/// Provider serving connections onto the in-memory share
struct MemoryProvider {
    share: Arc<MemoryShare>,
    connects: AtomicUsize,
}

struct MemoryConnection {
    share: Arc<MemoryShare>,
}

struct MemoryFile {
    share: Arc<MemoryShare>,
}

#[async_trait]
impl RemoteFile for MemoryFile {
    async fn write_at(&self, offset: u64, data: &[u8]) -> Result<usize, ShareError> {
        let mut contents = self.share.contents.lock().unwrap();
        let end = offset as usize + data.len();
        if contents.len() < end {
            contents.resize(end, 0);
        }
        contents[offset as usize..end].copy_from_slice(data);
        Ok(data.len())
    }

    async fn close(&self) -> Result<(), ShareError> {
        Ok(())
    }
}

#[async_trait]
impl ShareConnection for MemoryConnection {
    async fn open_file(
        &self,
        _path: &str,
        _mode: OpenMode,
    ) -> Result<Box<dyn RemoteFile>, ShareError> {
        Ok(Box::new(MemoryFile {
            share: Arc::clone(&self.share),
        }))
    }
}

#[async_trait]
impl ConnectionProvider for MemoryProvider {
    async fn get_connection(&self, _share: &str) -> Result<Arc<dyn ShareConnection>, ShareError> {
        self.connects.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(MemoryConnection {
            share: Arc::clone(&self.share),
        }))
    }

    async fn put_connection(&self, _conn: Arc<dyn ShareConnection>, outcome: Option<&ShareError>) {
        if let Some(err) = outcome {
            info!(error = %err, "retiring connection");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let provider = Arc::new(MemoryProvider {
        share: Arc::new(MemoryShare::default()),
        connects: AtomicUsize::new(0),
    });
    let sessions = Arc::new(SessionCounter::new());

    let config = PoolConfig::new("backups", "vm-image.bin");
    let pool = Arc::new(HandlePool::new(
        config,
        Arc::clone(&provider) as Arc<dyn ConnectionProvider>,
        Arc::clone(&sessions),
    ));

    const CHUNK_SIZE: u64 = 64 * 1024;
    const CHUNKS_PER_WORKER: u64 = 8;

    // Simulate chunk-write workers sharing the pool
    let mut workers = Vec::new();
    for worker in 0..4u64 {
        let pool = Arc::clone(&pool);
        workers.push(tokio::spawn(async move {
            for chunk in 0..CHUNKS_PER_WORKER {
                let handle = pool.acquire().await.expect("acquire failed");

                let offset = (worker * CHUNKS_PER_WORKER + chunk) * CHUNK_SIZE;
                let data = vec![worker as u8; CHUNK_SIZE as usize];
                let outcome = handle.file().write_at(offset, &data).await.map(|_| ());

                pool.release(handle, outcome.as_ref().err()).await;
                outcome.expect("chunk write failed");
            }
            info!(worker, "worker finished");
        }));
    }

    for worker in workers {
        worker.await?;
    }

    let stats = pool.stats();
    info!(
        opened = stats.total_opened,
        reused = stats.total_reused,
        idle = stats.idle_handles,
        connects = provider.connects.load(Ordering::Relaxed),
        sessions = sessions.active(),
        "all chunks written"
    );

    // Upload complete: close everything still pooled
    pool.drain().await?;
    info!(sessions = sessions.active(), "pool drained");

    Ok(())
}
