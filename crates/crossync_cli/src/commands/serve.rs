//! Serve command implementation.

use crate::error::{CliError, CliResult};
use crossync_server::{ServerConfig, SyncServer};
use crossync_store::FileStore;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Runs the sync service over the store at `path` until Ctrl-C.
pub fn run(path: &Path, bind: Option<SocketAddr>) -> CliResult<()> {
    let store = Arc::new(FileStore::open(path, true)?);
    let mut config = ServerConfig::default();
    if let Some(addr) = bind {
        config.bind_addr = addr;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async move {
        let listener = TcpListener::bind(config.bind_addr).await?;
        let server = Arc::new(SyncServer::new(config, store));
        server
            .serve_until(listener, async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("interrupt received, shutting down");
                }
            })
            .await?;
        Ok::<(), CliError>(())
    })
}
