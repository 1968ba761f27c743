//! TCP transport for [`SyncServer`].
//!
//! Each connection carries a sequence of length-prefixed request frames,
//! answered in order. Coordinator calls block on the store, so they run on
//! tokio's blocking pool rather than on the connection task.

use crate::error::{ServerError, ServerResult};
use crate::server::{error_reply, SyncServer};
use crossync_core::RecordStore;
use crossync_protocol::{
    frame_len, length_prefixed, ProtocolError, FRAME_HEADER_SIZE, MAX_FRAME_SIZE,
};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

impl<S: RecordStore + 'static> SyncServer<S> {
    /// Binds the configured address and serves until the process exits.
    pub async fn run(self: Arc<Self>) -> ServerResult<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Serves connections accepted from `listener` forever.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> ServerResult<()> {
        self.serve_until(listener, std::future::pending()).await
    }

    /// Serves connections until `shutdown` completes, then stops the server.
    ///
    /// Requests already being handled finish before the cache is cleared.
    /// Open connections get an error reply to their next request and are
    /// then closed.
    pub async fn serve_until(
        self: Arc<Self>,
        listener: TcpListener,
        shutdown: impl Future<Output = ()>,
    ) -> ServerResult<()> {
        let addr = listener.local_addr()?;
        let permits = Arc::new(Semaphore::new(self.config.max_connections));
        info!(%addr, max_connections = self.config.max_connections, "sync server listening");

        tokio::pin!(shutdown);
        loop {
            let permit = tokio::select! {
                () = &mut shutdown => break,
                permit = Arc::clone(&permits).acquire_owned() => permit
                    .map_err(|e| ServerError::Internal(e.to_string()))?,
            };
            let (socket, peer) = tokio::select! {
                () = &mut shutdown => break,
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        warn!(error = %err, "accept failed");
                        continue;
                    }
                },
            };

            debug!(%peer, "accepted connection");
            let server = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(err) = server.handle_connection(socket, peer).await {
                    warn!(%peer, error = %err, "connection closed with error");
                }
                drop(permit);
            });
        }

        let server = Arc::clone(&self);
        tokio::task::spawn_blocking(move || server.shutdown())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn handle_connection(
        self: Arc<Self>,
        mut socket: TcpStream,
        peer: SocketAddr,
    ) -> ServerResult<()> {
        let max_frame_size = self.config.max_frame_size;
        loop {
            let mut header = [0u8; FRAME_HEADER_SIZE];
            match socket.read_exact(&mut header).await {
                Ok(_) => {}
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                    debug!(%peer, "peer disconnected");
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            }

            let len = match frame_len(header, max_frame_size) {
                Ok(len) => len,
                Err(err) => {
                    // The body was not read, so the stream cannot be resynchronized.
                    write_frame(&mut socket, &error_reply(&err.to_string())).await?;
                    return Err(err.into());
                }
            };
            let mut body = vec![0u8; len];
            socket.read_exact(&mut body).await?;

            let reply = self.dispatch(body).await;
            write_frame(&mut socket, &reply).await?;
            if self.is_stopped() {
                debug!(%peer, "closing connection after shutdown");
                return Ok(());
            }
        }
    }

    async fn dispatch(self: &Arc<Self>, body: Vec<u8>) -> Vec<u8> {
        let timeout = self.config.request_timeout;
        let server = Arc::clone(self);
        let work = tokio::task::spawn_blocking(move || server.handle_frame(&body));

        match tokio::time::timeout(timeout, work).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => {
                warn!(error = %err, "request handler failed");
                error_reply(&ServerError::Internal(err.to_string()).to_string())
            }
            Err(_) => {
                // The blocking call keeps running; its outcome is unknown to the caller.
                warn!(?timeout, "request timed out");
                error_reply(&ServerError::Timeout(timeout).to_string())
            }
        }
    }
}

/// Writes a reply. Replies are bounded by the protocol limit, not the
/// configured request limit.
async fn write_frame(socket: &mut TcpStream, body: &[u8]) -> ServerResult<()> {
    let framed = match length_prefixed(body, MAX_FRAME_SIZE) {
        Ok(framed) => framed,
        Err(err @ ProtocolError::FrameTooLarge { .. }) => {
            warn!(error = %err, "reply exceeds frame limit");
            length_prefixed(&error_reply(&err.to_string()), MAX_FRAME_SIZE)?
        }
        Err(err) => return Err(err.into()),
    };
    socket.write_all(&framed).await?;
    Ok(())
}
