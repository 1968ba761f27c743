//! Main sync server.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::RequestHandler;
use crossync_core::{RecordStore, SyncCoordinator, VersionCache};
use crossync_protocol::{
    EnsureExistsRequest, EnsureExistsResponse, ErrorResponse, EvictRequest, EvictResponse,
    FetchRequest, FetchResponse, SubmitUpdateRequest, SubmitUpdateResponse, SyncMessage,
};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

/// The sync server.
///
/// Owns the coordinator and its cache for the lifetime of the service. The
/// cache is created here at start and cleared by [`SyncServer::shutdown`],
/// after which every request is refused with [`ServerError::ShuttingDown`].
///
/// # Example
///
/// ```
/// use crossync_core::{EntityId, InMemoryStore};
/// use crossync_protocol::{FetchRequest, SyncMessage};
/// use crossync_server::{ServerConfig, SyncServer};
/// use std::sync::Arc;
///
/// let server = SyncServer::new(ServerConfig::default(), Arc::new(InMemoryStore::new()));
///
/// let request = SyncMessage::Fetch(FetchRequest { entity_id: EntityId::new() });
/// let reply = server.handle_frame(&request.encode().unwrap());
/// assert!(matches!(
///     SyncMessage::decode(&reply).unwrap(),
///     SyncMessage::FetchResponse(_)
/// ));
/// ```
pub struct SyncServer<S: RecordStore> {
    pub(crate) config: ServerConfig,
    handler: RequestHandler<S>,
    /// Held shared by each request; `shutdown` takes it exclusively.
    stopped: RwLock<bool>,
}

impl<S: RecordStore> SyncServer<S> {
    /// Creates a new sync server over `store`.
    pub fn new(config: ServerConfig, store: Arc<S>) -> Self {
        let cache = Arc::new(VersionCache::new());
        let coordinator = Arc::new(SyncCoordinator::new(
            config.coordinator.clone(),
            store,
            cache,
        ));
        info!(
            conditional_writes = config.coordinator.conditional_writes,
            "sync service started"
        );
        Self {
            config,
            handler: RequestHandler::new(coordinator),
            stopped: RwLock::new(false),
        }
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns true once [`SyncServer::shutdown`] has run.
    pub fn is_stopped(&self) -> bool {
        *self.stopped.read()
    }

    /// Returns the coordinator.
    pub fn coordinator(&self) -> &Arc<SyncCoordinator<S>> {
        self.handler.coordinator()
    }

    /// Handles a submit update request.
    pub fn handle_submit(&self, request: SubmitUpdateRequest) -> ServerResult<SubmitUpdateResponse> {
        self.serving(|| self.handler.handle_submit(request))
    }

    /// Handles a fetch request.
    pub fn handle_fetch(&self, request: FetchRequest) -> ServerResult<FetchResponse> {
        self.serving(|| self.handler.handle_fetch(request))
    }

    /// Handles an ensure-exists request.
    pub fn handle_ensure(&self, request: EnsureExistsRequest) -> ServerResult<EnsureExistsResponse> {
        self.serving(|| self.handler.handle_ensure(request))
    }

    /// Handles an evict request.
    pub fn handle_evict(&self, request: EvictRequest) -> ServerResult<EvictResponse> {
        self.serving(|| self.handler.handle_evict(request))
    }

    /// Handles a sync message (dispatches to appropriate handler).
    pub fn handle_message(&self, message: SyncMessage) -> ServerResult<SyncMessage> {
        self.serving(|| self.handler.handle_message(message))
    }

    /// Handles one encoded request and returns the encoded reply.
    ///
    /// Never fails: undecodable or rejected input is answered with
    /// [`SyncMessage::Error`].
    pub fn handle_frame(&self, bytes: &[u8]) -> Vec<u8> {
        let reply = SyncMessage::decode(bytes)
            .map_err(ServerError::from)
            .and_then(|message| {
                debug!(type_code = message.type_code(), "handling request");
                self.handle_message(message)
            })
            .unwrap_or_else(|err| {
                debug!(error = %err, "request failed");
                SyncMessage::Error(ErrorResponse::new(err.to_string()))
            });

        reply
            .encode()
            .unwrap_or_else(|err| error_reply(&err.to_string()))
    }

    /// Stops serving and tears down the cache. The store is left untouched.
    ///
    /// Waits for requests already being handled; later ones are refused.
    pub fn shutdown(&self) {
        let mut stopped = self.stopped.write();
        if *stopped {
            return;
        }
        *stopped = true;
        let cache = self.coordinator().cache();
        let entries = cache.len();
        cache.clear();
        info!(entries, "sync service stopped, cache cleared");
    }

    fn serving<T>(&self, handle: impl FnOnce() -> ServerResult<T>) -> ServerResult<T> {
        let stopped = self.stopped.read();
        if *stopped {
            return Err(ServerError::ShuttingDown);
        }
        handle()
    }
}

/// Encodes an [`SyncMessage::Error`] reply.
pub(crate) fn error_reply(message: &str) -> Vec<u8> {
    SyncMessage::Error(ErrorResponse::new(message))
        .encode()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossync_core::{EntityId, InMemoryStore, Record, VersionToken};

    fn create_server() -> SyncServer<InMemoryStore> {
        SyncServer::new(ServerConfig::default(), Arc::new(InMemoryStore::new()))
    }

    fn roundtrip(server: &SyncServer<InMemoryStore>, message: SyncMessage) -> SyncMessage {
        SyncMessage::decode(&server.handle_frame(&message.encode().unwrap())).unwrap()
    }

    #[test]
    fn update_flow_over_frames() {
        let server = create_server();
        let id = EntityId::new();

        // 1. Register
        let reply = roundtrip(
            &server,
            SyncMessage::EnsureExists(EnsureExistsRequest { entity_id: id }),
        );
        assert_eq!(
            reply,
            SyncMessage::EnsureExistsResponse(EnsureExistsResponse::success(true))
        );

        // 2. Fetch the empty record
        let SyncMessage::FetchResponse(fetched) =
            roundtrip(&server, SyncMessage::Fetch(FetchRequest { entity_id: id }))
        else {
            panic!("expected fetch response");
        };
        assert!(fetched.record.unwrap().is_empty());

        // 3. Submit from the empty record
        let v1 = VersionToken::new();
        let reply = roundtrip(
            &server,
            SyncMessage::SubmitUpdate(SubmitUpdateRequest::new(Record::new(id, v1, "a"), None)),
        );
        assert_eq!(
            reply,
            SyncMessage::SubmitUpdateResponse(SubmitUpdateResponse::accepted())
        );

        // 4. A stale submission is rejected
        let reply = roundtrip(
            &server,
            SyncMessage::SubmitUpdate(SubmitUpdateRequest::new(
                Record::new(id, VersionToken::new(), "b"),
                None,
            )),
        );
        assert_eq!(
            reply,
            SyncMessage::SubmitUpdateResponse(SubmitUpdateResponse::rejected(Some(v1)))
        );
    }

    #[test]
    fn garbage_gets_error_reply() {
        let server = create_server();
        let reply = SyncMessage::decode(&server.handle_frame(b"not cbor")).unwrap();
        assert!(matches!(reply, SyncMessage::Error(_)));
    }

    #[test]
    fn response_messages_get_error_reply() {
        let server = create_server();
        let reply = roundtrip(
            &server,
            SyncMessage::EvictResponse(EvictResponse { evicted: false }),
        );
        let SyncMessage::Error(error) = reply else {
            panic!("expected error reply");
        };
        assert!(error.message.contains("unexpected message type"));
    }

    #[test]
    fn shutdown_clears_cache_only() {
        let store = Arc::new(InMemoryStore::new());
        let server = SyncServer::new(ServerConfig::default(), Arc::clone(&store));
        let id = EntityId::new();
        server
            .handle_submit(SubmitUpdateRequest::new(
                Record::new(id, VersionToken::new(), "a"),
                None,
            ))
            .unwrap();
        assert_eq!(server.coordinator().cache().len(), 1);

        server.shutdown();
        assert!(server.coordinator().cache().is_empty());
        assert_eq!(store.table().record_count(), 1);
    }

    #[test]
    fn requests_after_shutdown_are_refused() {
        let store = Arc::new(InMemoryStore::new());
        let server = SyncServer::new(ServerConfig::default(), Arc::clone(&store));
        let id = EntityId::new();
        let v1 = VersionToken::new();
        server
            .handle_submit(SubmitUpdateRequest::new(Record::new(id, v1, "a"), None))
            .unwrap();

        server.shutdown();
        assert!(server.is_stopped());

        // Without the cache a stale write would only be caught by the store.
        let err = server
            .handle_submit(SubmitUpdateRequest::new(
                Record::new(id, VersionToken::new(), "b"),
                None,
            ))
            .unwrap_err();
        assert!(matches!(err, ServerError::ShuttingDown));
        assert!(err.is_retryable());
        assert!(server.coordinator().cache().is_empty());

        let SyncMessage::Error(error) =
            roundtrip(&server, SyncMessage::Fetch(FetchRequest { entity_id: id }))
        else {
            panic!("expected error reply");
        };
        assert!(error.message.contains("shutting down"));
        assert_eq!(store.read_record(id).unwrap().unwrap().version, Some(v1));

        // A second shutdown is a no-op.
        server.shutdown();
    }
}
