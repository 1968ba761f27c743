//! Request handlers for sync messages.

use crate::error::{ServerError, ServerResult};
use crossync_core::{RecordStore, SyncCoordinator, SyncError, UpdateOutcome};
use crossync_protocol::{
    EnsureExistsRequest, EnsureExistsResponse, EvictRequest, EvictResponse, FetchRequest,
    FetchResponse, SubmitUpdateRequest, SubmitUpdateResponse, SyncMessage,
};
use std::sync::Arc;
use tracing::warn;

/// Handler for sync requests.
///
/// Store unavailability is answered in-band through the response's `error`
/// field so the caller can retry. Malformed requests fail with a
/// [`ServerError`].
pub struct RequestHandler<S: RecordStore> {
    coordinator: Arc<SyncCoordinator<S>>,
}

impl<S: RecordStore> RequestHandler<S> {
    /// Creates a new request handler.
    pub fn new(coordinator: Arc<SyncCoordinator<S>>) -> Self {
        Self { coordinator }
    }

    /// Returns the coordinator requests are dispatched to.
    pub fn coordinator(&self) -> &Arc<SyncCoordinator<S>> {
        &self.coordinator
    }

    /// Handles a submit update request.
    pub fn handle_submit(&self, request: SubmitUpdateRequest) -> ServerResult<SubmitUpdateResponse> {
        if request.entity_id != request.record.entity_id {
            return Err(ServerError::InvalidRequest(format!(
                "request for {} carries a record for {}",
                request.entity_id, request.record.entity_id
            )));
        }

        match self
            .coordinator
            .submit_update(request.record, request.expected_version.as_ref())
        {
            Ok(UpdateOutcome::Accepted) => Ok(SubmitUpdateResponse::accepted()),
            Ok(UpdateOutcome::Rejected { current_version }) => {
                Ok(SubmitUpdateResponse::rejected(current_version))
            }
            Err(err) => in_band(err, SubmitUpdateResponse::error),
        }
    }

    /// Handles a fetch request.
    pub fn handle_fetch(&self, request: FetchRequest) -> ServerResult<FetchResponse> {
        match self.coordinator.fetch(request.entity_id) {
            Ok(record) => Ok(FetchResponse::found(record)),
            Err(err) => in_band(err, FetchResponse::error),
        }
    }

    /// Handles an ensure-exists request.
    pub fn handle_ensure(&self, request: EnsureExistsRequest) -> ServerResult<EnsureExistsResponse> {
        match self.coordinator.ensure_exists(request.entity_id) {
            Ok(created) => Ok(EnsureExistsResponse::success(created)),
            Err(err) => in_band(err, EnsureExistsResponse::error),
        }
    }

    /// Handles an evict request.
    pub fn handle_evict(&self, request: EvictRequest) -> ServerResult<EvictResponse> {
        if !request.entity_id.is_valid() {
            return Err(ServerError::InvalidRequest("nil entity id".into()));
        }
        let evicted = self.coordinator.evict(request.entity_id);
        Ok(EvictResponse { evicted })
    }

    /// Handles a sync message (dispatches to appropriate handler).
    pub fn handle_message(&self, message: SyncMessage) -> ServerResult<SyncMessage> {
        match message {
            SyncMessage::SubmitUpdate(req) => {
                self.handle_submit(req).map(SyncMessage::SubmitUpdateResponse)
            }
            SyncMessage::Fetch(req) => self.handle_fetch(req).map(SyncMessage::FetchResponse),
            SyncMessage::EnsureExists(req) => self
                .handle_ensure(req)
                .map(SyncMessage::EnsureExistsResponse),
            SyncMessage::Evict(req) => self.handle_evict(req).map(SyncMessage::EvictResponse),
            other => Err(ServerError::UnexpectedMessage(other.type_code())),
        }
    }
}

/// Turns a retryable coordinator failure into an in-band response.
fn in_band<T>(err: SyncError, respond: impl FnOnce(String) -> T) -> ServerResult<T> {
    if err.is_retryable() {
        warn!(error = %err, "store unavailable while handling request");
        Ok(respond(err.to_string()))
    } else {
        Err(err.into())
    }
}
