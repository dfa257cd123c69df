//! Receiver-side idempotent handling of direct messages.

use crate::keyed_lock::KeyedLocks;
use crate::messaging::{
    domain::CorrelationId,
    ports::{PeerEndpoint, PeerRequest, PeerResponse, TransportError},
};
use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, warn};

/// Number of processed correlation ids remembered by default.
pub const DEFAULT_INBOX_CAPACITY: usize = 10_000;

/// Error type returned by application message handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Application logic behind an agent's message endpoint.
#[async_trait]
pub trait InboundHandler: Send + Sync {
    /// Applies the side effects of `request` and returns the reply body.
    async fn handle(&self, request: &PeerRequest) -> Result<Value, HandlerError>;
}

/// Errors returned by [`MessageInbox::receive`].
#[derive(Debug, Clone, Error)]
pub enum InboxError {
    /// The handler rejected the request; nothing was recorded.
    #[error("handler failed for {message_type} ({correlation_id}): {source}")]
    Handler {
        /// Message kind that failed.
        message_type: String,
        /// Correlation id of the failed request.
        correlation_id: CorrelationId,
        /// Handler failure.
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Debug)]
struct ProcessedEntry {
    fingerprint: [u8; 32],
    response: Value,
}

#[derive(Debug, Default)]
struct ProcessedLog {
    entries: HashMap<CorrelationId, ProcessedEntry>,
    order: VecDeque<CorrelationId>,
}

/// Makes an [`InboundHandler`] idempotent per correlation id.
///
/// The first successful handling of a correlation id is recorded with its
/// reply; repeats get the recorded reply without re-running the handler.
/// Failed handling records nothing, so a retry re-applies the work. The
/// oldest entries are forgotten once `capacity` is exceeded.
pub struct MessageInbox<H>
where
    H: InboundHandler,
{
    handler: Arc<H>,
    locks: KeyedLocks<CorrelationId>,
    processed: Mutex<ProcessedLog>,
    capacity: usize,
}

impl<H> MessageInbox<H>
where
    H: InboundHandler,
{
    /// Creates an inbox with the default capacity.
    #[must_use]
    pub fn new(handler: Arc<H>) -> Self {
        Self::with_capacity(handler, DEFAULT_INBOX_CAPACITY)
    }

    /// Creates an inbox remembering up to `capacity` correlation ids.
    #[must_use]
    pub fn with_capacity(handler: Arc<H>, capacity: usize) -> Self {
        Self {
            handler,
            locks: KeyedLocks::new(),
            processed: Mutex::new(ProcessedLog::default()),
            capacity: capacity.max(1),
        }
    }

    /// Returns the wrapped handler.
    #[must_use]
    pub const fn handler(&self) -> &Arc<H> {
        &self.handler
    }

    /// Handles `request` unless its correlation id was already processed.
    ///
    /// # Errors
    ///
    /// Returns [`InboxError::Handler`] when the handler fails.
    pub async fn receive(&self, request: &PeerRequest) -> Result<PeerResponse, InboxError> {
        let correlation_id = request.correlation_id.clone();
        let _guard = self.locks.lock(&correlation_id).await;
        let digest = fingerprint(request);

        if let Some(response) = self.replay(&correlation_id, &digest) {
            debug!(
                %correlation_id,
                message_type = %request.message_type,
                "duplicate request; replaying recorded response"
            );
            return Ok(PeerResponse::received(response));
        }

        let response = self
            .handler
            .handle(request)
            .await
            .map_err(|err| InboxError::Handler {
                message_type: request.message_type.clone(),
                correlation_id: correlation_id.clone(),
                source: Arc::from(err),
            })?;
        self.record(correlation_id, digest, response.clone());
        Ok(PeerResponse::received(response))
    }

    /// Returns whether `correlation_id` has been processed and is still
    /// remembered.
    #[must_use]
    pub fn has_processed(&self, correlation_id: &CorrelationId) -> bool {
        self.processed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .contains_key(correlation_id)
    }

    /// Returns the number of remembered correlation ids.
    #[must_use]
    pub fn processed_count(&self) -> usize {
        self.processed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    fn replay(&self, correlation_id: &CorrelationId, fingerprint: &[u8; 32]) -> Option<Value> {
        let log = self.processed.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = log.entries.get(correlation_id)?;
        if entry.fingerprint != *fingerprint {
            warn!(
                %correlation_id,
                "correlation id reused with a different payload; treating as duplicate"
            );
        }
        Some(entry.response.clone())
    }

    fn record(&self, correlation_id: CorrelationId, fingerprint: [u8; 32], response: Value) {
        let mut log = self.processed.lock().unwrap_or_else(PoisonError::into_inner);
        log.order.push_back(correlation_id.clone());
        log.entries.insert(
            correlation_id,
            ProcessedEntry {
                fingerprint,
                response,
            },
        );
        while log.order.len() > self.capacity {
            if let Some(evicted) = log.order.pop_front() {
                log.entries.remove(&evicted);
            }
        }
    }
}

#[async_trait]
impl<H> PeerEndpoint for MessageInbox<H>
where
    H: InboundHandler,
{
    async fn receive(&self, request: PeerRequest) -> Result<PeerResponse, TransportError> {
        Self::receive(self, &request)
            .await
            .map_err(|err| TransportError::Status {
                code: 500,
                body: err.to_string(),
            })
    }
}

fn fingerprint(request: &PeerRequest) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(request.from_agent.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(request.message_type.as_bytes());
    hasher.update([0]);
    hasher.update(request.payload.to_string().as_bytes());
    hasher.finalize().into()
}
