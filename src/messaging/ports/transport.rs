//! Point-to-point transport port and the peer wire format.

use crate::messaging::domain::CorrelationId;
use crate::registry::domain::AgentName;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Body of `POST /messages/receive`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerRequest {
    /// Sending agent.
    pub from_agent: AgentName,
    /// Receiver-defined message kind.
    pub message_type: String,
    /// Opaque structured body.
    pub payload: Value,
    /// Request correlation token.
    pub correlation_id: CorrelationId,
}

/// Reply to a [`PeerRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerResponse {
    /// Receiver-reported outcome, `received` on success.
    pub status: String,
    /// Receiver-defined result body.
    #[serde(default)]
    pub response: Value,
}

impl PeerResponse {
    /// Creates a `received` response wrapping `response`.
    #[must_use]
    pub fn received(response: Value) -> Self {
        Self {
            status: "received".to_owned(),
            response,
        }
    }
}

/// Failures of a single point-to-point request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// No response arrived within the timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The peer answered with a non-2xx status.
    #[error("peer returned HTTP {code}: {body}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The peer could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The peer's reply could not be decoded.
    #[error("invalid peer response: {0}")]
    Decode(String),
}

/// Issues one request against a peer's message endpoint.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Delivers `request` to the agent listening at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] for timeouts, non-2xx replies, connection
    /// failures and undecodable replies.
    async fn deliver(
        &self,
        endpoint: &str,
        request: &PeerRequest,
        timeout: Duration,
    ) -> Result<PeerResponse, TransportError>;
}

/// Receiving side of the peer message surface.
///
/// An HTTP layer maps `POST /messages/receive` onto this trait; in-process
/// transports call it directly.
#[async_trait]
pub trait PeerEndpoint: Send + Sync {
    /// Handles one inbound request.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the receiver rejects the request.
    async fn receive(&self, request: PeerRequest) -> Result<PeerResponse, TransportError>;
}
