//! Publish/subscribe transport port.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for pub/sub transport operations.
pub type PubSubResult<T> = Result<T, PubSubError>;

/// Generic topic transport carrying opaque bytes.
#[async_trait]
pub trait PubSubTransport: Send + Sync {
    /// Publishes `body` on `channel`, returning how many subscribers were
    /// connected at the time.
    ///
    /// # Errors
    ///
    /// Returns [`PubSubError`] when the transport rejects the publish.
    async fn publish(&self, channel: &str, body: Vec<u8>) -> PubSubResult<usize>;

    /// Opens a subscription receiving every later message on `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`PubSubError`] when the subscription cannot be created.
    async fn subscribe(&self, channel: &str) -> PubSubResult<Box<dyn ChannelReceiver>>;
}

/// One open subscription.
#[async_trait]
pub trait ChannelReceiver: Send {
    /// Waits for the next message, or `None` once the channel is closed.
    async fn recv(&mut self) -> Option<Vec<u8>>;
}

/// Errors returned by pub/sub transports.
#[derive(Debug, Clone, Error)]
pub enum PubSubError {
    /// The transport has been shut down.
    #[error("pub/sub transport is closed")]
    Closed,

    /// Transport-level failure.
    #[error("pub/sub transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl PubSubError {
    /// Wraps a transport failure.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
