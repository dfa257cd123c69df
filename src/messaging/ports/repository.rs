//! Repository port for direct message records.

use crate::messaging::domain::{CorrelationId, InterAgentMessage, MessageId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for message repository operations.
pub type MessageStoreResult<T> = Result<T, MessageStoreError>;

/// Direct message persistence contract.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Stores a new message.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError::DuplicateMessage`] when the identifier is
    /// already stored.
    async fn store(&self, message: &InterAgentMessage) -> MessageStoreResult<()>;

    /// Persists a status change on an existing message.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError::NotFound`] when the message does not
    /// exist.
    async fn update(&self, message: &InterAgentMessage) -> MessageStoreResult<()>;

    /// Finds a message by identifier.
    async fn find_by_id(&self, id: MessageId) -> MessageStoreResult<Option<InterAgentMessage>>;

    /// Returns every message carrying `correlation_id`, oldest first.
    async fn find_by_correlation_id(
        &self,
        correlation_id: &CorrelationId,
    ) -> MessageStoreResult<Vec<InterAgentMessage>>;
}

/// Errors returned by message repository implementations.
#[derive(Debug, Clone, Error)]
pub enum MessageStoreError {
    /// A message with the same identifier already exists.
    #[error("duplicate message identifier: {0}")]
    DuplicateMessage(MessageId),

    /// The message was not found.
    #[error("message not found: {0}")]
    NotFound(MessageId),

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl MessageStoreError {
    /// Wraps a data-quality or deserialization error from persisted rows.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
