//! In-memory repository for direct message records.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::messaging::{
    domain::{CorrelationId, InterAgentMessage, MessageId},
    ports::{MessageRepository, MessageStoreError, MessageStoreResult},
};

/// Thread-safe in-memory message repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMessageRepository {
    state: Arc<RwLock<InMemoryMessageState>>,
}

#[derive(Debug, Default)]
struct InMemoryMessageState {
    messages: HashMap<MessageId, InterAgentMessage>,
    insertion_order: Vec<MessageId>,
}

impl InMemoryMessageRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored message in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError::Persistence`] when lock acquisition fails.
    pub fn all(&self) -> MessageStoreResult<Vec<InterAgentMessage>> {
        let state = self.state.read().map_err(|err| {
            MessageStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state
            .insertion_order
            .iter()
            .filter_map(|id| state.messages.get(id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn store(&self, message: &InterAgentMessage) -> MessageStoreResult<()> {
        let mut state = self.state.write().map_err(|err| {
            MessageStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;

        if state.messages.contains_key(&message.id()) {
            return Err(MessageStoreError::DuplicateMessage(message.id()));
        }

        state.insertion_order.push(message.id());
        state.messages.insert(message.id(), message.clone());
        Ok(())
    }

    async fn update(&self, message: &InterAgentMessage) -> MessageStoreResult<()> {
        let mut state = self.state.write().map_err(|err| {
            MessageStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;

        let stored = state
            .messages
            .get_mut(&message.id())
            .ok_or(MessageStoreError::NotFound(message.id()))?;
        *stored = message.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: MessageId) -> MessageStoreResult<Option<InterAgentMessage>> {
        let state = self.state.read().map_err(|err| {
            MessageStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.messages.get(&id).cloned())
    }

    async fn find_by_correlation_id(
        &self,
        correlation_id: &CorrelationId,
    ) -> MessageStoreResult<Vec<InterAgentMessage>> {
        let state = self.state.read().map_err(|err| {
            MessageStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state
            .insertion_order
            .iter()
            .filter_map(|id| state.messages.get(id))
            .filter(|message| message.correlation_id() == correlation_id)
            .cloned()
            .collect())
    }
}
