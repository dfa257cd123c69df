//! Durable point-to-point message aggregate.

use super::{CorrelationId, DeliveryStatus, MessageId, MessagePriority, MessagingDomainError};
use crate::registry::domain::AgentName;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum message type length, matching the `VARCHAR(30)` column.
const MAX_MESSAGE_TYPE_LENGTH: usize = 30;

/// Parameters for a new direct message.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDraft {
    /// Sending agent.
    pub from_agent: AgentName,
    /// Receiving agent.
    pub to_agent: AgentName,
    /// Receiver-defined message kind, e.g. `workflow_request`.
    pub message_type: String,
    /// Opaque structured body.
    pub payload: Value,
    /// Request correlation token.
    pub correlation_id: CorrelationId,
    /// Sender-assigned urgency.
    pub priority: MessagePriority,
}

impl MessageDraft {
    /// Creates a draft with `normal` priority.
    #[must_use]
    pub fn new(
        from_agent: AgentName,
        to_agent: AgentName,
        message_type: impl Into<String>,
        payload: Value,
        correlation_id: CorrelationId,
    ) -> Self {
        Self {
            from_agent,
            to_agent,
            message_type: message_type.into(),
            payload,
            correlation_id,
            priority: MessagePriority::Normal,
        }
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: MessagePriority) -> Self {
        self.priority = priority;
        self
    }
}

/// One directed message between two agents.
///
/// Owned by the sender until its status settles. Retries create new
/// messages that reuse the correlation id; a settled message is never
/// reopened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterAgentMessage {
    id: MessageId,
    from_agent: AgentName,
    to_agent: AgentName,
    message_type: String,
    payload: Value,
    priority: MessagePriority,
    status: DeliveryStatus,
    correlation_id: CorrelationId,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted message.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedMessageData {
    /// Persisted message identifier.
    pub id: MessageId,
    /// Persisted sender.
    pub from_agent: AgentName,
    /// Persisted receiver.
    pub to_agent: AgentName,
    /// Persisted message kind.
    pub message_type: String,
    /// Persisted body.
    pub payload: Value,
    /// Persisted priority.
    pub priority: MessagePriority,
    /// Persisted delivery status.
    pub status: DeliveryStatus,
    /// Persisted correlation token.
    pub correlation_id: CorrelationId,
    /// Persisted failure cause, if any.
    pub failure_reason: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted delivery timestamp, if delivered.
    pub processed_at: Option<DateTime<Utc>>,
}

impl InterAgentMessage {
    /// Creates a `pending` message from a draft.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingDomainError::EmptyMessageType`] or
    /// [`MessagingDomainError::MessageTypeTooLong`] when the message type is
    /// unusable.
    pub fn pending(draft: MessageDraft, clock: &impl Clock) -> Result<Self, MessagingDomainError> {
        let message_type = validate_message_type(&draft.message_type)?;
        Ok(Self {
            id: MessageId::new(),
            from_agent: draft.from_agent,
            to_agent: draft.to_agent,
            message_type,
            payload: draft.payload,
            priority: draft.priority,
            status: DeliveryStatus::Pending,
            correlation_id: draft.correlation_id,
            failure_reason: None,
            created_at: clock.utc(),
            processed_at: None,
        })
    }

    /// Reconstructs a message from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedMessageData) -> Self {
        Self {
            id: data.id,
            from_agent: data.from_agent,
            to_agent: data.to_agent,
            message_type: data.message_type,
            payload: data.payload,
            priority: data.priority,
            status: data.status,
            correlation_id: data.correlation_id,
            failure_reason: data.failure_reason,
            created_at: data.created_at,
            processed_at: data.processed_at,
        }
    }

    /// Settles the message as delivered and stamps `processed_at`.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingDomainError::AlreadySettled`] when the message is
    /// no longer pending.
    pub fn mark_delivered(&mut self, clock: &impl Clock) -> Result<(), MessagingDomainError> {
        self.ensure_pending()?;
        self.status = DeliveryStatus::Delivered;
        self.processed_at = Some(clock.utc());
        Ok(())
    }

    /// Settles the message as failed with a cause.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingDomainError::AlreadySettled`] when the message is
    /// no longer pending.
    pub fn mark_failed(&mut self, reason: impl Into<String>) -> Result<(), MessagingDomainError> {
        self.ensure_pending()?;
        self.status = DeliveryStatus::Failed;
        self.failure_reason = Some(reason.into());
        Ok(())
    }

    const fn ensure_pending(&self) -> Result<(), MessagingDomainError> {
        if self.status.is_terminal() {
            return Err(MessagingDomainError::AlreadySettled {
                id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }

    /// Returns the message identifier.
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the sender.
    #[must_use]
    pub const fn from_agent(&self) -> &AgentName {
        &self.from_agent
    }

    /// Returns the receiver.
    #[must_use]
    pub const fn to_agent(&self) -> &AgentName {
        &self.to_agent
    }

    /// Returns the message kind.
    #[must_use]
    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    /// Returns the body.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> MessagePriority {
        self.priority
    }

    /// Returns the delivery status.
    #[must_use]
    pub const fn status(&self) -> DeliveryStatus {
        self.status
    }

    /// Returns the correlation token.
    #[must_use]
    pub const fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// Returns why delivery failed, if it did.
    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the receiver acknowledged the message.
    #[must_use]
    pub const fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }
}

fn validate_message_type(raw: &str) -> Result<String, MessagingDomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MessagingDomainError::EmptyMessageType);
    }
    if trimmed.chars().count() > MAX_MESSAGE_TYPE_LENGTH {
        return Err(MessagingDomainError::MessageTypeTooLong(raw.to_owned()));
    }
    Ok(trimmed.to_owned())
}
