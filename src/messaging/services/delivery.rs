//! Point-to-point delivery with durable status accounting.
//!
//! [`DirectDelivery::send`] persists every message as `pending` before any
//! network activity and settles it exactly once. Every failure after the
//! record exists leaves it `failed`; the caller decides whether to re-send
//! with the same correlation id.

use crate::messaging::{
    domain::{
        CorrelationId, InterAgentMessage, MessageDraft, MessagePriority, MessagingDomainError,
    },
    ports::{
        MessageRepository, MessageStoreError, PeerRequest, PeerResponse, PeerTransport,
        TransportError,
    },
};
use crate::registry::{
    domain::{AgentName, RegistryDomainError},
    ports::{AgentRegistryRepository, HealthProbe},
    services::{HealthMonitor, ServiceRegistryError},
};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Upper bound on a single direct delivery.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Parameters of one direct send.
#[derive(Debug, Clone, PartialEq)]
pub struct SendRequest {
    /// Receiving agent name.
    pub to_agent: String,
    /// Receiver-defined message kind.
    pub message_type: String,
    /// Opaque structured body.
    pub payload: Value,
    /// Correlation token; generated when absent.
    pub correlation_id: Option<String>,
    /// Sender-assigned urgency.
    pub priority: MessagePriority,
}

impl SendRequest {
    /// Creates a `normal` priority request with a generated correlation id.
    #[must_use]
    pub fn new(to_agent: impl Into<String>, message_type: impl Into<String>, payload: Value) -> Self {
        Self {
            to_agent: to_agent.into(),
            message_type: message_type.into(),
            payload,
            correlation_id: None,
            priority: MessagePriority::Normal,
        }
    }

    /// Sets the correlation id.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: MessagePriority) -> Self {
        self.priority = priority;
        self
    }

    /// Builds a re-send of `message` that reuses its correlation id.
    #[must_use]
    pub fn retry_of(message: &InterAgentMessage) -> Self {
        Self {
            to_agent: message.to_agent().to_string(),
            message_type: message.message_type().to_owned(),
            payload: message.payload().clone(),
            correlation_id: Some(message.correlation_id().to_string()),
            priority: message.priority(),
        }
    }
}

/// Outcome of a successful send.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReceipt {
    /// The message as persisted with `delivered` status.
    pub message: InterAgentMessage,
    /// The receiver's reply.
    pub response: PeerResponse,
}

/// Errors returned by [`DirectDelivery`].
#[derive(Debug, Clone, Error)]
pub enum SendError {
    /// The recipient name is malformed; nothing was persisted.
    #[error("invalid recipient: {0}")]
    Recipient(#[source] RegistryDomainError),

    /// The message could not be constructed; nothing was persisted.
    #[error(transparent)]
    Message(#[from] MessagingDomainError),

    /// The recipient is not registered or has no reachable address.
    #[error("unknown agent {to_agent} (correlation {correlation_id})")]
    UnknownAgent {
        /// Intended recipient.
        to_agent: AgentName,
        /// Correlation id of the failed message.
        correlation_id: CorrelationId,
    },

    /// The recipient is registered but not healthy.
    #[error("agent {to_agent} is unavailable (correlation {correlation_id})")]
    AgentUnavailable {
        /// Intended recipient.
        to_agent: AgentName,
        /// Correlation id of the failed message.
        correlation_id: CorrelationId,
    },

    /// The request failed in transit.
    #[error("delivery to {to_agent} failed (correlation {correlation_id}): {source}")]
    Delivery {
        /// Intended recipient.
        to_agent: AgentName,
        /// Correlation id of the failed message.
        correlation_id: CorrelationId,
        /// Transport failure.
        source: TransportError,
    },

    /// The message store failed.
    #[error(transparent)]
    Store(#[from] MessageStoreError),

    /// The registry lookup failed.
    #[error(transparent)]
    Registry(#[from] ServiceRegistryError),
}

/// Sends direct messages on behalf of one agent.
pub struct DirectDelivery<R, P, M, T, C>
where
    R: AgentRegistryRepository,
    P: HealthProbe,
    M: MessageRepository,
    T: PeerTransport,
    C: Clock + Send + Sync,
{
    monitor: HealthMonitor<R, P, C>,
    messages: Arc<M>,
    transport: Arc<T>,
    from_agent: AgentName,
    timeout: Duration,
}

impl<R, P, M, T, C> Clone for DirectDelivery<R, P, M, T, C>
where
    R: AgentRegistryRepository,
    P: HealthProbe,
    M: MessageRepository,
    T: PeerTransport,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            monitor: self.monitor.clone(),
            messages: Arc::clone(&self.messages),
            transport: Arc::clone(&self.transport),
            from_agent: self.from_agent.clone(),
            timeout: self.timeout,
        }
    }
}

impl<R, P, M, T, C> DirectDelivery<R, P, M, T, C>
where
    R: AgentRegistryRepository,
    P: HealthProbe,
    M: MessageRepository,
    T: PeerTransport,
    C: Clock + Send + Sync,
{
    /// Creates a sender identified as `from_agent`.
    #[must_use]
    pub fn new(
        monitor: HealthMonitor<R, P, C>,
        messages: Arc<M>,
        transport: Arc<T>,
        from_agent: AgentName,
    ) -> Self {
        Self {
            monitor,
            messages,
            transport,
            from_agent,
            timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }

    /// Overrides the per-delivery timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the sending agent.
    #[must_use]
    pub const fn from_agent(&self) -> &AgentName {
        &self.from_agent
    }

    /// Returns the health monitor consulted before each send.
    #[must_use]
    pub const fn monitor(&self) -> &HealthMonitor<R, P, C> {
        &self.monitor
    }

    /// Persists and delivers one message.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Recipient`] or [`SendError::Message`] before
    /// anything is persisted. After persistence, returns
    /// [`SendError::UnknownAgent`], [`SendError::AgentUnavailable`],
    /// [`SendError::Delivery`] or [`SendError::Registry`], each of which
    /// leaves the stored message `failed`. [`SendError::Store`] is returned
    /// when the message store fails.
    pub async fn send(&self, request: SendRequest) -> Result<DeliveryReceipt, SendError> {
        let to_agent = AgentName::new(request.to_agent).map_err(SendError::Recipient)?;
        let correlation_id = request
            .correlation_id
            .map(CorrelationId::new)
            .transpose()?
            .unwrap_or_else(CorrelationId::generate);
        let draft = MessageDraft::new(
            self.from_agent.clone(),
            to_agent.clone(),
            request.message_type,
            request.payload,
            correlation_id.clone(),
        )
        .with_priority(request.priority);
        let mut message = InterAgentMessage::pending(draft, self.clock())?;
        self.messages.store(&message).await?;
        debug!(
            message_id = %message.id(),
            to = %to_agent,
            %correlation_id,
            message_type = %message.message_type(),
            "direct message persisted as pending"
        );

        let record = match self.monitor.registry().get_by_name(&to_agent).await {
            Ok(record) => record,
            Err(ServiceRegistryError::NotFound(_)) => {
                let err = SendError::UnknownAgent {
                    to_agent,
                    correlation_id,
                };
                return Err(self.settle_failed(&mut message, err).await);
            }
            Err(err) => return Err(self.settle_failed(&mut message, err.into()).await),
        };
        let Some(endpoint) = record.endpoint() else {
            let err = SendError::UnknownAgent {
                to_agent,
                correlation_id,
            };
            return Err(self.settle_failed(&mut message, err).await);
        };
        if !self.monitor.is_record_healthy(&record).await {
            let err = SendError::AgentUnavailable {
                to_agent,
                correlation_id,
            };
            return Err(self.settle_failed(&mut message, err).await);
        }

        let peer_request = PeerRequest {
            from_agent: self.from_agent.clone(),
            message_type: message.message_type().to_owned(),
            payload: message.payload().clone(),
            correlation_id: correlation_id.clone(),
        };
        let delivery = self
            .transport
            .deliver(&endpoint, &peer_request, self.timeout);
        let outcome = tokio::time::timeout(self.timeout, delivery)
            .await
            .unwrap_or(Err(TransportError::Timeout(self.timeout)));

        match outcome {
            Ok(response) => {
                message.mark_delivered(self.clock())?;
                self.messages.update(&message).await?;
                info!(
                    message_id = %message.id(),
                    to = %to_agent,
                    %correlation_id,
                    "direct message delivered"
                );
                Ok(DeliveryReceipt { message, response })
            }
            Err(source) => {
                let err = SendError::Delivery {
                    to_agent,
                    correlation_id,
                    source,
                };
                Err(self.settle_failed(&mut message, err).await)
            }
        }
    }

    /// Returns every message sent under `correlation_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Message`] for a malformed id or
    /// [`SendError::Store`] when the store fails.
    pub async fn history(&self, correlation_id: &str) -> Result<Vec<InterAgentMessage>, SendError> {
        let id = CorrelationId::new(correlation_id)?;
        Ok(self.messages.find_by_correlation_id(&id).await?)
    }

    fn clock(&self) -> &C {
        self.monitor.registry().clock()
    }

    /// Marks `message` failed with the cause and returns the error to
    /// surface. A store failure while settling replaces the cause.
    async fn settle_failed(&self, message: &mut InterAgentMessage, cause: SendError) -> SendError {
        if let Err(err) = message.mark_failed(cause.to_string()) {
            warn!(message_id = %message.id(), error = %err, "message already settled");
            return cause;
        }
        if let Err(err) = self.messages.update(message).await {
            error!(
                message_id = %message.id(),
                cause = %cause,
                error = %err,
                "failed to persist failed delivery status"
            );
            return SendError::Store(err);
        }
        warn!(
            message_id = %message.id(),
            to = %message.to_agent(),
            correlation_id = %message.correlation_id(),
            error = %cause,
            "direct message failed"
        );
        cause
    }
}
