//! Dispatcher that hands workflows off through direct delivery.

use crate::messaging::{
    ports::{MessageRepository, PeerTransport},
    services::{DirectDelivery, SendError, SendRequest},
};
use crate::registry::ports::{AgentRegistryRepository, HealthProbe};
use crate::workflow::ports::{DispatchError, DispatchRequest, WorkflowDispatcher};
use async_trait::async_trait;
use mockable::Clock;
use serde_json::{Value, json};

/// Message type of a workflow hand-off.
pub const WORKFLOW_REQUEST_MESSAGE_TYPE: &str = "workflow_request";

/// Sends `workflow_request` messages to primary agents.
///
/// The workflow id doubles as the correlation id, so a re-dispatch of the
/// same workflow is deduplicated by the receiver.
pub struct DeliveryDispatcher<R, P, M, T, C>
where
    R: AgentRegistryRepository,
    P: HealthProbe,
    M: MessageRepository,
    T: PeerTransport,
    C: Clock + Send + Sync,
{
    delivery: DirectDelivery<R, P, M, T, C>,
}

impl<R, P, M, T, C> DeliveryDispatcher<R, P, M, T, C>
where
    R: AgentRegistryRepository,
    P: HealthProbe,
    M: MessageRepository,
    T: PeerTransport,
    C: Clock + Send + Sync,
{
    /// Creates a dispatcher sending through `delivery`.
    #[must_use]
    pub const fn new(delivery: DirectDelivery<R, P, M, T, C>) -> Self {
        Self { delivery }
    }

    /// Returns the underlying delivery service.
    #[must_use]
    pub const fn delivery(&self) -> &DirectDelivery<R, P, M, T, C> {
        &self.delivery
    }
}

#[async_trait]
impl<R, P, M, T, C> WorkflowDispatcher for DeliveryDispatcher<R, P, M, T, C>
where
    R: AgentRegistryRepository,
    P: HealthProbe,
    M: MessageRepository,
    T: PeerTransport,
    C: Clock + Send + Sync,
{
    async fn dispatch(&self, request: &DispatchRequest) -> Result<Value, DispatchError> {
        let payload = json!({
            "workflow_id": request.workflow_id,
            "user_id": request.requesting_user.user_id(),
            "request_type": "workflow_start",
            "context": request.context.to_value(),
        });
        let send = SendRequest::new(
            request.primary_agent.as_str(),
            WORKFLOW_REQUEST_MESSAGE_TYPE,
            payload,
        )
        .with_correlation_id(request.workflow_id.to_string())
        .with_priority(request.context.priority());

        match self.delivery.send(send).await {
            Ok(receipt) => Ok(receipt.response.response),
            Err(SendError::UnknownAgent { to_agent, .. }) => Err(DispatchError::Unreachable {
                agent: to_agent,
                reason: "not registered".to_owned(),
            }),
            Err(SendError::AgentUnavailable { to_agent, .. }) => Err(DispatchError::Unreachable {
                agent: to_agent,
                reason: "not healthy".to_owned(),
            }),
            Err(err) => Err(DispatchError::delivery(err)),
        }
    }
}
