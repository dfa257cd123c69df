//! Inbound message handling for the coordinating agent.

use super::engine::{CallbackOutcome, WorkflowEngine};
use crate::messaging::{
    ports::PeerRequest,
    services::{HandlerError, InboundHandler},
};
use crate::registry::{
    domain::AgentMetadata,
    ports::AgentRegistryRepository,
    services::ServiceRegistry,
};
use crate::workflow::{
    domain::WorkflowId,
    ports::{WorkflowDispatcher, WorkflowStore},
};
use async_trait::async_trait;
use mockable::Clock;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

/// Sent by an agent when it finished a workflow.
pub const WORKFLOW_COMPLETE_MESSAGE_TYPE: &str = "workflow_complete";

/// Sent by an agent when it could not finish a workflow.
pub const WORKFLOW_ERROR_MESSAGE_TYPE: &str = "workflow_error";

/// Sent by an agent registering itself through the coordinator.
pub const AGENT_REGISTRATION_MESSAGE_TYPE: &str = "agent_registration";

/// Handles `workflow_complete`, `workflow_error` and `agent_registration`
/// messages, acknowledging every message it accepts.
pub struct WorkflowCallbackHandler<S, D, R, C>
where
    S: WorkflowStore,
    D: WorkflowDispatcher,
    R: AgentRegistryRepository,
    C: Clock + Send + Sync,
{
    engine: WorkflowEngine<S, D, C>,
    registry: ServiceRegistry<R, C>,
}

impl<S, D, R, C> WorkflowCallbackHandler<S, D, R, C>
where
    S: WorkflowStore,
    D: WorkflowDispatcher,
    R: AgentRegistryRepository,
    C: Clock + Send + Sync,
{
    /// Creates a handler feeding `engine` and `registry`.
    #[must_use]
    pub const fn new(engine: WorkflowEngine<S, D, C>, registry: ServiceRegistry<R, C>) -> Self {
        Self { engine, registry }
    }

    async fn workflow_callback(&self, request: &PeerRequest) {
        let Some(id) = workflow_id(&request.payload) else {
            warn!(
                from = %request.from_agent,
                message_type = %request.message_type,
                "workflow callback without a valid workflow_id"
            );
            return;
        };
        let outcome = if request.message_type == WORKFLOW_COMPLETE_MESSAGE_TYPE {
            self.engine.on_complete(id).await
        } else {
            let reason = request
                .payload
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unspecified error reported by agent");
            self.engine.on_error(id, reason).await
        };
        if outcome == CallbackOutcome::Applied {
            info!(
                workflow_id = %id,
                from = %request.from_agent,
                message_type = %request.message_type,
                "workflow callback applied"
            );
        }
    }

    async fn register(&self, request: &PeerRequest) -> Result<(), HandlerError> {
        let metadata: AgentMetadata = serde_json::from_value(request.payload.clone())?;
        let record = self
            .registry
            .register(request.from_agent.as_str(), metadata)
            .await?;
        info!(agent = %record.name(), agent_type = %record.agent_type(), "agent registered via message");
        Ok(())
    }
}

#[async_trait]
impl<S, D, R, C> InboundHandler for WorkflowCallbackHandler<S, D, R, C>
where
    S: WorkflowStore,
    D: WorkflowDispatcher,
    R: AgentRegistryRepository,
    C: Clock + Send + Sync,
{
    async fn handle(&self, request: &PeerRequest) -> Result<Value, HandlerError> {
        match request.message_type.as_str() {
            WORKFLOW_COMPLETE_MESSAGE_TYPE | WORKFLOW_ERROR_MESSAGE_TYPE => {
                self.workflow_callback(request).await;
            }
            AGENT_REGISTRATION_MESSAGE_TYPE => self.register(request).await?,
            other => {
                debug!(from = %request.from_agent, message_type = %other, "unhandled message type");
            }
        }
        Ok(json!({ "status": "acknowledged" }))
    }
}

fn workflow_id(payload: &Value) -> Option<WorkflowId> {
    payload
        .get("workflow_id")
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse().ok())
}
