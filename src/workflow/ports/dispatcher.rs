//! Hand-off of a workflow's first step to its primary agent.

use crate::registry::domain::AgentName;
use crate::workflow::domain::{CallerIdentity, RoutingContext, WorkflowId};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// What the primary agent is asked to do.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRequest {
    /// Workflow being started.
    pub workflow_id: WorkflowId,
    /// Agent receiving the request.
    pub primary_agent: AgentName,
    /// User behind the workflow.
    pub requesting_user: CallerIdentity,
    /// Context forwarded from routing.
    pub context: RoutingContext,
}

/// Failures of a workflow hand-off.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// The primary agent is unknown or known to be down.
    #[error("agent {agent} is unreachable: {reason}")]
    Unreachable {
        /// Intended agent.
        agent: AgentName,
        /// Why the agent could not be used.
        reason: String,
    },

    /// The request was attempted and failed.
    #[error("dispatch failed: {0}")]
    Delivery(Arc<dyn std::error::Error + Send + Sync>),
}

impl DispatchError {
    /// Wraps a delivery error.
    pub fn delivery(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Delivery(Arc::new(err))
    }
}

/// Delivers the first step of a workflow.
#[async_trait]
pub trait WorkflowDispatcher: Send + Sync {
    /// Sends `request` to its primary agent and returns the agent's reply.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the agent cannot be reached or the
    /// delivery fails. Implementations do not retry.
    async fn dispatch(&self, request: &DispatchRequest) -> Result<Value, DispatchError>;
}
