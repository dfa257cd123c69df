//! Free-text routing onto agent keyword profiles.

use crate::workflow::domain::{
    PlanParts, RoutingContext, RoutingContextError, RoutingPolicy, WorkflowId, WorkflowPlan,
};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors returned by [`WorkflowRouter::route`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoutingError {
    /// The context violates its schema.
    #[error("invalid routing context: {0}")]
    InvalidContext(#[from] RoutingContextError),
}

/// Turns a request into a [`WorkflowPlan`] using a [`RoutingPolicy`].
///
/// Routing never fails on unmatched text; it falls back to the policy's
/// fallback agent.
#[derive(Debug, Clone)]
pub struct WorkflowRouter {
    policy: Arc<RoutingPolicy>,
}

impl WorkflowRouter {
    /// Creates a router over `policy`.
    #[must_use]
    pub const fn new(policy: Arc<RoutingPolicy>) -> Self {
        Self { policy }
    }

    /// Returns the active policy.
    #[must_use]
    pub fn policy(&self) -> &RoutingPolicy {
        &self.policy
    }

    /// Validates `context` and routes `intent_text`.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::InvalidContext`] when `context` is not an
    /// object or a reserved key is malformed.
    pub fn route(&self, intent_text: &str, context: Value) -> Result<WorkflowPlan, RoutingError> {
        let validated = RoutingContext::try_from(context)?;
        Ok(self.route_with(intent_text, validated))
    }

    /// Routes `intent_text` with an already validated context.
    #[must_use]
    pub fn route_with(&self, intent_text: &str, context: RoutingContext) -> WorkflowPlan {
        let normalized = intent_text.to_lowercase();
        let selection = self.policy.select(&normalized);
        let supporting_agents = self.policy.supporting_agents(&selection.agent).to_vec();
        let estimated_minutes = self.policy.estimated_minutes(&selection.agent);

        if selection.fallback {
            debug!(agent = %selection.agent, "no profile matched; using fallback agent");
        }
        let plan = WorkflowPlan::new(PlanParts {
            workflow_id: WorkflowId::new(),
            primary_agent: selection.agent,
            supporting_agents,
            confidence: selection.confidence,
            fallback: selection.fallback,
            estimated_minutes,
            context,
        });
        info!(
            workflow_id = %plan.workflow_id(),
            primary = %plan.primary_agent(),
            confidence = %plan.confidence(),
            steps = plan.steps().len(),
            policy_version = self.policy.version(),
            "request routed"
        );
        plan
    }
}
