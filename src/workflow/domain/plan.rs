//! Routed workflow plans.

use super::{Confidence, RoutingContext, WorkflowId, WorkflowStep};
use crate::registry::domain::AgentName;
use serde::{Deserialize, Serialize};

/// Ordered execution plan produced by the router.
///
/// The first step always belongs to the primary agent; supporting agents
/// follow in the configured order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowPlan {
    workflow_id: WorkflowId,
    primary_agent: AgentName,
    supporting_agents: Vec<AgentName>,
    steps: Vec<WorkflowStep>,
    confidence: Confidence,
    fallback: bool,
    estimated_minutes: u32,
    context: RoutingContext,
}

/// Parameters for [`WorkflowPlan::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlanParts {
    /// Identifier of the new workflow.
    pub workflow_id: WorkflowId,
    /// Agent performing the first step.
    pub primary_agent: AgentName,
    /// Agents performing the later steps, in order.
    pub supporting_agents: Vec<AgentName>,
    /// Score of the primary agent.
    pub confidence: Confidence,
    /// Whether the primary agent is the fallback.
    pub fallback: bool,
    /// Static duration estimate.
    pub estimated_minutes: u32,
    /// Context forwarded to the primary agent.
    pub context: RoutingContext,
}

impl WorkflowPlan {
    /// Builds the plan and its steps.
    #[must_use]
    pub fn new(parts: PlanParts) -> Self {
        let steps = std::iter::once(WorkflowStep::primary(parts.primary_agent.clone()))
            .chain(
                (2_u32..)
                    .zip(&parts.supporting_agents)
                    .map(|(index, agent)| WorkflowStep::supporting(index, agent.clone())),
            )
            .collect();
        Self {
            workflow_id: parts.workflow_id,
            primary_agent: parts.primary_agent,
            supporting_agents: parts.supporting_agents,
            steps,
            confidence: parts.confidence,
            fallback: parts.fallback,
            estimated_minutes: parts.estimated_minutes,
            context: parts.context,
        }
    }

    /// Returns the workflow identifier.
    #[must_use]
    pub const fn workflow_id(&self) -> WorkflowId {
        self.workflow_id
    }

    /// Returns the primary agent.
    #[must_use]
    pub const fn primary_agent(&self) -> &AgentName {
        &self.primary_agent
    }

    /// Returns the supporting agents in step order.
    #[must_use]
    pub fn supporting_agents(&self) -> &[AgentName] {
        &self.supporting_agents
    }

    /// Returns the steps in order.
    #[must_use]
    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    pub(crate) fn steps_mut(&mut self) -> &mut [WorkflowStep] {
        &mut self.steps
    }

    /// Returns the primary agent's score.
    #[must_use]
    pub const fn confidence(&self) -> Confidence {
        self.confidence
    }

    /// Returns whether the fallback agent was selected.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Returns the static duration estimate in minutes.
    #[must_use]
    pub const fn estimated_minutes(&self) -> u32 {
        self.estimated_minutes
    }

    /// Returns the routing context.
    #[must_use]
    pub const fn context(&self) -> &RoutingContext {
        &self.context
    }
}
