//! Plan steps and their forward-only status.

use super::{ParseStepStatusError, WorkflowDomainError};
use crate::registry::domain::AgentName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Progress of one plan step.
///
/// Statuses are ordered; a step may only move to a later status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Ready to be handed to its agent.
    Pending,
    /// Handed off, or queued behind an earlier step.
    Waiting,
    /// Finished successfully.
    Done,
    /// Finished with a failure.
    Error,
}

impl StepStatus {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Waiting => "waiting",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    /// Returns whether the step has finished.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    /// Returns whether a step may move from `self` to `next`.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        match self {
            Self::Pending => !matches!(next, Self::Pending),
            Self::Waiting => next.is_terminal(),
            Self::Done | Self::Error => false,
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for StepStatus {
    type Error = ParseStepStatusError;

    fn try_from(value: &str) -> Result<Self, ParseStepStatusError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "waiting" => Ok(Self::Waiting),
            "done" => Ok(Self::Done),
            "error" => Ok(Self::Error),
            _ => Err(ParseStepStatusError(value.to_owned())),
        }
    }
}

/// What an agent is asked to do in a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    /// Primary handling of the user's request.
    ProcessRequest,
    /// Assisting the primary agent.
    SupportProcessing,
}

impl StepAction {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProcessRequest => "process_request",
            Self::SupportProcessing => "support_processing",
        }
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a workflow plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    step_index: u32,
    agent: AgentName,
    action: StepAction,
    status: StepStatus,
}

impl WorkflowStep {
    /// Creates the primary step, `pending` at index 1.
    #[must_use]
    pub const fn primary(agent: AgentName) -> Self {
        Self {
            step_index: 1,
            agent,
            action: StepAction::ProcessRequest,
            status: StepStatus::Pending,
        }
    }

    /// Creates a `waiting` supporting step at `step_index`.
    #[must_use]
    pub const fn supporting(step_index: u32, agent: AgentName) -> Self {
        Self {
            step_index,
            agent,
            action: StepAction::SupportProcessing,
            status: StepStatus::Waiting,
        }
    }

    /// Moves the step forward to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::StepRegression`] when `next` is not
    /// later than the current status.
    pub const fn advance(&mut self, next: StepStatus) -> Result<(), WorkflowDomainError> {
        if !self.status.can_advance_to(next) {
            return Err(WorkflowDomainError::StepRegression {
                step_index: self.step_index,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Returns the one-based position in the plan.
    #[must_use]
    pub const fn step_index(&self) -> u32 {
        self.step_index
    }

    /// Returns the agent performing the step.
    #[must_use]
    pub const fn agent(&self) -> &AgentName {
        &self.agent
    }

    /// Returns the step action.
    #[must_use]
    pub const fn action(&self) -> StepAction {
        self.action
    }

    /// Returns the step status.
    #[must_use]
    pub const fn status(&self) -> StepStatus {
        self.status
    }
}
