//! Workflow instance aggregate and its state machine.

use super::{
    CallerIdentity, ParseWorkflowStatusError, StepStatus, WorkflowDomainError, WorkflowId,
    WorkflowPlan, WorkflowStep,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a workflow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Stored but not yet dispatched.
    Created,
    /// Dispatched to the primary agent.
    Executing,
    /// Completed by the primary agent.
    Completed,
    /// Failed during dispatch or reported failed by an agent.
    Error,
}

impl WorkflowStatus {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    /// Returns whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// Returns whether the state machine allows `self -> next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Executing)
                | (Self::Executing, Self::Completed | Self::Error)
        )
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for WorkflowStatus {
    type Error = ParseWorkflowStatusError;

    fn try_from(value: &str) -> Result<Self, ParseWorkflowStatusError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "created" => Ok(Self::Created),
            "executing" => Ok(Self::Executing),
            "completed" => Ok(Self::Completed),
            "error" => Ok(Self::Error),
            _ => Err(ParseWorkflowStatusError(value.to_owned())),
        }
    }
}

/// One routed unit of work being driven to a terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInstance {
    plan: WorkflowPlan,
    status: WorkflowStatus,
    requesting_user: CallerIdentity,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    error: Option<String>,
}

impl WorkflowInstance {
    /// Creates a `created` instance for `plan`.
    #[must_use]
    pub fn create(plan: WorkflowPlan, requesting_user: CallerIdentity, clock: &impl Clock) -> Self {
        Self {
            plan,
            status: WorkflowStatus::Created,
            requesting_user,
            created_at: clock.utc(),
            started_at: None,
            completed_at: None,
            error: None,
        }
    }

    /// Marks the instance dispatched; the primary step starts waiting on
    /// its agent.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::InvalidTransition`] unless the
    /// instance is `created`.
    pub fn start(&mut self, clock: &impl Clock) -> Result<(), WorkflowDomainError> {
        self.ensure_transition(WorkflowStatus::Executing)?;
        if let Some(primary) = self.plan.steps_mut().first_mut() {
            primary.advance(StepStatus::Waiting)?;
        }
        self.status = WorkflowStatus::Executing;
        self.started_at = Some(clock.utc());
        Ok(())
    }

    /// Completes the instance; every unfinished step is marked done.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::InvalidTransition`] unless the
    /// instance is `executing`.
    pub fn complete(&mut self, clock: &impl Clock) -> Result<(), WorkflowDomainError> {
        self.ensure_transition(WorkflowStatus::Completed)?;
        for step in self.plan.steps_mut() {
            if !step.status().is_terminal() {
                step.advance(StepStatus::Done)?;
            }
        }
        self.status = WorkflowStatus::Completed;
        self.completed_at = Some(clock.utc());
        Ok(())
    }

    /// Fails the instance; the primary step is marked failed and supporting
    /// steps are left as they were.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::InvalidTransition`] unless the
    /// instance is `executing`.
    pub fn fail(
        &mut self,
        error: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), WorkflowDomainError> {
        self.ensure_transition(WorkflowStatus::Error)?;
        if let Some(primary) = self.plan.steps_mut().first_mut()
            && !primary.status().is_terminal()
        {
            primary.advance(StepStatus::Error)?;
        }
        self.status = WorkflowStatus::Error;
        self.completed_at = Some(clock.utc());
        self.error = Some(error.into());
        Ok(())
    }

    const fn ensure_transition(&self, next: WorkflowStatus) -> Result<(), WorkflowDomainError> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(WorkflowDomainError::InvalidTransition {
                id: self.plan.workflow_id(),
                from: self.status,
                to: next,
            })
        }
    }

    /// Returns the workflow identifier.
    #[must_use]
    pub const fn id(&self) -> WorkflowId {
        self.plan.workflow_id()
    }

    /// Returns the plan being executed.
    #[must_use]
    pub const fn plan(&self) -> &WorkflowPlan {
        &self.plan
    }

    /// Returns the steps with their current status.
    #[must_use]
    pub fn steps(&self) -> &[WorkflowStep] {
        self.plan.steps()
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> WorkflowStatus {
        self.status
    }

    /// Returns the user who requested the work.
    #[must_use]
    pub const fn requesting_user(&self) -> &CallerIdentity {
        &self.requesting_user
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the instance was dispatched.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns when the instance reached a terminal state.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the recorded failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
