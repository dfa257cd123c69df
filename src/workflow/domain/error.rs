//! Error types for workflow domain validation and parsing.

use super::{StepStatus, WorkflowId, WorkflowStatus};
use crate::registry::domain::RegistryDomainError;
use thiserror::Error;

/// Errors returned while transitioning workflow instances and steps.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowDomainError {
    /// The workflow state machine does not allow the transition.
    #[error("workflow {id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Workflow identifier.
        id: WorkflowId,
        /// Current status.
        from: WorkflowStatus,
        /// Requested status.
        to: WorkflowStatus,
    },

    /// A step status would move backwards.
    #[error("step {step_index} cannot move from {from} to {to}")]
    StepRegression {
        /// One-based step position.
        step_index: u32,
        /// Current step status.
        from: StepStatus,
        /// Requested step status.
        to: StepStatus,
    },
}

/// Errors returned while assembling a routing policy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoutingPolicyError {
    /// An agent name in the policy is malformed.
    #[error(transparent)]
    InvalidAgent(#[from] RegistryDomainError),

    /// A profile declares no usable keywords.
    #[error("profile for {0} has no keywords")]
    EmptyProfile(String),

    /// Two profiles name the same agent.
    #[error("duplicate profile for {0}")]
    DuplicateProfile(String),

    /// A confidence value is outside `0..=100` percent.
    #[error("confidence must be between 0 and 100 percent, got {0}")]
    ConfidenceOutOfRange(u32),
}

/// Errors returned when a routing context violates its schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoutingContextError {
    /// The context is not a JSON object.
    #[error("routing context must be an object, got {0}")]
    NotAnObject(&'static str),

    /// A reserved key has the wrong JSON type.
    #[error("routing context field '{field}' must be a {expected}")]
    WrongType {
        /// Offending key.
        field: &'static str,
        /// Expected JSON type.
        expected: &'static str,
    },

    /// The preferred language is not a language tag.
    #[error("invalid preferred language: {0}")]
    InvalidLanguage(String),

    /// The priority is not a known message priority.
    #[error("invalid priority: {0}")]
    InvalidPriority(String),
}

/// Error returned while parsing a workflow status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown workflow status: {0}")]
pub struct ParseWorkflowStatusError(pub String);

/// Error returned while parsing a step status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown step status: {0}")]
pub struct ParseStepStatusError(pub String);
