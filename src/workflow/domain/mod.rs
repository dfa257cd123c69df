//! Domain model for workflow routing and execution.

mod confidence;
mod context;
mod error;
mod identity;
mod ids;
mod instance;
mod plan;
mod policy;
mod step;

pub use confidence::Confidence;
pub use context::{DEFAULT_LANGUAGE, RoutingContext};
pub use error::{
    ParseStepStatusError, ParseWorkflowStatusError, RoutingContextError, RoutingPolicyError,
    WorkflowDomainError,
};
pub use identity::CallerIdentity;
pub use ids::WorkflowId;
pub use instance::{WorkflowInstance, WorkflowStatus};
pub use plan::{PlanParts, WorkflowPlan};
pub use policy::{
    AgentProfile, DEFAULT_ESTIMATED_MINUTES, DEFAULT_FALLBACK_CONFIDENCE_PERCENT,
    DEFAULT_POLICY_VERSION, RouteSelection, RoutingPolicy,
};
pub use step::{StepAction, StepStatus, WorkflowStep};
