//! Workflow orchestration services.

mod callbacks;
mod coordinator;
mod engine;
mod router;

pub use callbacks::{
    AGENT_REGISTRATION_MESSAGE_TYPE, WORKFLOW_COMPLETE_MESSAGE_TYPE, WORKFLOW_ERROR_MESSAGE_TYPE,
    WorkflowCallbackHandler,
};
pub use coordinator::{CoordinatorError, DirectoryEntry, MeshMetrics, WorkflowCoordinator};
pub use engine::{CallbackOutcome, EngineError, WorkflowEngine};
pub use router::{RoutingError, WorkflowRouter};
