//! In-memory workflow adapters.

mod mirror;
mod workflow_store;

pub use mirror::InMemoryWorkflowMirror;
pub use workflow_store::InMemoryWorkflowStore;
