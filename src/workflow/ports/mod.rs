//! Port contracts for workflow storage, dispatch and auditing.

pub mod dispatcher;
pub mod mirror;
pub mod store;

pub use dispatcher::{DispatchError, DispatchRequest, WorkflowDispatcher};
pub use mirror::{MirrorError, WorkflowMirror};
pub use store::{WorkflowStore, WorkflowStoreError, WorkflowStoreResult};
