//! In-memory audit trail of workflow transitions.

use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock};

use crate::workflow::{
    domain::{WorkflowId, WorkflowInstance, WorkflowStatus},
    ports::{MirrorError, WorkflowMirror},
};

/// Appends every recorded snapshot to a list.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkflowMirror {
    snapshots: Arc<RwLock<Vec<WorkflowInstance>>>,
}

impl InMemoryWorkflowMirror {
    /// Creates an empty mirror.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded statuses of `id`, oldest first.
    #[must_use]
    pub fn history(&self, id: WorkflowId) -> Vec<WorkflowStatus> {
        self.snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|snapshot| snapshot.id() == id)
            .map(WorkflowInstance::status)
            .collect()
    }
}

#[async_trait]
impl WorkflowMirror for InMemoryWorkflowMirror {
    async fn record(&self, instance: &WorkflowInstance) -> Result<(), MirrorError> {
        self.snapshots
            .write()
            .map_err(|err| MirrorError(Arc::new(std::io::Error::other(err.to_string()))))?
            .push(instance.clone());
        Ok(())
    }
}
