//! In-memory store for workflow instances.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::workflow::{
    domain::{WorkflowId, WorkflowInstance, WorkflowStatus},
    ports::{WorkflowStore, WorkflowStoreError, WorkflowStoreResult},
};

/// Thread-safe in-memory workflow store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkflowStore {
    state: Arc<RwLock<HashMap<WorkflowId, WorkflowInstance>>>,
}

impl InMemoryWorkflowStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn insert(&self, instance: &WorkflowInstance) -> WorkflowStoreResult<()> {
        let mut workflows = self.state.write().map_err(|err| {
            WorkflowStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;

        if workflows.contains_key(&instance.id()) {
            return Err(WorkflowStoreError::DuplicateWorkflow(instance.id()));
        }

        workflows.insert(instance.id(), instance.clone());
        Ok(())
    }

    async fn update(&self, instance: &WorkflowInstance) -> WorkflowStoreResult<()> {
        let mut workflows = self.state.write().map_err(|err| {
            WorkflowStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;

        let stored = workflows
            .get_mut(&instance.id())
            .ok_or(WorkflowStoreError::NotFound(instance.id()))?;
        *stored = instance.clone();
        Ok(())
    }

    async fn remove(&self, id: WorkflowId) -> WorkflowStoreResult<bool> {
        let mut workflows = self.state.write().map_err(|err| {
            WorkflowStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(workflows.remove(&id).is_some())
    }

    async fn find(&self, id: WorkflowId) -> WorkflowStoreResult<Option<WorkflowInstance>> {
        let workflows = self.state.read().map_err(|err| {
            WorkflowStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(workflows.get(&id).cloned())
    }

    async fn count_by_status(&self, status: WorkflowStatus) -> WorkflowStoreResult<usize> {
        let workflows = self.state.read().map_err(|err| {
            WorkflowStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(workflows
            .values()
            .filter(|instance| instance.status() == status)
            .count())
    }
}
