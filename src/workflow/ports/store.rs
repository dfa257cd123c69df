//! Process-local store for workflow instances.

use crate::workflow::domain::{WorkflowId, WorkflowInstance, WorkflowStatus};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for workflow store operations.
pub type WorkflowStoreResult<T> = Result<T, WorkflowStoreError>;

/// Storage contract for in-flight workflow instances.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Stores a new instance.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowStoreError::DuplicateWorkflow`] when the identifier
    /// is already stored.
    async fn insert(&self, instance: &WorkflowInstance) -> WorkflowStoreResult<()>;

    /// Replaces a stored instance.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowStoreError::NotFound`] when the instance does not
    /// exist.
    async fn update(&self, instance: &WorkflowInstance) -> WorkflowStoreResult<()>;

    /// Removes an instance, returning whether one was stored.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowStoreError::Persistence`] when storage fails.
    async fn remove(&self, id: WorkflowId) -> WorkflowStoreResult<bool>;

    /// Finds an instance by identifier.
    async fn find(&self, id: WorkflowId) -> WorkflowStoreResult<Option<WorkflowInstance>>;

    /// Counts instances in `status`.
    async fn count_by_status(&self, status: WorkflowStatus) -> WorkflowStoreResult<usize>;
}

/// Errors returned by workflow store implementations.
#[derive(Debug, Clone, Error)]
pub enum WorkflowStoreError {
    /// An instance with the same identifier already exists.
    #[error("duplicate workflow identifier: {0}")]
    DuplicateWorkflow(WorkflowId),

    /// The instance was not found.
    #[error("workflow not found: {0}")]
    NotFound(WorkflowId),

    /// Storage failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl WorkflowStoreError {
    /// Wraps a storage error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
