//! Optional audit mirror of workflow transitions.

use crate::workflow::domain::WorkflowInstance;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Failure to record a transition in the mirror.
#[derive(Debug, Clone, Error)]
#[error("workflow mirror failed: {0}")]
pub struct MirrorError(pub Arc<dyn std::error::Error + Send + Sync>);

/// Receives a snapshot after every workflow state change.
///
/// The mirror is write-only from the engine's point of view: routing and
/// callbacks never read it, and its failures are logged, not propagated.
#[async_trait]
pub trait WorkflowMirror: Send + Sync {
    /// Records the current state of `instance`.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError`] when the snapshot cannot be stored.
    async fn record(&self, instance: &WorkflowInstance) -> Result<(), MirrorError>;
}
