//! Workflow execution state machine.
//!
//! [`WorkflowEngine`] owns every in-flight [`WorkflowInstance`]. All
//! transitions of one workflow are serialised through a per-id lock; the
//! lock is released while the first step is in flight so an agent may
//! report back before its delivery call returns.

use crate::keyed_lock::KeyedLocks;
use crate::workflow::{
    domain::{
        CallerIdentity, WorkflowDomainError, WorkflowId, WorkflowInstance, WorkflowPlan,
        WorkflowStatus,
    },
    ports::{DispatchRequest, WorkflowDispatcher, WorkflowMirror, WorkflowStore, WorkflowStoreError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Errors returned by [`WorkflowEngine`].
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// No workflow with the identifier is known.
    #[error("workflow not found: {0}")]
    NotFound(WorkflowId),

    /// A state transition was rejected.
    #[error(transparent)]
    Domain(#[from] WorkflowDomainError),

    /// The workflow store failed.
    #[error(transparent)]
    Store(#[from] WorkflowStoreError),
}

/// Result of an asynchronous completion or error callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The callback moved the workflow to a terminal state.
    Applied,
    /// The workflow is unknown or already terminal; nothing changed.
    Ignored,
}

/// Drives workflow instances through their state machine.
pub struct WorkflowEngine<S, D, C>
where
    S: WorkflowStore,
    D: WorkflowDispatcher,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    dispatcher: Arc<D>,
    clock: Arc<C>,
    locks: Arc<KeyedLocks<WorkflowId>>,
    mirror: Option<Arc<dyn WorkflowMirror>>,
}

impl<S, D, C> Clone for WorkflowEngine<S, D, C>
where
    S: WorkflowStore,
    D: WorkflowDispatcher,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            dispatcher: Arc::clone(&self.dispatcher),
            clock: Arc::clone(&self.clock),
            locks: Arc::clone(&self.locks),
            mirror: self.mirror.clone(),
        }
    }
}

impl<S, D, C> WorkflowEngine<S, D, C>
where
    S: WorkflowStore,
    D: WorkflowDispatcher,
    C: Clock + Send + Sync,
{
    /// Creates an engine without an audit mirror.
    #[must_use]
    pub fn new(store: Arc<S>, dispatcher: Arc<D>, clock: Arc<C>) -> Self {
        Self {
            store,
            dispatcher,
            clock,
            locks: Arc::new(KeyedLocks::new()),
            mirror: None,
        }
    }

    /// Mirrors every state change to `mirror`.
    #[must_use]
    pub fn with_mirror(mut self, mirror: Arc<dyn WorkflowMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Stores `plan` as a new instance, marks it executing and hands the
    /// first step to the primary agent.
    ///
    /// A failed hand-off is not an `Err`: the returned instance is in
    /// `error` state with the cause recorded.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] when the store fails or already holds
    /// the workflow id. A workflow that could not be marked executing is
    /// removed again, so it is never left `created`.
    pub async fn execute(
        &self,
        plan: WorkflowPlan,
        requesting_user: CallerIdentity,
    ) -> Result<WorkflowInstance, EngineError> {
        let id = plan.workflow_id();
        let request = DispatchRequest {
            workflow_id: id,
            primary_agent: plan.primary_agent().clone(),
            requesting_user: requesting_user.clone(),
            context: plan.context().clone(),
        };

        {
            let _guard = self.locks.lock(&id).await;
            let created = WorkflowInstance::create(plan, requesting_user, &*self.clock);
            self.store.insert(&created).await?;
            let mut instance = created.clone();
            if let Err(err) = self.begin(&mut instance).await {
                self.discard(id, &err).await;
                return Err(err);
            }
            self.mirror(&created).await;
            self.mirror(&instance).await;
        }

        match self.dispatcher.dispatch(&request).await {
            Ok(_) => {
                info!(workflow_id = %id, agent = %request.primary_agent, "workflow started");
                self.get_status(id).await
            }
            Err(err) => {
                error!(
                    workflow_id = %id,
                    agent = %request.primary_agent,
                    error = %err,
                    "workflow dispatch failed"
                );
                self.terminate(id, Termination::Failed(err.to_string()))
                    .await?;
                self.get_status(id).await
            }
        }
    }

    /// Returns the current state of `id`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] for an unknown id or
    /// [`EngineError::Store`] when the store fails.
    pub async fn get_status(&self, id: WorkflowId) -> Result<WorkflowInstance, EngineError> {
        self.store
            .find(id)
            .await?
            .ok_or(EngineError::NotFound(id))
    }

    /// Applies a completion reported by an agent.
    ///
    /// Unknown and already terminal workflows are logged and ignored.
    pub async fn on_complete(&self, id: WorkflowId) -> CallbackOutcome {
        self.callback(id, Termination::Completed).await
    }

    /// Applies a failure reported by an agent.
    ///
    /// Unknown and already terminal workflows are logged and ignored.
    pub async fn on_error(&self, id: WorkflowId, error: impl Into<String>) -> CallbackOutcome {
        self.callback(id, Termination::Failed(error.into())).await
    }

    /// Returns the number of workflows currently executing.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] when the store fails.
    pub async fn active_count(&self) -> Result<usize, EngineError> {
        Ok(self.store.count_by_status(WorkflowStatus::Executing).await?)
    }

    async fn begin(&self, instance: &mut WorkflowInstance) -> Result<(), EngineError> {
        instance.start(&*self.clock)?;
        self.store.update(instance).await?;
        Ok(())
    }

    async fn discard(&self, id: WorkflowId, cause: &EngineError) {
        match self.store.remove(id).await {
            Ok(_) => warn!(workflow_id = %id, error = %cause, "workflow discarded before dispatch"),
            Err(err) => error!(
                workflow_id = %id,
                error = %err,
                cause = %cause,
                "failed to discard workflow that could not start"
            ),
        }
    }

    async fn callback(&self, id: WorkflowId, termination: Termination) -> CallbackOutcome {
        match self.terminate(id, termination).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(workflow_id = %id, error = %err, "discarding workflow callback");
                CallbackOutcome::Ignored
            }
        }
    }

    async fn terminate(
        &self,
        id: WorkflowId,
        termination: Termination,
    ) -> Result<CallbackOutcome, EngineError> {
        let _guard = self.locks.lock(&id).await;
        let Some(mut instance) = self.store.find(id).await? else {
            warn!(workflow_id = %id, "callback for unknown workflow discarded");
            return Ok(CallbackOutcome::Ignored);
        };
        if instance.status().is_terminal() {
            warn!(
                workflow_id = %id,
                status = %instance.status(),
                "callback for finished workflow discarded"
            );
            return Ok(CallbackOutcome::Ignored);
        }

        match termination {
            Termination::Completed => instance.complete(&*self.clock)?,
            Termination::Failed(reason) => instance.fail(reason, &*self.clock)?,
        }
        self.store.update(&instance).await?;
        self.mirror(&instance).await;
        info!(workflow_id = %id, status = %instance.status(), "workflow finished");
        Ok(CallbackOutcome::Applied)
    }

    async fn mirror(&self, instance: &WorkflowInstance) {
        let Some(mirror) = &self.mirror else {
            return;
        };
        if let Err(err) = mirror.record(instance).await {
            warn!(workflow_id = %instance.id(), error = %err, "workflow mirror failed");
        }
    }
}

enum Termination {
    Completed,
    Failed(String),
}
