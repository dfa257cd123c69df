//! Entry point combining routing, execution and the agent directory.

use super::engine::{EngineError, WorkflowEngine};
use super::router::{RoutingError, WorkflowRouter};
use crate::registry::{
    domain::AgentRecord,
    ports::{AgentFilter, AgentRegistryRepository, HealthProbe},
    services::{HealthMonitor, RegistrySummary, ServiceRegistryError},
};
use crate::workflow::{
    domain::{CallerIdentity, WorkflowInstance},
    ports::{WorkflowDispatcher, WorkflowStore},
};
use mockable::Clock;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors returned by [`WorkflowCoordinator`].
#[derive(Debug, Clone, Error)]
pub enum CoordinatorError {
    /// The request could not be routed.
    #[error(transparent)]
    Routing(#[from] RoutingError),
    /// The workflow could not be stored or read back.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// The registry could not be read.
    #[error(transparent)]
    Registry(#[from] ServiceRegistryError),
}

/// One registered agent with its current health.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryEntry {
    /// The registry record.
    pub record: AgentRecord,
    /// Whether the agent is live and passed its most recent probe.
    pub healthy: bool,
}

/// Mesh-wide counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeshMetrics {
    /// Registry counts.
    pub agents: RegistrySummary,
    /// Workflows currently executing.
    pub active_workflows: usize,
}

/// Routes requests into workflows and reports on the mesh.
pub struct WorkflowCoordinator<R, P, S, D, C>
where
    R: AgentRegistryRepository,
    P: HealthProbe,
    S: WorkflowStore,
    D: WorkflowDispatcher,
    C: Clock + Send + Sync,
{
    router: WorkflowRouter,
    engine: WorkflowEngine<S, D, C>,
    monitor: HealthMonitor<R, P, C>,
}

impl<R, P, S, D, C> WorkflowCoordinator<R, P, S, D, C>
where
    R: AgentRegistryRepository,
    P: HealthProbe,
    S: WorkflowStore,
    D: WorkflowDispatcher,
    C: Clock + Send + Sync,
{
    /// Creates a coordinator.
    #[must_use]
    pub const fn new(
        router: WorkflowRouter,
        engine: WorkflowEngine<S, D, C>,
        monitor: HealthMonitor<R, P, C>,
    ) -> Self {
        Self {
            router,
            engine,
            monitor,
        }
    }

    /// Returns the router.
    #[must_use]
    pub const fn router(&self) -> &WorkflowRouter {
        &self.router
    }

    /// Returns the execution engine.
    #[must_use]
    pub const fn engine(&self) -> &WorkflowEngine<S, D, C> {
        &self.engine
    }

    /// Routes `intent_text` and executes the resulting plan.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Routing`] for a malformed context or
    /// [`CoordinatorError::Engine`] when the workflow cannot be stored. A
    /// failed hand-off yields an instance in `error` state instead.
    pub async fn route_and_execute(
        &self,
        intent_text: &str,
        context: Value,
        requesting_user: CallerIdentity,
    ) -> Result<WorkflowInstance, CoordinatorError> {
        let plan = self.router.route(intent_text, context)?;
        Ok(self.engine.execute(plan, requesting_user).await?)
    }

    /// Lists every registered agent with its health.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Registry`] when the registry cannot be
    /// read.
    pub async fn directory(&self) -> Result<Vec<DirectoryEntry>, CoordinatorError> {
        let mut records = self.monitor.registry().list(&AgentFilter::All).await?;
        records.sort_by(|lhs, rhs| lhs.name().cmp(rhs.name()));
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let healthy = self.monitor.is_record_healthy(&record).await;
            entries.push(DirectoryEntry { record, healthy });
        }
        Ok(entries)
    }

    /// Returns registry counts and the active workflow count.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError`] when the registry or the workflow store
    /// cannot be read.
    pub async fn metrics(&self) -> Result<MeshMetrics, CoordinatorError> {
        Ok(MeshMetrics {
            agents: self.monitor.registry().summary().await?,
            active_workflows: self.engine.active_count().await?,
        })
    }
}
