//! Service layer for agent registration and discovery.
//!
//! Provides [`ServiceRegistry`], an in-process view over the registry store
//! that serialises writes per agent name.

use crate::keyed_lock::KeyedLocks;
use crate::registry::{
    domain::{AgentMetadata, AgentName, AgentRecord, AgentStatus, RegistryDomainError},
    ports::{AgentFilter, AgentRegistryRepository, RegistryError},
};
use mockable::Clock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Heartbeat age after which an `online` record is considered stale.
pub const DEFAULT_REGISTRY_TTL: Duration = Duration::from_secs(60);

/// Service-level errors for registry operations.
#[derive(Debug, Clone, Error)]
pub enum ServiceRegistryError {
    /// Name or metadata validation failed.
    #[error(transparent)]
    Domain(#[from] RegistryDomainError),
    /// No agent is registered under the name.
    #[error("agent not found: {0}")]
    NotFound(AgentName),
    /// Repository operation failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Result type for registry service operations.
pub type ServiceRegistryResult<T> = Result<T, ServiceRegistryError>;

/// Point-in-time counts over every registered agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrySummary {
    /// Number of records in the registry.
    pub total: usize,
    /// Number of records per persisted status.
    pub by_status: BTreeMap<AgentStatus, usize>,
    /// Records persisted as `online` whose heartbeat has expired.
    pub stale_online: usize,
}

impl RegistrySummary {
    /// Returns the count for `status`, zero when absent.
    #[must_use]
    pub fn count(&self, status: AgentStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

/// Agent registration and discovery orchestration service.
pub struct ServiceRegistry<R, C>
where
    R: AgentRegistryRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    locks: Arc<KeyedLocks<AgentName>>,
    registry_ttl: Duration,
}

impl<R, C> Clone for ServiceRegistry<R, C>
where
    R: AgentRegistryRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
            locks: Arc::clone(&self.locks),
            registry_ttl: self.registry_ttl,
        }
    }
}

impl<R, C> ServiceRegistry<R, C>
where
    R: AgentRegistryRepository,
    C: Clock + Send + Sync,
{
    /// Creates a registry service with the default TTL.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            repository,
            clock,
            locks: Arc::new(KeyedLocks::new()),
            registry_ttl: DEFAULT_REGISTRY_TTL,
        }
    }

    /// Overrides the heartbeat staleness window.
    #[must_use]
    pub const fn with_registry_ttl(mut self, registry_ttl: Duration) -> Self {
        self.registry_ttl = registry_ttl;
        self
    }

    /// Returns the heartbeat staleness window.
    #[must_use]
    pub const fn registry_ttl(&self) -> Duration {
        self.registry_ttl
    }

    /// Returns the clock used for timestamps.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Registers an agent, or merges `metadata` into its existing record.
    ///
    /// Either way the record comes back `online` with a fresh heartbeat.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceRegistryError::Domain`] when the name or metadata is
    /// invalid, or [`ServiceRegistryError::Registry`] when persistence fails.
    pub async fn register(
        &self,
        name: &str,
        metadata: AgentMetadata,
    ) -> ServiceRegistryResult<AgentRecord> {
        let agent_name = AgentName::new(name)?;
        let _guard = self.locks.lock(&agent_name).await;

        let record = match self.repository.find_by_name(&agent_name).await? {
            Some(mut existing) => {
                existing.merge(metadata, &*self.clock)?;
                self.repository.update(&existing).await?;
                debug!(agent = %agent_name, "agent re-registered");
                existing
            }
            None => {
                let created = AgentRecord::register(agent_name.clone(), metadata, &*self.clock)?;
                self.repository.insert(&created).await?;
                info!(agent = %agent_name, agent_type = created.agent_type(), "agent registered");
                created
            }
        };
        Ok(record)
    }

    /// Refreshes an agent's heartbeat and forces `online` status.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceRegistryError::NotFound`] when the agent was never
    /// registered, or [`ServiceRegistryError::Registry`] when persistence
    /// fails.
    pub async fn heartbeat(&self, name: &str) -> ServiceRegistryResult<AgentRecord> {
        self.modify(name, |record, clock| record.heartbeat(clock))
            .await
    }

    /// Marks an agent `offline` without deleting its record.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceRegistryError::NotFound`] when the agent was never
    /// registered, or [`ServiceRegistryError::Registry`] when persistence
    /// fails.
    pub async fn deregister(&self, name: &str) -> ServiceRegistryResult<AgentRecord> {
        let record = self.mark_status(name, AgentStatus::Offline).await?;
        info!(agent = %record.name(), "agent deregistered");
        Ok(record)
    }

    /// Sets an agent's persisted status, leaving its heartbeat untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceRegistryError::NotFound`] when the agent was never
    /// registered, or [`ServiceRegistryError::Registry`] when persistence
    /// fails.
    pub async fn mark_status(
        &self,
        name: &str,
        status: AgentStatus,
    ) -> ServiceRegistryResult<AgentRecord> {
        self.modify(name, |record, clock| record.set_status(status, clock))
            .await
    }

    /// Returns the record for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceRegistryError::NotFound`] when no agent has the
    /// name, [`ServiceRegistryError::Domain`] when the name is malformed, or
    /// [`ServiceRegistryError::Registry`] when persistence fails.
    pub async fn get(&self, name: &str) -> ServiceRegistryResult<AgentRecord> {
        let agent_name = AgentName::new(name)?;
        self.get_by_name(&agent_name).await
    }

    /// Returns the record for an already-validated name.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceRegistryError::NotFound`] when no agent has the
    /// name, or [`ServiceRegistryError::Registry`] when persistence fails.
    pub async fn get_by_name(&self, name: &AgentName) -> ServiceRegistryResult<AgentRecord> {
        self.repository
            .find_by_name(name)
            .await?
            .ok_or_else(|| ServiceRegistryError::NotFound(name.clone()))
    }

    /// Returns every record matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceRegistryError::Registry`] when persistence fails.
    pub async fn list(&self, filter: &AgentFilter) -> ServiceRegistryResult<Vec<AgentRecord>> {
        Ok(self.repository.list(filter).await?)
    }

    /// Returns whether `record` is `online` with a heartbeat inside the TTL.
    #[must_use]
    pub fn is_live(&self, record: &AgentRecord) -> bool {
        record.is_live(self.clock.utc(), self.registry_ttl)
    }

    /// Counts records by status and stale heartbeat.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceRegistryError::Registry`] when persistence fails.
    pub async fn summary(&self) -> ServiceRegistryResult<RegistrySummary> {
        let records = self.repository.list(&AgentFilter::All).await?;
        let now = self.clock.utc();
        let mut summary = RegistrySummary {
            total: records.len(),
            ..RegistrySummary::default()
        };
        for record in &records {
            *summary.by_status.entry(record.status()).or_default() += 1;
            if record.status() == AgentStatus::Online && record.is_stale(now, self.registry_ttl) {
                summary.stale_online += 1;
            }
        }
        Ok(summary)
    }

    async fn modify<F>(&self, name: &str, apply: F) -> ServiceRegistryResult<AgentRecord>
    where
        F: FnOnce(&mut AgentRecord, &C) + Send,
    {
        let agent_name = AgentName::new(name)?;
        let _guard = self.locks.lock(&agent_name).await;

        let mut record = self.get_by_name(&agent_name).await?;
        apply(&mut record, &self.clock);
        self.repository.update(&record).await?;
        Ok(record)
    }
}
