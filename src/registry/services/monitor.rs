//! Cached liveness checks over registered agents.

use super::registry::{ServiceRegistry, ServiceRegistryError, ServiceRegistryResult};
use crate::keyed_lock::KeyedLocks;
use crate::registry::{
    domain::{AgentName, AgentRecord, HealthReport, HealthState, HealthVerdict},
    ports::{AgentRegistryRepository, HealthProbe, ProbeOutcome},
};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound on a single liveness probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Answers "is this agent healthy?" from heartbeat freshness and probes.
///
/// A record that is not `online`, or whose heartbeat is older than the
/// registry TTL, is unhealthy without probing. Otherwise the most recent
/// probe verdict is reused until it is `registry_ttl` old, whatever its
/// outcome, so a degraded peer sees at most one probe per window.
pub struct HealthMonitor<R, P, C>
where
    R: AgentRegistryRepository,
    P: HealthProbe,
    C: Clock + Send + Sync,
{
    registry: ServiceRegistry<R, C>,
    probe: Arc<P>,
    cache: Arc<RwLock<HashMap<AgentName, HealthVerdict>>>,
    locks: Arc<KeyedLocks<AgentName>>,
    probe_timeout: Duration,
}

impl<R, P, C> Clone for HealthMonitor<R, P, C>
where
    R: AgentRegistryRepository,
    P: HealthProbe,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            probe: Arc::clone(&self.probe),
            cache: Arc::clone(&self.cache),
            locks: Arc::clone(&self.locks),
            probe_timeout: self.probe_timeout,
        }
    }
}

impl<R, P, C> HealthMonitor<R, P, C>
where
    R: AgentRegistryRepository,
    P: HealthProbe,
    C: Clock + Send + Sync,
{
    /// Creates a monitor over `registry` using `probe`.
    #[must_use]
    pub fn new(registry: ServiceRegistry<R, C>, probe: Arc<P>) -> Self {
        Self {
            registry,
            probe,
            cache: Arc::new(RwLock::new(HashMap::new())),
            locks: Arc::new(KeyedLocks::new()),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Overrides the per-probe timeout.
    #[must_use]
    pub const fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    /// Returns the registry this monitor reads from.
    #[must_use]
    pub const fn registry(&self) -> &ServiceRegistry<R, C> {
        &self.registry
    }

    /// Returns whether `name` is currently healthy.
    ///
    /// Never fails: unknown agents, malformed names, registry faults and
    /// probe failures all yield `false`.
    pub async fn is_healthy(&self, name: &str) -> bool {
        let Ok(agent_name) = AgentName::new(name) else {
            return false;
        };
        match self.registry.get_by_name(&agent_name).await {
            Ok(record) => self.is_record_healthy(&record).await,
            Err(ServiceRegistryError::NotFound(_)) => false,
            Err(err) => {
                warn!(agent = %agent_name, error = %err, "registry lookup failed during health check");
                false
            }
        }
    }

    /// Returns whether an already-loaded record is currently healthy.
    pub async fn is_record_healthy(&self, record: &AgentRecord) -> bool {
        if !self.registry.is_live(record) {
            debug!(
                agent = %record.name(),
                status = %record.status(),
                "agent not live; skipping probe"
            );
            return false;
        }
        let Some(url) = record.health_check_url() else {
            debug!(agent = %record.name(), "agent has no health endpoint");
            return false;
        };

        let _guard = self.locks.lock(record.name()).await;
        let now = self.registry.clock().utc();
        if let Some(verdict) = self.cached(record.name())
            && !verdict.is_expired(now)
        {
            return verdict.healthy();
        }

        let outcome = self.run_probe(&url).await;
        self.store(record.name(), outcome.is_healthy());
        outcome.is_healthy()
    }

    /// Probes `name` immediately, bypassing and then refreshing the cache.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceRegistryError::NotFound`] when the agent is not
    /// registered, or another [`ServiceRegistryError`] when the lookup fails.
    pub async fn check(&self, name: &str) -> ServiceRegistryResult<HealthReport> {
        let record = self.registry.get(name).await?;
        let agent_name = record.name().clone();

        let Some(url) = record.health_check_url() else {
            let checked_at = self.registry.clock().utc();
            return Ok(HealthReport::new(agent_name, HealthState::Unknown, checked_at)
                .with_error("no health check URL configured"));
        };

        let _guard = self.locks.lock(&agent_name).await;
        let outcome = self.run_probe(&url).await;
        self.store(&agent_name, outcome.is_healthy());

        let checked_at = self.registry.clock().utc();
        let report = match outcome {
            ProbeOutcome::Healthy { elapsed, details } => {
                let report = HealthReport::new(agent_name, HealthState::Healthy, checked_at)
                    .with_response_time(elapsed);
                match details {
                    Some(details) => report.with_details(details),
                    None => report,
                }
            }
            ProbeOutcome::Unhealthy { elapsed, reason } => {
                HealthReport::new(agent_name, HealthState::Unhealthy, checked_at)
                    .with_response_time(elapsed)
                    .with_error(reason)
            }
        };
        Ok(report)
    }

    /// Returns the cached verdict for `name`, expired or not.
    #[must_use]
    pub fn cached(&self, name: &AgentName) -> Option<HealthVerdict> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Drops the cached verdict for `name`.
    pub fn invalidate(&self, name: &AgentName) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }

    async fn run_probe(&self, url: &str) -> ProbeOutcome {
        let probe = self.probe.probe(url, self.probe_timeout);
        let outcome = tokio::time::timeout(self.probe_timeout, probe)
            .await
            .unwrap_or_else(|_| {
                ProbeOutcome::unhealthy(self.probe_timeout, "health probe timed out")
            });
        debug!(%url, healthy = outcome.is_healthy(), "health probe completed");
        outcome
    }

    fn store(&self, name: &AgentName, healthy: bool) {
        let verdict = HealthVerdict::new(
            name.clone(),
            healthy,
            self.registry.clock().utc(),
            self.registry.registry_ttl(),
        );
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone(), verdict);
    }
}
