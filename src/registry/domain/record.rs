//! Agent registry record aggregate root.

use super::{AgentMetadata, AgentName, AgentStatus, RegistryDomainError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::time::Duration;

/// Category assigned when registration does not declare one.
pub const DEFAULT_AGENT_TYPE: &str = "custom";

/// Version assigned when registration does not declare one.
pub const DEFAULT_AGENT_VERSION: &str = "1.0.0";

/// Identity and operating state of one agent.
///
/// Records are never deleted: shutdown and faults are status transitions,
/// so the registry doubles as the history of each logical agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    name: AgentName,
    agent_type: String,
    status: AgentStatus,
    version: String,
    port: Option<u16>,
    description: Option<String>,
    base_url: Option<String>,
    health_check_url: Option<String>,
    capabilities: BTreeSet<String>,
    dependencies: Vec<AgentName>,
    attributes: Map<String, Value>,
    last_heartbeat: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted agent record.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedAgentData {
    /// Persisted agent name.
    pub name: AgentName,
    /// Persisted category tag.
    pub agent_type: String,
    /// Persisted operating status.
    pub status: AgentStatus,
    /// Persisted version string.
    pub version: String,
    /// Persisted port, if any.
    pub port: Option<u16>,
    /// Persisted description, if any.
    pub description: Option<String>,
    /// Persisted base URL, if any.
    pub base_url: Option<String>,
    /// Persisted liveness endpoint, if any.
    pub health_check_url: Option<String>,
    /// Persisted capability set.
    pub capabilities: BTreeSet<String>,
    /// Persisted dependency list.
    pub dependencies: Vec<AgentName>,
    /// Persisted attributes outside the known schema.
    pub attributes: Map<String, Value>,
    /// Persisted heartbeat timestamp.
    pub last_heartbeat: DateTime<Utc>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl AgentRecord {
    /// Creates a record for a first registration with `Online` status.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError`] when a dependency name in `metadata`
    /// is invalid or its type or version exceeds its storage limit.
    pub fn register(
        name: AgentName,
        metadata: AgentMetadata,
        clock: &impl Clock,
    ) -> Result<Self, RegistryDomainError> {
        let validated = metadata.validate()?;
        let timestamp = clock.utc();
        Ok(Self {
            name,
            agent_type: validated
                .agent_type
                .unwrap_or_else(|| DEFAULT_AGENT_TYPE.to_owned()),
            status: AgentStatus::Online,
            version: validated
                .version
                .unwrap_or_else(|| DEFAULT_AGENT_VERSION.to_owned()),
            port: validated.port,
            description: validated.description,
            base_url: validated.base_url,
            health_check_url: validated.health_check_url,
            capabilities: validated.capabilities.unwrap_or_default(),
            dependencies: validated.dependencies.unwrap_or_default(),
            attributes: validated.attributes,
            last_heartbeat: timestamp,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a record from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedAgentData) -> Self {
        Self {
            name: data.name,
            agent_type: data.agent_type,
            status: data.status,
            version: data.version,
            port: data.port,
            description: data.description,
            base_url: data.base_url,
            health_check_url: data.health_check_url,
            capabilities: data.capabilities,
            dependencies: data.dependencies,
            attributes: data.attributes,
            last_heartbeat: data.last_heartbeat,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Merges supplied metadata into a re-registering record.
    ///
    /// Fields present in `metadata` overwrite stored values, attributes are
    /// merged key by key, and the record comes back `Online` with a fresh
    /// heartbeat. Nothing is changed when validation fails.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError`] when a dependency name in `metadata`
    /// is invalid or its type or version exceeds its storage limit.
    pub fn merge(
        &mut self,
        metadata: AgentMetadata,
        clock: &impl Clock,
    ) -> Result<(), RegistryDomainError> {
        let validated = metadata.validate()?;
        if let Some(agent_type) = validated.agent_type {
            self.agent_type = agent_type;
        }
        if let Some(version) = validated.version {
            self.version = version;
        }
        if validated.port.is_some() {
            self.port = validated.port;
        }
        if validated.description.is_some() {
            self.description = validated.description;
        }
        if validated.base_url.is_some() {
            self.base_url = validated.base_url;
        }
        if validated.health_check_url.is_some() {
            self.health_check_url = validated.health_check_url;
        }
        if let Some(capabilities) = validated.capabilities {
            self.capabilities = capabilities;
        }
        if let Some(dependencies) = validated.dependencies {
            self.dependencies = dependencies;
        }
        self.attributes.extend(validated.attributes);
        self.heartbeat(clock);
        Ok(())
    }

    /// Refreshes the heartbeat and forces `Online` status.
    pub fn heartbeat(&mut self, clock: &impl Clock) {
        let timestamp = clock.utc();
        self.status = AgentStatus::Online;
        self.last_heartbeat = timestamp;
        self.updated_at = timestamp;
    }

    /// Transitions the persisted status without touching the heartbeat.
    pub fn set_status(&mut self, status: AgentStatus, clock: &impl Clock) {
        self.status = status;
        self.updated_at = clock.utc();
    }

    /// Returns whether the last heartbeat is older than `ttl` at `now`.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.last_heartbeat)
            .to_std()
            .is_ok_and(|age| age > ttl)
    }

    /// Returns whether the record is `Online` with a heartbeat inside `ttl`.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.status == AgentStatus::Online && !self.is_stale(now, ttl)
    }

    /// Returns the base URL peers use to reach this agent.
    ///
    /// Falls back to `http://localhost:{port}` when only a port is known.
    #[must_use]
    pub fn endpoint(&self) -> Option<String> {
        self.base_url.clone().or_else(|| {
            self.port
                .map(|port| format!("http://localhost:{port}"))
        })
    }

    /// Returns the liveness endpoint, derived from [`Self::endpoint`] when
    /// none was declared.
    #[must_use]
    pub fn health_check_url(&self) -> Option<String> {
        self.health_check_url
            .clone()
            .or_else(|| self.endpoint().map(|base| format!("{base}/health")))
    }

    /// Returns the declared liveness endpoint without derivation.
    #[must_use]
    pub fn declared_health_check_url(&self) -> Option<&str> {
        self.health_check_url.as_deref()
    }

    /// Returns the agent name.
    #[must_use]
    pub const fn name(&self) -> &AgentName {
        &self.name
    }

    /// Returns the category tag.
    #[must_use]
    pub fn agent_type(&self) -> &str {
        &self.agent_type
    }

    /// Returns the persisted status.
    #[must_use]
    pub const fn status(&self) -> AgentStatus {
        self.status
    }

    /// Returns the version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the listening port, if declared.
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        self.port
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the declared base URL without derivation.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Returns the capability set.
    #[must_use]
    pub const fn capabilities(&self) -> &BTreeSet<String> {
        &self.capabilities
    }

    /// Returns whether the agent declares `capability`.
    #[must_use]
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    /// Returns the ordered dependency list.
    #[must_use]
    pub fn dependencies(&self) -> &[AgentName] {
        &self.dependencies
    }

    /// Returns attributes outside the known schema.
    #[must_use]
    pub const fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Returns the last heartbeat timestamp.
    #[must_use]
    pub const fn last_heartbeat(&self) -> DateTime<Utc> {
        self.last_heartbeat
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
