//! Mesh configuration loaded from TOML.
//!
//! Every section falls back to its defaults when absent, so an empty file is
//! a valid configuration. The default `[routing]` section carries the
//! healthcare and business keyword profiles the mesh ships with.

use crate::registry::domain::{AgentMetadata, AgentName, RegistryDomainError};
use crate::registry::services::{DEFAULT_PROBE_TIMEOUT, DEFAULT_REGISTRY_TTL};
use crate::messaging::adapters::memory::DEFAULT_CHANNEL_CAPACITY;
use crate::messaging::services::{DEFAULT_DELIVERY_TIMEOUT, DEFAULT_INBOX_CAPACITY};
use crate::workflow::domain::{
    AgentProfile, Confidence, DEFAULT_ESTIMATED_MINUTES, DEFAULT_FALLBACK_CONFIDENCE_PERCENT,
    DEFAULT_POLICY_VERSION, RoutingPolicy, RoutingPolicyError,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "AGENTMESH_CONFIG";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`MeshConfig`].
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The `[agent]` section names an invalid agent.
    #[error("invalid agent section: {0}")]
    Agent(#[from] RegistryDomainError),

    /// The `[routing]` section does not form a valid policy.
    #[error("invalid routing policy: {0}")]
    Policy(#[from] RoutingPolicyError),
}

/// Root of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Identity of the local agent.
    pub agent: AgentSection,
    /// Registry and health timings.
    pub registry: RegistrySection,
    /// Messaging limits and timeouts.
    pub messaging: MessagingSection,
    /// Intent routing policy.
    pub routing: RoutingSection,
}

impl MeshConfig {
    /// Reads and validates the TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, and any
    /// error of [`Self::from_toml_str`] otherwise.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = path.as_ref();
        let contents = std::fs::read_to_string(file).map_err(|source| ConfigError::Io {
            path: file.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Loads the file named by `AGENTMESH_CONFIG`, or the defaults when the
    /// variable is unset.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::load`].
    pub fn load_from_env() -> Result<Self, ConfigError> {
        std::env::var_os(CONFIG_PATH_ENV)
            .map_or_else(|| Ok(Self::default()), |path| Self::load(PathBuf::from(path)))
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Agent`] or [`ConfigError::Policy`] when validation
    /// fails.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the agent identity and the routing policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Agent`] or [`ConfigError::Policy`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.agent.agent_name()?;
        self.agent.dependency_names()?;
        self.routing.to_policy()?;
        Ok(())
    }
}

/// `[agent]`: who this process registers as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    /// Registry key of the local agent.
    pub name: String,
    /// Category tag.
    pub agent_type: Option<String>,
    /// Deployed version.
    pub version: Option<String>,
    /// Listening port.
    pub port: Option<u16>,
    /// Base URL peers should use.
    pub base_url: Option<String>,
    /// Human-readable description.
    pub description: Option<String>,
    /// Declared capabilities.
    pub capabilities: Vec<String>,
    /// Agents this one depends on.
    pub dependencies: Vec<String>,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            name: "coordinator".to_owned(),
            agent_type: Some("orchestration".to_owned()),
            version: None,
            port: None,
            base_url: None,
            description: None,
            capabilities: vec!["workflow_routing".to_owned()],
            dependencies: Vec::new(),
        }
    }
}

impl AgentSection {
    /// Returns the validated agent name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError`] for a malformed name.
    pub fn agent_name(&self) -> Result<AgentName, RegistryDomainError> {
        AgentName::new(self.name.as_str())
    }

    fn dependency_names(&self) -> Result<Vec<AgentName>, RegistryDomainError> {
        self.dependencies
            .iter()
            .map(|name| AgentName::new(name.as_str()))
            .collect()
    }

    /// Builds the registration metadata announced at startup.
    #[must_use]
    pub fn metadata(&self) -> AgentMetadata {
        let mut metadata = AgentMetadata::new()
            .with_capabilities(self.capabilities.iter().cloned())
            .with_dependencies(self.dependencies.iter().cloned());
        metadata.agent_type.clone_from(&self.agent_type);
        metadata.version.clone_from(&self.version);
        metadata.port = self.port;
        metadata.base_url.clone_from(&self.base_url);
        metadata.description.clone_from(&self.description);
        metadata
    }
}

/// `[registry]`: liveness timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySection {
    /// Heartbeat age after which an agent counts as stale.
    pub registry_ttl_secs: u64,
    /// Interval between heartbeats of the local agent.
    pub heartbeat_interval_secs: u64,
    /// Timeout for one health probe.
    pub health_probe_timeout_secs: u64,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            registry_ttl_secs: DEFAULT_REGISTRY_TTL.as_secs(),
            heartbeat_interval_secs: 30,
            health_probe_timeout_secs: DEFAULT_PROBE_TIMEOUT.as_secs(),
        }
    }
}

impl RegistrySection {
    /// Staleness window.
    #[must_use]
    pub const fn registry_ttl(&self) -> Duration {
        Duration::from_secs(self.registry_ttl_secs)
    }

    /// Heartbeat period.
    #[must_use]
    pub const fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    /// Probe timeout.
    #[must_use]
    pub const fn health_probe_timeout(&self) -> Duration {
        Duration::from_secs(self.health_probe_timeout_secs)
    }
}

/// `[messaging]`: delivery and buffering limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagingSection {
    /// Upper bound on one direct delivery.
    pub delivery_timeout_secs: u64,
    /// Correlation ids remembered by the receiver inbox.
    pub inbox_capacity: usize,
    /// Broadcast messages buffered per channel.
    pub channel_capacity: usize,
}

impl Default for MessagingSection {
    fn default() -> Self {
        Self {
            delivery_timeout_secs: DEFAULT_DELIVERY_TIMEOUT.as_secs(),
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl MessagingSection {
    /// Direct delivery timeout.
    #[must_use]
    pub const fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery_timeout_secs)
    }
}

/// One `[[routing.profiles]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSection {
    /// Agent the profile routes to.
    pub agent: String,
    /// Category used for duration estimates.
    pub agent_type: String,
    /// Keywords matched as substrings of the request.
    pub keywords: Vec<String>,
}

impl ProfileSection {
    fn new(agent: &str, agent_type: &str, keywords: &[&str]) -> Self {
        Self {
            agent: agent.to_owned(),
            agent_type: agent_type.to_owned(),
            keywords: keywords.iter().map(|keyword| (*keyword).to_owned()).collect(),
        }
    }
}

/// `[routing]`: the versioned routing policy in raw form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSection {
    /// Policy version reported in logs.
    pub version: u32,
    /// Agent used when nothing matches.
    pub fallback_agent: String,
    /// Confidence of a fallback route, in percent.
    pub fallback_confidence_percent: u32,
    /// Tie-break order between equally confident agents.
    pub priority: Vec<String>,
    /// Estimate used when an agent type has none.
    pub default_estimated_minutes: u32,
    /// Estimated minutes per agent type.
    pub estimated_minutes: BTreeMap<String, u32>,
    /// Keyword profiles.
    pub profiles: Vec<ProfileSection>,
    /// Supporting agents per primary agent, in step order.
    pub support: BTreeMap<String, Vec<String>>,
}

impl Default for RoutingSection {
    fn default() -> Self {
        let profiles = vec![
            ProfileSection::new(
                "doctor-agent",
                "healthcare",
                &[
                    "doctor", "physician", "medical", "diagnosis", "prescription", "symptom",
                    "treatment", "clinic", "consultation", "health",
                ],
            ),
            ProfileSection::new(
                "nurse-agent",
                "healthcare",
                &[
                    "nurse", "nursing", "care", "medication", "vital signs", "shift", "report",
                    "patient care", "checklist",
                ],
            ),
            ProfileSection::new(
                "patient-agent",
                "healthcare",
                &[
                    "patient", "appointment", "schedule", "education", "health tracking",
                    "lab results", "medication reminder", "symptoms",
                ],
            ),
            ProfileSection::new(
                "business-agent",
                "business",
                &[
                    "business", "entrepreneur", "startup", "proposal", "rfp", "market analysis",
                    "tender",
                ],
            ),
            ProfileSection::new(
                "payment-agent",
                "business",
                &[
                    "payment", "billing", "invoice", "financial", "subscription", "stripe",
                    "paypal", "transaction",
                ],
            ),
            ProfileSection::new(
                "chat-agent",
                "content",
                &[
                    "chat", "talk", "conversation", "help", "support", "question", "information",
                ],
            ),
        ];
        let support = [
            ("doctor-agent", vec!["nurse-agent", "patient-agent"]),
            ("nurse-agent", vec!["doctor-agent"]),
            ("patient-agent", vec!["doctor-agent", "nurse-agent"]),
            ("business-agent", vec!["payment-agent", "insight-agent"]),
            ("payment-agent", vec!["business-agent"]),
        ]
        .into_iter()
        .map(|(primary, supporting)| {
            (
                primary.to_owned(),
                supporting.into_iter().map(str::to_owned).collect(),
            )
        })
        .collect();

        Self {
            version: DEFAULT_POLICY_VERSION,
            fallback_agent: "chat-agent".to_owned(),
            fallback_confidence_percent: DEFAULT_FALLBACK_CONFIDENCE_PERCENT,
            priority: [
                "doctor-agent",
                "nurse-agent",
                "patient-agent",
                "business-agent",
                "payment-agent",
                "chat-agent",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
            default_estimated_minutes: DEFAULT_ESTIMATED_MINUTES,
            estimated_minutes: [("healthcare".to_owned(), 10), ("business".to_owned(), 15)]
                .into_iter()
                .collect(),
            profiles,
            support,
        }
    }
}

impl RoutingSection {
    /// Converts the raw section into a validated [`RoutingPolicy`].
    ///
    /// # Errors
    ///
    /// Returns [`RoutingPolicyError`] for malformed agent names, empty or
    /// duplicate profiles, and an out-of-range fallback confidence.
    pub fn to_policy(&self) -> Result<RoutingPolicy, RoutingPolicyError> {
        let base = RoutingPolicy::new(AgentName::new(self.fallback_agent.as_str())?)
            .with_version(self.version)
            .with_fallback_confidence(Confidence::from_percent(self.fallback_confidence_percent)?)
            .with_default_estimated_minutes(self.default_estimated_minutes)
            .with_priority(agent_names(&self.priority)?);

        let with_estimates = self
            .estimated_minutes
            .iter()
            .fold(base, |policy, (agent_type, minutes)| {
                policy.with_estimated_minutes(agent_type.as_str(), *minutes)
            });

        let with_profiles = self
            .profiles
            .iter()
            .try_fold(with_estimates, |policy, profile| {
                policy.with_profile(AgentProfile::new(
                    &profile.agent,
                    profile.agent_type.as_str(),
                    &profile.keywords,
                )?)
            })?;

        self.support
            .iter()
            .try_fold(with_profiles, |policy, (primary, supporting)| -> Result<RoutingPolicy, RoutingPolicyError> {
                Ok(policy.with_support(
                    AgentName::new(primary.as_str())?,
                    agent_names(supporting)?,
                ))
            })
    }
}

fn agent_names(names: &[String]) -> Result<Vec<AgentName>, RegistryDomainError> {
    names
        .iter()
        .map(|name| AgentName::new(name.as_str()))
        .collect()
}
