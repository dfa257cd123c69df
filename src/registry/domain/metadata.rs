//! Registration metadata supplied by agents.

use super::{AgentName, RegistryDomainError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Maximum length for a category tag, matching the `VARCHAR(50)` column.
const MAX_AGENT_TYPE_LENGTH: usize = 50;

/// Maximum length for a version string, matching the `VARCHAR(20)` column.
const MAX_VERSION_LENGTH: usize = 20;

/// Partial description of an agent, as sent on registration.
///
/// Every field is optional so the same type serves first registration and
/// later merges. Keys this version does not know about are kept in
/// [`AgentMetadata::attributes`] instead of being rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentMetadata {
    /// Category tag, serialised as `type`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<String>,
    /// Deployed version string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Listening port on the agent's host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Base URL of the agent's HTTP surface.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Explicit liveness endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check_url: Option<String>,
    /// Declared capabilities; replaces the stored set when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<BTreeSet<String>>,
    /// Agents that must be reachable first; replaces the stored list when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
    /// Unrecognised keys, merged into the stored attribute map.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl AgentMetadata {
    /// Creates empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the category tag.
    #[must_use]
    pub fn with_type(mut self, agent_type: impl Into<String>) -> Self {
        self.agent_type = Some(agent_type.into());
        self
    }

    /// Sets the version string.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the listening port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the liveness endpoint.
    #[must_use]
    pub fn with_health_check_url(mut self, url: impl Into<String>) -> Self {
        self.health_check_url = Some(url.into());
        self
    }

    /// Sets the capability set.
    #[must_use]
    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = Some(capabilities.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the dependency list.
    #[must_use]
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = Some(dependencies.into_iter().map(Into::into).collect());
        self
    }

    /// Adds an attribute outside the known schema.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Validates stored lengths and dependency names, trimming text fields.
    ///
    /// URLs are kept as declared; one that cannot be reached only makes the
    /// agent unhealthy.
    pub(crate) fn validate(self) -> Result<ValidatedMetadata, RegistryDomainError> {
        let agent_type = non_blank(self.agent_type);
        if let Some(tag) = agent_type.as_ref().filter(|tag| exceeds(tag, MAX_AGENT_TYPE_LENGTH)) {
            return Err(RegistryDomainError::AgentTypeTooLong(tag.clone()));
        }
        let version = non_blank(self.version);
        if let Some(v) = version.as_ref().filter(|v| exceeds(v, MAX_VERSION_LENGTH)) {
            return Err(RegistryDomainError::VersionTooLong(v.clone()));
        }
        let base_url = normalize_url(self.base_url);
        let health_check_url = normalize_url(self.health_check_url);
        let dependencies = self
            .dependencies
            .map(|names| {
                names
                    .into_iter()
                    .map(AgentName::new)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        Ok(ValidatedMetadata {
            agent_type,
            version,
            port: self.port,
            description: non_blank(self.description),
            base_url,
            health_check_url,
            capabilities: self.capabilities.map(|set| {
                set.into_iter()
                    .map(|c| c.trim().to_owned())
                    .filter(|c| !c.is_empty())
                    .collect()
            }),
            dependencies,
            attributes: self.attributes,
        })
    }
}

/// Metadata that passed validation and can be applied to a record.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValidatedMetadata {
    pub(crate) agent_type: Option<String>,
    pub(crate) version: Option<String>,
    pub(crate) port: Option<u16>,
    pub(crate) description: Option<String>,
    pub(crate) base_url: Option<String>,
    pub(crate) health_check_url: Option<String>,
    pub(crate) capabilities: Option<BTreeSet<String>>,
    pub(crate) dependencies: Option<Vec<AgentName>>,
    pub(crate) attributes: Map<String, Value>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn normalize_url(raw: Option<String>) -> Option<String> {
    raw.map(|url| url.trim().trim_end_matches('/').to_owned())
        .filter(|url| !url.is_empty())
}

fn exceeds(value: &str, limit: usize) -> bool {
    value.chars().count() > limit
}
