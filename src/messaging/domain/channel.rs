//! Named broadcast channels.

use super::ParseChannelError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Agent category with a dedicated broadcast channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentCategory {
    /// Clinical and patient-facing agents.
    Healthcare,
    /// Billing, payments and operations agents.
    Business,
    /// Engineering and tooling agents.
    Development,
    /// Content production agents.
    Content,
}

impl AgentCategory {
    /// Every category, in channel declaration order.
    pub const ALL: [Self; 4] = [
        Self::Healthcare,
        Self::Business,
        Self::Development,
        Self::Content,
    ];

    /// Returns the canonical category tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthcare => "healthcare",
            Self::Business => "business",
            Self::Development => "development",
            Self::Content => "content",
        }
    }
}

impl fmt::Display for AgentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the fixed broadcast topics.
///
/// Broadcast is best-effort and at-most-once; it carries status and alerts,
/// never work assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Channel {
    /// Mesh-wide announcements and alerts.
    System,
    /// Traffic for one agent category.
    Category(AgentCategory),
    /// Workflow coordination between agents.
    Orchestration,
}

impl Channel {
    /// Returns the transport-level channel name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::System => "mesh:system",
            Self::Category(AgentCategory::Healthcare) => "mesh:healthcare",
            Self::Category(AgentCategory::Business) => "mesh:business",
            Self::Category(AgentCategory::Development) => "mesh:development",
            Self::Category(AgentCategory::Content) => "mesh:content",
            Self::Orchestration => "mesh:orchestration",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<&str> for Channel {
    type Error = ParseChannelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        let short = normalized.strip_prefix("mesh:").unwrap_or(normalized.as_str());
        match short {
            "system" => Ok(Self::System),
            "orchestration" => Ok(Self::Orchestration),
            other => AgentCategory::ALL
                .into_iter()
                .find(|category| category.as_str() == other)
                .map(Self::Category)
                .ok_or_else(|| ParseChannelError(value.to_owned())),
        }
    }
}

impl TryFrom<String> for Channel {
    type Error = ParseChannelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Channel> for String {
    fn from(channel: Channel) -> Self {
        channel.name().to_owned()
    }
}
