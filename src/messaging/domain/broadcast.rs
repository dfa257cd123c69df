//! Broadcast envelopes and system alerts.

use super::{Channel, ParseAlertLevelError};
use crate::registry::domain::AgentName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Message type used for [`SystemAlert`] broadcasts.
pub const SYSTEM_ALERT_MESSAGE_TYPE: &str = "system_alert";

/// Envelope fanned out to every current subscriber of a channel.
///
/// `timestamp` and `publisher_id` are stamped by the publishing service,
/// not by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastMessage {
    /// Channel the message was published on.
    pub channel: Channel,
    /// Publishing agent.
    pub from_agent: AgentName,
    /// Subscriber-defined message kind.
    pub message_type: String,
    /// Structured body.
    pub payload: Value,
    /// When the publisher accepted the message.
    pub timestamp: DateTime<Utc>,
    /// Identity of the publishing service instance.
    pub publisher_id: Uuid,
}

/// Severity of a [`SystemAlert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    /// Informational notice.
    Info,
    /// Degraded but operating.
    Warning,
    /// A component failed.
    Error,
    /// Mesh-wide failure requiring intervention.
    Critical,
}

impl AlertLevel {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AlertLevel {
    type Error = ParseAlertLevelError;

    fn try_from(value: &str) -> Result<Self, ParseAlertLevelError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            _ => Err(ParseAlertLevelError(value.to_owned())),
        }
    }
}

/// Mesh-wide alert published on [`Channel::System`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemAlert {
    /// Severity.
    pub alert_level: AlertLevel,
    /// Human-readable summary.
    pub message: String,
    /// Additional structured context.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl SystemAlert {
    /// Creates an alert without metadata.
    #[must_use]
    pub fn new(alert_level: AlertLevel, message: impl Into<String>) -> Self {
        Self {
            alert_level,
            message: message.into(),
            metadata: Map::new(),
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Attempts to read an alert from a broadcast body.
    #[must_use]
    pub fn from_broadcast(message: &BroadcastMessage) -> Option<Self> {
        if message.message_type != SYSTEM_ALERT_MESSAGE_TYPE {
            return None;
        }
        serde_json::from_value(message.payload.clone()).ok()
    }
}
