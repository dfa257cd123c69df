//! Direct message priority.

use super::ParseMessagePriorityError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sender-assigned urgency of a direct message.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MessagePriority {
    /// Background traffic.
    Low,
    /// Default priority.
    #[default]
    Normal,
    /// Time-sensitive traffic.
    High,
    /// Must be handled before anything else.
    Urgent,
}

impl MessagePriority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl fmt::Display for MessagePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for MessagePriority {
    type Error = ParseMessagePriorityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(ParseMessagePriorityError(value.to_owned())),
        }
    }
}
