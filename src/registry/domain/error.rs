//! Error types for registry domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing registry domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryDomainError {
    /// The agent name is empty after trimming.
    #[error("agent name must not be empty")]
    EmptyAgentName,

    /// The agent name contains characters outside `[a-z0-9_-]`.
    #[error(
        "agent name '{0}' contains invalid characters (only lowercase alphanumeric, hyphens and underscores allowed)"
    )]
    InvalidAgentName(String),

    /// The agent name exceeds the 50-character storage limit.
    #[error("agent name exceeds 50 character limit: {0}")]
    AgentNameTooLong(String),

    /// The category tag exceeds the 50-character storage limit.
    #[error("agent type exceeds 50 character limit: {0}")]
    AgentTypeTooLong(String),

    /// The version string exceeds the 20-character storage limit.
    #[error("agent version exceeds 20 character limit: {0}")]
    VersionTooLong(String),
}

/// Error returned while parsing agent status from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown agent status: {0}")]
pub struct ParseAgentStatusError(pub String);
