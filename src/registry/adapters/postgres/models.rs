//! Diesel row models for agent registry persistence.

use super::schema::agents;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for agent records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = agents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AgentRow {
    /// Unique agent name.
    pub name: String,
    /// Category tag.
    pub agent_type: String,
    /// Operating status.
    pub status: String,
    /// Deployed version string.
    pub version: String,
    /// Listening port.
    pub port: Option<i32>,
    /// Free-form description.
    pub description: Option<String>,
    /// Base URL.
    pub base_url: Option<String>,
    /// Explicit liveness endpoint.
    pub health_check_url: Option<String>,
    /// Capability set JSON payload.
    pub capabilities: Value,
    /// Dependency list JSON payload.
    pub dependencies: Value,
    /// Attribute map JSON payload.
    pub attributes: Value,
    /// Last heartbeat timestamp.
    pub last_heartbeat: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert and update model for agent records.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = agents)]
#[diesel(treat_none_as_null = true)]
pub struct NewAgentRow {
    /// Unique agent name.
    pub name: String,
    /// Category tag.
    pub agent_type: String,
    /// Operating status.
    pub status: String,
    /// Deployed version string.
    pub version: String,
    /// Listening port.
    pub port: Option<i32>,
    /// Free-form description.
    pub description: Option<String>,
    /// Base URL.
    pub base_url: Option<String>,
    /// Explicit liveness endpoint.
    pub health_check_url: Option<String>,
    /// Capability set JSON payload.
    pub capabilities: Value,
    /// Dependency list JSON payload.
    pub dependencies: Value,
    /// Attribute map JSON payload.
    pub attributes: Value,
    /// Last heartbeat timestamp.
    pub last_heartbeat: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
