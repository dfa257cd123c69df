//! Diesel row models for direct message persistence.

use super::schema::inter_agent_messages;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for direct messages.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = inter_agent_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MessageRow {
    /// Internal message identifier.
    pub id: uuid::Uuid,
    /// Sending agent name.
    pub from_agent: String,
    /// Receiving agent name.
    pub to_agent: String,
    /// Receiver-defined message kind.
    pub message_type: String,
    /// Message body.
    pub payload: Value,
    /// Sender-assigned priority.
    pub priority: String,
    /// Delivery status.
    pub status: String,
    /// Request correlation token.
    pub correlation_id: String,
    /// Failure cause.
    pub failure_reason: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Delivery acknowledgement timestamp.
    pub processed_at: Option<DateTime<Utc>>,
}

/// Insert model for direct messages.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = inter_agent_messages)]
pub struct NewMessageRow {
    /// Internal message identifier.
    pub id: uuid::Uuid,
    /// Sending agent name.
    pub from_agent: String,
    /// Receiving agent name.
    pub to_agent: String,
    /// Receiver-defined message kind.
    pub message_type: String,
    /// Message body.
    pub payload: Value,
    /// Sender-assigned priority.
    pub priority: String,
    /// Delivery status.
    pub status: String,
    /// Request correlation token.
    pub correlation_id: String,
    /// Failure cause.
    pub failure_reason: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Delivery acknowledgement timestamp.
    pub processed_at: Option<DateTime<Utc>>,
}
