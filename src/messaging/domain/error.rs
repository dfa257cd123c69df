//! Error types for messaging domain validation and parsing.

use super::{DeliveryStatus, MessageId};
use thiserror::Error;

/// Errors returned while constructing or transitioning messaging values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MessagingDomainError {
    /// The correlation id is empty after trimming.
    #[error("correlation id must not be empty")]
    EmptyCorrelationId,

    /// The correlation id exceeds the 100-character storage limit.
    #[error("correlation id exceeds 100 character limit: {0}")]
    CorrelationIdTooLong(String),

    /// The message type is empty after trimming.
    #[error("message type must not be empty")]
    EmptyMessageType,

    /// The message type exceeds the 30-character storage limit.
    #[error("message type exceeds 30 character limit: {0}")]
    MessageTypeTooLong(String),

    /// A delivery status transition was attempted on a settled message.
    #[error("message {id} is already {status}")]
    AlreadySettled {
        /// Message identifier.
        id: MessageId,
        /// Terminal status the message already holds.
        status: DeliveryStatus,
    },
}

/// Error returned while parsing a delivery status from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown delivery status: {0}")]
pub struct ParseDeliveryStatusError(pub String);

/// Error returned while parsing a message priority.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown message priority: {0}")]
pub struct ParseMessagePriorityError(pub String);

/// Error returned while parsing a broadcast channel name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown channel: {0}")]
pub struct ParseChannelError(pub String);

/// Error returned while parsing an alert level.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown alert level: {0}")]
pub struct ParseAlertLevelError(pub String);
