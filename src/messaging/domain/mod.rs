//! Domain model for inter-agent messaging.
//!
//! Two delivery paths share these types: best-effort broadcast over named
//! [`Channel`]s, and durable point-to-point [`InterAgentMessage`]s whose
//! [`DeliveryStatus`] is the only authoritative evidence that a receiver
//! acted.

mod broadcast;
mod channel;
mod error;
mod ids;
mod message;
mod priority;
mod status;

pub use broadcast::{AlertLevel, BroadcastMessage, SYSTEM_ALERT_MESSAGE_TYPE, SystemAlert};
pub use channel::{AgentCategory, Channel};
pub use error::{
    MessagingDomainError, ParseAlertLevelError, ParseChannelError, ParseDeliveryStatusError,
    ParseMessagePriorityError,
};
pub use ids::{CorrelationId, MessageId};
pub use message::{InterAgentMessage, MessageDraft, PersistedMessageData};
pub use priority::MessagePriority;
pub use status::DeliveryStatus;
