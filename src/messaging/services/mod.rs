//! Messaging orchestration services.

mod broadcast;
mod delivery;
mod inbox;

pub use broadcast::{BroadcastError, BroadcastHandler, BroadcastService};
pub use delivery::{
    DEFAULT_DELIVERY_TIMEOUT, DeliveryReceipt, DirectDelivery, SendError, SendRequest,
};
pub use inbox::{DEFAULT_INBOX_CAPACITY, HandlerError, InboundHandler, InboxError, MessageInbox};
