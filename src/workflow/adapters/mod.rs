//! Adapter implementations for workflow ports.

pub mod memory;

mod delivery;

pub use delivery::{DeliveryDispatcher, WORKFLOW_REQUEST_MESSAGE_TYPE};
