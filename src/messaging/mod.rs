//! Messaging fabric: best-effort broadcast plus accounted direct delivery.
//!
//! Broadcast fans status and alert messages out over a small fixed set of
//! channels with at-most-once semantics. Direct delivery persists every
//! message before sending it and settles it as delivered or failed exactly
//! once; receivers deduplicate by correlation id. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
