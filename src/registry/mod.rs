//! Service registry and health monitoring for mesh agents.
//!
//! Every agent registers itself on startup, refreshes its entry on a fixed
//! heartbeat interval and is marked offline on shutdown. Readers derive
//! staleness from the heartbeat timestamp rather than trusting the persisted
//! status, and the health monitor layers a short-lived probe cache on top.
//! The module follows hexagonal architecture:
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
