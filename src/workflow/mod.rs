//! Workflow routing and execution.
//!
//! The router scores free text against versioned keyword profiles and
//! emits an ordered plan; the engine drives each plan through
//! `created -> executing -> completed | error`, handing the first step to
//! the primary agent over direct delivery and applying completion or
//! error callbacks as they arrive. The module follows hexagonal
//! architecture:
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
