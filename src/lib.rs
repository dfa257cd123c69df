//! Agentmesh: coordination fabric for a mesh of cooperating agents.
//!
//! This crate provides the pieces a set of independently deployed agents
//! need to find each other, exchange messages and route user requests into
//! workflows handled by the most suitable agent.
//!
//! # Architecture
//!
//! Agentmesh follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, HTTP, in-memory)
//!
//! # Modules
//!
//! - [`registry`]: Agent registration, heartbeats and health verdicts
//! - [`messaging`]: Broadcast channels and idempotent direct delivery
//! - [`workflow`]: Intent routing and workflow execution
//! - [`runtime`]: Startup and shutdown of the local agent
//! - [`config`]: TOML configuration
//! - [`telemetry`]: Tracing subscriber set-up

pub mod clock;
pub mod config;
pub mod keyed_lock;
pub mod messaging;
pub mod registry;
pub mod runtime;
pub mod telemetry;
pub mod workflow;
