//! In-memory adapters for agent registry tests and single-process meshes.

mod agent_registry;
mod health_probe;

pub use agent_registry::InMemoryAgentRegistry;
pub use health_probe::InMemoryHealthProbe;
