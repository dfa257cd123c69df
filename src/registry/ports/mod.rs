//! Port contracts for agent registration persistence and liveness probing.
//!
//! Ports define infrastructure-agnostic interfaces used by the registry
//! services.

pub mod probe;
pub mod repository;

pub use probe::{HealthProbe, ProbeOutcome};
pub use repository::{AgentFilter, AgentRegistryRepository, RegistryError, RegistryResult};
