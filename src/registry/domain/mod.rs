//! Domain model for agent registration and liveness.
//!
//! An agent is identified by its [`AgentName`] and described by an
//! [`AgentRecord`]. Liveness is a combination of persisted status, heartbeat
//! freshness and cached probe results ([`HealthVerdict`]). Infrastructure
//! concerns stay outside this boundary.

mod error;
mod health;
mod metadata;
mod name;
mod record;
mod status;

pub use error::{ParseAgentStatusError, RegistryDomainError};
pub use health::{HealthReport, HealthState, HealthVerdict};
pub use metadata::AgentMetadata;
pub use name::AgentName;
pub use record::{AgentRecord, DEFAULT_AGENT_TYPE, DEFAULT_AGENT_VERSION, PersistedAgentData};
pub use status::AgentStatus;
