//! Registry orchestration services.

mod heartbeat;
mod monitor;
mod registry;

pub use heartbeat::spawn_heartbeat;
pub use monitor::{DEFAULT_PROBE_TIMEOUT, HealthMonitor};
pub use registry::{
    DEFAULT_REGISTRY_TTL, RegistrySummary, ServiceRegistry, ServiceRegistryError,
    ServiceRegistryResult,
};
