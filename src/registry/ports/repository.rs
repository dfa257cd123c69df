//! Repository port for agent record persistence and discovery.

use crate::registry::domain::{AgentName, AgentRecord};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for agent registry repository operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Selection applied by [`AgentRegistryRepository::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AgentFilter {
    /// Every record regardless of type or capability.
    #[default]
    All,
    /// Records whose category tag equals the given value.
    Type(String),
    /// Records that declare the given capability.
    Capability(String),
}

impl AgentFilter {
    /// Returns whether `record` passes the filter.
    #[must_use]
    pub fn matches(&self, record: &AgentRecord) -> bool {
        match self {
            Self::All => true,
            Self::Type(agent_type) => record.agent_type() == agent_type,
            Self::Capability(capability) => record.has_capability(capability),
        }
    }
}

/// Agent registry persistence contract, keyed by [`AgentName`].
#[async_trait]
pub trait AgentRegistryRepository: Send + Sync {
    /// Stores a newly registered agent.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateAgent`] when the name is already
    /// present.
    async fn insert(&self, record: &AgentRecord) -> RegistryResult<()>;

    /// Persists changes to an existing agent record.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when the agent does not exist.
    async fn update(&self, record: &AgentRecord) -> RegistryResult<()>;

    /// Finds an agent record by name.
    ///
    /// Returns `None` when no agent has the given name.
    async fn find_by_name(&self, name: &AgentName) -> RegistryResult<Option<AgentRecord>>;

    /// Returns every record matching `filter`. Ordering is not significant.
    async fn list(&self, filter: &AgentFilter) -> RegistryResult<Vec<AgentRecord>>;
}

/// Errors returned by agent registry repository implementations.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// An agent with the same name already exists.
    #[error("duplicate agent name: {0}")]
    DuplicateAgent(AgentName),

    /// The agent was not found.
    #[error("agent not found: {0}")]
    NotFound(AgentName),

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RegistryError {
    /// Wraps a data-quality or deserialization error from persisted rows.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
