//! In-memory repository for agent records.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::registry::{
    domain::{AgentName, AgentRecord},
    ports::{AgentFilter, AgentRegistryRepository, RegistryError, RegistryResult},
};

/// Thread-safe in-memory agent registry repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAgentRegistry {
    state: Arc<RwLock<HashMap<AgentName, AgentRecord>>>,
}

impl InMemoryAgentRegistry {
    /// Creates an empty in-memory registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AgentRegistryRepository for InMemoryAgentRegistry {
    async fn insert(&self, record: &AgentRecord) -> RegistryResult<()> {
        let mut agents = self
            .state
            .write()
            .map_err(|err| RegistryError::persistence(std::io::Error::other(err.to_string())))?;

        if agents.contains_key(record.name()) {
            return Err(RegistryError::DuplicateAgent(record.name().clone()));
        }

        agents.insert(record.name().clone(), record.clone());
        Ok(())
    }

    async fn update(&self, record: &AgentRecord) -> RegistryResult<()> {
        let mut agents = self
            .state
            .write()
            .map_err(|err| RegistryError::persistence(std::io::Error::other(err.to_string())))?;

        let stored = agents
            .get_mut(record.name())
            .ok_or_else(|| RegistryError::NotFound(record.name().clone()))?;
        *stored = record.clone();
        Ok(())
    }

    async fn find_by_name(&self, name: &AgentName) -> RegistryResult<Option<AgentRecord>> {
        let agents = self
            .state
            .read()
            .map_err(|err| RegistryError::persistence(std::io::Error::other(err.to_string())))?;
        Ok(agents.get(name).cloned())
    }

    async fn list(&self, filter: &AgentFilter) -> RegistryResult<Vec<AgentRecord>> {
        let agents = self
            .state
            .read()
            .map_err(|err| RegistryError::persistence(std::io::Error::other(err.to_string())))?;
        Ok(agents
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }
}
