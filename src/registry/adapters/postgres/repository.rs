//! `PostgreSQL` repository implementation for agent records.

use super::{
    models::{AgentRow, NewAgentRow},
    schema::agents,
};
use crate::registry::{
    domain::{AgentName, AgentRecord, AgentStatus, PersistedAgentData},
    ports::{AgentFilter, AgentRegistryRepository, RegistryError, RegistryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::BTreeSet;

/// `PostgreSQL` connection pool type used by registry adapters.
pub type RegistryPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed agent registry repository.
#[derive(Debug, Clone)]
pub struct PostgresAgentRegistry {
    pool: RegistryPgPool,
}

impl PostgresAgentRegistry {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: RegistryPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> RegistryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> RegistryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(RegistryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(RegistryError::persistence)?
    }
}

#[async_trait]
impl AgentRegistryRepository for PostgresAgentRegistry {
    async fn insert(&self, record: &AgentRecord) -> RegistryResult<()> {
        let agent_name = record.name().clone();
        let new_row = to_row(record)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(agents::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        RegistryError::DuplicateAgent(agent_name.clone())
                    }
                    _ => RegistryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, record: &AgentRecord) -> RegistryResult<()> {
        let agent_name = record.name().clone();
        let row = to_row(record)?;

        self.run_blocking(move |connection| {
            let updated_count =
                diesel::update(agents::table.filter(agents::name.eq(agent_name.as_str())))
                    .set(&row)
                    .execute(connection)
                    .map_err(RegistryError::persistence)?;

            if updated_count == 0 {
                return Err(RegistryError::NotFound(agent_name));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_name(&self, name: &AgentName) -> RegistryResult<Option<AgentRecord>> {
        let name_str = name.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = agents::table
                .filter(agents::name.eq(&name_str))
                .select(AgentRow::as_select())
                .first::<AgentRow>(connection)
                .optional()
                .map_err(RegistryError::persistence)?;
            row.map(row_to_record).transpose()
        })
        .await
    }

    async fn list(&self, filter: &AgentFilter) -> RegistryResult<Vec<AgentRecord>> {
        let filter = filter.clone();
        self.run_blocking(move |connection| {
            let mut query = agents::table.select(AgentRow::as_select()).into_boxed();
            match &filter {
                AgentFilter::All => {}
                AgentFilter::Type(agent_type) => {
                    query = query.filter(agents::agent_type.eq(agent_type.clone()));
                }
                AgentFilter::Capability(capability) => {
                    query = query.filter(
                        agents::capabilities.contains(serde_json::json!([capability])),
                    );
                }
            }
            let rows = query
                .load::<AgentRow>(connection)
                .map_err(RegistryError::persistence)?;
            rows.into_iter().map(row_to_record).collect()
        })
        .await
    }
}

fn to_row(record: &AgentRecord) -> RegistryResult<NewAgentRow> {
    let capabilities =
        serde_json::to_value(record.capabilities()).map_err(RegistryError::persistence)?;
    let dependencies =
        serde_json::to_value(record.dependencies()).map_err(RegistryError::persistence)?;

    Ok(NewAgentRow {
        name: record.name().as_str().to_owned(),
        agent_type: record.agent_type().to_owned(),
        status: record.status().as_str().to_owned(),
        version: record.version().to_owned(),
        port: record.port().map(i32::from),
        description: record.description().map(ToOwned::to_owned),
        base_url: record.base_url().map(ToOwned::to_owned),
        health_check_url: record.declared_health_check_url().map(ToOwned::to_owned),
        capabilities,
        dependencies,
        attributes: serde_json::Value::Object(record.attributes().clone()),
        last_heartbeat: record.last_heartbeat(),
        created_at: record.created_at(),
        updated_at: record.updated_at(),
    })
}

fn row_to_record(row: AgentRow) -> RegistryResult<AgentRecord> {
    let AgentRow {
        name,
        agent_type,
        status,
        version,
        port,
        description,
        base_url,
        health_check_url,
        capabilities,
        dependencies,
        attributes,
        last_heartbeat,
        created_at,
        updated_at,
    } = row;

    let parsed_name = AgentName::new(name).map_err(RegistryError::invalid_persisted_data)?;
    let parsed_status =
        AgentStatus::try_from(status.as_str()).map_err(RegistryError::invalid_persisted_data)?;
    let parsed_port = port
        .map(u16::try_from)
        .transpose()
        .map_err(RegistryError::invalid_persisted_data)?;
    let parsed_capabilities: BTreeSet<String> =
        serde_json::from_value(capabilities).map_err(RegistryError::invalid_persisted_data)?;
    let parsed_dependencies: Vec<AgentName> =
        serde_json::from_value(dependencies).map_err(RegistryError::invalid_persisted_data)?;
    let parsed_attributes: serde_json::Map<String, serde_json::Value> =
        serde_json::from_value(attributes).map_err(RegistryError::invalid_persisted_data)?;

    let data = PersistedAgentData {
        name: parsed_name,
        agent_type,
        status: parsed_status,
        version,
        port: parsed_port,
        description,
        base_url,
        health_check_url,
        capabilities: parsed_capabilities,
        dependencies: parsed_dependencies,
        attributes: parsed_attributes,
        last_heartbeat,
        created_at,
        updated_at,
    };
    Ok(AgentRecord::from_persisted(data))
}
