//! `PostgreSQL` adapters for agent registry persistence.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresAgentRegistry, RegistryPgPool};
