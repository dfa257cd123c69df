//! `PostgreSQL` adapters for direct message persistence.

mod models;
mod repository;
mod schema;

pub use repository::{MessagePgPool, PostgresMessageRepository};
