//! Shared fixtures for `PostgreSQL` integration tests.

pub use super::cluster::{BoxError, PostgresCluster, postgres_cluster, test_runtime};
use super::cluster::TemporaryDatabase;
use agentmesh::clock::ManualClock;
use chrono::{DateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use rstest::fixture;
use tokio::runtime::Runtime;
use uuid::Uuid;

/// SQL creating the `agents` table.
pub const CREATE_AGENTS_SQL: &str =
    include_str!("../../migrations/2026-01-01-000000_create_agents/up.sql");

/// SQL creating the `inter_agent_messages` table.
pub const CREATE_MESSAGES_SQL: &str =
    include_str!("../../migrations/2026-01-01-000100_create_inter_agent_messages/up.sql");

/// Template database holding the migrated schema.
pub const TEMPLATE_DB: &str = "agentmesh_test_template";

/// Connection pool shared by both repositories.
pub type TestPool = Pool<ConnectionManager<PgConnection>>;

/// A migrated database, its pool and a runtime to drive repositories on.
pub struct PgContext {
    /// Connection pool for the temporary database.
    pub pool: TestPool,
    /// Runtime the async repository calls are blocked on.
    pub rt: Runtime,
    /// Deterministic clock for domain timestamps.
    pub clock: ManualClock,
    _database: TemporaryDatabase,
}

fn apply_migrations(url: &str) -> Result<(), BoxError> {
    let mut conn = PgConnection::establish(url).map_err(|err| Box::new(err) as BoxError)?;
    conn.batch_execute(CREATE_AGENTS_SQL)
        .map_err(|err| Box::new(err) as BoxError)?;
    conn.batch_execute(CREATE_MESSAGES_SQL)
        .map_err(|err| Box::new(err) as BoxError)?;
    Ok(())
}

fn prepare(cluster: PostgresCluster) -> Result<PgContext, BoxError> {
    cluster.ensure_template_exists(TEMPLATE_DB, apply_migrations)?;
    let database =
        TemporaryDatabase::from_template(cluster, format!("test_{}", Uuid::new_v4()), TEMPLATE_DB)?;
    let pool = Pool::builder()
        .max_size(2)
        .build(ConnectionManager::<PgConnection>::new(database.url()))
        .map_err(|err| Box::new(err) as BoxError)?;
    Ok(PgContext {
        pool,
        rt: test_runtime()?,
        clock: ManualClock::new(whole_second_now()),
        _database: database,
    })
}

/// `TIMESTAMPTZ` keeps microseconds, so stored timestamps start on a whole
/// second to compare equal after a round trip.
fn whole_second_now() -> DateTime<Utc> {
    DateTime::from_timestamp(Utc::now().timestamp(), 0).unwrap_or_default()
}

/// Provides a freshly migrated database for one test.
#[fixture]
pub fn pg_context(postgres_cluster: PostgresCluster) -> PgContext {
    prepare(postgres_cluster).expect("migrated test database")
}
