//! Agent record persistence against `PostgreSQL`.

use crate::postgres::helpers::{PgContext, pg_context};
use agentmesh::registry::{
    adapters::postgres::PostgresAgentRegistry,
    domain::{AgentMetadata, AgentName, AgentRecord, AgentStatus},
    ports::{AgentFilter, AgentRegistryRepository, RegistryError},
};
use mockable::Clock;
use rstest::rstest;
use serde_json::json;
use std::time::Duration;

fn agent(context: &PgContext, name: &str, metadata: AgentMetadata) -> AgentRecord {
    AgentRecord::register(
        AgentName::new(name).expect("valid agent name"),
        metadata,
        &context.clock,
    )
    .expect("valid metadata")
}

fn names(records: &[AgentRecord]) -> Vec<&str> {
    let mut listed: Vec<&str> = records.iter().map(|record| record.name().as_str()).collect();
    listed.sort_unstable();
    listed
}

#[rstest]
fn inserted_record_is_found_unchanged(pg_context: PgContext) {
    let registry = PostgresAgentRegistry::new(pg_context.pool.clone());
    let record = agent(
        &pg_context,
        "doctor-agent",
        AgentMetadata::new()
            .with_type("healthcare")
            .with_version("2.1.0")
            .with_port(8001)
            .with_description("Diagnoses patients")
            .with_health_check_url("localhost:8001/health")
            .with_capabilities(["diagnosis", "prescriptions"])
            .with_dependencies(["nurse-agent"])
            .with_attribute("region", json!("eu-west")),
    );

    let found = pg_context.rt.block_on(async {
        registry.insert(&record).await.expect("insert succeeds");
        registry.find_by_name(record.name()).await.expect("lookup succeeds")
    });

    assert_eq!(found, Some(record));
}

#[rstest]
fn update_persists_status_and_heartbeat(pg_context: PgContext) {
    let registry = PostgresAgentRegistry::new(pg_context.pool.clone());
    let mut record = agent(&pg_context, "nurse-agent", AgentMetadata::new().with_port(8002));
    pg_context
        .rt
        .block_on(registry.insert(&record))
        .expect("insert succeeds");

    pg_context.clock.advance(Duration::from_secs(30));
    record.heartbeat(&pg_context.clock);
    record.set_status(AgentStatus::Maintenance, &pg_context.clock);
    let found = pg_context.rt.block_on(async {
        registry.update(&record).await.expect("update succeeds");
        registry.find_by_name(record.name()).await.expect("lookup succeeds")
    });

    let stored = found.expect("record present");
    assert_eq!(stored.status(), AgentStatus::Maintenance);
    assert_eq!(stored.last_heartbeat(), pg_context.clock.utc());
    assert_eq!(stored, record);
}

#[rstest]
fn updating_an_unknown_agent_is_not_found(pg_context: PgContext) {
    let registry = PostgresAgentRegistry::new(pg_context.pool.clone());
    let record = agent(&pg_context, "ghost-agent", AgentMetadata::new());

    let result = pg_context.rt.block_on(registry.update(&record));

    assert!(matches!(result, Err(RegistryError::NotFound(name)) if name.as_str() == "ghost-agent"));
}

#[rstest]
fn duplicate_name_is_rejected(pg_context: PgContext) {
    let registry = PostgresAgentRegistry::new(pg_context.pool.clone());
    let record = agent(&pg_context, "doctor-agent", AgentMetadata::new());

    let second = pg_context.rt.block_on(async {
        registry.insert(&record).await.expect("first insert succeeds");
        registry.insert(&record).await
    });

    assert!(matches!(second, Err(RegistryError::DuplicateAgent(_))));
}

#[rstest]
fn list_filters_by_capability_and_type(pg_context: PgContext) {
    let registry = PostgresAgentRegistry::new(pg_context.pool.clone());
    let records = [
        agent(
            &pg_context,
            "doctor-agent",
            AgentMetadata::new()
                .with_type("healthcare")
                .with_capabilities(["diagnosis", "prescriptions"]),
        ),
        agent(
            &pg_context,
            "nurse-agent",
            AgentMetadata::new()
                .with_type("healthcare")
                .with_capabilities(["triage"]),
        ),
        agent(
            &pg_context,
            "radiology-agent",
            AgentMetadata::new()
                .with_type("imaging")
                .with_capabilities(["diagnosis"]),
        ),
    ];

    let (diagnosis, healthcare, everyone, nobody) = pg_context.rt.block_on(async {
        for record in &records {
            registry.insert(record).await.expect("insert succeeds");
        }
        let list = |filter: AgentFilter| {
            let registry = registry.clone();
            async move { registry.list(&filter).await.expect("list succeeds") }
        };
        (
            list(AgentFilter::Capability("diagnosis".to_owned())).await,
            list(AgentFilter::Type("healthcare".to_owned())).await,
            list(AgentFilter::All).await,
            list(AgentFilter::Capability("surgery".to_owned())).await,
        )
    });

    assert_eq!(names(&diagnosis), vec!["doctor-agent", "radiology-agent"]);
    assert_eq!(names(&healthcare), vec!["doctor-agent", "nurse-agent"]);
    assert_eq!(names(&everyone).len(), 3);
    assert!(nobody.is_empty());
}
