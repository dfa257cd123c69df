//! Direct message persistence against `PostgreSQL`.

use crate::postgres::helpers::{PgContext, pg_context};
use agentmesh::messaging::{
    adapters::postgres::PostgresMessageRepository,
    domain::{
        CorrelationId, DeliveryStatus, InterAgentMessage, MessageDraft, MessageId,
        MessagePriority,
    },
    ports::{MessageRepository, MessageStoreError},
};
use agentmesh::registry::domain::AgentName;
use rstest::rstest;
use serde_json::json;
use std::time::Duration;

fn message(
    context: &PgContext,
    to: &str,
    correlation_id: &CorrelationId,
    payload: serde_json::Value,
) -> InterAgentMessage {
    let draft = MessageDraft::new(
        AgentName::new("coordinator").expect("valid agent name"),
        AgentName::new(to).expect("valid agent name"),
        "workflow_request",
        payload,
        correlation_id.clone(),
    )
    .with_priority(MessagePriority::High);
    InterAgentMessage::pending(draft, &context.clock).expect("valid draft")
}

#[rstest]
fn stored_message_is_found_unchanged(pg_context: PgContext) {
    let repository = PostgresMessageRepository::new(pg_context.pool.clone());
    let correlation_id = CorrelationId::new("intake-42").expect("valid correlation id");
    let stored = message(
        &pg_context,
        "doctor-agent",
        &correlation_id,
        json!({"patient": {"id": 42, "symptoms": ["fever", "cough"]}}),
    );

    let found = pg_context.rt.block_on(async {
        repository.store(&stored).await.expect("store succeeds");
        repository.find_by_id(stored.id()).await.expect("lookup succeeds")
    });

    assert_eq!(found, Some(stored));
}

#[rstest]
fn settled_status_is_persisted(pg_context: PgContext) {
    let repository = PostgresMessageRepository::new(pg_context.pool.clone());
    let correlation_id = CorrelationId::generate();
    let mut delivered = message(&pg_context, "doctor-agent", &correlation_id, json!({}));
    let mut failed = message(&pg_context, "nurse-agent", &correlation_id, json!({}));
    pg_context.rt.block_on(async {
        repository.store(&delivered).await.expect("store succeeds");
        repository.store(&failed).await.expect("store succeeds");
    });

    pg_context.clock.advance(Duration::from_secs(2));
    delivered.mark_delivered(&pg_context.clock).expect("pending message");
    failed.mark_failed("peer returned HTTP 503").expect("pending message");
    let (first, second) = pg_context.rt.block_on(async {
        repository.update(&delivered).await.expect("update succeeds");
        repository.update(&failed).await.expect("update succeeds");
        (
            repository.find_by_id(delivered.id()).await.expect("lookup succeeds"),
            repository.find_by_id(failed.id()).await.expect("lookup succeeds"),
        )
    });

    assert_eq!(first, Some(delivered));
    let failed_row = second.expect("failed message present");
    assert_eq!(failed_row.status(), DeliveryStatus::Failed);
    assert_eq!(failed_row.failure_reason(), Some("peer returned HTTP 503"));
}

#[rstest]
fn messages_sharing_a_correlation_id_are_listed_oldest_first(pg_context: PgContext) {
    let repository = PostgresMessageRepository::new(pg_context.pool.clone());
    let correlation_id = CorrelationId::new("handoff-7").expect("valid correlation id");
    let unrelated = CorrelationId::new("handoff-8").expect("valid correlation id");

    let mut expected = Vec::new();
    for recipient in ["doctor-agent", "nurse-agent", "pharmacy-agent"] {
        expected.push(message(&pg_context, recipient, &correlation_id, json!({"to": recipient})));
        pg_context.clock.advance(Duration::from_secs(1));
    }
    let other = message(&pg_context, "doctor-agent", &unrelated, json!({}));

    let listed = pg_context.rt.block_on(async {
        for stored in expected.iter().rev().chain([&other]) {
            repository.store(stored).await.expect("store succeeds");
        }
        repository
            .find_by_correlation_id(&correlation_id)
            .await
            .expect("lookup succeeds")
    });

    assert_eq!(listed, expected);
}

#[rstest]
fn duplicate_and_missing_identifiers_are_reported(pg_context: PgContext) {
    let repository = PostgresMessageRepository::new(pg_context.pool.clone());
    let stored = message(&pg_context, "doctor-agent", &CorrelationId::generate(), json!({}));
    let never_stored = message(&pg_context, "nurse-agent", &CorrelationId::generate(), json!({}));

    let (duplicate, missing, absent) = pg_context.rt.block_on(async {
        repository.store(&stored).await.expect("first store succeeds");
        (
            repository.store(&stored).await,
            repository.update(&never_stored).await,
            repository
                .find_by_id(MessageId::new())
                .await
                .expect("lookup succeeds"),
        )
    });

    assert!(matches!(duplicate, Err(MessageStoreError::DuplicateMessage(id)) if id == stored.id()));
    assert!(matches!(missing, Err(MessageStoreError::NotFound(id)) if id == never_stored.id()));
    assert!(absent.is_none());
}
