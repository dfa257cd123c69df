//! `PostgreSQL` repository implementation for direct messages.

use super::{
    models::{MessageRow, NewMessageRow},
    schema::inter_agent_messages,
};
use crate::messaging::{
    domain::{
        CorrelationId, DeliveryStatus, InterAgentMessage, MessageId, MessagePriority,
        PersistedMessageData,
    },
    ports::{MessageRepository, MessageStoreError, MessageStoreResult},
};
use crate::registry::domain::AgentName;
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by message adapters.
pub type MessagePgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed direct message repository.
#[derive(Debug, Clone)]
pub struct PostgresMessageRepository {
    pool: MessagePgPool,
}

impl PostgresMessageRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: MessagePgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> MessageStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> MessageStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(MessageStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(MessageStoreError::persistence)?
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    async fn store(&self, message: &InterAgentMessage) -> MessageStoreResult<()> {
        let message_id = message.id();
        let new_row = to_new_row(message);

        self.run_blocking(move |connection| {
            diesel::insert_into(inter_agent_messages::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        MessageStoreError::DuplicateMessage(message_id)
                    }
                    _ => MessageStoreError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, message: &InterAgentMessage) -> MessageStoreResult<()> {
        let message_id = message.id();
        let status_val = message.status().as_str().to_owned();
        let failure_val = message.failure_reason().map(ToOwned::to_owned);
        let processed_val = message.processed_at();

        self.run_blocking(move |connection| {
            let updated_count = diesel::update(
                inter_agent_messages::table
                    .filter(inter_agent_messages::id.eq(message_id.into_inner())),
            )
            .set((
                inter_agent_messages::status.eq(&status_val),
                inter_agent_messages::failure_reason.eq(&failure_val),
                inter_agent_messages::processed_at.eq(processed_val),
            ))
            .execute(connection)
            .map_err(MessageStoreError::persistence)?;

            if updated_count == 0 {
                return Err(MessageStoreError::NotFound(message_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: MessageId) -> MessageStoreResult<Option<InterAgentMessage>> {
        self.run_blocking(move |connection| {
            let row = inter_agent_messages::table
                .filter(inter_agent_messages::id.eq(id.into_inner()))
                .select(MessageRow::as_select())
                .first::<MessageRow>(connection)
                .optional()
                .map_err(MessageStoreError::persistence)?;
            row.map(row_to_message).transpose()
        })
        .await
    }

    async fn find_by_correlation_id(
        &self,
        correlation_id: &CorrelationId,
    ) -> MessageStoreResult<Vec<InterAgentMessage>> {
        let correlation_str = correlation_id.as_str().to_owned();
        self.run_blocking(move |connection| {
            let rows = inter_agent_messages::table
                .filter(inter_agent_messages::correlation_id.eq(&correlation_str))
                .order(inter_agent_messages::created_at.asc())
                .select(MessageRow::as_select())
                .load::<MessageRow>(connection)
                .map_err(MessageStoreError::persistence)?;
            rows.into_iter().map(row_to_message).collect()
        })
        .await
    }
}

fn to_new_row(message: &InterAgentMessage) -> NewMessageRow {
    NewMessageRow {
        id: message.id().into_inner(),
        from_agent: message.from_agent().as_str().to_owned(),
        to_agent: message.to_agent().as_str().to_owned(),
        message_type: message.message_type().to_owned(),
        payload: message.payload().clone(),
        priority: message.priority().as_str().to_owned(),
        status: message.status().as_str().to_owned(),
        correlation_id: message.correlation_id().as_str().to_owned(),
        failure_reason: message.failure_reason().map(ToOwned::to_owned),
        created_at: message.created_at(),
        processed_at: message.processed_at(),
    }
}

fn row_to_message(row: MessageRow) -> MessageStoreResult<InterAgentMessage> {
    let MessageRow {
        id,
        from_agent,
        to_agent,
        message_type,
        payload,
        priority,
        status,
        correlation_id,
        failure_reason,
        created_at,
        processed_at,
    } = row;

    let data = PersistedMessageData {
        id: MessageId::from_uuid(id),
        from_agent: AgentName::new(from_agent)
            .map_err(MessageStoreError::invalid_persisted_data)?,
        to_agent: AgentName::new(to_agent).map_err(MessageStoreError::invalid_persisted_data)?,
        message_type,
        payload,
        priority: MessagePriority::try_from(priority.as_str())
            .map_err(MessageStoreError::invalid_persisted_data)?,
        status: DeliveryStatus::try_from(status.as_str())
            .map_err(MessageStoreError::invalid_persisted_data)?,
        correlation_id: CorrelationId::new(correlation_id)
            .map_err(MessageStoreError::invalid_persisted_data)?,
        failure_reason,
        created_at,
        processed_at,
    };
    Ok(InterAgentMessage::from_persisted(data))
}
