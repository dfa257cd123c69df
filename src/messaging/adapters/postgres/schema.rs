//! Diesel schema for direct message persistence.

diesel::table! {
    /// Direct inter-agent message records.
    inter_agent_messages (id) {
        /// Internal message identifier.
        id -> Uuid,
        /// Sending agent name.
        #[max_length = 50]
        from_agent -> Varchar,
        /// Receiving agent name.
        #[max_length = 50]
        to_agent -> Varchar,
        /// Receiver-defined message kind.
        #[max_length = 30]
        message_type -> Varchar,
        /// Message body as JSONB.
        payload -> Jsonb,
        /// Sender-assigned priority.
        #[max_length = 10]
        priority -> Varchar,
        /// Delivery status (pending, delivered or failed).
        #[max_length = 20]
        status -> Varchar,
        /// Request correlation token.
        #[max_length = 100]
        correlation_id -> Varchar,
        /// Failure cause for failed deliveries.
        failure_reason -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Delivery acknowledgement timestamp.
        processed_at -> Nullable<Timestamptz>,
    }
}
