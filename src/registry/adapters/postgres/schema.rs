//! Diesel schema for agent registry persistence.

diesel::table! {
    /// Agent registry records, one row per logical agent.
    agents (name) {
        /// Unique agent name.
        #[max_length = 50]
        name -> Varchar,
        /// Category tag.
        #[max_length = 50]
        agent_type -> Varchar,
        /// Operating status (online, offline, error or maintenance).
        #[max_length = 20]
        status -> Varchar,
        /// Deployed version string.
        #[max_length = 20]
        version -> Varchar,
        /// Listening port.
        port -> Nullable<Int4>,
        /// Free-form description.
        description -> Nullable<Text>,
        /// Base URL of the agent's HTTP surface.
        base_url -> Nullable<Text>,
        /// Explicit liveness endpoint.
        health_check_url -> Nullable<Text>,
        /// Capability set as a JSONB array.
        capabilities -> Jsonb,
        /// Ordered dependency names as a JSONB array.
        dependencies -> Jsonb,
        /// Attributes outside the known schema as a JSONB object.
        attributes -> Jsonb,
        /// Last heartbeat timestamp.
        last_heartbeat -> Timestamptz,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
