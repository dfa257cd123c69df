//! Port contracts for message persistence and the two transports.
//!
//! Direct delivery and broadcast deliberately use separate ports: only the
//! former reports whether a receiver acted.

pub mod pubsub;
pub mod repository;
pub mod transport;

pub use pubsub::{ChannelReceiver, PubSubError, PubSubResult, PubSubTransport};
pub use repository::{MessageRepository, MessageStoreError, MessageStoreResult};
pub use transport::{PeerEndpoint, PeerRequest, PeerResponse, PeerTransport, TransportError};
