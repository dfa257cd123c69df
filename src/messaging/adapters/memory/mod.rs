//! In-memory messaging adapters for tests and single-process meshes.

mod loopback;
mod message_repository;
mod pubsub;

pub use loopback::LoopbackTransport;
pub use message_repository::InMemoryMessageRepository;
pub use pubsub::{DEFAULT_CHANNEL_CAPACITY, InMemoryPubSub};
