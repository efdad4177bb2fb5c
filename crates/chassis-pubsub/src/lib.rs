//! Pluggable pub/sub driver contract shared across backends: topic
//! prefixing, a swappable wire serializer, and subscribe/publish with
//! queue-group load balancing.

pub mod driver;
pub mod kafka;
pub mod memory;
pub mod nats;
pub mod options;

pub use driver::{Handler, PubSubDriver, PubSubError};
pub use kafka::{KafkaProducerConfig, KafkaPubSub};
pub use memory::MemoryPubSub;
pub use nats::NatsPubSub;
pub use options::PubSubOptions;
