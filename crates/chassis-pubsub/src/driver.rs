//! Pub/sub driver contract, unifying in-process fan-out with NATS and Kafka
//! backends behind one trait, registered through
//! [`chassis_core::registry::Driver`].

use std::sync::Arc;

use async_trait::async_trait;
use chassis_core::registry::Driver;
use chassis_core::serializer::{JsonSerializer, Serializer};
use parking_lot::RwLock;
use serde::Serialize;

use crate::options::PubSubOptions;

#[derive(Debug, thiserror::Error)]
pub enum PubSubError {
    #[error("publish to '{topic}' failed: {reason}")]
    Publish { topic: String, reason: String },
    #[error("subscribe to '{topic}' failed: {reason}")]
    Subscribe { topic: String, reason: String },
    #[error("serialization failed: {0}")]
    Serialize(#[from] chassis_core::serializer::SerializeError),
    #[error("operation '{op}' is unsupported by driver '{driver}'")]
    Unsupported { driver: String, op: &'static str },
}

pub type Handler = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Common machinery every [`PubSubDriver`] implementation shares: a topic
/// prefix and a swappable wire serializer.
pub struct DriverState {
    prefix: RwLock<String>,
    serializer: RwLock<Arc<dyn Serializer>>,
}

impl Default for DriverState {
    fn default() -> Self {
        Self { prefix: RwLock::new(String::new()), serializer: RwLock::new(Arc::new(JsonSerializer)) }
    }
}

impl DriverState {
    pub fn set_prefix(&self, prefix: impl Into<String>) {
        *self.prefix.write() = prefix.into();
    }

    pub fn prefix(&self) -> String {
        self.prefix.read().clone()
    }

    /// Applies the topic prefix exactly once: a topic starting with the
    /// configured prefix is left untouched.
    pub fn prefixed_topic(&self, topic: &str, ignore_prefix: bool) -> String {
        if ignore_prefix {
            return topic.to_string();
        }
        let prefix = self.prefix();
        if prefix.is_empty() || topic.starts_with(&prefix) {
            topic.to_string()
        } else {
            format!("{prefix}{topic}")
        }
    }

    pub fn set_serializer(&self, serializer: Arc<dyn Serializer>) {
        *self.serializer.write() = serializer;
    }

    pub fn serializer(&self) -> Arc<dyn Serializer> {
        self.serializer.read().clone()
    }

    pub fn marshal<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, PubSubError> {
        Ok(chassis_core::serializer::marshal(self.serializer().as_ref(), value)?)
    }
}

#[async_trait]
pub trait PubSubDriver: Driver {
    fn set_prefix(&self, prefix: &str);
    fn serializer(&self) -> Arc<dyn Serializer>;
    fn set_serializer(&self, serializer: Arc<dyn Serializer>);

    async fn subscribe(
        &self,
        topic: &str,
        handler: Handler,
        opts: PubSubOptions,
    ) -> Result<(), PubSubError>;

    async fn publish_bytes(
        &self,
        topic: &str,
        bytes: &[u8],
        opts: PubSubOptions,
    ) -> Result<(), PubSubError>;

    async fn publish<T: Serialize + Send + Sync + 'static>(
        &self,
        topic: &str,
        value: &T,
        opts: PubSubOptions,
    ) -> Result<(), PubSubError>
    where
        Self: Sized,
    {
        let bytes = chassis_core::serializer::marshal(self.serializer().as_ref(), value)?;
        self.publish_bytes(topic, &bytes, opts).await
    }
}
