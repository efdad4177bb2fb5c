//! Kafka adapter. Topics are Kafka topics; `PubSubOptions::queue_group` maps
//! to a consumer group id, `ignore_prefix` to skipping the configured topic
//! prefix.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chassis_core::registry::Driver;
use chassis_core::serializer::Serializer;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};

use crate::driver::{DriverState, Handler, PubSubDriver, PubSubError};
use crate::options::PubSubOptions;

/// Producer-side configuration: `acks`/`idempotence`/retry knobs.
#[derive(Debug, Clone)]
pub struct KafkaProducerConfig {
    pub brokers: String,
    pub acks: &'static str,
    pub idempotence: bool,
    pub message_timeout: Duration,
}

impl Default for KafkaProducerConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            acks: "all",
            idempotence: true,
            message_timeout: Duration::from_secs(5),
        }
    }
}

pub struct KafkaPubSub {
    state: DriverState,
    producer: FutureProducer,
    brokers: String,
}

impl KafkaPubSub {
    pub fn new(config: KafkaProducerConfig) -> Result<Self, PubSubError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("acks", config.acks)
            .set("enable.idempotence", config.idempotence.to_string())
            .set("message.timeout.ms", config.message_timeout.as_millis().to_string())
            .create()
            .map_err(|err| PubSubError::Publish { topic: String::new(), reason: err.to_string() })?;

        Ok(Self { state: DriverState::default(), producer, brokers: config.brokers })
    }
}

impl Driver for KafkaPubSub {
    fn name(&self) -> &str {
        "kafka"
    }
}

#[async_trait]
impl PubSubDriver for KafkaPubSub {
    fn set_prefix(&self, prefix: &str) {
        self.state.set_prefix(prefix);
    }

    fn serializer(&self) -> Arc<dyn Serializer> {
        self.state.serializer()
    }

    fn set_serializer(&self, serializer: Arc<dyn Serializer>) {
        self.state.set_serializer(serializer);
    }

    async fn subscribe(
        &self,
        topic: &str,
        handler: Handler,
        opts: PubSubOptions,
    ) -> Result<(), PubSubError> {
        let subject = self.state.prefixed_topic(topic, opts.ignore_prefix);
        let group = opts.queue_group.unwrap_or_else(|| "chassis".to_string());

        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .set("group.id", &group)
            .set("enable.auto.commit", "true")
            .create()
            .map_err(|err| PubSubError::Subscribe { topic: subject.clone(), reason: err.to_string() })?;

        consumer
            .subscribe(&[subject.as_str()])
            .map_err(|err| PubSubError::Subscribe { topic: subject.clone(), reason: err.to_string() })?;

        tokio::spawn(async move {
            loop {
                match consumer.recv().await {
                    Ok(message) => {
                        if let Some(payload) = message.payload() {
                            handler(payload);
                        }
                    }
                    Err(err) => tracing::warn!(error = %err, "kafka consumer recv failed"),
                }
            }
        });

        Ok(())
    }

    async fn publish_bytes(
        &self,
        topic: &str,
        bytes: &[u8],
        opts: PubSubOptions,
    ) -> Result<(), PubSubError> {
        let subject = self.state.prefixed_topic(topic, opts.ignore_prefix);
        let record = FutureRecord::<(), [u8]>::to(&subject).payload(bytes);

        self.producer
            .send(record, Duration::from_secs(5))
            .await
            .map_err(|(err, _)| PubSubError::Publish { topic: subject, reason: err.to_string() })?;

        Ok(())
    }
}
