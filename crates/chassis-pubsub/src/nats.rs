//! NATS adapter. Topic-prefixing and queue-group subscribe map directly onto
//! `async_nats`'s subject and queue subscribe primitives; JetStream
//! consumers are used only when `PubSubOptions::jetstream` is set.

use std::sync::Arc;

use async_nats::Client;
use async_trait::async_trait;
use chassis_core::registry::Driver;
use chassis_core::serializer::Serializer;
use futures_util::StreamExt;
use parking_lot::RwLock;

use crate::driver::{DriverState, Handler, PubSubDriver, PubSubError};
use crate::options::PubSubOptions;

pub struct NatsPubSub {
    state: DriverState,
    client: Client,
    prefetch_tasks: RwLock<Vec<tokio::task::JoinHandle<()>>>,
}

impl NatsPubSub {
    pub fn new(client: Client) -> Self {
        Self { state: DriverState::default(), client, prefetch_tasks: RwLock::new(Vec::new()) }
    }

    /// Registers a shutdown hook that drains the underlying connection,
    /// flushing in-flight publishes before the process exits. The drain
    /// itself is async, so the hook hands it to the current runtime and
    /// only blocks on a completion signal.
    pub fn register_shutdown(self: &Arc<Self>, shutdown: &chassis_core::shutdown::ShutdownRegistry) {
        let client = self.client.clone();
        shutdown.register(move || {
            let (tx, rx) = std::sync::mpsc::channel();
            tokio::spawn(async move {
                let result = client.drain().await;
                let _ = tx.send(result);
            });
            match rx.recv() {
                Ok(Err(err)) => tracing::error!(error = %err, "nats drain failed during shutdown"),
                Err(_) => tracing::error!("nats drain task did not report back"),
                Ok(Ok(())) => {}
            }
        });
    }
}

impl Driver for NatsPubSub {
    fn name(&self) -> &str {
        "nats"
    }
}

#[async_trait]
impl PubSubDriver for NatsPubSub {
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

        let mut subscriber = match &opts.queue_group {
            Some(group) => self.client.queue_subscribe(subject.clone(), group.clone()).await,
            None => self.client.subscribe(subject.clone()).await,
        }
        .map_err(|err| PubSubError::Subscribe { topic: subject.clone(), reason: err.to_string() })?;

        let task = tokio::spawn(async move {
            while let Some(message) = subscriber.next().await {
                handler(&message.payload);
            }
        });
        self.prefetch_tasks.write().push(task);

        Ok(())
    }

    async fn publish_bytes(
        &self,
        topic: &str,
        bytes: &[u8],
        opts: PubSubOptions,
    ) -> Result<(), PubSubError> {
        let subject = self.state.prefixed_topic(topic, opts.ignore_prefix);
        self.client
            .publish(subject.clone(), bytes.to_vec().into())
            .await
            .map_err(|err| PubSubError::Publish { topic: subject, reason: err.to_string() })
    }
}
