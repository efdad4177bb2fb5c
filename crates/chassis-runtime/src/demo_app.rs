//! A minimal `Application` wiring settings, pub/sub, and memo together, used
//! as the default process behavior and as an end-to-end demonstration of the
//! three-phase register/router/when_ready pattern.

use std::sync::Arc;

use async_trait::async_trait;
use chassis_core::lifecycle::{Application, BoxError, Extensible, Priority};
use chassis_memo::{MemoDriver, MemoryMemo};
use chassis_pubsub::{MemoryPubSub, PubSubDriver, PubSubOptions};
use chassis_settings::Store;

pub struct DemoApplication {
    settings: Arc<Store>,
    pubsub: Arc<MemoryPubSub>,
    memo: Arc<MemoryMemo>,
}

impl DemoApplication {
    pub fn new(settings: Arc<Store>, pubsub: Arc<MemoryPubSub>, memo: Arc<MemoryMemo>) -> Self {
        Self { settings, pubsub, memo }
    }
}

#[async_trait]
impl Application for DemoApplication {
    fn name(&self) -> &str {
        "demo"
    }

    fn priority(&self) -> Priority {
        Priority::NORMAL
    }

    async fn register(&self) -> Result<(), BoxError> {
        tracing::info!(
            test_mode = self.settings.get("settings.test_mode").as_bool(),
            "demo application registering"
        );
        self.memo
            .set_raw("boot.count", b"1".to_vec(), chassis_memo::MemoOptions::new())
            .await
            .map_err(|err| Box::new(err) as BoxError)?;
        Ok(())
    }

    async fn router(&self) -> Result<(), BoxError> {
        let handler: chassis_pubsub::Handler = Arc::new(|bytes: &[u8]| {
            tracing::debug!(bytes = ?bytes, "demo application received message");
        });
        self.pubsub
            .subscribe("chassis.demo", handler, PubSubOptions::default())
            .await
            .map_err(|err| Box::new(err) as BoxError)?;
        Ok(())
    }

    async fn when_ready(&self) -> Result<(), BoxError> {
        self.pubsub
            .publish_bytes("chassis.demo", b"ready", PubSubOptions::default())
            .await
            .map_err(|err| Box::new(err) as BoxError)?;
        Ok(())
    }

    fn as_extensible(&self) -> Option<&dyn Extensible> {
        Some(self)
    }
}

impl Extensible for DemoApplication {
    fn extensions(&self) -> Vec<Box<dyn Fn() + Send + Sync>> {
        vec![Box::new(|| tracing::debug!("demo application extension ran after register"))]
    }
}
