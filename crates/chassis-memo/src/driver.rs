//! KV memo driver contract, unifying the historical `memo`/`cache` split
//! into one trait: a cache-shaped async trait over a concurrent map,
//! registered through [`chassis_core::registry::Driver`] the same way
//! pub/sub drivers are.

use std::sync::Arc;

use async_trait::async_trait;
use chassis_core::registry::Driver;
use chassis_core::serializer::{JsonSerializer, Serializer};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::options::MemoOptions;

#[derive(Debug, thiserror::Error)]
pub enum MemoError {
    #[error("serialization failed: {0}")]
    Serialize(#[from] chassis_core::serializer::SerializeError),
    #[error("operation '{op}' is unsupported by driver '{driver}'")]
    Unsupported { driver: String, op: &'static str },
    #[error("backend error: {0}")]
    Backend(String),
}

/// Shared prefix/serializer state every [`MemoDriver`] implementation holds.
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

    /// Applies bucket-then-prefix composition exactly once:
    /// `prefix + bucket + ":" + key`, bucket segment omitted when absent.
    pub fn namespaced_key(&self, key: &str, bucket: Option<&str>) -> String {
        let prefix = self.prefix.read();
        match bucket {
            Some(bucket) => format!("{prefix}{bucket}:{key}"),
            None => format!("{prefix}{key}"),
        }
    }

    pub fn set_serializer(&self, serializer: Arc<dyn Serializer>) {
        *self.serializer.write() = serializer;
    }

    pub fn serializer(&self) -> Arc<dyn Serializer> {
        self.serializer.read().clone()
    }
}

#[async_trait]
pub trait MemoDriver: Driver {
    fn set_prefix(&self, prefix: &str);
    fn serializer(&self) -> Arc<dyn Serializer>;
    fn set_serializer(&self, serializer: Arc<dyn Serializer>);

    async fn set_raw(&self, key: &str, bytes: Vec<u8>, opts: MemoOptions) -> Result<(), MemoError>;
    async fn get_raw(&self, key: &str, opts: MemoOptions) -> Result<Option<Vec<u8>>, MemoError>;
    async fn get_raw_with_expiration(
        &self,
        key: &str,
        opts: MemoOptions,
    ) -> Result<Option<(Vec<u8>, Option<std::time::Duration>)>, MemoError>;

    /// No-ops on an absent or already-expired key; overwrites only an
    /// existing, live entry.
    async fn replace(&self, key: &str, bytes: Vec<u8>, opts: MemoOptions) -> Result<bool, MemoError>;

    async fn increment(&self, key: &str, delta: i64, opts: MemoOptions) -> Result<i64, MemoError>;
    async fn decrement(&self, key: &str, delta: i64, opts: MemoOptions) -> Result<i64, MemoError> {
        self.increment(key, -delta, opts).await
    }

    async fn delete(&self, key: &str, opts: MemoOptions) -> Result<(), MemoError>;
    async fn expire(&self, key: &str, ttl: std::time::Duration, opts: MemoOptions) -> Result<(), MemoError>;
    async fn item_count(&self) -> Result<u64, MemoError>;
    async fn flush(&self) -> Result<(), MemoError>;

    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        opts: MemoOptions,
    ) -> Result<(), MemoError>
    where
        Self: Sized,
    {
        let bytes = chassis_core::serializer::marshal(self.serializer().as_ref(), value)?;
        self.set_raw(key, bytes, opts).await
    }

    async fn get<T: DeserializeOwned>(&self, key: &str, opts: MemoOptions) -> Result<Option<T>, MemoError>
    where
        Self: Sized,
    {
        match self.get_raw(key, opts).await? {
            Some(bytes) => Ok(Some(chassis_core::serializer::unmarshal(self.serializer().as_ref(), &bytes)?)),
            None => Ok(None),
        }
    }
}
