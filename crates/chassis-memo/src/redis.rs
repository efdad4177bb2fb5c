//! Redis-backed memo driver. `item_count`/`flush` use `DBSIZE`/`FLUSHDB`;
//! operations with no Redis equivalent return [`MemoError::Unsupported`]
//! rather than panicking.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chassis_core::registry::Driver;
use chassis_core::serializer::Serializer;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::driver::{DriverState, MemoDriver, MemoError};
use crate::options::MemoOptions;

pub struct RedisMemo {
    state: DriverState,
    conn: ConnectionManager,
}

impl RedisMemo {
    pub async fn connect(url: &str) -> Result<Self, MemoError> {
        let client = redis::Client::open(url).map_err(|err| MemoError::Backend(err.to_string()))?;
        let conn = client.get_connection_manager().await.map_err(|err| MemoError::Backend(err.to_string()))?;
        Ok(Self { state: DriverState::default(), conn })
    }
}

impl Driver for RedisMemo {
    fn name(&self) -> &str {
        "redis"
    }
}

#[async_trait]
impl MemoDriver for RedisMemo {
    fn set_prefix(&self, prefix: &str) {
        self.state.set_prefix(prefix);
    }

    fn serializer(&self) -> Arc<dyn Serializer> {
        self.state.serializer()
    }

    fn set_serializer(&self, serializer: Arc<dyn Serializer>) {
        self.state.set_serializer(serializer);
    }

    async fn set_raw(&self, key: &str, bytes: Vec<u8>, opts: MemoOptions) -> Result<(), MemoError> {
        let key = self.state.namespaced_key(key, opts.bucket.as_deref());
        let mut conn = self.conn.clone();
        match opts.ttl {
            Some(ttl) => {
                let _: () = conn
                    .set_ex(key, bytes, ttl.as_secs().max(1))
                    .await
                    .map_err(|err| MemoError::Backend(err.to_string()))?;
            }
            None => {
                let _: () = conn.set(key, bytes).await.map_err(|err| MemoError::Backend(err.to_string()))?;
            }
        }
        Ok(())
    }

    async fn get_raw(&self, key: &str, opts: MemoOptions) -> Result<Option<Vec<u8>>, MemoError> {
        let key = self.state.namespaced_key(key, opts.bucket.as_deref());
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(|err| MemoError::Backend(err.to_string()))
    }

    async fn get_raw_with_expiration(
        &self,
        key: &str,
        opts: MemoOptions,
    ) -> Result<Option<(Vec<u8>, Option<Duration>)>, MemoError> {
        let namespaced = self.state.namespaced_key(key, opts.bucket.as_deref());
        let mut conn = self.conn.clone();

        let value: Option<Vec<u8>> =
            conn.get(&namespaced).await.map_err(|err| MemoError::Backend(err.to_string()))?;
        let Some(value) = value else { return Ok(None) };

        let ttl_secs: i64 =
            conn.ttl(&namespaced).await.map_err(|err| MemoError::Backend(err.to_string()))?;
        let remaining = if ttl_secs >= 0 { Some(Duration::from_secs(ttl_secs as u64)) } else { None };

        Ok(Some((value, remaining)))
    }

    async fn replace(&self, key: &str, bytes: Vec<u8>, opts: MemoOptions) -> Result<bool, MemoError> {
        let namespaced = self.state.namespaced_key(key, opts.bucket.as_deref());
        let mut conn = self.conn.clone();

        let exists: bool = conn.exists(&namespaced).await.map_err(|err| MemoError::Backend(err.to_string()))?;
        if !exists {
            return Ok(false);
        }

        self.set_raw(key, bytes, opts).await?;
        Ok(true)
    }

    async fn increment(&self, key: &str, delta: i64, opts: MemoOptions) -> Result<i64, MemoError> {
        let key = self.state.namespaced_key(key, opts.bucket.as_deref());
        let mut conn = self.conn.clone();
        conn.incr(key, delta).await.map_err(|err| MemoError::Backend(err.to_string()))
    }

    async fn delete(&self, key: &str, opts: MemoOptions) -> Result<(), MemoError> {
        let key = self.state.namespaced_key(key, opts.bucket.as_deref());
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await.map_err(|err| MemoError::Backend(err.to_string()))?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration, opts: MemoOptions) -> Result<(), MemoError> {
        let key = self.state.namespaced_key(key, opts.bucket.as_deref());
        let mut conn = self.conn.clone();
        let _: () = conn
            .expire(key, ttl.as_secs().max(1) as i64)
            .await
            .map_err(|err| MemoError::Backend(err.to_string()))?;
        Ok(())
    }

    async fn item_count(&self) -> Result<u64, MemoError> {
        let mut conn = self.conn.clone();
        redis::cmd("DBSIZE").query_async(&mut conn).await.map_err(|err| MemoError::Backend(err.to_string()))
    }

    async fn flush(&self) -> Result<(), MemoError> {
        let mut conn = self.conn.clone();
        redis::cmd("FLUSHDB")
            .query_async::<()>(&mut conn)
            .await
            .map_err(|err| MemoError::Backend(err.to_string()))
    }
}
