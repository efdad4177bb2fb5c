//! In-process memo driver over a lock-free concurrent map, with a
//! background janitor sweeping expired entries. Expired-but-not-yet-swept
//! entries are invisible to reads regardless of janitor timing; `replace`
//! no-ops on an absent or expired key.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chassis_core::registry::Driver;
use chassis_core::serializer::Serializer;
use dashmap::DashMap;

use crate::driver::{DriverState, MemoDriver, MemoError};
use crate::options::MemoOptions;

const DEFAULT_JANITOR_INTERVAL: Duration = Duration::from_secs(60);
const MIN_JANITOR_INTERVAL: Duration = Duration::from_secs(1);

struct Entry {
    bytes: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

pub struct MemoryMemo {
    state: DriverState,
    entries: Arc<DashMap<String, Entry>>,
    janitor: tokio::task::JoinHandle<()>,
}

impl MemoryMemo {
    pub fn new() -> Self {
        Self::with_janitor_interval(DEFAULT_JANITOR_INTERVAL)
    }

    /// `interval` is clamped to at least one second.
    pub fn with_janitor_interval(interval: Duration) -> Self {
        let interval = interval.max(MIN_JANITOR_INTERVAL);
        let entries: Arc<DashMap<String, Entry>> = Arc::new(DashMap::new());

        let sweep_entries = entries.clone();
        let janitor = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                sweep_entries.retain(|_, entry| !entry.is_expired());
            }
        });

        Self { state: DriverState::default(), entries, janitor }
    }
}

impl Drop for MemoryMemo {
    fn drop(&mut self) {
        self.janitor.abort();
    }
}

impl Default for MemoryMemo {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for MemoryMemo {
    fn name(&self) -> &str {
        "memory"
    }
}

#[async_trait]
impl MemoDriver for MemoryMemo {
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
        let expires_at = opts.ttl.map(|ttl| Instant::now() + ttl);
        self.entries.insert(key, Entry { bytes, expires_at });
        Ok(())
    }

    async fn get_raw(&self, key: &str, opts: MemoOptions) -> Result<Option<Vec<u8>>, MemoError> {
        let key = self.state.namespaced_key(key, opts.bucket.as_deref());
        Ok(self
            .entries
            .get(&key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.bytes.clone()))
    }

    async fn get_raw_with_expiration(
        &self,
        key: &str,
        opts: MemoOptions,
    ) -> Result<Option<(Vec<u8>, Option<Duration>)>, MemoError> {
        let key = self.state.namespaced_key(key, opts.bucket.as_deref());
        Ok(self.entries.get(&key).filter(|entry| !entry.is_expired()).map(|entry| {
            let remaining = entry.expires_at.map(|at| at.saturating_duration_since(Instant::now()));
            (entry.bytes.clone(), remaining)
        }))
    }

    async fn replace(&self, key: &str, bytes: Vec<u8>, opts: MemoOptions) -> Result<bool, MemoError> {
        let key = self.state.namespaced_key(key, opts.bucket.as_deref());
        match self.entries.get_mut(&key) {
            Some(mut entry) if !entry.is_expired() => {
                let expires_at = opts.ttl.map(|ttl| Instant::now() + ttl).or(entry.expires_at);
                *entry = Entry { bytes, expires_at };
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn increment(&self, key: &str, delta: i64, opts: MemoOptions) -> Result<i64, MemoError> {
        let key = self.state.namespaced_key(key, opts.bucket.as_deref());

        let current = self
            .entries
            .get(&key)
            .filter(|entry| !entry.is_expired())
            .and_then(|entry| std::str::from_utf8(&entry.bytes).ok().and_then(|s| s.parse::<i64>().ok()));

        let next = match current {
            Some(value) => value + delta,
            None => 1,
        };

        self.entries.insert(key, Entry { bytes: next.to_string().into_bytes(), expires_at: None });
        Ok(next)
    }

    async fn delete(&self, key: &str, opts: MemoOptions) -> Result<(), MemoError> {
        let key = self.state.namespaced_key(key, opts.bucket.as_deref());
        self.entries.remove(&key);
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration, opts: MemoOptions) -> Result<(), MemoError> {
        let key = self.state.namespaced_key(key, opts.bucket.as_deref());
        if let Some(mut entry) = self.entries.get_mut(&key) {
            entry.expires_at = Some(Instant::now() + ttl);
        }
        Ok(())
    }

    async fn item_count(&self) -> Result<u64, MemoError> {
        Ok(self.entries.iter().filter(|entry| !entry.is_expired()).count() as u64)
    }

    async fn flush(&self) -> Result<(), MemoError> {
        self.entries.clear();
        Ok(())
    }
}
