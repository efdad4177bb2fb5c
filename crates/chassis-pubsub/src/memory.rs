//! In-process pub/sub driver: plain `Vec`-of-handlers fan-out under a
//! snapshot-then-release read lock — the handler lock is never held during
//! handler invocation. Queue groups load-balance round-robin across their
//! member handlers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chassis_core::registry::Driver;
use chassis_core::serializer::Serializer;
use parking_lot::RwLock;

use crate::driver::{DriverState, Handler, PubSubDriver, PubSubError};
use crate::options::PubSubOptions;

struct QueueGroup {
    handlers: Vec<Handler>,
    next: AtomicUsize,
}

#[derive(Default)]
struct Subscriptions {
    /// Plain subscribers: every handler observes every publish.
    fanout: HashMap<String, Vec<Handler>>,
    /// Queue-group subscribers: exactly one member observes each publish.
    groups: HashMap<String, HashMap<String, QueueGroup>>,
}

pub struct MemoryPubSub {
    state: DriverState,
    subs: RwLock<Subscriptions>,
}

impl Default for MemoryPubSub {
    fn default() -> Self {
        Self { state: DriverState::default(), subs: RwLock::new(Subscriptions::default()) }
    }
}

impl MemoryPubSub {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Driver for MemoryPubSub {
    fn name(&self) -> &str {
        "memory"
    }
}

#[async_trait]
impl PubSubDriver for MemoryPubSub {
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
        let topic = self.state.prefixed_topic(topic, opts.ignore_prefix);
        let mut subs = self.subs.write();

        match opts.queue_group {
            Some(group) => {
                let topic_groups = subs.groups.entry(topic).or_default();
                topic_groups
                    .entry(group)
                    .or_insert_with(|| QueueGroup { handlers: Vec::new(), next: AtomicUsize::new(0) })
                    .handlers
                    .push(handler);
            }
            None => {
                subs.fanout.entry(topic).or_default().push(handler);
            }
        }

        Ok(())
    }

    async fn publish_bytes(
        &self,
        topic: &str,
        bytes: &[u8],
        opts: PubSubOptions,
    ) -> Result<(), PubSubError> {
        let topic = self.state.prefixed_topic(topic, opts.ignore_prefix);

        // Snapshot under the read lock, then release before invoking
        // handlers — a slow handler must never block other subscribers or
        // publishers.
        let (fanout, group_picks): (Vec<Handler>, Vec<Handler>) = {
            let subs = self.subs.read();
            let fanout = subs.fanout.get(&topic).cloned().unwrap_or_default();

            let group_picks = subs
                .groups
                .get(&topic)
                .map(|groups| {
                    groups
                        .values()
                        .filter_map(|group| {
                            if group.handlers.is_empty() {
                                return None;
                            }
                            let idx = group.next.fetch_add(1, Ordering::Relaxed) % group.handlers.len();
                            Some(group.handlers[idx].clone())
                        })
                        .collect()
                })
                .unwrap_or_default();

            (fanout, group_picks)
        };

        // Each handler runs on its own task, concurrently with the rest, so
        // one slow handler can never delay another.
        let payload: Arc<[u8]> = Arc::from(bytes);
        let tasks: Vec<_> = fanout
            .into_iter()
            .chain(group_picks)
            .map(|handler| {
                let payload = payload.clone();
                tokio::spawn(async move { handler(&payload) })
            })
            .collect();

        for result in futures_util::future::join_all(tasks).await {
            if let Err(err) = result {
                tracing::error!(error = %err, "in-process pub/sub handler task panicked");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize as Counter;
    use std::sync::Mutex;

    #[tokio::test]
    async fn two_subscribers_both_observe_one_publish() {
        let bus = MemoryPubSub::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for _ in 0..2 {
            let seen = seen.clone();
            bus.subscribe(
                "t",
                Arc::new(move |bytes: &[u8]| seen.lock().unwrap().push(bytes.to_vec())),
                PubSubOptions::default(),
            )
            .await
            .unwrap();
        }

        bus.publish_bytes("t", b"x", PubSubOptions::default()).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|b| b == b"x"));
    }

    #[tokio::test]
    async fn queue_group_load_balances_round_robin() {
        let bus = MemoryPubSub::new();
        let counts = Arc::new([Counter::new(0), Counter::new(0)]);

        for i in 0..2 {
            let counts = counts.clone();
            bus.subscribe(
                "jobs",
                Arc::new(move |_| {
                    counts[i].fetch_add(1, Ordering::SeqCst);
                }),
                PubSubOptions::new().queue_group("workers"),
            )
            .await
            .unwrap();
        }

        for _ in 0..4 {
            bus.publish_bytes("jobs", b"x", PubSubOptions::default()).await.unwrap();
        }

        assert_eq!(counts[0].load(Ordering::SeqCst), 2);
        assert_eq!(counts[1].load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn prefix_applied_exactly_once() {
        let bus = MemoryPubSub::new();
        bus.set_prefix("app.");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        bus.subscribe(
            "app.events",
            Arc::new(move |b: &[u8]| seen_clone.lock().unwrap().push(b.to_vec())),
            PubSubOptions::default(),
        )
        .await
        .unwrap();

        bus.publish_bytes("events", b"x", PubSubOptions::default()).await.unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);

        bus.publish_bytes("app.events", b"y", PubSubOptions::default()).await.unwrap();
        assert_eq!(seen.lock().unwrap().len(), 2);
    }
}
