//! Operator-initiated full refresh: pub/sub delivery and the latched flag.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Topic carrying force-refresh requests.
pub const FULL_UPDATE_TOPIC: &str = "hms-full-update";

/// Callback capability for pub/sub delivery.
pub trait Subscriber: Send + Sync {
    fn on_message(&self, topic: &str, body: &str);
}

/// Minimal in-process topic registry.
///
/// Handlers that accept operator requests publish here; the follower's
/// refresh signal is the only built-in subscriber.
#[derive(Default)]
pub struct PubSub {
    topics: Mutex<BTreeMap<String, Vec<Arc<dyn Subscriber>>>>,
}

impl PubSub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, topic: &str, subscriber: Arc<dyn Subscriber>) {
        self.topics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(topic.to_string())
            .or_default()
            .push(subscriber);
    }

    /// Deliver `body` to every subscriber of `topic`. Returns how many
    /// subscribers were notified.
    pub fn publish(&self, topic: &str, body: &str) -> usize {
        let subscribers: Vec<Arc<dyn Subscriber>> = {
            let topics = self
                .topics
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            topics.get(topic).cloned().unwrap_or_default()
        };
        for subscriber in &subscribers {
            subscriber.on_message(topic, body);
        }
        subscribers.len()
    }
}

/// One-shot latched request for a full metastore snapshot.
///
/// Set through pub/sub, consumed by the follower via `test_and_clear` once
/// per tick, so one published request produces exactly one snapshot.
#[derive(Default)]
pub struct RefreshSignal {
    requested: AtomicBool,
}

impl RefreshSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    /// Consume the latched request. Only one caller observes `true` per
    /// request.
    pub fn test_and_clear(&self) -> bool {
        self.requested
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

impl Subscriber for RefreshSignal {
    fn on_message(&self, topic: &str, body: &str) {
        assert_eq!(
            topic, FULL_UPDATE_TOPIC,
            "refresh signal received message for unexpected topic {topic}"
        );
        tracing::info!("full update trigger: received [{topic}, {body}] notification");
        self.request();
    }
}
