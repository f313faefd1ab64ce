//! Notification fetching with short-term re-delivery suppression.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use crate::core::{ClientError, EventId, HmsEvent};

use super::MetastoreClient;

/// Outcome of one fetch pass, shaped so the follower loop is a flat match.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Events strictly after the requested position, ascending by id, with
    /// recently observed ids suppressed.
    Events(Vec<HmsEvent>),
    /// The upstream truncated past our position; only a snapshot recovers.
    NeedsSnapshot,
    /// The transport failed; the connection should be torn down.
    Transport(ClientError),
}

/// Bounded FIFO of recently observed event ids.
///
/// The upstream sometimes re-delivers events it already handed out; ids
/// remembered here are dropped from fetch results. Eviction is oldest
/// first.
struct DedupCache {
    order: VecDeque<EventId>,
    seen: HashSet<EventId>,
    capacity: usize,
}

impl DedupCache {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    fn insert(&mut self, id: EventId) {
        if !self.seen.insert(id) {
            return;
        }
        self.order.push_back(id);
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
    }

    fn contains(&self, id: EventId) -> bool {
        self.seen.contains(&id)
    }

    fn clear(&mut self) {
        self.order.clear();
        self.seen.clear();
    }
}

/// Wraps the metastore client with ordering and dedup.
pub struct NotificationFetcher {
    client: Arc<dyn MetastoreClient>,
    cache: DedupCache,
}

impl NotificationFetcher {
    pub fn new(client: Arc<dyn MetastoreClient>, cache_size: usize) -> Self {
        Self {
            client,
            cache: DedupCache::new(cache_size),
        }
    }

    /// The upstream's current maximum event id.
    pub fn current_id(&self) -> Result<EventId, ClientError> {
        self.client.current_notification_id()
    }

    /// Fetch events strictly after `after`, sorted ascending, suppressing
    /// ids already observed.
    pub fn fetch_after(&mut self, after: EventId) -> FetchOutcome {
        let mut events = match self.client.fetch_notifications(after) {
            Ok(events) => events,
            Err(ClientError::OutOfSync { after }) => {
                tracing::warn!("metastore log no longer retains events after {after}");
                return FetchOutcome::NeedsSnapshot;
            }
            Err(err) => return FetchOutcome::Transport(err),
        };

        events.sort_by_key(|event| event.id);
        let mut batch_ids = HashSet::new();
        events.retain(|event| {
            event.id > after && !self.cache.contains(event.id) && batch_ids.insert(event.id)
        });
        FetchOutcome::Events(events)
    }

    /// Remember an event as observed so near-future fetches suppress it.
    pub fn update_cache(&mut self, event: &HmsEvent) {
        self.cache.insert(event.id);
    }

    /// Drop all remembered ids. Called on follower shutdown.
    pub fn close(&mut self) {
        self.cache.clear();
    }
}
