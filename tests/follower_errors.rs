//! Error dispositions: conflicts, persist failures, transport failures.

mod common;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use common::{RecordingStore, ScriptedClient, config, create_table, noop_event};
use permsync::{
    ClientError, CounterWait, EventId, Follower, HmsEvent, ImageId, PathsImage, PermissionStore,
    RefreshSignal, StoreError,
};

/// Store whose stream head is scripted per read and whose `apply_event`
/// always raises a conflict. Models bookkeeping moved by another actor.
struct ConflictStore {
    max_ids: Mutex<VecDeque<u64>>,
    current_max: Mutex<u64>,
    apply_calls: Mutex<Vec<u64>>,
    persist_calls: Mutex<Vec<u64>>,
    counter_wait: Arc<CounterWait>,
}

impl ConflictStore {
    fn new(max_ids: Vec<u64>) -> Arc<Self> {
        let mut ids: VecDeque<u64> = max_ids.into();
        let first = ids.pop_front().unwrap_or(0);
        Arc::new(Self {
            max_ids: Mutex::new(ids),
            current_max: Mutex::new(first),
            apply_calls: Mutex::new(Vec::new()),
            persist_calls: Mutex::new(Vec::new()),
            counter_wait: Arc::new(CounterWait::new()),
        })
    }

    fn apply_calls(&self) -> Vec<u64> {
        self.apply_calls.lock().expect("apply lock").clone()
    }

    fn persist_calls(&self) -> Vec<u64> {
        self.persist_calls.lock().expect("persist lock").clone()
    }
}

impl PermissionStore for ConflictStore {
    fn max_notification_id(&self) -> Result<EventId, StoreError> {
        let mut current = self.current_max.lock().expect("max lock");
        if let Some(next) = self.max_ids.lock().expect("ids lock").pop_front() {
            *current = next;
        }
        Ok(EventId::new(*current))
    }

    fn notifications_empty(&self) -> Result<bool, StoreError> {
        Ok(false)
    }

    fn paths_snapshot_empty(&self) -> Result<bool, StoreError> {
        Ok(false)
    }

    fn last_image_id(&self) -> Result<ImageId, StoreError> {
        Ok(ImageId::EMPTY)
    }

    fn persist_full_image(&self, _image: &PathsImage) -> Result<(), StoreError> {
        Ok(())
    }

    fn persist_last_processed_id(&self, id: EventId) -> Result<(), StoreError> {
        self.persist_calls
            .lock()
            .expect("persist lock")
            .push(id.get());
        Ok(())
    }

    fn apply_event(&self, event: &HmsEvent) -> Result<bool, StoreError> {
        self.apply_calls
            .lock()
            .expect("apply lock")
            .push(event.id.get());
        Err(StoreError::Conflict { id: event.id })
    }

    fn counter_wait(&self) -> Arc<CounterWait> {
        self.counter_wait.clone()
    }
}

/// Store that fails one scripted operation and otherwise looks healthy.
struct FailingStore {
    fail_max_read: bool,
    fail_noop_persist: bool,
    counter_wait: Arc<CounterWait>,
}

impl FailingStore {
    fn new(fail_max_read: bool, fail_noop_persist: bool) -> Arc<Self> {
        Arc::new(Self {
            fail_max_read,
            fail_noop_persist,
            counter_wait: Arc::new(CounterWait::new()),
        })
    }
}

impl PermissionStore for FailingStore {
    fn max_notification_id(&self) -> Result<EventId, StoreError> {
        if self.fail_max_read {
            return Err(StoreError::ReadFailed {
                reason: "connection pool exhausted".to_string(),
            });
        }
        Ok(EventId::new(20))
    }

    fn notifications_empty(&self) -> Result<bool, StoreError> {
        Ok(false)
    }

    fn paths_snapshot_empty(&self) -> Result<bool, StoreError> {
        Ok(false)
    }

    fn last_image_id(&self) -> Result<ImageId, StoreError> {
        Ok(ImageId::EMPTY)
    }

    fn persist_full_image(&self, _image: &PathsImage) -> Result<(), StoreError> {
        Ok(())
    }

    fn persist_last_processed_id(&self, _id: EventId) -> Result<(), StoreError> {
        if self.fail_noop_persist {
            return Err(StoreError::WriteFailed {
                reason: "disk full".to_string(),
            });
        }
        Ok(())
    }

    fn apply_event(&self, _event: &HmsEvent) -> Result<bool, StoreError> {
        Ok(false)
    }

    fn counter_wait(&self) -> Arc<CounterWait> {
        self.counter_wait.clone()
    }
}

#[test]
fn conflict_on_durable_event_stops_the_batch() {
    // The head reads 90 at tick start and 100 on the conflict re-check:
    // event 95 is already durable, so the batch must stop.
    let store = ConflictStore::new(vec![90, 100]);
    let client = ScriptedClient::new();
    client.set_current_id(96);
    client.push_fetch(Ok(vec![create_table(95, "a"), create_table(96, "b")]));
    let mut follower = Follower::new(
        &config(false),
        store.clone(),
        client.clone(),
        None,
        Arc::new(RefreshSignal::new()),
    );

    follower.tick();

    assert_eq!(store.apply_calls(), vec![95]);
    assert!(store.persist_calls().is_empty());
    // No wake-up happened for the conflicting event.
    assert_eq!(store.counter_wait().value(), EventId::new(90));
}

#[test]
fn conflict_on_newer_event_continues_and_advances() {
    // The re-check still reads 90: the conflicting id is newer than the
    // head, so processing continues and the id is persisted as a no-op.
    let store = ConflictStore::new(vec![90]);
    let client = ScriptedClient::new();
    client.set_current_id(95);
    client.push_fetch(Ok(vec![create_table(95, "a")]));
    let mut follower = Follower::new(
        &config(false),
        store.clone(),
        client.clone(),
        None,
        Arc::new(RefreshSignal::new()),
    );

    follower.tick();

    assert_eq!(store.apply_calls(), vec![95]);
    assert_eq!(store.persist_calls(), vec![95]);
    assert_eq!(store.counter_wait().value(), EventId::new(95));
}

#[test]
fn noop_persist_failure_is_fatal_to_the_batch() {
    let store = FailingStore::new(false, true);
    let client = ScriptedClient::new();
    client.set_current_id(21);
    client.push_fetch(Ok(vec![noop_event(21)]));
    let mut follower = Follower::new(
        &config(false),
        store.clone(),
        client.clone(),
        None,
        Arc::new(RefreshSignal::new()),
    );

    follower.tick();

    assert_eq!(client.count("disconnect"), 1);
    // The failed event produced no wake-up.
    assert_eq!(store.counter_wait().value(), EventId::new(20));
}

#[test]
fn stream_head_read_failure_aborts_the_tick_before_upstream() {
    let store = FailingStore::new(true, false);
    let client = ScriptedClient::new();
    let mut follower = Follower::new(
        &config(false),
        store.clone(),
        client.clone(),
        None,
        Arc::new(RefreshSignal::new()),
    );

    follower.tick();

    assert!(client.calls().is_empty());
    assert_eq!(store.counter_wait().value(), EventId::ZERO);
}

#[test]
fn transport_failure_closes_the_connection() {
    let store = RecordingStore::new();
    store
        .persist_last_processed_id(EventId::new(10))
        .expect("seed");
    let client = ScriptedClient::new();
    client.set_current_id(12);
    client.push_fetch(Err(ClientError::Transport {
        reason: "socket reset".to_string(),
    }));
    let mut follower = Follower::new(
        &config(false),
        store.clone(),
        client.clone(),
        None,
        Arc::new(RefreshSignal::new()),
    );

    follower.tick();

    assert_eq!(client.count("disconnect"), 1);
    assert_eq!(store.max_notification_id().unwrap(), EventId::new(10));
    assert!(store.applied().is_empty());

    // The next tick reconnects and resumes.
    client.push_fetch(Ok(vec![create_table(11, "a")]));
    follower.tick();
    assert_eq!(client.count("connect"), 2);
    assert_eq!(store.applied(), vec![11]);
}
