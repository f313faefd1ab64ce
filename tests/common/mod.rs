//! Shared fakes for follower integration tests.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use permsync::config::Config;
use permsync::{
    ChangeRecord, ClientError, CounterWait, EventId, HmsEvent, ImageId, LeaderMonitor,
    MemoryStore, MetastoreClient, PathsImage, PermissionStore, StoreError,
};

pub fn create_table(id: u64, table: &str) -> HmsEvent {
    HmsEvent::new(
        EventId::new(id),
        ChangeRecord::CreateTable {
            database: "sales".to_string(),
            table: table.to_string(),
            location: Some(format!("/warehouse/sales/{table}")),
        },
        1_000 + id,
    )
}

pub fn noop_event(id: u64) -> HmsEvent {
    HmsEvent::new(
        EventId::new(id),
        ChangeRecord::Unrecognized {
            kind: "OPEN_TXN".to_string(),
        },
        1_000 + id,
    )
}

pub fn image(id: u64, path: &str, authorizable: &str) -> PathsImage {
    let mut paths = BTreeMap::new();
    paths.insert(
        path.to_string(),
        BTreeSet::from([authorizable.to_string()]),
    );
    PathsImage::new(ImageId::new(id), paths)
}

pub fn config(hdfs_sync_enabled: bool) -> Config {
    Config {
        hdfs_sync_enabled,
        ..Config::default()
    }
}

#[derive(Default)]
struct ClientScript {
    current_id: EventId,
    fetches: VecDeque<Result<Vec<HmsEvent>, ClientError>>,
    snapshots: VecDeque<PathsImage>,
    calls: Vec<&'static str>,
}

/// Metastore client driven by a per-test script, recording every call.
#[derive(Default)]
pub struct ScriptedClient {
    script: Mutex<ClientScript>,
}

impl ScriptedClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_current_id(&self, id: u64) {
        self.script.lock().expect("script lock").current_id = EventId::new(id);
    }

    pub fn push_fetch(&self, result: Result<Vec<HmsEvent>, ClientError>) {
        self.script
            .lock()
            .expect("script lock")
            .fetches
            .push_back(result);
    }

    pub fn push_snapshot(&self, image: PathsImage) {
        self.script
            .lock()
            .expect("script lock")
            .snapshots
            .push_back(image);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.script.lock().expect("script lock").calls.clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls().iter().filter(|call| **call == name).count()
    }

    fn record(&self, call: &'static str) {
        self.script.lock().expect("script lock").calls.push(call);
    }
}

impl MetastoreClient for ScriptedClient {
    fn connect(&self) -> Result<(), ClientError> {
        self.record("connect");
        Ok(())
    }

    fn disconnect(&self) -> Result<(), ClientError> {
        self.record("disconnect");
        Ok(())
    }

    fn current_notification_id(&self) -> Result<EventId, ClientError> {
        self.record("current_notification_id");
        Ok(self.script.lock().expect("script lock").current_id)
    }

    fn fetch_notifications(&self, _after: EventId) -> Result<Vec<HmsEvent>, ClientError> {
        self.record("fetch_notifications");
        self.script
            .lock()
            .expect("script lock")
            .fetches
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn full_snapshot(&self) -> Result<PathsImage, ClientError> {
        self.record("full_snapshot");
        Ok(self
            .script
            .lock()
            .expect("script lock")
            .snapshots
            .pop_front()
            .unwrap_or_else(|| PathsImage::empty(ImageId::EMPTY)))
    }
}

/// Store delegating to `MemoryStore` while recording gateway calls.
pub struct RecordingStore {
    pub inner: MemoryStore,
    applied: Mutex<Vec<u64>>,
    persisted_ids: Mutex<Vec<u64>>,
    images: Mutex<Vec<u64>>,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::new(),
            applied: Mutex::new(Vec::new()),
            persisted_ids: Mutex::new(Vec::new()),
            images: Mutex::new(Vec::new()),
        })
    }

    pub fn applied(&self) -> Vec<u64> {
        self.applied.lock().expect("applied lock").clone()
    }

    pub fn persisted_ids(&self) -> Vec<u64> {
        self.persisted_ids.lock().expect("persisted lock").clone()
    }

    pub fn images(&self) -> Vec<u64> {
        self.images.lock().expect("images lock").clone()
    }
}

impl PermissionStore for RecordingStore {
    fn max_notification_id(&self) -> Result<EventId, StoreError> {
        self.inner.max_notification_id()
    }

    fn notifications_empty(&self) -> Result<bool, StoreError> {
        self.inner.notifications_empty()
    }

    fn paths_snapshot_empty(&self) -> Result<bool, StoreError> {
        self.inner.paths_snapshot_empty()
    }

    fn last_image_id(&self) -> Result<ImageId, StoreError> {
        self.inner.last_image_id()
    }

    fn persist_full_image(&self, image: &PathsImage) -> Result<(), StoreError> {
        self.images
            .lock()
            .expect("images lock")
            .push(image.id.get());
        self.inner.persist_full_image(image)
    }

    fn persist_last_processed_id(&self, id: EventId) -> Result<(), StoreError> {
        self.persisted_ids
            .lock()
            .expect("persisted lock")
            .push(id.get());
        self.inner.persist_last_processed_id(id)
    }

    fn apply_event(&self, event: &HmsEvent) -> Result<bool, StoreError> {
        let applied = self.inner.apply_event(event)?;
        self.applied
            .lock()
            .expect("applied lock")
            .push(event.id.get());
        Ok(applied)
    }

    fn counter_wait(&self) -> Arc<CounterWait> {
        self.inner.counter_wait()
    }
}

pub struct FlagLeader(AtomicBool);

impl FlagLeader {
    pub fn new(leader: bool) -> Arc<Self> {
        Arc::new(Self(AtomicBool::new(leader)))
    }
}

impl LeaderMonitor for FlagLeader {
    fn is_leader(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Reports leadership for the first `true_for` checks, then flips false.
pub struct CountedLeader {
    true_for: usize,
    checks: AtomicUsize,
}

impl CountedLeader {
    pub fn new(true_for: usize) -> Arc<Self> {
        Arc::new(Self {
            true_for,
            checks: AtomicUsize::new(0),
        })
    }
}

impl LeaderMonitor for CountedLeader {
    fn is_leader(&self) -> bool {
        self.checks.fetch_add(1, Ordering::SeqCst) < self.true_for
    }
}
