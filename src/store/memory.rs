//! In-memory permission store.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::{ChangeRecord, EventId, HmsEvent, ImageId, PathsImage, StoreError};
use crate::follower::CounterWait;

use super::PermissionStore;

#[derive(Default)]
struct MemoryStoreInner {
    /// Every notification id ever recorded, applied or no-op.
    notification_ids: BTreeSet<EventId>,
    max_notification_id: EventId,
    last_image_id: ImageId,
    has_paths_image: bool,
    paths: BTreeMap<String, BTreeSet<String>>,
}

/// A [`PermissionStore`] holding everything in process memory.
///
/// Mutations take the inner lock once, so each operation is atomic with
/// respect to concurrent readers.
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
    counter_wait: Arc<CounterWait>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryStoreInner::default()),
            counter_wait: Arc::new(CounterWait::new()),
        }
    }

    /// Authorizables recorded for `path`, if any. Read surface for request
    /// handlers and tests.
    pub fn authorizables_for(&self, path: &str) -> Option<BTreeSet<String>> {
        self.lock().paths.get(path).cloned()
    }

    /// Snapshot of the whole path image.
    pub fn paths(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.lock().paths.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryStoreInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionStore for MemoryStore {
    fn max_notification_id(&self) -> Result<EventId, StoreError> {
        Ok(self.lock().max_notification_id)
    }

    fn notifications_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock().notification_ids.is_empty())
    }

    fn paths_snapshot_empty(&self) -> Result<bool, StoreError> {
        Ok(!self.lock().has_paths_image)
    }

    fn last_image_id(&self) -> Result<ImageId, StoreError> {
        Ok(self.lock().last_image_id)
    }

    fn persist_full_image(&self, image: &PathsImage) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.paths = image.paths.clone();
        inner.has_paths_image = true;
        inner.last_image_id = image.id;
        // Re-basing overwrites the stream head rather than advancing it:
        // the image defines the new position even after an upstream rewind.
        inner.max_notification_id = image.id.as_event_id();
        inner.notification_ids.insert(image.id.as_event_id());
        Ok(())
    }

    fn persist_last_processed_id(&self, id: EventId) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.notification_ids.insert(id);
        if id > inner.max_notification_id {
            inner.max_notification_id = id;
        }
        Ok(())
    }

    fn apply_event(&self, event: &HmsEvent) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        if inner.notification_ids.contains(&event.id) {
            return Err(StoreError::Conflict { id: event.id });
        }

        let applied = apply_record(&mut inner.paths, &event.record);
        if applied {
            inner.notification_ids.insert(event.id);
            if event.id > inner.max_notification_id {
                inner.max_notification_id = event.id;
            }
        }
        Ok(applied)
    }

    fn counter_wait(&self) -> Arc<CounterWait> {
        self.counter_wait.clone()
    }
}

/// Mutate the path image for one change record. Returns false when the
/// record carries nothing the image can be updated from.
fn apply_record(paths: &mut BTreeMap<String, BTreeSet<String>>, record: &ChangeRecord) -> bool {
    let Some(authorizable) = record.authorizable() else {
        return false;
    };
    if !record.has_location() {
        return false;
    }

    match record {
        ChangeRecord::CreateDatabase { location, .. }
        | ChangeRecord::CreateTable { location, .. }
        | ChangeRecord::AddPartition { location, .. } => {
            if let Some(location) = location {
                add_path(paths, location, authorizable);
            }
        }
        ChangeRecord::DropDatabase { location, .. }
        | ChangeRecord::DropTable { location, .. }
        | ChangeRecord::DropPartition { location, .. } => {
            if let Some(location) = location {
                remove_path(paths, location, &authorizable);
            }
        }
        ChangeRecord::AlterTable {
            old_location,
            new_location,
            ..
        }
        | ChangeRecord::AlterPartition {
            old_location,
            new_location,
            ..
        } => {
            if let Some(old) = old_location {
                remove_path(paths, old, &authorizable);
            }
            if let Some(new) = new_location {
                add_path(paths, new, authorizable);
            }
        }
        ChangeRecord::Unrecognized { .. } => return false,
    }
    true
}

fn add_path(paths: &mut BTreeMap<String, BTreeSet<String>>, location: &str, authorizable: String) {
    paths
        .entry(location.to_string())
        .or_default()
        .insert(authorizable);
}

fn remove_path(paths: &mut BTreeMap<String, BTreeSet<String>>, location: &str, authorizable: &str) {
    if let Some(objects) = paths.get_mut(location) {
        objects.remove(authorizable);
        if objects.is_empty() {
            paths.remove(location);
        }
    }
}
