//! Persistence gateway consumed by the follower.
//!
//! The durable backend lives outside this crate; the follower only depends
//! on this trait. [`MemoryStore`] is the in-process implementation used by
//! tests and single-node deployments.

mod memory;

use std::sync::Arc;

use crate::core::{EventId, HmsEvent, ImageId, PathsImage, StoreError};
use crate::follower::CounterWait;

pub use memory::MemoryStore;

/// Durable store of permissions, the path image, and stream bookkeeping.
///
/// Implementations are shared with request handlers and must be safe to
/// call from multiple threads; all atomicity guarantees live here, the
/// follower performs no compensating actions.
pub trait PermissionStore: Send + Sync {
    /// Highest notification id fully applied, or `EventId::ZERO`.
    fn max_notification_id(&self) -> Result<EventId, StoreError>;

    /// True iff no notification has ever been persisted.
    fn notifications_empty(&self) -> Result<bool, StoreError>;

    /// True iff no full path image has ever been persisted.
    fn paths_snapshot_empty(&self) -> Result<bool, StoreError>;

    /// Id of the most recent persisted full path image, or `ImageId::EMPTY`.
    fn last_image_id(&self) -> Result<ImageId, StoreError>;

    /// Atomically replace the path image with `image` and set the stream
    /// head to `image.id`.
    fn persist_full_image(&self, image: &PathsImage) -> Result<(), StoreError>;

    /// Record `id` as processed without applying any mutation. Used for
    /// semantically irrelevant events so the stream head still advances.
    fn persist_last_processed_id(&self, id: EventId) -> Result<(), StoreError>;

    /// Apply the event's authorization mutation and record its id, both
    /// atomically. Returns whether the event changed anything. Raises
    /// `StoreError::Conflict` when the id is already recorded.
    fn apply_event(&self, event: &HmsEvent) -> Result<bool, StoreError>;

    /// The rendezvous readers use to wait for a given stream position.
    fn counter_wait(&self) -> Arc<CounterWait>;
}
