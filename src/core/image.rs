//! Full path images produced by metastore snapshots.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::EventId;

/// Identifier of a persisted full path image.
///
/// Equals the id of the last notification event the snapshot includes.
/// `ImageId::EMPTY` means "no image persisted" and doubles as the sentinel
/// returned when a snapshot is abandoned before persisting.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(u64);

impl ImageId {
    pub const EMPTY: ImageId = ImageId(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The notification stream position this image corresponds to.
    pub fn as_event_id(self) -> EventId {
        EventId::new(self.0)
    }
}

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({})", self.0)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A complete, self-consistent view of the path-to-authorizable mapping at
/// a given notification stream position.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsImage {
    pub id: ImageId,
    pub paths: BTreeMap<String, BTreeSet<String>>,
}

impl PathsImage {
    pub fn new(id: ImageId, paths: BTreeMap<String, BTreeSet<String>>) -> Self {
        Self { id, paths }
    }

    pub fn empty(id: ImageId) -> Self {
        Self {
            id,
            paths: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
