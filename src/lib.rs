#![forbid(unsafe_code)]

//! permsync follows a Hive-style metastore notification log and keeps an
//! authorization service's permission/path store synchronized, falling
//! back to full snapshots when the log cannot be trusted.

pub mod config;
pub mod core;
pub mod error;
pub mod follower;
pub mod hms;
pub mod store;
pub mod telemetry;

pub use error::{Error, Result};

// Re-export the main surface at the crate root for convenience.
pub use crate::core::{
    ChangeRecord, ClientError, EventId, HmsEvent, ImageId, PathsImage, SnapshotError, StoreError,
};
pub use crate::follower::{
    CounterWait, FULL_UPDATE_TOPIC, Follower, FollowerHandle, FollowerStatus, LeaderMonitor,
    NotificationProcessor, PubSub, RefreshSignal, Subscriber, WaitStatus,
};
pub use crate::hms::{FetchOutcome, MetastoreClient, NotificationFetcher};
pub use crate::store::{MemoryStore, PermissionStore};
