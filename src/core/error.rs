//! Capability errors for the store and metastore client boundaries.
//!
//! These are bounded and stable: each variant maps to one disposition in
//! the follower loop, so no backend implementation detail leaks into the
//! loop's control flow.

use thiserror::Error;

use super::EventId;

/// Errors raised by the persistence gateway.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    /// The event id is already recorded. Raised by `apply_event` when the
    /// upstream re-delivers a durable notification.
    #[error("notification {id} is already persisted")]
    Conflict { id: EventId },

    #[error("store read failed: {reason}")]
    ReadFailed { reason: String },

    #[error("store write failed: {reason}")]
    WriteFailed { reason: String },
}

/// Errors raised by the metastore client transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClientError {
    #[error("metastore connect failed: {reason}")]
    Connect { reason: String },

    /// The upstream no longer retains the event immediately following
    /// `after`; only a full snapshot can recover.
    #[error("metastore log truncated past event {after}")]
    OutOfSync { after: EventId },

    #[error("metastore transport failed: {reason}")]
    Transport { reason: String },
}

/// Errors raised while taking or persisting a full snapshot.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SnapshotError {
    /// A second snapshot was requested while one is running. The follower
    /// is single-threaded, so reaching this is an API misuse.
    #[error("a full snapshot is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
