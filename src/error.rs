use thiserror::Error;

use crate::config::ConfigError;
use crate::core::{ClientError, SnapshotError, StoreError};

/// Crate-level convenience error.
///
/// A thin wrapper over the capability errors; the follower loop matches on
/// the inner variants to pick a disposition.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
