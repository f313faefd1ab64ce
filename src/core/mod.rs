//! Core domain types shared across the crate.

pub mod error;
mod event;
mod image;

pub use error::{ClientError, SnapshotError, StoreError};
pub use event::{ChangeRecord, EventId, HmsEvent};
pub use image::{ImageId, PathsImage};
