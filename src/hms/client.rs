//! Metastore client boundary.

use crate::core::{ClientError, EventId, HmsEvent, PathsImage};

/// Transport to the upstream Hive-style metastore.
///
/// Implementations own their connection state; `connect` is called at the
/// start of every leader tick and must be a no-op when already connected.
pub trait MetastoreClient: Send + Sync {
    fn connect(&self) -> Result<(), ClientError>;

    fn disconnect(&self) -> Result<(), ClientError>;

    /// The upstream's current maximum event id.
    fn current_notification_id(&self) -> Result<EventId, ClientError>;

    /// Events with id strictly greater than `after`, in undefined order.
    /// Raises `ClientError::OutOfSync` when the upstream no longer retains
    /// events at position `after + 1`.
    fn fetch_notifications(&self, after: EventId) -> Result<Vec<HmsEvent>, ClientError>;

    /// A full, self-consistent path image at the upstream's current
    /// position.
    fn full_snapshot(&self) -> Result<PathsImage, ClientError>;
}
