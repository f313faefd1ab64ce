//! Per-event translation from change records to store mutations.

use std::sync::Arc;

use crate::core::{HmsEvent, StoreError};
use crate::store::PermissionStore;

/// Decides whether an event is authorization-relevant and, when it is,
/// applies it through the store.
pub struct NotificationProcessor {
    store: Arc<dyn PermissionStore>,
    server_name: String,
}

impl NotificationProcessor {
    pub fn new(store: Arc<dyn PermissionStore>, server_name: impl Into<String>) -> Self {
        Self {
            store,
            server_name: server_name.into(),
        }
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Apply one event. Returns `Ok(false)` when the event is semantically
    /// irrelevant (no mutation was attempted); the caller is responsible
    /// for still advancing the persisted stream head. Storage conflicts
    /// surface unchanged.
    pub fn process_event(&self, event: &HmsEvent) -> Result<bool, StoreError> {
        if !event.record.has_location() {
            tracing::debug!(
                server = %self.server_name,
                "notification {} carries no usable path, skipping",
                event.id
            );
            return Ok(false);
        }

        let applied = self.store.apply_event(event)?;
        if applied {
            tracing::debug!(
                server = %self.server_name,
                authorizable = event.record.authorizable().as_deref().unwrap_or(""),
                "applied notification {}",
                event.id
            );
        }
        Ok(applied)
    }
}
