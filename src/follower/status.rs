//! Follower-owned runtime state.

use crate::core::ImageId;

/// State the follower tracks across ticks.
///
/// Owned by the follower thread; nothing here is global. `hms_image_id` is
/// the in-memory high-water of the persisted image id, compared against a
/// fresh store read on every waiter wake-up.
#[derive(Debug, Default)]
pub struct FollowerStatus {
    pub connected: bool,
    pub ready_to_serve: bool,
    pub hms_image_id: ImageId,
    full_update_running: bool,
}

impl FollowerStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a full snapshot as running. Returns false when one already is,
    /// which callers must treat as a contract violation.
    pub fn begin_full_update(&mut self) -> bool {
        if self.full_update_running {
            return false;
        }
        self.full_update_running = true;
        true
    }

    pub fn end_full_update(&mut self) {
        self.full_update_running = false;
    }

    pub fn full_update_running(&self) -> bool {
        self.full_update_running
    }
}
