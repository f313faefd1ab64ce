//! The metastore follower: control loop, waiter rendezvous, and the
//! operator-initiated refresh signal.

mod counter_wait;
mod processor;
mod refresh;
mod runtime;
mod status;

pub use counter_wait::{CounterWait, WaitStatus};
pub use processor::NotificationProcessor;
pub use refresh::{FULL_UPDATE_TOPIC, PubSub, RefreshSignal, Subscriber};
pub use runtime::{Follower, FollowerHandle, spawn};
pub use status::FollowerStatus;

/// Leadership oracle for the replica set. May flip at any moment; the
/// follower re-checks at the entry to each phase and before each event.
pub trait LeaderMonitor: Send + Sync {
    fn is_leader(&self) -> bool;
}
