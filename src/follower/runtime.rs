//! The follower control loop.
//!
//! One `Follower` runs on a dedicated thread, driven by a periodic ticker.
//! Each tick is a full pass: read the persisted stream head, wake waiters,
//! gate on leadership, then either take a full snapshot or apply fetched
//! notifications in id order. Every failure is consumed inside the tick;
//! the loop thread never dies.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{Sender, bounded, tick};

use crate::config::Config;
use crate::core::{EventId, HmsEvent, ImageId, SnapshotError, StoreError};
use crate::error::Error;
use crate::hms::{FetchOutcome, MetastoreClient, NotificationFetcher};
use crate::store::PermissionStore;

use super::processor::NotificationProcessor;
use super::refresh::{FULL_UPDATE_TOPIC, PubSub, RefreshSignal};
use super::status::FollowerStatus;
use super::LeaderMonitor;

/// Follows the metastore notification log and keeps the permission store
/// in sync, falling back to full snapshots when the log cannot be trusted.
pub struct Follower {
    store: Arc<dyn PermissionStore>,
    client: Arc<dyn MetastoreClient>,
    fetcher: NotificationFetcher,
    processor: NotificationProcessor,
    leader: Option<Arc<dyn LeaderMonitor>>,
    refresh: Arc<RefreshSignal>,
    hdfs_sync_enabled: bool,
    subscribe_enabled: bool,
    status: FollowerStatus,
}

impl Follower {
    pub fn new(
        config: &Config,
        store: Arc<dyn PermissionStore>,
        client: Arc<dyn MetastoreClient>,
        leader: Option<Arc<dyn LeaderMonitor>>,
        refresh: Arc<RefreshSignal>,
    ) -> Self {
        let server_name = config.resolved_server_name();
        tracing::info!(server = %server_name, "initializing metastore follower");
        let fetcher = NotificationFetcher::new(client.clone(), config.fetcher_cache_size);
        let processor = NotificationProcessor::new(store.clone(), server_name);
        Self {
            store,
            client,
            fetcher,
            processor,
            leader,
            refresh,
            hdfs_sync_enabled: config.hdfs_sync_enabled,
            subscribe_enabled: config.full_update_subscribe_enabled,
            status: FollowerStatus::new(),
        }
    }

    /// Wire the refresh signal to the force-refresh topic. A no-op unless
    /// the subscription is enabled in the config.
    pub fn subscribe_full_update(&self, bus: &PubSub) {
        if !self.subscribe_enabled {
            return;
        }
        tracing::info!("full update trigger: subscribing to topic {FULL_UPDATE_TOPIC}");
        bus.subscribe(FULL_UPDATE_TOPIC, self.refresh.clone());
    }

    /// One full pass of the control loop.
    pub fn tick(&mut self) {
        let max_id = match self.store.max_notification_id() {
            Ok(id) => id,
            Err(err) => {
                tracing::error!(
                    "failed to read the last processed notification id, skipping tick: {err}"
                );
                return;
            }
        };

        // Waiters pinned to already-applied ids unblock even on replicas
        // that are not the leader.
        self.wake_waiting_clients(max_id);

        if !self.is_leader() {
            self.close_connection();
            return;
        }

        self.sync_up(max_id);
    }

    pub fn status(&self) -> &FollowerStatus {
        &self.status
    }

    /// Release everything held across ticks. Called once when the loop
    /// thread exits.
    pub fn shutdown(&mut self) {
        self.fetcher.close();
        self.close_connection();
        self.store.counter_wait().close();
    }

    fn is_leader(&self) -> bool {
        match &self.leader {
            Some(monitor) => monitor.is_leader(),
            // Single-node mode: no monitor means always leader.
            None => true,
        }
    }

    fn sync_up(&mut self, max_id: EventId) {
        if let Err(err) = self.client.connect() {
            tracing::error!("follower cannot connect to the metastore: {err}");
            self.status.connected = false;
            return;
        }
        self.status.connected = true;

        if let Err(err) = self.sync_up_inner(max_id) {
            tracing::error!("metastore sync pass failed: {err}");
            self.close_connection();
        }
    }

    fn sync_up_inner(&mut self, max_id: EventId) -> Result<(), Error> {
        if self.full_snapshot_required(max_id)? {
            self.create_full_snapshot()?;
            return Ok(());
        }

        match self.fetcher.fetch_after(max_id) {
            FetchOutcome::NeedsSnapshot => {
                self.create_full_snapshot()?;
                Ok(())
            }
            FetchOutcome::Transport(err) => Err(err.into()),
            FetchOutcome::Events(events) => {
                if !self.status.ready_to_serve {
                    // Operators watching stdout see this once per process.
                    println!("permsync metastore support is ready");
                    self.status.ready_to_serve = true;
                }
                self.process_notifications(&events, max_id)?;
                Ok(())
            }
        }
    }

    /// Evaluate the snapshot rules in order: nothing ever applied, path
    /// image missing while hdfs sync is on, upstream rewound past us, or
    /// an operator demanded a rebuild.
    fn full_snapshot_required(&mut self, max_id: EventId) -> Result<bool, Error> {
        if self.store.notifications_empty()? {
            tracing::debug!(
                "no notifications persisted, requesting full snapshot (stream head = {max_id})"
            );
            return Ok(true);
        }

        if self.hdfs_sync_enabled && self.store.paths_snapshot_empty()? {
            tracing::debug!("hdfs sync is enabled and no path image is persisted, requesting full snapshot");
            return Ok(true);
        }

        let current = self.fetcher.current_id()?;
        if current < max_id {
            tracing::info!(
                "metastore current notification id {current} is behind our stream head {max_id}, requesting full snapshot"
            );
            return Ok(true);
        }

        if self.refresh.test_and_clear() {
            tracing::info!("full update trigger: initiating full metastore snapshot");
            return Ok(true);
        }

        Ok(false)
    }

    /// Take and persist a full snapshot, then wake waiters at the new
    /// image id. Returns the id of the image, `ImageId::EMPTY` when the
    /// snapshot was abandoned because leadership was lost.
    fn create_full_snapshot(&mut self) -> Result<ImageId, SnapshotError> {
        tracing::debug!("attempting full metastore snapshot");
        if !self.status.begin_full_update() {
            return Err(SnapshotError::AlreadyRunning);
        }
        let result = self.take_full_snapshot();
        self.status.end_full_update();
        if let Err(err) = &result {
            tracing::error!("full metastore snapshot failed: {err}");
        }
        result
    }

    fn take_full_snapshot(&mut self) -> Result<ImageId, SnapshotError> {
        let image = self.client.full_snapshot()?;
        if image.is_empty() {
            tracing::debug!("received empty path image from the metastore, nothing to persist");
            return Ok(image.id);
        }

        // Leadership may have moved while the snapshot was being built;
        // only the leader persists.
        if !self.is_leader() {
            tracing::info!("not persisting full snapshot since leadership was lost");
            return Ok(ImageId::EMPTY);
        }

        if self.hdfs_sync_enabled {
            tracing::info!("persisting full path image for id {}", image.id);
            self.store.persist_full_image(&image)?;
        } else {
            tracing::info!(
                "hdfs sync is disabled, advancing the stream head to {} without a path image",
                image.id
            );
            self.store.persist_last_processed_id(image.id.as_event_id())?;
        }

        self.wake_waiting_clients(image.id.as_event_id());
        tracing::info!("metastore support is ready");
        Ok(image.id)
    }

    /// Apply a batch of events in id order. `notification_id` seeds the
    /// gap/duplicate diagnostics with the stream position the batch was
    /// fetched from.
    fn process_notifications(
        &mut self,
        events: &[HmsEvent],
        notification_id: EventId,
    ) -> Result<(), Error> {
        if events.is_empty() {
            return Ok(());
        }

        let mut last_seen = notification_id;
        for event in events {
            if !last_seen.is_zero() {
                if event.id == last_seen {
                    tracing::info!("processing event with duplicate id {}", event.id);
                } else if event.id != last_seen.next() {
                    tracing::info!(
                        "events between ids {last_seen} and {} are either missing or out of order",
                        event.id
                    );
                }
            }
            last_seen = event.id;

            if !self.is_leader() {
                tracing::debug!("not processing notifications since leadership was lost");
                return Ok(());
            }

            let mut applied = false;
            match self.processor.process_event(event) {
                Ok(outcome) => {
                    applied = outcome;
                    self.fetcher.update_cache(event);
                }
                Err(StoreError::Conflict { id }) => {
                    tracing::info!(
                        "storage conflict for notification {id}, possibly a re-delivered event"
                    );
                    let persisted = self.store.max_notification_id()?;
                    if event.id <= persisted {
                        tracing::error!(
                            "notification {id} is not newer than the persisted head {persisted}, stopping the batch"
                        );
                        break;
                    }
                }
                Err(err) => {
                    tracing::error!("processing notification {} failed: {err}", event.id);
                }
            }

            if !applied {
                // Advancing the head on no-op events is what prevents an
                // infinite loop on stuck uninteresting ids.
                tracing::debug!("explicitly persisting notification id {}", event.id);
                if let Err(err) = self.store.persist_last_processed_id(event.id) {
                    tracing::error!("failed to persist notification id {}: {err}", event.id);
                    return Err(err.into());
                }
                self.fetcher.update_cache(event);
            }

            self.wake_waiting_clients(event.id);
        }
        Ok(())
    }

    /// Wake waiters for `event_id`, resetting the counter first when some
    /// actor re-based the image past our in-memory high-water. The image
    /// id is read fresh from the store on every wake.
    fn wake_waiting_clients(&mut self, event_id: EventId) {
        let counter_wait = self.store.counter_wait();

        let last_image_id = match self.store.last_image_id() {
            Ok(id) => id,
            Err(err) => {
                counter_wait.update(event_id);
                tracing::error!("failed to read the last persisted image id: {err}");
                return;
            }
        };

        if last_image_id > self.status.hms_image_id {
            tracing::debug!(
                "image id advanced from {} to {last_image_id}, resetting waiter baseline to {event_id}",
                self.status.hms_image_id
            );
            counter_wait.reset(event_id);
            self.status.hms_image_id = last_image_id;
        }

        counter_wait.update(event_id);
    }

    fn close_connection(&mut self) {
        if let Err(err) = self.client.disconnect() {
            tracing::error!("failed to close the metastore connection: {err}");
        }
        self.status.connected = false;
    }
}

/// Handle to a spawned follower thread.
pub struct FollowerHandle {
    shutdown_tx: Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl FollowerHandle {
    /// Stop the loop and wait for the thread to exit.
    pub fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("follower thread exited with a panic");
            }
        }
    }
}

/// Run the follower on a dedicated thread, ticking at `interval`.
pub fn spawn(mut follower: Follower, interval: Duration) -> std::io::Result<FollowerHandle> {
    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
    let ticker = tick(interval);
    let thread = thread::Builder::new()
        .name("permsync-follower".to_string())
        .spawn(move || {
            loop {
                crossbeam::select! {
                    recv(ticker) -> _ => follower.tick(),
                    recv(shutdown_rx) -> _ => break,
                }
            }
            follower.shutdown();
        })?;
    Ok(FollowerHandle {
        shutdown_tx,
        thread: Some(thread),
    })
}
