//! Polls a speaker and keeps the latest snapshot of its state.
//!
//! The coordinator is either idle or running exactly one poll. A poll reads,
//! in order:
//! 1. the player state
//! 2. the current input
//! 3. the system settings (best effort)
//! 4. versions and network settings from the status page (best effort)
//!
//! and assembles them into a [`Snapshot`]. Snapshots are published
//! atomically through a watch channel; entities only ever read them.
//!
//! A failing read of the player state or current input fails the whole
//! poll. The failure is published as [`UpdateFailed`] and the coordinator
//! becomes unavailable, but the previous snapshot stays in place until the
//! next successful poll replaces it.
//!
//! # Example
//!
//! ```rust
//! let coordinator = Arc::new(Coordinator::new("Lounge", client, Duration::from_secs(30)));
//! coordinator.first_refresh().await?;
//!
//! let shutdown = CancellationToken::new();
//! tokio::spawn({
//!     let coordinator = Arc::clone(&coordinator);
//!     let shutdown = shutdown.clone();
//!     async move { coordinator.run(shutdown).await }
//! });
//! ```

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::{
    client::DeviceApi,
    error::{Error, Result},
    nsdk::{PlayerState, Scalar, StatusPage, SystemInfo},
};

/// Latest successful read of the speaker.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub player_state: Option<PlayerState>,
    pub current_input: Option<String>,
    /// Player `state`; `"unknown"` without a player state and `None` when
    /// the player state does not report one.
    pub state: Option<String>,
    pub system: SystemInfo,
    pub versions: StatusPage,
    /// Device path of the last Bluetooth peer seen playing, in this or any
    /// earlier poll.
    pub last_bt_device_path: Option<String>,
}

impl Snapshot {
    pub const STATE_UNKNOWN: &'static str = "unknown";

    /// Looks up `key` in the system settings, then in the status page.
    #[must_use]
    pub fn info(&self, key: &str) -> Option<Scalar> {
        self.system
            .get(key)
            .cloned()
            .or_else(|| self.versions.get(key))
    }
}

/// Signal that a poll failed.
///
/// Clonable so that every caller waiting on the same poll gets it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("error communicating with API: {message}")]
pub struct UpdateFailed {
    message: String,
    connectivity: bool,
}

impl UpdateFailed {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            connectivity: false,
        }
    }

    /// Whether the poll failed because the speaker could not be reached.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        self.connectivity
    }
}

impl From<Error> for UpdateFailed {
    fn from(e: Error) -> Self {
        Self {
            message: e.to_string(),
            connectivity: e.is_connectivity(),
        }
    }
}

/// What the coordinator publishes after every poll.
#[derive(Clone, Debug, PartialEq)]
pub struct Update {
    /// Latest successful snapshot; kept when a later poll fails.
    pub data: Option<Arc<Snapshot>>,
    pub last_update_success: bool,
    pub last_error: Option<UpdateFailed>,
}

impl Default for Update {
    fn default() -> Self {
        Self {
            data: None,
            last_update_success: true,
            last_error: None,
        }
    }
}

/// State carried from one poll to the next.
#[derive(Debug, Default)]
struct PollState {
    last_bt_device_path: Option<String>,
}

pub struct Coordinator<D: DeviceApi + ?Sized> {
    name: String,
    device: Arc<D>,
    update_interval_ms: AtomicU64,

    /// Held for the duration of a poll.
    poll: Mutex<PollState>,
    updates: watch::Sender<Update>,
}

impl<D: DeviceApi + ?Sized> Coordinator<D> {
    #[must_use]
    pub fn new(name: impl Into<String>, device: Arc<D>, update_interval: Duration) -> Self {
        let (updates, _) = watch::channel(Update::default());
        let coordinator = Self {
            name: name.into(),
            device,
            update_interval_ms: AtomicU64::new(0),
            poll: Mutex::new(PollState::default()),
            updates,
        };
        coordinator.set_update_interval(update_interval);
        coordinator
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn device(&self) -> &Arc<D> {
        &self.device
    }

    #[must_use]
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms.load(Ordering::Relaxed))
    }

    /// Changes the interval used from the next wait of [`Self::run`] on.
    pub fn set_update_interval(&self, interval: Duration) {
        let millis = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self.update_interval_ms.store(millis, Ordering::Relaxed);
    }

    /// Latest published update.
    #[must_use]
    pub fn update(&self) -> Update {
        self.updates.borrow().clone()
    }

    /// Latest successful snapshot, even when the last poll failed.
    #[must_use]
    pub fn data(&self) -> Option<Arc<Snapshot>> {
        self.updates.borrow().data.clone()
    }

    #[must_use]
    pub fn last_update_success(&self) -> bool {
        self.updates.borrow().last_update_success
    }

    /// Entities are available while the last poll succeeded.
    #[must_use]
    pub fn available(&self) -> bool {
        let update = self.updates.borrow();
        update.last_update_success && update.data.is_some()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Update> {
        self.updates.subscribe()
    }

    /// Polls the speaker and publishes the outcome.
    ///
    /// When a poll is already running, waits for it and returns its
    /// outcome instead of polling again.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateFailed`] if the player state or current input could
    /// not be read.
    pub async fn refresh(&self) -> std::result::Result<Arc<Snapshot>, UpdateFailed> {
        let Ok(mut poll) = self.poll.try_lock() else {
            debug!("{}: refresh already in progress, waiting for it", self.name);
            drop(self.poll.lock().await);
            return self.latest();
        };

        let was_available = self.last_update_success();
        match self.poll_once(&mut poll).await {
            Ok(snapshot) => {
                if !was_available {
                    info!("{}: fetching data recovered", self.name);
                }

                let snapshot = Arc::new(snapshot);
                self.updates.send_replace(Update {
                    data: Some(Arc::clone(&snapshot)),
                    last_update_success: true,
                    last_error: None,
                });
                Ok(snapshot)
            }
            Err(e) => {
                let failed = UpdateFailed::from(e);
                if was_available {
                    error!("{}: {failed}", self.name);
                } else {
                    debug!("{}: {failed}", self.name);
                }

                self.updates.send_modify(|update| {
                    update.last_update_success = false;
                    update.last_error = Some(failed.clone());
                });
                Err(failed)
            }
        }
    }

    /// Runs the first poll of a new instance.
    ///
    /// # Errors
    ///
    /// Returns an `Unavailable` error when the speaker is not ready, so
    /// that setup can be retried later.
    pub async fn first_refresh(&self) -> Result<Arc<Snapshot>> {
        self.refresh()
            .await
            .map_err(|e| Error::unavailable(format!("{} is not ready: {e}", self.name)))
    }

    /// Polls every update interval until `shutdown` is cancelled.
    ///
    /// Failed polls are published and logged; the loop keeps going. A poll
    /// still running at shutdown is abandoned.
    pub async fn run(&self, shutdown: CancellationToken) {
        debug!(
            "{}: polling every {:.1}s",
            self.name,
            self.update_interval().as_secs_f32()
        );

        loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => break,

                () = tokio::time::sleep(self.update_interval()) => {
                    tokio::select! {
                        biased;

                        () = shutdown.cancelled() => break,
                        _ = self.refresh() => {}
                    }
                }
            }
        }

        debug!("{}: stopped polling", self.name);
    }

    fn latest(&self) -> std::result::Result<Arc<Snapshot>, UpdateFailed> {
        let update = self.updates.borrow();
        if !update.last_update_success {
            return Err(update
                .last_error
                .clone()
                .unwrap_or_else(|| UpdateFailed::new("update failed")));
        }

        update
            .data
            .clone()
            .ok_or_else(|| UpdateFailed::new("no data received yet"))
    }

    async fn poll_once(&self, poll: &mut PollState) -> Result<Snapshot> {
        let player_state = self.device.get_player_state().await?;
        let current_input = self.device.get_current_input().await?;
        let system = self.device.get_system_info().await;
        let versions = self.device.get_versions_and_network().await;

        if let Some(path) = player_state
            .as_ref()
            .and_then(PlayerState::bluetooth_device_path)
        {
            if poll.last_bt_device_path.as_deref() != Some(path) {
                debug!("{}: last bluetooth device is now {path}", self.name);
                poll.last_bt_device_path = Some(path.to_owned());
            }
        }

        let state = match &player_state {
            Some(player_state) => player_state.state.clone(),
            None => Some(Snapshot::STATE_UNKNOWN.to_owned()),
        };

        Ok(Snapshot {
            player_state,
            current_input,
            state,
            system,
            versions,
            last_bt_device_path: poll.last_bt_device_path.clone(),
        })
    }
}
