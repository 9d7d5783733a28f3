//! Changes observed between two coordinator updates.
//!
//! The coordinator publishes full snapshots; these events are what a
//! consumer that only cares about transitions (such as the log of the
//! `run` command) gets out of them.
//!
//! # Example
//!
//! ```rust
//! use jbl4305p::events::{self, Event};
//!
//! let mut updates = coordinator.subscribe();
//! let mut previous = updates.borrow_and_update().clone();
//! while updates.changed().await.is_ok() {
//!     let current = updates.borrow_and_update().clone();
//!     for event in events::between(&previous, &current) {
//!         println!("{event}");
//!     }
//!     previous = current;
//! }
//! ```

use std::fmt;

use crate::coordinator::Update;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// A poll succeeded after one or more failed.
    Available,

    /// A poll failed after the previous one succeeded.
    Unavailable,

    /// The active input changed; `None` when playback stopped.
    InputChanged(Option<String>),

    /// The player `state` changed; `None` when it is no longer reported.
    StateChanged(Option<String>),

    /// A Bluetooth peer not seen before started playing.
    BluetoothDeviceSeen(String),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "speaker available"),
            Self::Unavailable => write!(f, "speaker unavailable"),
            Self::InputChanged(Some(input)) => write!(f, "input changed to {input}"),
            Self::InputChanged(None) => write!(f, "no input active"),
            Self::StateChanged(Some(state)) => write!(f, "player {state}"),
            Self::StateChanged(None) => write!(f, "player state not reported"),
            Self::BluetoothDeviceSeen(path) => write!(f, "bluetooth device seen at {path}"),
        }
    }
}

/// Events that lead from `previous` to `current`.
///
/// The first snapshot ever received reports its input and state as
/// changes.
#[must_use]
pub fn between(previous: &Update, current: &Update) -> Vec<Event> {
    let mut events = Vec::new();

    if previous.last_update_success && !current.last_update_success {
        events.push(Event::Unavailable);
    }
    if !previous.last_update_success && current.last_update_success {
        events.push(Event::Available);
    }

    let Some(now) = current.data.as_deref() else {
        return events;
    };
    let before = previous.data.as_deref();

    if before.is_none_or(|before| before.current_input != now.current_input) {
        events.push(Event::InputChanged(now.current_input.clone()));
    }
    if before.is_none_or(|before| before.state != now.state) {
        events.push(Event::StateChanged(now.state.clone()));
    }
    if let Some(path) = &now.last_bt_device_path {
        if before.is_none_or(|before| before.last_bt_device_path.as_ref() != Some(path)) {
            events.push(Event::BluetoothDeviceSeen(path.clone()));
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::coordinator::Snapshot;

    fn update(current_input: Option<&str>, state: &str, success: bool) -> Update {
        Update {
            data: Some(Arc::new(Snapshot {
                current_input: current_input.map(str::to_owned),
                state: Some(state.to_owned()),
                ..Snapshot::default()
            })),
            last_update_success: success,
            last_error: None,
        }
    }

    #[test]
    fn first_snapshot_reports_input_and_state() {
        let events = between(&Update::default(), &update(Some("googlecast"), "playing", true));
        assert_eq!(
            events,
            vec![
                Event::InputChanged(Some("googlecast".to_owned())),
                Event::StateChanged(Some("playing".to_owned())),
            ]
        );
    }

    #[test]
    fn failure_keeps_snapshot_and_reports_unavailable() {
        let ok = update(Some("googlecast"), "playing", true);
        let failed = Update {
            last_update_success: false,
            ..ok.clone()
        };
        assert_eq!(between(&ok, &failed), vec![Event::Unavailable]);
        assert_eq!(between(&failed, &ok), vec![Event::Available]);
    }

    #[test]
    fn stopping_clears_input() {
        let playing = update(Some("airplay"), "playing", true);
        let stopped = update(None, "stopped", true);
        assert_eq!(
            between(&playing, &stopped),
            vec![
                Event::InputChanged(None),
                Event::StateChanged(Some("stopped".to_owned())),
            ]
        );
    }
}
