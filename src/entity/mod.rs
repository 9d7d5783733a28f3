//! Presentation entities of one speaker.
//!
//! Entities expose the coordinator's snapshots to a user interface:
//! * [`InputSelect`]: the active input, and switching it
//! * [`Sensor`]: diagnostic values such as versions and network settings
//! * [`Button`]: maintenance actions on the stored inputs
//!
//! Entities never poll on their own. They read the latest snapshot and are
//! available exactly when the coordinator's last poll succeeded.

pub mod button;
pub mod select;
pub mod sensor;

pub use button::{Button, ButtonAction};
pub use select::InputSelect;
pub use sensor::{Sensor, SensorDescription};

use std::fmt;

use serde::Serialize;

/// Device shared by all entities of an instance.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DeviceInfo {
    /// Entry id the device is registered under.
    pub identifier: String,
    pub name: String,
    pub manufacturer: &'static str,
    pub model: &'static str,
}

impl DeviceInfo {
    pub const MANUFACTURER: &'static str = "JBL";
    pub const MODEL: &'static str = "4305P";

    /// Name used when an instance has none.
    pub const DEFAULT_NAME: &'static str = "JBL 4305P";

    #[must_use]
    pub fn new(entry_id: &str, name: Option<&str>) -> Self {
        Self {
            identifier: entry_id.to_owned(),
            name: name.unwrap_or(Self::DEFAULT_NAME).to_owned(),
            manufacturer: Self::MANUFACTURER,
            model: Self::MODEL,
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.name, self.manufacturer, self.model)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityCategory {
    Config,
    Diagnostic,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Duration,
}

/// Unique id of an entity: `<entry_id>_<suffix>`.
#[must_use]
pub fn unique_id(entry_id: &str, suffix: &str) -> String {
    format!("{entry_id}_{suffix}")
}
