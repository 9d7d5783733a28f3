//! Maintenance buttons.
//!
//! Pressing a button changes the stored inputs, which are owned by the
//! instance; buttons only describe the action. See
//! [`crate::integration::Instance::press`].

use std::fmt;

use crate::{
    client::DeviceApi,
    coordinator::Coordinator,
    error::Result,
    nsdk::{bluetooth, InputDescriptor},
};

use super::{unique_id, DeviceInfo, EntityCategory};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ButtonAction {
    /// Discover inputs again and replace the stored ones.
    RediscoverInputs,

    /// Add the last Bluetooth peer seen playing to the stored inputs.
    AddBluetoothDevice,
}

impl ButtonAction {
    pub const ALL: [Self; 2] = [Self::RediscoverInputs, Self::AddBluetoothDevice];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::RediscoverInputs => "Rediscover Inputs",
            Self::AddBluetoothDevice => "Add Bluetooth Device",
        }
    }

    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::RediscoverInputs => "mdi:magnify-scan",
            Self::AddBluetoothDevice => "mdi:bluetooth-connect",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::RediscoverInputs => "rediscover_inputs",
            Self::AddBluetoothDevice => "add_bluetooth_device",
        }
    }
}

impl fmt::Display for ButtonAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Button {
    action: ButtonAction,
    unique_id: String,
    device_info: DeviceInfo,
}

impl Button {
    pub const ENTITY_CATEGORY: EntityCategory = EntityCategory::Config;

    #[must_use]
    pub fn new(action: ButtonAction, entry_id: &str, device_info: DeviceInfo) -> Self {
        Self {
            action,
            unique_id: unique_id(entry_id, action.suffix()),
            device_info,
        }
    }

    /// One button per action.
    #[must_use]
    pub fn all(entry_id: &str, device_info: &DeviceInfo) -> Vec<Self> {
        ButtonAction::ALL
            .into_iter()
            .map(|action| Self::new(action, entry_id, device_info.clone()))
            .collect()
    }

    #[must_use]
    pub fn action(&self) -> ButtonAction {
        self.action
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.action.name()
    }

    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    #[must_use]
    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }
}

/// Friendly name used when neither the caller nor the player names the
/// peer.
pub const DEFAULT_BLUETOOTH_NAME: &str = "Bluetooth Device";

/// Input id and descriptor for the Bluetooth peer at `device_path`.
#[must_use]
pub fn bluetooth_input(device_path: &str, friendly_name: &str) -> (String, InputDescriptor) {
    (
        bluetooth::input_id_for_path(device_path),
        InputDescriptor::bluetooth_device(device_path, friendly_name),
    )
}

/// Resolves the Bluetooth peer to add as an input.
///
/// The device path is taken from, in order:
/// 1. `device_path`
/// 2. the last peer the coordinator saw playing
/// 3. the player state, if it is playing from Bluetooth right now
///
/// Returns `None` if none of these yield a path.
///
/// # Errors
///
/// Will return `Err` if the player state is needed and cannot be read.
pub async fn resolve_bluetooth_input<D: DeviceApi + ?Sized>(
    coordinator: &Coordinator<D>,
    device_path: Option<&str>,
    name: Option<&str>,
) -> Result<Option<(String, InputDescriptor)>> {
    let mut path = device_path
        .filter(|path| !path.is_empty())
        .map(str::to_owned)
        .or_else(|| {
            coordinator
                .data()
                .and_then(|snapshot| snapshot.last_bt_device_path.clone())
        });
    let mut title = None;

    if path.is_none() {
        if let Some(state) = coordinator.device().get_player_state().await? {
            path = state.bluetooth_device_path().map(str::to_owned);
            if path.is_some() {
                title = state.title().map(str::to_owned);
            }
        }
    }

    let Some(path) = path else {
        debug!("no bluetooth device to add");
        return Ok(None);
    };

    let friendly_name = name
        .filter(|name| !name.is_empty())
        .or(title.as_deref())
        .unwrap_or(DEFAULT_BLUETOOTH_NAME);
    Ok(Some(bluetooth_input(&path, friendly_name)))
}
