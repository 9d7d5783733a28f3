//! Player state as read from `player:player/data`.
//!
//! # Wire Format
//!
//! ```json
//! {
//!     "state": "playing",
//!     "mediaRoles": {
//!         "title": "[TV] Lounge TV",
//!         "value": {"string_": "/org/bluez/hci0/dev_64_E7_D8_6D_AD_C3", "type": "string_"},
//!         "mediaData": {"metaData": {"serviceID": "bluetooth"}}
//!     }
//! }
//! ```
//!
//! Every field is optional on the wire. Fields this crate does not model
//! are retained so that the full state can be handed on unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{bluetooth::BluetoothPath, service, value::TypedValue};

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default)]
    pub media_roles: MediaRoles,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRoles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(
        default,
        deserialize_with = "TypedValue::deserialize_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<TypedValue>,

    #[serde(default)]
    pub media_data: MediaData,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaData {
    #[serde(default)]
    pub meta_data: MetaData,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct MetaData {
    #[serde(rename = "serviceID", default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PlayerState {
    /// The sentinel `state` meaning that no input is active.
    pub const STOPPED: &'static str = "stopped";

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state.as_deref() == Some(Self::STOPPED)
    }

    /// Service of the media being played, if any.
    #[must_use]
    pub fn service_id(&self) -> Option<&str> {
        self.media_roles.media_data.meta_data.service_id.as_deref()
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.media_roles.title.as_deref()
    }

    #[must_use]
    pub fn is_bluetooth(&self) -> bool {
        self.service_id() == Some(service::BLUETOOTH)
    }

    /// Device path of the Bluetooth peer being played from.
    ///
    /// Only looks at the service, not at `state`: a paused Bluetooth
    /// session still names its peer.
    #[must_use]
    pub fn bluetooth_device_path(&self) -> Option<&str> {
        if !self.is_bluetooth() {
            return None;
        }

        self.media_roles
            .value
            .as_ref()
            .and_then(TypedValue::as_str)
            .filter(|path| !path.is_empty())
    }

    /// Identifier of the active input.
    ///
    /// `None` when stopped or when no service is reported. Bluetooth
    /// sessions resolve to `bluetooth_<mac>` when the device path holds a
    /// MAC address, and to the bare service id otherwise.
    #[must_use]
    pub fn current_input(&self) -> Option<String> {
        if self.is_stopped() {
            return None;
        }

        let service_id = self.service_id()?;
        if service_id == service::BLUETOOTH {
            if let Some(path) = self.bluetooth_device_path().and_then(BluetoothPath::parse) {
                return Some(path.input_id());
            }
        }

        Some(service_id.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn bluetooth_playing() -> PlayerState {
        serde_json::from_value(json!({
            "state": "playing",
            "mediaRoles": {
                "value": {"string_": "/org/bluez/hci0/dev_64_E7_D8_6D_AD_C3", "type": "string_"},
                "title": "[TV] Lounge TV",
                "mediaData": {"metaData": {"serviceID": "bluetooth"}},
            },
        }))
        .unwrap()
    }

    #[test]
    fn decodes_bluetooth_session() {
        let state = bluetooth_playing();
        assert_eq!(state.state.as_deref(), Some("playing"));
        assert_eq!(state.title(), Some("[TV] Lounge TV"));
        assert_eq!(
            state.bluetooth_device_path(),
            Some("/org/bluez/hci0/dev_64_E7_D8_6D_AD_C3")
        );
        assert_eq!(
            state.current_input().as_deref(),
            Some("bluetooth_64_e7_d8_6d_ad_c3")
        );
    }

    #[test]
    fn accepts_untyped_device_path() {
        let state: PlayerState = serde_json::from_value(json!({
            "state": "paused",
            "mediaRoles": {
                "value": {"string_": "/org/bluez/hci0/dev_64_E7_D8_6D_AD_C3"},
                "mediaData": {"metaData": {"serviceID": "bluetooth"}},
            },
        }))
        .unwrap();
        assert_eq!(
            state.bluetooth_device_path(),
            Some("/org/bluez/hci0/dev_64_E7_D8_6D_AD_C3")
        );
    }

    #[test]
    fn bluetooth_without_path_falls_back_to_service() {
        let state: PlayerState = serde_json::from_value(json!({
            "state": "playing",
            "mediaRoles": {"mediaData": {"metaData": {"serviceID": "bluetooth"}}},
        }))
        .unwrap();
        assert_eq!(state.current_input().as_deref(), Some("bluetooth"));
    }

    #[test]
    fn stopped_has_no_input() {
        let state: PlayerState = serde_json::from_value(json!({
            "state": "stopped",
            "mediaRoles": {"mediaData": {"metaData": {"serviceID": "googlecast"}}},
        }))
        .unwrap();
        assert!(state.is_stopped());
        assert_eq!(state.current_input(), None);
    }

    #[test]
    fn missing_fields_decode_to_defaults() {
        let state: PlayerState = serde_json::from_value(json!({})).unwrap();
        assert_eq!(state.state, None);
        assert_eq!(state.service_id(), None);
        assert_eq!(state.current_input(), None);
    }

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let wire = json!({
            "state": "playing",
            "contextPath": "player:player/context",
            "mediaRoles": {
                "audioType": "audioBroadcast",
                "mediaData": {"metaData": {"serviceID": "googlecast", "live": true}},
            },
        });
        let state: PlayerState = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(serde_json::to_value(&state).unwrap(), wire);
    }
}
