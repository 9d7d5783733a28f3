//! Player control payloads written to `player:player/control`.
//!
//! Switching inputs means asking the player to "play" a live broadcast of
//! the target service. Google Cast and Bluetooth expect a few extra fields;
//! every other service accepts the generic form:
//!
//! ```json
//! {
//!     "control": "play",
//!     "mediaRoles": {
//!         "type": "audio",
//!         "audioType": "audioBroadcast",
//!         "mediaData": {"metaData": {"serviceID": "airplay"}}
//!     }
//! }
//! ```

use std::fmt;

use serde::Serialize;
use serde_with::skip_serializing_none;

use super::{service, value::TypedValue};

/// Role of a `setData` write.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Role {
    /// Trigger a command, such as player control.
    #[default]
    Activate,
    /// Store a setting.
    Value,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Value => "value",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Control {
    pub control: &'static str,
    #[serde(rename = "mediaRoles")]
    pub media_roles: MediaRoles,
}

#[skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRoles {
    #[serde(rename = "type")]
    pub typ: &'static str,
    pub audio_type: &'static str,
    pub media_data: MediaData,
    pub title: Option<&'static str>,
    pub icon: Option<&'static str>,
    pub description: Option<&'static str>,
    pub do_not_track: Option<bool>,
    pub value: Option<TypedValue>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MediaData {
    #[serde(rename = "metaData")]
    pub meta_data: MetaData,
}

#[skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetaData {
    #[serde(rename = "serviceID")]
    pub service_id: String,
    pub live: Option<bool>,
    #[serde(rename = "playLogicPath")]
    pub play_logic_path: Option<&'static str>,
}

impl Control {
    const PLAY: &'static str = "play";
    const AUDIO: &'static str = "audio";
    const AUDIO_BROADCAST: &'static str = "audioBroadcast";

    /// Builds the payload that switches the player to `service_id`.
    ///
    /// `device_path` selects a specific peer for Bluetooth and is ignored
    /// for every other service.
    #[must_use]
    pub fn switch_input(service_id: &str, device_path: Option<&str>) -> Self {
        let media_roles = match service_id {
            service::GOOGLECAST => MediaRoles {
                title: Some("Chromecast built-in"),
                icon: Some("skin:iconGooglecast"),
                description: Some("Chromecast built-in"),
                do_not_track: Some(true),
                ..MediaRoles::broadcast(MetaData {
                    live: Some(true),
                    ..MetaData::new(service_id)
                })
            },
            service::BLUETOOTH => MediaRoles {
                do_not_track: Some(true),
                value: device_path.map(TypedValue::string),
                ..MediaRoles::broadcast(MetaData {
                    play_logic_path: Some("bluetooth:playlogic"),
                    ..MetaData::new(service_id)
                })
            },
            _ => MediaRoles::broadcast(MetaData::new(service_id)),
        };

        Self {
            control: Self::PLAY,
            media_roles,
        }
    }
}

impl MediaRoles {
    fn broadcast(meta_data: MetaData) -> Self {
        Self {
            typ: Control::AUDIO,
            audio_type: Control::AUDIO_BROADCAST,
            media_data: MediaData { meta_data },
            title: None,
            icon: None,
            description: None,
            do_not_track: None,
            value: None,
        }
    }
}

impl MetaData {
    fn new(service_id: &str) -> Self {
        Self {
            service_id: service_id.to_owned(),
            live: None,
            play_logic_path: None,
        }
    }
}
