//! Wire model of the speaker's NSDK control API.
//!
//! The API is exposed over two GET endpoints:
//! * `/api/getData?path=&roles=` returning a JSON array of values
//! * `/api/setData?path=&role=&value=<json>` accepting a JSON-encoded value
//!
//! Values are addressed by paths such as `settings:/deviceName` or
//! `player:player/data`. Scalars usually arrive as typed values
//! (`{"type": "string_", "string_": "..."}`) but sometimes bare; see
//! [`value`].
//!
//! This module holds the types and pure parsing rules. Talking to the
//! speaker is up to [`crate::transport`] and [`crate::client`].

pub mod bluetooth;
pub mod control;
pub mod input;
pub mod player;
pub mod status;
pub mod system;
pub mod value;

pub use bluetooth::{BluetoothDevice, BluetoothPath, MacAddress};
pub use control::{Control, Role};
pub use input::{InputDescriptor, InputSet};
pub use player::PlayerState;
pub use status::StatusPage;
pub use system::SystemInfo;
pub use value::{Scalar, TypedValue};

/// Player data, read side.
pub const PATH_PLAYER_DATA: &str = "player:player/data";

/// Player control, write side.
pub const PATH_PLAYER_CONTROL: &str = "player:player/control";

/// User-visible speaker name.
pub const PATH_DEVICE_NAME: &str = "settings:/deviceName";

/// Human-readable status page with versions and network settings.
pub const PATH_STATUS_PAGE: &str = "/index.fcgi";

/// Default role for reads.
pub const ROLES_VALUE: &str = "value";

/// Service identifiers as reported in `mediaData.metaData.serviceID`.
pub mod service {
    pub const GOOGLECAST: &str = "googlecast";
    pub const BLUETOOTH: &str = "bluetooth";
    pub const AIRPLAY: &str = "airplay";
    pub const SPOTIFY: &str = "spotify";
    pub const ROON: &str = "roon";
    pub const TIDAL: &str = "tidalConnect";
    pub const UPNP: &str = "upnpRenderer";

    /// Services whose presence is probed through `settings:/<service id>`,
    /// with their display names.
    pub const PROBED: [(&str, &str); 5] = [
        (AIRPLAY, "AirPlay"),
        (SPOTIFY, "Spotify Connect"),
        (ROON, "Roon"),
        (TIDAL, "Tidal Connect"),
        (UPNP, "UPnP/DLNA"),
    ];

    /// Display name of a known service.
    #[must_use]
    pub fn display_name(service_id: &str) -> Option<&'static str> {
        match service_id {
            GOOGLECAST => Some("Google Cast"),
            BLUETOOTH => Some("Bluetooth"),
            other => PROBED
                .iter()
                .find(|(id, _)| *id == other)
                .map(|(_, name)| *name),
        }
    }
}
