//! Bluetooth object paths and the input identifiers derived from them.
//!
//! The speaker names Bluetooth peers by their BlueZ object path, for
//! example `/org/bluez/hci0/dev_64_E7_D8_6D_AD_C3`. The `dev_` segment
//! embeds the peer's MAC address with underscores instead of colons.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::service;

/// Lowercase, colon-separated MAC address.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress(String);

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid MAC address: {0}")]
pub struct InvalidMacAddress(String);

impl MacAddress {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Input identifier of this device: `bluetooth_64_e7_d8_6d_ad_c3`.
    #[must_use]
    pub fn input_id(&self) -> String {
        format!("{}_{}", service::BLUETOOTH, self.0.replace(':', "_"))
    }
}

/// Parses six hex pairs separated by either `:` or `_`.
impl FromStr for MacAddress {
    type Err = InvalidMacAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let octets: Vec<&str> = s.split([':', '_']).collect();
        let valid = octets.len() == 6
            && octets
                .iter()
                .all(|octet| octet.len() == 2 && octet.chars().all(|c| c.is_ascii_hexdigit()));
        if !valid {
            return Err(InvalidMacAddress(s.to_owned()));
        }

        Ok(Self(octets.join(":").to_ascii_lowercase()))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = InvalidMacAddress;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A BlueZ device object path with its MAC address parsed out.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BluetoothPath {
    path: String,
    mac: MacAddress,
}

impl BluetoothPath {
    const DEVICE_PREFIX: &'static str = "dev_";

    /// Parses a device path.
    ///
    /// The `dev_` segment is normally the last one; paths pointing below a
    /// device (such as `.../dev_XX_XX_XX_XX_XX_XX/fd0`) carry it second to
    /// last. Returns `None` when neither segment holds a valid MAC address.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.split('/').collect();
        if segments.len() < 3 {
            return None;
        }

        let mac = segments
            .iter()
            .rev()
            .take(2)
            .filter_map(|segment| segment.strip_prefix(Self::DEVICE_PREFIX))
            .find_map(|mac| mac.parse::<MacAddress>().ok())?;

        Some(Self {
            path: path.to_owned(),
            mac,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn mac(&self) -> &MacAddress {
        &self.mac
    }

    #[must_use]
    pub fn input_id(&self) -> String {
        self.mac.input_id()
    }
}

impl fmt::Display for BluetoothPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

/// Input identifier for a device path.
///
/// Falls back to the path itself, lowercased with every non-alphanumeric
/// character replaced by `_`, when it holds no parseable MAC address.
#[must_use]
pub fn input_id_for_path(path: &str) -> String {
    if let Some(parsed) = BluetoothPath::parse(path) {
        return parsed.input_id();
    }

    let sanitized: String = path
        .trim_matches('/')
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_{sanitized}", service::BLUETOOTH)
}

/// A Bluetooth peer seen playing on the speaker.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BluetoothDevice {
    pub name: String,
    pub mac: MacAddress,
    pub path: String,
}
