//! Selectable input sources.

use std::collections::{btree_map, BTreeMap};

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::{bluetooth::BluetoothDevice, service};

/// One selectable source.
///
/// `service_id` is what gets sent to the player when switching; Bluetooth
/// descriptors for a specific peer also carry its `device_path`.
#[skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputDescriptor {
    pub service_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub typ: String,
    pub device_path: Option<String>,
    pub device_name: Option<String>,
}

impl InputDescriptor {
    /// Descriptor of a service, without a specific device.
    #[must_use]
    pub fn service(service_id: &str, name: &str) -> Self {
        Self {
            service_id: service_id.to_owned(),
            name: name.to_owned(),
            typ: service_id.to_owned(),
            device_path: None,
            device_name: None,
        }
    }

    /// Descriptor of a specific Bluetooth peer.
    #[must_use]
    pub fn bluetooth_device(device_path: &str, device_name: &str) -> Self {
        Self {
            service_id: service::BLUETOOTH.to_owned(),
            name: format!("Bluetooth - {device_name}"),
            typ: service::BLUETOOTH.to_owned(),
            device_path: Some(device_path.to_owned()),
            device_name: Some(device_name.to_owned()),
        }
    }
}

impl From<&BluetoothDevice> for InputDescriptor {
    fn from(device: &BluetoothDevice) -> Self {
        Self::bluetooth_device(&device.path, &device.name)
    }
}

/// Input descriptors keyed by input id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputSet(BTreeMap<String, InputDescriptor>);

impl InputSet {
    /// Options shown when no inputs are known at all.
    pub const FALLBACK_OPTIONS: [&'static str; 2] = ["Google Cast", "Bluetooth"];

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the descriptor for `input_id`.
    pub fn insert(&mut self, input_id: impl Into<String>, descriptor: InputDescriptor) {
        self.0.insert(input_id.into(), descriptor);
    }

    #[must_use]
    pub fn get(&self, input_id: &str) -> Option<&InputDescriptor> {
        self.0.get(input_id)
    }

    #[must_use]
    pub fn contains(&self, input_id: &str) -> bool {
        self.0.contains_key(input_id)
    }

    /// Finds a descriptor by its display name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<(&str, &InputDescriptor)> {
        self.0
            .iter()
            .find(|(_, descriptor)| descriptor.name == name)
            .map(|(id, descriptor)| (id.as_str(), descriptor))
    }

    /// Display names, or [`Self::FALLBACK_OPTIONS`] when empty.
    #[must_use]
    pub fn options(&self) -> Vec<String> {
        if self.0.is_empty() {
            return Self::FALLBACK_OPTIONS.map(str::to_owned).to_vec();
        }
        self.0.values().map(|descriptor| descriptor.name.clone()).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, InputDescriptor> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a InputSet {
    type Item = (&'a String, &'a InputDescriptor);
    type IntoIter = btree_map::Iter<'a, String, InputDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<(String, InputDescriptor)> for InputSet {
    fn from_iter<I: IntoIterator<Item = (String, InputDescriptor)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> InputSet {
        let mut inputs = InputSet::new();
        inputs.insert("googlecast", InputDescriptor::service("googlecast", "Google Cast"));
        inputs.insert(
            "bluetooth_64_e7_d8_6d_ad_c3",
            InputDescriptor::bluetooth_device("/org/bluez/hci0/dev_64_E7_D8_6D_AD_C3", "Phone"),
        );
        inputs
    }

    #[test]
    fn options_are_display_names() {
        let options = inputs().options();
        assert_eq!(options.len(), 2);
        assert!(options.contains(&"Google Cast".to_owned()));
        assert!(options.contains(&"Bluetooth - Phone".to_owned()));
    }

    #[test]
    fn empty_set_falls_back() {
        assert_eq!(InputSet::new().options(), vec!["Google Cast", "Bluetooth"]);
    }

    #[test]
    fn finds_by_name() {
        let inputs = inputs();
        let (id, descriptor) = inputs.find_by_name("Bluetooth - Phone").unwrap();
        assert_eq!(id, "bluetooth_64_e7_d8_6d_ad_c3");
        assert_eq!(descriptor.service_id, "bluetooth");
        assert_eq!(
            descriptor.device_path.as_deref(),
            Some("/org/bluez/hci0/dev_64_E7_D8_6D_AD_C3")
        );
        assert!(inputs.find_by_name("Tidal Connect").is_none());
    }

    #[test]
    fn serializes_type_field() {
        let json = serde_json::to_value(InputDescriptor::service("airplay", "AirPlay")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"service_id": "airplay", "name": "AirPlay", "type": "airplay"})
        );
    }
}
