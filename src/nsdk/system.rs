//! System settings read one path at a time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::value::Scalar;

/// Settings paths and the keys their values are reported under.
pub const SETTINGS: [(&str, &str); 4] = [
    ("settings:/system/primaryMacAddress", "mac"),
    ("settings:/system/serialNumber", "serial"),
    ("settings:/system/deviceUptime", "uptime"),
    ("settings:/googlecast/castVersion", "cast_version"),
];

/// Whatever subset of [`SETTINGS`] the speaker reported.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemInfo(BTreeMap<String, Scalar>);

impl SystemInfo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Scalar) {
        self.0.insert(key.into(), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Scalar> {
        self.0.get(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(String, Scalar)> for SystemInfo {
    fn from_iter<I: IntoIterator<Item = (String, Scalar)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
