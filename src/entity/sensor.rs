//! Diagnostic sensors.
//!
//! Every sensor reads one key from the latest snapshot: first from the
//! system settings, then from the status page.

use std::sync::Arc;

use crate::{client::DeviceApi, coordinator::Coordinator, nsdk::Scalar};

use super::{unique_id, DeviceClass, DeviceInfo, EntityCategory};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SensorDescription {
    pub key: &'static str,
    pub name: &'static str,
    pub device_class: Option<DeviceClass>,
}

impl SensorDescription {
    const fn new(key: &'static str, name: &'static str) -> Self {
        Self {
            key,
            name,
            device_class: None,
        }
    }
}

pub const SENSORS: [SensorDescription; 9] = [
    SensorDescription::new("device_version", "Device Version"),
    SensorDescription::new("airplay_version", "AirPlay Version"),
    SensorDescription::new("cast_version", "Cast Version"),
    SensorDescription::new("ip_cidr", "IP (CIDR)"),
    SensorDescription::new("gateway", "Gateway"),
    SensorDescription::new("dns", "DNS"),
    SensorDescription::new("mac", "MAC Address"),
    SensorDescription::new("serial", "Serial Number"),
    SensorDescription {
        key: "uptime",
        name: "Device Uptime",
        device_class: Some(DeviceClass::Duration),
    },
];

pub struct Sensor<D: DeviceApi + ?Sized> {
    coordinator: Arc<Coordinator<D>>,
    description: SensorDescription,
    unique_id: String,
    device_info: DeviceInfo,
}

impl<D: DeviceApi + ?Sized> Sensor<D> {
    pub const ENTITY_CATEGORY: EntityCategory = EntityCategory::Diagnostic;

    #[must_use]
    pub fn new(
        coordinator: Arc<Coordinator<D>>,
        entry_id: &str,
        device_info: DeviceInfo,
        description: SensorDescription,
    ) -> Self {
        Self {
            coordinator,
            unique_id: unique_id(entry_id, description.key),
            description,
            device_info,
        }
    }

    /// One sensor per entry of [`SENSORS`].
    #[must_use]
    pub fn all(
        coordinator: &Arc<Coordinator<D>>,
        entry_id: &str,
        device_info: &DeviceInfo,
    ) -> Vec<Self> {
        SENSORS
            .iter()
            .map(|description| {
                Self::new(
                    Arc::clone(coordinator),
                    entry_id,
                    device_info.clone(),
                    *description,
                )
            })
            .collect()
    }

    #[must_use]
    pub fn key(&self) -> &'static str {
        self.description.key
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.description.name
    }

    #[must_use]
    pub fn device_class(&self) -> Option<DeviceClass> {
        self.description.device_class
    }

    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    #[must_use]
    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    #[must_use]
    pub fn available(&self) -> bool {
        self.coordinator.available()
    }

    #[must_use]
    pub fn native_value(&self) -> Option<Scalar> {
        self.coordinator.data()?.info(self.description.key)
    }
}
