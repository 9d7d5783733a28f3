//! Semantic operations on a speaker.
//!
//! [`DeviceApi`] is what the coordinator, the entities and setup talk to.
//! Its required methods map one to one onto NSDK reads and writes; the
//! provided methods derive everything else from those, so that another
//! implementation (or a test double) only has to supply the primitives.
//!
//! [`Client`] implements it over HTTP through a [`Transport`].

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;

use crate::{
    config::Config,
    error::Result,
    http::Client as HttpClient,
    nsdk::{
        self, service, system, BluetoothDevice, BluetoothPath, Control, InputDescriptor, InputSet,
        PlayerState, Role, StatusPage, SystemInfo, TypedValue,
    },
    transport::Transport,
};

/// Bluetooth peers keyed by device path.
pub type BluetoothDevices = BTreeMap<String, BluetoothDevice>;

#[async_trait]
pub trait DeviceApi: Send + Sync {
    /// The speaker's name; `None` if it reports none or in an unknown shape.
    async fn get_device_name(&self) -> Result<Option<String>>;

    /// Renames the speaker. Returns whether the speaker accepted it.
    async fn set_device_name(&self, name: &str) -> bool;

    /// The player state; `None` if the speaker reports none.
    async fn get_player_state(&self) -> Result<Option<PlayerState>>;

    /// System settings, best effort per setting. Never fails.
    async fn get_system_info(&self) -> SystemInfo;

    /// Versions and network settings from the status page. Never fails;
    /// an unreachable page yields an empty result.
    async fn get_versions_and_network(&self) -> StatusPage;

    /// Whether the speaker has settings for `service_id`, meaning that it
    /// supports the service.
    async fn probe_service(&self, service_id: &str) -> Result<bool>;

    /// Switches to `service_id`, optionally to the Bluetooth peer at
    /// `device_path`. Returns whether the speaker accepted it.
    async fn switch_input(&self, service_id: &str, device_path: Option<&str>) -> bool;

    /// Identifier of the active input, `None` if nothing is playing.
    async fn get_current_input(&self) -> Result<Option<String>> {
        Ok(self
            .get_player_state()
            .await?
            .and_then(|state| state.current_input()))
    }

    /// Bluetooth peer currently playing, as a map with at most one entry.
    ///
    /// The speaker has no endpoint listing paired devices, so a peer is only
    /// discovered while it is the active input.
    async fn discover_bluetooth_devices(&self) -> Result<BluetoothDevices> {
        let mut devices = BluetoothDevices::new();

        let Some(state) = self.get_player_state().await? else {
            return Ok(devices);
        };
        if state.is_stopped() {
            return Ok(devices);
        }

        if let Some(path) = state.bluetooth_device_path().and_then(BluetoothPath::parse) {
            let name = state.title().unwrap_or("Unknown Device").to_owned();
            debug!("found bluetooth device {name} at {path}");
            devices.insert(
                path.as_str().to_owned(),
                BluetoothDevice {
                    name,
                    mac: path.mac().clone(),
                    path: path.as_str().to_owned(),
                },
            );
        }

        Ok(devices)
    }

    /// All inputs the speaker offers.
    ///
    /// Google Cast is always offered. Bluetooth is offered as the active
    /// peer if there is one, and generically otherwise. The remaining
    /// services are offered when probing finds their settings.
    async fn discover_available_inputs(&self) -> Result<InputSet> {
        let mut inputs = InputSet::new();
        inputs.insert(
            service::GOOGLECAST,
            InputDescriptor::service(service::GOOGLECAST, "Google Cast"),
        );

        let devices = self.discover_bluetooth_devices().await?;
        for device in devices.values() {
            inputs.insert(device.mac.input_id(), InputDescriptor::from(device));
        }
        if devices.is_empty() {
            inputs.insert(
                service::BLUETOOTH,
                InputDescriptor::service(service::BLUETOOTH, "Bluetooth"),
            );
        }

        for (service_id, name) in service::PROBED {
            if self.probe_service(service_id).await? {
                inputs.insert(service_id, InputDescriptor::service(service_id, name));
            }
        }

        debug!("discovered {} inputs", inputs.len());
        Ok(inputs)
    }
}

/// NSDK client for one speaker.
#[derive(Clone)]
pub struct Client {
    transport: Transport,
}

impl Client {
    /// Creates a client with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the HTTP client cannot be built or the host does
    /// not make a valid URL.
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = Arc::new(HttpClient::new(config)?);
        Self::with_http_client(config, http_client)
    }

    /// Creates a client sharing an existing HTTP client.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the host does not make a valid URL.
    pub fn with_http_client(config: &Config, http_client: Arc<HttpClient>) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(config, http_client)?,
        })
    }

    #[must_use]
    pub fn transport(&self) -> &Transport {
        &self.transport
    }
}

#[async_trait]
impl DeviceApi for Client {
    async fn get_device_name(&self) -> Result<Option<String>> {
        let name = self
            .transport
            .get_first::<TypedValue>(nsdk::PATH_DEVICE_NAME)
            .await?;
        Ok(name.and_then(TypedValue::into_string))
    }

    async fn set_device_name(&self, name: &str) -> bool {
        self.transport
            .set_data(nsdk::PATH_DEVICE_NAME, &TypedValue::string(name), Role::Value)
            .await
    }

    async fn get_player_state(&self) -> Result<Option<PlayerState>> {
        self.transport.get_first(nsdk::PATH_PLAYER_DATA).await
    }

    async fn get_system_info(&self) -> SystemInfo {
        let mut info = SystemInfo::new();
        for (path, key) in system::SETTINGS {
            match self.transport.get_first::<TypedValue>(path).await {
                Ok(Some(value)) => {
                    if let Some(value) = value.into_scalar() {
                        info.insert(key, value);
                    }
                }
                Ok(None) => {}
                Err(e) => debug!("failed to read {path}: {e}"),
            }
        }
        info
    }

    async fn get_versions_and_network(&self) -> StatusPage {
        match self.transport.status_page().await {
            Ok(text) => StatusPage::parse(&text),
            Err(e) => {
                debug!("failed to fetch status page: {e}");
                StatusPage::default()
            }
        }
    }

    async fn probe_service(&self, service_id: &str) -> Result<bool> {
        let data = self
            .transport
            .get_data(&format!("settings:/{service_id}"), nsdk::ROLES_VALUE)
            .await?;
        Ok(!data.is_empty())
    }

    async fn switch_input(&self, service_id: &str, device_path: Option<&str>) -> bool {
        let control = Control::switch_input(service_id, device_path);
        self.transport
            .set_data(nsdk::PATH_PLAYER_CONTROL, &control, Role::Activate)
            .await
    }
}
