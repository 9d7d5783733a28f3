//! Speaker instances and their lifecycle.
//!
//! Setting up a speaker takes two steps:
//! 1. [`validate_input`] checks that the speaker answers, optionally
//!    renames it and discovers its inputs.
//! 2. [`Instance::setup`] runs the first poll and builds the entities from
//!    the stored options.
//!
//! A [`Registry`] keeps the running instances by entry id, polls them in
//! the background and tears them down again.

use std::{collections::HashMap, sync::Arc};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    client::DeviceApi,
    config::Config,
    coordinator::Coordinator,
    entity::{button, Button, ButtonAction, DeviceInfo, InputSelect, Sensor},
    error::{Error, Result},
    nsdk::InputSet,
    options::{Options, OptionsStore},
};

/// Outcome of [`validate_input`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetupInfo {
    pub title: String,
    pub unique_id: String,
    pub available_inputs: InputSet,
}

/// Checks that the speaker at `config.host` can be set up.
///
/// The title is the speaker's name. When `config.name` is set and differs,
/// the speaker is renamed first; a rejected rename is logged and setup
/// continues with the discovered name.
///
/// # Errors
///
/// Will return `Err` if the speaker reports neither a name nor a player
/// state, or does not answer at all.
pub async fn validate_input<D: DeviceApi + ?Sized>(device: &D, config: &Config) -> Result<SetupInfo> {
    let mut title = device
        .get_device_name()
        .await?
        .filter(|name| !name.is_empty());

    if title.is_none() && device.get_player_state().await?.is_none() {
        return Err(Error::unavailable(format!(
            "cannot connect to speaker at {}",
            config.host
        )));
    }

    let requested = config
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    if let Some(name) = requested {
        if title.as_deref() != Some(name) {
            if device.set_device_name(name).await {
                title = Some(name.to_owned());
            } else {
                warn!("failed to set device name on speaker; continuing with discovered name");
            }
        }
    }

    let available_inputs = device.discover_available_inputs().await?;
    Ok(SetupInfo {
        title: title
            .or_else(|| requested.map(str::to_owned))
            .unwrap_or_else(|| DeviceInfo::DEFAULT_NAME.to_owned()),
        unique_id: config.unique_id(),
        available_inputs,
    })
}

/// One configured speaker with its coordinator and entities.
pub struct Instance<D: DeviceApi + ?Sized> {
    entry_id: String,
    device: Arc<D>,
    coordinator: Arc<Coordinator<D>>,
    options: OptionsStore,
    device_info: DeviceInfo,

    select: InputSelect<D>,
    sensors: Vec<Sensor<D>>,
    buttons: Vec<Button>,

    shutdown: CancellationToken,
    poller: Option<JoinHandle<()>>,
}

impl<D: DeviceApi + ?Sized> Instance<D> {
    /// Sets up an instance from its stored options.
    ///
    /// Without stored inputs, the inputs are discovered live for this
    /// instance only; they are not stored.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the first poll fails or live discovery is needed
    /// and fails.
    pub async fn setup(
        entry_id: impl Into<String>,
        title: impl Into<String>,
        device: Arc<D>,
        options: OptionsStore,
    ) -> Result<Self> {
        let entry_id = entry_id.into();
        let title = title.into();

        let coordinator = Arc::new(Coordinator::new(
            title.as_str(),
            Arc::clone(&device),
            options.options().scan_interval(),
        ));
        coordinator.first_refresh().await?;

        let mut inputs = options.options().available_inputs.clone();
        if inputs.is_empty() {
            warn!("no inputs found in options, discovering...");
            inputs = device.discover_available_inputs().await?;
        }

        if !options.options().log_level.apply() {
            debug!("keeping log level from command line or environment");
        }

        let device_info = DeviceInfo::new(&entry_id, Some(title.as_str()));
        let select = InputSelect::new(
            Arc::clone(&coordinator),
            &entry_id,
            device_info.clone(),
            inputs,
        );
        let sensors = Sensor::all(&coordinator, &entry_id, &device_info);
        let buttons = Button::all(&entry_id, &device_info);

        info!("set up {device_info} with {} inputs", select.inputs().len());

        Ok(Self {
            entry_id,
            device,
            coordinator,
            options,
            device_info,
            select,
            sensors,
            buttons,
            shutdown: CancellationToken::new(),
            poller: None,
        })
    }

    #[must_use]
    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.device_info.name
    }

    #[must_use]
    pub fn device(&self) -> &Arc<D> {
        &self.device
    }

    #[must_use]
    pub fn coordinator(&self) -> &Arc<Coordinator<D>> {
        &self.coordinator
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        self.options.options()
    }

    #[must_use]
    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    #[must_use]
    pub fn select(&self) -> &InputSelect<D> {
        &self.select
    }

    #[must_use]
    pub fn sensors(&self) -> &[Sensor<D>] {
        &self.sensors
    }

    #[must_use]
    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    /// Discovers the inputs again and stores them in place of the old ones.
    ///
    /// # Errors
    ///
    /// Will return `Err` if discovery fails or the options cannot be saved.
    pub async fn rediscover_inputs(&mut self) -> Result<&InputSet> {
        let inputs = self.device.discover_available_inputs().await?;
        info!("rediscovered {} inputs", inputs.len());

        let mut options = self.options.options().clone();
        options.available_inputs = inputs;
        self.apply_options(options)?;
        Ok(self.select.inputs())
    }

    /// Adds a Bluetooth peer to the stored inputs.
    ///
    /// See [`button::resolve_bluetooth_input`] for how the peer is found.
    /// Returns the id of the added input, or `None` if there was nothing to
    /// add.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the player state is needed and cannot be read,
    /// or the options cannot be saved.
    pub async fn add_bluetooth_device(
        &mut self,
        device_path: Option<&str>,
        name: Option<&str>,
    ) -> Result<Option<String>> {
        let Some((input_id, descriptor)) =
            button::resolve_bluetooth_input(&self.coordinator, device_path, name).await?
        else {
            return Ok(None);
        };

        info!("adding {} as input {input_id}", descriptor.name);
        let mut options = self.options.options().clone();
        options.available_inputs.insert(input_id.as_str(), descriptor);
        self.apply_options(options)?;
        Ok(Some(input_id))
    }

    /// Performs the action of a button.
    ///
    /// # Errors
    ///
    /// As the action performed.
    pub async fn press(&mut self, action: ButtonAction) -> Result<()> {
        debug!("{}: pressed {action}", self.entry_id);
        match action {
            ButtonAction::RediscoverInputs => self.rediscover_inputs().await.map(|_| ()),
            ButtonAction::AddBluetoothDevice => {
                self.add_bluetooth_device(None, None).await.map(|_| ())
            }
        }
    }

    /// Stores `options` and applies them to the running instance.
    ///
    /// The input select is rebuilt from the new inputs, the coordinator
    /// polls at the new interval from its next wait on, and the log level
    /// takes effect immediately.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the options cannot be saved. They are applied
    /// regardless.
    pub fn apply_options(&mut self, options: Options) -> Result<()> {
        let saved = self.options.update(options);
        self.apply_stored_options();
        saved
    }

    /// Re-reads the options file and applies it.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the file cannot be read or parsed; the current
    /// options stay in effect.
    pub fn reload_options(&mut self) -> Result<()> {
        self.options.reload()?;
        self.apply_stored_options();
        Ok(())
    }

    fn apply_stored_options(&mut self) {
        let options = self.options.options();

        self.select = InputSelect::new(
            Arc::clone(&self.coordinator),
            &self.entry_id,
            self.device_info.clone(),
            options.available_inputs.clone(),
        );
        self.coordinator.set_update_interval(options.scan_interval());
        let _ = options.log_level.apply();

        debug!(
            "{}: applied options: {} inputs, polling every {}s, log level {}",
            self.entry_id,
            options.available_inputs.len(),
            options.scan_interval().as_secs(),
            options.log_level
        );
    }

    /// Stops background polling, if running, and returns the parts needed to
    /// set the instance up again.
    async fn stop(mut self) -> (String, Arc<D>, OptionsStore) {
        self.shutdown.cancel();
        if let Some(poller) = self.poller.take() {
            if let Err(e) = poller.await {
                error!("{}: polling task failed: {e}", self.entry_id);
            }
        }

        (
            self.device_info.name.clone(),
            Arc::clone(&self.device),
            self.options.clone(),
        )
    }
}

impl<D: DeviceApi + ?Sized> Drop for Instance<D> {
    fn drop(&mut self) {
        // Stops a poller that was never unloaded.
        self.shutdown.cancel();
    }
}

impl<D: DeviceApi + ?Sized + 'static> Instance<D> {
    /// Starts polling in the background until the instance is unloaded.
    pub fn start(&mut self) {
        if self.poller.is_some() {
            return;
        }

        let coordinator = Arc::clone(&self.coordinator);
        let shutdown = self.shutdown.clone();
        self.poller = Some(tokio::spawn(async move {
            coordinator.run(shutdown).await;
        }));
    }
}

/// Running instances by entry id.
pub struct Registry<D: DeviceApi + ?Sized> {
    instances: HashMap<String, Instance<D>>,
}

impl<D: DeviceApi + ?Sized> Default for Registry<D> {
    fn default() -> Self {
        Self {
            instances: HashMap::new(),
        }
    }
}

impl<D: DeviceApi + ?Sized + 'static> Registry<D> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets up an instance and starts polling it.
    ///
    /// # Errors
    ///
    /// Will return `Err` if `entry_id` is already set up or
    /// [`Instance::setup`] fails.
    pub async fn setup(
        &mut self,
        entry_id: impl Into<String>,
        title: impl Into<String>,
        device: Arc<D>,
        options: OptionsStore,
    ) -> Result<&mut Instance<D>> {
        let entry_id = entry_id.into();
        if self.instances.contains_key(&entry_id) {
            return Err(Error::failed_precondition(format!(
                "{entry_id} is already set up"
            )));
        }

        let mut instance = Instance::setup(entry_id.as_str(), title, device, options).await?;
        instance.start();
        Ok(self.instances.entry(entry_id).or_insert(instance))
    }

    /// Stops and removes an instance. Returns whether it was set up.
    pub async fn unload(&mut self, entry_id: &str) -> bool {
        let Some(instance) = self.instances.remove(entry_id) else {
            return false;
        };

        instance.stop().await;
        info!("unloaded {entry_id}");
        true
    }

    /// Unloads an instance and sets it up again from its re-read options.
    ///
    /// # Errors
    ///
    /// Will return `Err` if `entry_id` is not set up, the options cannot be
    /// read, or setup fails. The instance stays unloaded on error.
    pub async fn reload(&mut self, entry_id: &str) -> Result<&mut Instance<D>> {
        let instance = self
            .instances
            .remove(entry_id)
            .ok_or_else(|| Error::not_found(format!("{entry_id} is not set up")))?;

        let (title, device, mut options) = instance.stop().await;
        options.reload()?;
        self.setup(entry_id, title, device, options).await
    }

    #[must_use]
    pub fn get(&self, entry_id: &str) -> Option<&Instance<D>> {
        self.instances.get(entry_id)
    }

    #[must_use]
    pub fn get_mut(&mut self, entry_id: &str) -> Option<&mut Instance<D>> {
        self.instances.get_mut(entry_id)
    }

    #[must_use]
    pub fn contains(&self, entry_id: &str) -> bool {
        self.instances.contains_key(entry_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Unloads every instance.
    pub async fn unload_all(&mut self) {
        let entry_ids: Vec<_> = self.instances.keys().cloned().collect();
        for entry_id in entry_ids {
            self.unload(&entry_id).await;
        }
    }
}
