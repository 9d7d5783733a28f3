//! Input source selection.

use std::sync::Arc;

use crate::{
    client::DeviceApi,
    coordinator::Coordinator,
    error::{Error, Result},
    nsdk::InputSet,
};

use super::{unique_id, DeviceInfo};

/// Select entity choosing between the stored inputs of a speaker.
pub struct InputSelect<D: DeviceApi + ?Sized> {
    coordinator: Arc<Coordinator<D>>,
    inputs: InputSet,
    unique_id: String,
    device_info: DeviceInfo,
}

impl<D: DeviceApi + ?Sized> InputSelect<D> {
    pub const NAME: &'static str = "Input Source";
    pub const ICON: &'static str = "mdi:speaker";
    const SUFFIX: &'static str = "input_source";

    #[must_use]
    pub fn new(
        coordinator: Arc<Coordinator<D>>,
        entry_id: &str,
        device_info: DeviceInfo,
        inputs: InputSet,
    ) -> Self {
        Self {
            coordinator,
            inputs,
            unique_id: unique_id(entry_id, Self::SUFFIX),
            device_info,
        }
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
    pub fn inputs(&self) -> &InputSet {
        &self.inputs
    }

    /// Display names of all inputs, with a fixed fallback when none are
    /// known.
    #[must_use]
    pub fn options(&self) -> Vec<String> {
        self.inputs.options()
    }

    /// Display name of the active input.
    ///
    /// `None` when nothing plays or the active input is not one of the
    /// stored inputs.
    #[must_use]
    pub fn current_option(&self) -> Option<String> {
        let snapshot = self.coordinator.data()?;
        let input_id = snapshot.current_input.as_deref()?;
        self.inputs
            .get(input_id)
            .map(|descriptor| descriptor.name.clone())
    }

    /// Switches the speaker to the input named `option`.
    ///
    /// On success a refresh is requested so that the new input shows up
    /// without waiting for the next poll.
    ///
    /// # Errors
    ///
    /// Will return `Err` if `option` names no stored input or the speaker
    /// rejects the switch.
    pub async fn select_option(&self, option: &str) -> Result<()> {
        let Some((_, descriptor)) = self.inputs.find_by_name(option) else {
            error!("unknown input option: {option}");
            return Err(Error::not_found(format!("unknown input option: {option}")));
        };

        let service_id = descriptor.service_id.as_str();
        info!("switching to input: {option} (service: {service_id})");

        let device = self.coordinator.device();
        if !device
            .switch_input(service_id, descriptor.device_path.as_deref())
            .await
        {
            error!("failed to switch input to: {option}");
            return Err(Error::unavailable(format!(
                "failed to switch input to: {option}"
            )));
        }

        // Failures are published and logged by the coordinator.
        let _ = self.coordinator.refresh().await;
        Ok(())
    }
}
