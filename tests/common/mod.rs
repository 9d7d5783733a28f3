#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use jbl4305p::{
    client::DeviceApi,
    error::{Error, Result},
    nsdk::{PlayerState, Scalar, StatusPage, SystemInfo},
};
use serde_json::{json, Value};

pub const BT_PATH: &str = "/org/bluez/hci0/dev_64_E7_D8_6D_AD_C3";
pub const BT_INPUT: &str = "bluetooth_64_e7_d8_6d_ad_c3";

pub fn playing(service_id: &str) -> Value {
    json!({
        "state": "playing",
        "mediaRoles": {"mediaData": {"metaData": {"serviceID": service_id}}}
    })
}

pub fn bluetooth_playing(title: &str) -> Value {
    json!({
        "state": "playing",
        "mediaRoles": {
            "title": title,
            "value": {"string_": BT_PATH},
            "mediaData": {"metaData": {"serviceID": "bluetooth"}}
        }
    })
}

/// Speaker double answering from in-memory state.
#[derive(Default)]
pub struct FakeSpeaker {
    pub name: Mutex<Option<String>>,
    pub player: Mutex<Option<Value>>,
    pub probed: Mutex<Vec<&'static str>>,
    pub offline: AtomicBool,
    pub reject_writes: AtomicBool,
    pub delay: Mutex<Option<Duration>>,

    pub player_reads: AtomicUsize,
    pub switches: Mutex<Vec<(String, Option<String>)>>,
    pub renames: Mutex<Vec<String>>,
}

impl FakeSpeaker {
    pub fn named(name: &str) -> Self {
        let speaker = Self::default();
        speaker.set_name(Some(name));
        speaker
    }

    pub fn set_name(&self, name: Option<&str>) {
        *self.name.lock().unwrap() = name.map(str::to_owned);
    }

    pub fn set_player(&self, state: Option<Value>) {
        *self.player.lock().unwrap() = state;
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn player_reads(&self) -> usize {
        self.player_reads.load(Ordering::SeqCst)
    }

    pub fn switches(&self) -> Vec<(String, Option<String>)> {
        self.switches.lock().unwrap().clone()
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::unavailable("speaker offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceApi for FakeSpeaker {
    async fn get_device_name(&self) -> Result<Option<String>> {
        self.check_online()?;
        Ok(self.name.lock().unwrap().clone())
    }

    async fn set_device_name(&self, name: &str) -> bool {
        if self.reject_writes.load(Ordering::SeqCst) {
            return false;
        }
        self.renames.lock().unwrap().push(name.to_owned());
        self.set_name(Some(name));
        true
    }

    async fn get_player_state(&self) -> Result<Option<PlayerState>> {
        self.player_reads.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.check_online()?;
        let state = self.player.lock().unwrap().clone();
        Ok(state.map(|state| serde_json::from_value(state).unwrap()))
    }

    async fn get_system_info(&self) -> SystemInfo {
        let mut info = SystemInfo::new();
        info.insert("mac", Scalar::from("00:11:22:33:44:55"));
        info.insert("uptime", Scalar::Integer(86400));
        info
    }

    async fn get_versions_and_network(&self) -> StatusPage {
        StatusPage {
            device_version: Some("1.4.2.3851".to_owned()),
            gateway: Some("192.168.1.1".to_owned()),
            ..StatusPage::default()
        }
    }

    async fn probe_service(&self, service_id: &str) -> Result<bool> {
        self.check_online()?;
        Ok(self.probed.lock().unwrap().contains(&service_id))
    }

    async fn switch_input(&self, service_id: &str, device_path: Option<&str>) -> bool {
        if self.reject_writes.load(Ordering::SeqCst) {
            return false;
        }
        self.switches
            .lock()
            .unwrap()
            .push((service_id.to_owned(), device_path.map(str::to_owned)));
        true
    }
}
