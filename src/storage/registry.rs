//! Device registry.
//!
//! The processor only talks to the `DeviceRegistry` trait. Every call is a
//! lookup-or-create keyed on the natural identity of the record, so
//! processing the same submission twice leaves the registry unchanged.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::models::*;
use crate::devices::HwBus;
use crate::error::RegistryError;

/// Sink for registration requests.
pub trait DeviceRegistry: Send + Sync {
    fn get_or_create_device(
        &self,
        bus: HwBus,
        vendor_id: &str,
        product_id: &str,
        name: &str,
    ) -> Result<RecordKey, RegistryError>;

    fn get_or_create_driver(&self, package_name: &str, name: &str) -> Result<RecordKey, RegistryError>;

    fn get_or_create_device_driver_link(
        &self,
        device: RecordKey,
        driver: Option<RecordKey>,
    ) -> Result<RecordKey, RegistryError>;

    fn get_or_create_submission_device(
        &self,
        device_driver_link: RecordKey,
        submission_key: &str,
        parent: Option<RecordKey>,
        local_id: i64,
    ) -> Result<RecordKey, RegistryError>;
}

#[derive(Debug, Default)]
struct RegistryState {
    devices: Vec<DeviceRecord>,
    drivers: Vec<DriverRecord>,
    links: Vec<DeviceDriverLinkRecord>,
    submission_devices: Vec<SubmissionDeviceRecord>,

    device_index: HashMap<(HwBus, String, String), RecordKey>,
    driver_index: HashMap<(String, String), RecordKey>,
    link_index: HashMap<(RecordKey, Option<RecordKey>), RecordKey>,
    submission_device_index: HashMap<(String, i64), RecordKey>,
}

/// Keys are 1-based positions in the record vectors.
fn next_key(len: usize) -> RecordKey {
    len as RecordKey + 1
}

fn contains_key(len: usize, key: RecordKey) -> bool {
    key >= 1 && key <= len as RecordKey
}

/// Thread-safe in-process registry.
///
/// One mutex guards all tables, which makes every lookup-or-create atomic.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    state: Mutex<RegistryState>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let state = self.state.lock();
        RegistrySnapshot {
            devices: state.devices.clone(),
            drivers: state.drivers.clone(),
            device_driver_links: state.links.clone(),
            submission_devices: state.submission_devices.clone(),
        }
    }

    pub fn device_count(&self) -> usize {
        self.state.lock().devices.len()
    }
}

impl DeviceRegistry for InMemoryRegistry {
    fn get_or_create_device(
        &self,
        bus: HwBus,
        vendor_id: &str,
        product_id: &str,
        name: &str,
    ) -> Result<RecordKey, RegistryError> {
        let mut state = self.state.lock();
        let index_key = (bus, vendor_id.to_string(), product_id.to_string());
        if let Some(key) = state.device_index.get(&index_key) {
            return Ok(*key);
        }

        let key = next_key(state.devices.len());
        state.devices.push(DeviceRecord {
            key,
            bus,
            vendor_id: vendor_id.to_string(),
            product_id: product_id.to_string(),
            name: name.to_string(),
        });
        state.device_index.insert(index_key, key);
        log::debug!(
            "REGISTRY_DEVICE_CREATED key={} bus={} vendor_id={} product_id={}",
            key,
            bus,
            vendor_id,
            product_id
        );
        Ok(key)
    }

    fn get_or_create_driver(&self, package_name: &str, name: &str) -> Result<RecordKey, RegistryError> {
        let mut state = self.state.lock();
        let index_key = (package_name.to_string(), name.to_string());
        if let Some(key) = state.driver_index.get(&index_key) {
            return Ok(*key);
        }

        let key = next_key(state.drivers.len());
        state.drivers.push(DriverRecord {
            key,
            package_name: package_name.to_string(),
            name: name.to_string(),
        });
        state.driver_index.insert(index_key, key);
        Ok(key)
    }

    fn get_or_create_device_driver_link(
        &self,
        device: RecordKey,
        driver: Option<RecordKey>,
    ) -> Result<RecordKey, RegistryError> {
        let mut state = self.state.lock();
        if !contains_key(state.devices.len(), device) {
            return Err(RegistryError::UnknownKey { kind: "device", key: device });
        }
        if let Some(driver) = driver {
            if !contains_key(state.drivers.len(), driver) {
                return Err(RegistryError::UnknownKey { kind: "driver", key: driver });
            }
        }
        if let Some(key) = state.link_index.get(&(device, driver)) {
            return Ok(*key);
        }

        let key = next_key(state.links.len());
        state.links.push(DeviceDriverLinkRecord { key, device, driver });
        state.link_index.insert((device, driver), key);
        Ok(key)
    }

    fn get_or_create_submission_device(
        &self,
        device_driver_link: RecordKey,
        submission_key: &str,
        parent: Option<RecordKey>,
        local_id: i64,
    ) -> Result<RecordKey, RegistryError> {
        let mut state = self.state.lock();
        if !contains_key(state.links.len(), device_driver_link) {
            return Err(RegistryError::UnknownKey {
                kind: "device driver link",
                key: device_driver_link,
            });
        }
        if let Some(parent) = parent {
            if !contains_key(state.submission_devices.len(), parent) {
                return Err(RegistryError::UnknownKey {
                    kind: "submission device",
                    key: parent,
                });
            }
        }
        let index_key = (submission_key.to_string(), local_id);
        if let Some(key) = state.submission_device_index.get(&index_key) {
            return Ok(*key);
        }

        let key = next_key(state.submission_devices.len());
        state.submission_devices.push(SubmissionDeviceRecord {
            key,
            device_driver_link,
            submission_key: submission_key.to_string(),
            parent,
            local_id,
        });
        state.submission_device_index.insert(index_key, key);
        Ok(key)
    }
}
