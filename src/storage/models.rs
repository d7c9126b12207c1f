//! Registry records.
//!
//! These models mirror the rows the device registry keeps: devices, drivers,
//! device/driver links and the per-submission device tree.

use serde::{Deserialize, Serialize};

use crate::devices::HwBus;

/// Registry key of any record.
pub type RecordKey = u64;

/// A known device, identified by `(bus, vendor_id, product_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub key: RecordKey,
    pub bus: HwBus,
    pub vendor_id: String,
    pub product_id: String,
    pub name: String,
}

/// A kernel driver, identified by `(package_name, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverRecord {
    pub key: RecordKey,
    pub package_name: String,
    pub name: String,
}

/// A device as driven by one driver (or by no known driver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDriverLinkRecord {
    pub key: RecordKey,
    pub device: RecordKey,
    pub driver: Option<RecordKey>,
}

/// One device seen in one submission.
///
/// `parent` points at the submission device of the nearest registered
/// ancestor so the tree shape is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionDeviceRecord {
    pub key: RecordKey,
    pub device_driver_link: RecordKey,
    pub submission_key: String,
    pub parent: Option<RecordKey>,
    pub local_id: i64,
}

/// Full registry content, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub devices: Vec<DeviceRecord>,
    pub drivers: Vec<DriverRecord>,
    pub device_driver_links: Vec<DeviceDriverLinkRecord>,
    pub submission_devices: Vec<SubmissionDeviceRecord>,
}

impl RegistrySnapshot {
    pub fn submission_devices_of<'a>(
        &'a self,
        submission_key: &'a str,
    ) -> impl Iterator<Item = &'a SubmissionDeviceRecord> + 'a {
        self.submission_devices
            .iter()
            .filter(move |record| record.submission_key == submission_key)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
