//! Per-device classification.
//!
//! Everything here is computed on demand from the node's properties and its
//! neighbours; nodes are never mutated. Order of use during registration:
//! - `is_real_device` decides whether a node stands for a physical device
//! - `has_reliable_data` decides whether a real device may be registered
//! - `vendor_id_for_db` / `product_id_for_db` / `product` give the registry key

use std::fmt;

use serde::{Deserialize, Serialize};

use super::bus::*;
use super::tree::HalDevice;
use crate::logging::warnings::WarningCategory;
use crate::values::TypedValue;

/// Vendor or product identifier as found in the submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceId {
    Numeric(i64),
    Name(String),
}

impl DeviceId {
    fn from_value(value: &TypedValue) -> Self {
        match value {
            TypedValue::Int(v) => DeviceId::Numeric(*v),
            TypedValue::Str(v) => DeviceId::Name(v.clone()),
            other => DeviceId::Name(other.to_string()),
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceId::Numeric(v) => write!(f, "{}", v),
            DeviceId::Name(v) => f.write_str(v),
        }
    }
}

const SCSI_VENDOR_WIDTH: usize = 8;
const SCSI_MODEL_WIDTH: usize = 16;

fn text_of(value: &TypedValue) -> String {
    match value {
        TypedValue::Str(v) => v.clone(),
        other => other.to_string(),
    }
}

impl<'t> HalDevice<'t> {
    /// Bus as stated by the submission: `info.bus`, else `info.subsystem`.
    pub fn raw_bus(&self) -> Option<&'t str> {
        self.str_property("info.bus")
            .or_else(|| self.str_property("info.subsystem"))
    }

    pub fn pci_class(&self) -> Option<i64> {
        self.int_property("pci.device_class")
    }

    pub fn pci_subclass(&self) -> Option<i64> {
        self.int_property("pci.device_subclass")
    }

    pub fn driver_name(&self) -> Option<&'t str> {
        self.str_property("info.linux.driver")
    }

    fn warn(&self, category: WarningCategory, message: &str) {
        self.ctx().warn_device(self.udi(), category, message);
    }

    /// Best inference of the physical bus. `None` means unknown.
    ///
    /// The root always stands for the computer, whatever bus it reports.
    pub fn real_bus(&self) -> Option<HwBus> {
        if self.is_root() {
            return Some(HwBus::System);
        }
        let raw_bus = self.raw_bus()?;

        if let Some(bus) = simple_bus(raw_bus) {
            return Some(bus);
        }
        match raw_bus {
            "scsi" => self.translate_scsi_bus(),
            "pci" => Some(self.translate_pci_bus()),
            // Aspect nodes; not real devices, nothing to warn about.
            "usb" | "ssb" | "scsi_host" => None,
            other => {
                self.warn(
                    WarningCategory::UnknownBus,
                    &format!("unknown bus {:?} for device {}", other, self.udi()),
                );
                None
            }
        }
    }

    /// Recover the bus behind the kernel's SCSI emulation.
    ///
    /// The grandparent is the storage controller: a PCI controller names the
    /// bus through its storage subclass; behind USB the bus cannot be told
    /// (card reader, memory stick or bridged disk).
    fn translate_scsi_bus(&self) -> Option<HwBus> {
        let Some(controller) = self.parent().and_then(|parent| parent.parent()) else {
            self.warn(
                WarningCategory::ScsiWithoutGrandparent,
                &format!("found SCSI device without a grandparent: {}", self.udi()),
            );
            return None;
        };

        match controller.raw_bus() {
            Some("pci") => {
                if controller.pci_class() != Some(PCI_CLASS_STORAGE) {
                    self.warn(
                        WarningCategory::ScsiNonStorageController,
                        &format!(
                            "unexpected parent of SCSI device {}: class {:?}",
                            self.udi(),
                            controller.pci_class()
                        ),
                    );
                    return None;
                }
                let bus = controller.pci_subclass().and_then(storage_subclass_bus);
                if bus.is_none() {
                    self.warn(
                        WarningCategory::ScsiUnknownStorageSubclass,
                        &format!(
                            "unknown storage controller subclass {:?} for SCSI device {}",
                            controller.pci_subclass(),
                            self.udi()
                        ),
                    );
                }
                bus
            }
            Some("usb") => None,
            _ => Some(HwBus::Scsi),
        }
    }

    /// CardBus controllers are PCI bridges; their children are PC cards.
    fn translate_pci_bus(&self) -> HwBus {
        let behind_cardbus = self.parent().is_some_and(|parent| {
            parent.pci_class() == Some(PCI_CLASS_BRIDGE)
                && parent.pci_subclass() == Some(PCI_SUBCLASS_BRIDGE_CARDBUS)
        });
        if behind_cardbus {
            HwBus::PcCard
        } else {
            HwBus::Pci
        }
    }

    /// Whether this node stands for a physical device rather than an aspect
    /// of one exposed by the driver stack.
    pub fn is_real_device(&self) -> bool {
        if self.is_root() {
            return true;
        }
        match self.raw_bus() {
            None => false,
            Some(raw_bus) if ASPECT_BUSES.contains(&raw_bus) => false,
            Some("usb_device") => !self.is_usb_host_controller_node(),
            Some("scsi") => self.real_bus().is_some(),
            Some(_) => true,
        }
    }

    /// USB nodes with vendor and product ID 0 describe the root hub of a
    /// host controller, not a device of their own.
    fn is_usb_host_controller_node(&self) -> bool {
        let zero = Some(DeviceId::Numeric(0));
        if self.vendor_id() != zero || self.product_id() != zero {
            return false;
        }
        let under_usb_controller = self.parent().is_some_and(|parent| {
            parent.raw_bus() == Some("pci")
                && parent.pci_class() == Some(PCI_CLASS_SERIALBUS_CONTROLLER)
                && parent.pci_subclass() == Some(PCI_SUBCLASS_SERIALBUS_USB)
        });
        if !under_usb_controller {
            self.warn(
                WarningCategory::ZeroUsbIds,
                &format!(
                    "USB device {} with vendor and product ID 0 is not a USB host controller",
                    self.udi()
                ),
            );
        }
        true
    }

    /// Real devices below this node, skipping aspect nodes.
    ///
    /// Non-real children are replaced by their own real descendants. IEEE
    /// 1394 children are dropped together with everything below them.
    pub fn real_children(&self) -> Vec<HalDevice<'t>> {
        let mut found = Vec::new();
        let mut pending: Vec<usize> = self.child_indices().iter().rev().copied().collect();

        while let Some(index) = pending.pop() {
            let child = self.tree.device(index);
            if child.raw_bus() == Some("ieee1394") {
                continue;
            }
            if child.is_real_device() {
                found.push(child);
            } else {
                pending.extend(child.child_indices().iter().rev());
            }
        }
        found
    }

    /// Whether a real device carries enough trustworthy data to be
    /// registered.
    pub fn has_reliable_data(&self) -> bool {
        let raw_bus = self.raw_bus();
        if raw_bus == Some("unknown") && !self.is_root() {
            return false;
        }
        if raw_bus.is_some_and(|bus| UNRELIABLE_BUSES.contains(&bus)) {
            return false;
        }

        let bus = self.real_bus();
        let vendor_id = self.vendor_id();
        let product_id = self.product_id();
        let product = self.product();
        if bus.is_some() && vendor_id.is_some() && product_id.is_some() && product.is_some() {
            return true;
        }

        // IDE devices routinely lack this data.
        if raw_bus != Some("ide") {
            self.warn(
                WarningCategory::MissingDeviceData,
                &format!(
                    "insufficient data for device {}: bus={:?} vendor_id={:?} product_id={:?} product={:?}",
                    self.udi(),
                    bus,
                    vendor_id,
                    product_id,
                    product
                ),
            );
        }
        false
    }

    /// `(vendor, model)` from the SCSI inquiry strings.
    ///
    /// Disks behind libata report vendor `ATA` and prefix the model with the
    /// real vendor name.
    fn scsi_vendor_and_model(&self) -> (Option<String>, Option<String>) {
        let vendor = self.property("scsi.vendor").map(text_of);
        let model = self.property("scsi.model").map(text_of);

        if vendor.as_deref() == Some("ATA") {
            if let Some((real_vendor, real_model)) = model.as_deref().and_then(|m| m.split_once(' ')) {
                return (Some(real_vendor.to_string()), Some(real_model.to_string()));
            }
        }
        (vendor, model)
    }

    fn bus_property(&self, suffix: &str) -> Option<&'t TypedValue> {
        let raw_bus = self.raw_bus()?;
        self.property(&format!("{}.{}", raw_bus, suffix))
    }

    pub fn vendor(&self) -> Option<String> {
        if self.is_root() {
            return self.property("system.hardware.vendor").map(text_of);
        }
        if self.raw_bus() == Some("scsi") {
            return self.scsi_vendor_and_model().0;
        }
        self.property("info.vendor")
            .or_else(|| self.bus_property("vendor"))
            .map(text_of)
    }

    pub fn product(&self) -> Option<String> {
        if self.is_root() {
            return self.property("system.hardware.product").map(text_of);
        }
        if self.raw_bus() == Some("scsi") {
            return self.scsi_vendor_and_model().1;
        }
        self.property("info.product")
            .or_else(|| self.bus_property("product"))
            .map(text_of)
    }

    /// SCSI devices and the root have no numeric IDs; their names are used.
    fn uses_names_as_ids(&self) -> bool {
        self.is_root() || self.raw_bus() == Some("scsi")
    }

    pub fn vendor_id(&self) -> Option<DeviceId> {
        if self.uses_names_as_ids() {
            return self.vendor().map(DeviceId::Name);
        }
        self.bus_property("vendor_id").map(DeviceId::from_value)
    }

    pub fn product_id(&self) -> Option<DeviceId> {
        if self.uses_names_as_ids() {
            return self.product().map(DeviceId::Name);
        }
        self.bus_property("product_id").map(DeviceId::from_value)
    }

    fn format_id_for_db(&self, id: DeviceId, scsi_width: usize) -> String {
        match (self.real_bus(), id) {
            (Some(HwBus::Pci | HwBus::Usb), DeviceId::Numeric(value)) => format!("0x{:04x}", value),
            (_, id) if self.raw_bus() == Some("scsi") && !self.is_root() => {
                format!("{:<width$}", id.to_string(), width = scsi_width)
            }
            (_, id) => id.to_string(),
        }
    }

    /// Vendor ID in the form stored by the registry.
    pub fn vendor_id_for_db(&self) -> Option<String> {
        self.vendor_id()
            .map(|id| self.format_id_for_db(id, SCSI_VENDOR_WIDTH))
    }

    /// Product ID in the form stored by the registry.
    pub fn product_id_for_db(&self) -> Option<String> {
        self.product_id()
            .map(|id| self.format_id_for_db(id, SCSI_MODEL_WIDTH))
    }
}
