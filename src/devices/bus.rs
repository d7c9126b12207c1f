//! Bus kinds and the lookup tables used to classify HAL devices.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Physical bus a device is attached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HwBus {
    System,
    Pci,
    Usb,
    Ide,
    Sata,
    Scsi,
    Ata,
    Sas,
    Floppy,
    Ipi,
    PcCard,
    Serial,
    Pcmcia,
}

impl HwBus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HwBus::System => "SYSTEM",
            HwBus::Pci => "PCI",
            HwBus::Usb => "USB",
            HwBus::Ide => "IDE",
            HwBus::Sata => "SATA",
            HwBus::Scsi => "SCSI",
            HwBus::Ata => "ATA",
            HwBus::Sas => "SAS",
            HwBus::Floppy => "FLOPPY",
            HwBus::Ipi => "IPI",
            HwBus::PcCard => "PCCARD",
            HwBus::Serial => "SERIAL",
            HwBus::Pcmcia => "PCMCIA",
        }
    }
}

impl fmt::Display for HwBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const PCI_CLASS_STORAGE: i64 = 1;
pub const PCI_CLASS_BRIDGE: i64 = 6;
pub const PCI_CLASS_SERIALBUS_CONTROLLER: i64 = 12;

pub const PCI_SUBCLASS_BRIDGE_CARDBUS: i64 = 7;
pub const PCI_SUBCLASS_SERIALBUS_USB: i64 = 3;

/// Raw buses that map directly onto a bus kind.
const SIMPLE_BUS_TABLE: &[(&str, HwBus)] = &[
    ("pcmcia", HwBus::Pcmcia),
    ("usb_device", HwBus::Usb),
    ("ide", HwBus::Ide),
    ("serio", HwBus::Serial),
];

/// PCI storage controller subclass → bus of the attached disks.
const PCI_STORAGE_SUBCLASS_TABLE: &[(i64, HwBus)] = &[
    (0, HwBus::Scsi),
    (1, HwBus::Ide),
    (2, HwBus::Floppy),
    (3, HwBus::Ipi),
    (5, HwBus::Ata),
    (6, HwBus::Sata),
    (7, HwBus::Sas),
];

/// Raw buses of aspect nodes. Only the root may lack a bus and still count
/// as a real device.
pub const ASPECT_BUSES: &[&str] = &["usb", "ssb", "scsi_host"];

/// Buses whose vendor and product identification is not trustworthy with
/// the properties HAL currently provides. This is data-quality policy.
pub const UNRELIABLE_BUSES: &[&str] = &["pnp", "platform", "ieee1394", "pcmcia", "mmc", "misc"];

pub fn simple_bus(raw_bus: &str) -> Option<HwBus> {
    SIMPLE_BUS_TABLE
        .iter()
        .find(|(raw, _)| *raw == raw_bus)
        .map(|(_, bus)| *bus)
}

pub fn storage_subclass_bus(subclass: i64) -> Option<HwBus> {
    PCI_STORAGE_SUBCLASS_TABLE
        .iter()
        .find(|(code, _)| *code == subclass)
        .map(|(_, bus)| *bus)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_bus_table() {
        assert_eq!(simple_bus("usb_device"), Some(HwBus::Usb));
        assert_eq!(simple_bus("serio"), Some(HwBus::Serial));
        assert_eq!(simple_bus("pci"), None);
        assert_eq!(simple_bus("usb"), None);
    }

    #[test]
    fn test_storage_subclass_table() {
        assert_eq!(storage_subclass_bus(6), Some(HwBus::Sata));
        assert_eq!(storage_subclass_bus(1), Some(HwBus::Ide));
        assert_eq!(storage_subclass_bus(4), None);
        assert_eq!(storage_subclass_bus(0x80), None);
    }

    #[test]
    fn test_bus_names() {
        assert_eq!(HwBus::PcCard.to_string(), "PCCARD");
        assert_eq!(serde_json::to_string(&HwBus::Sata).unwrap(), "\"SATA\"");
    }
}
