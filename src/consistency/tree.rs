//! HAL parent/child structure checks.
//!
//! The HAL section is a flat list of devices that name their parent by UDI
//! in the `info.parent` property. Before a device tree is built the list
//! must form exactly one tree rooted at `ROOT_UDI`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::TreeError;
use crate::parsing::model::HalRecord;
use crate::values::TypedValue;

/// UDI of the HAL node describing the computer itself.
pub const ROOT_UDI: &str = "/org/freedesktop/Hal/devices/computer";

/// Parent UDI → child records, children in document order.
pub type UdiChildren<'a> = BTreeMap<&'a str, Vec<&'a HalRecord>>;

/// Validated HAL structure.
#[derive(Debug)]
pub struct HalStructure<'a> {
    pub by_udi: HashMap<&'a str, &'a HalRecord>,
    pub children: UdiChildren<'a>,
    pub root: &'a HalRecord,
}

/// Index devices by UDI. A repeated UDI is an error.
pub fn udi_device_map(devices: &[HalRecord]) -> Result<HashMap<&str, &HalRecord>, TreeError> {
    let mut map = HashMap::with_capacity(devices.len());
    for device in devices {
        if map.insert(device.udi.as_str(), device).is_some() {
            return Err(TreeError::DuplicateUdi(device.udi.clone()));
        }
    }
    Ok(map)
}

/// Group devices under their parent UDI and locate the single root.
///
/// Every `info.parent` must name a known UDI. Exactly one device may lack a
/// parent and it must carry `ROOT_UDI`.
pub fn udi_children<'a>(
    devices: &'a [HalRecord],
    by_udi: &HashMap<&'a str, &'a HalRecord>,
) -> Result<(UdiChildren<'a>, &'a HalRecord), TreeError> {
    let mut children: UdiChildren<'a> = BTreeMap::new();
    let mut roots: Vec<&'a HalRecord> = Vec::new();

    for device in devices {
        match device.properties.get("info.parent") {
            Some(TypedValue::Str(parent)) => match by_udi.get_key_value(parent.as_str()) {
                Some((parent_udi, _)) => children.entry(*parent_udi).or_default().push(device),
                None => {
                    return Err(TreeError::UnknownParent {
                        id: device.id,
                        parent: parent.clone(),
                    })
                }
            },
            Some(other) => {
                return Err(TreeError::UnknownParent {
                    id: device.id,
                    parent: other.to_string(),
                })
            }
            None => roots.push(device),
        }
    }

    match roots.as_slice() {
        [] => Err(TreeError::NoRoot),
        [root] if root.udi == ROOT_UDI => Ok((children, *root)),
        [root] => Err(TreeError::UnexpectedRootUdi {
            id: root.id,
            udi: root.udi.clone(),
        }),
        _ => Err(TreeError::MultipleRoots(
            roots
                .iter()
                .map(|r| r.udi.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        )),
    }
}

/// UDIs that cannot be reached from `ROOT_UDI`.
///
/// Walks down from the root removing every visited parent entry from a
/// copy of `children`; whatever remains is part of a parent/child cycle.
pub fn find_circular_udis(children: &UdiChildren<'_>) -> BTreeSet<String> {
    let mut remaining = children.clone();
    let mut stack = vec![ROOT_UDI];
    while let Some(udi) = stack.pop() {
        if let Some(kids) = remaining.remove(udi) {
            stack.extend(kids.into_iter().map(|kid| kid.udi.as_str()));
        }
    }
    remaining.keys().map(|udi| udi.to_string()).collect()
}

/// Run all structure checks and return the validated structure.
pub fn check_hal_structure(devices: &[HalRecord]) -> Result<HalStructure<'_>, TreeError> {
    let by_udi = udi_device_map(devices)?;
    let (children, root) = udi_children(devices, &by_udi)?;
    let circular = find_circular_udis(&children);
    if !circular.is_empty() {
        return Err(TreeError::Circular(circular));
    }
    Ok(HalStructure {
        by_udi,
        children,
        root,
    })
}
