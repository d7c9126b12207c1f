//! ID namespace checks.
//!
//! Device, processor and package IDs share a single namespace within a
//! submission; question targets must name an ID from that namespace.

use std::collections::{BTreeSet, HashSet};

use crate::parsing::model::ParsedSubmission;

/// All IDs of devices, processors and packages, in document order.
fn all_ids(parsed: &ParsedSubmission) -> impl Iterator<Item = i64> + '_ {
    let devices = parsed.hardware.hal.devices.iter().map(|d| d.id);
    let processors = parsed.hardware.processors.iter().map(|p| p.id);
    let packages = parsed.software.packages.values().map(|p| p.id);
    devices.chain(processors).chain(packages)
}

/// IDs used more than once, within or across the three categories.
pub fn find_duplicate_ids(parsed: &ParsedSubmission) -> BTreeSet<i64> {
    let mut seen = HashSet::new();
    let mut duplicates = BTreeSet::new();
    for id in all_ids(parsed) {
        if !seen.insert(id) {
            duplicates.insert(id);
        }
    }
    duplicates
}

/// Question target IDs that match no device, processor or package.
pub fn find_invalid_id_references(parsed: &ParsedSubmission) -> BTreeSet<i64> {
    let known: HashSet<i64> = all_ids(parsed).collect();
    parsed
        .questions
        .iter()
        .flat_map(|q| q.targets.iter().map(|t| t.id))
        .filter(|id| !known.contains(id))
        .collect()
}
