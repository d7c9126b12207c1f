//! Consistency checks on a parsed submission.
//!
//! Three checks run in order, stopping at the first failure:
//! - duplicate IDs across devices, processors and packages
//! - question targets referencing unknown IDs
//! - HAL parent/child structure (single root, no dangling parents, no cycles)

pub mod ids;
pub mod tree;

pub use ids::*;
pub use tree::*;

use crate::error::ConsistencyError;
use crate::log_error;
use crate::logging::structured::LogContext;
use crate::parsing::model::ParsedSubmission;

/// Run all checks, returning the validated HAL structure.
pub fn check(parsed: &ParsedSubmission) -> Result<HalStructure<'_>, ConsistencyError> {
    let duplicates = find_duplicate_ids(parsed);
    if !duplicates.is_empty() {
        return Err(ConsistencyError::DuplicateIds(duplicates));
    }

    let invalid_references = find_invalid_id_references(parsed);
    if !invalid_references.is_empty() {
        return Err(ConsistencyError::InvalidIdReferences(invalid_references));
    }

    Ok(check_hal_structure(&parsed.hardware.hal.devices)?)
}

/// Run all checks, logging the first failure.
pub fn check_consistency(parsed: &ParsedSubmission, ctx: &LogContext) -> bool {
    match check(parsed) {
        Ok(structure) => {
            log::debug!(
                "{} CONSISTENCY_OK devices={} parents={}",
                ctx,
                structure.by_udi.len(),
                structure.children.len()
            );
            true
        }
        Err(err) => {
            log_error!(ctx, "CONSISTENCY_FAILED", error = err.to_string());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::error::TreeError;
    use crate::parsing::model::{Package, Processor};
    use crate::testing::{question_targeting, record, root_record, submission};
    use crate::values::Properties;

    fn ctx() -> LogContext {
        LogContext::new("test-submission", "run-test")
    }

    #[test]
    fn test_duplicate_device_ids() {
        let parsed = submission(vec![
            root_record(1, &[]),
            record(5, "/pci_a", Some(ROOT_UDI), &[]),
            record(5, "/pci_b", Some(ROOT_UDI), &[]),
        ]);
        assert_eq!(find_duplicate_ids(&parsed), BTreeSet::from([5]));
        assert!(!check_consistency(&parsed, &ctx()));
    }

    #[test]
    fn test_duplicate_ids_across_categories() {
        let mut parsed = submission(vec![root_record(1, &[]), record(2, "/pci", Some(ROOT_UDI), &[])]);
        parsed.hardware.processors.push(Processor {
            id: 2,
            name: "0".to_string(),
            properties: Properties::new(),
        });
        parsed.software.packages.insert(
            "metacity".to_string(),
            Package {
                id: 1,
                properties: Properties::new(),
            },
        );
        assert_eq!(find_duplicate_ids(&parsed), BTreeSet::from([1, 2]));
        assert_eq!(
            check(&parsed).unwrap_err(),
            ConsistencyError::DuplicateIds(BTreeSet::from([1, 2]))
        );
    }

    #[test]
    fn test_invalid_id_reference() {
        let mut parsed = submission(vec![root_record(1, &[]), record(2, "/pci", Some(ROOT_UDI), &[])]);
        parsed.questions.push(question_targeting(&[2, 999]));
        assert_eq!(find_invalid_id_references(&parsed), BTreeSet::from([999]));
        assert!(!check_consistency(&parsed, &ctx()));

        parsed.questions[0] = question_targeting(&[1, 2]);
        assert!(check_consistency(&parsed, &ctx()));
    }

    #[test]
    fn test_processor_and_package_targets_are_valid() {
        let mut parsed = submission(vec![root_record(1, &[])]);
        parsed.hardware.processors.push(Processor {
            id: 10,
            name: "0".to_string(),
            properties: Properties::new(),
        });
        parsed.software.packages.insert(
            "xserver-xorg".to_string(),
            Package {
                id: 11,
                properties: Properties::new(),
            },
        );
        parsed.questions.push(question_targeting(&[10, 11]));
        assert!(find_invalid_id_references(&parsed).is_empty());
    }

    #[test]
    fn test_well_formed_tree() {
        let devices = vec![
            root_record(1, &[]),
            record(2, "/pci_1", Some(ROOT_UDI), &[]),
            record(3, "/pci_2", Some(ROOT_UDI), &[]),
            record(4, "/usb_1", Some("/pci_2"), &[]),
        ];
        let structure = check_hal_structure(&devices).unwrap();
        assert_eq!(structure.root.id, 1);
        assert_eq!(structure.children[ROOT_UDI].len(), 2);
        assert!(find_circular_udis(&structure.children).is_empty());
    }

    #[test]
    fn test_cycle_detected() {
        let devices = vec![
            root_record(1, &[]),
            record(2, "A", Some("B"), &[]),
            record(3, "B", Some("A"), &[]),
        ];
        let by_udi = udi_device_map(&devices).unwrap();
        let (children, _) = udi_children(&devices, &by_udi).unwrap();
        let expected = BTreeSet::from(["A".to_string(), "B".to_string()]);
        assert_eq!(find_circular_udis(&children), expected);
        assert_eq!(
            check_hal_structure(&devices).unwrap_err(),
            TreeError::Circular(expected)
        );
    }

    #[test]
    fn test_missing_root() {
        let devices = vec![record(2, "A", Some("B"), &[]), record(3, "B", Some("A"), &[])];
        assert_eq!(check_hal_structure(&devices).unwrap_err(), TreeError::NoRoot);
        assert_eq!(TreeError::NoRoot.to_string(), "no root device found");
    }

    #[test]
    fn test_root_with_unexpected_udi() {
        let devices = vec![record(1, "/org/freedesktop/Hal/devices/laptop", None, &[])];
        assert_eq!(
            check_hal_structure(&devices).unwrap_err(),
            TreeError::UnexpectedRootUdi {
                id: 1,
                udi: "/org/freedesktop/Hal/devices/laptop".to_string()
            }
        );
    }

    #[test]
    fn test_multiple_roots() {
        let devices = vec![root_record(1, &[]), record(2, "/orphan", None, &[])];
        assert!(matches!(
            check_hal_structure(&devices).unwrap_err(),
            TreeError::MultipleRoots(udis) if udis.contains("/orphan")
        ));
    }

    #[test]
    fn test_duplicate_udi() {
        let devices = vec![
            root_record(1, &[]),
            record(2, "/pci", Some(ROOT_UDI), &[]),
            record(3, "/pci", Some(ROOT_UDI), &[]),
        ];
        assert_eq!(
            check_hal_structure(&devices).unwrap_err(),
            TreeError::DuplicateUdi("/pci".to_string())
        );
    }

    #[test]
    fn test_unknown_parent() {
        let devices = vec![root_record(1, &[]), record(2, "/pci", Some("/nowhere"), &[])];
        assert_eq!(
            check_hal_structure(&devices).unwrap_err(),
            TreeError::UnknownParent {
                id: 2,
                parent: "/nowhere".to_string()
            }
        );
    }
}
