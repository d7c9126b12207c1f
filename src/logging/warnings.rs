//! Per-submission warning de-duplication.
//!
//! A submission with a few hundred similar devices would otherwise log the
//! same classification warning once per device.

use std::cell::RefCell;
use std::collections::HashSet;

use super::structured::LogContext;

/// Categories of non-fatal classification warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCategory {
    ScsiWithoutGrandparent,
    ScsiNonStorageController,
    ScsiUnknownStorageSubclass,
    UnknownBus,
    ZeroUsbIds,
    MissingDeviceData,
    MissingKernelVersion,
    InconsistentKernelPackage,
}

impl WarningCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCategory::ScsiWithoutGrandparent => "SCSI_WITHOUT_GRANDPARENT",
            WarningCategory::ScsiNonStorageController => "SCSI_NON_STORAGE_CONTROLLER",
            WarningCategory::ScsiUnknownStorageSubclass => "SCSI_UNKNOWN_STORAGE_SUBCLASS",
            WarningCategory::UnknownBus => "UNKNOWN_BUS",
            WarningCategory::ZeroUsbIds => "USB_ZERO_IDS",
            WarningCategory::MissingDeviceData => "DEVICE_DATA_MISSING",
            WarningCategory::MissingKernelVersion => "KERNEL_VERSION_MISSING",
            WarningCategory::InconsistentKernelPackage => "KERNEL_PACKAGE_INCONSISTENT",
        }
    }
}

/// Set of warning categories already logged for one submission.
///
/// Owned by a single `SubmissionContext`; never shared between submissions.
#[derive(Debug, Default)]
pub struct WarningLog {
    issued: RefCell<HashSet<WarningCategory>>,
}

impl WarningLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log `message` at warning level unless `category` was already logged.
    ///
    /// Returns true if the warning was issued.
    pub fn warn(&self, ctx: &LogContext, category: WarningCategory, message: &str) -> bool {
        let first = self.issued.borrow_mut().insert(category);
        if first {
            log::warn!("{} {} {}", ctx, category.as_str(), message);
        } else {
            log::debug!("{} {} suppressed={}", ctx, category.as_str(), message);
        }
        first
    }

    pub fn was_issued(&self, category: WarningCategory) -> bool {
        self.issued.borrow().contains(&category)
    }

    pub fn issued_count(&self) -> usize {
        self.issued.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_issued_once_per_category() {
        let ctx = LogContext::new("sub-1", "run-1");
        let warnings = WarningLog::new();

        assert!(warnings.warn(&ctx, WarningCategory::UnknownBus, "bus=\"foo\""));
        assert!(!warnings.warn(&ctx, WarningCategory::UnknownBus, "bus=\"bar\""));
        assert!(warnings.warn(&ctx, WarningCategory::ZeroUsbIds, "udi=x"));

        assert!(warnings.was_issued(WarningCategory::UnknownBus));
        assert!(!warnings.was_issued(WarningCategory::MissingKernelVersion));
        assert_eq!(warnings.issued_count(), 2);
    }
}
