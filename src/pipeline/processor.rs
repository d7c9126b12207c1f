//! Submission processing facade.
//!
//! Coordinates the full import of one raw submission:
//! 1. bzip2 decompression (plain XML accepted)
//! 2. Parsing and schema validation
//! 3. Consistency checks
//! 4. Device tree construction
//! 5. Registration of real devices with reliable data, parent before children
//!
//! Retry and status bookkeeping belong to the caller; a rejected submission
//! is reported through the outcome and the log.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::consistency;
use crate::devices::{DeviceTree, HalDevice, HwBus};
use crate::error::{ProcessingError, RegistryError};
use crate::logging::warnings::WarningCategory;
use crate::parsing::model::ParsedSubmission;
use crate::parsing::submission::{SubmissionParser, DEFAULT_MAX_XML_DEPTH};
use crate::storage::models::RecordKey;
use crate::storage::registry::DeviceRegistry;
use crate::validation::schema::SchemaRegistry;
use crate::{log_error, log_info};

use super::context::SubmissionContext;
use super::decompress::decompress_submission;

/// Upper bound on the decompressed payload.
pub const DEFAULT_MAX_SUBMISSION_SIZE: usize = 50 * 1024 * 1024;

const KERNEL_VERSION_PROPERTY: &str = "system.kernel.version";

#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub max_submission_size: usize,
    pub max_xml_depth: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_submission_size: DEFAULT_MAX_SUBMISSION_SIZE,
            max_xml_depth: DEFAULT_MAX_XML_DEPTH,
        }
    }
}

/// Result of processing a single submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingOutcome {
    pub submission_key: String,
    pub run_id: String,
    pub accepted: bool,
    /// SHA-256 of the raw payload, hex encoded.
    pub content_hash: String,
    pub registered_devices: usize,
    pub failure: Option<String>,
}

/// Registry data of one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceData {
    pub bus: HwBus,
    pub vendor_id: String,
    pub product_id: String,
    pub name: String,
}

impl DeviceData {
    /// `None` unless the device is real and carries reliable data.
    pub fn from_device(device: &HalDevice<'_>) -> Option<Self> {
        assert!(
            device.is_real_device(),
            "registration data requested for non-real device {}",
            device.udi()
        );
        if !device.has_reliable_data() {
            return None;
        }
        Some(Self {
            bus: device.real_bus()?,
            vendor_id: device.vendor_id_for_db()?,
            product_id: device.product_id_for_db()?,
            name: device.product()?,
        })
    }
}

pub struct SubmissionProcessor<'r> {
    parser: SubmissionParser,
    config: ProcessorConfig,
    registry: &'r dyn DeviceRegistry,
}

impl<'r> SubmissionProcessor<'r> {
    pub fn new(registry: &'r dyn DeviceRegistry) -> Self {
        Self::with_config(registry, ProcessorConfig::default())
    }

    pub fn with_config(registry: &'r dyn DeviceRegistry, config: ProcessorConfig) -> Self {
        let parser = SubmissionParser::new(SchemaRegistry::default(), config.max_xml_depth);
        Self {
            parser,
            config,
            registry,
        }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Import one submission. Returns true if it was accepted.
    pub fn process_submission(&self, raw: &[u8], submission_key: &str) -> bool {
        self.process(raw, submission_key).accepted
    }

    /// Import one submission, reporting the outcome.
    pub fn process(&self, raw: &[u8], submission_key: &str) -> ProcessingOutcome {
        let ctx = SubmissionContext::new(submission_key);
        let content_hash = hex::encode(Sha256::digest(raw));

        log_info!(
            ctx.log_context(),
            "SUBMISSION_RECEIVED",
            bytes = raw.len(),
            sha256 = &content_hash[..16]
        );

        let result = self.run(raw, &ctx);
        let elapsed_ms = (chrono::Utc::now() - ctx.started_at).num_milliseconds();

        match result {
            Ok(registered) => {
                log_info!(
                    ctx.log_context(),
                    "SUBMISSION_ACCEPTED",
                    registered_devices = registered,
                    warnings = ctx.warnings().issued_count(),
                    elapsed_ms = elapsed_ms
                );
                ProcessingOutcome {
                    submission_key: ctx.submission_key.clone(),
                    run_id: ctx.run_id.clone(),
                    accepted: true,
                    content_hash,
                    registered_devices: registered,
                    failure: None,
                }
            }
            Err(err) => {
                log_error!(
                    ctx.log_context(),
                    "SUBMISSION_REJECTED",
                    reason = err.to_string(),
                    elapsed_ms = elapsed_ms
                );
                ProcessingOutcome {
                    submission_key: ctx.submission_key.clone(),
                    run_id: ctx.run_id.clone(),
                    accepted: false,
                    content_hash,
                    registered_devices: 0,
                    failure: Some(err.to_string()),
                }
            }
        }
    }

    /// Decompress and parse without touching the registry.
    pub fn parse(&self, raw: &[u8], submission_key: &str) -> Option<ParsedSubmission> {
        let ctx = SubmissionContext::new(submission_key);
        match decompress_submission(raw, self.config.max_submission_size, ctx.log_context()) {
            Ok(xml) => self.parser.parse_submission(&xml, ctx.log_context()),
            Err(err) => {
                log_error!(ctx.log_context(), "SUBMISSION_PARSE_FAILED", error = err.to_string());
                None
            }
        }
    }

    fn run(&self, raw: &[u8], ctx: &SubmissionContext) -> Result<usize, ProcessingError> {
        let xml = decompress_submission(raw, self.config.max_submission_size, ctx.log_context())?;
        let parsed = self
            .parser
            .parse_submission(&xml, ctx.log_context())
            .ok_or(ProcessingError::Unparseable)?;

        let structure = consistency::check(&parsed).map_err(|err| {
            log_error!(ctx.log_context(), "CONSISTENCY_FAILED", error = err.to_string());
            err
        })?;

        let tree = DeviceTree::build(&structure, ctx);
        let kernel_package = kernel_package_name(&tree, &parsed, ctx);
        Ok(self.register_devices(&tree, kernel_package.as_deref(), ctx)?)
    }

    /// Walk the real devices in pre-order and register those with reliable
    /// data. A skipped device's children attach to its nearest registered
    /// ancestor.
    fn register_devices(
        &self,
        tree: &DeviceTree<'_>,
        kernel_package: Option<&str>,
        ctx: &SubmissionContext,
    ) -> Result<usize, RegistryError> {
        let mut registered = 0;
        let mut pending: Vec<(HalDevice<'_>, Option<RecordKey>)> = vec![(tree.root(), None)];

        while let Some((device, parent)) = pending.pop() {
            let own = match DeviceData::from_device(&device) {
                Some(data) => {
                    registered += 1;
                    Some(self.register_device(&device, &data, parent, kernel_package, ctx)?)
                }
                None => {
                    log::debug!("{} DEVICE_SKIPPED", ctx.device_context(device.udi()));
                    None
                }
            };

            let children_parent = own.or(parent);
            pending.extend(
                device
                    .real_children()
                    .into_iter()
                    .rev()
                    .map(|child| (child, children_parent)),
            );
        }
        Ok(registered)
    }

    fn register_device(
        &self,
        device: &HalDevice<'_>,
        data: &DeviceData,
        parent: Option<RecordKey>,
        kernel_package: Option<&str>,
        ctx: &SubmissionContext,
    ) -> Result<RecordKey, RegistryError> {
        let device_key = self.registry.get_or_create_device(
            data.bus,
            &data.vendor_id,
            &data.product_id,
            &data.name,
        )?;

        let driver_key = match (kernel_package, device.driver_name()) {
            (Some(package), Some(driver)) => Some(self.registry.get_or_create_driver(package, driver)?),
            _ => None,
        };
        let link = self
            .registry
            .get_or_create_device_driver_link(device_key, driver_key)?;
        let submission_device =
            self.registry
                .get_or_create_submission_device(link, &ctx.submission_key, parent, device.id())?;

        log::debug!(
            "{} DEVICE_REGISTERED bus={} vendor_id={:?} product_id={:?} driver={:?}",
            ctx.device_context(device.udi()),
            data.bus,
            data.vendor_id,
            data.product_id,
            device.driver_name()
        );
        Ok(submission_device)
    }
}

/// Package that ships the drivers of this submission's kernel.
///
/// `None` (with a warning) when the kernel version is missing or, for
/// submissions listing packages, when the derived package is not installed.
pub fn kernel_package_name(
    tree: &DeviceTree<'_>,
    parsed: &ParsedSubmission,
    ctx: &SubmissionContext,
) -> Option<String> {
    let Some(version) = tree.root().str_property(KERNEL_VERSION_PROPERTY) else {
        ctx.warn(
            WarningCategory::MissingKernelVersion,
            "submission does not provide property system.kernel.version; driver data is not stored",
        );
        return None;
    };

    let package = format!("linux-image-{}", version);
    let packages = &parsed.software.packages;
    if !packages.is_empty() && !packages.contains_key(&package) {
        ctx.warn(
            WarningCategory::InconsistentKernelPackage,
            &format!(
                "inconsistent kernel version data: {} is not among the installed packages",
                package
            ),
        );
        return None;
    }
    Some(package)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consistency::{check_hal_structure, ROOT_UDI};
    use crate::parsing::model::Package;
    use crate::storage::registry::InMemoryRegistry;
    use crate::testing::{i, record, root_record, s, submission};
    use crate::values::Properties;

    fn devices() -> Vec<crate::parsing::model::HalRecord> {
        vec![
            root_record(
                1,
                &[
                    ("system.hardware.vendor", s("LENOVO")),
                    ("system.hardware.product", s("7661CTO")),
                    ("system.kernel.version", s("2.6.24-16-generic")),
                ],
            ),
            record(
                2,
                "/pci_8086_27c5",
                Some(ROOT_UDI),
                &[
                    ("info.bus", s("pci")),
                    ("pci.vendor_id", i(0x8086)),
                    ("pci.product_id", i(0x27c5)),
                    ("info.product", s("82801GBM/GHM SATA AHCI Controller")),
                    ("info.linux.driver", s("ahci")),
                ],
            ),
            record(3, "/platform_x", Some(ROOT_UDI), &[("info.bus", s("platform"))]),
            record(
                4,
                "/pci_behind_platform",
                Some("/platform_x"),
                &[
                    ("info.bus", s("pci")),
                    ("pci.vendor_id", i(0x10ec)),
                    ("pci.product_id", i(0x8139)),
                    ("info.product", s("RTL-8139")),
                ],
            ),
        ]
    }

    #[test]
    fn test_kernel_package_name() {
        let parsed = submission(devices());
        let structure = check_hal_structure(&parsed.hardware.hal.devices).unwrap();
        let ctx = SubmissionContext::new("kernel-test");
        let tree = DeviceTree::build(&structure, &ctx);
        assert_eq!(
            kernel_package_name(&tree, &parsed, &ctx).as_deref(),
            Some("linux-image-2.6.24-16-generic")
        );
    }

    #[test]
    fn test_kernel_package_missing_from_package_list() {
        let mut parsed = submission(devices());
        parsed.software.packages.insert(
            "linux-image-2.6.22-14-generic".to_string(),
            Package {
                id: 99,
                properties: Properties::new(),
            },
        );
        let structure = check_hal_structure(&parsed.hardware.hal.devices).unwrap();
        let ctx = SubmissionContext::new("kernel-test");
        let tree = DeviceTree::build(&structure, &ctx);
        assert_eq!(kernel_package_name(&tree, &parsed, &ctx), None);
        assert!(ctx.warnings().was_issued(WarningCategory::InconsistentKernelPackage));
    }

    #[test]
    fn test_registration_walk() {
        let parsed = submission(devices());
        let structure = check_hal_structure(&parsed.hardware.hal.devices).unwrap();
        let ctx = SubmissionContext::new("walk-test");
        let tree = DeviceTree::build(&structure, &ctx);

        let registry = InMemoryRegistry::new();
        let processor = SubmissionProcessor::new(&registry);
        let registered = processor
            .register_devices(&tree, Some("linux-image-2.6.24-16-generic"), &ctx)
            .unwrap();
        assert_eq!(registered, 3);

        let snapshot = registry.snapshot();
        let buses: Vec<HwBus> = snapshot.devices.iter().map(|d| d.bus).collect();
        assert_eq!(buses, vec![HwBus::System, HwBus::Pci, HwBus::Pci]);
        assert_eq!(snapshot.drivers.len(), 1);
        assert_eq!(snapshot.drivers[0].name, "ahci");

        // The platform device is skipped; its PCI child hangs off the root.
        let root_key = snapshot.submission_devices[0].key;
        let realtek = snapshot
            .submission_devices
            .iter()
            .find(|d| d.local_id == 4)
            .unwrap();
        assert_eq!(realtek.parent, Some(root_key));
    }

    #[test]
    fn test_registration_without_kernel_package_has_no_drivers() {
        let parsed = submission(devices());
        let structure = check_hal_structure(&parsed.hardware.hal.devices).unwrap();
        let ctx = SubmissionContext::new("walk-test");
        let tree = DeviceTree::build(&structure, &ctx);

        let registry = InMemoryRegistry::new();
        let processor = SubmissionProcessor::new(&registry);
        processor.register_devices(&tree, None, &ctx).unwrap();

        let snapshot = registry.snapshot();
        assert!(snapshot.drivers.is_empty());
        assert!(snapshot.device_driver_links.iter().all(|l| l.driver.is_none()));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let registry = InMemoryRegistry::new();
        let processor = SubmissionProcessor::new(&registry);
        let outcome = processor.process(b"not xml at all", "garbage");
        assert!(!outcome.accepted);
        assert_eq!(outcome.content_hash.len(), 64);
        assert_eq!(outcome.failure.as_deref(), Some("submission could not be parsed"));
        assert_eq!(registry.device_count(), 0);
    }

    #[test]
    fn test_oversized_payload_is_rejected() {
        let registry = InMemoryRegistry::new();
        let config = ProcessorConfig {
            max_submission_size: 8,
            ..ProcessorConfig::default()
        };
        let processor = SubmissionProcessor::with_config(&registry, config);
        let outcome = processor.process(b"<system version=\"1.0\"/>", "big");
        assert!(!outcome.accepted);
        assert!(outcome.failure.unwrap().contains("too large"));
    }
}
