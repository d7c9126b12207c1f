//! Pipeline context management.
//!
//! Provides per-submission context for logging and warning de-duplication.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::logging::structured::LogContext;
use crate::logging::warnings::{WarningCategory, WarningLog};

/// Context for processing one submission.
///
/// Created per `process_submission` call; never shared between submissions.
#[derive(Debug)]
pub struct SubmissionContext {
    pub submission_key: String,
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    log: LogContext,
    warnings: WarningLog,
}

impl SubmissionContext {
    pub fn new(submission_key: &str) -> Self {
        let run_id = format!("run-{}", &Uuid::new_v4().to_string()[..8]);
        let log = LogContext::new(submission_key, &run_id);

        Self {
            submission_key: submission_key.to_string(),
            run_id,
            started_at: Utc::now(),
            log,
            warnings: WarningLog::new(),
        }
    }

    pub fn log_context(&self) -> &LogContext {
        &self.log
    }

    /// Log context for messages about one device.
    pub fn device_context(&self, udi: &str) -> LogContext {
        self.log.with_device(udi)
    }

    /// Issue a de-duplicated warning about the device `udi`.
    pub fn warn_device(&self, udi: &str, category: WarningCategory, message: &str) -> bool {
        self.warnings.warn(&self.device_context(udi), category, message)
    }

    /// Issue a de-duplicated submission-level warning.
    pub fn warn(&self, category: WarningCategory, message: &str) -> bool {
        self.warnings.warn(&self.log, category, message)
    }

    pub fn warnings(&self) -> &WarningLog {
        &self.warnings
    }
}
