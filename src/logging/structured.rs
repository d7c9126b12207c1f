//! Structured logging utilities.
//!
//! Provides context-aware logging with the submission key and run id
//! included in every log message.

use std::fmt;

/// Logging context for one submission run.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub submission_key: String,
    pub run_id: String,
    pub udi: Option<String>,
}

impl LogContext {
    pub fn new(submission_key: &str, run_id: &str) -> Self {
        Self {
            submission_key: submission_key.to_string(),
            run_id: run_id.to_string(),
            udi: None,
        }
    }

    pub fn with_device(&self, udi: &str) -> Self {
        Self {
            submission_key: self.submission_key.clone(),
            run_id: self.run_id.clone(),
            udi: Some(udi.to_string()),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.udi {
            Some(udi) => write!(
                f,
                "[submission={}] [run={}] [udi={}]",
                self.submission_key, self.run_id, udi
            ),
            None => write!(f, "[submission={}] [run={}]", self.submission_key, self.run_id),
        }
    }
}

/// Log an info message with context.
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::info!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}

/// Log a warning message with context.
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::warn!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}

/// Log an error message with context.
#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::error!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}

/// Log a debug message with context.
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::debug!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}
