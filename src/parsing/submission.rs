//! Submission parser.
//!
//! Validates a document against its schema version and drives the section
//! parsers. This is the single place where section-level errors become a
//! submission-level rejection.

use crate::error::SubmissionError;
use crate::logging::structured::LogContext;
use crate::validation::schema::SchemaRegistry;
use crate::xml::{parse_document, Element};

use super::model::ParsedSubmission;
use super::questions::parse_questions;
use super::sections::{parse_hardware, parse_software, parse_summary};

/// Default nesting limit for submission documents.
pub const DEFAULT_MAX_XML_DEPTH: usize = 64;

/// Parses raw submission documents.
pub struct SubmissionParser {
    schemas: SchemaRegistry,
    max_depth: usize,
}

impl Default for SubmissionParser {
    fn default() -> Self {
        Self::new(SchemaRegistry::default(), DEFAULT_MAX_XML_DEPTH)
    }
}

impl SubmissionParser {
    pub fn new(schemas: SchemaRegistry, max_depth: usize) -> Self {
        Self { schemas, max_depth }
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    /// Parse a submission, logging and returning `None` on any rejection.
    pub fn parse_submission(&self, xml: &[u8], ctx: &LogContext) -> Option<ParsedSubmission> {
        match self.try_parse(xml) {
            Ok(parsed) => {
                log::debug!(
                    "{} SUBMISSION_PARSED devices={} processors={} packages={} questions={}",
                    ctx,
                    parsed.hardware.hal.devices.len(),
                    parsed.hardware.processors.len(),
                    parsed.software.packages.len(),
                    parsed.questions.len()
                );
                Some(parsed)
            }
            Err(SubmissionError::SchemaInvalid { version, errors }) => {
                log::error!(
                    "{} SUBMISSION_SCHEMA_INVALID version={} errors={}",
                    ctx,
                    version,
                    errors.len()
                );
                for error in &errors {
                    log::error!("{} SCHEMA_ERROR {}", ctx, error);
                }
                None
            }
            Err(err) => {
                log::error!("{} SUBMISSION_PARSE_FAILED error={}", ctx, err);
                None
            }
        }
    }

    /// Parse a submission, returning the rejection reason on failure.
    pub fn try_parse(&self, xml: &[u8]) -> Result<ParsedSubmission, SubmissionError> {
        let root = parse_document(xml, self.max_depth)?;
        if root.tag != "system" {
            return Err(SubmissionError::WrongRootTag(root.tag));
        }

        let version = root.attr("version");
        let schema = version
            .and_then(|v| self.schemas.get(v))
            .ok_or_else(|| SubmissionError::UnsupportedVersion(version.map(str::to_string)))?;

        schema
            .validator
            .validate(&root)
            .map_err(|errors| SubmissionError::SchemaInvalid {
                version: schema.version.clone(),
                errors,
            })?;

        (schema.parse)(&root)
    }
}

/// Section parser for schema version 1.0.
pub fn parse_sections_v1(root: &Element) -> Result<ParsedSubmission, SubmissionError> {
    let section = |tag: &str| {
        root.child(tag)
            .ok_or_else(|| SubmissionError::MissingElement(tag.to_string()))
    };

    Ok(ParsedSubmission {
        summary: parse_summary(section("summary")?)?,
        hardware: parse_hardware(section("hardware")?)?,
        software: parse_software(section("software")?)?,
        questions: parse_questions(section("questions")?)?,
    })
}
