//! Parsed submission data.
//!
//! Plain nested data produced by the section parsers. Created once per
//! submission and not modified afterwards.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::values::{Properties, TypedValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSubmission {
    pub summary: Summary,
    pub hardware: Hardware,
    pub software: Software,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub live_cd: bool,
    pub system_id: String,
    pub distribution: String,
    pub distroseries: String,
    pub architecture: String,
    pub private: bool,
    pub contactable: bool,
    pub date_created: DateTime<Utc>,
    pub client: Client,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub name: String,
    pub version: String,
    pub plugins: Vec<Plugin>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugin {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hardware {
    pub hal: Hal,
    pub processors: Vec<Processor>,
    pub aliases: Vec<Alias>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hal {
    pub version: String,
    pub devices: Vec<HalRecord>,
}

/// One `<device>` of the HAL section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HalRecord {
    pub id: i64,
    pub udi: String,
    pub parent: Option<i64>,
    pub properties: Properties,
}

impl HalRecord {
    /// UDI named by the `info.parent` property, if any.
    pub fn parent_udi(&self) -> Option<&str> {
        self.properties.get("info.parent").and_then(TypedValue::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Processor {
    pub id: i64,
    pub name: String,
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    pub target: i64,
    pub vendor: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Software {
    pub lsbrelease: Properties,
    pub packages: BTreeMap<String, Package>,
    pub xorg: Xorg,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: i64,
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Xorg {
    pub version: Option<String>,
    pub drivers: BTreeMap<String, BTreeMap<String, XorgAttribute>>,
}

/// Attribute of an `<xorg><driver>`; `device` is the only integer one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum XorgAttribute {
    Int(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub name: String,
    pub plugin: Option<String>,
    pub targets: Vec<QuestionTarget>,
    pub answer: Option<Answer>,
    pub answer_choices: Vec<TypedValue>,
    pub command: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionTarget {
    pub id: i64,
    pub drivers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(rename = "type")]
    pub answer_type: String,
    pub value: String,
    pub unit: Option<String>,
}
