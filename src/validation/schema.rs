//! Versioned schema validation.
//!
//! Every supported schema version has one `SchemaDefinition`: a validator
//! for the document grammar plus the section parser for that version.
//! Supporting a new version means registering another definition.

use std::collections::HashMap;

use crate::error::SubmissionError;
use crate::parsing::model::ParsedSubmission;
use crate::parsing::submission::parse_sections_v1;
use crate::values::ValueKind;
use crate::xml::Element;

/// Validates a document tree against one schema version.
pub trait SchemaValidator: Send + Sync {
    /// Returns the list of grammar violations, if any.
    fn validate(&self, root: &Element) -> Result<(), Vec<String>>;
}

/// Section parser for a validated document.
pub type SectionParser = fn(&Element) -> Result<ParsedSubmission, SubmissionError>;

/// Schema definition registered for one version.
pub struct SchemaDefinition {
    pub version: String,
    pub validator: Box<dyn SchemaValidator>,
    pub parse: SectionParser,
}

/// Table of supported schema versions.
pub struct SchemaRegistry {
    schemas: HashMap<String, SchemaDefinition>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(SchemaDefinition {
            version: "1.0".to_string(),
            validator: Box::new(StructuralValidator),
            parse: parse_sections_v1,
        });
        registry
    }
}

impl SchemaRegistry {
    pub fn empty() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    pub fn register(&mut self, definition: SchemaDefinition) {
        self.schemas.insert(definition.version.clone(), definition);
    }

    pub fn get(&self, version: &str) -> Option<&SchemaDefinition> {
        self.schemas.get(version)
    }

    pub fn versions(&self) -> Vec<String> {
        let mut versions: Vec<String> = self.schemas.keys().cloned().collect();
        versions.sort();
        versions
    }
}

const SUMMARY_STRING_TAGS: &[&str] = &[
    "system_id",
    "distribution",
    "distroseries",
    "architecture",
    "date_created",
];
const SUMMARY_BOOL_TAGS: &[&str] = &["live_cd", "private", "contactable"];
const ANSWER_TYPES: &[&str] = &["multiple_choice", "measurement"];

/// Built-in structural grammar for schema version 1.0.
///
/// Enforces the element and attribute contracts the section parsers rely
/// on: section order, allowed tags, required attributes, value types and
/// boolean tokens. Attribute *values* such as integer IDs and timestamps
/// are left to the parsers, which reject them as format errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralValidator;

impl SchemaValidator for StructuralValidator {
    fn validate(&self, root: &Element) -> Result<(), Vec<String>> {
        let mut checker = Checker { errors: Vec::new() };
        checker.system(root);
        if checker.errors.is_empty() {
            Ok(())
        } else {
            Err(checker.errors)
        }
    }
}

struct Checker {
    errors: Vec<String>,
}

impl Checker {
    fn error(&mut self, path: &str, message: String) {
        self.errors.push(format!("{}: {}", path, message));
    }

    fn require_attrs(&mut self, path: &str, node: &Element, names: &[&str]) {
        for name in names {
            if node.attr(name).is_none() {
                self.error(path, format!("missing attribute {}", name));
            }
        }
    }

    fn no_children(&mut self, path: &str, node: &Element) {
        if let Some(child) = node.children.first() {
            self.error(path, format!("unexpected element <{}>", child.tag));
        }
    }

    fn only_children(&mut self, path: &str, node: &Element, tag: &str) -> bool {
        let mut ok = true;
        for child in &node.children {
            if child.tag != tag {
                self.error(path, format!("unexpected element <{}>, expected <{}>", child.tag, tag));
                ok = false;
            }
        }
        ok
    }

    /// Each allowed tag at most once; tags outside `allowed` are errors.
    fn at_most_once(&mut self, path: &str, node: &Element, allowed: &[&str]) {
        let mut seen: Vec<&str> = Vec::new();
        for child in &node.children {
            if !allowed.contains(&child.tag.as_str()) {
                self.error(path, format!("unexpected element <{}>", child.tag));
            } else if seen.contains(&child.tag.as_str()) {
                self.error(path, format!("element <{}> found more than once", child.tag));
            } else {
                seen.push(&child.tag);
            }
        }
    }

    fn system(&mut self, root: &Element) {
        let sections: Vec<&str> = root.children.iter().map(|c| c.tag.as_str()).collect();
        if sections != ["summary", "hardware", "software", "questions"] {
            self.error(
                "/system",
                format!(
                    "expected <summary>, <hardware>, <software>, <questions>; found {:?}",
                    sections
                ),
            );
        }
        for section in &root.children {
            match section.tag.as_str() {
                "summary" => self.summary(section),
                "hardware" => self.hardware(section),
                "software" => self.software(section),
                "questions" => self.questions(section),
                _ => {}
            }
        }
    }

    fn summary(&mut self, node: &Element) {
        let path = "/system/summary";
        let mut allowed: Vec<&str> = SUMMARY_STRING_TAGS.to_vec();
        allowed.extend_from_slice(SUMMARY_BOOL_TAGS);
        allowed.push("client");
        self.at_most_once(path, node, &allowed);

        for tag in &allowed {
            if node.child(tag).is_none() {
                self.error(path, format!("missing element <{}>", tag));
            }
        }
        for child in &node.children {
            let tag = child.tag.as_str();
            let child_path = format!("{}/{}", path, tag);
            if SUMMARY_STRING_TAGS.contains(&tag) {
                self.require_attrs(&child_path, child, &["value"]);
            } else if SUMMARY_BOOL_TAGS.contains(&tag) {
                match child.attr("value") {
                    Some("True") | Some("False") => {}
                    other => self.error(&child_path, format!("invalid boolean value {:?}", other)),
                }
            } else if tag == "client" {
                self.require_attrs(&child_path, child, &["name", "version"]);
                if self.only_children(&child_path, child, "plugin") {
                    for plugin in &child.children {
                        self.require_attrs(&format!("{}/plugin", child_path), plugin, &["name", "version"]);
                    }
                }
            }
        }
    }

    fn hardware(&mut self, node: &Element) {
        let path = "/system/hardware";
        self.at_most_once(path, node, &["hal", "processors", "aliases"]);
        if node.child("hal").is_none() {
            self.error(path, "missing element <hal>".into());
        }
        for child in &node.children {
            match child.tag.as_str() {
                "hal" => {
                    let hal_path = format!("{}/hal", path);
                    self.require_attrs(&hal_path, child, &["version"]);
                    if self.only_children(&hal_path, child, "device") {
                        for device in &child.children {
                            let device_path = format!("{}/device", hal_path);
                            self.require_attrs(&device_path, device, &["id", "udi"]);
                            self.properties(&device_path, device);
                        }
                    }
                }
                "processors" => {
                    let processors_path = format!("{}/processors", path);
                    if self.only_children(&processors_path, child, "processor") {
                        for processor in &child.children {
                            let processor_path = format!("{}/processor", processors_path);
                            self.require_attrs(&processor_path, processor, &["id", "name"]);
                            self.properties(&processor_path, processor);
                        }
                    }
                }
                "aliases" => {
                    let aliases_path = format!("{}/aliases", path);
                    if self.only_children(&aliases_path, child, "alias") {
                        for alias in &child.children {
                            let alias_path = format!("{}/alias", aliases_path);
                            self.require_attrs(&alias_path, alias, &["target"]);
                            self.at_most_once(&alias_path, alias, &["vendor", "model"]);
                            for tag in ["vendor", "model"] {
                                if alias.child(tag).is_none() {
                                    self.error(&alias_path, format!("missing element <{}>", tag));
                                }
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn software(&mut self, node: &Element) {
        let path = "/system/software";
        self.at_most_once(path, node, &["lsbrelease", "packages", "xorg"]);
        for child in &node.children {
            match child.tag.as_str() {
                "lsbrelease" => self.properties(&format!("{}/lsbrelease", path), child),
                "packages" => {
                    let packages_path = format!("{}/packages", path);
                    if self.only_children(&packages_path, child, "package") {
                        for package in &child.children {
                            let package_path = format!("{}/package", packages_path);
                            self.require_attrs(&package_path, package, &["name", "id"]);
                            self.properties(&package_path, package);
                        }
                    }
                }
                "xorg" => {
                    let xorg_path = format!("{}/xorg", path);
                    self.require_attrs(&xorg_path, child, &["version"]);
                    if self.only_children(&xorg_path, child, "driver") {
                        for driver in &child.children {
                            let driver_path = format!("{}/driver", xorg_path);
                            self.require_attrs(&driver_path, driver, &["name"]);
                            self.no_children(&driver_path, driver);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn questions(&mut self, node: &Element) {
        let path = "/system/questions";
        if !self.only_children(path, node, "question") {
            return;
        }
        for question in &node.children {
            let question_path = format!("{}/question", path);
            self.require_attrs(&question_path, question, &["name"]);
            for sub in &question.children {
                let sub_path = format!("{}/{}", question_path, sub.tag);
                match sub.tag.as_str() {
                    "answer" => match sub.attr("type") {
                        Some(t) if ANSWER_TYPES.contains(&t) => self.no_children(&sub_path, sub),
                        other => self.error(&sub_path, format!("invalid answer type {:?}", other)),
                    },
                    "answer_choices" => {
                        if self.only_children(&sub_path, sub, "value") {
                            for value in &sub.children {
                                self.value(&format!("{}/value", sub_path), value);
                            }
                        }
                    }
                    "target" => {
                        self.require_attrs(&sub_path, sub, &["id"]);
                        if self.only_children(&sub_path, sub, "driver") {
                            for driver in &sub.children {
                                self.no_children(&format!("{}/driver", sub_path), driver);
                            }
                        }
                    }
                    "comment" | "command" => self.no_children(&sub_path, sub),
                    other => self.error(&question_path, format!("unexpected element <{}>", other)),
                }
            }
        }
    }

    fn properties(&mut self, path: &str, container: &Element) {
        if !self.only_children(path, container, "property") {
            return;
        }
        for property in &container.children {
            let property_path = format!("{}/property", path);
            self.require_attrs(&property_path, property, &["name"]);
            self.value(&property_path, property);
        }
    }

    fn value(&mut self, path: &str, node: &Element) {
        let type_name = node.attr("type");
        let kind = match type_name.and_then(ValueKind::from_type_name) {
            Some(kind) => kind,
            None => {
                self.error(path, format!("invalid value type {:?}", type_name));
                return;
            }
        };
        match kind {
            ValueKind::List | ValueKind::Dict => {
                let value_path = format!("{}/value", path);
                if self.only_children(path, node, "value") {
                    for child in &node.children {
                        if kind == ValueKind::Dict {
                            self.require_attrs(&value_path, child, &["name"]);
                        }
                        self.value(&value_path, child);
                    }
                }
            }
            ValueKind::Bool => {
                self.no_children(path, node);
                let text = node.text();
                if text != "True" && text != "False" {
                    self.error(path, format!("invalid boolean value {:?}", text));
                }
            }
            _ => self.no_children(path, node),
        }
    }
}
