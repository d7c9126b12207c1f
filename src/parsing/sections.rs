//! Parsers for the `<summary>`, `<hardware>` and `<software>` sections.
//!
//! Each parser is a pure function from an element to plain data. Tags the
//! schema does not allow are invariant violations and panic; malformed
//! values are `SubmissionError`s that reject the submission.

use std::collections::BTreeMap;

use crate::error::SubmissionError;
use crate::values::{parse_int, parse_properties};
use crate::xml::Element;

use super::model::{
    Alias, Client, Hal, HalRecord, Hardware, Package, Plugin, Processor, Software, Summary, Xorg,
    XorgAttribute,
};
use super::timestamp::parse_timestamp;

fn required_attr<'a>(node: &'a Element, name: &str) -> Result<&'a str, SubmissionError> {
    node.attr(name).ok_or_else(|| SubmissionError::MissingAttribute {
        element: node.tag.clone(),
        attribute: name.to_string(),
    })
}

fn required<T>(value: Option<T>, tag: &str) -> Result<T, SubmissionError> {
    value.ok_or_else(|| SubmissionError::MissingElement(tag.to_string()))
}

fn bool_attr(node: &Element) -> Result<bool, SubmissionError> {
    let value = required_attr(node, "value")?;
    assert!(
        value == "True" || value == "False",
        "<{} value={:?}> passed schema validation",
        node.tag,
        value
    );
    Ok(value == "True")
}

fn string_attr(node: &Element) -> Result<String, SubmissionError> {
    required_attr(node, "value").map(str::to_string)
}

fn int_attr(node: &Element, name: &str) -> Result<i64, SubmissionError> {
    parse_int(required_attr(node, name)?)
}

/// Parse `<summary>`.
pub fn parse_summary(node: &Element) -> Result<Summary, SubmissionError> {
    let mut live_cd = None;
    let mut system_id = None;
    let mut distribution = None;
    let mut distroseries = None;
    let mut architecture = None;
    let mut private = None;
    let mut contactable = None;
    let mut date_created = None;
    let mut client = None;

    for child in &node.children {
        match child.tag.as_str() {
            "live_cd" => live_cd = Some(bool_attr(child)?),
            "system_id" => system_id = Some(string_attr(child)?),
            "distribution" => distribution = Some(string_attr(child)?),
            "distroseries" => distroseries = Some(string_attr(child)?),
            "architecture" => architecture = Some(string_attr(child)?),
            "private" => private = Some(bool_attr(child)?),
            "contactable" => contactable = Some(bool_attr(child)?),
            "date_created" => date_created = Some(parse_timestamp(required_attr(child, "value")?)?),
            "client" => client = Some(parse_client(child)?),
            other => panic!("unexpected <{}> in <summary> passed schema validation", other),
        }
    }

    Ok(Summary {
        live_cd: required(live_cd, "live_cd")?,
        system_id: required(system_id, "system_id")?,
        distribution: required(distribution, "distribution")?,
        distroseries: required(distroseries, "distroseries")?,
        architecture: required(architecture, "architecture")?,
        private: required(private, "private")?,
        contactable: required(contactable, "contactable")?,
        date_created: required(date_created, "date_created")?,
        client: required(client, "client")?,
    })
}

fn parse_client(node: &Element) -> Result<Client, SubmissionError> {
    let plugins = node
        .children_named("plugin")
        .map(|plugin| {
            Ok(Plugin {
                name: required_attr(plugin, "name")?.to_string(),
                version: required_attr(plugin, "version")?.to_string(),
            })
        })
        .collect::<Result<Vec<_>, SubmissionError>>()?;

    Ok(Client {
        name: required_attr(node, "name")?.to_string(),
        version: required_attr(node, "version")?.to_string(),
        plugins,
    })
}

/// Parse `<hardware>` with its `<hal>`, `<processors>` and `<aliases>` parts.
pub fn parse_hardware(node: &Element) -> Result<Hardware, SubmissionError> {
    let mut hal = None;
    let mut processors = Vec::new();
    let mut aliases = Vec::new();

    for child in &node.children {
        match child.tag.as_str() {
            "hal" => hal = Some(parse_hal(child)?),
            "processors" => processors = parse_processors(child)?,
            "aliases" => aliases = parse_aliases(child)?,
            other => panic!("unexpected <{}> in <hardware> passed schema validation", other),
        }
    }

    Ok(Hardware {
        hal: required(hal, "hal")?,
        processors,
        aliases,
    })
}

/// Parse `<hal>` into its flat list of device records.
pub fn parse_hal(node: &Element) -> Result<Hal, SubmissionError> {
    let devices = node
        .children
        .iter()
        .map(|device| {
            assert_eq!(device.tag, "device", "unexpected <{}> in <hal>", device.tag);
            let parent = match device.attr("parent") {
                Some(parent) => Some(parse_int(parent)?),
                None => None,
            };
            Ok(HalRecord {
                id: int_attr(device, "id")?,
                udi: required_attr(device, "udi")?.to_string(),
                parent,
                properties: parse_properties(device)?,
            })
        })
        .collect::<Result<Vec<_>, SubmissionError>>()?;

    Ok(Hal {
        version: node.attr("version").unwrap_or_default().to_string(),
        devices,
    })
}

pub fn parse_processors(node: &Element) -> Result<Vec<Processor>, SubmissionError> {
    node.children
        .iter()
        .map(|processor| {
            assert_eq!(processor.tag, "processor", "unexpected <{}> in <processors>", processor.tag);
            Ok(Processor {
                id: int_attr(processor, "id")?,
                name: required_attr(processor, "name")?.to_string(),
                properties: parse_properties(processor)?,
            })
        })
        .collect()
}

pub fn parse_aliases(node: &Element) -> Result<Vec<Alias>, SubmissionError> {
    node.children
        .iter()
        .map(|alias| {
            assert_eq!(alias.tag, "alias", "unexpected <{}> in <aliases>", alias.tag);
            Ok(Alias {
                target: int_attr(alias, "target")?,
                vendor: required(alias.child("vendor"), "vendor")?.text().to_string(),
                model: required(alias.child("model"), "model")?.text().to_string(),
            })
        })
        .collect()
}

/// Parse `<software>`. Absent parts default to empty collections.
pub fn parse_software(node: &Element) -> Result<Software, SubmissionError> {
    let mut software = Software::default();

    for child in &node.children {
        match child.tag.as_str() {
            "lsbrelease" => software.lsbrelease = parse_properties(child)?,
            "packages" => software.packages = parse_packages(child)?,
            "xorg" => software.xorg = parse_xorg(child)?,
            other => panic!("unexpected <{}> in <software> passed schema validation", other),
        }
    }
    Ok(software)
}

/// Parse `<packages>`. A package name listed twice is a format error.
pub fn parse_packages(node: &Element) -> Result<BTreeMap<String, Package>, SubmissionError> {
    let mut packages = BTreeMap::new();
    for package in &node.children {
        assert_eq!(package.tag, "package", "unexpected <{}> in <packages>", package.tag);
        let name = required_attr(package, "name")?;
        if packages.contains_key(name) {
            return Err(SubmissionError::Duplicate(format!(
                "<package name=\"{}\"> appears more than once",
                name
            )));
        }
        packages.insert(
            name.to_string(),
            Package {
                id: int_attr(package, "id")?,
                properties: parse_properties(package)?,
            },
        );
    }
    Ok(packages)
}

/// Parse `<xorg>`. A driver name listed twice is a format error.
pub fn parse_xorg(node: &Element) -> Result<Xorg, SubmissionError> {
    let mut drivers = BTreeMap::new();
    for driver in &node.children {
        assert_eq!(driver.tag, "driver", "unexpected <{}> in <xorg>", driver.tag);
        let name = required_attr(driver, "name")?;
        if drivers.contains_key(name) {
            return Err(SubmissionError::Duplicate(format!(
                "<driver name=\"{}\"> appears more than once in <xorg>",
                name
            )));
        }
        let mut info = BTreeMap::new();
        for (key, value) in &driver.attributes {
            let attribute = if key == "device" {
                XorgAttribute::Int(parse_int(value)?)
            } else {
                XorgAttribute::Text(value.clone())
            };
            info.insert(key.clone(), attribute);
        }
        drivers.insert(name.to_string(), info);
    }

    Ok(Xorg {
        version: node.attr("version").map(str::to_string),
        drivers,
    })
}
