//! Decoding of `<property>` and `<value>` nodes.

use std::collections::BTreeMap;

use crate::error::SubmissionError;
use crate::xml::Element;

use super::typed_value::{Properties, TypedValue, ValueKind};

/// Decode a `<property>` or `<value>` node.
///
/// The schema validator guarantees a known `type` attribute and canonical
/// boolean tokens; reaching either check here means validator and parser
/// disagree about the grammar, which is a bug and panics.
pub fn decode_value(node: &Element) -> Result<TypedValue, SubmissionError> {
    let type_name = node.attr("type").unwrap_or_default();
    let kind = match ValueKind::from_type_name(type_name) {
        Some(kind) => kind,
        None => panic!(
            "<{}> with value type {:?} passed schema validation",
            node.tag, type_name
        ),
    };

    let value = match kind {
        ValueKind::Bool => {
            let text = node.text();
            assert!(
                text == "True" || text == "False",
                "boolean <{}> with value {:?} passed schema validation",
                node.tag,
                text
            );
            TypedValue::Bool(text == "True")
        }
        ValueKind::Str => TypedValue::Str(node.text().to_string()),
        ValueKind::Int => TypedValue::Int(parse_int(node.text())?),
        ValueKind::Float => {
            let text = node.text();
            TypedValue::Float(text.parse().map_err(|_| {
                SubmissionError::InvalidValue(format!("invalid float {:?} in <{}>", text, node.tag))
            })?)
        }
        ValueKind::List => TypedValue::List(
            node.children
                .iter()
                .map(decode_value)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        ValueKind::Dict => {
            let mut map = BTreeMap::new();
            for child in &node.children {
                let name = child.attr("name").ok_or_else(|| SubmissionError::MissingAttribute {
                    element: child.tag.clone(),
                    attribute: "name".into(),
                })?;
                map.insert(name.to_string(), decode_value(child)?);
            }
            TypedValue::Map(map)
        }
    };
    Ok(value)
}

/// Decode all `<property>` children of `container` into a name → value map.
///
/// A property name that appears twice in one container is a format error.
pub fn parse_properties(container: &Element) -> Result<Properties, SubmissionError> {
    let mut properties = Properties::new();
    for node in &container.children {
        assert_eq!(
            node.tag, "property",
            "unexpected <{}> in <{}> passed schema validation",
            node.tag, container.tag
        );
        let name = node.attr("name").ok_or_else(|| SubmissionError::MissingAttribute {
            element: "property".into(),
            attribute: "name".into(),
        })?;
        if properties.contains_key(name) {
            return Err(SubmissionError::Duplicate(format!(
                "<property name=\"{}\"> found more than once in <{}>",
                name, container.tag
            )));
        }
        properties.insert(name.to_string(), decode_value(node)?);
    }
    Ok(properties)
}

/// Parse a decimal integer after stripping surrounding whitespace.
pub fn parse_int(text: &str) -> Result<i64, SubmissionError> {
    let trimmed = text.trim();
    trimmed
        .parse()
        .map_err(|_| SubmissionError::InvalidValue(format!("invalid integer: {:?}", trimmed)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(type_name: &str, text: &str) -> Element {
        Element::new("value").with_attr("type", type_name).with_text(text)
    }

    #[test]
    fn test_scalars() {
        assert_eq!(decode_value(&value("bool", "True")).unwrap(), TypedValue::Bool(true));
        assert_eq!(
            decode_value(&value("dbus.Boolean", " False ")).unwrap(),
            TypedValue::Bool(false)
        );
        assert_eq!(
            decode_value(&value("dbus.String", "  ATA  ")).unwrap(),
            TypedValue::Str("ATA".into())
        );
        assert_eq!(decode_value(&value("str", "")).unwrap(), TypedValue::Str(String::new()));
        assert_eq!(decode_value(&value("dbus.UInt32", "4098")).unwrap(), TypedValue::Int(4098));
        assert_eq!(decode_value(&value("long", "-7")).unwrap(), TypedValue::Int(-7));
        assert_eq!(decode_value(&value("float", "1.5")).unwrap(), TypedValue::Float(1.5));
    }

    #[test]
    fn test_nested_containers() {
        let node = Element::new("property")
            .with_attr("name", "info.capabilities")
            .with_attr("type", "dbus.Dictionary")
            .with_child(value("str", "storage").with_attr("name", "kind"))
            .with_child(
                Element::new("value")
                    .with_attr("name", "caps")
                    .with_attr("type", "list")
                    .with_child(value("int", "1"))
                    .with_child(value("bool", "False")),
            );

        let decoded = decode_value(&node).unwrap();
        let mut expected = BTreeMap::new();
        expected.insert("kind".to_string(), TypedValue::Str("storage".into()));
        expected.insert(
            "caps".to_string(),
            TypedValue::List(vec![TypedValue::Int(1), TypedValue::Bool(false)]),
        );
        assert_eq!(decoded, TypedValue::Map(expected));
    }

    #[test]
    fn test_invalid_int_is_recoverable() {
        assert!(matches!(
            decode_value(&value("int", "0x10")),
            Err(SubmissionError::InvalidValue(_))
        ));
    }

    #[test]
    #[should_panic(expected = "passed schema validation")]
    fn test_bad_bool_token_panics() {
        let _ = decode_value(&value("bool", "yes"));
    }

    #[test]
    #[should_panic(expected = "passed schema validation")]
    fn test_unknown_type_panics() {
        let _ = decode_value(&value("dbus.ObjectPath", "/"));
    }

    #[test]
    fn test_duplicate_property_rejected() {
        let device = Element::new("device")
            .with_child(
                Element::new("property")
                    .with_attr("name", "info.bus")
                    .with_attr("type", "str")
                    .with_text("pci"),
            )
            .with_child(
                Element::new("property")
                    .with_attr("name", "info.bus")
                    .with_attr("type", "str")
                    .with_text("usb"),
            );
        assert!(matches!(
            parse_properties(&device),
            Err(SubmissionError::Duplicate(_))
        ));
    }
}
