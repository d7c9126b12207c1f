//! Typed values survive encoding into the `<property>`/`<value>` XML shape.

use std::collections::BTreeMap;

use hwdb_core::values::decode::parse_properties;
use hwdb_core::values::TypedValue;
use hwdb_core::xml::parse_document;
use proptest::prelude::*;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn encode(tag: &str, name: Option<&str>, value: &TypedValue, out: &mut String) {
    let name_attr = name
        .map(|n| format!(" name=\"{}\"", escape(n)))
        .unwrap_or_default();
    let (type_name, body) = match value {
        TypedValue::Bool(v) => ("bool", if *v { "True" } else { "False" }.to_string()),
        TypedValue::Int(v) => ("int", v.to_string()),
        TypedValue::Float(v) => ("float", format!("{:?}", v)),
        TypedValue::Str(v) => ("str", escape(v)),
        TypedValue::List(items) => {
            let mut body = String::new();
            for item in items {
                encode("value", None, item, &mut body);
            }
            ("list", body)
        }
        TypedValue::Map(entries) => {
            let mut body = String::new();
            for (key, item) in entries {
                encode("value", Some(key), item, &mut body);
            }
            ("dict", body)
        }
    };
    out.push_str(&format!(
        "<{tag}{name_attr} type=\"{type_name}\">{body}</{tag}>"
    ));
}

fn roundtrip(value: &TypedValue) -> TypedValue {
    let mut xml = String::from("<device id=\"1\" udi=\"/u\">");
    encode("property", Some("p"), value, &mut xml);
    xml.push_str("</device>");

    let device = parse_document(xml.as_bytes(), 64).unwrap();
    let mut properties = parse_properties(&device).unwrap();
    properties.remove("p").unwrap()
}

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9<>&\"' ./_-]{0,24}".prop_map(|s| s.trim().to_string())
}

fn arb_value() -> impl Strategy<Value = TypedValue> {
    let leaf = prop_oneof![
        any::<bool>().prop_map(TypedValue::Bool),
        any::<i64>().prop_map(TypedValue::Int),
        (-1.0e12f64..1.0e12).prop_map(TypedValue::Float),
        arb_text().prop_map(TypedValue::Str),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(TypedValue::List),
            prop::collection::btree_map("[a-z.]{1,12}", inner, 0..4)
                .prop_map(|m: BTreeMap<String, TypedValue>| TypedValue::Map(m)),
        ]
    })
}

proptest! {
    #[test]
    fn prop_typed_value_roundtrip(value in arb_value()) {
        prop_assert_eq!(roundtrip(&value), value);
    }
}

#[test]
fn test_nested_roundtrip() {
    let mut map = BTreeMap::new();
    map.insert("linux.sysfs_path".to_string(), TypedValue::Str("/sys/devices/pci0000:00".into()));
    map.insert("ids".to_string(), TypedValue::List(vec![TypedValue::Int(4098), TypedValue::Int(0)]));
    let value = TypedValue::List(vec![
        TypedValue::Map(map),
        TypedValue::Bool(false),
        TypedValue::Float(0.5),
        TypedValue::Str("Tom & Jerry <TV>".into()),
    ]);
    assert_eq!(roundtrip(&value), value);
}
