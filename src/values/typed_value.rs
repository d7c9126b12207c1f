//! Dynamically typed property values.
//!
//! `<property>` and `<value>` nodes carry a `type` attribute selecting one of
//! a small closed set of kinds. Legacy D-Bus type names written by older
//! data collectors map onto the same kinds.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Property map of a device, processor, package or LSB release section.
pub type Properties = BTreeMap<String, TypedValue>;

/// A decoded property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypedValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<TypedValue>),
    Map(BTreeMap<String, TypedValue>),
}

/// Logical kind selected by a `type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Str,
    Int,
    Float,
    List,
    Dict,
}

impl ValueKind {
    /// Resolve a `type` attribute, including the legacy D-Bus aliases.
    pub fn from_type_name(name: &str) -> Option<Self> {
        let kind = match name {
            "bool" | "dbus.Boolean" => ValueKind::Bool,
            "str" | "dbus.String" | "dbus.UTF8String" => ValueKind::Str,
            "int" | "long" | "dbus.Byte" | "dbus.Int16" | "dbus.Int32" | "dbus.Int64"
            | "dbus.UInt16" | "dbus.UInt32" | "dbus.UInt64" => ValueKind::Int,
            "float" | "dbus.Double" => ValueKind::Float,
            "list" | "dbus.Array" => ValueKind::List,
            "dict" | "dbus.Dictionary" => ValueKind::Dict,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical type name written back by encoders.
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Str => "str",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::List => "list",
            ValueKind::Dict => "dict",
        }
    }
}

impl TypedValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            TypedValue::Bool(_) => ValueKind::Bool,
            TypedValue::Int(_) => ValueKind::Int,
            TypedValue::Float(_) => ValueKind::Float,
            TypedValue::Str(_) => ValueKind::Str,
            TypedValue::List(_) => ValueKind::List,
            TypedValue::Map(_) => ValueKind::Dict,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            TypedValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            TypedValue::Float(f) => Some(*f),
            TypedValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Bool(true) => write!(f, "True"),
            TypedValue::Bool(false) => write!(f, "False"),
            TypedValue::Int(i) => write!(f, "{}", i),
            TypedValue::Float(x) => write!(f, "{}", x),
            TypedValue::Str(s) => write!(f, "{}", s),
            // Containers as JSON
            _ => write!(f, "{}", serde_json::to_string(self).map_err(|_| fmt::Error)?),
        }
    }
}
