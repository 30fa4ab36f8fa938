//! Bidirectional lookup between field (or enum value) numbers and their names.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::layout::{EnumValueDescriptor, FieldDescriptor, FieldName};

/// The names one field number is known by.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Names {
    proto: &'static str,
    json: Cow<'static, str>,
}

impl Names {
    /// The name used by the text format.
    pub fn proto(&self) -> &'static str {
        self.proto
    }

    /// The name used by JSON output.
    pub fn json(&self) -> &str {
        &self.json
    }
}

/// Name tables for one message or enum type.
///
/// Keys are raw bytes so scanners can look up the slice they just read without building a
/// `String`. The JSON table also holds every proto name, because JSON input may use either.
#[derive(Debug, Default)]
pub struct NameMap {
    names: HashMap<i32, Names>,
    proto_names: HashMap<Box<[u8]>, i32>,
    json_names: HashMap<Box<[u8]>, i32>,
}

impl NameMap {
    pub fn from_fields(fields: &[FieldDescriptor]) -> NameMap {
        let mut map = NameMap::default();
        for field in fields {
            map.insert(field.number as i32, &field.name);
        }
        map
    }

    pub fn from_enum_values(values: &[EnumValueDescriptor]) -> NameMap {
        let mut map = NameMap::default();
        for value in values {
            map.insert(value.number, &value.name);
        }
        map
    }

    fn insert(&mut self, number: i32, name: &FieldName) {
        let proto = name.proto_name();
        let json: Cow<'static, str> = match *name {
            FieldName::Same(name) => Cow::Borrowed(name),
            FieldName::Standard(name) => Cow::Owned(to_json_name(name)),
            FieldName::Unique { json, .. } => Cow::Borrowed(json),
            FieldName::Aliased { proto, aliases } => {
                for alias in aliases {
                    self.add_proto_name(alias, number);
                    self.add_json_name(alias, number);
                }
                Cow::Borrowed(proto)
            }
            FieldName::Group(type_name) => {
                let lowered = type_name.to_ascii_lowercase();
                self.add_proto_name(&lowered, number);
                Cow::Owned(lowered)
            }
        };

        self.add_proto_name(proto, number);
        self.add_json_name(proto, number);
        self.add_json_name(&json, number);

        // The first name registered for a number wins; aliases never replace it.
        self.names.entry(number).or_insert(Names { proto, json });
    }

    fn add_proto_name(&mut self, name: &str, number: i32) {
        self.proto_names
            .entry(name.as_bytes().into())
            .or_insert(number);
    }

    fn add_json_name(&mut self, name: &str, number: i32) {
        self.json_names
            .entry(name.as_bytes().into())
            .or_insert(number);
    }

    pub fn names(&self, number: i32) -> Option<&Names> {
        self.names.get(&number)
    }

    /// Looks up a name as written in the text format.
    pub fn number(&self, proto_name: &[u8]) -> Option<i32> {
        self.proto_names.get(proto_name).copied()
    }

    /// Looks up a JSON key, which may be either the JSON or the proto name.
    pub fn number_for_json(&self, json_name: &[u8]) -> Option<i32> {
        self.json_names.get(json_name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Converts a proto field name to its lowerCamelCase JSON form.
///
/// Underscores are dropped and the character after each one is upper-cased.
pub fn to_json_name(proto_name: &str) -> String {
    let mut json = String::with_capacity(proto_name.len());
    let mut capitalize_next = false;
    for c in proto_name.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            json.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            json.push(c);
        }
    }
    json
}

/// Converts a lowerCamelCase JSON path back to snake case, as `FieldMask` needs.
///
/// Returns `None` when the name cannot have come from [`to_json_name`].
pub fn from_json_name(json_name: &str) -> Option<String> {
    let mut proto = String::with_capacity(json_name.len() + 4);
    for c in json_name.chars() {
        if c == '_' {
            return None;
        }
        if c.is_ascii_uppercase() {
            proto.push('_');
            proto.push(c.to_ascii_lowercase());
        } else {
            proto.push(c);
        }
    }
    Some(proto)
}
