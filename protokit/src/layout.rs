//! Static per-type field tables.
//!
//! Generated code emits one `static` [`MessageLayout`] per message type and one [`EnumLayout`] per
//! enum. The tables are plain data; the lookup structures built from them ([`NameMap`]) are
//! created on first use.

use std::ops::Range;
use std::sync::OnceLock;

use crate::encoding::WireType;
use crate::name_map::NameMap;

/// The `syntax` a message was declared with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Syntax {
    Proto2,
    Proto3,
}

/// The declared protobuf type of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Double,
    Float,
    Int64,
    UInt64,
    Int32,
    Fixed64,
    Fixed32,
    Bool,
    String,
    Group,
    Message,
    Bytes,
    UInt32,
    Enum,
    SFixed32,
    SFixed64,
    SInt32,
    SInt64,
}

impl FieldKind {
    /// The wire type a single, unpacked value of this kind is encoded with.
    pub const fn wire_type(self) -> WireType {
        match self {
            FieldKind::Int64
            | FieldKind::UInt64
            | FieldKind::Int32
            | FieldKind::Bool
            | FieldKind::UInt32
            | FieldKind::Enum
            | FieldKind::SInt32
            | FieldKind::SInt64 => WireType::Varint,
            FieldKind::Double | FieldKind::Fixed64 | FieldKind::SFixed64 => WireType::SixtyFourBit,
            FieldKind::Float | FieldKind::Fixed32 | FieldKind::SFixed32 => WireType::ThirtyTwoBit,
            FieldKind::String | FieldKind::Bytes | FieldKind::Message => {
                WireType::LengthDelimited
            }
            FieldKind::Group => WireType::StartGroup,
        }
    }

    /// Whether repeated values of this kind may use the packed encoding.
    pub const fn is_packable(self) -> bool {
        !matches!(
            self,
            FieldKind::String | FieldKind::Bytes | FieldKind::Message | FieldKind::Group
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cardinality {
    Optional,
    Required,
    Repeated,
    Packed,
    Map,
}

/// How a field (or enum value) is named in each text based format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldName {
    /// The JSON name is identical to the proto name.
    Same(&'static str),
    /// The JSON name is the lowerCamelCase form of the proto name.
    Standard(&'static str),
    /// The JSON name was declared explicitly.
    Unique {
        proto: &'static str,
        json: &'static str,
    },
    /// An enum value with additional alias names.
    Aliased {
        proto: &'static str,
        aliases: &'static [&'static str],
    },
    /// A group field, named after its message type. The field itself is the lowercased type
    /// name.
    Group(&'static str),
}

impl FieldName {
    /// The name used by the text format and by `preserve_proto_field_names`.
    pub const fn proto_name(&self) -> &'static str {
        match *self {
            FieldName::Same(name)
            | FieldName::Standard(name)
            | FieldName::Unique { proto: name, .. }
            | FieldName::Aliased { proto: name, .. }
            | FieldName::Group(name) => name,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub number: u32,
    pub name: FieldName,
    pub kind: FieldKind,
    pub cardinality: Cardinality,
}

impl FieldDescriptor {
    pub const fn new(
        number: u32,
        name: FieldName,
        kind: FieldKind,
        cardinality: Cardinality,
    ) -> FieldDescriptor {
        FieldDescriptor {
            number,
            name,
            kind,
            cardinality,
        }
    }
}

/// The static description of a message type.
///
/// `fields` must be sorted by field number.
#[derive(Debug)]
pub struct MessageLayout {
    /// Fully qualified protobuf name, e.g. `google.protobuf.Duration`.
    pub name: &'static str,
    pub syntax: Syntax,
    pub fields: &'static [FieldDescriptor],
    pub reserved_names: &'static [&'static str],
    pub reserved_ranges: &'static [Range<u32>],
    pub extension_ranges: &'static [Range<u32>],
    names: OnceLock<NameMap>,
}

impl MessageLayout {
    pub const fn new(
        name: &'static str,
        syntax: Syntax,
        fields: &'static [FieldDescriptor],
    ) -> MessageLayout {
        MessageLayout {
            name,
            syntax,
            fields,
            reserved_names: &[],
            reserved_ranges: &[],
            extension_ranges: &[],
            names: OnceLock::new(),
        }
    }

    /// A layout that also declares reserved names, reserved numbers and extension ranges.
    pub const fn extended(
        name: &'static str,
        syntax: Syntax,
        fields: &'static [FieldDescriptor],
        reserved_names: &'static [&'static str],
        reserved_ranges: &'static [Range<u32>],
        extension_ranges: &'static [Range<u32>],
    ) -> MessageLayout {
        MessageLayout {
            name,
            syntax,
            fields,
            reserved_names,
            reserved_ranges,
            extension_ranges,
            names: OnceLock::new(),
        }
    }

    /// The name lookup tables, built on first use.
    pub fn name_map(&self) -> &NameMap {
        self.names
            .get_or_init(|| NameMap::from_fields(self.fields))
    }

    pub fn field(&self, number: u32) -> Option<&'static FieldDescriptor> {
        let fields: &'static [FieldDescriptor] = self.fields;
        fields
            .binary_search_by_key(&number, |field| field.number)
            .ok()
            .map(|index| &fields[index])
    }

    pub fn is_extension_number(&self, number: u32) -> bool {
        self.extension_ranges
            .iter()
            .any(|range| range.contains(&number))
    }

    pub fn is_reserved_number(&self, number: u32) -> bool {
        self.reserved_ranges
            .iter()
            .any(|range| range.contains(&number))
    }

    pub fn is_reserved_name(&self, name: &[u8]) -> bool {
        self.reserved_names
            .iter()
            .any(|reserved| reserved.as_bytes() == name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnumValueDescriptor {
    pub number: i32,
    pub name: FieldName,
}

impl EnumValueDescriptor {
    pub const fn new(number: i32, name: FieldName) -> EnumValueDescriptor {
        EnumValueDescriptor { number, name }
    }
}

/// The static description of an enum type.
#[derive(Debug)]
pub struct EnumLayout {
    pub name: &'static str,
    pub values: &'static [EnumValueDescriptor],
    names: OnceLock<NameMap>,
}

impl EnumLayout {
    pub const fn new(name: &'static str, values: &'static [EnumValueDescriptor]) -> EnumLayout {
        EnumLayout {
            name,
            values,
            names: OnceLock::new(),
        }
    }

    pub fn name_map(&self) -> &NameMap {
        self.names
            .get_or_init(|| NameMap::from_enum_values(self.values))
    }
}
