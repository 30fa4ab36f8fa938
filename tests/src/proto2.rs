//! proto2 messages: required fields, groups, closed enums, extensions and unknown fields.

use protokit::extensions::{Optional, OptionalEnum, OptionalMessage, Repeated};
use protokit::field_types::{Int32Type, StringType};
use protokit::{
    Cardinality, Decoder, Enum, EnumLayout, EnumValueDescriptor, Extension, ExtensionRegistry,
    ExtensionSet, FieldDescriptor, FieldKind, FieldName, Message, MessageLayout, Syntax,
    UnknownFields, Visitor,
};

const PROTO2_MESSAGE: &str = "protokit_test.proto2.Proto2Message";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Color {
    #[default]
    Red,
    Green,
    Blue,
}

static COLOR_VALUES: [EnumValueDescriptor; 3] = [
    EnumValueDescriptor::new(1, FieldName::Same("RED")),
    EnumValueDescriptor::new(2, FieldName::Same("GREEN")),
    EnumValueDescriptor::new(3, FieldName::Same("BLUE")),
];

static COLOR_LAYOUT: EnumLayout = EnumLayout::new("protokit_test.proto2.Color", &COLOR_VALUES);

impl Enum for Color {
    const NAME: &'static str = "protokit_test.proto2.Color";

    fn layout() -> &'static EnumLayout {
        &COLOR_LAYOUT
    }

    fn from_i32(value: i32) -> Option<Color> {
        match value {
            1 => Some(Color::Red),
            2 => Some(Color::Green),
            3 => Some(Color::Blue),
            _ => None,
        }
    }

    fn to_i32(self) -> i32 {
        match self {
            Color::Red => 1,
            Color::Green => 2,
            Color::Blue => 3,
        }
    }
}

static DATA_FIELDS: [FieldDescriptor; 2] = [
    FieldDescriptor::new(6, FieldName::Same("group_int32"), FieldKind::Int32, Cardinality::Optional),
    FieldDescriptor::new(7, FieldName::Same("group_string"), FieldKind::String, Cardinality::Optional),
];

static DATA_LAYOUT: MessageLayout =
    MessageLayout::new("protokit_test.proto2.Proto2Message.Data", Syntax::Proto2, &DATA_FIELDS);

/// The body of `optional group Data = 5`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Data {
    pub group_int32: Option<i32>,
    pub group_string: Option<String>,
    pub unknown: UnknownFields,
}

impl Message for Data {
    const NAME: &'static str = "protokit_test.proto2.Proto2Message.Data";

    fn layout() -> &'static MessageLayout {
        &DATA_LAYOUT
    }

    fn decode_message<D: Decoder>(&mut self, decoder: &mut D) -> Result<(), D::Error> {
        while let Some(field_number) = decoder.next_field_number()? {
            match field_number {
                6 => decoder.decode_optional_int32_field(&mut self.group_int32)?,
                7 => decoder.decode_optional_string_field(&mut self.group_string)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn traverse<V: Visitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        if let Some(value) = self.group_int32 {
            visitor.visit_singular_int32_field(value, 6)?;
        }
        if let Some(value) = &self.group_string {
            visitor.visit_singular_string_field(value, 7)?;
        }
        self.unknown.traverse(visitor)
    }

    fn unknown_fields(&self) -> Option<&UnknownFields> {
        Some(&self.unknown)
    }

    fn unknown_fields_mut(&mut self) -> Option<&mut UnknownFields> {
        Some(&mut self.unknown)
    }
}

static FIELDS: [FieldDescriptor; 8] = [
    FieldDescriptor::new(1, FieldName::Same("id"), FieldKind::Int32, Cardinality::Required),
    FieldDescriptor::new(2, FieldName::Same("name"), FieldKind::String, Cardinality::Optional),
    FieldDescriptor::new(3, FieldName::Same("color"), FieldKind::Enum, Cardinality::Optional),
    FieldDescriptor::new(4, FieldName::Same("samples"), FieldKind::SInt32, Cardinality::Packed),
    FieldDescriptor::new(5, FieldName::Group("Data"), FieldKind::Group, Cardinality::Optional),
    FieldDescriptor::new(8, FieldName::Same("child"), FieldKind::Message, Cardinality::Optional),
    FieldDescriptor::new(9, FieldName::Same("colors"), FieldKind::Enum, Cardinality::Repeated),
    FieldDescriptor::new(10, FieldName::Unique { proto: "raw_bytes", json: "raw" }, FieldKind::Bytes, Cardinality::Optional),
];

static LAYOUT: MessageLayout = MessageLayout::extended(
    PROTO2_MESSAGE,
    Syntax::Proto2,
    &FIELDS,
    &[],
    &[],
    &[100..200],
);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Proto2Message {
    pub id: Option<i32>,
    pub name: Option<String>,
    pub color: Option<Color>,
    pub samples: Vec<i32>,
    pub data: Option<Data>,
    pub child: Option<Box<Proto2Message>>,
    pub colors: Vec<Color>,
    pub raw_bytes: Option<Vec<u8>>,
    pub extensions: ExtensionSet,
    pub unknown: UnknownFields,
}

impl Proto2Message {
    pub fn with_id(id: i32) -> Proto2Message {
        Proto2Message {
            id: Some(id),
            ..Proto2Message::default()
        }
    }
}

impl Message for Proto2Message {
    const NAME: &'static str = PROTO2_MESSAGE;

    fn layout() -> &'static MessageLayout {
        &LAYOUT
    }

    fn decode_message<D: Decoder>(&mut self, decoder: &mut D) -> Result<(), D::Error> {
        while let Some(field_number) = decoder.next_field_number()? {
            match field_number {
                1 => decoder.decode_optional_int32_field(&mut self.id)?,
                2 => decoder.decode_optional_string_field(&mut self.name)?,
                3 => decoder.decode_optional_enum_field(&mut self.color)?,
                4 => decoder.decode_repeated_sint32_field(&mut self.samples)?,
                5 => decoder.decode_singular_group_field(&mut self.data)?,
                8 => decoder.decode_singular_message_field(&mut self.child)?,
                9 => decoder.decode_repeated_enum_field(&mut self.colors)?,
                10 => decoder.decode_optional_bytes_field(&mut self.raw_bytes)?,
                100..=199 => {
                    decoder.decode_extension_field(&mut self.extensions, PROTO2_MESSAGE, field_number)?
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn traverse<V: Visitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        if let Some(value) = self.id {
            visitor.visit_singular_int32_field(value, 1)?;
        }
        if let Some(value) = &self.name {
            visitor.visit_singular_string_field(value, 2)?;
        }
        if let Some(value) = self.color {
            visitor.visit_singular_enum_field(value, 3)?;
        }
        if !self.samples.is_empty() {
            visitor.visit_packed_sint32_field(&self.samples, 4)?;
        }
        if let Some(value) = &self.data {
            visitor.visit_singular_group_field(value, 5)?;
        }
        if let Some(value) = &self.child {
            visitor.visit_singular_message_field(value, 8)?;
        }
        visitor.visit_repeated_enum_field(&self.colors, 9)?;
        if let Some(value) = &self.raw_bytes {
            visitor.visit_singular_bytes_field(value, 10)?;
        }
        visitor.visit_extension_fields(&self.extensions, 100, 200)?;
        self.unknown.traverse(visitor)
    }

    fn is_initialized(&self) -> bool {
        self.id.is_some()
            && self.child.as_ref().map_or(true, |child| child.is_initialized())
            && self.extensions.is_initialized()
    }

    fn unknown_fields(&self) -> Option<&UnknownFields> {
        Some(&self.unknown)
    }

    fn unknown_fields_mut(&mut self) -> Option<&mut UnknownFields> {
        Some(&mut self.unknown)
    }
}

pub static EXT_COUNT: Extension<Optional<Int32Type>> =
    Extension::new(100, "protokit_test.proto2.ext_count", PROTO2_MESSAGE);

pub static EXT_TAGS: Extension<Repeated<StringType>> =
    Extension::new(101, "protokit_test.proto2.ext_tags", PROTO2_MESSAGE);

pub static EXT_CHILD: Extension<OptionalMessage<Proto2Message>> =
    Extension::new(102, "protokit_test.proto2.ext_child", PROTO2_MESSAGE);

pub static EXT_COLOR: Extension<OptionalEnum<Color>> =
    Extension::new(103, "protokit_test.proto2.ext_color", PROTO2_MESSAGE);

/// Every extension declared for `Proto2Message`.
pub fn extension_registry() -> ExtensionRegistry {
    ExtensionRegistry::new()
        .with(&EXT_COUNT)
        .with(&EXT_TAGS)
        .with(&EXT_CHILD)
        .with(&EXT_COLOR)
}
