//! proto3 messages written the way generated code writes them.

use std::collections::HashMap;

use protokit::field_types::{BoolType, Int32Type, StringType};
use protokit::{
    Cardinality, Decoder, Enum, EnumLayout, EnumValueDescriptor, FieldDescriptor, FieldKind,
    FieldName, Message, MessageLayout, Syntax, Visitor,
};
use protokit_types::{Any, Duration, Int64Value, Timestamp, Value};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NestedEnum {
    #[default]
    Foo,
    Bar,
    Baz,
    Neg,
}

static NESTED_ENUM_VALUES: [EnumValueDescriptor; 4] = [
    EnumValueDescriptor::new(0, FieldName::Same("FOO")),
    EnumValueDescriptor::new(1, FieldName::Same("BAR")),
    EnumValueDescriptor::new(2, FieldName::Same("BAZ")),
    EnumValueDescriptor::new(-1, FieldName::Same("NEG")),
];

static NESTED_ENUM_LAYOUT: EnumLayout =
    EnumLayout::new("protokit_test.TestAllTypes.NestedEnum", &NESTED_ENUM_VALUES);

impl Enum for NestedEnum {
    const NAME: &'static str = "protokit_test.TestAllTypes.NestedEnum";

    fn layout() -> &'static EnumLayout {
        &NESTED_ENUM_LAYOUT
    }

    fn from_i32(value: i32) -> Option<NestedEnum> {
        match value {
            0 => Some(NestedEnum::Foo),
            1 => Some(NestedEnum::Bar),
            2 => Some(NestedEnum::Baz),
            -1 => Some(NestedEnum::Neg),
            _ => None,
        }
    }

    fn to_i32(self) -> i32 {
        match self {
            NestedEnum::Foo => 0,
            NestedEnum::Bar => 1,
            NestedEnum::Baz => 2,
            NestedEnum::Neg => -1,
        }
    }
}

static NESTED_FIELDS: [FieldDescriptor; 2] = [
    FieldDescriptor::new(1, FieldName::Same("a"), FieldKind::Int32, Cardinality::Optional),
    FieldDescriptor::new(2, FieldName::Same("corecursive"), FieldKind::Message, Cardinality::Optional),
];

static NESTED_LAYOUT: MessageLayout = MessageLayout::new(
    "protokit_test.TestAllTypes.NestedMessage",
    Syntax::Proto3,
    &NESTED_FIELDS,
);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NestedMessage {
    pub a: i32,
    pub corecursive: Option<Box<TestAllTypes>>,
}

impl Message for NestedMessage {
    const NAME: &'static str = "protokit_test.TestAllTypes.NestedMessage";

    fn layout() -> &'static MessageLayout {
        &NESTED_LAYOUT
    }

    fn decode_message<D: Decoder>(&mut self, decoder: &mut D) -> Result<(), D::Error> {
        while let Some(field_number) = decoder.next_field_number()? {
            match field_number {
                1 => decoder.decode_singular_int32_field(&mut self.a)?,
                2 => decoder.decode_singular_message_field(&mut self.corecursive)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn traverse<V: Visitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        if self.a != 0 {
            visitor.visit_singular_int32_field(self.a, 1)?;
        }
        if let Some(corecursive) = &self.corecursive {
            visitor.visit_singular_message_field(corecursive, 2)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum OneofField {
    Uint32(u32),
    Nested(NestedMessage),
    String(String),
}

impl OneofField {
    fn field_number(&self) -> u32 {
        match self {
            OneofField::Uint32(_) => 111,
            OneofField::Nested(_) => 112,
            OneofField::String(_) => 113,
        }
    }
}

static FIELDS: [FieldDescriptor; 33] = [
    FieldDescriptor::new(1, FieldName::Standard("optional_int32"), FieldKind::Int32, Cardinality::Optional),
    FieldDescriptor::new(2, FieldName::Standard("optional_int64"), FieldKind::Int64, Cardinality::Optional),
    FieldDescriptor::new(3, FieldName::Standard("optional_uint32"), FieldKind::UInt32, Cardinality::Optional),
    FieldDescriptor::new(4, FieldName::Standard("optional_uint64"), FieldKind::UInt64, Cardinality::Optional),
    FieldDescriptor::new(5, FieldName::Standard("optional_sint32"), FieldKind::SInt32, Cardinality::Optional),
    FieldDescriptor::new(6, FieldName::Standard("optional_sint64"), FieldKind::SInt64, Cardinality::Optional),
    FieldDescriptor::new(7, FieldName::Standard("optional_fixed32"), FieldKind::Fixed32, Cardinality::Optional),
    FieldDescriptor::new(8, FieldName::Standard("optional_fixed64"), FieldKind::Fixed64, Cardinality::Optional),
    FieldDescriptor::new(9, FieldName::Standard("optional_sfixed32"), FieldKind::SFixed32, Cardinality::Optional),
    FieldDescriptor::new(10, FieldName::Standard("optional_sfixed64"), FieldKind::SFixed64, Cardinality::Optional),
    FieldDescriptor::new(11, FieldName::Standard("optional_float"), FieldKind::Float, Cardinality::Optional),
    FieldDescriptor::new(12, FieldName::Standard("optional_double"), FieldKind::Double, Cardinality::Optional),
    FieldDescriptor::new(13, FieldName::Standard("optional_bool"), FieldKind::Bool, Cardinality::Optional),
    FieldDescriptor::new(14, FieldName::Standard("optional_string"), FieldKind::String, Cardinality::Optional),
    FieldDescriptor::new(15, FieldName::Standard("optional_bytes"), FieldKind::Bytes, Cardinality::Optional),
    FieldDescriptor::new(16, FieldName::Standard("proto3_optional_int32"), FieldKind::Int32, Cardinality::Optional),
    FieldDescriptor::new(18, FieldName::Standard("optional_nested_message"), FieldKind::Message, Cardinality::Optional),
    FieldDescriptor::new(21, FieldName::Standard("optional_nested_enum"), FieldKind::Enum, Cardinality::Optional),
    FieldDescriptor::new(31, FieldName::Standard("repeated_int32"), FieldKind::Int32, Cardinality::Packed),
    FieldDescriptor::new(32, FieldName::Standard("repeated_string"), FieldKind::String, Cardinality::Repeated),
    FieldDescriptor::new(33, FieldName::Standard("repeated_nested_message"), FieldKind::Message, Cardinality::Repeated),
    FieldDescriptor::new(34, FieldName::Standard("repeated_nested_enum"), FieldKind::Enum, Cardinality::Packed),
    FieldDescriptor::new(56, FieldName::Standard("map_string_int32"), FieldKind::Int32, Cardinality::Map),
    FieldDescriptor::new(57, FieldName::Standard("map_int32_nested_message"), FieldKind::Message, Cardinality::Map),
    FieldDescriptor::new(58, FieldName::Standard("map_bool_nested_enum"), FieldKind::Enum, Cardinality::Map),
    FieldDescriptor::new(111, FieldName::Standard("oneof_uint32"), FieldKind::UInt32, Cardinality::Optional),
    FieldDescriptor::new(112, FieldName::Standard("oneof_nested_message"), FieldKind::Message, Cardinality::Optional),
    FieldDescriptor::new(113, FieldName::Standard("oneof_string"), FieldKind::String, Cardinality::Optional),
    FieldDescriptor::new(201, FieldName::Standard("optional_duration"), FieldKind::Message, Cardinality::Optional),
    FieldDescriptor::new(202, FieldName::Standard("optional_timestamp"), FieldKind::Message, Cardinality::Optional),
    FieldDescriptor::new(203, FieldName::Standard("optional_any"), FieldKind::Message, Cardinality::Optional),
    FieldDescriptor::new(204, FieldName::Standard("optional_value"), FieldKind::Message, Cardinality::Optional),
    FieldDescriptor::new(205, FieldName::Standard("optional_int64_wrapper"), FieldKind::Message, Cardinality::Optional),
];

static LAYOUT: MessageLayout = MessageLayout::extended(
    "protokit_test.TestAllTypes",
    Syntax::Proto3,
    &FIELDS,
    &["retired_field"],
    &[300..310],
    &[],
);

/// Every field shape the runtime supports in proto3, plus a few well-known types.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TestAllTypes {
    pub optional_int32: i32,
    pub optional_int64: i64,
    pub optional_uint32: u32,
    pub optional_uint64: u64,
    pub optional_sint32: i32,
    pub optional_sint64: i64,
    pub optional_fixed32: u32,
    pub optional_fixed64: u64,
    pub optional_sfixed32: i32,
    pub optional_sfixed64: i64,
    pub optional_float: f32,
    pub optional_double: f64,
    pub optional_bool: bool,
    pub optional_string: String,
    pub optional_bytes: Vec<u8>,
    pub proto3_optional_int32: Option<i32>,
    pub optional_nested_message: Option<NestedMessage>,
    pub optional_nested_enum: NestedEnum,
    pub repeated_int32: Vec<i32>,
    pub repeated_string: Vec<String>,
    pub repeated_nested_message: Vec<NestedMessage>,
    pub repeated_nested_enum: Vec<NestedEnum>,
    pub map_string_int32: HashMap<String, i32>,
    pub map_int32_nested_message: HashMap<i32, NestedMessage>,
    pub map_bool_nested_enum: HashMap<bool, NestedEnum>,
    pub oneof_field: Option<OneofField>,
    pub optional_duration: Option<Duration>,
    pub optional_timestamp: Option<Timestamp>,
    pub optional_any: Option<Any>,
    pub optional_value: Option<Value>,
    pub optional_int64_wrapper: Option<Int64Value>,
}

impl TestAllTypes {
    fn decode_oneof<D: Decoder>(&mut self, decoder: &mut D, field_number: u32) -> Result<(), D::Error> {
        let current = self.oneof_field.take();
        if let Some(current) = &current {
            if current.field_number() != field_number {
                decoder.handle_conflicting_oneof()?;
            }
        }
        self.oneof_field = match (field_number, current) {
            (111, _) => {
                let mut value = None;
                decoder.decode_optional_uint32_field(&mut value)?;
                value.map(OneofField::Uint32)
            }
            (112, current) => {
                let mut value = match current {
                    Some(OneofField::Nested(value)) => Some(value),
                    _ => None,
                };
                decoder.decode_singular_message_field(&mut value)?;
                value.map(OneofField::Nested)
            }
            (_, _) => {
                let mut value = None;
                decoder.decode_optional_string_field(&mut value)?;
                value.map(OneofField::String)
            }
        };
        Ok(())
    }
}

impl Message for TestAllTypes {
    const NAME: &'static str = "protokit_test.TestAllTypes";

    fn layout() -> &'static MessageLayout {
        &LAYOUT
    }

    fn decode_message<D: Decoder>(&mut self, decoder: &mut D) -> Result<(), D::Error> {
        while let Some(field_number) = decoder.next_field_number()? {
            match field_number {
                1 => decoder.decode_singular_int32_field(&mut self.optional_int32)?,
                2 => decoder.decode_singular_int64_field(&mut self.optional_int64)?,
                3 => decoder.decode_singular_uint32_field(&mut self.optional_uint32)?,
                4 => decoder.decode_singular_uint64_field(&mut self.optional_uint64)?,
                5 => decoder.decode_singular_sint32_field(&mut self.optional_sint32)?,
                6 => decoder.decode_singular_sint64_field(&mut self.optional_sint64)?,
                7 => decoder.decode_singular_fixed32_field(&mut self.optional_fixed32)?,
                8 => decoder.decode_singular_fixed64_field(&mut self.optional_fixed64)?,
                9 => decoder.decode_singular_sfixed32_field(&mut self.optional_sfixed32)?,
                10 => decoder.decode_singular_sfixed64_field(&mut self.optional_sfixed64)?,
                11 => decoder.decode_singular_float_field(&mut self.optional_float)?,
                12 => decoder.decode_singular_double_field(&mut self.optional_double)?,
                13 => decoder.decode_singular_bool_field(&mut self.optional_bool)?,
                14 => decoder.decode_singular_string_field(&mut self.optional_string)?,
                15 => decoder.decode_singular_bytes_field(&mut self.optional_bytes)?,
                16 => decoder.decode_optional_int32_field(&mut self.proto3_optional_int32)?,
                18 => decoder.decode_singular_message_field(&mut self.optional_nested_message)?,
                21 => decoder.decode_singular_enum_field(&mut self.optional_nested_enum)?,
                31 => decoder.decode_repeated_int32_field(&mut self.repeated_int32)?,
                32 => decoder.decode_repeated_string_field(&mut self.repeated_string)?,
                33 => decoder.decode_repeated_message_field(&mut self.repeated_nested_message)?,
                34 => decoder.decode_repeated_enum_field(&mut self.repeated_nested_enum)?,
                56 => decoder.decode_map_field::<StringType, Int32Type>(&mut self.map_string_int32)?,
                57 => decoder.decode_map_field_with_message_values::<Int32Type, NestedMessage>(
                    &mut self.map_int32_nested_message,
                )?,
                58 => decoder.decode_map_field_with_enum_values::<BoolType, NestedEnum>(
                    &mut self.map_bool_nested_enum,
                )?,
                111..=113 => self.decode_oneof(decoder, field_number)?,
                201 => decoder.decode_singular_message_field(&mut self.optional_duration)?,
                202 => decoder.decode_singular_message_field(&mut self.optional_timestamp)?,
                203 => decoder.decode_singular_message_field(&mut self.optional_any)?,
                204 => decoder.decode_singular_message_field(&mut self.optional_value)?,
                205 => decoder.decode_singular_message_field(&mut self.optional_int64_wrapper)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn traverse<V: Visitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        if self.optional_int32 != 0 {
            visitor.visit_singular_int32_field(self.optional_int32, 1)?;
        }
        if self.optional_int64 != 0 {
            visitor.visit_singular_int64_field(self.optional_int64, 2)?;
        }
        if self.optional_uint32 != 0 {
            visitor.visit_singular_uint32_field(self.optional_uint32, 3)?;
        }
        if self.optional_uint64 != 0 {
            visitor.visit_singular_uint64_field(self.optional_uint64, 4)?;
        }
        if self.optional_sint32 != 0 {
            visitor.visit_singular_sint32_field(self.optional_sint32, 5)?;
        }
        if self.optional_sint64 != 0 {
            visitor.visit_singular_sint64_field(self.optional_sint64, 6)?;
        }
        if self.optional_fixed32 != 0 {
            visitor.visit_singular_fixed32_field(self.optional_fixed32, 7)?;
        }
        if self.optional_fixed64 != 0 {
            visitor.visit_singular_fixed64_field(self.optional_fixed64, 8)?;
        }
        if self.optional_sfixed32 != 0 {
            visitor.visit_singular_sfixed32_field(self.optional_sfixed32, 9)?;
        }
        if self.optional_sfixed64 != 0 {
            visitor.visit_singular_sfixed64_field(self.optional_sfixed64, 10)?;
        }
        if self.optional_float.to_bits() != 0 {
            visitor.visit_singular_float_field(self.optional_float, 11)?;
        }
        if self.optional_double.to_bits() != 0 {
            visitor.visit_singular_double_field(self.optional_double, 12)?;
        }
        if self.optional_bool {
            visitor.visit_singular_bool_field(self.optional_bool, 13)?;
        }
        if !self.optional_string.is_empty() {
            visitor.visit_singular_string_field(&self.optional_string, 14)?;
        }
        if !self.optional_bytes.is_empty() {
            visitor.visit_singular_bytes_field(&self.optional_bytes, 15)?;
        }
        if let Some(value) = self.proto3_optional_int32 {
            visitor.visit_singular_int32_field(value, 16)?;
        }
        if let Some(value) = &self.optional_nested_message {
            visitor.visit_singular_message_field(value, 18)?;
        }
        if self.optional_nested_enum != NestedEnum::Foo {
            visitor.visit_singular_enum_field(self.optional_nested_enum, 21)?;
        }
        if !self.repeated_int32.is_empty() {
            visitor.visit_packed_int32_field(&self.repeated_int32, 31)?;
        }
        visitor.visit_repeated_string_field(&self.repeated_string, 32)?;
        visitor.visit_repeated_message_field(&self.repeated_nested_message, 33)?;
        if !self.repeated_nested_enum.is_empty() {
            visitor.visit_packed_enum_field(&self.repeated_nested_enum, 34)?;
        }
        if !self.map_string_int32.is_empty() {
            visitor.visit_map_field::<StringType, Int32Type>(&self.map_string_int32, 56)?;
        }
        if !self.map_int32_nested_message.is_empty() {
            visitor.visit_map_field_with_message_values::<Int32Type, NestedMessage>(
                &self.map_int32_nested_message,
                57,
            )?;
        }
        if !self.map_bool_nested_enum.is_empty() {
            visitor.visit_map_field_with_enum_values::<BoolType, NestedEnum>(
                &self.map_bool_nested_enum,
                58,
            )?;
        }
        match &self.oneof_field {
            Some(OneofField::Uint32(value)) => visitor.visit_singular_uint32_field(*value, 111)?,
            Some(OneofField::Nested(value)) => visitor.visit_singular_message_field(value, 112)?,
            Some(OneofField::String(value)) => visitor.visit_singular_string_field(value, 113)?,
            None => {}
        }
        if let Some(value) = &self.optional_duration {
            visitor.visit_singular_message_field(value, 201)?;
        }
        if let Some(value) = &self.optional_timestamp {
            visitor.visit_singular_message_field(value, 202)?;
        }
        if let Some(value) = &self.optional_any {
            visitor.visit_singular_message_field(value, 203)?;
        }
        if let Some(value) = &self.optional_value {
            visitor.visit_singular_message_field(value, 204)?;
        }
        if let Some(value) = &self.optional_int64_wrapper {
            visitor.visit_singular_message_field(value, 205)?;
        }
        Ok(())
    }
}

static RECURSIVE_FIELDS: [FieldDescriptor; 2] = [
    FieldDescriptor::new(1, FieldName::Same("child"), FieldKind::Message, Cardinality::Optional),
    FieldDescriptor::new(2, FieldName::Same("depth"), FieldKind::Int32, Cardinality::Optional),
];

static RECURSIVE_LAYOUT: MessageLayout =
    MessageLayout::new("protokit_test.Recursive", Syntax::Proto3, &RECURSIVE_FIELDS);

/// A chain of messages, for exercising depth limits.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Recursive {
    pub child: Option<Box<Recursive>>,
    pub depth: i32,
}

impl Recursive {
    /// A chain of `messages` messages, the outermost included.
    pub fn chain(messages: u32) -> Recursive {
        let mut message = Recursive::default();
        for depth in 1..messages {
            message = Recursive {
                child: Some(Box::new(message)),
                depth: depth as i32,
            };
        }
        message
    }
}

impl Message for Recursive {
    const NAME: &'static str = "protokit_test.Recursive";

    fn layout() -> &'static MessageLayout {
        &RECURSIVE_LAYOUT
    }

    fn decode_message<D: Decoder>(&mut self, decoder: &mut D) -> Result<(), D::Error> {
        while let Some(field_number) = decoder.next_field_number()? {
            match field_number {
                1 => decoder.decode_singular_message_field(&mut self.child)?,
                2 => decoder.decode_singular_int32_field(&mut self.depth)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn traverse<V: Visitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        if let Some(child) = &self.child {
            visitor.visit_singular_message_field(child, 1)?;
        }
        if self.depth != 0 {
            visitor.visit_singular_int32_field(self.depth, 2)?;
        }
        Ok(())
    }
}
