//! `google.protobuf.Struct` and friends: dynamically typed values that map one to one onto JSON.

use std::collections::HashMap;

use protokit::field_types::StringType;
use protokit::json::{JsonDecoder, JsonEncoder, JsonToken};
use protokit::wkt::CustomJsonCodable;
use protokit::{
    Cardinality, Decoder, Enum, EnumLayout, EnumValueDescriptor, FieldDescriptor, FieldKind,
    FieldName, JsonDecodeError, JsonEncodeError, JsonEncodingOptions, Message, MessageLayout,
    Syntax, Visitor,
};

static NULL_VALUES: [EnumValueDescriptor; 1] =
    [EnumValueDescriptor::new(0, FieldName::Same("NULL_VALUE"))];

static NULL_VALUE_LAYOUT: EnumLayout =
    EnumLayout::new("google.protobuf.NullValue", &NULL_VALUES);

/// The single value of `google.protobuf.NullValue`. JSON writes it as `null`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum NullValue {
    #[default]
    NullValue = 0,
}

impl Enum for NullValue {
    const NAME: &'static str = "google.protobuf.NullValue";

    fn layout() -> &'static EnumLayout {
        &NULL_VALUE_LAYOUT
    }

    fn from_i32(value: i32) -> Option<NullValue> {
        (value == 0).then_some(NullValue::NullValue)
    }

    fn to_i32(self) -> i32 {
        self as i32
    }
}

static STRUCT_FIELDS: [FieldDescriptor; 1] = [FieldDescriptor::new(
    1,
    FieldName::Same("fields"),
    FieldKind::Message,
    Cardinality::Map,
)];

static STRUCT_LAYOUT: MessageLayout =
    MessageLayout::new("google.protobuf.Struct", Syntax::Proto3, &STRUCT_FIELDS);

/// A JSON object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Struct {
    pub fields: HashMap<String, Value>,
}

impl Struct {
    pub fn new() -> Struct {
        Struct::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Struct {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Struct {
        Struct {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl Message for Struct {
    const NAME: &'static str = "google.protobuf.Struct";

    fn layout() -> &'static MessageLayout {
        &STRUCT_LAYOUT
    }

    fn decode_message<D: Decoder>(&mut self, decoder: &mut D) -> Result<(), D::Error> {
        while let Some(field_number) = decoder.next_field_number()? {
            if field_number == 1 {
                decoder.decode_map_field_with_message_values::<StringType, Value>(&mut self.fields)?;
            }
        }
        Ok(())
    }

    fn traverse<V: Visitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        if !self.fields.is_empty() {
            visitor.visit_map_field_with_message_values::<StringType, Value>(&self.fields, 1)?;
        }
        Ok(())
    }

    fn custom_json(&self) -> Option<&dyn CustomJsonCodable> {
        Some(self)
    }

    fn custom_json_mut(&mut self) -> Option<&mut dyn CustomJsonCodable> {
        Some(self)
    }
}

impl CustomJsonCodable for Struct {
    fn encode_json(
        &self,
        encoder: &mut JsonEncoder,
        options: &JsonEncodingOptions,
    ) -> Result<(), JsonEncodeError> {
        let mut fields: Vec<_> = self.fields.iter().collect();
        if options.use_deterministic_ordering {
            fields.sort_unstable_by(|a, b| a.0.cmp(b.0));
        }
        encoder.start_object();
        for (key, value) in fields {
            encoder.start_field(key);
            value.encode_json(encoder, options)?;
        }
        encoder.end_object();
        Ok(())
    }

    fn decode_json(&mut self, decoder: &mut JsonDecoder<'_, '_>) -> Result<(), JsonDecodeError> {
        match decoder.scanner().next()? {
            JsonToken::BeginObject => {}
            _ => return Err(JsonDecodeError::SchemaMismatch),
        }
        if decoder.scanner().skip_optional(&JsonToken::EndObject)? {
            return Ok(());
        }
        loop {
            let key = decoder.scanner().next_key()?;
            let mut value = Value::default();
            decoder.decode_message(&mut value)?;
            self.fields.insert(key.into_owned(), value);
            if decoder.scanner().skip_optional(&JsonToken::EndObject)? {
                return Ok(());
            }
            decoder.scanner().expect(&JsonToken::Comma)?;
        }
    }
}

static VALUE_FIELDS: [FieldDescriptor; 6] = [
    FieldDescriptor::new(1, FieldName::Standard("null_value"), FieldKind::Enum, Cardinality::Optional),
    FieldDescriptor::new(2, FieldName::Standard("number_value"), FieldKind::Double, Cardinality::Optional),
    FieldDescriptor::new(3, FieldName::Standard("string_value"), FieldKind::String, Cardinality::Optional),
    FieldDescriptor::new(4, FieldName::Standard("bool_value"), FieldKind::Bool, Cardinality::Optional),
    FieldDescriptor::new(5, FieldName::Standard("struct_value"), FieldKind::Message, Cardinality::Optional),
    FieldDescriptor::new(6, FieldName::Standard("list_value"), FieldKind::Message, Cardinality::Optional),
];

static VALUE_LAYOUT: MessageLayout =
    MessageLayout::new("google.protobuf.Value", Syntax::Proto3, &VALUE_FIELDS);

/// Any JSON value. A `Value` with no kind set cannot be written as JSON.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Value {
    pub kind: Option<Kind>,
}

/// The members of the `kind` oneof.
#[derive(Clone, Debug, PartialEq)]
pub enum Kind {
    NullValue(NullValue),
    NumberValue(f64),
    StringValue(String),
    BoolValue(bool),
    StructValue(Struct),
    ListValue(ListValue),
}

impl Kind {
    fn field_number(&self) -> u32 {
        match self {
            Kind::NullValue(_) => 1,
            Kind::NumberValue(_) => 2,
            Kind::StringValue(_) => 3,
            Kind::BoolValue(_) => 4,
            Kind::StructValue(_) => 5,
            Kind::ListValue(_) => 6,
        }
    }
}

impl Value {
    pub fn null() -> Value {
        Value {
            kind: Some(Kind::NullValue(NullValue::NullValue)),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, Some(Kind::NullValue(_)))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.kind {
            Some(Kind::NumberValue(value)) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            Some(Kind::StringValue(value)) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.kind {
            Some(Kind::BoolValue(value)) => Some(value),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Struct> {
        match &self.kind {
            Some(Kind::StructValue(value)) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListValue> {
        match &self.kind {
            Some(Kind::ListValue(value)) => Some(value),
            _ => None,
        }
    }

    /// Reports a second oneof member to the decoder, which decides whether that is an error.
    fn check_oneof<D: Decoder>(&self, decoder: &mut D, field_number: u32) -> Result<(), D::Error> {
        match &self.kind {
            Some(kind) if kind.field_number() != field_number => decoder.handle_conflicting_oneof(),
            _ => Ok(()),
        }
    }
}

impl Message for Value {
    const NAME: &'static str = "google.protobuf.Value";

    fn layout() -> &'static MessageLayout {
        &VALUE_LAYOUT
    }

    fn decode_message<D: Decoder>(&mut self, decoder: &mut D) -> Result<(), D::Error> {
        while let Some(field_number) = decoder.next_field_number()? {
            if !(1..=6).contains(&field_number) {
                continue;
            }
            self.check_oneof(decoder, field_number)?;
            match field_number {
                1 => {
                    let mut value = None;
                    decoder.decode_optional_enum_field(&mut value)?;
                    if let Some(value) = value {
                        self.kind = Some(Kind::NullValue(value));
                    }
                }
                2 => {
                    let mut value = None;
                    decoder.decode_optional_double_field(&mut value)?;
                    if let Some(value) = value {
                        self.kind = Some(Kind::NumberValue(value));
                    }
                }
                3 => {
                    let mut value = None;
                    decoder.decode_optional_string_field(&mut value)?;
                    if let Some(value) = value {
                        self.kind = Some(Kind::StringValue(value));
                    }
                }
                4 => {
                    let mut value = None;
                    decoder.decode_optional_bool_field(&mut value)?;
                    if let Some(value) = value {
                        self.kind = Some(Kind::BoolValue(value));
                    }
                }
                5 => {
                    let mut value = match self.kind.take() {
                        Some(Kind::StructValue(value)) => Some(value),
                        other => {
                            self.kind = other;
                            None
                        }
                    };
                    decoder.decode_singular_message_field(&mut value)?;
                    if let Some(value) = value {
                        self.kind = Some(Kind::StructValue(value));
                    }
                }
                _ => {
                    let mut value = match self.kind.take() {
                        Some(Kind::ListValue(value)) => Some(value),
                        other => {
                            self.kind = other;
                            None
                        }
                    };
                    decoder.decode_singular_message_field(&mut value)?;
                    if let Some(value) = value {
                        self.kind = Some(Kind::ListValue(value));
                    }
                }
            }
        }
        Ok(())
    }

    fn traverse<V: Visitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        match &self.kind {
            Some(Kind::NullValue(value)) => visitor.visit_singular_enum_field(*value, 1),
            Some(Kind::NumberValue(value)) => visitor.visit_singular_double_field(*value, 2),
            Some(Kind::StringValue(value)) => visitor.visit_singular_string_field(value, 3),
            Some(Kind::BoolValue(value)) => visitor.visit_singular_bool_field(*value, 4),
            Some(Kind::StructValue(value)) => visitor.visit_singular_message_field(value, 5),
            Some(Kind::ListValue(value)) => visitor.visit_singular_message_field(value, 6),
            None => Ok(()),
        }
    }

    fn custom_json(&self) -> Option<&dyn CustomJsonCodable> {
        Some(self)
    }

    fn custom_json_mut(&mut self) -> Option<&mut dyn CustomJsonCodable> {
        Some(self)
    }
}

enum TokenShape {
    Null,
    Bool,
    Number,
    String,
    Object,
    Array,
}

impl CustomJsonCodable for Value {
    fn encode_json(
        &self,
        encoder: &mut JsonEncoder,
        options: &JsonEncodingOptions,
    ) -> Result<(), JsonEncodeError> {
        match &self.kind {
            None => return Err(JsonEncodeError::MissingValue),
            Some(Kind::NullValue(_)) => encoder.put_null(),
            Some(Kind::NumberValue(value)) if !value.is_finite() => {
                return Err(JsonEncodeError::ValueNumberNotFinite)
            }
            Some(Kind::NumberValue(value)) => encoder.put_f64(*value),
            Some(Kind::StringValue(value)) => encoder.put_string(value),
            Some(Kind::BoolValue(value)) => encoder.put_bool(*value),
            Some(Kind::StructValue(value)) => value.encode_json(encoder, options)?,
            Some(Kind::ListValue(value)) => value.encode_json(encoder, options)?,
        }
        Ok(())
    }

    fn decode_json(&mut self, decoder: &mut JsonDecoder<'_, '_>) -> Result<(), JsonDecodeError> {
        let shape = match decoder.scanner().peek()? {
            None => return Err(JsonDecodeError::Truncated),
            Some(JsonToken::Null) => TokenShape::Null,
            Some(JsonToken::True | JsonToken::False) => TokenShape::Bool,
            Some(JsonToken::Number(_)) => TokenShape::Number,
            Some(JsonToken::String(_)) => TokenShape::String,
            Some(JsonToken::BeginObject) => TokenShape::Object,
            Some(JsonToken::BeginArray) => TokenShape::Array,
            Some(_) => return Err(JsonDecodeError::Malformed),
        };
        let kind = match shape {
            TokenShape::Null => {
                decoder.scanner().next()?;
                Kind::NullValue(NullValue::NullValue)
            }
            TokenShape::Bool => Kind::BoolValue(decoder.scanner().next_bool()?),
            TokenShape::Number => Kind::NumberValue(decoder.scanner().next_double()?),
            TokenShape::String => {
                Kind::StringValue(decoder.scanner().next_quoted_string()?.into_owned())
            }
            TokenShape::Object => {
                let mut value = Struct::default();
                value.decode_json(decoder)?;
                Kind::StructValue(value)
            }
            TokenShape::Array => {
                let mut value = ListValue::default();
                value.decode_json(decoder)?;
                Kind::ListValue(value)
            }
        };
        self.kind = Some(kind);
        Ok(())
    }
}

static LIST_VALUE_FIELDS: [FieldDescriptor; 1] = [FieldDescriptor::new(
    1,
    FieldName::Same("values"),
    FieldKind::Message,
    Cardinality::Repeated,
)];

static LIST_VALUE_LAYOUT: MessageLayout =
    MessageLayout::new("google.protobuf.ListValue", Syntax::Proto3, &LIST_VALUE_FIELDS);

/// A JSON array.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListValue {
    pub values: Vec<Value>,
}

impl FromIterator<Value> for ListValue {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> ListValue {
        ListValue {
            values: iter.into_iter().collect(),
        }
    }
}

impl Message for ListValue {
    const NAME: &'static str = "google.protobuf.ListValue";

    fn layout() -> &'static MessageLayout {
        &LIST_VALUE_LAYOUT
    }

    fn decode_message<D: Decoder>(&mut self, decoder: &mut D) -> Result<(), D::Error> {
        while let Some(field_number) = decoder.next_field_number()? {
            if field_number == 1 {
                decoder.decode_repeated_message_field(&mut self.values)?;
            }
        }
        Ok(())
    }

    fn traverse<V: Visitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        if !self.values.is_empty() {
            visitor.visit_repeated_message_field(&self.values, 1)?;
        }
        Ok(())
    }

    fn custom_json(&self) -> Option<&dyn CustomJsonCodable> {
        Some(self)
    }

    fn custom_json_mut(&mut self) -> Option<&mut dyn CustomJsonCodable> {
        Some(self)
    }
}

impl CustomJsonCodable for ListValue {
    fn encode_json(
        &self,
        encoder: &mut JsonEncoder,
        options: &JsonEncodingOptions,
    ) -> Result<(), JsonEncodeError> {
        encoder.start_array();
        for value in &self.values {
            value.encode_json(encoder, options)?;
        }
        encoder.end_array();
        Ok(())
    }

    fn decode_json(&mut self, decoder: &mut JsonDecoder<'_, '_>) -> Result<(), JsonDecodeError> {
        match decoder.scanner().next()? {
            JsonToken::BeginArray => {}
            _ => return Err(JsonDecodeError::SchemaMismatch),
        }
        if decoder.scanner().skip_optional(&JsonToken::EndArray)? {
            return Ok(());
        }
        loop {
            let mut value = Value::default();
            decoder.decode_message(&mut value)?;
            self.values.push(value);
            if decoder.scanner().skip_optional(&JsonToken::EndArray)? {
                return Ok(());
            }
            decoder.scanner().expect(&JsonToken::Comma)?;
        }
    }
}
