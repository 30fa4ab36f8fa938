//! Hooks for the well-known types.
//!
//! The types themselves live in `protokit-types`. Several of them have a JSON form unrelated to
//! their fields (`Duration` is a string, `Struct` is any JSON object), so a message can hand the
//! JSON codecs a [`CustomJsonCodable`] that replaces the field-by-field path. `Any` also expands
//! its payload in the text format through [`CustomTextCodable`].

use crate::json::{JsonDecodeError, JsonDecoder, JsonEncodeError, JsonEncoder, JsonEncodingOptions};
use crate::text::{TextDecodeError, TextDecoder, TextEncodeError, TextEncoder, TextFormatEncodingOptions};

const PACKAGE: &str = "google.protobuf.";

/// The scalar held by one of the `google.protobuf.*Value` wrapper messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WrapperKind {
    Double,
    Float,
    Int64,
    UInt64,
    Int32,
    UInt32,
    Bool,
    String,
    Bytes,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WellKnownType {
    Any,
    Duration,
    Timestamp,
    Struct,
    Value,
    ListValue,
    NullValue,
    FieldMask,
    Empty,
    Wrapper(WrapperKind),
}

impl WellKnownType {
    /// Recognizes the fully qualified name of a well-known type.
    pub fn classify(full_name: &str) -> Option<WellKnownType> {
        let name = full_name.strip_prefix(PACKAGE)?;
        let kind = match name {
            "Any" => WellKnownType::Any,
            "Duration" => WellKnownType::Duration,
            "Timestamp" => WellKnownType::Timestamp,
            "Struct" => WellKnownType::Struct,
            "Value" => WellKnownType::Value,
            "ListValue" => WellKnownType::ListValue,
            "NullValue" => WellKnownType::NullValue,
            "FieldMask" => WellKnownType::FieldMask,
            "Empty" => WellKnownType::Empty,
            "DoubleValue" => WellKnownType::Wrapper(WrapperKind::Double),
            "FloatValue" => WellKnownType::Wrapper(WrapperKind::Float),
            "Int64Value" => WellKnownType::Wrapper(WrapperKind::Int64),
            "UInt64Value" => WellKnownType::Wrapper(WrapperKind::UInt64),
            "Int32Value" => WellKnownType::Wrapper(WrapperKind::Int32),
            "UInt32Value" => WellKnownType::Wrapper(WrapperKind::UInt32),
            "BoolValue" => WellKnownType::Wrapper(WrapperKind::Bool),
            "StringValue" => WellKnownType::Wrapper(WrapperKind::String),
            "BytesValue" => WellKnownType::Wrapper(WrapperKind::Bytes),
            _ => return None,
        };
        Some(kind)
    }

    /// Whether the JSON form is something other than an object of the message's fields.
    ///
    /// `Any` embeds such payloads under a `"value"` key.
    pub fn has_custom_json(self) -> bool {
        !matches!(self, WellKnownType::Any | WellKnownType::Empty)
    }
}

/// A JSON form that replaces the generic object of fields.
pub trait CustomJsonCodable: Send + Sync {
    /// Writes the complete JSON value for the message.
    fn encode_json(
        &self,
        encoder: &mut JsonEncoder,
        options: &JsonEncodingOptions,
    ) -> Result<(), JsonEncodeError>;

    /// Reads one complete JSON value into the message. `null` has already been handled by the
    /// caller unless the message is `google.protobuf.Value`.
    fn decode_json(&mut self, decoder: &mut JsonDecoder<'_, '_>) -> Result<(), JsonDecodeError>;
}

/// Text format handling beyond the generic field-by-field form.
pub trait CustomTextCodable: Send + Sync {
    /// Writes the body of the message. Returns `false` if nothing was written and the generic
    /// form should be used instead.
    fn encode_text(
        &self,
        encoder: &mut TextEncoder,
        options: &TextFormatEncodingOptions,
    ) -> Result<bool, TextEncodeError>;

    /// Reads the body of an expanded `[type_url] { ... }` field, positioned after the type URL.
    fn decode_expanded_field(
        &mut self,
        type_url: &str,
        decoder: &mut TextDecoder<'_, '_>,
    ) -> Result<(), TextDecodeError>;
}
