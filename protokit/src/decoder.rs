use std::collections::HashMap;

use crate::extensions::ExtensionSet;
use crate::field_types::{FieldType, MapKeyType};
use crate::{Enum, Message};

macro_rules! scalar_methods {
    ($($singular:ident, $optional:ident, $repeated:ident, $ty:ty;)*) => {
        $(
            fn $singular(&mut self, value: &mut $ty) -> Result<(), Self::Error>;
            fn $optional(&mut self, value: &mut Option<$ty>) -> Result<(), Self::Error>;
            fn $repeated(&mut self, values: &mut Vec<$ty>) -> Result<(), Self::Error>;
        )*
    };
}

/// The decoding dual of [`Visitor`](crate::Visitor).
///
/// Generated `decode_message` bodies are format independent:
///
/// ```ignore
/// while let Some(field_number) = decoder.next_field_number()? {
///     match field_number {
///         1 => decoder.decode_singular_int32_field(&mut self.id)?,
///         2 => decoder.decode_optional_string_field(&mut self.name)?,
///         _ => {}
///     }
/// }
/// ```
///
/// Each format decides what a field number is (a binary tag, a JSON key, a text identifier) and
/// how a value is read. Fields the generated code does not consume are handled by the decoder:
/// preserved as unknown fields in binary, rejected or skipped in JSON and text.
pub trait Decoder {
    type Error;

    /// Called when a second member of a oneof is seen.
    fn handle_conflicting_oneof(&mut self) -> Result<(), Self::Error>;

    /// Advances to the next field, returning `None` at the end of the message.
    fn next_field_number(&mut self) -> Result<Option<u32>, Self::Error>;

    scalar_methods! {
        decode_singular_float_field, decode_optional_float_field, decode_repeated_float_field, f32;
        decode_singular_double_field, decode_optional_double_field, decode_repeated_double_field, f64;
        decode_singular_int32_field, decode_optional_int32_field, decode_repeated_int32_field, i32;
        decode_singular_int64_field, decode_optional_int64_field, decode_repeated_int64_field, i64;
        decode_singular_uint32_field, decode_optional_uint32_field, decode_repeated_uint32_field, u32;
        decode_singular_uint64_field, decode_optional_uint64_field, decode_repeated_uint64_field, u64;
        decode_singular_sint32_field, decode_optional_sint32_field, decode_repeated_sint32_field, i32;
        decode_singular_sint64_field, decode_optional_sint64_field, decode_repeated_sint64_field, i64;
        decode_singular_fixed32_field, decode_optional_fixed32_field, decode_repeated_fixed32_field, u32;
        decode_singular_fixed64_field, decode_optional_fixed64_field, decode_repeated_fixed64_field, u64;
        decode_singular_sfixed32_field, decode_optional_sfixed32_field, decode_repeated_sfixed32_field, i32;
        decode_singular_sfixed64_field, decode_optional_sfixed64_field, decode_repeated_sfixed64_field, i64;
        decode_singular_bool_field, decode_optional_bool_field, decode_repeated_bool_field, bool;
        decode_singular_string_field, decode_optional_string_field, decode_repeated_string_field, String;
        decode_singular_bytes_field, decode_optional_bytes_field, decode_repeated_bytes_field, Vec<u8>;
    }

    fn decode_singular_enum_field<E: Enum>(&mut self, value: &mut E) -> Result<(), Self::Error>;
    fn decode_optional_enum_field<E: Enum>(&mut self, value: &mut Option<E>) -> Result<(), Self::Error>;
    fn decode_repeated_enum_field<E: Enum>(&mut self, values: &mut Vec<E>) -> Result<(), Self::Error>;

    /// Merges the next value into `value`, creating the message if it is not set yet.
    fn decode_singular_message_field<M: Message>(&mut self, value: &mut Option<M>) -> Result<(), Self::Error>;
    fn decode_repeated_message_field<M: Message>(&mut self, values: &mut Vec<M>) -> Result<(), Self::Error>;

    fn decode_singular_group_field<M: Message>(&mut self, value: &mut Option<M>) -> Result<(), Self::Error>;
    fn decode_repeated_group_field<M: Message>(&mut self, values: &mut Vec<M>) -> Result<(), Self::Error>;

    fn decode_map_field<K: MapKeyType, V: FieldType>(
        &mut self,
        value: &mut HashMap<K::Value, V::Value>,
    ) -> Result<(), Self::Error>;

    fn decode_map_field_with_enum_values<K: MapKeyType, E: Enum>(
        &mut self,
        value: &mut HashMap<K::Value, E>,
    ) -> Result<(), Self::Error>;

    fn decode_map_field_with_message_values<K: MapKeyType, M: Message>(
        &mut self,
        value: &mut HashMap<K::Value, M>,
    ) -> Result<(), Self::Error>;

    /// Decodes a field inside one of the message's extension ranges.
    ///
    /// `extendee` is the full name of the message being decoded; the decoder resolves the
    /// extension through the registry it was given, if any.
    fn decode_extension_field(
        &mut self,
        values: &mut ExtensionSet,
        extendee: &'static str,
        field_number: u32,
    ) -> Result<(), Self::Error>;
}
