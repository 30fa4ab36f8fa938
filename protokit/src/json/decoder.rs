use std::collections::HashMap;

use crate::extensions::{ExtensionRegistry, ExtensionSet};
use crate::field_types::{FieldType, MapKeyType};
use crate::json::scanner::{JsonScanner, JsonToken};
use crate::json::visitor::NULL_VALUE;
use crate::json::{JsonDecodeError, JsonDecodingOptions};
use crate::layout::MessageLayout;
use crate::{Decoder, Enum, Message};

type Result<T> = std::result::Result<T, JsonDecodeError>;

/// `google.protobuf.Value` reads `null` as one of its values.
const VALUE: &str = "google.protobuf.Value";

macro_rules! scalar_decoders {
    ($($singular:ident, $optional:ident, $repeated:ident, $ty:ty, $read:ident;)*) => {
        $(
            fn $singular(&mut self, value: &mut $ty) -> Result<()> {
                self.consumed = true;
                if self.scanner.skip_optional_null()? {
                    *value = <$ty>::default();
                    return Ok(());
                }
                *value = self.$read()?;
                Ok(())
            }

            fn $optional(&mut self, value: &mut Option<$ty>) -> Result<()> {
                self.consumed = true;
                if self.scanner.skip_optional_null()? {
                    *value = None;
                    return Ok(());
                }
                *value = Some(self.$read()?);
                Ok(())
            }

            fn $repeated(&mut self, values: &mut Vec<$ty>) -> Result<()> {
                self.repeated(true, |decoder| {
                    values.push(decoder.$read()?);
                    Ok(())
                })
            }
        )*
    };
}

/// Reads the members of one JSON object into a message.
///
/// Keys are matched against the JSON name, then the proto name, then `[full.name]` against the
/// extension registry. A decoder for a nested message shares the parent's scanner, and with it
/// the nesting budget.
pub struct JsonDecoder<'s, 'a> {
    scanner: &'s mut JsonScanner<'a>,
    options: JsonDecodingOptions,
    extensions: Option<&'a ExtensionRegistry>,
    layout: &'static MessageLayout,
    field_count: usize,
    /// Whether the value of the current key has been read.
    consumed: bool,
    is_map_key: bool,
    skip_key: Option<&'static str>,
}

impl<'s, 'a> JsonDecoder<'s, 'a> {
    pub fn new(
        scanner: &'s mut JsonScanner<'a>,
        options: JsonDecodingOptions,
        extensions: Option<&'a ExtensionRegistry>,
        layout: &'static MessageLayout,
    ) -> JsonDecoder<'s, 'a> {
        JsonDecoder {
            scanner,
            options,
            extensions,
            layout,
            field_count: 0,
            consumed: true,
            is_map_key: false,
            skip_key: None,
        }
    }

    /// Direct token access, for well-known types with their own JSON form.
    pub fn scanner(&mut self) -> &mut JsonScanner<'a> {
        self.scanner
    }

    /// The options in effect, with the depth limit reduced to what is left of the budget.
    pub fn options(&self) -> JsonDecodingOptions {
        self.options
            .with_message_depth_limit(self.scanner.depth_remaining())
    }

    pub fn extensions(&self) -> Option<&'a ExtensionRegistry> {
        self.extensions
    }

    /// Makes `next_field_number` pass over `key` without looking it up.
    pub fn set_skip_key(&mut self, key: Option<&'static str>) {
        self.skip_key = key;
    }

    fn nested(&mut self, layout: &'static MessageLayout) -> JsonDecoder<'_, 'a> {
        JsonDecoder::new(&mut *self.scanner, self.options, self.extensions, layout)
    }

    /// Merges one complete JSON value into `message`, spending one level of nesting.
    pub fn decode_message<M: Message>(&mut self, message: &mut M) -> Result<()> {
        self.scanner.enter()?;
        let result = self.decode_message_value(message);
        self.scanner.leave();
        result
    }

    fn decode_message_value<M: Message>(&mut self, message: &mut M) -> Result<()> {
        let mut nested = self.nested(M::layout());
        if let Some(custom) = message.custom_json_mut() {
            return custom.decode_json(&mut nested);
        }
        match nested.scanner.next()? {
            JsonToken::BeginObject => message.decode_message(&mut nested),
            _ => Err(JsonDecodeError::SchemaMismatch),
        }
    }

    fn lookup(&self, key: &str) -> Option<u32> {
        if let Some(number) = self.layout.name_map().number_for_json(key.as_bytes()) {
            return Some(number as u32);
        }
        let name = key.strip_prefix('[')?.strip_suffix(']')?;
        let handle = self.extensions?.find_by_name(self.layout.name, name)?;
        Some(handle.descriptor().field_number)
    }

    fn read_i32(&mut self) -> Result<i32> {
        i32::try_from(self.scanner.next_sint()?).map_err(|_| JsonDecodeError::NumberRange)
    }

    fn read_i64(&mut self) -> Result<i64> {
        self.scanner.next_sint()
    }

    fn read_u32(&mut self) -> Result<u32> {
        u32::try_from(self.scanner.next_uint()?).map_err(|_| JsonDecodeError::NumberRange)
    }

    fn read_u64(&mut self) -> Result<u64> {
        self.scanner.next_uint()
    }

    fn read_f32(&mut self) -> Result<f32> {
        self.scanner.next_float()
    }

    fn read_f64(&mut self) -> Result<f64> {
        self.scanner.next_double()
    }

    /// Map keys spell booleans as the strings `"true"` and `"false"`.
    fn read_bool(&mut self) -> Result<bool> {
        if !self.is_map_key {
            return self.scanner.next_bool();
        }
        match &*self.scanner.next_quoted_string()? {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(JsonDecodeError::MalformedBool),
        }
    }

    fn read_string(&mut self) -> Result<String> {
        Ok(self.scanner.next_quoted_string()?.into_owned())
    }

    fn read_bytes(&mut self) -> Result<Vec<u8>> {
        self.scanner.next_bytes()
    }

    /// `None` when the name or number is unknown and unknown values are being ignored.
    fn read_enum<E: Enum>(&mut self) -> Result<Option<E>> {
        let value = match self.scanner.next()? {
            JsonToken::String(name) => E::from_name(&name),
            JsonToken::Number(number) => {
                let number =
                    i32::try_from(number.to_i64()?).map_err(|_| JsonDecodeError::NumberRange)?;
                E::from_i32(number)
            }
            _ => return Err(JsonDecodeError::UnrecognizedEnumValue),
        };
        match value {
            Some(value) => Ok(Some(value)),
            None if self.options.ignore_unknown_fields => Ok(None),
            None => Err(JsonDecodeError::UnrecognizedEnumValue),
        }
    }

    /// Reads an array, calling `read` once per element. A `null` array is empty.
    fn repeated(&mut self, reject_null: bool, mut read: impl FnMut(&mut Self) -> Result<()>) -> Result<()> {
        self.consumed = true;
        if self.scanner.skip_optional_null()? {
            return Ok(());
        }
        match self.scanner.next()? {
            JsonToken::BeginArray => {}
            _ => return Err(JsonDecodeError::SchemaMismatch),
        }
        if self.scanner.skip_optional(&JsonToken::EndArray)? {
            return Ok(());
        }
        loop {
            if reject_null && self.scanner.peek_is_null()? {
                return Err(JsonDecodeError::IllegalNull);
            }
            read(self)?;
            if self.scanner.skip_optional(&JsonToken::EndArray)? {
                return Ok(());
            }
            self.scanner.expect(&JsonToken::Comma)?;
        }
    }

    /// Reads an object of map entries; `entry` reads the value for each decoded key.
    fn map<K: MapKeyType>(
        &mut self,
        mut entry: impl FnMut(&mut Self, K::Value) -> Result<()>,
    ) -> Result<()> {
        self.consumed = true;
        if self.scanner.skip_optional_null()? {
            return Ok(());
        }
        match self.scanner.next()? {
            JsonToken::BeginObject => {}
            _ => return Err(JsonDecodeError::MalformedMap),
        }
        if self.scanner.skip_optional(&JsonToken::EndObject)? {
            return Ok(());
        }
        loop {
            match self.scanner.peek()? {
                Some(JsonToken::String(_)) => {}
                Some(_) => return Err(JsonDecodeError::UnquotedMapKey),
                None => return Err(JsonDecodeError::Truncated),
            }
            let mut key = K::Value::default();
            self.is_map_key = true;
            let result = K::decode_singular(self, &mut key);
            self.is_map_key = false;
            result?;
            self.scanner.expect(&JsonToken::Colon)?;
            entry(self, key)?;
            if self.scanner.skip_optional(&JsonToken::EndObject)? {
                return Ok(());
            }
            self.scanner.expect(&JsonToken::Comma)?;
        }
    }
}

impl Decoder for JsonDecoder<'_, '_> {
    type Error = JsonDecodeError;

    fn handle_conflicting_oneof(&mut self) -> Result<()> {
        Err(JsonDecodeError::ConflictingOneof)
    }

    fn next_field_number(&mut self) -> Result<Option<u32>> {
        if !self.consumed {
            self.scanner.skip_value()?;
            self.consumed = true;
        }
        loop {
            if self.scanner.skip_optional(&JsonToken::EndObject)? {
                return Ok(None);
            }
            if self.field_count > 0 {
                self.scanner.expect(&JsonToken::Comma)?;
            }
            self.field_count += 1;
            let key = self.scanner.next_key()?;
            if self.skip_key == Some(&*key) {
                self.scanner.skip_value()?;
                continue;
            }
            if let Some(number) = self.lookup(&key) {
                self.consumed = false;
                return Ok(Some(number));
            }
            if !self.options.ignore_unknown_fields {
                return Err(JsonDecodeError::UnknownField(key.into_owned()));
            }
            log::trace!("skipping unknown JSON key `{}` in {}", key, self.layout.name);
            self.scanner.skip_value()?;
        }
    }

    scalar_decoders! {
        decode_singular_float_field, decode_optional_float_field, decode_repeated_float_field, f32, read_f32;
        decode_singular_double_field, decode_optional_double_field, decode_repeated_double_field, f64, read_f64;
        decode_singular_int32_field, decode_optional_int32_field, decode_repeated_int32_field, i32, read_i32;
        decode_singular_int64_field, decode_optional_int64_field, decode_repeated_int64_field, i64, read_i64;
        decode_singular_uint32_field, decode_optional_uint32_field, decode_repeated_uint32_field, u32, read_u32;
        decode_singular_uint64_field, decode_optional_uint64_field, decode_repeated_uint64_field, u64, read_u64;
        decode_singular_sint32_field, decode_optional_sint32_field, decode_repeated_sint32_field, i32, read_i32;
        decode_singular_sint64_field, decode_optional_sint64_field, decode_repeated_sint64_field, i64, read_i64;
        decode_singular_fixed32_field, decode_optional_fixed32_field, decode_repeated_fixed32_field, u32, read_u32;
        decode_singular_fixed64_field, decode_optional_fixed64_field, decode_repeated_fixed64_field, u64, read_u64;
        decode_singular_sfixed32_field, decode_optional_sfixed32_field, decode_repeated_sfixed32_field, i32, read_i32;
        decode_singular_sfixed64_field, decode_optional_sfixed64_field, decode_repeated_sfixed64_field, i64, read_i64;
        decode_singular_bool_field, decode_optional_bool_field, decode_repeated_bool_field, bool, read_bool;
        decode_singular_string_field, decode_optional_string_field, decode_repeated_string_field, String, read_string;
        decode_singular_bytes_field, decode_optional_bytes_field, decode_repeated_bytes_field, Vec<u8>, read_bytes;
    }

    fn decode_singular_enum_field<E: Enum>(&mut self, value: &mut E) -> Result<()> {
        self.consumed = true;
        if self.scanner.skip_optional_null()? {
            *value = E::default();
            return Ok(());
        }
        if let Some(decoded) = self.read_enum()? {
            *value = decoded;
        }
        Ok(())
    }

    fn decode_optional_enum_field<E: Enum>(&mut self, value: &mut Option<E>) -> Result<()> {
        self.consumed = true;
        if self.scanner.skip_optional_null()? {
            *value = (E::NAME == NULL_VALUE).then(E::default);
            return Ok(());
        }
        if let Some(decoded) = self.read_enum()? {
            *value = Some(decoded);
        }
        Ok(())
    }

    fn decode_repeated_enum_field<E: Enum>(&mut self, values: &mut Vec<E>) -> Result<()> {
        self.repeated(E::NAME != NULL_VALUE, |decoder| {
            if decoder.scanner.skip_optional_null()? {
                values.push(E::default());
            } else if let Some(value) = decoder.read_enum()? {
                values.push(value);
            }
            Ok(())
        })
    }

    fn decode_singular_message_field<M: Message>(&mut self, value: &mut Option<M>) -> Result<()> {
        self.consumed = true;
        if M::NAME != VALUE && self.scanner.skip_optional_null()? {
            *value = None;
            return Ok(());
        }
        self.decode_message(value.get_or_insert_with(M::default))
    }

    fn decode_repeated_message_field<M: Message>(&mut self, values: &mut Vec<M>) -> Result<()> {
        self.repeated(M::NAME != VALUE, |decoder| {
            let mut message = M::default();
            decoder.decode_message(&mut message)?;
            values.push(message);
            Ok(())
        })
    }

    fn decode_singular_group_field<M: Message>(&mut self, value: &mut Option<M>) -> Result<()> {
        self.decode_singular_message_field(value)
    }

    fn decode_repeated_group_field<M: Message>(&mut self, values: &mut Vec<M>) -> Result<()> {
        self.decode_repeated_message_field(values)
    }

    fn decode_map_field<K: MapKeyType, V: FieldType>(
        &mut self,
        value: &mut HashMap<K::Value, V::Value>,
    ) -> Result<()> {
        self.map::<K>(|decoder, key| {
            if decoder.scanner.peek_is_null()? {
                return Err(JsonDecodeError::IllegalNull);
            }
            let mut entry = V::Value::default();
            V::decode_singular(decoder, &mut entry)?;
            value.insert(key, entry);
            Ok(())
        })
    }

    fn decode_map_field_with_enum_values<K: MapKeyType, E: Enum>(
        &mut self,
        value: &mut HashMap<K::Value, E>,
    ) -> Result<()> {
        self.map::<K>(|decoder, key| {
            if decoder.scanner.skip_optional_null()? {
                if E::NAME != NULL_VALUE {
                    return Err(JsonDecodeError::IllegalNull);
                }
                value.insert(key, E::default());
            } else if let Some(entry) = decoder.read_enum()? {
                value.insert(key, entry);
            }
            Ok(())
        })
    }

    fn decode_map_field_with_message_values<K: MapKeyType, M: Message>(
        &mut self,
        value: &mut HashMap<K::Value, M>,
    ) -> Result<()> {
        self.map::<K>(|decoder, key| {
            if M::NAME != VALUE && decoder.scanner.peek_is_null()? {
                return Err(JsonDecodeError::IllegalNull);
            }
            let mut entry = M::default();
            decoder.decode_message(&mut entry)?;
            value.insert(key, entry);
            Ok(())
        })
    }

    fn decode_extension_field(
        &mut self,
        values: &mut ExtensionSet,
        extendee: &'static str,
        field_number: u32,
    ) -> Result<()> {
        if self.consumed {
            return Ok(());
        }
        let Some(handle) = self
            .extensions
            .and_then(|registry| registry.find(extendee, field_number))
        else {
            return Ok(());
        };
        handle.decode_json(self, values)
    }
}
