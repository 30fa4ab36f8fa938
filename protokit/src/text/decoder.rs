use std::collections::HashMap;

use crate::extensions::{ExtensionRegistry, ExtensionSet};
use crate::field_types::{FieldType, MapKeyType};
use crate::layout::{Cardinality, FieldDescriptor, FieldKind, FieldName, MessageLayout, Syntax};
use crate::text::scanner::{FieldKey, TextScanner};
use crate::text::{TextDecodeError, TextFormatDecodingOptions};
use crate::{Decoder, Enum, Message};

type Result<T> = std::result::Result<T, TextDecodeError>;

static MAP_ENTRY_FIELDS: [FieldDescriptor; 2] = [
    FieldDescriptor::new(1, FieldName::Same("key"), FieldKind::Bytes, Cardinality::Optional),
    FieldDescriptor::new(2, FieldName::Same("value"), FieldKind::Bytes, Cardinality::Optional),
];

/// Field names of the `{ key: .. value: .. }` blocks a map is written as.
static MAP_ENTRY: MessageLayout = MessageLayout::new("", Syntax::Proto3, &MAP_ENTRY_FIELDS);

macro_rules! scalar_decoders {
    ($($singular:ident, $optional:ident, $repeated:ident, $ty:ty, $read:ident;)*) => {
        $(
            fn $singular(&mut self, value: &mut $ty) -> Result<()> {
                self.start_scalar()?;
                *value = self.$read()?;
                Ok(())
            }

            fn $optional(&mut self, value: &mut Option<$ty>) -> Result<()> {
                self.start_scalar()?;
                *value = Some(self.$read()?);
                Ok(())
            }

            fn $repeated(&mut self, values: &mut Vec<$ty>) -> Result<()> {
                self.start_scalar()?;
                self.list_or_one(|decoder| {
                    values.push(decoder.$read()?);
                    Ok(())
                })
            }
        )*
    };
}

/// Reads the fields of one text format message body.
///
/// The body ends at `terminator`, the byte closing the enclosing block, or at the end of input
/// for the top-level message. Decoders for nested messages share the scanner and its nesting
/// budget.
pub struct TextDecoder<'s, 'a> {
    scanner: &'s mut TextScanner<'a>,
    options: TextFormatDecodingOptions,
    extensions: Option<&'a ExtensionRegistry>,
    layout: &'static MessageLayout,
    terminator: Option<u8>,
    /// Whether the value of the current field has been read.
    consumed: bool,
}

impl<'s, 'a> TextDecoder<'s, 'a> {
    pub fn new(
        scanner: &'s mut TextScanner<'a>,
        options: TextFormatDecodingOptions,
        extensions: Option<&'a ExtensionRegistry>,
        layout: &'static MessageLayout,
    ) -> TextDecoder<'s, 'a> {
        TextDecoder {
            scanner,
            options,
            extensions,
            layout,
            terminator: None,
            consumed: true,
        }
    }

    pub fn scanner(&mut self) -> &mut TextScanner<'a> {
        self.scanner
    }

    /// The options in effect, with the depth limit reduced to what is left of the budget.
    pub fn options(&self) -> TextFormatDecodingOptions {
        self.options
            .with_message_depth_limit(self.scanner.depth_remaining())
    }

    pub fn extensions(&self) -> Option<&'a ExtensionRegistry> {
        self.extensions
    }

    /// Reads `[:] { ... }` (or `< ... >`) into `message`, spending one level of nesting.
    ///
    /// A message with custom text handling gets the chance to read an expanded
    /// `[type_url] { ... }` field first.
    pub fn decode_message<M: Message>(&mut self, message: &mut M) -> Result<()> {
        self.consumed = true;
        self.scanner.skip_optional_byte(b':');
        self.block(M::layout(), |nested| {
            let type_url = match message.custom_text_mut() {
                Some(_) => nested.scanner.next_type_url()?,
                None => None,
            };
            if let (Some(type_url), Some(custom)) = (type_url, message.custom_text_mut()) {
                custom.decode_expanded_field(&type_url, nested)?;
            }
            message.decode_message(nested)
        })
    }

    fn block(
        &mut self,
        layout: &'static MessageLayout,
        body: impl FnOnce(&mut TextDecoder<'_, 'a>) -> Result<()>,
    ) -> Result<()> {
        let close = self.scanner.open_block()?;
        self.scanner.enter()?;
        let mut nested = TextDecoder {
            scanner: &mut *self.scanner,
            options: self.options,
            extensions: self.extensions,
            layout,
            terminator: Some(close),
            consumed: true,
        };
        let result = body(&mut nested);
        self.scanner.leave();
        result
    }

    /// Reads either a single value or a bracketed, comma separated list of them.
    fn list_or_one(&mut self, mut element: impl FnMut(&mut Self) -> Result<()>) -> Result<()> {
        if !self.scanner.skip_optional_byte(b'[') {
            return element(self);
        }
        if self.scanner.skip_optional_byte(b']') {
            return Ok(());
        }
        loop {
            element(self)?;
            if self.scanner.skip_optional_byte(b']') {
                return Ok(());
            }
            self.scanner.skip_required_byte(b',')?;
        }
    }

    fn start_scalar(&mut self) -> Result<()> {
        self.consumed = true;
        self.scanner.skip_required_byte(b':')
    }

    /// Passes over the value of a field nobody asked for, checking only that it is well formed.
    fn skip_field_value(&mut self) -> Result<()> {
        if self.scanner.skip_optional_byte(b':') {
            self.list_or_one(|decoder| match decoder.scanner.peek_byte() {
                Some(b'{' | b'<') => decoder.skip_block(),
                _ => decoder.scanner.skip_scalar(),
            })
        } else {
            self.list_or_one(|decoder| decoder.skip_block())
        }
    }

    fn skip_block(&mut self) -> Result<()> {
        let close = self.scanner.open_block()?;
        self.scanner.enter()?;
        loop {
            self.scanner.skip_optional_separator();
            if self.scanner.skip_optional_byte(close) {
                break;
            }
            if self.scanner.is_at_end() {
                return Err(TextDecodeError::Truncated);
            }
            self.scanner.next_field_key()?;
            self.skip_field_value()?;
        }
        self.scanner.leave();
        Ok(())
    }

    fn read_i32(&mut self) -> Result<i32> {
        i32::try_from(self.scanner.next_i64()?).map_err(|_| TextDecodeError::MalformedNumber)
    }

    fn read_i64(&mut self) -> Result<i64> {
        self.scanner.next_i64()
    }

    fn read_u32(&mut self) -> Result<u32> {
        u32::try_from(self.scanner.next_u64()?).map_err(|_| TextDecodeError::MalformedNumber)
    }

    fn read_u64(&mut self) -> Result<u64> {
        self.scanner.next_u64()
    }

    fn read_f32(&mut self) -> Result<f32> {
        self.scanner.next_f32()
    }

    fn read_f64(&mut self) -> Result<f64> {
        self.scanner.next_f64()
    }

    fn read_bool(&mut self) -> Result<bool> {
        self.scanner.next_bool()
    }

    fn read_string(&mut self) -> Result<String> {
        self.scanner.next_string()
    }

    fn read_bytes(&mut self) -> Result<Vec<u8>> {
        self.scanner.next_bytes()
    }

    /// Enum values are written by name, but numbers are accepted too.
    fn read_enum<E: Enum>(&mut self) -> Result<E> {
        let value = if self.scanner.peek_is_identifier() {
            let name = self.scanner.next_identifier()?;
            E::layout()
                .name_map()
                .number(name.as_bytes())
                .and_then(E::from_i32)
        } else {
            let number = self.read_i32()?;
            E::from_i32(number)
        };
        value.ok_or(TextDecodeError::UnrecognizedEnumValue)
    }

    /// Reads one or more `{ key: .. value: .. }` entries. A missing key or value takes its
    /// default.
    fn map<K: MapKeyType, V: Default>(
        &mut self,
        map: &mut HashMap<K::Value, V>,
        mut read_value: impl FnMut(&mut TextDecoder<'_, 'a>, &mut V) -> Result<()>,
    ) -> Result<()> {
        self.consumed = true;
        self.scanner.skip_optional_byte(b':');
        self.list_or_one(|decoder| {
            let mut key = K::Value::default();
            let mut value = V::default();
            decoder.block(&MAP_ENTRY, |entry| {
                while let Some(number) = entry.next_field_number()? {
                    match number {
                        1 => K::decode_singular(entry, &mut key)?,
                        _ => read_value(entry, &mut value)?,
                    }
                }
                Ok(())
            })?;
            map.insert(key, value);
            Ok(())
        })
    }
}

impl Decoder for TextDecoder<'_, '_> {
    type Error = TextDecodeError;

    fn handle_conflicting_oneof(&mut self) -> Result<()> {
        Err(TextDecodeError::ConflictingOneof)
    }

    fn next_field_number(&mut self) -> Result<Option<u32>> {
        if !self.consumed {
            self.skip_field_value()?;
            self.consumed = true;
        }
        loop {
            self.scanner.skip_optional_separator();
            let terminator = self.terminator;
            match terminator {
                Some(close) if self.scanner.skip_optional_byte(close) => return Ok(None),
                Some(_) if self.scanner.is_at_end() => return Err(TextDecodeError::Truncated),
                None if self.scanner.is_at_end() => return Ok(None),
                _ => {}
            }
            match self.scanner.next_field_key()? {
                FieldKey::Name(name) => {
                    if let Some(number) = self.layout.name_map().number(name.as_bytes()) {
                        self.consumed = false;
                        return Ok(Some(number as u32));
                    }
                    if self.layout.is_reserved_name(name.as_bytes()) {
                        log::trace!("skipping reserved field `{}` in {}", name, self.layout.name);
                    } else if !self.options.ignore_unknown_fields {
                        return Err(TextDecodeError::UnknownField(name.to_owned()));
                    } else {
                        log::trace!("skipping unknown field `{}` in {}", name, self.layout.name);
                    }
                }
                FieldKey::Bracketed(name) => {
                    let handle = self
                        .extensions
                        .and_then(|registry| registry.find_by_name(self.layout.name, &name));
                    if let Some(handle) = handle {
                        self.consumed = false;
                        return Ok(Some(handle.descriptor().field_number));
                    }
                    if !self.options.ignore_unknown_extension_fields {
                        return Err(TextDecodeError::UnknownExtension(name));
                    }
                    log::trace!("skipping unknown extension `[{}]` in {}", name, self.layout.name);
                }
            }
            self.skip_field_value()?;
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
        self.start_scalar()?;
        *value = self.read_enum()?;
        Ok(())
    }

    fn decode_optional_enum_field<E: Enum>(&mut self, value: &mut Option<E>) -> Result<()> {
        self.start_scalar()?;
        *value = Some(self.read_enum()?);
        Ok(())
    }

    fn decode_repeated_enum_field<E: Enum>(&mut self, values: &mut Vec<E>) -> Result<()> {
        self.start_scalar()?;
        self.list_or_one(|decoder| {
            values.push(decoder.read_enum()?);
            Ok(())
        })
    }

    fn decode_singular_message_field<M: Message>(&mut self, value: &mut Option<M>) -> Result<()> {
        self.decode_message(value.get_or_insert_with(M::default))
    }

    fn decode_repeated_message_field<M: Message>(&mut self, values: &mut Vec<M>) -> Result<()> {
        self.consumed = true;
        self.scanner.skip_optional_byte(b':');
        self.list_or_one(|decoder| {
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
        self.map::<K, V::Value>(value, |entry, value| V::decode_singular(entry, value))
    }

    fn decode_map_field_with_enum_values<K: MapKeyType, E: Enum>(
        &mut self,
        value: &mut HashMap<K::Value, E>,
    ) -> Result<()> {
        self.map::<K, E>(value, |entry, value| entry.decode_singular_enum_field(value))
    }

    fn decode_map_field_with_message_values<K: MapKeyType, M: Message>(
        &mut self,
        value: &mut HashMap<K::Value, M>,
    ) -> Result<()> {
        self.map::<K, M>(value, |entry, value| entry.decode_message(value))
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
        handle.decode_text(self, values)
    }
}
