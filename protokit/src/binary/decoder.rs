use std::collections::HashMap;

use bytes::Buf;

use crate::binary::BinaryDecodingOptions;
use crate::encoding::{
    self, decode_key, decode_len, decode_varint, encode_key, encode_varint, skip_field,
    DecodeContext, WireType,
};
use crate::extensions::{ExtensionRegistry, ExtensionSet};
use crate::field_types::{FieldType, MapKeyType};
use crate::layout::MessageLayout;
use crate::{DecodeError, DecodeErrorKind, Decoder, Enum, Message};

macro_rules! scalar_decoders {
    ($($singular:ident, $optional:ident, $repeated:ident, $module:ident, $ty:ty, $wire_type:expr;)*) => {
        $(
            fn $singular(&mut self, value: &mut $ty) -> Result<(), DecodeError> {
                if self.accept($wire_type) {
                    self.read(|buf| encoding::$module::merge($wire_type, value, buf))?;
                }
                Ok(())
            }

            fn $optional(&mut self, value: &mut Option<$ty>) -> Result<(), DecodeError> {
                if self.accept($wire_type) {
                    let mut decoded = <$ty>::default();
                    self.read(|buf| encoding::$module::merge($wire_type, &mut decoded, buf))?;
                    *value = Some(decoded);
                }
                Ok(())
            }

            fn $repeated(&mut self, values: &mut Vec<$ty>) -> Result<(), DecodeError> {
                if self.accept_repeated($wire_type) {
                    let wire_type = self.wire_type;
                    self.read(|buf| encoding::$module::merge_repeated(wire_type, values, buf))?;
                }
                Ok(())
            }
        )*
    };
}

/// Decodes the binary wire format from a byte slice.
///
/// Generated `decode_message` code pulls field numbers from [`BinaryDecoder::next_field_number`]
/// and hands each one to a typed `decode_*` method. A field the generated code leaves alone,
/// or one whose wire type does not match its declaration, is skipped by the next call to
/// `next_field_number` and its raw bytes are kept as an unknown field.
pub struct BinaryDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    layout: &'static MessageLayout,
    /// Offset of the current field's tag.
    field_start: usize,
    field_number: u32,
    wire_type: WireType,
    /// Whether the current field's value has been read.
    consumed: bool,
    /// The field number of the group being decoded, if this decoder reads a group body.
    group_field_number: Option<u32>,
    group_ended: bool,
    unknown: Vec<u8>,
    depth_remaining: u32,
    options: BinaryDecodingOptions,
    extensions: Option<&'a ExtensionRegistry>,
}

impl<'a> BinaryDecoder<'a> {
    /// A decoder for a top level message, which takes the first unit of the depth budget.
    pub fn new<M: Message>(
        data: &'a [u8],
        extensions: Option<&'a ExtensionRegistry>,
        options: BinaryDecodingOptions,
    ) -> Result<BinaryDecoder<'a>, DecodeError> {
        if options.message_depth_limit == 0 {
            return Err(DecodeError::new(DecodeErrorKind::DepthLimitExceeded));
        }
        Ok(BinaryDecoder::nested(
            data,
            M::layout(),
            options.message_depth_limit - 1,
            options,
            extensions,
        ))
    }

    fn nested(
        data: &'a [u8],
        layout: &'static MessageLayout,
        depth_remaining: u32,
        options: BinaryDecodingOptions,
        extensions: Option<&'a ExtensionRegistry>,
    ) -> BinaryDecoder<'a> {
        BinaryDecoder {
            data,
            pos: 0,
            layout,
            field_start: 0,
            field_number: 0,
            wire_type: WireType::Varint,
            consumed: true,
            group_field_number: None,
            group_ended: false,
            unknown: Vec::new(),
            depth_remaining,
            options,
            extensions,
        }
    }

    /// Moves the collected unknown fields into `message`, if it keeps them.
    pub fn finish<M: Message>(self, message: &mut M) {
        if self.unknown.is_empty() {
            return;
        }
        if let Some(unknown) = message.unknown_fields_mut() {
            unknown.append(&self.unknown);
        }
    }

    /// Whether all input has been read.
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn read<T>(
        &mut self,
        f: impl FnOnce(&mut &'a [u8]) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        let mut buf = &self.data[self.pos..];
        let value = f(&mut buf)?;
        self.pos = self.data.len() - buf.remaining();
        Ok(value)
    }

    /// Claims the current field if it has the expected wire type.
    fn accept(&mut self, expected: WireType) -> bool {
        if self.consumed || self.wire_type != expected {
            return false;
        }
        self.consumed = true;
        true
    }

    /// Like [`BinaryDecoder::accept`], also taking the packed form of packable types.
    fn accept_repeated(&mut self, expected: WireType) -> bool {
        if self.wire_type == WireType::LengthDelimited && expected != WireType::LengthDelimited {
            return self.accept(WireType::LengthDelimited);
        }
        self.accept(expected)
    }

    /// Skips the current field, keeping its bytes as an unknown field.
    fn skip_current(&mut self) -> Result<(), DecodeError> {
        let ctx = DecodeContext::new(self.depth_remaining);
        let (wire_type, field_number) = (self.wire_type, self.field_number);
        self.read(|buf| skip_field(wire_type, field_number, buf, ctx))?;
        self.consumed = true;
        if !self.options.discard_unknown_fields {
            log::trace!("keeping unknown field {} of {}", field_number, self.layout.name);
            self.unknown
                .extend_from_slice(&self.data[self.field_start..self.pos]);
        }
        Ok(())
    }

    fn nested_depth(&self) -> Result<u32, DecodeError> {
        self.depth_remaining
            .checked_sub(1)
            .ok_or_else(|| DecodeError::new(DecodeErrorKind::DepthLimitExceeded))
    }

    /// Adds the current field to the error's location stack.
    fn locate(&self, mut error: DecodeError) -> DecodeError {
        let field = self
            .layout
            .field(self.field_number)
            .map_or("<unknown>", |field| field.name.proto_name());
        error.push(self.layout.name, field);
        error
    }

    fn decode_nested_message<M: Message>(&mut self, message: &mut M) -> Result<(), DecodeError> {
        let len = self.read(|buf| decode_len(buf))?;
        let end = self.pos + len;
        let depth = self.nested_depth()?;
        let mut nested = BinaryDecoder::nested(
            &self.data[self.pos..end],
            M::layout(),
            depth,
            self.options,
            self.extensions,
        );
        message
            .decode_message(&mut nested)
            .map_err(|error| self.locate(error))?;
        nested.finish(message);
        self.pos = end;
        Ok(())
    }

    fn decode_nested_group<M: Message>(&mut self, message: &mut M) -> Result<(), DecodeError> {
        let depth = self.nested_depth()?;
        let mut nested = BinaryDecoder::nested(
            &self.data[self.pos..],
            M::layout(),
            depth,
            self.options,
            self.extensions,
        );
        nested.group_field_number = Some(self.field_number);
        message
            .decode_message(&mut nested)
            .map_err(|error| self.locate(error))?;
        if !nested.group_ended {
            return Err(self.locate(DecodeError::truncated()));
        }
        self.pos += nested.pos;
        nested.finish(message);
        Ok(())
    }

    /// Reads an enum value, leaving the field unconsumed if the enum does not know the number.
    fn read_enum<E: Enum>(&mut self) -> Result<Option<E>, DecodeError> {
        if !self.accept(WireType::Varint) {
            return Ok(None);
        }
        let start = self.pos;
        let raw = self.read(|buf| decode_varint(buf))?;
        match E::from_i32(raw as i32) {
            Some(value) => Ok(Some(value)),
            None => {
                self.pos = start;
                self.consumed = false;
                Ok(None)
            }
        }
    }

    /// Reads one map entry, calling `field` for each of its fields.
    fn decode_map_entry(
        &mut self,
        mut field: impl FnMut(&mut BinaryDecoder<'a>, u32) -> Result<(), DecodeError>,
    ) -> Result<(), DecodeError> {
        let len = self.read(|buf| decode_len(buf))?;
        let end = self.pos + len;
        let mut entry = BinaryDecoder::nested(
            &self.data[self.pos..end],
            self.layout,
            self.depth_remaining,
            self.options.with_discard_unknown_fields(true),
            self.extensions,
        );
        while let Some(number) = entry.next_field_number()? {
            field(&mut entry, number).map_err(|error| self.locate(error))?;
        }
        self.pos = end;
        Ok(())
    }
}

fn missing_entry_part() -> DecodeError {
    DecodeError::malformed("map entry is missing its key or value")
}

impl<'a> Decoder for BinaryDecoder<'a> {
    type Error = DecodeError;

    fn handle_conflicting_oneof(&mut self) -> Result<(), DecodeError> {
        Ok(())
    }

    fn next_field_number(&mut self) -> Result<Option<u32>, DecodeError> {
        if !self.consumed {
            self.skip_current()?;
        }
        if self.is_at_end() {
            if self.group_field_number.is_some() {
                return Err(DecodeError::truncated());
            }
            return Ok(None);
        }
        self.field_start = self.pos;
        let (field_number, wire_type) = self.read(|buf| decode_key(buf))?;
        if wire_type == WireType::EndGroup {
            if self.group_field_number == Some(field_number) {
                self.group_ended = true;
                return Ok(None);
            }
            return Err(DecodeError::malformed("unexpected end group tag"));
        }
        self.field_number = field_number;
        self.wire_type = wire_type;
        self.consumed = false;
        Ok(Some(field_number))
    }

    scalar_decoders! {
        decode_singular_float_field, decode_optional_float_field, decode_repeated_float_field, float, f32, WireType::ThirtyTwoBit;
        decode_singular_double_field, decode_optional_double_field, decode_repeated_double_field, double, f64, WireType::SixtyFourBit;
        decode_singular_int32_field, decode_optional_int32_field, decode_repeated_int32_field, int32, i32, WireType::Varint;
        decode_singular_int64_field, decode_optional_int64_field, decode_repeated_int64_field, int64, i64, WireType::Varint;
        decode_singular_uint32_field, decode_optional_uint32_field, decode_repeated_uint32_field, uint32, u32, WireType::Varint;
        decode_singular_uint64_field, decode_optional_uint64_field, decode_repeated_uint64_field, uint64, u64, WireType::Varint;
        decode_singular_sint32_field, decode_optional_sint32_field, decode_repeated_sint32_field, sint32, i32, WireType::Varint;
        decode_singular_sint64_field, decode_optional_sint64_field, decode_repeated_sint64_field, sint64, i64, WireType::Varint;
        decode_singular_fixed32_field, decode_optional_fixed32_field, decode_repeated_fixed32_field, fixed32, u32, WireType::ThirtyTwoBit;
        decode_singular_fixed64_field, decode_optional_fixed64_field, decode_repeated_fixed64_field, fixed64, u64, WireType::SixtyFourBit;
        decode_singular_sfixed32_field, decode_optional_sfixed32_field, decode_repeated_sfixed32_field, sfixed32, i32, WireType::ThirtyTwoBit;
        decode_singular_sfixed64_field, decode_optional_sfixed64_field, decode_repeated_sfixed64_field, sfixed64, i64, WireType::SixtyFourBit;
        decode_singular_bool_field, decode_optional_bool_field, decode_repeated_bool_field, bool, bool, WireType::Varint;
        decode_singular_string_field, decode_optional_string_field, decode_repeated_string_field, string, String, WireType::LengthDelimited;
        decode_singular_bytes_field, decode_optional_bytes_field, decode_repeated_bytes_field, bytes, Vec<u8>, WireType::LengthDelimited;
    }

    fn decode_singular_enum_field<E: Enum>(&mut self, value: &mut E) -> Result<(), DecodeError> {
        if let Some(decoded) = self.read_enum()? {
            *value = decoded;
        }
        Ok(())
    }

    fn decode_optional_enum_field<E: Enum>(&mut self, value: &mut Option<E>) -> Result<(), DecodeError> {
        if let Some(decoded) = self.read_enum()? {
            *value = Some(decoded);
        }
        Ok(())
    }

    fn decode_repeated_enum_field<E: Enum>(&mut self, values: &mut Vec<E>) -> Result<(), DecodeError> {
        if self.consumed || self.wire_type != WireType::LengthDelimited {
            if let Some(decoded) = self.read_enum()? {
                values.push(decoded);
            }
            return Ok(());
        }
        self.consumed = true;
        let len = self.read(|buf| decode_len(buf))?;
        let end = self.pos + len;
        let mut buf = &self.data[self.pos..end];
        while buf.has_remaining() {
            let raw = decode_varint(&mut buf)?;
            match E::from_i32(raw as i32) {
                Some(value) => values.push(value),
                None if self.options.discard_unknown_fields => {}
                None => {
                    encode_key(self.field_number, WireType::Varint, &mut self.unknown);
                    encode_varint(raw, &mut self.unknown);
                }
            }
        }
        self.pos = end;
        Ok(())
    }

    fn decode_singular_message_field<M: Message>(&mut self, value: &mut Option<M>) -> Result<(), DecodeError> {
        if self.accept(WireType::LengthDelimited) {
            let message = value.get_or_insert_with(M::default);
            self.decode_nested_message(message)?;
        }
        Ok(())
    }

    fn decode_repeated_message_field<M: Message>(&mut self, values: &mut Vec<M>) -> Result<(), DecodeError> {
        if self.accept(WireType::LengthDelimited) {
            let mut message = M::default();
            self.decode_nested_message(&mut message)?;
            values.push(message);
        }
        Ok(())
    }

    fn decode_singular_group_field<M: Message>(&mut self, value: &mut Option<M>) -> Result<(), DecodeError> {
        if self.accept(WireType::StartGroup) {
            let message = value.get_or_insert_with(M::default);
            self.decode_nested_group(message)?;
        }
        Ok(())
    }

    fn decode_repeated_group_field<M: Message>(&mut self, values: &mut Vec<M>) -> Result<(), DecodeError> {
        if self.accept(WireType::StartGroup) {
            let mut message = M::default();
            self.decode_nested_group(&mut message)?;
            values.push(message);
        }
        Ok(())
    }

    fn decode_map_field<K: MapKeyType, V: FieldType>(
        &mut self,
        value: &mut HashMap<K::Value, V::Value>,
    ) -> Result<(), DecodeError> {
        if !self.accept(WireType::LengthDelimited) {
            return Ok(());
        }
        let mut key = None;
        let mut entry_value = None;
        self.decode_map_entry(|entry, number| match number {
            1 => K::decode_optional(entry, &mut key),
            2 => V::decode_optional(entry, &mut entry_value),
            _ => Ok(()),
        })?;
        match (key, entry_value) {
            (Some(key), Some(entry_value)) => {
                value.insert(key, entry_value);
                Ok(())
            }
            _ => Err(missing_entry_part()),
        }
    }

    fn decode_map_field_with_enum_values<K: MapKeyType, E: Enum>(
        &mut self,
        value: &mut HashMap<K::Value, E>,
    ) -> Result<(), DecodeError> {
        if !self.accept(WireType::LengthDelimited) {
            return Ok(());
        }
        let entry_start = self.field_start;
        let mut key = None;
        let mut entry_value = None;
        let mut unrecognized = false;
        self.decode_map_entry(|entry, number| match number {
            1 => K::decode_optional(entry, &mut key),
            2 => {
                entry.decode_optional_enum_field(&mut entry_value)?;
                if entry_value.is_none() && !entry.consumed {
                    unrecognized = true;
                }
                Ok(())
            }
            _ => Ok(()),
        })?;
        match (key, entry_value) {
            (Some(key), Some(entry_value)) => {
                value.insert(key, entry_value);
                Ok(())
            }
            (Some(_), None) if unrecognized => {
                if !self.options.discard_unknown_fields {
                    self.unknown
                        .extend_from_slice(&self.data[entry_start..self.pos]);
                }
                Ok(())
            }
            _ => Err(missing_entry_part()),
        }
    }

    fn decode_map_field_with_message_values<K: MapKeyType, M: Message>(
        &mut self,
        value: &mut HashMap<K::Value, M>,
    ) -> Result<(), DecodeError> {
        if !self.accept(WireType::LengthDelimited) {
            return Ok(());
        }
        let mut key = None;
        let mut entry_value = None;
        self.decode_map_entry(|entry, number| match number {
            1 => K::decode_optional(entry, &mut key),
            2 => entry.decode_singular_message_field(&mut entry_value),
            _ => Ok(()),
        })?;
        match (key, entry_value) {
            (Some(key), Some(entry_value)) => {
                value.insert(key, entry_value);
                Ok(())
            }
            _ => Err(missing_entry_part()),
        }
    }

    fn decode_extension_field(
        &mut self,
        values: &mut ExtensionSet,
        extendee: &'static str,
        field_number: u32,
    ) -> Result<(), DecodeError> {
        if self.consumed {
            return Ok(());
        }
        let Some(handle) = self
            .extensions
            .and_then(|registry| registry.find(extendee, field_number))
        else {
            return Ok(());
        };
        handle.decode_binary(self, values)
    }
}
