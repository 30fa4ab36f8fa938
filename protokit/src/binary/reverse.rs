//! Back-to-front binary encoding.
//!
//! A nested message's length prefix is written after its payload, once the length is known, so
//! no size pass is needed. Each `visit_*` call writes one chunk (tag in front of value) before
//! the chunks already written; when a message ends, its chunks are put back in field order. The
//! result is byte-identical to [`BinaryEncodingVisitor`](super::BinaryEncodingVisitor).

use std::collections::HashMap;

use crate::binary::BinaryEncodingOptions;
use crate::encoding::{encode_varint, encode_zigzag32, encode_zigzag64, FieldTag, WireType};
use crate::extensions::ExtensionSet;
use crate::field_types::{FieldType, MapKeyType};
use crate::visitor::map_entries;
use crate::{EncodeError, Enum, Message, Visitor};

const MIN_CAPACITY: usize = 64;

/// A byte buffer that grows towards its start.
#[derive(Clone, Debug)]
pub struct ReverseEncoder {
    buf: Vec<u8>,
    front: usize,
}

impl Default for ReverseEncoder {
    fn default() -> ReverseEncoder {
        ReverseEncoder::with_capacity(MIN_CAPACITY)
    }
}

impl ReverseEncoder {
    pub fn new() -> ReverseEncoder {
        ReverseEncoder::default()
    }

    pub fn with_capacity(capacity: usize) -> ReverseEncoder {
        ReverseEncoder {
            buf: vec![0; capacity],
            front: capacity,
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len() - self.front
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf[self.front..]
    }

    pub fn into_vec(self) -> Vec<u8> {
        let mut buf = self.buf;
        buf.drain(..self.front);
        buf
    }

    fn reserve(&mut self, additional: usize) {
        if self.front >= additional {
            return;
        }
        let len = self.len();
        let capacity = (self.buf.len() * 2).max(len + additional).max(MIN_CAPACITY);
        let mut buf = vec![0; capacity];
        let front = capacity - len;
        buf[front..].copy_from_slice(&self.buf[self.front..]);
        self.buf = buf;
        self.front = front;
    }

    /// Writes `bytes` in front of everything written so far.
    pub fn put_slice(&mut self, bytes: &[u8]) {
        self.reserve(bytes.len());
        self.front -= bytes.len();
        self.buf[self.front..self.front + bytes.len()].copy_from_slice(bytes);
    }

    pub fn put_varint(&mut self, value: u64) {
        let mut scratch = [0u8; 10];
        let written = {
            let mut rest = &mut scratch[..];
            encode_varint(value, &mut rest);
            10 - rest.len()
        };
        self.put_slice(&scratch[..written]);
    }

    pub fn put_tag(&mut self, field_number: u32, wire_type: WireType) {
        self.put_varint(u64::from(FieldTag::new(field_number, wire_type).raw_value()));
    }

    /// Reverses everything written after the first `offset` bytes, then each chunk within it.
    /// `chunks` holds chunk sizes in the order they were written.
    fn reorder(&mut self, offset: usize, chunks: &[usize]) {
        let end = self.buf.len() - offset;
        let region = &mut self.buf[self.front..end];
        region.reverse();
        let mut start = 0;
        for &size in chunks {
            region[start..start + size].reverse();
            start += size;
        }
    }
}

macro_rules! reverse_scalars {
    ($($singular:ident, $repeated:ident, $packed:ident, $ty:ty, $wire_type:expr,
       |$encoder:ident, $value:ident| $put:expr;)*) => {
        $(
            fn $singular(&mut self, value: $ty, field_number: u32) -> Result<(), EncodeError> {
                let $encoder = &mut *self.encoder;
                let $value = value;
                $put;
                $encoder.put_tag(field_number, $wire_type);
                self.mark();
                Ok(())
            }

            fn $repeated(&mut self, values: &[$ty], field_number: u32) -> Result<(), EncodeError> {
                let $encoder = &mut *self.encoder;
                for $value in values.iter().rev().copied() {
                    $put;
                    $encoder.put_tag(field_number, $wire_type);
                }
                self.mark();
                Ok(())
            }

            fn $packed(&mut self, values: &[$ty], field_number: u32) -> Result<(), EncodeError> {
                if values.is_empty() {
                    return Ok(());
                }
                let $encoder = &mut *self.encoder;
                let start = $encoder.len();
                for $value in values.iter().rev().copied() {
                    $put;
                }
                let len = $encoder.len() - start;
                $encoder.put_varint(len as u64);
                $encoder.put_tag(field_number, WireType::LengthDelimited);
                self.mark();
                Ok(())
            }
        )*
    };
}

/// The visitor side of [`ReverseEncoder`].
#[derive(Debug)]
pub struct BinaryReverseEncodingVisitor<'a> {
    encoder: &'a mut ReverseEncoder,
    options: BinaryEncodingOptions,
    /// Length of the encoder when this message started.
    base: usize,
    /// Sizes of the chunks written for this message, in the order they were written.
    chunks: Vec<usize>,
    last: usize,
}

impl<'a> BinaryReverseEncodingVisitor<'a> {
    pub fn new(encoder: &'a mut ReverseEncoder, options: BinaryEncodingOptions) -> BinaryReverseEncodingVisitor<'a> {
        let base = encoder.len();
        BinaryReverseEncodingVisitor {
            encoder,
            options,
            base,
            chunks: Vec::new(),
            last: base,
        }
    }

    fn nested(&mut self) -> BinaryReverseEncodingVisitor<'_> {
        BinaryReverseEncodingVisitor::new(&mut *self.encoder, self.options)
    }

    /// Records everything written since the previous mark as one chunk.
    fn mark(&mut self) {
        let len = self.encoder.len();
        if len > self.last {
            self.chunks.push(len - self.last);
            self.last = len;
        }
    }

    /// Puts this message's chunks back into field order. Returns the message length.
    pub fn finish(mut self) -> usize {
        self.mark();
        if self.chunks.len() > 1 {
            self.encoder.reorder(self.base, &self.chunks);
        }
        self.last - self.base
    }

    fn put_enum<E: Enum>(&mut self, value: E) {
        self.encoder.put_varint(value.to_i32() as u64);
    }

    /// Writes a nested message and returns its length.
    fn put_message<M: Message>(&mut self, value: &M) -> Result<usize, EncodeError> {
        let mut nested = self.nested();
        value.traverse(&mut nested)?;
        Ok(nested.finish())
    }

    fn put_map_entry(
        &mut self,
        field_number: u32,
        write: impl FnOnce(&mut BinaryReverseEncodingVisitor<'_>) -> Result<(), EncodeError>,
    ) -> Result<(), EncodeError> {
        let mut entry = self.nested();
        write(&mut entry)?;
        let len = entry.finish();
        self.encoder.put_varint(len as u64);
        self.encoder.put_tag(field_number, WireType::LengthDelimited);
        Ok(())
    }
}

impl Visitor for BinaryReverseEncodingVisitor<'_> {
    type Error = EncodeError;

    fn visit_unknown(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.encoder.put_slice(bytes);
        self.mark();
        Ok(())
    }

    reverse_scalars! {
        visit_singular_float_field, visit_repeated_float_field, visit_packed_float_field, f32,
            WireType::ThirtyTwoBit, |encoder, value| encoder.put_slice(&value.to_le_bytes());
        visit_singular_double_field, visit_repeated_double_field, visit_packed_double_field, f64,
            WireType::SixtyFourBit, |encoder, value| encoder.put_slice(&value.to_le_bytes());
        visit_singular_int32_field, visit_repeated_int32_field, visit_packed_int32_field, i32,
            WireType::Varint, |encoder, value| encoder.put_varint(value as u64);
        visit_singular_int64_field, visit_repeated_int64_field, visit_packed_int64_field, i64,
            WireType::Varint, |encoder, value| encoder.put_varint(value as u64);
        visit_singular_uint32_field, visit_repeated_uint32_field, visit_packed_uint32_field, u32,
            WireType::Varint, |encoder, value| encoder.put_varint(u64::from(value));
        visit_singular_uint64_field, visit_repeated_uint64_field, visit_packed_uint64_field, u64,
            WireType::Varint, |encoder, value| encoder.put_varint(value);
        visit_singular_sint32_field, visit_repeated_sint32_field, visit_packed_sint32_field, i32,
            WireType::Varint, |encoder, value| encoder.put_varint(u64::from(encode_zigzag32(value)));
        visit_singular_sint64_field, visit_repeated_sint64_field, visit_packed_sint64_field, i64,
            WireType::Varint, |encoder, value| encoder.put_varint(encode_zigzag64(value));
        visit_singular_fixed32_field, visit_repeated_fixed32_field, visit_packed_fixed32_field, u32,
            WireType::ThirtyTwoBit, |encoder, value| encoder.put_slice(&value.to_le_bytes());
        visit_singular_fixed64_field, visit_repeated_fixed64_field, visit_packed_fixed64_field, u64,
            WireType::SixtyFourBit, |encoder, value| encoder.put_slice(&value.to_le_bytes());
        visit_singular_sfixed32_field, visit_repeated_sfixed32_field, visit_packed_sfixed32_field, i32,
            WireType::ThirtyTwoBit, |encoder, value| encoder.put_slice(&value.to_le_bytes());
        visit_singular_sfixed64_field, visit_repeated_sfixed64_field, visit_packed_sfixed64_field, i64,
            WireType::SixtyFourBit, |encoder, value| encoder.put_slice(&value.to_le_bytes());
        visit_singular_bool_field, visit_repeated_bool_field, visit_packed_bool_field, bool,
            WireType::Varint, |encoder, value| encoder.put_varint(u64::from(value));
    }

    fn visit_singular_string_field(&mut self, value: &str, field_number: u32) -> Result<(), EncodeError> {
        self.visit_singular_bytes_field(value.as_bytes(), field_number)
    }

    fn visit_repeated_string_field(&mut self, values: &[String], field_number: u32) -> Result<(), EncodeError> {
        for value in values.iter().rev() {
            self.encoder.put_slice(value.as_bytes());
            self.encoder.put_varint(value.len() as u64);
            self.encoder.put_tag(field_number, WireType::LengthDelimited);
        }
        self.mark();
        Ok(())
    }

    fn visit_singular_bytes_field(&mut self, value: &[u8], field_number: u32) -> Result<(), EncodeError> {
        self.encoder.put_slice(value);
        self.encoder.put_varint(value.len() as u64);
        self.encoder.put_tag(field_number, WireType::LengthDelimited);
        self.mark();
        Ok(())
    }

    fn visit_repeated_bytes_field(&mut self, values: &[Vec<u8>], field_number: u32) -> Result<(), EncodeError> {
        for value in values.iter().rev() {
            self.encoder.put_slice(value);
            self.encoder.put_varint(value.len() as u64);
            self.encoder.put_tag(field_number, WireType::LengthDelimited);
        }
        self.mark();
        Ok(())
    }

    fn visit_singular_enum_field<E: Enum>(&mut self, value: E, field_number: u32) -> Result<(), EncodeError> {
        self.put_enum(value);
        self.encoder.put_tag(field_number, WireType::Varint);
        self.mark();
        Ok(())
    }

    fn visit_repeated_enum_field<E: Enum>(&mut self, values: &[E], field_number: u32) -> Result<(), EncodeError> {
        for value in values.iter().rev() {
            self.put_enum(*value);
            self.encoder.put_tag(field_number, WireType::Varint);
        }
        self.mark();
        Ok(())
    }

    fn visit_packed_enum_field<E: Enum>(&mut self, values: &[E], field_number: u32) -> Result<(), EncodeError> {
        if values.is_empty() {
            return Ok(());
        }
        let start = self.encoder.len();
        for value in values.iter().rev() {
            self.put_enum(*value);
        }
        let len = self.encoder.len() - start;
        self.encoder.put_varint(len as u64);
        self.encoder.put_tag(field_number, WireType::LengthDelimited);
        self.mark();
        Ok(())
    }

    fn visit_singular_message_field<M: Message>(&mut self, value: &M, field_number: u32) -> Result<(), EncodeError> {
        let len = self.put_message(value)?;
        self.encoder.put_varint(len as u64);
        self.encoder.put_tag(field_number, WireType::LengthDelimited);
        self.mark();
        Ok(())
    }

    fn visit_repeated_message_field<M: Message>(&mut self, values: &[M], field_number: u32) -> Result<(), EncodeError> {
        for value in values.iter().rev() {
            let len = self.put_message(value)?;
            self.encoder.put_varint(len as u64);
            self.encoder.put_tag(field_number, WireType::LengthDelimited);
        }
        self.mark();
        Ok(())
    }

    fn visit_singular_group_field<M: Message>(&mut self, value: &M, field_number: u32) -> Result<(), EncodeError> {
        self.encoder.put_tag(field_number, WireType::EndGroup);
        self.put_message(value)?;
        self.encoder.put_tag(field_number, WireType::StartGroup);
        self.mark();
        Ok(())
    }

    fn visit_repeated_group_field<M: Message>(&mut self, values: &[M], field_number: u32) -> Result<(), EncodeError> {
        for value in values.iter().rev() {
            self.encoder.put_tag(field_number, WireType::EndGroup);
            self.put_message(value)?;
            self.encoder.put_tag(field_number, WireType::StartGroup);
        }
        self.mark();
        Ok(())
    }

    fn visit_map_field<K: MapKeyType, V: FieldType>(
        &mut self,
        value: &HashMap<K::Value, V::Value>,
        field_number: u32,
    ) -> Result<(), EncodeError> {
        let entries = map_entries(value, self.options.use_deterministic_ordering);
        for (key, value) in entries.into_iter().rev() {
            self.put_map_entry(field_number, |entry| {
                K::visit_singular(key, 1, entry)?;
                V::visit_singular(value, 2, entry)
            })?;
        }
        self.mark();
        Ok(())
    }

    fn visit_map_field_with_enum_values<K: MapKeyType, E: Enum>(
        &mut self,
        value: &HashMap<K::Value, E>,
        field_number: u32,
    ) -> Result<(), EncodeError> {
        let entries = map_entries(value, self.options.use_deterministic_ordering);
        for (key, value) in entries.into_iter().rev() {
            self.put_map_entry(field_number, |entry| {
                K::visit_singular(key, 1, entry)?;
                entry.visit_singular_enum_field(*value, 2)
            })?;
        }
        self.mark();
        Ok(())
    }

    fn visit_map_field_with_message_values<K: MapKeyType, M: Message>(
        &mut self,
        value: &HashMap<K::Value, M>,
        field_number: u32,
    ) -> Result<(), EncodeError> {
        let entries = map_entries(value, self.options.use_deterministic_ordering);
        for (key, value) in entries.into_iter().rev() {
            self.put_map_entry(field_number, |entry| {
                K::visit_singular(key, 1, entry)?;
                entry.visit_singular_message_field(value, 2)
            })?;
        }
        self.mark();
        Ok(())
    }

    fn visit_extension_fields(&mut self, fields: &ExtensionSet, start: u32, end: u32) -> Result<(), EncodeError> {
        for field in fields.range(start, end) {
            field.visit_binary_reverse(self)?;
        }
        Ok(())
    }
}
