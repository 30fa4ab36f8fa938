use std::collections::HashMap;

use bytes::BufMut;

use crate::binary::{encoded_len, BinaryEncodingOptions};
use crate::encoding::{self, encode_key, encode_varint, encoded_len_varint, key_len, WireType};
use crate::extensions::ExtensionSet;
use crate::field_types::{FieldType, MapKeyType};
use crate::visitor::map_entries;
use crate::{EncodeError, Enum, Message, Visitor};

macro_rules! size_scalars {
    ($($singular:ident, $repeated:ident, $packed:ident, $module:ident, $ty:ty;)*) => {
        $(
            fn $singular(&mut self, value: $ty, field_number: u32) -> Result<(), EncodeError> {
                self.len += encoding::$module::encoded_len(field_number, &value);
                Ok(())
            }

            fn $repeated(&mut self, values: &[$ty], field_number: u32) -> Result<(), EncodeError> {
                self.len += encoding::$module::encoded_len_repeated(field_number, values);
                Ok(())
            }

            fn $packed(&mut self, values: &[$ty], field_number: u32) -> Result<(), EncodeError> {
                self.len += encoding::$module::encoded_len_packed(field_number, values);
                Ok(())
            }
        )*
    };
}

macro_rules! encode_scalars {
    ($($singular:ident, $repeated:ident, $packed:ident, $module:ident, $ty:ty;)*) => {
        $(
            fn $singular(&mut self, value: $ty, field_number: u32) -> Result<(), EncodeError> {
                encoding::$module::encode(field_number, &value, &mut self.buf);
                Ok(())
            }

            fn $repeated(&mut self, values: &[$ty], field_number: u32) -> Result<(), EncodeError> {
                encoding::$module::encode_repeated(field_number, values, &mut self.buf);
                Ok(())
            }

            fn $packed(&mut self, values: &[$ty], field_number: u32) -> Result<(), EncodeError> {
                encoding::$module::encode_packed(field_number, values, &mut self.buf);
                Ok(())
            }
        )*
    };
}

/// Length of the payload of a packed enum field.
fn packed_enum_len<E: Enum>(values: &[E]) -> usize {
    values
        .iter()
        .map(|value| encoding::int32::encoded_len_value(&value.to_i32()))
        .sum()
}

/// Computes the exact binary length of a message.
#[derive(Debug, Default)]
pub struct SizeVisitor {
    len: usize,
}

impl SizeVisitor {
    pub fn new() -> SizeVisitor {
        SizeVisitor::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn add_delimited(&mut self, field_number: u32, len: usize) {
        self.len += key_len(field_number) + encoded_len_varint(len as u64) + len;
    }
}

impl Visitor for SizeVisitor {
    type Error = EncodeError;

    fn visit_unknown(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.len += bytes.len();
        Ok(())
    }

    size_scalars! {
        visit_singular_float_field, visit_repeated_float_field, visit_packed_float_field, float, f32;
        visit_singular_double_field, visit_repeated_double_field, visit_packed_double_field, double, f64;
        visit_singular_int32_field, visit_repeated_int32_field, visit_packed_int32_field, int32, i32;
        visit_singular_int64_field, visit_repeated_int64_field, visit_packed_int64_field, int64, i64;
        visit_singular_uint32_field, visit_repeated_uint32_field, visit_packed_uint32_field, uint32, u32;
        visit_singular_uint64_field, visit_repeated_uint64_field, visit_packed_uint64_field, uint64, u64;
        visit_singular_sint32_field, visit_repeated_sint32_field, visit_packed_sint32_field, sint32, i32;
        visit_singular_sint64_field, visit_repeated_sint64_field, visit_packed_sint64_field, sint64, i64;
        visit_singular_fixed32_field, visit_repeated_fixed32_field, visit_packed_fixed32_field, fixed32, u32;
        visit_singular_fixed64_field, visit_repeated_fixed64_field, visit_packed_fixed64_field, fixed64, u64;
        visit_singular_sfixed32_field, visit_repeated_sfixed32_field, visit_packed_sfixed32_field, sfixed32, i32;
        visit_singular_sfixed64_field, visit_repeated_sfixed64_field, visit_packed_sfixed64_field, sfixed64, i64;
        visit_singular_bool_field, visit_repeated_bool_field, visit_packed_bool_field, bool, bool;
    }

    fn visit_singular_string_field(&mut self, value: &str, field_number: u32) -> Result<(), EncodeError> {
        self.len += encoding::string::encoded_len(field_number, value);
        Ok(())
    }

    fn visit_repeated_string_field(&mut self, values: &[String], field_number: u32) -> Result<(), EncodeError> {
        self.len += encoding::string::encoded_len_repeated(field_number, values);
        Ok(())
    }

    fn visit_singular_bytes_field(&mut self, value: &[u8], field_number: u32) -> Result<(), EncodeError> {
        self.len += encoding::bytes::encoded_len(field_number, value);
        Ok(())
    }

    fn visit_repeated_bytes_field(&mut self, values: &[Vec<u8>], field_number: u32) -> Result<(), EncodeError> {
        self.len += encoding::bytes::encoded_len_repeated(field_number, values);
        Ok(())
    }

    fn visit_singular_enum_field<E: Enum>(&mut self, value: E, field_number: u32) -> Result<(), EncodeError> {
        self.len += encoding::int32::encoded_len(field_number, &value.to_i32());
        Ok(())
    }

    fn visit_packed_enum_field<E: Enum>(&mut self, values: &[E], field_number: u32) -> Result<(), EncodeError> {
        if !values.is_empty() {
            self.add_delimited(field_number, packed_enum_len(values));
        }
        Ok(())
    }

    fn visit_singular_message_field<M: Message>(&mut self, value: &M, field_number: u32) -> Result<(), EncodeError> {
        let len = encoded_len(value)?;
        self.add_delimited(field_number, len);
        Ok(())
    }

    fn visit_singular_group_field<M: Message>(&mut self, value: &M, field_number: u32) -> Result<(), EncodeError> {
        self.len += 2 * key_len(field_number) + encoded_len(value)?;
        Ok(())
    }

    fn visit_map_field<K: MapKeyType, V: FieldType>(
        &mut self,
        value: &HashMap<K::Value, V::Value>,
        field_number: u32,
    ) -> Result<(), EncodeError> {
        for (key, value) in value {
            let mut entry = SizeVisitor::new();
            K::visit_singular(key, 1, &mut entry)?;
            V::visit_singular(value, 2, &mut entry)?;
            self.add_delimited(field_number, entry.len);
        }
        Ok(())
    }

    fn visit_map_field_with_enum_values<K: MapKeyType, E: Enum>(
        &mut self,
        value: &HashMap<K::Value, E>,
        field_number: u32,
    ) -> Result<(), EncodeError> {
        for (key, value) in value {
            let mut entry = SizeVisitor::new();
            K::visit_singular(key, 1, &mut entry)?;
            entry.visit_singular_enum_field(*value, 2)?;
            self.add_delimited(field_number, entry.len);
        }
        Ok(())
    }

    fn visit_map_field_with_message_values<K: MapKeyType, M: Message>(
        &mut self,
        value: &HashMap<K::Value, M>,
        field_number: u32,
    ) -> Result<(), EncodeError> {
        for (key, value) in value {
            let mut entry = SizeVisitor::new();
            K::visit_singular(key, 1, &mut entry)?;
            entry.visit_singular_message_field(value, 2)?;
            self.add_delimited(field_number, entry.len);
        }
        Ok(())
    }

    fn visit_extension_fields(&mut self, fields: &ExtensionSet, start: u32, end: u32) -> Result<(), EncodeError> {
        for field in fields.range(start, end) {
            field.visit_size(self)?;
        }
        Ok(())
    }
}

/// Writes the binary encoding of a message front to back.
///
/// The buffer must have room for the whole message; callers size it with [`SizeVisitor`]
/// first. Length prefixes of nested messages are computed on the way down.
#[derive(Debug)]
pub struct BinaryEncodingVisitor<B: BufMut> {
    buf: B,
    options: BinaryEncodingOptions,
}

impl<B: BufMut> BinaryEncodingVisitor<B> {
    pub fn new(buf: B, options: BinaryEncodingOptions) -> BinaryEncodingVisitor<B> {
        BinaryEncodingVisitor { buf, options }
    }

    pub fn into_inner(self) -> B {
        self.buf
    }

    fn put_entry_header(&mut self, field_number: u32, entry: &SizeVisitor) {
        encode_key(field_number, WireType::LengthDelimited, &mut self.buf);
        encode_varint(entry.len() as u64, &mut self.buf);
    }
}

impl<B: BufMut> Visitor for BinaryEncodingVisitor<B> {
    type Error = EncodeError;

    fn visit_unknown(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.buf.put_slice(bytes);
        Ok(())
    }

    encode_scalars! {
        visit_singular_float_field, visit_repeated_float_field, visit_packed_float_field, float, f32;
        visit_singular_double_field, visit_repeated_double_field, visit_packed_double_field, double, f64;
        visit_singular_int32_field, visit_repeated_int32_field, visit_packed_int32_field, int32, i32;
        visit_singular_int64_field, visit_repeated_int64_field, visit_packed_int64_field, int64, i64;
        visit_singular_uint32_field, visit_repeated_uint32_field, visit_packed_uint32_field, uint32, u32;
        visit_singular_uint64_field, visit_repeated_uint64_field, visit_packed_uint64_field, uint64, u64;
        visit_singular_sint32_field, visit_repeated_sint32_field, visit_packed_sint32_field, sint32, i32;
        visit_singular_sint64_field, visit_repeated_sint64_field, visit_packed_sint64_field, sint64, i64;
        visit_singular_fixed32_field, visit_repeated_fixed32_field, visit_packed_fixed32_field, fixed32, u32;
        visit_singular_fixed64_field, visit_repeated_fixed64_field, visit_packed_fixed64_field, fixed64, u64;
        visit_singular_sfixed32_field, visit_repeated_sfixed32_field, visit_packed_sfixed32_field, sfixed32, i32;
        visit_singular_sfixed64_field, visit_repeated_sfixed64_field, visit_packed_sfixed64_field, sfixed64, i64;
        visit_singular_bool_field, visit_repeated_bool_field, visit_packed_bool_field, bool, bool;
    }

    fn visit_singular_string_field(&mut self, value: &str, field_number: u32) -> Result<(), EncodeError> {
        encoding::string::encode(field_number, value, &mut self.buf);
        Ok(())
    }

    fn visit_singular_bytes_field(&mut self, value: &[u8], field_number: u32) -> Result<(), EncodeError> {
        encoding::bytes::encode(field_number, value, &mut self.buf);
        Ok(())
    }

    fn visit_singular_enum_field<E: Enum>(&mut self, value: E, field_number: u32) -> Result<(), EncodeError> {
        encoding::int32::encode(field_number, &value.to_i32(), &mut self.buf);
        Ok(())
    }

    fn visit_packed_enum_field<E: Enum>(&mut self, values: &[E], field_number: u32) -> Result<(), EncodeError> {
        if values.is_empty() {
            return Ok(());
        }
        encode_key(field_number, WireType::LengthDelimited, &mut self.buf);
        encode_varint(packed_enum_len(values) as u64, &mut self.buf);
        for value in values {
            encoding::int32::encode_value(&value.to_i32(), &mut self.buf);
        }
        Ok(())
    }

    fn visit_singular_message_field<M: Message>(&mut self, value: &M, field_number: u32) -> Result<(), EncodeError> {
        encode_key(field_number, WireType::LengthDelimited, &mut self.buf);
        encode_varint(encoded_len(value)? as u64, &mut self.buf);
        value.traverse(self)
    }

    fn visit_singular_group_field<M: Message>(&mut self, value: &M, field_number: u32) -> Result<(), EncodeError> {
        encode_key(field_number, WireType::StartGroup, &mut self.buf);
        value.traverse(self)?;
        encode_key(field_number, WireType::EndGroup, &mut self.buf);
        Ok(())
    }

    fn visit_map_field<K: MapKeyType, V: FieldType>(
        &mut self,
        value: &HashMap<K::Value, V::Value>,
        field_number: u32,
    ) -> Result<(), EncodeError> {
        for (key, value) in map_entries(value, self.options.use_deterministic_ordering) {
            let mut entry = SizeVisitor::new();
            K::visit_singular(key, 1, &mut entry)?;
            V::visit_singular(value, 2, &mut entry)?;
            self.put_entry_header(field_number, &entry);
            K::visit_singular(key, 1, self)?;
            V::visit_singular(value, 2, self)?;
        }
        Ok(())
    }

    fn visit_map_field_with_enum_values<K: MapKeyType, E: Enum>(
        &mut self,
        value: &HashMap<K::Value, E>,
        field_number: u32,
    ) -> Result<(), EncodeError> {
        for (key, value) in map_entries(value, self.options.use_deterministic_ordering) {
            let mut entry = SizeVisitor::new();
            K::visit_singular(key, 1, &mut entry)?;
            entry.visit_singular_enum_field(*value, 2)?;
            self.put_entry_header(field_number, &entry);
            K::visit_singular(key, 1, self)?;
            self.visit_singular_enum_field(*value, 2)?;
        }
        Ok(())
    }

    fn visit_map_field_with_message_values<K: MapKeyType, M: Message>(
        &mut self,
        value: &HashMap<K::Value, M>,
        field_number: u32,
    ) -> Result<(), EncodeError> {
        for (key, value) in map_entries(value, self.options.use_deterministic_ordering) {
            let mut entry = SizeVisitor::new();
            K::visit_singular(key, 1, &mut entry)?;
            entry.visit_singular_message_field(value, 2)?;
            self.put_entry_header(field_number, &entry);
            K::visit_singular(key, 1, self)?;
            self.visit_singular_message_field(value, 2)?;
        }
        Ok(())
    }

    fn visit_extension_fields(&mut self, fields: &ExtensionSet, start: u32, end: u32) -> Result<(), EncodeError> {
        let mut visitor = BinaryEncodingVisitor::<&mut dyn BufMut> {
            buf: &mut self.buf,
            options: self.options,
        };
        for field in fields.range(start, end) {
            field.visit_binary(&mut visitor)?;
        }
        Ok(())
    }
}
