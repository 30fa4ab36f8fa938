//! Content hashing for messages.
//!
//! Hashes agree with `PartialEq`: maps are hashed per entry and the entry hashes summed, so
//! iteration order does not matter, and `-0.0` hashes like `0.0`.

use std::collections::HashMap;
use std::hash::Hasher;

use crate::extensions::ExtensionSet;
use crate::field_types::{FieldType, MapKeyType};
use crate::{EncodeError, Enum, Message, Visitor};

const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const PRIME: u64 = 0x0000_0100_0000_01b3;

/// A 64-bit FNV-1a accumulator fed by message traversal.
#[derive(Clone, Debug)]
pub struct HashVisitor {
    hash: u64,
}

impl Default for HashVisitor {
    fn default() -> HashVisitor {
        HashVisitor { hash: OFFSET_BASIS }
    }
}

impl HashVisitor {
    pub fn new() -> HashVisitor {
        HashVisitor::default()
    }

    pub fn finish(&self) -> u64 {
        self.hash
    }

    fn mix(&mut self, value: u64) {
        self.hash = (self.hash ^ value).wrapping_mul(PRIME);
    }

    fn mix_bytes(&mut self, bytes: &[u8]) {
        self.mix(bytes.len() as u64);
        for &byte in bytes {
            self.mix(u64::from(byte));
        }
    }

    fn mix_message<M: Message>(&mut self, value: &M) -> Result<(), EncodeError> {
        let mut nested = HashVisitor::new();
        value.traverse(&mut nested)?;
        self.mix(nested.finish());
        Ok(())
    }

    /// Mixes in the wrapping sum of independently hashed entries.
    fn mix_entries<'m, K: 'm, V: 'm>(
        &mut self,
        field_number: u32,
        entries: impl Iterator<Item = (&'m K, &'m V)>,
        mut hash_entry: impl FnMut(&mut HashVisitor, &K, &V) -> Result<(), EncodeError>,
    ) -> Result<(), EncodeError> {
        self.mix(u64::from(field_number));
        let mut sum = 0u64;
        for (key, value) in entries {
            let mut entry = HashVisitor::new();
            hash_entry(&mut entry, key, value)?;
            sum = sum.wrapping_add(entry.finish());
        }
        self.mix(sum);
        Ok(())
    }
}

impl Visitor for HashVisitor {
    type Error = EncodeError;

    fn visit_unknown(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.mix_bytes(bytes);
        Ok(())
    }

    fn visit_singular_double_field(&mut self, value: f64, field_number: u32) -> Result<(), EncodeError> {
        self.mix(u64::from(field_number));
        self.mix(if value == 0.0 { 0 } else { value.to_bits() });
        Ok(())
    }

    fn visit_singular_int64_field(&mut self, value: i64, field_number: u32) -> Result<(), EncodeError> {
        self.mix(u64::from(field_number));
        self.mix(value as u64);
        Ok(())
    }

    fn visit_singular_uint64_field(&mut self, value: u64, field_number: u32) -> Result<(), EncodeError> {
        self.mix(u64::from(field_number));
        self.mix(value);
        Ok(())
    }

    fn visit_singular_bool_field(&mut self, value: bool, field_number: u32) -> Result<(), EncodeError> {
        self.mix(u64::from(field_number));
        self.mix(u64::from(value));
        Ok(())
    }

    fn visit_singular_string_field(&mut self, value: &str, field_number: u32) -> Result<(), EncodeError> {
        self.mix(u64::from(field_number));
        self.mix_bytes(value.as_bytes());
        Ok(())
    }

    fn visit_singular_bytes_field(&mut self, value: &[u8], field_number: u32) -> Result<(), EncodeError> {
        self.mix(u64::from(field_number));
        self.mix_bytes(value);
        Ok(())
    }

    fn visit_singular_enum_field<E: Enum>(&mut self, value: E, field_number: u32) -> Result<(), EncodeError> {
        self.mix(u64::from(field_number));
        self.mix(i64::from(value.to_i32()) as u64);
        Ok(())
    }

    fn visit_singular_message_field<M: Message>(&mut self, value: &M, field_number: u32) -> Result<(), EncodeError> {
        self.mix(u64::from(field_number));
        self.mix_message(value)
    }

    fn visit_singular_group_field<M: Message>(&mut self, value: &M, field_number: u32) -> Result<(), EncodeError> {
        self.mix(u64::from(field_number));
        self.mix_message(value)
    }

    fn visit_map_field<K: MapKeyType, V: FieldType>(
        &mut self,
        value: &HashMap<K::Value, V::Value>,
        field_number: u32,
    ) -> Result<(), EncodeError> {
        self.mix_entries(field_number, value.iter(), |entry, key, value| {
            K::visit_singular(key, 1, entry)?;
            V::visit_singular(value, 2, entry)
        })
    }

    fn visit_map_field_with_enum_values<K: MapKeyType, E: Enum>(
        &mut self,
        value: &HashMap<K::Value, E>,
        field_number: u32,
    ) -> Result<(), EncodeError> {
        self.mix_entries(field_number, value.iter(), |entry, key, value| {
            K::visit_singular(key, 1, entry)?;
            entry.visit_singular_enum_field(*value, 2)
        })
    }

    fn visit_map_field_with_message_values<K: MapKeyType, M: Message>(
        &mut self,
        value: &HashMap<K::Value, M>,
        field_number: u32,
    ) -> Result<(), EncodeError> {
        self.mix_entries(field_number, value.iter(), |entry, key, value| {
            K::visit_singular(key, 1, entry)?;
            entry.visit_singular_message_field(value, 2)
        })
    }

    fn visit_extension_fields(&mut self, fields: &ExtensionSet, start: u32, end: u32) -> Result<(), EncodeError> {
        for field in fields.range(start, end) {
            field.visit_hash(self)?;
        }
        Ok(())
    }
}

/// Hashes the contents of `message`.
///
/// An `Any` holding JSON that no registered type can transcode contributes nothing beyond the
/// fields visited before it.
pub fn hash_value<M: Message>(message: &M) -> u64 {
    let mut visitor = HashVisitor::new();
    if let Err(error) = message.traverse(&mut visitor) {
        log::debug!("hashing {} stopped early: {error}", M::NAME);
    }
    visitor.finish()
}

/// Feeds the message hash to a standard [`Hasher`], for use in `Hash` impls.
pub fn hash_message<M: Message, H: Hasher>(message: &M, state: &mut H) {
    state.write_u64(hash_value(message));
}
