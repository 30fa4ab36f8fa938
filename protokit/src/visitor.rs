//! The traversal protocol shared by every output format.
//!
//! A message's `traverse` method calls one `visit_*` method per present field, in field-number
//! order. Binary, JSON and text encoding, hashing and size computation are all `Visitor`
//! implementations, so per-field dispatch is written once in generated code.

use std::collections::HashMap;

use crate::extensions::ExtensionSet;
use crate::field_types::{FieldType, MapKeyType};
use crate::{EncodeError, Enum, Message};

macro_rules! repeated_defaults {
    ($($repeated:ident, $singular:ident, $ty:ty;)*) => {
        $(
            fn $repeated(&mut self, values: &[$ty], field_number: u32) -> Result<(), Self::Error> {
                for value in values {
                    self.$singular(*value, field_number)?;
                }
                Ok(())
            }
        )*
    };
}

macro_rules! packed_defaults {
    ($($packed:ident, $repeated:ident, $ty:ty;)*) => {
        $(
            fn $packed(&mut self, values: &[$ty], field_number: u32) -> Result<(), Self::Error> {
                self.$repeated(values, field_number)
            }
        )*
    };
}

/// Receives the fields of a message during traversal.
///
/// Only the widest form of each value category is required; narrower forms default to them.
/// Repeated fields default to visiting each element as a singular field, and packed fields
/// default to the repeated form.
pub trait Visitor {
    /// Every visitor error can carry an encoding failure, since traversing an `Any` may need to
    /// serialize its payload.
    type Error: From<EncodeError>;

    /// Raw bytes of fields the schema did not know about, visited after the known fields.
    fn visit_unknown(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    fn visit_singular_float_field(&mut self, value: f32, field_number: u32) -> Result<(), Self::Error> {
        self.visit_singular_double_field(f64::from(value), field_number)
    }

    fn visit_singular_double_field(&mut self, value: f64, field_number: u32) -> Result<(), Self::Error>;

    fn visit_singular_int32_field(&mut self, value: i32, field_number: u32) -> Result<(), Self::Error> {
        self.visit_singular_int64_field(i64::from(value), field_number)
    }

    fn visit_singular_int64_field(&mut self, value: i64, field_number: u32) -> Result<(), Self::Error>;

    fn visit_singular_uint32_field(&mut self, value: u32, field_number: u32) -> Result<(), Self::Error> {
        self.visit_singular_uint64_field(u64::from(value), field_number)
    }

    fn visit_singular_uint64_field(&mut self, value: u64, field_number: u32) -> Result<(), Self::Error>;

    fn visit_singular_sint32_field(&mut self, value: i32, field_number: u32) -> Result<(), Self::Error> {
        self.visit_singular_int32_field(value, field_number)
    }

    fn visit_singular_sint64_field(&mut self, value: i64, field_number: u32) -> Result<(), Self::Error> {
        self.visit_singular_int64_field(value, field_number)
    }

    fn visit_singular_fixed32_field(&mut self, value: u32, field_number: u32) -> Result<(), Self::Error> {
        self.visit_singular_uint32_field(value, field_number)
    }

    fn visit_singular_fixed64_field(&mut self, value: u64, field_number: u32) -> Result<(), Self::Error> {
        self.visit_singular_uint64_field(value, field_number)
    }

    fn visit_singular_sfixed32_field(&mut self, value: i32, field_number: u32) -> Result<(), Self::Error> {
        self.visit_singular_int32_field(value, field_number)
    }

    fn visit_singular_sfixed64_field(&mut self, value: i64, field_number: u32) -> Result<(), Self::Error> {
        self.visit_singular_int64_field(value, field_number)
    }

    fn visit_singular_bool_field(&mut self, value: bool, field_number: u32) -> Result<(), Self::Error>;

    fn visit_singular_string_field(&mut self, value: &str, field_number: u32) -> Result<(), Self::Error>;

    fn visit_singular_bytes_field(&mut self, value: &[u8], field_number: u32) -> Result<(), Self::Error>;

    fn visit_singular_enum_field<E: Enum>(&mut self, value: E, field_number: u32) -> Result<(), Self::Error>;

    fn visit_singular_message_field<M: Message>(&mut self, value: &M, field_number: u32) -> Result<(), Self::Error>;

    fn visit_singular_group_field<M: Message>(&mut self, value: &M, field_number: u32) -> Result<(), Self::Error>;

    repeated_defaults! {
        visit_repeated_float_field, visit_singular_float_field, f32;
        visit_repeated_double_field, visit_singular_double_field, f64;
        visit_repeated_int32_field, visit_singular_int32_field, i32;
        visit_repeated_int64_field, visit_singular_int64_field, i64;
        visit_repeated_uint32_field, visit_singular_uint32_field, u32;
        visit_repeated_uint64_field, visit_singular_uint64_field, u64;
        visit_repeated_sint32_field, visit_singular_sint32_field, i32;
        visit_repeated_sint64_field, visit_singular_sint64_field, i64;
        visit_repeated_fixed32_field, visit_singular_fixed32_field, u32;
        visit_repeated_fixed64_field, visit_singular_fixed64_field, u64;
        visit_repeated_sfixed32_field, visit_singular_sfixed32_field, i32;
        visit_repeated_sfixed64_field, visit_singular_sfixed64_field, i64;
        visit_repeated_bool_field, visit_singular_bool_field, bool;
    }

    fn visit_repeated_string_field(&mut self, values: &[String], field_number: u32) -> Result<(), Self::Error> {
        for value in values {
            self.visit_singular_string_field(value, field_number)?;
        }
        Ok(())
    }

    fn visit_repeated_bytes_field(&mut self, values: &[Vec<u8>], field_number: u32) -> Result<(), Self::Error> {
        for value in values {
            self.visit_singular_bytes_field(value, field_number)?;
        }
        Ok(())
    }

    fn visit_repeated_enum_field<E: Enum>(&mut self, values: &[E], field_number: u32) -> Result<(), Self::Error> {
        for value in values {
            self.visit_singular_enum_field(*value, field_number)?;
        }
        Ok(())
    }

    fn visit_repeated_message_field<M: Message>(&mut self, values: &[M], field_number: u32) -> Result<(), Self::Error> {
        for value in values {
            self.visit_singular_message_field(value, field_number)?;
        }
        Ok(())
    }

    fn visit_repeated_group_field<M: Message>(&mut self, values: &[M], field_number: u32) -> Result<(), Self::Error> {
        for value in values {
            self.visit_singular_group_field(value, field_number)?;
        }
        Ok(())
    }

    packed_defaults! {
        visit_packed_float_field, visit_repeated_float_field, f32;
        visit_packed_double_field, visit_repeated_double_field, f64;
        visit_packed_int32_field, visit_repeated_int32_field, i32;
        visit_packed_int64_field, visit_repeated_int64_field, i64;
        visit_packed_uint32_field, visit_repeated_uint32_field, u32;
        visit_packed_uint64_field, visit_repeated_uint64_field, u64;
        visit_packed_sint32_field, visit_repeated_sint32_field, i32;
        visit_packed_sint64_field, visit_repeated_sint64_field, i64;
        visit_packed_fixed32_field, visit_repeated_fixed32_field, u32;
        visit_packed_fixed64_field, visit_repeated_fixed64_field, u64;
        visit_packed_sfixed32_field, visit_repeated_sfixed32_field, i32;
        visit_packed_sfixed64_field, visit_repeated_sfixed64_field, i64;
        visit_packed_bool_field, visit_repeated_bool_field, bool;
    }

    fn visit_packed_enum_field<E: Enum>(&mut self, values: &[E], field_number: u32) -> Result<(), Self::Error> {
        self.visit_repeated_enum_field(values, field_number)
    }

    fn visit_map_field<K: MapKeyType, V: FieldType>(
        &mut self,
        value: &HashMap<K::Value, V::Value>,
        field_number: u32,
    ) -> Result<(), Self::Error>;

    fn visit_map_field_with_enum_values<K: MapKeyType, E: Enum>(
        &mut self,
        value: &HashMap<K::Value, E>,
        field_number: u32,
    ) -> Result<(), Self::Error>;

    fn visit_map_field_with_message_values<K: MapKeyType, M: Message>(
        &mut self,
        value: &HashMap<K::Value, M>,
        field_number: u32,
    ) -> Result<(), Self::Error>;

    /// Visits the extension fields numbered in `start..end`.
    ///
    /// Extension values are type-erased, so only visitors the library knows how to hand them to
    /// see them; the default ignores them.
    fn visit_extension_fields(
        &mut self,
        fields: &ExtensionSet,
        start: u32,
        end: u32,
    ) -> Result<(), Self::Error> {
        let _ = (fields, start, end);
        Ok(())
    }
}

/// Sorts map entries by key when deterministic output was requested.
pub(crate) fn map_entries<K: Ord, V>(map: &HashMap<K, V>, sorted: bool) -> Vec<(&K, &V)> {
    let mut entries: Vec<(&K, &V)> = map.iter().collect();
    if sorted {
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
    }
    entries
}
