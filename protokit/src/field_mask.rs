//! Copying and clearing fields by `google.protobuf.FieldMask` path.
//!
//! A path is a dot separated list of proto field names, such as `child.name`. Every component
//! but the last must name a singular message field.
//!
//! Selection runs a [`PathVisitor`] over the source message, which re-encodes the addressed
//! field in the binary format relative to its parent. Replacement drives `decode_message` on the
//! target with a [`PathDecoder`] that clears the addressed field (creating parent messages on the
//! way down) and then merges the selected bytes into the parent.

use std::collections::HashMap;

use crate::binary::{self, BinaryDecodingOptions, BinaryEncodingOptions, BinaryEncodingVisitor};
use crate::extensions::ExtensionSet;
use crate::field_types::{FieldType, MapKeyType};
use crate::{DecodeError, Decoder, EncodeError, Enum, Message, Visitor};

/// Why a field mask could not be applied.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum FieldMaskError {
    /// A component does not name a field, or a non-message field is followed by more
    /// components.
    #[error("field mask path {0:?} does not name a field")]
    PathNotFound(String),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// How overriding treats repeated and map fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Replace repeated fields and maps instead of appending to them (merging, for maps).
    pub replace_repeated_fields: bool,
}

impl MergeOptions {
    pub fn with_replace_repeated_fields(mut self, replace: bool) -> MergeOptions {
        self.replace_repeated_fields = replace;
        self
    }
}

/// Clears every field named by `paths`.
///
/// Paths are applied to a copy, so `message` is unchanged when one of them is invalid.
pub fn mask<M: Message, P: AsRef<str>>(message: &mut M, paths: &[P]) -> Result<(), FieldMaskError> {
    let options = MergeOptions::default().with_replace_repeated_fields(true);
    let mut copy = message.clone();
    for path in paths {
        clear_path(&mut copy, path.as_ref(), &options)?;
    }
    *message = copy;
    Ok(())
}

/// Copies every field named by `paths` from `source` into `message`.
///
/// Fields unset in `source` are cleared in `message`. Paths are applied in order to a copy, so
/// `message` is unchanged when one of them is invalid.
pub fn override_with<M: Message, P: AsRef<str>>(
    message: &mut M,
    source: &M,
    paths: &[P],
    options: &MergeOptions,
) -> Result<(), FieldMaskError> {
    let mut copy = message.clone();
    for path in paths {
        copy_path(&mut copy, source, path.as_ref(), options)?;
    }
    *message = copy;
    Ok(())
}

/// Copies the field at `path` from `source` into `target`.
pub fn copy_path<M: Message>(
    target: &mut M,
    source: &M,
    path: &str,
    options: &MergeOptions,
) -> Result<(), FieldMaskError> {
    let components: Vec<&str> = path.split('.').collect();
    let selected = select(source, &components, path)?;
    replace(target, &components, path, &selected, options)
}

/// Resets the field at `path` to its default, creating parent messages as needed.
pub fn clear_path<M: Message>(
    target: &mut M,
    path: &str,
    options: &MergeOptions,
) -> Result<(), FieldMaskError> {
    let components: Vec<&str> = path.split('.').collect();
    replace(target, &components, path, &[], options)
}

/// Whether every component of `path` names a field of `M` or of the message it descends into.
pub fn is_valid_path<M: Message>(path: &str) -> bool {
    let options = MergeOptions::default();
    clear_path(&mut M::default(), path, &options).is_ok()
}

/// Resolves an exact proto field name. JSON names are not accepted.
fn field_number<M: Message>(name: &str) -> Option<u32> {
    M::layout()
        .name_map()
        .number(name.as_bytes())
        .map(|number| number as u32)
}

fn not_found(path: &str) -> FieldMaskError {
    FieldMaskError::PathNotFound(path.to_owned())
}

/// The binary encoding of the field at `components`, relative to its parent message.
fn select<M: Message>(
    message: &M,
    components: &[&str],
    path: &str,
) -> Result<Vec<u8>, FieldMaskError> {
    let (first, rest) = components.split_first().ok_or_else(|| not_found(path))?;
    let number = field_number::<M>(first).ok_or_else(|| not_found(path))?;
    let mut visitor = PathVisitor {
        number,
        rest,
        path,
        buf: Vec::new(),
    };
    message.traverse(&mut visitor)?;
    Ok(visitor.buf)
}

fn replace<M: Message>(
    message: &mut M,
    components: &[&str],
    path: &str,
    selected: &[u8],
    options: &MergeOptions,
) -> Result<(), FieldMaskError> {
    let (first, rest) = components.split_first().ok_or_else(|| not_found(path))?;
    let number = field_number::<M>(first).ok_or_else(|| not_found(path))?;
    let mut decoder = PathDecoder {
        number: Some(number),
        rest,
        path,
        selected,
        options: *options,
    };
    message.decode_message(&mut decoder)?;
    if rest.is_empty() && !selected.is_empty() {
        binary::merge(message, selected, None, true, &BinaryDecodingOptions::default())?;
    }
    Ok(())
}

macro_rules! select_scalars {
    ($($singular:ident, $repeated:ident, $packed:ident, $ty:ty;)*) => {
        $(
            fn $singular(&mut self, value: $ty, field_number: u32) -> Result<(), FieldMaskError> {
                self.copy(field_number, |visitor| visitor.$singular(value, field_number))
            }

            fn $repeated(&mut self, values: &[$ty], field_number: u32) -> Result<(), FieldMaskError> {
                self.copy(field_number, |visitor| visitor.$repeated(values, field_number))
            }

            fn $packed(&mut self, values: &[$ty], field_number: u32) -> Result<(), FieldMaskError> {
                self.copy(field_number, |visitor| visitor.$packed(values, field_number))
            }
        )*
    };
}

/// Re-encodes the one field a path component selects.
struct PathVisitor<'a> {
    number: u32,
    rest: &'a [&'a str],
    path: &'a str,
    buf: Vec<u8>,
}

impl PathVisitor<'_> {
    fn copy<F>(&mut self, field_number: u32, encode: F) -> Result<(), FieldMaskError>
    where
        F: FnOnce(&mut BinaryEncodingVisitor<&mut Vec<u8>>) -> Result<(), EncodeError>,
    {
        if field_number != self.number {
            return Ok(());
        }
        if !self.rest.is_empty() {
            return Err(not_found(self.path));
        }
        let mut visitor = BinaryEncodingVisitor::new(&mut self.buf, BinaryEncodingOptions::default());
        encode(&mut visitor)?;
        Ok(())
    }

    fn descend<M: Message>(&mut self, value: &M, field_number: u32) -> Result<bool, FieldMaskError> {
        if field_number != self.number || self.rest.is_empty() {
            return Ok(false);
        }
        self.buf = select(value, self.rest, self.path)?;
        Ok(true)
    }
}

impl Visitor for PathVisitor<'_> {
    type Error = FieldMaskError;

    fn visit_unknown(&mut self, _bytes: &[u8]) -> Result<(), FieldMaskError> {
        Ok(())
    }

    select_scalars! {
        visit_singular_float_field, visit_repeated_float_field, visit_packed_float_field, f32;
        visit_singular_double_field, visit_repeated_double_field, visit_packed_double_field, f64;
        visit_singular_int32_field, visit_repeated_int32_field, visit_packed_int32_field, i32;
        visit_singular_int64_field, visit_repeated_int64_field, visit_packed_int64_field, i64;
        visit_singular_uint32_field, visit_repeated_uint32_field, visit_packed_uint32_field, u32;
        visit_singular_uint64_field, visit_repeated_uint64_field, visit_packed_uint64_field, u64;
        visit_singular_sint32_field, visit_repeated_sint32_field, visit_packed_sint32_field, i32;
        visit_singular_sint64_field, visit_repeated_sint64_field, visit_packed_sint64_field, i64;
        visit_singular_fixed32_field, visit_repeated_fixed32_field, visit_packed_fixed32_field, u32;
        visit_singular_fixed64_field, visit_repeated_fixed64_field, visit_packed_fixed64_field, u64;
        visit_singular_sfixed32_field, visit_repeated_sfixed32_field, visit_packed_sfixed32_field, i32;
        visit_singular_sfixed64_field, visit_repeated_sfixed64_field, visit_packed_sfixed64_field, i64;
        visit_singular_bool_field, visit_repeated_bool_field, visit_packed_bool_field, bool;
    }

    fn visit_singular_string_field(&mut self, value: &str, field_number: u32) -> Result<(), FieldMaskError> {
        self.copy(field_number, |visitor| visitor.visit_singular_string_field(value, field_number))
    }

    fn visit_repeated_string_field(&mut self, values: &[String], field_number: u32) -> Result<(), FieldMaskError> {
        self.copy(field_number, |visitor| visitor.visit_repeated_string_field(values, field_number))
    }

    fn visit_singular_bytes_field(&mut self, value: &[u8], field_number: u32) -> Result<(), FieldMaskError> {
        self.copy(field_number, |visitor| visitor.visit_singular_bytes_field(value, field_number))
    }

    fn visit_repeated_bytes_field(&mut self, values: &[Vec<u8>], field_number: u32) -> Result<(), FieldMaskError> {
        self.copy(field_number, |visitor| visitor.visit_repeated_bytes_field(values, field_number))
    }

    fn visit_singular_enum_field<E: Enum>(&mut self, value: E, field_number: u32) -> Result<(), FieldMaskError> {
        self.copy(field_number, |visitor| visitor.visit_singular_enum_field(value, field_number))
    }

    fn visit_repeated_enum_field<E: Enum>(&mut self, values: &[E], field_number: u32) -> Result<(), FieldMaskError> {
        self.copy(field_number, |visitor| visitor.visit_repeated_enum_field(values, field_number))
    }

    fn visit_packed_enum_field<E: Enum>(&mut self, values: &[E], field_number: u32) -> Result<(), FieldMaskError> {
        self.copy(field_number, |visitor| visitor.visit_packed_enum_field(values, field_number))
    }

    fn visit_singular_message_field<M: Message>(&mut self, value: &M, field_number: u32) -> Result<(), FieldMaskError> {
        if self.descend(value, field_number)? {
            return Ok(());
        }
        self.copy(field_number, |visitor| visitor.visit_singular_message_field(value, field_number))
    }

    fn visit_singular_group_field<M: Message>(&mut self, value: &M, field_number: u32) -> Result<(), FieldMaskError> {
        if self.descend(value, field_number)? {
            return Ok(());
        }
        self.copy(field_number, |visitor| visitor.visit_singular_group_field(value, field_number))
    }

    fn visit_repeated_message_field<M: Message>(&mut self, values: &[M], field_number: u32) -> Result<(), FieldMaskError> {
        self.copy(field_number, |visitor| visitor.visit_repeated_message_field(values, field_number))
    }

    fn visit_repeated_group_field<M: Message>(&mut self, values: &[M], field_number: u32) -> Result<(), FieldMaskError> {
        self.copy(field_number, |visitor| visitor.visit_repeated_group_field(values, field_number))
    }

    fn visit_map_field<K: MapKeyType, V: FieldType>(
        &mut self,
        value: &HashMap<K::Value, V::Value>,
        field_number: u32,
    ) -> Result<(), FieldMaskError> {
        self.copy(field_number, |visitor| visitor.visit_map_field::<K, V>(value, field_number))
    }

    fn visit_map_field_with_enum_values<K: MapKeyType, E: Enum>(
        &mut self,
        value: &HashMap<K::Value, E>,
        field_number: u32,
    ) -> Result<(), FieldMaskError> {
        self.copy(field_number, |visitor| {
            visitor.visit_map_field_with_enum_values::<K, E>(value, field_number)
        })
    }

    fn visit_map_field_with_message_values<K: MapKeyType, M: Message>(
        &mut self,
        value: &HashMap<K::Value, M>,
        field_number: u32,
    ) -> Result<(), FieldMaskError> {
        self.copy(field_number, |visitor| {
            visitor.visit_map_field_with_message_values::<K, M>(value, field_number)
        })
    }
}

macro_rules! clear_scalars {
    ($($singular:ident, $optional:ident, $repeated:ident, $ty:ty;)*) => {
        $(
            fn $singular(&mut self, value: &mut $ty) -> Result<(), FieldMaskError> {
                self.leaf()?;
                *value = <$ty>::default();
                Ok(())
            }

            fn $optional(&mut self, value: &mut Option<$ty>) -> Result<(), FieldMaskError> {
                self.leaf()?;
                *value = None;
                Ok(())
            }

            fn $repeated(&mut self, values: &mut Vec<$ty>) -> Result<(), FieldMaskError> {
                self.clear_repeated(values)
            }
        )*
    };
}

/// Feeds a single field number to `decode_message`, then clears or descends into that field.
struct PathDecoder<'a> {
    number: Option<u32>,
    rest: &'a [&'a str],
    path: &'a str,
    selected: &'a [u8],
    options: MergeOptions,
}

impl PathDecoder<'_> {
    fn leaf(&self) -> Result<(), FieldMaskError> {
        if self.rest.is_empty() {
            Ok(())
        } else {
            Err(not_found(self.path))
        }
    }

    fn clear_repeated<T>(&self, values: &mut Vec<T>) -> Result<(), FieldMaskError> {
        self.leaf()?;
        if self.options.replace_repeated_fields {
            values.clear();
        }
        Ok(())
    }

    fn clear_map<K, V>(&self, map: &mut HashMap<K, V>) -> Result<(), FieldMaskError> {
        self.leaf()?;
        if self.options.replace_repeated_fields {
            map.clear();
        }
        Ok(())
    }

    fn descend<M: Message>(&mut self, value: &mut Option<M>) -> Result<(), FieldMaskError> {
        if self.rest.is_empty() {
            *value = None;
            return Ok(());
        }
        let message = value.get_or_insert_with(M::default);
        replace(message, self.rest, self.path, self.selected, &self.options)
    }
}

impl Decoder for PathDecoder<'_> {
    type Error = FieldMaskError;

    fn handle_conflicting_oneof(&mut self) -> Result<(), FieldMaskError> {
        Ok(())
    }

    fn next_field_number(&mut self) -> Result<Option<u32>, FieldMaskError> {
        Ok(self.number.take())
    }

    clear_scalars! {
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

    fn decode_singular_enum_field<E: Enum>(&mut self, value: &mut E) -> Result<(), FieldMaskError> {
        self.leaf()?;
        *value = E::default();
        Ok(())
    }

    fn decode_optional_enum_field<E: Enum>(&mut self, value: &mut Option<E>) -> Result<(), FieldMaskError> {
        self.leaf()?;
        *value = None;
        Ok(())
    }

    fn decode_repeated_enum_field<E: Enum>(&mut self, values: &mut Vec<E>) -> Result<(), FieldMaskError> {
        self.clear_repeated(values)
    }

    fn decode_singular_message_field<M: Message>(&mut self, value: &mut Option<M>) -> Result<(), FieldMaskError> {
        self.descend(value)
    }

    fn decode_repeated_message_field<M: Message>(&mut self, values: &mut Vec<M>) -> Result<(), FieldMaskError> {
        self.clear_repeated(values)
    }

    fn decode_singular_group_field<M: Message>(&mut self, value: &mut Option<M>) -> Result<(), FieldMaskError> {
        self.descend(value)
    }

    fn decode_repeated_group_field<M: Message>(&mut self, values: &mut Vec<M>) -> Result<(), FieldMaskError> {
        self.clear_repeated(values)
    }

    fn decode_map_field<K: MapKeyType, V: FieldType>(
        &mut self,
        value: &mut HashMap<K::Value, V::Value>,
    ) -> Result<(), FieldMaskError> {
        self.clear_map(value)
    }

    fn decode_map_field_with_enum_values<K: MapKeyType, E: Enum>(
        &mut self,
        value: &mut HashMap<K::Value, E>,
    ) -> Result<(), FieldMaskError> {
        self.clear_map(value)
    }

    fn decode_map_field_with_message_values<K: MapKeyType, M: Message>(
        &mut self,
        value: &mut HashMap<K::Value, M>,
    ) -> Result<(), FieldMaskError> {
        self.clear_map(value)
    }

    fn decode_extension_field(
        &mut self,
        _values: &mut ExtensionSet,
        _extendee: &'static str,
        _field_number: u32,
    ) -> Result<(), FieldMaskError> {
        Err(not_found(self.path))
    }
}
