use std::collections::HashMap;

use crate::extensions::ExtensionSet;
use crate::field_types::{FieldType, MapKeyType};
use crate::name_map::NameMap;
use crate::text::{TextEncodeError, TextEncoder, TextFormatEncodingOptions};
use crate::visitor::map_entries;
use crate::{Enum, Message, Visitor};

type Result<T> = std::result::Result<T, TextEncodeError>;

#[derive(Clone, Copy)]
enum FieldNames {
    Message(&'static NameMap),
    /// The synthesized entry message of a map field, with fields `key` (1) and `value` (2).
    MapEntry,
}

/// Writes the fields of one message as text format lines.
pub struct TextEncodingVisitor<'a> {
    encoder: &'a mut TextEncoder,
    names: FieldNames,
    options: &'a TextFormatEncodingOptions,
    extension_name: Option<&'static str>,
}

impl<'a> TextEncodingVisitor<'a> {
    pub fn new<M: Message>(
        encoder: &'a mut TextEncoder,
        options: &'a TextFormatEncodingOptions,
    ) -> TextEncodingVisitor<'a> {
        TextEncodingVisitor {
            encoder,
            names: FieldNames::Message(M::layout().name_map()),
            options,
            extension_name: None,
        }
    }

    fn map_entry(
        encoder: &'a mut TextEncoder,
        options: &'a TextFormatEncodingOptions,
    ) -> TextEncodingVisitor<'a> {
        TextEncodingVisitor {
            encoder,
            names: FieldNames::MapEntry,
            options,
            extension_name: None,
        }
    }

    /// While set, fields are written as `[name]` instead of their declared names.
    pub fn set_extension_name(&mut self, name: Option<&'static str>) -> Option<&'static str> {
        std::mem::replace(&mut self.extension_name, name)
    }

    fn start_field(&mut self, field_number: u32) -> Result<()> {
        if let Some(name) = self.extension_name {
            self.encoder.start_bracketed_field(name);
            return Ok(());
        }
        let name = match self.names {
            FieldNames::Message(names) => names
                .names(field_number as i32)
                .ok_or(TextEncodeError::MissingFieldNames)?
                .proto(),
            FieldNames::MapEntry if field_number == 1 => "key",
            FieldNames::MapEntry => "value",
        };
        self.encoder.start_field(name);
        Ok(())
    }

    fn scalar(&mut self, field_number: u32, put: impl FnOnce(&mut TextEncoder)) -> Result<()> {
        self.start_field(field_number)?;
        self.encoder.start_scalar();
        put(&mut *self.encoder);
        self.encoder.end_scalar();
        Ok(())
    }

    fn message<M: Message>(&mut self, value: &M, field_number: u32) -> Result<()> {
        self.start_field(field_number)?;
        self.encoder.start_block();
        super::encode_message_body(value, self.encoder, self.options)?;
        self.encoder.end_block();
        Ok(())
    }

    fn put_map<K: MapKeyType, V>(
        &mut self,
        map: &HashMap<K::Value, V>,
        field_number: u32,
        mut put_value: impl FnMut(&mut TextEncodingVisitor<'_>, &V) -> Result<()>,
    ) -> Result<()> {
        for (key, value) in map_entries(map, true) {
            self.start_field(field_number)?;
            self.encoder.start_block();
            let mut entry = TextEncodingVisitor::map_entry(&mut *self.encoder, self.options);
            K::visit_singular(key, 1, &mut entry)?;
            put_value(&mut entry, value)?;
            self.encoder.end_block();
        }
        Ok(())
    }
}

impl Visitor for TextEncodingVisitor<'_> {
    type Error = TextEncodeError;

    fn visit_unknown(&mut self, bytes: &[u8]) -> Result<()> {
        if self.options.print_unknown_fields {
            self.encoder.put_unknown_fields(bytes);
        }
        Ok(())
    }

    fn visit_singular_float_field(&mut self, value: f32, field_number: u32) -> Result<()> {
        self.scalar(field_number, |encoder| encoder.put_f32(value))
    }

    fn visit_singular_double_field(&mut self, value: f64, field_number: u32) -> Result<()> {
        self.scalar(field_number, |encoder| encoder.put_f64(value))
    }

    fn visit_singular_int64_field(&mut self, value: i64, field_number: u32) -> Result<()> {
        self.scalar(field_number, |encoder| encoder.put_i64(value))
    }

    fn visit_singular_uint64_field(&mut self, value: u64, field_number: u32) -> Result<()> {
        self.scalar(field_number, |encoder| encoder.put_u64(value))
    }

    fn visit_singular_bool_field(&mut self, value: bool, field_number: u32) -> Result<()> {
        self.scalar(field_number, |encoder| encoder.put_bool(value))
    }

    fn visit_singular_string_field(&mut self, value: &str, field_number: u32) -> Result<()> {
        self.scalar(field_number, |encoder| encoder.put_string(value))
    }

    fn visit_singular_bytes_field(&mut self, value: &[u8], field_number: u32) -> Result<()> {
        self.scalar(field_number, |encoder| encoder.put_bytes(value))
    }

    fn visit_singular_enum_field<E: Enum>(&mut self, value: E, field_number: u32) -> Result<()> {
        self.scalar(field_number, |encoder| match value.name() {
            Some(name) => encoder.put_identifier(name),
            None => encoder.put_i64(i64::from(value.to_i32())),
        })
    }

    fn visit_singular_message_field<M: Message>(&mut self, value: &M, field_number: u32) -> Result<()> {
        self.message(value, field_number)
    }

    fn visit_singular_group_field<M: Message>(&mut self, value: &M, field_number: u32) -> Result<()> {
        self.message(value, field_number)
    }

    fn visit_map_field<K: MapKeyType, V: FieldType>(
        &mut self,
        value: &HashMap<K::Value, V::Value>,
        field_number: u32,
    ) -> Result<()> {
        self.put_map::<K, V::Value>(value, field_number, |entry, value| {
            V::visit_singular(value, 2, entry)
        })
    }

    fn visit_map_field_with_enum_values<K: MapKeyType, E: Enum>(
        &mut self,
        value: &HashMap<K::Value, E>,
        field_number: u32,
    ) -> Result<()> {
        self.put_map::<K, E>(value, field_number, |entry, value| {
            entry.visit_singular_enum_field(*value, 2)
        })
    }

    fn visit_map_field_with_message_values<K: MapKeyType, M: Message>(
        &mut self,
        value: &HashMap<K::Value, M>,
        field_number: u32,
    ) -> Result<()> {
        self.put_map::<K, M>(value, field_number, |entry, value| {
            entry.visit_singular_message_field(value, 2)
        })
    }

    fn visit_extension_fields(&mut self, fields: &ExtensionSet, start: u32, end: u32) -> Result<()> {
        for field in fields.range(start, end) {
            field.visit_text(self)?;
        }
        Ok(())
    }
}
