use std::collections::HashMap;

use crate::extensions::ExtensionSet;
use crate::field_types::{FieldType, MapKeyType};
use crate::json::{JsonEncodeError, JsonEncoder, JsonEncodingOptions};
use crate::name_map::NameMap;
use crate::visitor::map_entries;
use crate::{EncodeError, Enum, Message, Visitor};

pub(crate) const NULL_VALUE: &str = "google.protobuf.NullValue";

macro_rules! repeated_json {
    ($($method:ident, $ty:ty, |$encoder:ident, $value:ident| $put:expr;)*) => {
        $(
            fn $method(&mut self, values: &[$ty], field_number: u32) -> Result<(), JsonEncodeError> {
                self.start_field(field_number)?;
                self.encoder.start_array();
                for $value in values {
                    let $encoder = &mut *self.encoder;
                    $put;
                }
                self.encoder.end_array();
                Ok(())
            }
        )*
    };
}

/// Writes the fields of one message as JSON object members.
///
/// The caller writes the surrounding braces, so the same visitor serves plain messages and the
/// well-known types that embed their fields in a larger object.
pub struct JsonEncodingVisitor<'a> {
    encoder: &'a mut JsonEncoder,
    /// `None` for a visitor that writes bare values, as map values are.
    names: Option<&'static NameMap>,
    options: &'a JsonEncodingOptions,
    extension_name: Option<&'static str>,
}

impl<'a> JsonEncodingVisitor<'a> {
    pub fn new<M: Message>(
        encoder: &'a mut JsonEncoder,
        options: &'a JsonEncodingOptions,
    ) -> JsonEncodingVisitor<'a> {
        JsonEncodingVisitor {
            encoder,
            names: Some(M::layout().name_map()),
            options,
            extension_name: None,
        }
    }

    fn bare(encoder: &'a mut JsonEncoder, options: &'a JsonEncodingOptions) -> JsonEncodingVisitor<'a> {
        JsonEncodingVisitor {
            encoder,
            names: None,
            options,
            extension_name: None,
        }
    }

    /// While set, fields are written under `"[name]"` instead of their declared names.
    pub fn set_extension_name(&mut self, name: Option<&'static str>) -> Option<&'static str> {
        std::mem::replace(&mut self.extension_name, name)
    }

    fn start_field(&mut self, field_number: u32) -> Result<(), JsonEncodeError> {
        if let Some(name) = self.extension_name {
            self.encoder.start_extension_field(name);
            return Ok(());
        }
        let Some(names) = self.names else {
            return Ok(());
        };
        let names = names
            .names(field_number as i32)
            .ok_or(JsonEncodeError::MissingFieldNames)?;
        if self.options.preserve_proto_field_names {
            self.encoder.start_field(names.proto());
        } else {
            self.encoder.start_field(names.json());
        }
        Ok(())
    }

    fn int64_quoted(&self) -> bool {
        !self.options.always_print_int64s_as_numbers
    }

    fn put_enum<E: Enum>(&mut self, value: E) {
        if E::NAME == NULL_VALUE {
            self.encoder.put_null();
            return;
        }
        if !self.options.always_print_enums_as_ints {
            if let Some(name) = value.name() {
                self.encoder.put_string(name);
                return;
            }
        }
        self.encoder.put_i32(value.to_i32());
    }

    fn put_map<K: MapKeyType, V>(
        &mut self,
        map: &HashMap<K::Value, V>,
        field_number: u32,
        mut put_value: impl FnMut(&mut JsonEncodingVisitor<'_>, &V) -> Result<(), JsonEncodeError>,
    ) -> Result<(), JsonEncodeError> {
        self.start_field(field_number)?;
        self.encoder.start_object();
        for (key, value) in map_entries(map, self.options.use_deterministic_ordering) {
            let mut key_visitor = MapKeyVisitor::default();
            K::visit_singular(key, 1, &mut key_visitor)?;
            self.encoder.start_field(&key_visitor.key);
            let mut value_visitor = JsonEncodingVisitor::bare(&mut *self.encoder, self.options);
            put_value(&mut value_visitor, value)?;
        }
        self.encoder.end_object();
        Ok(())
    }
}

impl Visitor for JsonEncodingVisitor<'_> {
    type Error = JsonEncodeError;

    fn visit_unknown(&mut self, _bytes: &[u8]) -> Result<(), JsonEncodeError> {
        Ok(())
    }

    fn visit_singular_float_field(&mut self, value: f32, field_number: u32) -> Result<(), JsonEncodeError> {
        self.start_field(field_number)?;
        self.encoder.put_f32(value);
        Ok(())
    }

    fn visit_singular_double_field(&mut self, value: f64, field_number: u32) -> Result<(), JsonEncodeError> {
        self.start_field(field_number)?;
        self.encoder.put_f64(value);
        Ok(())
    }

    fn visit_singular_int32_field(&mut self, value: i32, field_number: u32) -> Result<(), JsonEncodeError> {
        self.start_field(field_number)?;
        self.encoder.put_i32(value);
        Ok(())
    }

    fn visit_singular_int64_field(&mut self, value: i64, field_number: u32) -> Result<(), JsonEncodeError> {
        self.start_field(field_number)?;
        self.encoder.put_i64(value, self.int64_quoted());
        Ok(())
    }

    fn visit_singular_uint32_field(&mut self, value: u32, field_number: u32) -> Result<(), JsonEncodeError> {
        self.start_field(field_number)?;
        self.encoder.put_u32(value);
        Ok(())
    }

    fn visit_singular_uint64_field(&mut self, value: u64, field_number: u32) -> Result<(), JsonEncodeError> {
        self.start_field(field_number)?;
        self.encoder.put_u64(value, self.int64_quoted());
        Ok(())
    }

    fn visit_singular_bool_field(&mut self, value: bool, field_number: u32) -> Result<(), JsonEncodeError> {
        self.start_field(field_number)?;
        self.encoder.put_bool(value);
        Ok(())
    }

    fn visit_singular_string_field(&mut self, value: &str, field_number: u32) -> Result<(), JsonEncodeError> {
        self.start_field(field_number)?;
        self.encoder.put_string(value);
        Ok(())
    }

    fn visit_singular_bytes_field(&mut self, value: &[u8], field_number: u32) -> Result<(), JsonEncodeError> {
        self.start_field(field_number)?;
        self.encoder.put_bytes(value);
        Ok(())
    }

    fn visit_singular_enum_field<E: Enum>(&mut self, value: E, field_number: u32) -> Result<(), JsonEncodeError> {
        self.start_field(field_number)?;
        self.put_enum(value);
        Ok(())
    }

    fn visit_singular_message_field<M: Message>(&mut self, value: &M, field_number: u32) -> Result<(), JsonEncodeError> {
        self.start_field(field_number)?;
        super::encode_message_value(value, self.encoder, self.options)
    }

    fn visit_singular_group_field<M: Message>(&mut self, value: &M, field_number: u32) -> Result<(), JsonEncodeError> {
        self.visit_singular_message_field(value, field_number)
    }

    repeated_json! {
        visit_repeated_float_field, f32, |encoder, value| encoder.put_f32(*value);
        visit_repeated_double_field, f64, |encoder, value| encoder.put_f64(*value);
        visit_repeated_int32_field, i32, |encoder, value| encoder.put_i32(*value);
        visit_repeated_sint32_field, i32, |encoder, value| encoder.put_i32(*value);
        visit_repeated_sfixed32_field, i32, |encoder, value| encoder.put_i32(*value);
        visit_repeated_uint32_field, u32, |encoder, value| encoder.put_u32(*value);
        visit_repeated_fixed32_field, u32, |encoder, value| encoder.put_u32(*value);
        visit_repeated_bool_field, bool, |encoder, value| encoder.put_bool(*value);
        visit_repeated_string_field, String, |encoder, value| encoder.put_string(value);
        visit_repeated_bytes_field, Vec<u8>, |encoder, value| encoder.put_bytes(value);
    }

    fn visit_repeated_int64_field(&mut self, values: &[i64], field_number: u32) -> Result<(), JsonEncodeError> {
        self.put_repeated_i64(values, field_number)
    }

    fn visit_repeated_sint64_field(&mut self, values: &[i64], field_number: u32) -> Result<(), JsonEncodeError> {
        self.put_repeated_i64(values, field_number)
    }

    fn visit_repeated_sfixed64_field(&mut self, values: &[i64], field_number: u32) -> Result<(), JsonEncodeError> {
        self.put_repeated_i64(values, field_number)
    }

    fn visit_repeated_uint64_field(&mut self, values: &[u64], field_number: u32) -> Result<(), JsonEncodeError> {
        self.put_repeated_u64(values, field_number)
    }

    fn visit_repeated_fixed64_field(&mut self, values: &[u64], field_number: u32) -> Result<(), JsonEncodeError> {
        self.put_repeated_u64(values, field_number)
    }

    fn visit_repeated_enum_field<E: Enum>(&mut self, values: &[E], field_number: u32) -> Result<(), JsonEncodeError> {
        self.start_field(field_number)?;
        self.encoder.start_array();
        for value in values {
            self.put_enum(*value);
        }
        self.encoder.end_array();
        Ok(())
    }

    fn visit_repeated_message_field<M: Message>(&mut self, values: &[M], field_number: u32) -> Result<(), JsonEncodeError> {
        self.start_field(field_number)?;
        self.encoder.start_array();
        for value in values {
            super::encode_message_value(value, self.encoder, self.options)?;
        }
        self.encoder.end_array();
        Ok(())
    }

    fn visit_repeated_group_field<M: Message>(&mut self, values: &[M], field_number: u32) -> Result<(), JsonEncodeError> {
        self.visit_repeated_message_field(values, field_number)
    }

    fn visit_map_field<K: MapKeyType, V: FieldType>(
        &mut self,
        value: &HashMap<K::Value, V::Value>,
        field_number: u32,
    ) -> Result<(), JsonEncodeError> {
        self.put_map::<K, V::Value>(value, field_number, |visitor, value| {
            V::visit_singular(value, 2, visitor)
        })
    }

    fn visit_map_field_with_enum_values<K: MapKeyType, E: Enum>(
        &mut self,
        value: &HashMap<K::Value, E>,
        field_number: u32,
    ) -> Result<(), JsonEncodeError> {
        self.put_map::<K, E>(value, field_number, |visitor, value| {
            visitor.visit_singular_enum_field(*value, 2)
        })
    }

    fn visit_map_field_with_message_values<K: MapKeyType, M: Message>(
        &mut self,
        value: &HashMap<K::Value, M>,
        field_number: u32,
    ) -> Result<(), JsonEncodeError> {
        self.put_map::<K, M>(value, field_number, |visitor, value| {
            visitor.visit_singular_message_field(value, 2)
        })
    }

    fn visit_extension_fields(&mut self, fields: &ExtensionSet, start: u32, end: u32) -> Result<(), JsonEncodeError> {
        for field in fields.range(start, end) {
            field.visit_json(self)?;
        }
        Ok(())
    }
}

impl JsonEncodingVisitor<'_> {
    fn put_repeated_i64(&mut self, values: &[i64], field_number: u32) -> Result<(), JsonEncodeError> {
        let quoted = self.int64_quoted();
        self.start_field(field_number)?;
        self.encoder.start_array();
        for value in values {
            self.encoder.put_i64(*value, quoted);
        }
        self.encoder.end_array();
        Ok(())
    }

    fn put_repeated_u64(&mut self, values: &[u64], field_number: u32) -> Result<(), JsonEncodeError> {
        let quoted = self.int64_quoted();
        self.start_field(field_number)?;
        self.encoder.start_array();
        for value in values {
            self.encoder.put_u64(*value, quoted);
        }
        self.encoder.end_array();
        Ok(())
    }
}

/// Renders a map key as the string JSON object keys must be.
#[derive(Default)]
struct MapKeyVisitor {
    key: String,
}

impl Visitor for MapKeyVisitor {
    type Error = EncodeError;

    fn visit_unknown(&mut self, _bytes: &[u8]) -> Result<(), EncodeError> {
        Ok(())
    }

    fn visit_singular_double_field(&mut self, _value: f64, _field_number: u32) -> Result<(), EncodeError> {
        Ok(())
    }

    fn visit_singular_int64_field(&mut self, value: i64, _field_number: u32) -> Result<(), EncodeError> {
        self.key = value.to_string();
        Ok(())
    }

    fn visit_singular_uint64_field(&mut self, value: u64, _field_number: u32) -> Result<(), EncodeError> {
        self.key = value.to_string();
        Ok(())
    }

    fn visit_singular_bool_field(&mut self, value: bool, _field_number: u32) -> Result<(), EncodeError> {
        self.key = value.to_string();
        Ok(())
    }

    fn visit_singular_string_field(&mut self, value: &str, _field_number: u32) -> Result<(), EncodeError> {
        self.key = value.to_owned();
        Ok(())
    }

    fn visit_singular_bytes_field(&mut self, _value: &[u8], _field_number: u32) -> Result<(), EncodeError> {
        Ok(())
    }

    fn visit_singular_enum_field<E: Enum>(&mut self, _value: E, _field_number: u32) -> Result<(), EncodeError> {
        Ok(())
    }

    fn visit_singular_message_field<M: Message>(&mut self, _value: &M, _field_number: u32) -> Result<(), EncodeError> {
        Ok(())
    }

    fn visit_singular_group_field<M: Message>(&mut self, _value: &M, _field_number: u32) -> Result<(), EncodeError> {
        Ok(())
    }

    fn visit_map_field<K: MapKeyType, V: FieldType>(
        &mut self,
        _value: &HashMap<K::Value, V::Value>,
        _field_number: u32,
    ) -> Result<(), EncodeError> {
        Ok(())
    }

    fn visit_map_field_with_enum_values<K: MapKeyType, E: Enum>(
        &mut self,
        _value: &HashMap<K::Value, E>,
        _field_number: u32,
    ) -> Result<(), EncodeError> {
        Ok(())
    }

    fn visit_map_field_with_message_values<K: MapKeyType, M: Message>(
        &mut self,
        _value: &HashMap<K::Value, M>,
        _field_number: u32,
    ) -> Result<(), EncodeError> {
        Ok(())
    }
}
