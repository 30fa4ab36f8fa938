//! The scalar wrapper messages. Each holds one field named `value`, numbered 1, and its JSON form
//! is that scalar alone.

use protokit::json::{JsonDecoder, JsonEncoder};
use protokit::wkt::CustomJsonCodable;
use protokit::{
    Cardinality, Decoder, FieldDescriptor, FieldKind, FieldName, JsonDecodeError,
    JsonEncodeError, JsonEncodingOptions, Message, MessageLayout, Syntax, Visitor,
};

macro_rules! wrapper {
    (
        $(#[$meta:meta])*
        $name:ident, $full_name:literal, $ty:ty, $kind:ident,
        $decode:ident, $visit:ident, |$value:ident| $arg:expr,
        encode: |$encoder:ident, $options:ident, $encoded:ident| $encode:expr,
        decode: |$decoder:ident| $read:expr $(,)?
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq)]
        pub struct $name {
            pub value: $ty,
        }

        impl $name {
            pub fn new(value: impl Into<$ty>) -> $name {
                $name { value: value.into() }
            }
        }

        impl From<$ty> for $name {
            fn from(value: $ty) -> $name {
                $name { value }
            }
        }

        impl From<$name> for $ty {
            fn from(wrapper: $name) -> $ty {
                wrapper.value
            }
        }

        impl Message for $name {
            const NAME: &'static str = $full_name;

            fn layout() -> &'static MessageLayout {
                static FIELDS: [FieldDescriptor; 1] = [FieldDescriptor::new(
                    1,
                    FieldName::Same("value"),
                    FieldKind::$kind,
                    Cardinality::Optional,
                )];
                static LAYOUT: MessageLayout =
                    MessageLayout::new($full_name, Syntax::Proto3, &FIELDS);
                &LAYOUT
            }

            fn decode_message<D: Decoder>(&mut self, decoder: &mut D) -> Result<(), D::Error> {
                while let Some(field_number) = decoder.next_field_number()? {
                    if field_number == 1 {
                        decoder.$decode(&mut self.value)?;
                    }
                }
                Ok(())
            }

            fn traverse<V: Visitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
                if self.value != <$ty>::default() {
                    let $value = &self.value;
                    visitor.$visit($arg, 1)?;
                }
                Ok(())
            }

            fn custom_json(&self) -> Option<&dyn CustomJsonCodable> {
                Some(self)
            }

            fn custom_json_mut(&mut self) -> Option<&mut dyn CustomJsonCodable> {
                Some(self)
            }
        }

        impl CustomJsonCodable for $name {
            fn encode_json(
                &self,
                $encoder: &mut JsonEncoder,
                $options: &JsonEncodingOptions,
            ) -> Result<(), JsonEncodeError> {
                let $encoded = &self.value;
                $encode;
                Ok(())
            }

            fn decode_json(
                &mut self,
                $decoder: &mut JsonDecoder<'_, '_>,
            ) -> Result<(), JsonDecodeError> {
                self.value = $read;
                Ok(())
            }
        }
    };
}

wrapper! {
    DoubleValue, "google.protobuf.DoubleValue", f64, Double,
    decode_singular_double_field, visit_singular_double_field, |value| *value,
    encode: |encoder, _options, value| encoder.put_f64(*value),
    decode: |decoder| decoder.scanner().next_double()?,
}

wrapper! {
    FloatValue, "google.protobuf.FloatValue", f32, Float,
    decode_singular_float_field, visit_singular_float_field, |value| *value,
    encode: |encoder, _options, value| encoder.put_f32(*value),
    decode: |decoder| decoder.scanner().next_float()?,
}

wrapper! {
    Int64Value, "google.protobuf.Int64Value", i64, Int64,
    decode_singular_int64_field, visit_singular_int64_field, |value| *value,
    encode: |encoder, options, value| encoder.put_i64(*value, !options.always_print_int64s_as_numbers),
    decode: |decoder| decoder.scanner().next_sint()?,
}

wrapper! {
    UInt64Value, "google.protobuf.UInt64Value", u64, UInt64,
    decode_singular_uint64_field, visit_singular_uint64_field, |value| *value,
    encode: |encoder, options, value| encoder.put_u64(*value, !options.always_print_int64s_as_numbers),
    decode: |decoder| decoder.scanner().next_uint()?,
}

wrapper! {
    Int32Value, "google.protobuf.Int32Value", i32, Int32,
    decode_singular_int32_field, visit_singular_int32_field, |value| *value,
    encode: |encoder, _options, value| encoder.put_i32(*value),
    decode: |decoder| i32::try_from(decoder.scanner().next_sint()?)
        .map_err(|_| JsonDecodeError::NumberRange)?,
}

wrapper! {
    UInt32Value, "google.protobuf.UInt32Value", u32, UInt32,
    decode_singular_uint32_field, visit_singular_uint32_field, |value| *value,
    encode: |encoder, _options, value| encoder.put_u32(*value),
    decode: |decoder| u32::try_from(decoder.scanner().next_uint()?)
        .map_err(|_| JsonDecodeError::NumberRange)?,
}

wrapper! {
    BoolValue, "google.protobuf.BoolValue", bool, Bool,
    decode_singular_bool_field, visit_singular_bool_field, |value| *value,
    encode: |encoder, _options, value| encoder.put_bool(*value),
    decode: |decoder| decoder.scanner().next_bool()?,
}

wrapper! {
    StringValue, "google.protobuf.StringValue", String, String,
    decode_singular_string_field, visit_singular_string_field, |value| value.as_str(),
    encode: |encoder, _options, value| encoder.put_string(value),
    decode: |decoder| decoder.scanner().next_quoted_string()?.into_owned(),
}

wrapper! {
    BytesValue, "google.protobuf.BytesValue", Vec<u8>, Bytes,
    decode_singular_bytes_field, visit_singular_bytes_field, |value| value.as_slice(),
    encode: |encoder, _options, value| encoder.put_bytes(value),
    decode: |decoder| decoder.scanner().next_bytes()?,
}

impl From<&str> for StringValue {
    fn from(value: &str) -> StringValue {
        StringValue::new(value)
    }
}
