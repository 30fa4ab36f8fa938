//! Marker types naming the protobuf scalar types.
//!
//! Map fields and extensions are generic over their element types. The markers connect a Rust
//! storage type (`i32` serves `int32`, `sint32` and `sfixed32`) with the visitor and decoder
//! methods for the protobuf type it stands for.

use std::fmt::Debug;
use std::hash::Hash;

use crate::{Decoder, Visitor};

pub trait FieldType: 'static {
    type Value: Clone + Debug + Default + PartialEq + Send + Sync + 'static;

    fn decode_singular<D: Decoder>(decoder: &mut D, value: &mut Self::Value) -> Result<(), D::Error>;

    fn decode_optional<D: Decoder>(
        decoder: &mut D,
        value: &mut Option<Self::Value>,
    ) -> Result<(), D::Error>;

    fn decode_repeated<D: Decoder>(
        decoder: &mut D,
        values: &mut Vec<Self::Value>,
    ) -> Result<(), D::Error>;

    fn visit_singular<V: Visitor>(
        value: &Self::Value,
        field_number: u32,
        visitor: &mut V,
    ) -> Result<(), V::Error>;

    fn visit_repeated<V: Visitor>(
        values: &[Self::Value],
        field_number: u32,
        visitor: &mut V,
    ) -> Result<(), V::Error>;

    fn visit_packed<V: Visitor>(
        values: &[Self::Value],
        field_number: u32,
        visitor: &mut V,
    ) -> Result<(), V::Error>;
}

/// Field types allowed as map keys: integers, `bool` and `string`.
pub trait MapKeyType: FieldType<Value: Eq + Hash + Ord> {}

macro_rules! field_type {
    (
        $(#[$meta:meta])*
        $name:ident, $ty:ty,
        $decode_singular:ident, $decode_optional:ident, $decode_repeated:ident,
        $visit_singular:ident, $visit_repeated:ident, $visit_packed:ident,
        |$value:ident| $deref:expr
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        pub struct $name;

        impl FieldType for $name {
            type Value = $ty;

            #[inline]
            fn decode_singular<D: Decoder>(decoder: &mut D, value: &mut $ty) -> Result<(), D::Error> {
                decoder.$decode_singular(value)
            }

            #[inline]
            fn decode_optional<D: Decoder>(
                decoder: &mut D,
                value: &mut Option<$ty>,
            ) -> Result<(), D::Error> {
                decoder.$decode_optional(value)
            }

            #[inline]
            fn decode_repeated<D: Decoder>(
                decoder: &mut D,
                values: &mut Vec<$ty>,
            ) -> Result<(), D::Error> {
                decoder.$decode_repeated(values)
            }

            #[inline]
            fn visit_singular<V: Visitor>(
                $value: &$ty,
                field_number: u32,
                visitor: &mut V,
            ) -> Result<(), V::Error> {
                visitor.$visit_singular($deref, field_number)
            }

            #[inline]
            fn visit_repeated<V: Visitor>(
                values: &[$ty],
                field_number: u32,
                visitor: &mut V,
            ) -> Result<(), V::Error> {
                visitor.$visit_repeated(values, field_number)
            }

            #[inline]
            fn visit_packed<V: Visitor>(
                values: &[$ty],
                field_number: u32,
                visitor: &mut V,
            ) -> Result<(), V::Error> {
                visitor.$visit_packed(values, field_number)
            }
        }
    };
}

field_type!(
    /// `float`
    FloatType, f32,
    decode_singular_float_field, decode_optional_float_field, decode_repeated_float_field,
    visit_singular_float_field, visit_repeated_float_field, visit_packed_float_field,
    |value| *value
);
field_type!(
    /// `double`
    DoubleType, f64,
    decode_singular_double_field, decode_optional_double_field, decode_repeated_double_field,
    visit_singular_double_field, visit_repeated_double_field, visit_packed_double_field,
    |value| *value
);
field_type!(
    /// `int32`
    Int32Type, i32,
    decode_singular_int32_field, decode_optional_int32_field, decode_repeated_int32_field,
    visit_singular_int32_field, visit_repeated_int32_field, visit_packed_int32_field,
    |value| *value
);
field_type!(
    /// `int64`
    Int64Type, i64,
    decode_singular_int64_field, decode_optional_int64_field, decode_repeated_int64_field,
    visit_singular_int64_field, visit_repeated_int64_field, visit_packed_int64_field,
    |value| *value
);
field_type!(
    /// `uint32`
    UInt32Type, u32,
    decode_singular_uint32_field, decode_optional_uint32_field, decode_repeated_uint32_field,
    visit_singular_uint32_field, visit_repeated_uint32_field, visit_packed_uint32_field,
    |value| *value
);
field_type!(
    /// `uint64`
    UInt64Type, u64,
    decode_singular_uint64_field, decode_optional_uint64_field, decode_repeated_uint64_field,
    visit_singular_uint64_field, visit_repeated_uint64_field, visit_packed_uint64_field,
    |value| *value
);
field_type!(
    /// `sint32`
    SInt32Type, i32,
    decode_singular_sint32_field, decode_optional_sint32_field, decode_repeated_sint32_field,
    visit_singular_sint32_field, visit_repeated_sint32_field, visit_packed_sint32_field,
    |value| *value
);
field_type!(
    /// `sint64`
    SInt64Type, i64,
    decode_singular_sint64_field, decode_optional_sint64_field, decode_repeated_sint64_field,
    visit_singular_sint64_field, visit_repeated_sint64_field, visit_packed_sint64_field,
    |value| *value
);
field_type!(
    /// `fixed32`
    Fixed32Type, u32,
    decode_singular_fixed32_field, decode_optional_fixed32_field, decode_repeated_fixed32_field,
    visit_singular_fixed32_field, visit_repeated_fixed32_field, visit_packed_fixed32_field,
    |value| *value
);
field_type!(
    /// `fixed64`
    Fixed64Type, u64,
    decode_singular_fixed64_field, decode_optional_fixed64_field, decode_repeated_fixed64_field,
    visit_singular_fixed64_field, visit_repeated_fixed64_field, visit_packed_fixed64_field,
    |value| *value
);
field_type!(
    /// `sfixed32`
    SFixed32Type, i32,
    decode_singular_sfixed32_field, decode_optional_sfixed32_field, decode_repeated_sfixed32_field,
    visit_singular_sfixed32_field, visit_repeated_sfixed32_field, visit_packed_sfixed32_field,
    |value| *value
);
field_type!(
    /// `sfixed64`
    SFixed64Type, i64,
    decode_singular_sfixed64_field, decode_optional_sfixed64_field, decode_repeated_sfixed64_field,
    visit_singular_sfixed64_field, visit_repeated_sfixed64_field, visit_packed_sfixed64_field,
    |value| *value
);
field_type!(
    /// `bool`
    BoolType, bool,
    decode_singular_bool_field, decode_optional_bool_field, decode_repeated_bool_field,
    visit_singular_bool_field, visit_repeated_bool_field, visit_packed_bool_field,
    |value| *value
);
field_type!(
    /// `string`
    StringType, String,
    decode_singular_string_field, decode_optional_string_field, decode_repeated_string_field,
    visit_singular_string_field, visit_repeated_string_field, visit_repeated_string_field,
    |value| value
);
field_type!(
    /// `bytes`
    BytesType, Vec<u8>,
    decode_singular_bytes_field, decode_optional_bytes_field, decode_repeated_bytes_field,
    visit_singular_bytes_field, visit_repeated_bytes_field, visit_repeated_bytes_field,
    |value| value
);

impl MapKeyType for Int32Type {}
impl MapKeyType for Int64Type {}
impl MapKeyType for UInt32Type {}
impl MapKeyType for UInt64Type {}
impl MapKeyType for SInt32Type {}
impl MapKeyType for SInt64Type {}
impl MapKeyType for Fixed32Type {}
impl MapKeyType for Fixed64Type {}
impl MapKeyType for SFixed32Type {}
impl MapKeyType for SFixed64Type {}
impl MapKeyType for BoolType {}
impl MapKeyType for StringType {}
