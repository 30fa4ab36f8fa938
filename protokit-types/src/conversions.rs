use std::collections::{BTreeMap, HashMap};

use crate::value::{self, ListValue, NullValue, Struct, Value};

impl From<value::Kind> for Value {
    fn from(value: value::Kind) -> Self {
        Value { kind: Some(value) }
    }
}

impl From<NullValue> for Value {
    fn from(value: NullValue) -> Self {
        value::Kind::NullValue(value).into()
    }
}

macro_rules! impl_number_value {
    ($t: ty) => {
        impl From<$t> for Value {
            fn from(value: $t) -> Self {
                value::Kind::NumberValue(value.into()).into()
            }
        }
    };
}

impl_number_value!(u8);
impl_number_value!(u16);
impl_number_value!(u32);

impl_number_value!(i8);
impl_number_value!(i16);
impl_number_value!(i32);

impl_number_value!(f32);
impl_number_value!(f64);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        value::Kind::BoolValue(value).into()
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        value::Kind::StringValue(value).into()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        value::Kind::StringValue(value.to_owned()).into()
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        ListValue { values }.into()
    }
}

impl From<ListValue> for Value {
    fn from(value: ListValue) -> Self {
        value::Kind::ListValue(value).into()
    }
}

impl From<Struct> for Value {
    fn from(value: Struct) -> Self {
        value::Kind::StructValue(value).into()
    }
}

impl From<HashMap<String, Value>> for Struct {
    fn from(fields: HashMap<String, Value>) -> Self {
        Struct { fields }
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        map.into_iter().collect::<Struct>().into()
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    /// `None` becomes `null`.
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => NullValue::NullValue.into(),
        }
    }
}
