//! The well-known types as fields of an ordinary message.

use proptest::prelude::*;
use protokit::{JsonDecodeError, JsonEncodeError, Message, TextDecodeError};
use protokit_types::{Any, AnyRegistry, Duration, Int64Value, Struct, Timestamp, Value};

use crate::check_message;
use crate::proto3::{NestedMessage, TestAllTypes};

fn with_times(duration: Duration, timestamp: Timestamp) -> TestAllTypes {
    TestAllTypes {
        optional_duration: Some(duration),
        optional_timestamp: Some(timestamp),
        ..TestAllTypes::default()
    }
}

#[test]
fn durations_and_timestamps() {
    let message = with_times(
        Duration::new(1, 500_000_000),
        Timestamp::new(1, 500_000_000),
    );
    let json = message.to_json().unwrap();
    assert_eq!(
        json,
        r#"{"optionalDuration":"1.500s","optionalTimestamp":"1970-01-01T00:00:01.500Z"}"#
    );
    assert_eq!(TestAllTypes::from_json(&json).unwrap(), message);
    check_message(&message);

    let negative = with_times(Duration::new(-1, -500_000_000), Timestamp::new(-1, 0));
    assert_eq!(
        negative.to_json().unwrap(),
        r#"{"optionalDuration":"-1.500s","optionalTimestamp":"1969-12-31T23:59:59Z"}"#
    );

    let offset = TestAllTypes::from_json(r#"{"optionalTimestamp":"1970-01-01T01:00:00+01:00"}"#)
        .unwrap();
    assert_eq!(offset.optional_timestamp, Some(Timestamp::new(0, 0)));

    // The text format has no special form for either.
    assert_eq!(
        message.to_text().unwrap(),
        concat!(
            "optional_duration {\n",
            "  seconds: 1\n",
            "  nanos: 500000000\n",
            "}\n",
            "optional_timestamp {\n",
            "  seconds: 1\n",
            "  nanos: 500000000\n",
            "}\n",
        )
    );
}

#[test]
fn out_of_range_times() {
    assert_eq!(
        TestAllTypes::from_json(r#"{"optionalDuration":"315576000001s"}"#),
        Err(JsonDecodeError::MalformedDuration)
    );
    assert_eq!(
        TestAllTypes::from_json(r#"{"optionalDuration":"1"}"#),
        Err(JsonDecodeError::MalformedDuration)
    );
    assert_eq!(
        TestAllTypes::from_json(r#"{"optionalTimestamp":"10000-01-01T00:00:00Z"}"#),
        Err(JsonDecodeError::MalformedTimestamp)
    );
    assert_eq!(
        TestAllTypes::from_json(r#"{"optionalTimestamp":"1970-01-01 00:00:00Z"}"#),
        Err(JsonDecodeError::MalformedTimestamp)
    );

    // Binary holds any pair of integers; only the JSON form is range checked.
    let message = with_times(Duration::default(), Timestamp::new(i64::MAX, 0));
    let bytes = message.encode_to_vec().unwrap();
    assert_eq!(TestAllTypes::decode(&bytes).unwrap(), message);
    assert!(matches!(message.to_json(), Err(JsonEncodeError::TimestampRange)));
}

#[test]
fn wrappers() {
    let message = TestAllTypes {
        optional_int64_wrapper: Some(Int64Value { value: 7 }),
        ..TestAllTypes::default()
    };
    assert_eq!(message.to_json().unwrap(), r#"{"optionalInt64Wrapper":"7"}"#);
    assert_eq!(
        TestAllTypes::from_json(r#"{"optionalInt64Wrapper":7}"#).unwrap(),
        message
    );
    assert_eq!(
        TestAllTypes::from_json(r#"{"optionalInt64Wrapper":null}"#).unwrap(),
        TestAllTypes::default()
    );
    assert_eq!(
        message.to_text().unwrap(),
        "optional_int64_wrapper {\n  value: 7\n}\n"
    );
}

#[test]
fn values() {
    let null = TestAllTypes::from_json(r#"{"optionalValue":null}"#).unwrap();
    assert_eq!(null.optional_value, Some(Value::null()));
    assert_eq!(null.to_json().unwrap(), r#"{"optionalValue":null}"#);

    let json = r#"{"optionalValue":{"a":[1,"two",true,null],"b":{}}}"#;
    let message = TestAllTypes::from_json(json).unwrap();
    let fields = message
        .optional_value
        .as_ref()
        .and_then(Value::as_struct)
        .unwrap();
    let list = fields.get("a").and_then(Value::as_list).unwrap();
    assert_eq!(list.values[0].as_f64(), Some(1.0));
    assert_eq!(list.values[1].as_str(), Some("two"));
    assert_eq!(list.values[2].as_bool(), Some(true));
    assert!(list.values[3].is_null());
    assert_eq!(fields.get("b").and_then(Value::as_struct), Some(&Struct::new()));
    check_message(&message);

    let unset = TestAllTypes {
        optional_value: Some(Value::default()),
        ..TestAllTypes::default()
    };
    assert!(matches!(unset.to_json(), Err(JsonEncodeError::MissingValue)));
}

#[test]
fn any_fields() {
    let message = TestAllTypes {
        optional_any: Some(Any::pack(&Duration::new(2, 0))),
        ..TestAllTypes::default()
    };
    let json = message.to_json().unwrap();
    assert_eq!(
        json,
        r#"{"optionalAny":{"@type":"type.googleapis.com/google.protobuf.Duration","value":"2s"}}"#
    );
    let decoded = TestAllTypes::from_json(&json).unwrap();
    assert_eq!(decoded, message);
    let any = decoded.optional_any.unwrap();
    assert_eq!(any.unpack::<Duration>().unwrap(), Duration::new(2, 0));
    check_message(&message);
}

#[test]
fn any_of_a_registered_message() {
    crate::init_logging();
    assert!(AnyRegistry::register::<NestedMessage>());
    assert!(AnyRegistry::is_registered("protokit_test.TestAllTypes.NestedMessage"));

    let nested = NestedMessage {
        a: 3,
        corecursive: None,
    };
    let message = TestAllTypes {
        optional_any: Some(Any::pack(&nested)),
        ..TestAllTypes::default()
    };
    let json = message.to_json().unwrap();
    assert_eq!(
        json,
        r#"{"optionalAny":{"@type":"type.googleapis.com/protokit_test.TestAllTypes.NestedMessage","a":3}}"#
    );
    let decoded = TestAllTypes::from_json(&json).unwrap();
    assert_eq!(decoded.optional_any.unwrap().unpack::<NestedMessage>().unwrap(), nested);

    let text = message.to_text().unwrap();
    assert_eq!(
        text,
        concat!(
            "optional_any {\n",
            "  [type.googleapis.com/protokit_test.TestAllTypes.NestedMessage] {\n",
            "    a: 3\n",
            "  }\n",
            "}\n",
        )
    );
    assert_eq!(TestAllTypes::from_text(&text).unwrap(), message);
}

#[test]
fn any_of_an_unregistered_message() {
    let message = TestAllTypes {
        optional_any: Some(Any::new(
            "type.googleapis.com/example.Unregistered",
            vec![0x08, 0x01],
        )),
        ..TestAllTypes::default()
    };
    let bytes = message.encode_to_vec().unwrap();
    assert_eq!(TestAllTypes::decode(&bytes).unwrap(), message);
    assert!(matches!(
        message.to_json(),
        Err(JsonEncodeError::AnyTranscodeFailure)
    ));

    // Without the payload type the text form falls back to the raw fields.
    let text = message.to_text().unwrap();
    assert_eq!(
        text,
        concat!(
            "optional_any {\n",
            "  type_url: \"type.googleapis.com/example.Unregistered\"\n",
            "  value: \"\\010\\001\"\n",
            "}\n",
        )
    );
    assert_eq!(TestAllTypes::from_text(&text).unwrap(), message);
    assert_eq!(
        TestAllTypes::from_text("optional_any { [type.googleapis.com/example.Unregistered] { a: 1 } }"),
        Err(TextDecodeError::UnregisteredAnyType(
            "type.googleapis.com/example.Unregistered".to_owned()
        ))
    );
}

#[test]
fn hashing_stops_at_an_untranscodable_any() {
    crate::init_logging();
    let any = Any::from_json(r#"{"@type":"type.googleapis.com/example.Unregistered","x":1}"#)
        .unwrap();
    let message = |value| TestAllTypes {
        optional_int32: value,
        optional_any: Some(any.clone()),
        ..TestAllTypes::default()
    };
    assert_eq!(message(1).hash_value(), message(1).hash_value());
    assert_ne!(message(1).hash_value(), message(2).hash_value());
}

proptest! {
    #[test]
    fn time_fields_survive_json(
        seconds in -315_576_000_000i64..=315_576_000_000,
        nanos in 0i32..1_000_000_000,
        instant in -62_135_596_800i64..=253_402_300_799,
    ) {
        let nanos = if seconds < 0 { -nanos } else { nanos };
        let message = with_times(Duration::new(seconds, nanos), Timestamp::new(instant, nanos.abs()));
        let json = message.to_json().unwrap();
        prop_assert_eq!(TestAllTypes::from_json(&json).unwrap(), message);
    }
}
