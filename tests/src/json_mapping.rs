use protokit::{JsonDecodeError, JsonDecodingOptions, JsonEncodingOptions, Message};

use crate::check_message;
use crate::proto2::{Color, Proto2Message};
use crate::proto3::{NestedEnum, NestedMessage, OneofField, TestAllTypes};

fn parse(json: &str) -> Result<TestAllTypes, JsonDecodeError> {
    TestAllTypes::from_json(json)
}

#[test]
fn sixty_four_bit_integers() {
    let message = TestAllTypes {
        optional_int64: 9007199254740993,
        optional_uint64: u64::MAX,
        ..TestAllTypes::default()
    };
    let json = message.to_json().unwrap();
    assert_eq!(
        json,
        r#"{"optionalInt64":"9007199254740993","optionalUint64":"18446744073709551615"}"#
    );
    assert_eq!(parse(&json).unwrap(), message);

    let unquoted = r#"{"optionalInt64":9007199254740993,"optionalUint64":18446744073709551615}"#;
    assert_eq!(parse(unquoted).unwrap(), message);

    let options = JsonEncodingOptions::default().with_int64s_as_numbers(true);
    assert_eq!(message.to_json_with(&options).unwrap(), unquoted);
}

#[test]
fn field_names() {
    let message = TestAllTypes {
        optional_int32: 1,
        proto3_optional_int32: Some(0),
        ..TestAllTypes::default()
    };
    assert_eq!(
        message.to_json().unwrap(),
        r#"{"optionalInt32":1,"proto3OptionalInt32":0}"#
    );
    let options = JsonEncodingOptions::default().with_proto_field_names(true);
    let json = message.to_json_with(&options).unwrap();
    assert_eq!(json, r#"{"optional_int32":1,"proto3_optional_int32":0}"#);
    assert_eq!(parse(&json).unwrap(), message);
    assert_eq!(
        parse(r#"{"optional_int32":1,"proto3OptionalInt32":0}"#).unwrap(),
        message
    );

    let raw = Proto2Message {
        raw_bytes: Some(b"hi".to_vec()),
        ..Proto2Message::with_id(3)
    };
    assert_eq!(raw.to_json().unwrap(), r#"{"id":3,"raw":"aGk="}"#);
    assert_eq!(Proto2Message::from_json(r#"{"id":3,"raw_bytes":"aGk="}"#).unwrap(), raw);
}

#[test]
fn enums() {
    let message = TestAllTypes {
        optional_nested_enum: NestedEnum::Neg,
        repeated_nested_enum: vec![NestedEnum::Bar, NestedEnum::Baz],
        ..TestAllTypes::default()
    };
    let json = message.to_json().unwrap();
    assert_eq!(
        json,
        r#"{"optionalNestedEnum":"NEG","repeatedNestedEnum":["BAR","BAZ"]}"#
    );
    assert_eq!(parse(&json).unwrap(), message);

    let options = JsonEncodingOptions::default().with_enums_as_ints(true);
    let json = message.to_json_with(&options).unwrap();
    assert_eq!(json, r#"{"optionalNestedEnum":-1,"repeatedNestedEnum":[1,2]}"#);
    assert_eq!(parse(&json).unwrap(), message);

    assert_eq!(
        parse(r#"{"optionalNestedEnum":"QUX"}"#),
        Err(JsonDecodeError::UnrecognizedEnumValue)
    );
    let lenient = JsonDecodingOptions::default().with_ignore_unknown_fields(true);
    let message =
        TestAllTypes::from_json_with(r#"{"repeatedNestedEnum":["QUX","BAR"]}"#, &lenient, None)
            .unwrap();
    assert_eq!(message.repeated_nested_enum, [NestedEnum::Bar]);

    let message = Proto2Message::from_json(r#"{"id":1,"color":"GREEN","colors":[3]}"#).unwrap();
    assert_eq!(message.color, Some(Color::Green));
    assert_eq!(message.colors, [Color::Blue]);
}

#[test]
fn floats_and_bytes() {
    let message = TestAllTypes {
        optional_float: f32::INFINITY,
        optional_double: f64::NAN,
        optional_bytes: vec![0xFB, 0xFF],
        ..TestAllTypes::default()
    };
    let json = message.to_json().unwrap();
    assert_eq!(
        json,
        r#"{"optionalFloat":"Infinity","optionalDouble":"NaN","optionalBytes":"+/8="}"#
    );
    let decoded = parse(&json).unwrap();
    assert!(decoded.optional_double.is_nan());
    assert_eq!(decoded.optional_float, f32::INFINITY);
    assert_eq!(decoded.optional_bytes, [0xFB, 0xFF]);

    let decoded = parse(r#"{"optionalDouble":"-Infinity","optionalFloat":"1.5"}"#).unwrap();
    assert_eq!(decoded.optional_double, f64::NEG_INFINITY);
    assert_eq!(decoded.optional_float, 1.5);
}

#[test]
fn integers_accept_integral_forms() {
    let message = parse(r#"{"optionalInt32":"-7","optionalUint32":1e2,"optionalSint64":"3"}"#).unwrap();
    assert_eq!(message.optional_int32, -7);
    assert_eq!(message.optional_uint32, 100);
    assert_eq!(message.optional_sint64, 3);

    assert_eq!(parse(r#"{"optionalInt32":1.5}"#), Err(JsonDecodeError::MalformedNumber));
    assert_eq!(
        parse(r#"{"optionalInt32":2147483648}"#),
        Err(JsonDecodeError::NumberRange)
    );
    assert_eq!(parse(r#"{"optionalUint32":-1}"#), Err(JsonDecodeError::NumberRange));
    assert_eq!(parse(r#"{"optionalInt32":01}"#), Err(JsonDecodeError::LeadingZero));
}

#[test]
fn maps() {
    let message = TestAllTypes {
        map_string_int32: [("b".to_owned(), 2), ("a".to_owned(), 1)].into(),
        map_int32_nested_message: [(-4, NestedMessage { a: 4, corecursive: None })].into(),
        map_bool_nested_enum: [(true, NestedEnum::Bar)].into(),
        ..TestAllTypes::default()
    };
    let options = JsonEncodingOptions::default().with_deterministic_ordering(true);
    let json = message.to_json_with(&options).unwrap();
    assert_eq!(
        json,
        concat!(
            r#"{"mapStringInt32":{"a":1,"b":2},"#,
            r#""mapInt32NestedMessage":{"-4":{"a":4}},"#,
            r#""mapBoolNestedEnum":{"true":"BAR"}}"#,
        )
    );
    assert_eq!(parse(&json).unwrap(), message);

    assert_eq!(
        parse(r#"{"mapInt32NestedMessage":{4:{}}}"#),
        Err(JsonDecodeError::UnquotedMapKey)
    );
    assert_eq!(
        parse(r#"{"mapBoolNestedEnum":{"yes":"BAR"}}"#),
        Err(JsonDecodeError::MalformedBool)
    );
    assert_eq!(parse(r#"{"mapStringInt32":[]}"#), Err(JsonDecodeError::MalformedMap));
}

#[test]
fn nulls() {
    let message = parse(concat!(
        r#"{"optionalInt32":null,"optionalNestedMessage":null,"repeatedString":null,"#,
        r#""mapStringInt32":null,"optionalNestedEnum":null}"#,
    ))
    .unwrap();
    assert_eq!(message, TestAllTypes::default());

    assert_eq!(
        parse(r#"{"repeatedString":["a",null]}"#),
        Err(JsonDecodeError::IllegalNull)
    );
}

#[test]
fn oneofs() {
    let message = TestAllTypes {
        oneof_field: Some(OneofField::Nested(NestedMessage::default())),
        ..TestAllTypes::default()
    };
    assert_eq!(message.to_json().unwrap(), r#"{"oneofNestedMessage":{}}"#);
    check_message(&message);

    assert_eq!(
        parse(r#"{"oneofUint32":1,"oneofString":"x"}"#),
        Err(JsonDecodeError::ConflictingOneof)
    );
    assert_eq!(
        parse(r#"{"oneofUint32":1,"oneofUint32":2}"#).unwrap().oneof_field,
        Some(OneofField::Uint32(2))
    );
}

#[test]
fn unknown_keys() {
    assert_eq!(
        parse(r#"{"optionalInt32":1,"bogus":{"x":[1,2]}}"#),
        Err(JsonDecodeError::UnknownField("bogus".to_owned()))
    );
    let lenient = JsonDecodingOptions::default().with_ignore_unknown_fields(true);
    let message =
        TestAllTypes::from_json_with(r#"{"bogus":{"x":[1,2]},"optionalInt32":1}"#, &lenient, None)
            .unwrap();
    assert_eq!(message.optional_int32, 1);
}

#[test]
fn malformed_documents() {
    assert_eq!(parse(r#"{"optionalInt32":1"#), Err(JsonDecodeError::Truncated));
    assert_eq!(parse("{} {}"), Err(JsonDecodeError::TrailingGarbage));
    assert_eq!(parse("[]"), Err(JsonDecodeError::SchemaMismatch));
    assert_eq!(
        parse(r#"{"optionalString":"\u12"}"#),
        Err(JsonDecodeError::MalformedString)
    );
    assert_eq!(parse(r#"{"optionalBool":"true"}"#), Err(JsonDecodeError::MalformedBool));
    assert!(parse(r#"{"optionalInt32":1,}"#).is_err());
}

#[test]
fn whitespace_and_escapes() {
    let message = parse(" {\n\t\"optionalString\" : \"tab\\there \\ud83d\\ude00\" } ").unwrap();
    assert_eq!(message.optional_string, "tab\there 😀");
    assert_eq!(message.to_json().unwrap(), r#"{"optionalString":"tab\there 😀"}"#);
}

#[test]
fn required_fields() {
    assert_eq!(
        Proto2Message::from_json(r#"{"name":"x"}"#),
        Err(JsonDecodeError::MissingRequiredFields)
    );
    assert!(Proto2Message::from_json(r#"{"id":0}"#).is_ok());
}
