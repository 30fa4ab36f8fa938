use std::collections::HashMap;

use protokit::{Message, TextDecodeError, TextFormatDecodingOptions, TextFormatEncodingOptions};

use crate::check_message;
use crate::proto2::{Color, Proto2Message};
use crate::proto3::{NestedEnum, NestedMessage, OneofField, TestAllTypes};

fn parse(text: &str) -> Result<TestAllTypes, TextDecodeError> {
    TestAllTypes::from_text(text)
}

#[test]
fn scalar_lines() {
    let message = TestAllTypes {
        optional_int32: -3,
        optional_uint64: u64::MAX,
        optional_double: f64::NEG_INFINITY,
        optional_bool: true,
        optional_string: "quote\" and é".to_owned(),
        optional_bytes: vec![0x08, b'a', 0xFF],
        optional_nested_enum: NestedEnum::Bar,
        ..TestAllTypes::default()
    };
    let text = message.to_text().unwrap();
    assert_eq!(
        text,
        concat!(
            "optional_int32: -3\n",
            "optional_uint64: 18446744073709551615\n",
            "optional_double: -inf\n",
            "optional_bool: true\n",
            "optional_string: \"quote\\\" and é\"\n",
            "optional_bytes: \"\\010a\\377\"\n",
            "optional_nested_enum: BAR\n",
        )
    );
    assert_eq!(parse(&text).unwrap(), message);
}

#[test]
fn nested_blocks_and_maps() {
    let message = TestAllTypes {
        optional_nested_message: Some(NestedMessage { a: 1, corecursive: None }),
        repeated_int32: vec![1, 2],
        map_string_int32: [("b".to_owned(), 2), ("a".to_owned(), 1)].into(),
        ..TestAllTypes::default()
    };
    assert_eq!(
        message.to_text().unwrap(),
        concat!(
            "optional_nested_message {\n",
            "  a: 1\n",
            "}\n",
            "repeated_int32: 1\n",
            "repeated_int32: 2\n",
            "map_string_int32 {\n",
            "  key: \"a\"\n",
            "  value: 1\n",
            "}\n",
            "map_string_int32 {\n",
            "  key: \"b\"\n",
            "  value: 2\n",
            "}\n",
        )
    );
    check_message(&message);
}

#[test]
fn permissive_input() {
    let text = r#"
        # comments run to the end of the line
        optional_int32: 0x10, optional_uint32: 010;
        optional_float: 1.5f
        optional_double: -Infinity
        optional_string: "con" 'cat'
        optional_nested_message < a: 7 >
        optional_nested_message: { corecursive { optional_bool: t } }
        repeated_int32: [1, -2]
        repeated_int32: 3
        repeated_nested_enum: [BAZ, 1]
        map_int32_nested_message [{ key: 5 }, { value { a: 6 } }]
        map_bool_nested_enum { key: true value: NEG }
    "#;
    let message = parse(text).unwrap();
    assert_eq!(message.optional_int32, 16);
    assert_eq!(message.optional_uint32, 8);
    assert_eq!(message.optional_float, 1.5);
    assert_eq!(message.optional_double, f64::NEG_INFINITY);
    assert_eq!(message.optional_string, "concat");
    let nested = message.optional_nested_message.as_ref().unwrap();
    assert_eq!(nested.a, 7);
    assert!(nested.corecursive.as_ref().unwrap().optional_bool);
    assert_eq!(message.repeated_int32, [1, -2, 3]);
    assert_eq!(message.repeated_nested_enum, [NestedEnum::Baz, NestedEnum::Bar]);
    assert_eq!(
        message.map_int32_nested_message,
        HashMap::from([
            (5, NestedMessage::default()),
            (0, NestedMessage { a: 6, corecursive: None }),
        ])
    );
    assert_eq!(message.map_bool_nested_enum, HashMap::from([(true, NestedEnum::Neg)]));
}

#[test]
fn errors() {
    assert_eq!(parse("bogus: 1"), Err(TextDecodeError::UnknownField("bogus".to_owned())));
    assert_eq!(
        parse("optional_nested_enum: QUX"),
        Err(TextDecodeError::UnrecognizedEnumValue)
    );
    assert_eq!(parse("optional_nested_message { a: 1"), Err(TextDecodeError::Truncated));
    assert_eq!(parse("optional_int32: 99999999999"), Err(TextDecodeError::MalformedNumber));
    assert_eq!(
        parse("oneof_uint32: 1 oneof_string: \"x\""),
        Err(TextDecodeError::ConflictingOneof)
    );
    assert!(parse("optional_int32 1").is_err());
    assert!(parse("optional_nested_message { a: 1 }}").is_err());
}

#[test]
fn reserved_and_ignored_names() {
    assert_eq!(parse("retired_field: 3 optional_int32: 1").unwrap().optional_int32, 1);

    let lenient = TextFormatDecodingOptions::default().with_ignore_unknown_fields(true);
    let message =
        TestAllTypes::from_text_with("bogus { x: [1, 2] } optional_int32: 2", &lenient, None)
            .unwrap();
    assert_eq!(message.optional_int32, 2);
}

#[test]
fn oneof_members() {
    let message = TestAllTypes {
        oneof_field: Some(OneofField::String("x".to_owned())),
        ..TestAllTypes::default()
    };
    assert_eq!(message.to_text().unwrap(), "oneof_string: \"x\"\n");
    assert_eq!(
        parse("oneof_uint32: 1 oneof_uint32: 2").unwrap().oneof_field,
        Some(OneofField::Uint32(2))
    );
}

#[test]
fn proto2_presence_and_enums() {
    let message = Proto2Message {
        name: Some(String::new()),
        color: Some(Color::Red),
        samples: vec![-1, 1],
        ..Proto2Message::with_id(0)
    };
    let text = message.to_text().unwrap();
    assert_eq!(
        text,
        "id: 0\nname: \"\"\ncolor: RED\nsamples: -1\nsamples: 1\n"
    );
    assert_eq!(Proto2Message::from_text(&text).unwrap(), message);
    assert_eq!(
        Proto2Message::from_text("name: \"x\""),
        Err(TextDecodeError::MissingRequiredFields)
    );
}

#[test]
fn unknown_fields_are_printed_by_number() {
    let message =
        Proto2Message::decode(&[0x08, 0x01, 0xA0, 0x01, 0x05, 0xAA, 0x01, 0x01, b'z']).unwrap();
    assert_eq!(message.to_text().unwrap(), "id: 1\n20: 5\n21: \"z\"\n");

    let options = TextFormatEncodingOptions::default().with_print_unknown_fields(false);
    assert_eq!(message.to_text_with(&options).unwrap(), "id: 1\n");
}
