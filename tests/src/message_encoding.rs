use protokit::encoding::{FieldTag, WireType};
use protokit::{BinaryDecodingOptions, DecodeErrorKind, EncodeError, Message};

use crate::check_message;
use crate::proto3::{NestedEnum, NestedMessage, OneofField, TestAllTypes};

fn everything() -> TestAllTypes {
    TestAllTypes {
        optional_int32: -5,
        optional_int64: i64::MIN,
        optional_uint32: u32::MAX,
        optional_uint64: u64::MAX,
        optional_sint32: i32::MIN,
        optional_sint64: -1,
        optional_fixed32: 7,
        optional_fixed64: 8,
        optional_sfixed32: -9,
        optional_sfixed64: -10,
        optional_float: 340282300000000000000000000000000000000.0,
        optional_double: 0.1,
        optional_bool: true,
        optional_string: "smile 😀".to_owned(),
        optional_bytes: vec![0, 1, 0xFF],
        proto3_optional_int32: Some(0),
        optional_nested_message: Some(NestedMessage {
            a: 17,
            corecursive: Some(Box::new(TestAllTypes {
                optional_string: "inner".to_owned(),
                ..TestAllTypes::default()
            })),
        }),
        optional_nested_enum: NestedEnum::Neg,
        repeated_int32: vec![1, -1, 300],
        repeated_string: vec!["a".to_owned(), String::new()],
        repeated_nested_message: vec![NestedMessage::default(), NestedMessage { a: 2, corecursive: None }],
        repeated_nested_enum: vec![NestedEnum::Bar, NestedEnum::Foo],
        map_string_int32: [("one".to_owned(), 1), ("two".to_owned(), 2)].into(),
        map_int32_nested_message: [(-1, NestedMessage { a: 3, corecursive: None })].into(),
        map_bool_nested_enum: [(true, NestedEnum::Baz), (false, NestedEnum::Foo)].into(),
        oneof_field: Some(OneofField::String("picked".to_owned())),
        ..TestAllTypes::default()
    }
}

#[test]
fn check_all_types() {
    check_message(&TestAllTypes::default());
    check_message(&everything());
}

#[test]
fn known_encodings() {
    let message = TestAllTypes {
        optional_uint32: 300,
        ..TestAllTypes::default()
    };
    assert_eq!(message.encode_to_vec().unwrap(), [0x18, 0xAC, 0x02]);

    assert_eq!(FieldTag::new(5, WireType::LengthDelimited).raw_value(), 42);

    let message = TestAllTypes {
        optional_int32: -1,
        optional_sint32: -1,
        ..TestAllTypes::default()
    };
    assert_eq!(
        message.encode_to_vec().unwrap(),
        [0x08, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x28, 0x01]
    );

    let message = TestAllTypes {
        repeated_int32: vec![1, 2, 300],
        ..TestAllTypes::default()
    };
    assert_eq!(
        message.encode_to_vec().unwrap(),
        [0xFA, 0x01, 0x04, 0x01, 0x02, 0xAC, 0x02]
    );
}

#[test]
fn packed_fields_accept_both_forms() {
    let unpacked = [0xF8, 0x01, 0x01, 0xF8, 0x01, 0x02];
    let packed = [0xFA, 0x01, 0x02, 0x01, 0x02];
    let mut both = unpacked.to_vec();
    both.extend_from_slice(&packed);

    assert_eq!(TestAllTypes::decode(&unpacked).unwrap().repeated_int32, [1, 2]);
    assert_eq!(TestAllTypes::decode(&packed).unwrap().repeated_int32, [1, 2]);
    assert_eq!(TestAllTypes::decode(&both).unwrap().repeated_int32, [1, 2, 1, 2]);
}

#[test]
fn wrong_wire_type_is_unknown() {
    // optional_int32 sent as fixed32; proto3 messages drop unknown fields.
    let message = TestAllTypes::decode(&[0x0D, 0x01, 0x00, 0x00, 0x00, 0x08, 0x05]).unwrap();
    assert_eq!(message.optional_int32, 5);
}

#[test]
fn last_oneof_member_wins() {
    let mut bytes = TestAllTypes {
        oneof_field: Some(OneofField::Uint32(4)),
        ..TestAllTypes::default()
    }
    .encode_to_vec()
    .unwrap();
    bytes.extend(
        TestAllTypes {
            oneof_field: Some(OneofField::Nested(NestedMessage { a: 1, corecursive: None })),
            ..TestAllTypes::default()
        }
        .encode_to_vec()
        .unwrap(),
    );
    let message = TestAllTypes::decode(&bytes).unwrap();
    assert_eq!(
        message.oneof_field,
        Some(OneofField::Nested(NestedMessage { a: 1, corecursive: None }))
    );
}

#[test]
fn merging_nested_messages() {
    let mut message = TestAllTypes {
        optional_nested_message: Some(NestedMessage { a: 1, corecursive: None }),
        repeated_int32: vec![1],
        ..TestAllTypes::default()
    };
    let update = TestAllTypes {
        optional_nested_message: Some(NestedMessage {
            a: 0,
            corecursive: Some(Box::default()),
        }),
        repeated_int32: vec![2],
        ..TestAllTypes::default()
    };
    message.merge(&update.encode_to_vec().unwrap()).unwrap();
    let nested = message.optional_nested_message.as_ref().unwrap();
    assert_eq!(nested.a, 1);
    assert!(nested.corecursive.is_some());
    assert_eq!(message.repeated_int32, [1, 2]);
}

#[test]
fn truncated_input() {
    for bytes in [
        &[0x08][..],
        &[0x08, 0x96],
        &[0x72, 0x05, b'a'],
        &[0x92, 0x01, 0x04, 0x08],
        &[0x7D, 0x00, 0x00],
    ] {
        let error = TestAllTypes::decode(bytes).unwrap_err();
        assert_eq!(error.kind(), &DecodeErrorKind::Truncated, "{bytes:?}");
    }
}

#[test]
fn malformed_input() {
    let error = TestAllTypes::decode(&[0x72, 0x01, 0xFF]).unwrap_err();
    assert_eq!(error.kind(), &DecodeErrorKind::InvalidUtf8);

    // Eleven byte varint.
    let mut bytes = vec![0x08];
    bytes.extend([0xFF; 10]);
    bytes.push(0x01);
    assert!(matches!(
        TestAllTypes::decode(&bytes).unwrap_err().kind(),
        DecodeErrorKind::Malformed(_)
    ));

    // Field number zero.
    assert!(matches!(
        TestAllTypes::decode(&[0x00, 0x01]).unwrap_err().kind(),
        DecodeErrorKind::Malformed(_)
    ));

    // A map entry with a key and no value.
    assert!(matches!(
        TestAllTypes::decode(&[0xC2, 0x03, 0x03, 0x0A, 0x01, b'a']).unwrap_err().kind(),
        DecodeErrorKind::Malformed(_)
    ));
}

#[test]
fn encode_into_small_buffer() {
    let message = everything();
    let mut storage = [0u8; 8];
    let error = message.encode(&mut &mut storage[..]).unwrap_err();
    assert_eq!(error.required_capacity(), Some(message.encoded_len().unwrap()));
    assert_eq!(error.remaining(), Some(8));
    assert!(matches!(error, EncodeError::InsufficientCapacity { .. }));
}

#[test]
fn length_delimited() {
    let message = everything();
    let bytes = message.encode_length_delimited_to_vec().unwrap();
    let len = message.encoded_len().unwrap();
    assert_eq!(bytes.len(), len + protokit::length_delimiter_len(len));
    assert_eq!(TestAllTypes::decode_length_delimited(&bytes).unwrap(), message);
}

#[test]
fn deterministic_maps() {
    let options = protokit::BinaryEncodingOptions::default().with_deterministic_ordering(true);
    let a = TestAllTypes {
        map_string_int32: (0..20).map(|n| (n.to_string(), n)).collect(),
        ..TestAllTypes::default()
    };
    let b = TestAllTypes {
        map_string_int32: (0..20).rev().map(|n| (n.to_string(), n)).collect(),
        ..TestAllTypes::default()
    };
    assert_eq!(a, b);
    assert_eq!(a.hash_value(), b.hash_value());
    assert_eq!(a.encode_with(&options, false).unwrap(), b.encode_with(&options, false).unwrap());
}

#[test]
fn discard_unknown_fields_option() {
    let options = BinaryDecodingOptions::default().with_discard_unknown_fields(true);
    let message = crate::proto2::Proto2Message::decode_with(
        &[0x08, 0x01, 0xF8, 0x3E, 0x07],
        None,
        false,
        &options,
    )
    .unwrap();
    assert!(message.unknown.is_empty());
    assert_eq!(message.id, Some(1));
}
