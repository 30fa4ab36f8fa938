use protokit::{DecodeErrorKind, Message};

use crate::check_message;
use crate::proto2::{Data, Proto2Message};

fn with_data() -> Proto2Message {
    Proto2Message {
        data: Some(Data {
            group_int32: Some(32),
            ..Data::default()
        }),
        ..Proto2Message::with_id(1)
    }
}

#[test]
fn group_encoding() {
    let message = with_data();
    let bytes = message.encode_to_vec().unwrap();
    assert_eq!(bytes, [0x08, 0x01, 0x2B, 0x30, 0x20, 0x2C]);
    assert_eq!(Proto2Message::decode(&bytes).unwrap(), message);
    check_message(&message);
}

#[test]
fn unknown_fields_inside_group() {
    let data = [0x08, 0x01, 0x2B, 0x30, 0x20, 0x50, 0x01, 0x2C];
    let message = Proto2Message::decode(&data).unwrap();
    let group = message.data.as_ref().unwrap();
    assert_eq!(group.group_int32, Some(32));
    assert_eq!(group.unknown.data(), [0x50, 0x01]);
    assert_eq!(message.encode_to_vec().unwrap(), data);
}

#[test]
fn unknown_group_is_preserved() {
    let data = [
        0x08, 0x01, // id
        0xA3, 0x01, // start group 20
        0x08, 0x05, // field 1 inside the group
        0x33, 0x08, 0x0A, 0x34, // group 6 nested inside it
        0xA4, 0x01, // end group 20
    ];
    let message = Proto2Message::decode(&data).unwrap();
    assert_eq!(message.id, Some(1));
    assert_eq!(message.unknown.data(), &data[2..]);
    assert_eq!(message.encode_to_vec().unwrap(), data);
}

#[test]
fn mismatched_end_group() {
    let error = Proto2Message::decode(&[0x08, 0x01, 0x2B, 0x30, 0x20, 0x34]).unwrap_err();
    assert!(matches!(error.kind(), DecodeErrorKind::Malformed(_)), "{error}");

    let error = Proto2Message::decode(&[0x08, 0x01, 0x2C]).unwrap_err();
    assert!(matches!(error.kind(), DecodeErrorKind::Malformed(_)), "{error}");
}

#[test]
fn unterminated_group() {
    let error = Proto2Message::decode(&[0x08, 0x01, 0x2B, 0x30, 0x20]).unwrap_err();
    assert_eq!(error.kind(), &DecodeErrorKind::Truncated);

    let error = Proto2Message::decode(&[0x08, 0x01, 0xA3, 0x01, 0x08, 0x05]).unwrap_err();
    assert_eq!(error.kind(), &DecodeErrorKind::Truncated);
}

#[test]
fn group_names() {
    let message = with_data();
    assert_eq!(message.to_json().unwrap(), r#"{"id":1,"data":{"group_int32":32}}"#);
    assert_eq!(message.to_text().unwrap(), "id: 1\nData {\n  group_int32: 32\n}\n");

    assert_eq!(Proto2Message::from_text("id: 1 Data { group_int32: 32 }").unwrap(), message);
    assert_eq!(Proto2Message::from_text("id: 1 data < group_int32: 32 >").unwrap(), message);
    assert_eq!(
        Proto2Message::from_json(r#"{"id":1,"data":{"group_int32":32}}"#).unwrap(),
        message
    );
}

#[test]
fn repeated_groups_merge() {
    let mut bytes = with_data().encode_to_vec().unwrap();
    bytes.extend([0x2B, 0x3A, 0x01, b'x', 0x2C]);
    let message = Proto2Message::decode(&bytes).unwrap();
    assert_eq!(
        message.data,
        Some(Data {
            group_int32: Some(32),
            group_string: Some("x".to_owned()),
            ..Data::default()
        })
    );
}
