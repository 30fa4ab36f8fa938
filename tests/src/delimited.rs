use std::io::Cursor;

use protokit::binary::delimited::read_delimited_with;
use protokit::binary::{read_delimited, write_delimited, DelimitedError, DelimitedReader};
use protokit::{BinaryDecodingOptions, DecodeErrorKind, Message};

use crate::proto2::{self, Proto2Message};
use crate::proto3::TestAllTypes;

fn records() -> Vec<TestAllTypes> {
    vec![
        TestAllTypes {
            optional_int32: 1,
            ..TestAllTypes::default()
        },
        TestAllTypes::default(),
        TestAllTypes {
            optional_string: "x".repeat(300),
            ..TestAllTypes::default()
        },
    ]
}

#[test]
fn stream_of_messages() {
    crate::init_logging();
    let mut stream = Vec::new();
    for record in records() {
        write_delimited(&record, &mut stream).unwrap();
    }
    assert_eq!(&stream[..4], [0x02, 0x08, 0x01, 0x00]);

    let decoded = DelimitedReader::<_, TestAllTypes>::new(Cursor::new(&stream))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(decoded, records());

    let mut reader = Cursor::new(&stream);
    for record in records() {
        assert_eq!(read_delimited::<TestAllTypes>(&mut reader).unwrap(), Some(record));
    }
    assert_eq!(read_delimited::<TestAllTypes>(&mut reader).unwrap(), None);
}

#[test]
fn empty_stream() {
    assert_eq!(read_delimited::<TestAllTypes>(&mut Cursor::new(b"")).unwrap(), None);
    assert_eq!(
        DelimitedReader::<_, TestAllTypes>::new(Cursor::new(b"")).count(),
        0
    );
}

#[test]
fn truncated_records() {
    // The length says three bytes, two follow.
    let result = read_delimited::<TestAllTypes>(&mut Cursor::new([0x03, 0x08, 0x01]));
    assert!(matches!(result, Err(DelimitedError::Truncated)));

    // The stream ends inside the length prefix.
    let result = read_delimited::<TestAllTypes>(&mut Cursor::new([0xAC]));
    assert!(matches!(result, Err(DelimitedError::Truncated)));

    // A huge declared length with a short body is truncated, not an allocation of the
    // declared size.
    let result =
        read_delimited::<TestAllTypes>(&mut Cursor::new([0x80, 0x80, 0x80, 0x80, 0x04, 0x08, 0x01]));
    assert!(matches!(result, Err(DelimitedError::Truncated)));

    // Iteration stops after the first error.
    let mut reader =
        DelimitedReader::<_, TestAllTypes>::new(Cursor::new([0x02, 0x08, 0x01, 0x05, 0x08]));
    assert!(reader.next().unwrap().is_ok());
    assert!(reader.next().unwrap().is_err());
    assert!(reader.next().is_none());
}

#[test]
fn bad_record_contents() {
    let result = read_delimited::<TestAllTypes>(&mut Cursor::new([0x03, 0x72, 0x01, 0xFF]));
    match result {
        Err(DelimitedError::Decode(error)) => assert_eq!(error.kind(), &DecodeErrorKind::InvalidUtf8),
        other => panic!("unexpected result: {other:?}"),
    }

    // A length past 2GiB is refused before anything is read.
    let result =
        read_delimited::<TestAllTypes>(&mut Cursor::new([0xFF, 0xFF, 0xFF, 0xFF, 0x0F]));
    assert!(matches!(result, Err(DelimitedError::TooLarge)));
}

#[test]
fn required_fields_and_extensions() {
    let mut stream = Vec::new();
    let mut message = Proto2Message::with_id(9);
    message.extensions.set(&proto2::EXT_COUNT, 4);
    write_delimited(&message, &mut stream).unwrap();

    let registry = proto2::extension_registry();
    let decoded: Proto2Message = read_delimited_with(
        &mut Cursor::new(&stream),
        Some(&registry),
        false,
        &BinaryDecodingOptions::default(),
    )
    .unwrap()
    .unwrap();
    assert_eq!(decoded.extensions.get(&proto2::EXT_COUNT), Some(&4));

    let result = write_delimited(&Proto2Message::default(), &mut Vec::new());
    assert!(matches!(result, Err(DelimitedError::Encode(_))));

    let result = read_delimited::<Proto2Message>(&mut Cursor::new([0x00]));
    match result {
        Err(DelimitedError::Decode(error)) => {
            assert_eq!(error.kind(), &DecodeErrorKind::MissingRequiredFields)
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(Proto2Message::with_id(9).encode_to_vec().unwrap(), [0x08, 0x09]);
}
