use protokit::extensions::Optional;
use protokit::field_types::{Int32Type, StringType};
use protokit::{
    BinaryDecodingOptions, Extension, JsonDecodeError, JsonDecodingOptions, Message,
    TextDecodeError, TextFormatDecodingOptions,
};

use crate::check_message;
use crate::proto2::{
    extension_registry, Color, Proto2Message, EXT_CHILD, EXT_COLOR, EXT_COUNT, EXT_TAGS,
};

static EXT_MISTYPED: Extension<Optional<StringType>> = Extension::new(
    100,
    "protokit_test.proto2.ext_mistyped",
    "protokit_test.proto2.Proto2Message",
);

static EXT_SHADOW: Extension<Optional<Int32Type>> = Extension::new(
    100,
    "protokit_test.proto2.ext_shadow",
    "protokit_test.proto2.Proto2Message",
);

fn extended() -> Proto2Message {
    let mut message = Proto2Message::with_id(1);
    message.extensions.set(&EXT_COUNT, 4);
    message
        .extensions
        .set(&EXT_TAGS, vec!["a".to_owned(), "b".to_owned()]);
    message
}

#[test]
fn accessors() {
    let mut message = extended();
    assert!(message.extensions.has(&EXT_COUNT));
    assert!(!message.extensions.has(&EXT_COLOR));
    assert_eq!(message.extensions.len(), 2);
    assert_eq!(message.extensions.get(&EXT_TAGS).map(Vec::len), Some(2));

    *message.extensions.get_mut(&EXT_COUNT).unwrap() += 1;
    assert_eq!(message.extensions.get(&EXT_COUNT), Some(&5));

    assert!(!message.extensions.has(&EXT_MISTYPED));
    let mismatch = message.extensions.try_get(&EXT_MISTYPED).unwrap_err();
    assert_eq!(mismatch.field_number, 100);
    assert_eq!(mismatch.stored, "protokit_test.proto2.ext_count");
    assert_eq!(message.extensions.get(&EXT_MISTYPED), None);

    // Same number and type, different extension.
    assert!(message.extensions.get_mut(&EXT_SHADOW).is_none());
    assert_eq!(message.extensions.get(&EXT_SHADOW), None);
    assert_eq!(message.extensions.get(&EXT_COUNT), Some(&5));

    // Clearing through an extension that does not own the number leaves the value alone.
    message.extensions.clear(&EXT_MISTYPED);
    assert!(message.extensions.has(&EXT_COUNT));
    message.extensions.clear(&EXT_COUNT);
    assert!(!message.extensions.has(&EXT_COUNT));
    assert_eq!(message.extensions.len(), 1);
}

#[test]
fn binary_with_registry() {
    let message = extended();
    let bytes = message.encode_to_vec().unwrap();
    assert_eq!(
        bytes,
        [0x08, 0x01, 0xA0, 0x06, 0x04, 0xAA, 0x06, 0x01, b'a', 0xAA, 0x06, 0x01, b'b']
    );

    let registry = extension_registry();
    let options = BinaryDecodingOptions::default();
    let decoded = Proto2Message::decode_with(&bytes, Some(&registry), false, &options).unwrap();
    assert_eq!(decoded, message);
    assert!(decoded.unknown.is_empty());
}

#[test]
fn binary_without_registry() {
    let bytes = extended().encode_to_vec().unwrap();
    let decoded = Proto2Message::decode(&bytes).unwrap();
    assert!(decoded.extensions.is_empty());
    assert_eq!(decoded.unknown.data(), &bytes[2..]);
    assert_eq!(decoded.encode_to_vec().unwrap(), bytes);
}

#[test]
fn message_and_enum_extensions() {
    let mut message = Proto2Message::with_id(1);
    message.extensions.set(&EXT_COLOR, Color::Blue);
    message.extensions.set(&EXT_CHILD, Proto2Message::with_id(2));

    let registry = extension_registry();
    let bytes = message.encode_to_vec().unwrap();
    let decoded =
        Proto2Message::decode_with(&bytes, Some(&registry), false, &BinaryDecodingOptions::default())
            .unwrap();
    assert_eq!(decoded.extensions.get(&EXT_COLOR), Some(&Color::Blue));
    assert_eq!(decoded.extensions.get(&EXT_CHILD).and_then(|child| child.id), Some(2));

    // An extension message missing its required field makes the whole message uninitialized.
    message.extensions.set(&EXT_CHILD, Proto2Message::default());
    assert!(!message.is_initialized());
    assert!(message.encode_to_vec().is_err());
}

#[test]
fn json_extensions() {
    let message = extended();
    let json = message.to_json().unwrap();
    assert_eq!(
        json,
        r#"{"id":1,"[protokit_test.proto2.ext_count]":4,"[protokit_test.proto2.ext_tags]":["a","b"]}"#
    );

    let registry = extension_registry();
    let options = JsonDecodingOptions::default();
    assert_eq!(
        Proto2Message::from_json_with(&json, &options, Some(&registry)).unwrap(),
        message
    );
    assert_eq!(
        Proto2Message::from_json(&json),
        Err(JsonDecodeError::UnknownField(
            "[protokit_test.proto2.ext_count]".to_owned()
        ))
    );
}

#[test]
fn text_extensions() {
    let mut message = extended();
    message.extensions.set(&EXT_CHILD, Proto2Message::with_id(2));
    let text = message.to_text().unwrap();
    assert_eq!(
        text,
        concat!(
            "id: 1\n",
            "[protokit_test.proto2.ext_count]: 4\n",
            "[protokit_test.proto2.ext_tags]: \"a\"\n",
            "[protokit_test.proto2.ext_tags]: \"b\"\n",
            "[protokit_test.proto2.ext_child] {\n",
            "  id: 2\n",
            "}\n",
        )
    );

    let registry = extension_registry();
    let options = TextFormatDecodingOptions::default();
    assert_eq!(
        Proto2Message::from_text_with(&text, &options, Some(&registry)).unwrap(),
        message
    );
    assert_eq!(
        Proto2Message::from_text(&text),
        Err(TextDecodeError::UnknownExtension(
            "protokit_test.proto2.ext_count".to_owned()
        ))
    );

    let lenient = options.with_ignore_unknown_extension_fields(true);
    assert_eq!(
        Proto2Message::from_text_with(&text, &lenient, None).unwrap(),
        Proto2Message::with_id(1)
    );
}

#[test]
fn registry_lookups() {
    let registry = extension_registry();
    assert_eq!(registry.len(), 4);
    assert!(registry.find("protokit_test.proto2.Proto2Message", 101).is_some());
    assert!(registry.find("protokit_test.proto2.Proto2Message", 150).is_none());
    assert!(registry.find("protokit_test.TestAllTypes", 101).is_none());
    assert!(registry
        .find_by_name("protokit_test.proto2.Proto2Message", "protokit_test.proto2.ext_color")
        .is_some());
}

#[test]
fn round_trips() {
    let mut message = extended();
    message.extensions.set(&EXT_COLOR, Color::Green);
    let bytes = message.encode_to_vec().unwrap();
    let registry = extension_registry();
    let decoded =
        Proto2Message::decode_with(&bytes, Some(&registry), false, &BinaryDecodingOptions::default())
            .unwrap();
    assert_eq!(decoded.hash_value(), message.hash_value());
    check_message(&Proto2Message::decode(&bytes).unwrap());
}
