use std::collections::HashMap;

use proptest::prelude::*;
use protokit::{FieldMaskError, MergeOptions, Message};
use protokit_types::FieldMask;

use crate::proto2::{Data, Proto2Message};
use crate::proto3::{NestedEnum, NestedMessage, OneofField, TestAllTypes};

fn nested(a: i32) -> NestedMessage {
    NestedMessage {
        a,
        corecursive: None,
    }
}

fn sample() -> TestAllTypes {
    TestAllTypes {
        optional_int32: 7,
        optional_string: "seven".to_owned(),
        optional_double: 1.5,
        optional_nested_enum: NestedEnum::Baz,
        proto3_optional_int32: Some(0),
        optional_nested_message: Some(nested(3)),
        repeated_int32: vec![1, 2],
        repeated_string: vec!["x".to_owned()],
        map_string_int32: HashMap::from([("a".to_owned(), 1), ("b".to_owned(), 2)]),
        ..TestAllTypes::default()
    }
}

fn not_found(path: &str) -> Result<(), FieldMaskError> {
    Err(FieldMaskError::PathNotFound(path.to_owned()))
}

#[test]
fn masking_clears_fields() {
    let mut message = sample();
    message
        .mask(&[
            "optional_int32",
            "repeated_string",
            "proto3_optional_int32",
            "optional_nested_enum",
            "map_string_int32",
        ])
        .unwrap();
    assert_eq!(
        message,
        TestAllTypes {
            optional_string: "seven".to_owned(),
            optional_double: 1.5,
            optional_nested_message: Some(nested(3)),
            repeated_int32: vec![1, 2],
            ..TestAllTypes::default()
        }
    );

    let original = sample();
    let masked = original.masked(&["optional_nested_message"]).unwrap();
    assert_eq!(masked.optional_nested_message, None);
    assert_eq!(original.optional_nested_message, Some(nested(3)));
}

#[test]
fn nested_paths() {
    let mut message = sample();
    message.mask(&["optional_nested_message.a"]).unwrap();
    assert_eq!(message.optional_nested_message, Some(nested(0)));

    // Missing parents are created on the way down.
    let source = TestAllTypes {
        optional_nested_message: Some(NestedMessage {
            a: 9,
            corecursive: Some(Box::new(TestAllTypes {
                optional_string: "deep".to_owned(),
                optional_int32: 4,
                ..TestAllTypes::default()
            })),
        }),
        ..TestAllTypes::default()
    };
    let target = TestAllTypes::default()
        .overridden(
            &source,
            &["optional_nested_message.corecursive.optional_string"],
            &MergeOptions::default(),
        )
        .unwrap();
    assert_eq!(
        target.optional_nested_message,
        Some(NestedMessage {
            a: 0,
            corecursive: Some(Box::new(TestAllTypes {
                optional_string: "deep".to_owned(),
                ..TestAllTypes::default()
            })),
        })
    );

    // A whole message is replaced, not merged.
    let mut target = TestAllTypes {
        optional_nested_message: Some(NestedMessage {
            a: 1,
            corecursive: Some(Box::default()),
        }),
        ..TestAllTypes::default()
    };
    let source = TestAllTypes {
        optional_nested_message: Some(nested(2)),
        ..TestAllTypes::default()
    };
    target
        .override_with(&source, &["optional_nested_message"], &MergeOptions::default())
        .unwrap();
    assert_eq!(target.optional_nested_message, Some(nested(2)));
}

#[test]
fn fields_unset_in_the_source_are_cleared() {
    let target = sample()
        .overridden(
            &TestAllTypes::default(),
            &["optional_string", "proto3_optional_int32", "optional_nested_message.a"],
            &MergeOptions::default(),
        )
        .unwrap();
    assert_eq!(target.optional_string, "");
    assert_eq!(target.proto3_optional_int32, None);
    assert_eq!(target.optional_nested_message, Some(nested(0)));
    assert_eq!(target.optional_int32, 7);
}

#[test]
fn invalid_paths() {
    let mut message = sample();
    assert_eq!(message.mask(&["missing"]), not_found("missing"));
    assert_eq!(message.mask(&[""]), not_found(""));
    assert_eq!(message.mask(&["optionalInt32"]), not_found("optionalInt32"));
    assert_eq!(message.mask(&["optional_int32.a"]), not_found("optional_int32.a"));
    assert_eq!(
        message.mask(&["optional_nested_message.b"]),
        not_found("optional_nested_message.b")
    );
    assert_eq!(
        message.mask(&["repeated_nested_message.a"]),
        not_found("repeated_nested_message.a")
    );
    assert_eq!(
        message.override_with(&sample(), &["optional_string."], &MergeOptions::default()),
        not_found("optional_string.")
    );

    // A failing path leaves the message untouched, even after valid ones.
    assert_eq!(
        message.mask(&["optional_int32", "missing"]),
        not_found("missing")
    );
    assert_eq!(message, sample());
}

#[test]
fn repeated_fields_append_or_replace() {
    let source = TestAllTypes {
        repeated_int32: vec![3],
        repeated_nested_message: vec![nested(30)],
        map_string_int32: HashMap::from([("b".to_owned(), 20), ("c".to_owned(), 30)]),
        ..TestAllTypes::default()
    };
    let target = TestAllTypes {
        repeated_nested_message: vec![nested(10)],
        ..sample()
    };
    let paths = ["repeated_int32", "repeated_nested_message", "map_string_int32"];

    let appended = target
        .overridden(&source, &paths, &MergeOptions::default())
        .unwrap();
    assert_eq!(appended.repeated_int32, [1, 2, 3]);
    assert_eq!(appended.repeated_nested_message, [nested(10), nested(30)]);
    assert_eq!(
        appended.map_string_int32,
        HashMap::from([
            ("a".to_owned(), 1),
            ("b".to_owned(), 20),
            ("c".to_owned(), 30)
        ])
    );

    let options = MergeOptions::default().with_replace_repeated_fields(true);
    let replaced = target.overridden(&source, &paths, &options).unwrap();
    assert_eq!(replaced.repeated_int32, [3]);
    assert_eq!(replaced.repeated_nested_message, [nested(30)]);
    assert_eq!(replaced.map_string_int32, source.map_string_int32);

    // An empty source field still appends nothing, or clears when replacing.
    let kept = target
        .overridden(&TestAllTypes::default(), &["repeated_int32"], &MergeOptions::default())
        .unwrap();
    assert_eq!(kept.repeated_int32, [1, 2]);
    let cleared = target
        .overridden(&TestAllTypes::default(), &["repeated_int32"], &options)
        .unwrap();
    assert!(cleared.repeated_int32.is_empty());
}

#[test]
fn oneof_members() {
    let source = TestAllTypes {
        oneof_field: Some(OneofField::String("chosen".to_owned())),
        ..TestAllTypes::default()
    };
    let mut target = TestAllTypes {
        oneof_field: Some(OneofField::Uint32(5)),
        ..TestAllTypes::default()
    };
    target
        .override_with(&source, &["oneof_string"], &MergeOptions::default())
        .unwrap();
    assert_eq!(target.oneof_field, Some(OneofField::String("chosen".to_owned())));

    target.mask(&["oneof_string"]).unwrap();
    assert_eq!(target.oneof_field, None);

    let source = TestAllTypes {
        oneof_field: Some(OneofField::Nested(nested(8))),
        ..TestAllTypes::default()
    };
    target
        .override_with(&source, &["oneof_nested_message.a"], &MergeOptions::default())
        .unwrap();
    assert_eq!(target.oneof_field, Some(OneofField::Nested(nested(8))));
}

#[test]
fn groups_and_required_fields() {
    let source = Proto2Message {
        id: Some(2),
        data: Some(Data {
            group_int32: Some(7),
            group_string: Some("skipped".to_owned()),
            ..Data::default()
        }),
        samples: vec![-1, 1],
        ..Proto2Message::default()
    };
    let target = Proto2Message::with_id(1)
        .overridden(&source, &["data.group_int32", "samples"], &MergeOptions::default())
        .unwrap();
    assert_eq!(target.id, Some(1));
    assert_eq!(
        target.data,
        Some(Data {
            group_int32: Some(7),
            ..Data::default()
        })
    );
    assert_eq!(target.samples, [-1, 1]);

    // Masking a required field is allowed; the message is then uninitialized.
    let masked = target.masked(&["id"]).unwrap();
    assert_eq!(masked.id, None);
    assert!(!masked.is_initialized());
}

#[test]
fn field_mask_messages() {
    let mask = FieldMask::from_json(r#""optionalNestedMessage.a,repeatedInt32""#).unwrap();
    assert_eq!(mask.paths, ["optional_nested_message.a", "repeated_int32"]);
    assert!(mask.is_valid_for::<TestAllTypes>());
    assert!(!mask.is_valid_for::<Proto2Message>());
    assert!(!FieldMask::new(["optional_int32.a"]).is_valid_for::<TestAllTypes>());

    let mut message = sample();
    mask.clear(&mut message).unwrap();
    assert_eq!(message.optional_nested_message, Some(nested(0)));
    assert!(message.repeated_int32.is_empty());

    mask.copy(&mut message, &sample(), &MergeOptions::default())
        .unwrap();
    assert_eq!(message, sample());
}

proptest! {
    #[test]
    fn masked_fields_are_restored_by_overriding(
        optional_int32: i32,
        optional_string in "[a-z]{0,8}",
        repeated_int32 in proptest::collection::vec(any::<i32>(), 0..4),
        a: i32,
    ) {
        let original = TestAllTypes {
            optional_int32,
            optional_string,
            repeated_int32,
            optional_nested_message: Some(nested(a)),
            ..TestAllTypes::default()
        };
        let paths = ["optional_int32", "optional_string", "repeated_int32", "optional_nested_message.a"];
        let masked = original.masked(&paths).unwrap();
        prop_assert_eq!(masked.optional_nested_message.clone(), Some(nested(0)));
        let options = MergeOptions::default().with_replace_repeated_fields(true);
        prop_assert_eq!(masked.overridden(&original, &paths, &options).unwrap(), original);
    }
}
