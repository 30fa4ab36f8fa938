//! The protobuf JSON mapping.
//!
//! Field names are lowerCamelCase on output unless
//! [`JsonEncodingOptions::preserve_proto_field_names`] is set; input accepts either spelling.
//! 64-bit integers are written as strings, enums by name, bytes as standard base64 and
//! non-finite floats as the strings `"NaN"`, `"Infinity"` and `"-Infinity"`. Unknown fields are
//! never written.

mod decoder;
mod encoder;
mod error;
mod options;
mod scanner;
mod visitor;

pub use decoder::JsonDecoder;
pub use encoder::JsonEncoder;
pub use error::{JsonDecodeError, JsonEncodeError};
pub use options::{JsonDecodingOptions, JsonEncodingOptions};
pub use scanner::{JsonNumber, JsonScanner, JsonToken, NumberClass};
pub use visitor::JsonEncodingVisitor;

use crate::extensions::ExtensionRegistry;
use crate::Message;

/// Serializes `message` to a JSON string.
pub fn encode_to_string<M: Message>(
    message: &M,
    options: &JsonEncodingOptions,
) -> Result<String, JsonEncodeError> {
    let mut encoder = JsonEncoder::new();
    encode_message_value(message, &mut encoder, options)?;
    Ok(encoder.into_string())
}

/// Writes the complete JSON value of `message`: its custom form, or an object of its fields.
pub fn encode_message_value<M: Message>(
    message: &M,
    encoder: &mut JsonEncoder,
    options: &JsonEncodingOptions,
) -> Result<(), JsonEncodeError> {
    if let Some(custom) = message.custom_json() {
        return custom.encode_json(encoder, options);
    }
    encoder.start_object();
    encode_message_fields(message, encoder, options)?;
    encoder.end_object();
    Ok(())
}

/// Writes the object members for the fields of `message`, without the braces.
pub fn encode_message_fields<M: Message>(
    message: &M,
    encoder: &mut JsonEncoder,
    options: &JsonEncodingOptions,
) -> Result<(), JsonEncodeError> {
    let mut visitor = JsonEncodingVisitor::new::<M>(encoder, options);
    message.traverse(&mut visitor)
}

/// Merges the JSON object in `text` into `message`.
///
/// The whole input must be one JSON value, and every required field must be set afterwards.
pub fn merge<M: Message>(
    message: &mut M,
    text: &str,
    options: &JsonDecodingOptions,
    extensions: Option<&ExtensionRegistry>,
) -> Result<(), JsonDecodeError> {
    let mut scanner = JsonScanner::new(text, options.message_depth_limit);
    JsonDecoder::new(&mut scanner, *options, extensions, M::layout()).decode_message(message)?;
    scanner.expect_end()?;
    if !message.is_initialized() {
        return Err(JsonDecodeError::MissingRequiredFields);
    }
    Ok(())
}

/// Merges a JSON object while passing over one of its keys.
///
/// `google.protobuf.Any` stores its payload's fields next to `"@type"`, and decodes them with
/// `"@type"` skipped.
pub fn merge_skipping_key<M: Message>(
    message: &mut M,
    text: &str,
    skip_key: &'static str,
    options: &JsonDecodingOptions,
    extensions: Option<&ExtensionRegistry>,
) -> Result<(), JsonDecodeError> {
    let mut scanner = JsonScanner::new(text, options.message_depth_limit);
    scanner.enter()?;
    match scanner.next()? {
        JsonToken::BeginObject => {}
        _ => return Err(JsonDecodeError::SchemaMismatch),
    }
    let mut decoder = JsonDecoder::new(&mut scanner, *options, extensions, M::layout());
    decoder.set_skip_key(Some(skip_key));
    message.decode_message(&mut decoder)?;
    scanner.leave();
    scanner.expect_end()
}

/// Serializes a slice of messages as a JSON array.
pub fn array_to_json<M: Message>(
    messages: &[M],
    options: &JsonEncodingOptions,
) -> Result<String, JsonEncodeError> {
    let mut encoder = JsonEncoder::new();
    encoder.start_array();
    for message in messages {
        encode_message_value(message, &mut encoder, options)?;
    }
    encoder.end_array();
    Ok(encoder.into_string())
}

/// Parses a JSON array of messages.
pub fn array_from_json<M: Message>(
    text: &str,
    options: &JsonDecodingOptions,
    extensions: Option<&ExtensionRegistry>,
) -> Result<Vec<M>, JsonDecodeError> {
    let mut scanner = JsonScanner::new(text, options.message_depth_limit);
    let mut messages = Vec::new();
    scanner.expect(&JsonToken::BeginArray)?;
    if !scanner.skip_optional(&JsonToken::EndArray)? {
        loop {
            let mut message = M::default();
            JsonDecoder::new(&mut scanner, *options, extensions, M::layout())
                .decode_message(&mut message)?;
            if !message.is_initialized() {
                return Err(JsonDecodeError::MissingRequiredFields);
            }
            messages.push(message);
            if scanner.skip_optional(&JsonToken::EndArray)? {
                break;
            }
            scanner.expect(&JsonToken::Comma)?;
        }
    }
    scanner.expect_end()?;
    Ok(messages)
}
