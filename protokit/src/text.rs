//! The protobuf text format.
//!
//! Output puts one field per line and indents nested messages by two spaces. Fields use their
//! proto names, extensions their bracketed full names, and maps are written as repeated
//! `{ key: .. value: .. }` blocks sorted by key. Input is more permissive: `<>` may replace
//! `{}`, fields may be separated by `,` or `;`, repeated values may be given as `[a, b]` and
//! `#` starts a comment.

mod decoder;
mod encoder;
mod error;
mod options;
mod scanner;
mod visitor;

pub use decoder::TextDecoder;
pub use encoder::TextEncoder;
pub use error::{TextDecodeError, TextEncodeError};
pub use options::{TextFormatDecodingOptions, TextFormatEncodingOptions};
pub use scanner::{FieldKey, TextScanner};
pub use visitor::TextEncodingVisitor;

use crate::extensions::ExtensionRegistry;
use crate::Message;

/// Serializes `message` in the text format.
pub fn encode_to_string<M: Message>(
    message: &M,
    options: &TextFormatEncodingOptions,
) -> Result<String, TextEncodeError> {
    let mut encoder = TextEncoder::new();
    encode_message_body(message, &mut encoder, options)?;
    Ok(encoder.into_string())
}

/// Writes the lines of a message body: its custom form if it has one, otherwise its fields.
pub fn encode_message_body<M: Message>(
    message: &M,
    encoder: &mut TextEncoder,
    options: &TextFormatEncodingOptions,
) -> Result<(), TextEncodeError> {
    if let Some(custom) = message.custom_text() {
        if custom.encode_text(encoder, options)? {
            return Ok(());
        }
    }
    encode_message_fields(message, encoder, options)
}

/// Writes the fields of `message`, ignoring any custom form.
pub fn encode_message_fields<M: Message>(
    message: &M,
    encoder: &mut TextEncoder,
    options: &TextFormatEncodingOptions,
) -> Result<(), TextEncodeError> {
    let mut visitor = TextEncodingVisitor::new::<M>(encoder, options);
    message.traverse(&mut visitor)
}

/// Merges the text format message in `text` into `message`.
pub fn merge<M: Message>(
    message: &mut M,
    text: &str,
    options: &TextFormatDecodingOptions,
    extensions: Option<&ExtensionRegistry>,
) -> Result<(), TextDecodeError> {
    let mut scanner = TextScanner::new(text, options.message_depth_limit);
    scanner.enter()?;
    let mut decoder = TextDecoder::new(&mut scanner, *options, extensions, M::layout());
    if message.custom_text_mut().is_some() {
        if let Some(type_url) = decoder.scanner().next_type_url()? {
            if let Some(custom) = message.custom_text_mut() {
                custom.decode_expanded_field(&type_url, &mut decoder)?;
            }
        }
    }
    message.decode_message(&mut decoder)?;
    scanner.leave();
    if !scanner.is_at_end() {
        return Err(TextDecodeError::TrailingGarbage);
    }
    if !message.is_initialized() {
        return Err(TextDecodeError::MissingRequiredFields);
    }
    Ok(())
}
