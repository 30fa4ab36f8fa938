//! The binary wire format.

mod decoder;
pub mod delimited;
mod encoder;
mod options;
mod reverse;

use bytes::BufMut;

pub use decoder::BinaryDecoder;
pub use delimited::{read_delimited, write_delimited, DelimitedError, DelimitedReader};
pub use encoder::{BinaryEncodingVisitor, SizeVisitor};
pub use options::{BinaryDecodingOptions, BinaryEncodingOptions};
pub use reverse::{BinaryReverseEncodingVisitor, ReverseEncoder};

use crate::extensions::ExtensionRegistry;
use crate::{DecodeError, DecodeErrorKind, EncodeError, Message};

/// The encoded length of `message`, without a length prefix.
pub fn encoded_len<M: Message>(message: &M) -> Result<usize, EncodeError> {
    let mut visitor = SizeVisitor::new();
    message.traverse(&mut visitor)?;
    if visitor.len() > i32::MAX as usize {
        return Err(EncodeError::TooLarge);
    }
    Ok(visitor.len())
}

/// Writes the fields of `message` without checking capacity or required fields.
pub fn encode_raw<M: Message, B: BufMut>(
    message: &M,
    buf: B,
    options: &BinaryEncodingOptions,
) -> Result<(), EncodeError> {
    let mut visitor = BinaryEncodingVisitor::new(buf, *options);
    message.traverse(&mut visitor)
}

/// Encodes `message` back to front, without a size pass.
pub fn encode_reverse<M: Message>(
    message: &M,
    options: &BinaryEncodingOptions,
) -> Result<Vec<u8>, EncodeError> {
    if !message.is_initialized() {
        return Err(EncodeError::MissingRequiredFields);
    }
    let mut encoder = ReverseEncoder::new();
    let mut visitor = BinaryReverseEncodingVisitor::new(&mut encoder, *options);
    message.traverse(&mut visitor)?;
    visitor.finish();
    Ok(encoder.into_vec())
}

/// Decodes `data` into `message`, merging with what is already set.
pub fn merge<M: Message>(
    message: &mut M,
    data: &[u8],
    extensions: Option<&ExtensionRegistry>,
    partial: bool,
    options: &BinaryDecodingOptions,
) -> Result<(), DecodeError> {
    log::trace!("decoding {} from {} bytes", M::NAME, data.len());
    let mut decoder = BinaryDecoder::new::<M>(data, extensions, *options)?;
    message.decode_message(&mut decoder)?;
    decoder.finish(message);
    if !partial && !message.is_initialized() {
        return Err(DecodeError::new(DecodeErrorKind::MissingRequiredFields));
    }
    Ok(())
}
