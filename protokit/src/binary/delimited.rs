//! Streams of length-prefixed messages.
//!
//! Each record is a varint length followed by that many bytes of one binary message. A stream
//! ends at end of input; a zero-length record holds a message with every field at its default.

use std::io::{self, Read, Write};
use std::marker::PhantomData;

use crate::binary::BinaryDecodingOptions;
use crate::extensions::ExtensionRegistry;
use crate::{DecodeError, EncodeError, Message};

#[derive(Debug, thiserror::Error)]
pub enum DelimitedError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// The stream ended inside a length prefix or a record.
    #[error("stream ended in the middle of a record")]
    Truncated,
    /// A length prefix exceeded 2GiB.
    #[error("record length exceeds 2GiB")]
    TooLarge,
}

/// Writes `message` with its length prefix.
pub fn write_delimited<M: Message>(message: &M, writer: &mut impl Write) -> Result<(), DelimitedError> {
    let buf = message.encode_length_delimited_to_vec()?;
    writer.write_all(&buf)?;
    Ok(())
}

/// Reads the next record, or `None` at the end of the stream.
pub fn read_delimited<M: Message>(reader: &mut impl Read) -> Result<Option<M>, DelimitedError> {
    read_delimited_with(reader, None, false, &BinaryDecodingOptions::default())
}

pub fn read_delimited_with<M: Message>(
    reader: &mut impl Read,
    extensions: Option<&ExtensionRegistry>,
    partial: bool,
    options: &BinaryDecodingOptions,
) -> Result<Option<M>, DelimitedError> {
    let Some(len) = read_length(reader)? else {
        return Ok(None);
    };
    if len > i32::MAX as u64 {
        return Err(DelimitedError::TooLarge);
    }
    // The buffer grows with the data actually read, not with the declared length.
    let mut buf = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut buf)?;
    if (buf.len() as u64) < len {
        return Err(DelimitedError::Truncated);
    }
    log::trace!("read {} byte record of {}", len, M::NAME);
    Ok(Some(M::decode_with(&buf, extensions, partial, options)?))
}

/// Reads a varint length one byte at a time. `None` means the stream ended before the first
/// byte.
fn read_length(reader: &mut impl Read) -> Result<Option<u64>, DelimitedError> {
    let mut value = 0u64;
    for count in 0..10 {
        let mut byte = [0u8];
        loop {
            match reader.read(&mut byte) {
                Ok(0) if count == 0 => return Ok(None),
                Ok(0) => return Err(DelimitedError::Truncated),
                Ok(_) => break,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(error.into()),
            }
        }
        let byte = byte[0];
        if count == 9 && byte > 0x01 {
            break;
        }
        value |= u64::from(byte & 0x7F) << (count * 7);
        if byte < 0x80 {
            return Ok(Some(value));
        }
    }
    Err(DecodeError::malformed("invalid varint").into())
}

/// An iterator over the records of a stream.
///
/// Iteration ends at the end of the stream or after the first error.
pub struct DelimitedReader<R, M> {
    reader: R,
    done: bool,
    _message: PhantomData<fn() -> M>,
}

impl<R: Read, M: Message> DelimitedReader<R, M> {
    pub fn new(reader: R) -> DelimitedReader<R, M> {
        DelimitedReader {
            reader,
            done: false,
            _message: PhantomData,
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read, M: Message> Iterator for DelimitedReader<R, M> {
    type Item = Result<M, DelimitedError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = read_delimited(&mut self.reader).transpose();
        if !matches!(result, Some(Ok(_))) {
            self.done = true;
        }
        result
    }
}
