//! Integration tests for `protokit` and `protokit-types`, run against hand-written messages
//! shaped like generated code.

pub mod proto2;
pub mod proto3;

#[cfg(test)]
mod delimited;
#[cfg(test)]
mod extensions;
#[cfg(test)]
mod field_mask;
#[cfg(test)]
mod groups;
#[cfg(test)]
mod json_mapping;
#[cfg(test)]
mod message_encoding;
#[cfg(test)]
mod text_format;
#[cfg(test)]
mod well_known_types;

use anyhow::anyhow;
use protokit::{
    BinaryEncodingOptions, DecodeError, JsonEncodingOptions, Message, TextFormatEncodingOptions,
};

pub enum RoundtripResult {
    /// The roundtrip succeeded.
    Ok(Vec<u8>),
    /// The data could not be decoded. This could indicate a bug in protokit,
    /// or it could indicate that the input was bogus.
    DecodeError(DecodeError),
    /// Re-encoding or validating the data failed.  This indicates a bug in `protokit`.
    Error(anyhow::Error),
}

impl RoundtripResult {
    /// Unwrap the roundtrip result.
    pub fn unwrap(self) -> Vec<u8> {
        match self {
            RoundtripResult::Ok(buf) => buf,
            RoundtripResult::DecodeError(error) => {
                panic!("failed to decode the roundtrip data: {error}")
            }
            RoundtripResult::Error(error) => panic!("failed roundtrip: {error}"),
        }
    }

    /// Unwrap the roundtrip result. Panics if the result was a validation or re-encoding error.
    pub fn unwrap_error(self) -> Result<Vec<u8>, DecodeError> {
        match self {
            RoundtripResult::Ok(buf) => Ok(buf),
            RoundtripResult::DecodeError(error) => Err(error),
            RoundtripResult::Error(error) => panic!("failed roundtrip: {error}"),
        }
    }
}

/// Decodes `data` as an `M`, then checks that the binary, JSON and text forms of the result all
/// decode back to it.
pub fn roundtrip<M: Message>(data: &[u8]) -> RoundtripResult {
    let message = match M::decode(data) {
        Ok(message) => message,
        Err(error) => return RoundtripResult::DecodeError(error),
    };
    match check_formats(&message) {
        Ok(buf) => RoundtripResult::Ok(buf),
        Err(error) => RoundtripResult::Error(error),
    }
}

fn check_formats<M: Message>(message: &M) -> anyhow::Result<Vec<u8>> {
    let options = BinaryEncodingOptions::default().with_deterministic_ordering(true);
    let encoded_len = message.encoded_len()?;
    let buf = message.encode_with(&options, false)?;
    if buf.len() != encoded_len {
        return Err(anyhow!(
            "encoded_len was {encoded_len}, but encoded message length is {}",
            buf.len()
        ));
    }
    let reverse = protokit::binary::encode_reverse(message, &options)?;
    if reverse != buf {
        return Err(anyhow!("forward and reverse encodings differ"));
    }
    let decoded = M::decode(&buf)?;
    if decoded.encode_with(&options, false)? != buf {
        return Err(anyhow!("binary roundtrip changed the message"));
    }

    // JSON and text are compared as text: NaN never compares equal, and unknown fields have no
    // JSON form.
    let json_options = JsonEncodingOptions::default().with_deterministic_ordering(true);
    match message.to_json_with(&json_options) {
        Ok(json) => {
            let from_json = M::from_json(&json).map_err(|error| anyhow!("{error}: {json}"))?;
            let again = from_json.to_json_with(&json_options)?;
            if again != json {
                return Err(anyhow!("JSON roundtrip changed the message: {json} became {again}"));
            }
        }
        Err(error) => log::debug!("{} has no JSON form: {error}", M::NAME),
    }

    let text_options = TextFormatEncodingOptions::default().with_print_unknown_fields(false);
    let text = message.to_text_with(&text_options)?;
    let from_text = M::from_text(&text).map_err(|error| anyhow!("{error}: {text}"))?;
    let again = from_text.to_text_with(&text_options)?;
    if again != text {
        return Err(anyhow!("text roundtrip changed the message: {text} became {again}"));
    }
    Ok(buf)
}

/// Asserts that `message` survives a trip through every format.
pub fn check_message<M: Message>(message: &M) {
    let buf = message.encode_to_vec().expect("encode");
    assert_eq!(buf.len(), message.encoded_len().expect("encoded_len"));
    roundtrip::<M>(&buf).unwrap();
}

/// Asserts that two message types write the same bytes for the same values.
pub fn check_serialize_equivalent<M: Message, N: Message>(m: &M, n: &N) {
    assert_eq!(m.encode_to_vec().unwrap(), n.encode_to_vec().unwrap());
}

#[cfg(test)]
pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
