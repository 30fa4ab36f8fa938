use crate::{DecodeError, EncodeError};

/// Why text format input could not be decoded.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TextDecodeError {
    #[error("unexpected end of text format input")]
    Truncated,
    #[error("unexpected data after the message")]
    TrailingGarbage,
    #[error("malformed text format")]
    Malformed,
    #[error("malformed number")]
    MalformedNumber,
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,
    #[error("unrecognized enum value")]
    UnrecognizedEnumValue,
    #[error("unknown field `{0}`")]
    UnknownField(String),
    #[error("unknown extension `[{0}]`")]
    UnknownExtension(String),
    #[error("google.protobuf.Any type `{0}` is not registered")]
    UnregisteredAnyType(String),
    #[error("more than one member of a oneof is set")]
    ConflictingOneof,
    #[error("message nesting exceeds the depth limit")]
    DepthLimitExceeded,
    #[error("required fields are missing")]
    MissingRequiredFields,
    #[error(transparent)]
    Binary(#[from] DecodeError),
}

/// Why a message could not be written in the text format.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TextEncodeError {
    #[error("message type has no field names")]
    MissingFieldNames,
    #[error(transparent)]
    Binary(#[from] EncodeError),
}
