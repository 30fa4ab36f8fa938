use crate::{DecodeError, EncodeError};

/// Why JSON input could not be decoded.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum JsonDecodeError {
    #[error("unexpected end of JSON input")]
    Truncated,
    #[error("unexpected data after the JSON value")]
    TrailingGarbage,
    #[error("malformed JSON")]
    Malformed,
    #[error("malformed JSON number")]
    MalformedNumber,
    #[error("JSON numbers may not have leading zeros")]
    LeadingZero,
    #[error("JSON number out of range for the field type")]
    NumberRange,
    #[error("malformed JSON string")]
    MalformedString,
    #[error("malformed JSON boolean")]
    MalformedBool,
    #[error("malformed JSON map")]
    MalformedMap,
    #[error("JSON map keys must be quoted")]
    UnquotedMapKey,
    #[error("malformed google.protobuf.Duration")]
    MalformedDuration,
    #[error("malformed google.protobuf.Timestamp")]
    MalformedTimestamp,
    #[error("malformed google.protobuf.FieldMask")]
    MalformedFieldMask,
    #[error("null is not allowed here")]
    IllegalNull,
    #[error("unrecognized enum value")]
    UnrecognizedEnumValue,
    #[error("unknown field `{0}`")]
    UnknownField(String),
    #[error("more than one member of a oneof is set")]
    ConflictingOneof,
    #[error("message nesting exceeds the depth limit")]
    DepthLimitExceeded,
    #[error("message type has no field names")]
    MissingFieldNames,
    #[error("required fields are missing")]
    MissingRequiredFields,
    #[error("JSON value does not match the message schema")]
    SchemaMismatch,
    #[error("google.protobuf.Any has a missing or invalid @type")]
    InvalidAnyTypeUrl,
    #[error(transparent)]
    Binary(#[from] DecodeError),
}

/// Why a message could not be written as JSON.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum JsonEncodeError {
    #[error("google.protobuf.Any payload of an unregistered type cannot be transcoded")]
    AnyTranscodeFailure,
    #[error("google.protobuf.Duration out of range")]
    DurationRange,
    #[error("google.protobuf.Timestamp out of range")]
    TimestampRange,
    #[error("google.protobuf.FieldMask path has no JSON form")]
    FieldMaskConversion,
    #[error("message type has no field names")]
    MissingFieldNames,
    #[error("google.protobuf.Value has no kind set")]
    MissingValue,
    #[error("google.protobuf.Value numbers must be finite")]
    ValueNumberNotFinite,
    #[error(transparent)]
    Binary(EncodeError),
}

impl From<EncodeError> for JsonEncodeError {
    fn from(error: EncodeError) -> JsonEncodeError {
        match error {
            EncodeError::AnyTranscodeFailure => JsonEncodeError::AnyTranscodeFailure,
            error => JsonEncodeError::Binary(error),
        }
    }
}
