//! Binary codec error types.

use std::borrow::Cow;
use std::fmt;

/// The reason a binary decode failed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    /// The input ended in the middle of a field.
    #[error("unexpected end of input")]
    Truncated,
    /// Bytes remained after the message should have ended.
    #[error("trailing data after the end of the message")]
    TrailingGarbage,
    /// A string field did not hold valid UTF-8.
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,
    /// The input is not valid protobuf: a bad varint, tag, length or group.
    #[error("malformed protobuf data: {0}")]
    Malformed(Cow<'static, str>),
    /// Nested messages went deeper than the configured limit.
    #[error("message nesting exceeds the depth limit")]
    DepthLimitExceeded,
    /// A proto2 required field was never set.
    #[error("required fields are missing")]
    MissingRequiredFields,
    /// An `Any` held a different message type than the one requested.
    #[error("expected type URL {expected:?}, got {actual:?}")]
    TypeUrlMismatch { expected: String, actual: String },
}

/// A Protobuf message decoding error.
///
/// `DecodeError` indicates that the input buffer does not contain a valid
/// Protobuf message. The error details should be considered 'best effort': in
/// general it is not possible to exactly pinpoint why data is malformed.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodeError {
    inner: Box<Inner>,
}

#[derive(Clone, PartialEq, Eq)]
struct Inner {
    kind: DecodeErrorKind,
    /// A 'call stack' of field names to the error, innermost last.
    stack: Vec<(&'static str, &'static str)>,
}

impl DecodeError {
    /// Creates a new `DecodeError` of the given kind.
    #[cold]
    pub fn new(kind: DecodeErrorKind) -> DecodeError {
        DecodeError {
            inner: Box::new(Inner {
                kind,
                stack: Vec::new(),
            }),
        }
    }

    #[cold]
    pub fn truncated() -> DecodeError {
        DecodeError::new(DecodeErrorKind::Truncated)
    }

    #[cold]
    pub fn malformed(reason: impl Into<Cow<'static, str>>) -> DecodeError {
        DecodeError::new(DecodeErrorKind::Malformed(reason.into()))
    }

    pub fn kind(&self) -> &DecodeErrorKind {
        &self.inner.kind
    }

    /// Pushes a (message, field) name location pair on to the location stack.
    ///
    /// Meant to be used only by `Message` implementations.
    #[doc(hidden)]
    pub fn push(&mut self, message: &'static str, field: &'static str) {
        self.inner.stack.push((message, field));
    }
}

impl From<DecodeErrorKind> for DecodeError {
    fn from(kind: DecodeErrorKind) -> Self {
        DecodeError::new(kind)
    }
}

impl fmt::Debug for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeError")
            .field("kind", &self.inner.kind)
            .field("stack", &self.inner.stack)
            .finish()
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("failed to decode Protobuf message: ")?;
        for &(message, field) in self.inner.stack.iter().rev() {
            write!(f, "{message}.{field}: ")?;
        }
        write!(f, "{}", self.inner.kind)
    }
}

impl std::error::Error for DecodeError {}

impl From<DecodeError> for std::io::Error {
    fn from(error: DecodeError) -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::InvalidData, error)
    }
}

/// A Protobuf message encoding error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum EncodeError {
    /// The output buffer cannot hold the encoded message.
    #[error("insufficient buffer capacity (required: {required}, remaining: {remaining})")]
    InsufficientCapacity { required: usize, remaining: usize },
    /// A proto2 required field was never set and partial encoding was not requested.
    #[error("required fields are missing")]
    MissingRequiredFields,
    /// An `Any` holds JSON that cannot be converted without a registered type.
    #[error("Any payload cannot be transcoded to binary")]
    AnyTranscodeFailure,
    /// The encoded message would exceed 2GiB.
    #[error("message is too large to encode")]
    TooLarge,
}

impl EncodeError {
    /// Creates a new `EncodeError`.
    pub(crate) fn new(required: usize, remaining: usize) -> EncodeError {
        EncodeError::InsufficientCapacity {
            required,
            remaining,
        }
    }

    /// Returns the required buffer capacity to encode the message, if this
    /// is a capacity error.
    pub fn required_capacity(&self) -> Option<usize> {
        match *self {
            EncodeError::InsufficientCapacity { required, .. } => Some(required),
            _ => None,
        }
    }

    /// Returns the remaining length in the provided buffer at the time of encoding.
    pub fn remaining(&self) -> Option<usize> {
        match *self {
            EncodeError::InsufficientCapacity { remaining, .. } => Some(remaining),
            _ => None,
        }
    }
}

impl From<EncodeError> for std::io::Error {
    fn from(error: EncodeError) -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, error)
    }
}
