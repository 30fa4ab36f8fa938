use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;
use std::time;

use protokit::json::{JsonDecoder, JsonEncoder, JsonToken};
use protokit::wkt::CustomJsonCodable;
use protokit::{
    Cardinality, Decoder, FieldDescriptor, FieldKind, FieldName, JsonDecodeError,
    JsonEncodeError, JsonEncodingOptions, Message, MessageLayout, Syntax, Visitor,
};

use crate::datetime::{parse_fraction, write_fraction};
use crate::NANOS_PER_SECOND;

/// About 10,000 years, the largest magnitude allowed in either direction.
pub(crate) const MAX_SECONDS: i64 = 315_576_000_000;

static FIELDS: [FieldDescriptor; 2] = [
    FieldDescriptor::new(1, FieldName::Same("seconds"), FieldKind::Int64, Cardinality::Optional),
    FieldDescriptor::new(2, FieldName::Same("nanos"), FieldKind::Int32, Cardinality::Optional),
];

static LAYOUT: MessageLayout =
    MessageLayout::new("google.protobuf.Duration", Syntax::Proto3, &FIELDS);

/// A signed span of time with nanosecond resolution: `google.protobuf.Duration`.
///
/// A valid duration has `nanos` in `(-1e9, 1e9)` with the same sign as `seconds`, and at most
/// 315,576,000,000 seconds in either direction. The JSON form is a string such as `"-1.500s"`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct Duration {
    pub seconds: i64,
    pub nanos: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum DurationError {
    #[error("failed to parse duration")]
    ParseFailure,
    #[error("duration is negative")]
    NegativeDuration(time::Duration),
    #[error("duration out of range")]
    OutOfRange,
}

impl Duration {
    pub const fn new(seconds: i64, nanos: i32) -> Duration {
        Duration { seconds, nanos }
    }

    /// Folds whole seconds out of `nanos` and gives both fields the same sign.
    ///
    /// Saturates instead of overflowing when `seconds` is already at the edge of `i64`.
    pub fn normalize(&mut self) {
        if self.nanos <= -NANOS_PER_SECOND || self.nanos >= NANOS_PER_SECOND {
            self.seconds = self
                .seconds
                .saturating_add(i64::from(self.nanos / NANOS_PER_SECOND));
            self.nanos %= NANOS_PER_SECOND;
        }
        if self.seconds > 0 && self.nanos < 0 {
            self.seconds -= 1;
            self.nanos += NANOS_PER_SECOND;
        } else if self.seconds < 0 && self.nanos > 0 {
            self.seconds += 1;
            self.nanos -= NANOS_PER_SECOND;
        }
    }

    pub fn normalized(mut self) -> Duration {
        self.normalize();
        self
    }

    pub fn is_valid(&self) -> bool {
        (-MAX_SECONDS..=MAX_SECONDS).contains(&self.seconds)
            && self.nanos > -NANOS_PER_SECOND
            && self.nanos < NANOS_PER_SECOND
            && !(self.seconds > 0 && self.nanos < 0)
            && !(self.seconds < 0 && self.nanos > 0)
    }

    /// Parses `[-]digits[.digits]s`. Fraction digits past the ninth are ignored.
    fn parse(text: &str) -> Option<Duration> {
        let text = text.strip_suffix('s')?;
        let (negative, text) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let (whole, fraction) = match text.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (text, None),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let seconds: i64 = whole.parse().ok()?;
        if seconds > MAX_SECONDS {
            return None;
        }
        let nanos = match fraction {
            Some(fraction) => parse_fraction(fraction.as_bytes())? as i32,
            None => 0,
        };
        Some(if negative {
            Duration::new(-seconds, -nanos)
        } else {
            Duration::new(seconds, nanos)
        })
    }
}

/// The JSON spelling: `1s`, `-0.500s`, `3.000001s`.
impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let normalized = self.normalized();
        if normalized.seconds < 0 || normalized.nanos < 0 {
            f.write_str("-")?;
        }
        write!(f, "{}", normalized.seconds.unsigned_abs())?;
        write_fraction(f, normalized.nanos.unsigned_abs())?;
        f.write_str("s")
    }
}

impl FromStr for Duration {
    type Err = DurationError;

    fn from_str(text: &str) -> Result<Duration, DurationError> {
        Duration::parse(text).ok_or(DurationError::ParseFailure)
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Duration) -> Duration {
        let seconds = self.seconds.saturating_add(rhs.seconds);
        let nanos = i64::from(self.nanos) + i64::from(rhs.nanos);
        let carry = nanos / i64::from(NANOS_PER_SECOND);
        Duration::new(
            seconds.saturating_add(carry),
            (nanos % i64::from(NANOS_PER_SECOND)) as i32,
        )
        .normalized()
    }
}

impl Sub for Duration {
    type Output = Duration;

    fn sub(self, rhs: Duration) -> Duration {
        self + -rhs
    }
}

impl Neg for Duration {
    type Output = Duration;

    fn neg(self) -> Duration {
        Duration::new(self.seconds.saturating_neg(), self.nanos.saturating_neg())
    }
}

impl TryFrom<time::Duration> for Duration {
    type Error = DurationError;

    fn try_from(duration: time::Duration) -> Result<Duration, DurationError> {
        let seconds = i64::try_from(duration.as_secs())
            .ok()
            .filter(|seconds| *seconds <= MAX_SECONDS)
            .ok_or(DurationError::OutOfRange)?;
        Ok(Duration::new(seconds, duration.subsec_nanos() as i32))
    }
}

impl TryFrom<Duration> for time::Duration {
    type Error = DurationError;

    /// Negative durations are rejected; the error carries their magnitude.
    fn try_from(duration: Duration) -> Result<time::Duration, DurationError> {
        let duration = duration.normalized();
        let magnitude = time::Duration::new(
            duration.seconds.unsigned_abs(),
            duration.nanos.unsigned_abs(),
        );
        if duration.seconds < 0 || duration.nanos < 0 {
            Err(DurationError::NegativeDuration(magnitude))
        } else {
            Ok(magnitude)
        }
    }
}

impl Message for Duration {
    const NAME: &'static str = "google.protobuf.Duration";

    fn layout() -> &'static MessageLayout {
        &LAYOUT
    }

    fn decode_message<D: Decoder>(&mut self, decoder: &mut D) -> Result<(), D::Error> {
        while let Some(field_number) = decoder.next_field_number()? {
            match field_number {
                1 => decoder.decode_singular_int64_field(&mut self.seconds)?,
                2 => decoder.decode_singular_int32_field(&mut self.nanos)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn traverse<V: Visitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        if self.seconds != 0 {
            visitor.visit_singular_int64_field(self.seconds, 1)?;
        }
        if self.nanos != 0 {
            visitor.visit_singular_int32_field(self.nanos, 2)?;
        }
        Ok(())
    }

    fn custom_json(&self) -> Option<&dyn CustomJsonCodable> {
        Some(self)
    }

    fn custom_json_mut(&mut self) -> Option<&mut dyn CustomJsonCodable> {
        Some(self)
    }
}

impl CustomJsonCodable for Duration {
    fn encode_json(
        &self,
        encoder: &mut JsonEncoder,
        _options: &JsonEncodingOptions,
    ) -> Result<(), JsonEncodeError> {
        if !self.normalized().is_valid() {
            return Err(JsonEncodeError::DurationRange);
        }
        encoder.put_string(&self.to_string());
        Ok(())
    }

    fn decode_json(&mut self, decoder: &mut JsonDecoder<'_, '_>) -> Result<(), JsonDecodeError> {
        match decoder.scanner().next()? {
            JsonToken::String(text) => {
                *self = Duration::parse(&text).ok_or(JsonDecodeError::MalformedDuration)?;
                Ok(())
            }
            _ => Err(JsonDecodeError::MalformedDuration),
        }
    }
}
