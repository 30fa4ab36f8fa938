use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;
use std::time::{self, SystemTime, UNIX_EPOCH};

use protokit::json::{JsonDecoder, JsonEncoder, JsonToken};
use protokit::wkt::CustomJsonCodable;
use protokit::{
    Cardinality, Decoder, FieldDescriptor, FieldKind, FieldName, JsonDecodeError,
    JsonEncodeError, JsonEncodingOptions, Message, MessageLayout, Syntax, Visitor,
};

use crate::datetime::{parse_rfc3339, DateTime};
use crate::{Duration, NANOS_PER_SECOND};

/// 0001-01-01T00:00:00Z
const MIN_SECONDS: i64 = -62_135_596_800;
/// 9999-12-31T23:59:59Z
const MAX_SECONDS: i64 = 253_402_300_799;

static FIELDS: [FieldDescriptor; 2] = [
    FieldDescriptor::new(1, FieldName::Same("seconds"), FieldKind::Int64, Cardinality::Optional),
    FieldDescriptor::new(2, FieldName::Same("nanos"), FieldKind::Int32, Cardinality::Optional),
];

static LAYOUT: MessageLayout =
    MessageLayout::new("google.protobuf.Timestamp", Syntax::Proto3, &FIELDS);

/// A point in time, counted from the unix epoch in UTC: `google.protobuf.Timestamp`.
///
/// `nanos` is always non-negative in a valid timestamp; earlier instants have negative `seconds`.
/// The JSON form is an RFC 3339 string between years 1 and 9999.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TimestampError {
    #[error("failed to parse RFC 3339 timestamp")]
    ParseFailure,
    #[error("timestamp out of range")]
    OutOfRange,
    #[error("invalid date or time")]
    InvalidDateTime,
}

impl Timestamp {
    pub const fn new(seconds: i64, nanos: i32) -> Timestamp {
        Timestamp { seconds, nanos }
    }

    /// Midnight UTC at the start of the given day.
    pub fn date(year: i64, month: u8, day: u8) -> Result<Timestamp, TimestampError> {
        Timestamp::date_time(year, month, day, 0, 0, 0)
    }

    pub fn date_time(
        year: i64,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Timestamp, TimestampError> {
        let text = format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}Z");
        let (seconds, nanos) = parse_rfc3339(&text).ok_or(TimestampError::InvalidDateTime)?;
        let timestamp = Timestamp::new(seconds, nanos);
        if timestamp.is_valid() {
            Ok(timestamp)
        } else {
            Err(TimestampError::OutOfRange)
        }
    }

    /// Moves whole seconds out of `nanos` and makes `nanos` non-negative.
    pub fn normalize(&mut self) {
        let seconds = self
            .seconds
            .saturating_add(i64::from(self.nanos.div_euclid(NANOS_PER_SECOND)));
        self.nanos = self.nanos.rem_euclid(NANOS_PER_SECOND);
        self.seconds = seconds;
    }

    pub fn normalized(mut self) -> Timestamp {
        self.normalize();
        self
    }

    pub fn is_valid(&self) -> bool {
        (MIN_SECONDS..=MAX_SECONDS).contains(&self.seconds)
            && (0..NANOS_PER_SECOND).contains(&self.nanos)
    }

    fn parse(text: &str) -> Option<Timestamp> {
        let (seconds, nanos) = parse_rfc3339(text)?;
        Some(Timestamp::new(seconds, nanos)).filter(Timestamp::is_valid)
    }
}

/// RFC 3339 in UTC, with 0, 3, 6 or 9 fraction digits.
impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let normalized = self.normalized();
        fmt::Display::fmt(
            &DateTime::from_unix(normalized.seconds, normalized.nanos as u32),
            f,
        )
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(text: &str) -> Result<Timestamp, TimestampError> {
        let (seconds, nanos) = parse_rfc3339(text).ok_or(TimestampError::ParseFailure)?;
        let timestamp = Timestamp::new(seconds, nanos);
        if timestamp.is_valid() {
            Ok(timestamp)
        } else {
            Err(TimestampError::OutOfRange)
        }
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp::new(
            self.seconds.saturating_add(rhs.seconds),
            self.nanos + rhs.nanos,
        )
        .normalized()
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Timestamp;

    fn sub(self, rhs: Duration) -> Timestamp {
        self + -rhs
    }
}

impl Sub for Timestamp {
    type Output = Duration;

    fn sub(self, rhs: Timestamp) -> Duration {
        Duration::new(
            self.seconds.saturating_sub(rhs.seconds),
            self.nanos - rhs.nanos,
        )
        .normalized()
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Timestamp {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => Timestamp::new(after.as_secs() as i64, after.subsec_nanos() as i32),
            Err(before) => {
                let before = before.duration();
                Timestamp::new(
                    -(before.as_secs() as i64),
                    -(before.subsec_nanos() as i32),
                )
                .normalized()
            }
        }
    }
}

impl TryFrom<Timestamp> for SystemTime {
    type Error = TimestampError;

    fn try_from(timestamp: Timestamp) -> Result<SystemTime, TimestampError> {
        let timestamp = timestamp.normalized();
        let nanos = time::Duration::from_nanos(timestamp.nanos as u64);
        let time = if timestamp.seconds >= 0 {
            UNIX_EPOCH.checked_add(time::Duration::from_secs(timestamp.seconds as u64))
        } else {
            UNIX_EPOCH.checked_sub(time::Duration::from_secs(timestamp.seconds.unsigned_abs()))
        };
        time.and_then(|time| time.checked_add(nanos))
            .ok_or(TimestampError::OutOfRange)
    }
}

#[cfg(feature = "chrono")]
mod chrono_conversions {
    use chrono::{DateTime, Utc};

    use super::{Timestamp, TimestampError};

    impl From<DateTime<Utc>> for Timestamp {
        fn from(time: DateTime<Utc>) -> Timestamp {
            Timestamp::new(time.timestamp(), time.timestamp_subsec_nanos() as i32)
        }
    }

    impl TryFrom<Timestamp> for DateTime<Utc> {
        type Error = TimestampError;

        fn try_from(timestamp: Timestamp) -> Result<DateTime<Utc>, TimestampError> {
            let timestamp = timestamp.normalized();
            DateTime::from_timestamp(timestamp.seconds, timestamp.nanos as u32)
                .ok_or(TimestampError::OutOfRange)
        }
    }
}

impl Message for Timestamp {
    const NAME: &'static str = "google.protobuf.Timestamp";

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

impl CustomJsonCodable for Timestamp {
    fn encode_json(
        &self,
        encoder: &mut JsonEncoder,
        _options: &JsonEncodingOptions,
    ) -> Result<(), JsonEncodeError> {
        if !self.normalized().is_valid() {
            return Err(JsonEncodeError::TimestampRange);
        }
        encoder.put_string(&self.to_string());
        Ok(())
    }

    fn decode_json(&mut self, decoder: &mut JsonDecoder<'_, '_>) -> Result<(), JsonDecodeError> {
        match decoder.scanner().next()? {
            JsonToken::String(text) => {
                *self = Timestamp::parse(&text).ok_or(JsonDecodeError::MalformedTimestamp)?;
                Ok(())
            }
            _ => Err(JsonDecodeError::MalformedTimestamp),
        }
    }
}
