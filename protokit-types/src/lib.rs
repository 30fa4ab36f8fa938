#![doc(html_root_url = "https://docs.rs/protokit-types/0.1.0")]

//! Protocol Buffers well-known types.
//!
//! Every type here implements [`protokit::Message`] by hand. Those whose JSON form differs from
//! an object of their fields also implement [`protokit::wkt::CustomJsonCodable`].
//!
//! `Any` payloads are resolved through a process-wide [`AnyRegistry`], which starts out holding
//! every type in this crate.

mod any;
mod conversions;
mod datetime;
mod duration;
mod empty;
mod field_mask;
mod registry;
mod timestamp;
pub mod value;
mod wrappers;

pub use any::{Any, AnyMessage};
pub use duration::{Duration, DurationError};
pub use empty::Empty;
pub use field_mask::FieldMask;
pub use registry::AnyRegistry;
pub use timestamp::{Timestamp, TimestampError};
pub use value::{ListValue, NullValue, Struct, Value};
pub use wrappers::{
    BoolValue, BytesValue, DoubleValue, FloatValue, Int32Value, Int64Value, StringValue,
    UInt32Value, UInt64Value,
};

use protokit::Message;

/// Prefix of the type URLs written by [`Any::pack`].
pub const TYPE_URL_PREFIX: &str = "type.googleapis.com/";

const NANOS_PER_SECOND: i32 = 1_000_000_000;

/// The type URL `Any::pack` uses for `M`.
pub fn type_url_for<M: Message>() -> String {
    format!("{TYPE_URL_PREFIX}{}", M::NAME)
}

/// The fully qualified message name in a type URL: everything after the last `/`.
///
/// Returns `None` if the URL has no `/` or nothing follows it.
pub fn type_name_from_url(type_url: &str) -> Option<&str> {
    let (_, name) = type_url.rsplit_once('/')?;
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
