#![doc(html_root_url = "https://docs.rs/protokit/0.1.0")]
#![doc = include_str!("../README.md")]

// Re-export the bytes crate for use within generated code.
pub use bytes;

pub mod binary;
mod decoder;
#[doc(hidden)]
pub mod encoding;
mod error;
pub mod extensions;
pub mod field_mask;
pub mod field_types;
pub mod float;
pub mod hash;
pub mod json;
pub mod layout;
mod message;
pub mod name_map;
pub mod text;
mod unknown;
mod visitor;
pub mod wkt;

pub use crate::binary::{BinaryDecodingOptions, BinaryEncodingOptions};
pub use crate::decoder::Decoder;
pub use crate::encoding::length_delimiter::{
    decode_length_delimiter, encode_length_delimiter, length_delimiter_len,
};
pub use crate::error::{DecodeError, DecodeErrorKind, EncodeError};
pub use crate::extensions::{Extension, ExtensionRegistry, ExtensionSet};
pub use crate::field_mask::{FieldMaskError, MergeOptions};
pub use crate::json::{JsonDecodeError, JsonDecodingOptions, JsonEncodeError, JsonEncodingOptions};
pub use crate::layout::{
    Cardinality, EnumLayout, EnumValueDescriptor, FieldDescriptor, FieldKind, FieldName,
    MessageLayout, Syntax,
};
pub use crate::message::{Enum, Message};
pub use crate::text::{
    TextDecodeError, TextEncodeError, TextFormatDecodingOptions, TextFormatEncodingOptions,
};
pub use crate::unknown::UnknownFields;
pub use crate::visitor::Visitor;

/// Default nesting limit for every decoder. 100 is the limit used by the C++ implementation.
pub const DEFAULT_DEPTH_LIMIT: u32 = 100;
