use std::fmt::Debug;
use std::hash::Hash;

use bytes::BufMut;

use crate::binary::{self, BinaryDecodingOptions, BinaryEncodingOptions};
use crate::encoding::{encode_varint, encoded_len_varint};
use crate::extensions::ExtensionRegistry;
use crate::field_mask::{self, FieldMaskError, MergeOptions};
use crate::json::{self, JsonDecodeError, JsonDecodingOptions, JsonEncodeError, JsonEncodingOptions};
use crate::layout::{EnumLayout, MessageLayout};
use crate::text::{self, TextDecodeError, TextEncodeError, TextFormatDecodingOptions, TextFormatEncodingOptions};
use crate::unknown::UnknownFields;
use crate::wkt::{CustomJsonCodable, CustomTextCodable};
use crate::{DecodeError, DecodeErrorKind, Decoder, EncodeError, Visitor};

/// A protobuf message type.
///
/// Implementations are normally generated: they supply the static [`MessageLayout`], a
/// `decode_message` body that dispatches field numbers to [`Decoder`] methods and a `traverse`
/// body that hands present fields to a [`Visitor`]. Every format's entry points are provided on
/// top of those two methods.
pub trait Message: Clone + Debug + Default + PartialEq + Send + Sync + 'static {
    /// The fully qualified protobuf name.
    const NAME: &'static str;

    fn layout() -> &'static MessageLayout;

    /// Reads fields from `decoder` until it reports the end of the message.
    fn decode_message<D: Decoder>(&mut self, decoder: &mut D) -> Result<(), D::Error>;

    /// Visits every present field in field-number order, then the unknown fields.
    fn traverse<V: Visitor>(&self, visitor: &mut V) -> Result<(), V::Error>;

    /// Returns `false` if a proto2 `required` field, here or in a nested message, is unset.
    fn is_initialized(&self) -> bool {
        true
    }

    /// Storage for unrecognized fields; proto3 messages have none and drop them.
    fn unknown_fields(&self) -> Option<&UnknownFields> {
        None
    }

    fn unknown_fields_mut(&mut self) -> Option<&mut UnknownFields> {
        None
    }

    /// A replacement for the field-by-field JSON form, used by well-known types.
    fn custom_json(&self) -> Option<&dyn CustomJsonCodable> {
        None
    }

    fn custom_json_mut(&mut self) -> Option<&mut dyn CustomJsonCodable> {
        None
    }

    /// Additional text format handling, used by `Any` for its expanded form.
    fn custom_text(&self) -> Option<&dyn CustomTextCodable> {
        None
    }

    fn custom_text_mut(&mut self) -> Option<&mut dyn CustomTextCodable> {
        None
    }

    /// Returns the encoded length of the message without a length delimiter.
    fn encoded_len(&self) -> Result<usize, EncodeError> {
        binary::encoded_len(self)
    }

    /// Encodes the message to a buffer.
    ///
    /// An error will be returned if the buffer does not have sufficient capacity.
    fn encode(&self, buf: &mut impl BufMut) -> Result<(), EncodeError> {
        if !self.is_initialized() {
            return Err(EncodeError::MissingRequiredFields);
        }
        let required = self.encoded_len()?;
        let remaining = buf.remaining_mut();
        if required > remaining {
            return Err(EncodeError::new(required, remaining));
        }
        binary::encode_raw(self, buf, &BinaryEncodingOptions::default())
    }

    /// Encodes the message to a newly allocated buffer.
    fn encode_to_vec(&self) -> Result<Vec<u8>, EncodeError> {
        self.encode_with(&BinaryEncodingOptions::default(), false)
    }

    /// Encodes the message with explicit options; `partial` skips the required field check.
    fn encode_with(
        &self,
        options: &BinaryEncodingOptions,
        partial: bool,
    ) -> Result<Vec<u8>, EncodeError> {
        if !partial && !self.is_initialized() {
            return Err(EncodeError::MissingRequiredFields);
        }
        let mut buf = Vec::with_capacity(self.encoded_len()?);
        binary::encode_raw(self, &mut buf, options)?;
        Ok(buf)
    }

    /// Encodes the message with a length-delimiter to a buffer.
    ///
    /// An error will be returned if the buffer does not have sufficient capacity.
    fn encode_length_delimited(&self, buf: &mut impl BufMut) -> Result<(), EncodeError> {
        if !self.is_initialized() {
            return Err(EncodeError::MissingRequiredFields);
        }
        let len = self.encoded_len()?;
        let required = len + encoded_len_varint(len as u64);
        let remaining = buf.remaining_mut();
        if required > remaining {
            return Err(EncodeError::new(required, remaining));
        }
        encode_varint(len as u64, buf);
        binary::encode_raw(self, buf, &BinaryEncodingOptions::default())
    }

    /// Encodes the message with a length-delimiter to a newly allocated buffer.
    fn encode_length_delimited_to_vec(&self) -> Result<Vec<u8>, EncodeError> {
        let len = self.encoded_len()?;
        let mut buf = Vec::with_capacity(len + encoded_len_varint(len as u64));
        self.encode_length_delimited(&mut buf)?;
        Ok(buf)
    }

    /// Decodes an instance of the message from a buffer.
    ///
    /// The entire buffer will be consumed.
    fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        Self::decode_with(data, None, false, &BinaryDecodingOptions::default())
    }

    /// Decodes with an extension registry and options; `partial` skips the required field check.
    fn decode_with(
        data: &[u8],
        extensions: Option<&ExtensionRegistry>,
        partial: bool,
        options: &BinaryDecodingOptions,
    ) -> Result<Self, DecodeError> {
        let mut message = Self::default();
        message.merge_with(data, extensions, partial, options)?;
        Ok(message)
    }

    /// Decodes one length-delimited instance that must span the whole buffer.
    fn decode_length_delimited(mut data: &[u8]) -> Result<Self, DecodeError> {
        let len = crate::encoding::decode_len(&mut data)?;
        if data.len() > len {
            return Err(DecodeError::new(DecodeErrorKind::TrailingGarbage));
        }
        Self::decode(data)
    }

    /// Decodes an instance of the message from a buffer, and merges it into `self`.
    fn merge(&mut self, data: &[u8]) -> Result<(), DecodeError> {
        self.merge_with(data, None, false, &BinaryDecodingOptions::default())
    }

    fn merge_with(
        &mut self,
        data: &[u8],
        extensions: Option<&ExtensionRegistry>,
        partial: bool,
        options: &BinaryDecodingOptions,
    ) -> Result<(), DecodeError> {
        binary::merge(self, data, extensions, partial, options)
    }

    fn to_json(&self) -> Result<String, JsonEncodeError> {
        self.to_json_with(&JsonEncodingOptions::default())
    }

    fn to_json_with(&self, options: &JsonEncodingOptions) -> Result<String, JsonEncodeError> {
        json::encode_to_string(self, options)
    }

    fn from_json(text: &str) -> Result<Self, JsonDecodeError> {
        Self::from_json_with(text, &JsonDecodingOptions::default(), None)
    }

    fn from_json_with(
        text: &str,
        options: &JsonDecodingOptions,
        extensions: Option<&ExtensionRegistry>,
    ) -> Result<Self, JsonDecodeError> {
        let mut message = Self::default();
        json::merge(&mut message, text, options, extensions)?;
        Ok(message)
    }

    fn merge_json(&mut self, text: &str) -> Result<(), JsonDecodeError> {
        json::merge(self, text, &JsonDecodingOptions::default(), None)
    }

    fn to_text(&self) -> Result<String, TextEncodeError> {
        self.to_text_with(&TextFormatEncodingOptions::default())
    }

    fn to_text_with(&self, options: &TextFormatEncodingOptions) -> Result<String, TextEncodeError> {
        text::encode_to_string(self, options)
    }

    fn from_text(text: &str) -> Result<Self, TextDecodeError> {
        Self::from_text_with(text, &TextFormatDecodingOptions::default(), None)
    }

    fn from_text_with(
        text: &str,
        options: &TextFormatDecodingOptions,
        extensions: Option<&ExtensionRegistry>,
    ) -> Result<Self, TextDecodeError> {
        let mut message = Self::default();
        text::merge(&mut message, text, options, extensions)?;
        Ok(message)
    }

    fn merge_text(&mut self, text: &str) -> Result<(), TextDecodeError> {
        text::merge(self, text, &TextFormatDecodingOptions::default(), None)
    }

    /// An order independent hash of the message contents.
    fn hash_value(&self) -> u64 {
        crate::hash::hash_value(self)
    }

    /// The type name followed by the text format rendering.
    fn debug_description(&self) -> String {
        match self.to_text() {
            Ok(text) => format!("{}:\n{}", Self::NAME, text),
            Err(error) => format!("{}: <{}>", Self::NAME, error),
        }
    }

    /// Clears the fields named by the field mask `paths`, keeping the others.
    fn mask<P: AsRef<str>>(&mut self, paths: &[P]) -> Result<(), FieldMaskError> {
        field_mask::mask(self, paths)
    }

    fn masked<P: AsRef<str>>(&self, paths: &[P]) -> Result<Self, FieldMaskError> {
        let mut copy = self.clone();
        copy.mask(paths)?;
        Ok(copy)
    }

    /// Replaces the fields named by `paths` with their values in `source`.
    fn override_with<P: AsRef<str>>(
        &mut self,
        source: &Self,
        paths: &[P],
        options: &MergeOptions,
    ) -> Result<(), FieldMaskError> {
        field_mask::override_with(self, source, paths, options)
    }

    fn overridden<P: AsRef<str>>(
        &self,
        source: &Self,
        paths: &[P],
        options: &MergeOptions,
    ) -> Result<Self, FieldMaskError> {
        let mut copy = self.clone();
        copy.override_with(source, paths, options)?;
        Ok(copy)
    }
}

/// Recursive fields are stored boxed.
impl<M: Message> Message for Box<M> {
    const NAME: &'static str = M::NAME;

    fn layout() -> &'static MessageLayout {
        M::layout()
    }

    fn decode_message<D: Decoder>(&mut self, decoder: &mut D) -> Result<(), D::Error> {
        (**self).decode_message(decoder)
    }

    fn traverse<V: Visitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        (**self).traverse(visitor)
    }

    fn is_initialized(&self) -> bool {
        (**self).is_initialized()
    }

    fn unknown_fields(&self) -> Option<&UnknownFields> {
        (**self).unknown_fields()
    }

    fn unknown_fields_mut(&mut self) -> Option<&mut UnknownFields> {
        (**self).unknown_fields_mut()
    }

    fn custom_json(&self) -> Option<&dyn CustomJsonCodable> {
        (**self).custom_json()
    }

    fn custom_json_mut(&mut self) -> Option<&mut dyn CustomJsonCodable> {
        (**self).custom_json_mut()
    }

    fn custom_text(&self) -> Option<&dyn CustomTextCodable> {
        (**self).custom_text()
    }

    fn custom_text_mut(&mut self) -> Option<&mut dyn CustomTextCodable> {
        (**self).custom_text_mut()
    }
}

/// A protobuf enum type.
///
/// Closed (proto2) enums return `None` from [`Enum::from_i32`] for numbers they do not declare;
/// open (proto3) enums keep them in an extra variant and never return `None`.
pub trait Enum: Copy + Debug + Default + PartialEq + Eq + Hash + Send + Sync + 'static {
    /// The fully qualified protobuf name.
    const NAME: &'static str;

    fn layout() -> &'static EnumLayout;

    fn from_i32(value: i32) -> Option<Self>;

    fn to_i32(self) -> i32;

    /// The declared name of this value, if it has one.
    fn name(self) -> Option<&'static str> {
        Self::layout()
            .name_map()
            .names(self.to_i32())
            .map(|names| names.proto())
    }

    /// Looks a value up by its name or one of its aliases.
    fn from_name(name: &str) -> Option<Self> {
        Self::layout()
            .name_map()
            .number_for_json(name.as_bytes())
            .and_then(Self::from_i32)
    }
}
