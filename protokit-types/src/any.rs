use std::borrow::Cow;
use std::fmt;

use protokit::json::{self, JsonDecoder, JsonEncoder, JsonScanner, JsonToken};
use protokit::text::{self, TextDecoder, TextEncoder};
use protokit::wkt::{CustomJsonCodable, CustomTextCodable};
use protokit::{
    BinaryEncodingOptions, Cardinality, DecodeError, DecodeErrorKind, Decoder, EncodeError,
    ExtensionRegistry, FieldDescriptor, FieldKind, FieldName, JsonDecodeError,
    JsonDecodingOptions, JsonEncodeError, JsonEncodingOptions, Message, MessageLayout, Syntax,
    TextDecodeError, TextEncodeError, TextFormatEncodingOptions, Visitor,
};

use crate::registry::AnyRegistry;
use crate::{type_name_from_url, type_url_for};

const TYPE_KEY: &str = "@type";
const VALUE_KEY: &str = "value";

static FIELDS: [FieldDescriptor; 2] = [
    FieldDescriptor::new(1, FieldName::Standard("type_url"), FieldKind::String, Cardinality::Optional),
    FieldDescriptor::new(2, FieldName::Same("value"), FieldKind::Bytes, Cardinality::Optional),
];

static LAYOUT: MessageLayout = MessageLayout::new("google.protobuf.Any", Syntax::Proto3, &FIELDS);

/// An object-safe view of a [`Message`], used for `Any` payloads held in decoded form.
pub trait AnyMessage: fmt::Debug + Send + Sync {
    fn full_name(&self) -> &'static str;

    /// The binary encoding, without the required field check.
    fn encode_binary(&self) -> Result<Vec<u8>, EncodeError>;

    /// Writes the members that follow `"@type"` in the JSON object of an `Any`: the payload's
    /// fields, or `"value"` and the payload's custom JSON form.
    fn encode_json_members(
        &self,
        encoder: &mut JsonEncoder,
        options: &JsonEncodingOptions,
    ) -> Result<(), JsonEncodeError>;

    fn encode_text_body(
        &self,
        encoder: &mut TextEncoder,
        options: &TextFormatEncodingOptions,
    ) -> Result<(), TextEncodeError>;

    fn clone_boxed(&self) -> Box<dyn AnyMessage>;

    fn eq_dyn(&self, other: &dyn AnyMessage) -> bool;

    fn as_std_any(&self) -> &dyn std::any::Any;
}

impl<M: Message> AnyMessage for M {
    fn full_name(&self) -> &'static str {
        M::NAME
    }

    fn encode_binary(&self) -> Result<Vec<u8>, EncodeError> {
        self.encode_with(&BinaryEncodingOptions::default(), true)
    }

    fn encode_json_members(
        &self,
        encoder: &mut JsonEncoder,
        options: &JsonEncodingOptions,
    ) -> Result<(), JsonEncodeError> {
        if self.custom_json().is_some() {
            encoder.start_field(VALUE_KEY);
            json::encode_message_value(self, encoder, options)
        } else {
            json::encode_message_fields(self, encoder, options)
        }
    }

    fn encode_text_body(
        &self,
        encoder: &mut TextEncoder,
        options: &TextFormatEncodingOptions,
    ) -> Result<(), TextEncodeError> {
        text::encode_message_body(self, encoder, options)
    }

    fn clone_boxed(&self) -> Box<dyn AnyMessage> {
        Box::new(self.clone())
    }

    fn eq_dyn(&self, other: &dyn AnyMessage) -> bool {
        other.as_std_any().downcast_ref::<M>() == Some(self)
    }

    fn as_std_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl Clone for Box<dyn AnyMessage> {
    fn clone(&self) -> Box<dyn AnyMessage> {
        self.clone_boxed()
    }
}

#[derive(Clone, Debug)]
enum Payload {
    Binary(Vec<u8>),
    Message(Box<dyn AnyMessage>),
    /// A JSON object read before its type was registered, `@type` member included.
    Json {
        text: String,
        options: JsonDecodingOptions,
    },
}

impl Default for Payload {
    fn default() -> Payload {
        Payload::Binary(Vec::new())
    }
}

/// A message of any type, identified by a type URL: `google.protobuf.Any`.
///
/// The payload is stored in whichever form it arrived in: serialized bytes, a message packed
/// with [`Any::pack`], or JSON text. It is converted on demand, which for JSON and the text
/// format means looking the type up in the [`AnyRegistry`].
#[derive(Clone, Default)]
pub struct Any {
    type_url: String,
    payload: Payload,
}

impl Any {
    /// An `Any` holding already serialized bytes.
    pub fn new(type_url: impl Into<String>, value: Vec<u8>) -> Any {
        Any {
            type_url: type_url.into(),
            payload: Payload::Binary(value),
        }
    }

    /// Wraps a copy of `message`, with a `type.googleapis.com/` type URL.
    pub fn pack<M: Message>(message: &M) -> Any {
        Any {
            type_url: type_url_for::<M>(),
            payload: Payload::Message(Box::new(message.clone())),
        }
    }

    /// Like [`Any::pack`], with a different URL prefix such as `example.com/types`.
    pub fn pack_with_prefix<M: Message>(message: &M, prefix: &str) -> Any {
        Any {
            type_url: format!("{}/{}", prefix.trim_end_matches('/'), M::NAME),
            payload: Payload::Message(Box::new(message.clone())),
        }
    }

    pub fn type_url(&self) -> &str {
        &self.type_url
    }

    pub fn set_type_url(&mut self, type_url: impl Into<String>) {
        self.type_url = type_url.into();
    }

    /// The fully qualified name of the payload type.
    pub fn type_name(&self) -> Option<&str> {
        type_name_from_url(&self.type_url)
    }

    /// Whether the type URL names `M`, whatever its prefix.
    pub fn is<M: Message>(&self) -> bool {
        self.type_name() == Some(M::NAME)
    }

    /// The serialized payload.
    ///
    /// Fails with [`EncodeError::AnyTranscodeFailure`] if the payload was read from JSON and its
    /// type is still not registered.
    pub fn value(&self) -> Result<Cow<'_, [u8]>, EncodeError> {
        match &self.payload {
            Payload::Binary(bytes) => Ok(Cow::Borrowed(bytes)),
            Payload::Message(message) => message.encode_binary().map(Cow::Owned),
            Payload::Json { .. } => self
                .with_message(|message| message.encode_binary())
                .ok_or(EncodeError::AnyTranscodeFailure)?
                .map(Cow::Owned),
        }
    }

    pub fn set_value(&mut self, value: Vec<u8>) {
        self.payload = Payload::Binary(value);
    }

    /// Extracts the payload as an `M`.
    ///
    /// Fails with [`DecodeErrorKind::TypeUrlMismatch`] when the type URL names another type.
    pub fn unpack<M: Message>(&self) -> Result<M, DecodeError> {
        if !self.is::<M>() {
            return Err(DecodeError::new(DecodeErrorKind::TypeUrlMismatch {
                expected: type_url_for::<M>(),
                actual: self.type_url.clone(),
            }));
        }
        match &self.payload {
            Payload::Binary(bytes) => M::decode(bytes),
            Payload::Message(message) => match message.as_std_any().downcast_ref::<M>() {
                Some(message) => Ok(message.clone()),
                None => {
                    let bytes = message
                        .encode_binary()
                        .map_err(|error| DecodeError::malformed(error.to_string()))?;
                    M::decode(&bytes)
                }
            },
            Payload::Json { text, options } => decode_json_payload(text, options, None)
                .map_err(|error| {
                    DecodeError::malformed(format!("google.protobuf.Any JSON payload: {error}"))
                }),
        }
    }

    /// Runs `f` on the decoded payload, decoding it through the registry if necessary.
    ///
    /// `None` if the type is not registered or the payload does not decode.
    fn with_message<R>(&self, f: impl FnOnce(&dyn AnyMessage) -> R) -> Option<R> {
        if let Payload::Message(message) = &self.payload {
            return Some(f(&**message));
        }
        let codec = AnyRegistry::lookup(self.type_name()?)?;
        let decoded = match &self.payload {
            Payload::Binary(bytes) => (codec.decode_binary)(bytes)
                .map_err(|error| log::debug!("Any payload of {} does not decode: {error}", self.type_url))
                .ok()?,
            Payload::Json { text, options } => (codec.decode_json)(text, options, None)
                .map_err(|error| log::debug!("Any payload of {} does not decode: {error}", self.type_url))
                .ok()?,
            Payload::Message(_) => return None,
        };
        Some(f(&*decoded))
    }
}

impl fmt::Debug for Any {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Any");
        debug.field("type_url", &self.type_url);
        match &self.payload {
            Payload::Binary(bytes) => debug.field("value", bytes),
            Payload::Message(message) => debug.field("message", message),
            Payload::Json { text, .. } => debug.field("json", text),
        };
        debug.finish()
    }
}

/// Equal when the type URLs match and the payloads are equal, comparing serialized bytes if the
/// payloads are held in different forms.
impl PartialEq for Any {
    fn eq(&self, other: &Any) -> bool {
        if self.type_url != other.type_url {
            return false;
        }
        match (&self.payload, &other.payload) {
            (Payload::Message(a), Payload::Message(b)) => a.eq_dyn(&**b),
            (Payload::Json { text: a, .. }, Payload::Json { text: b, .. }) if a == b => true,
            _ => match (self.value(), other.value()) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl Message for Any {
    const NAME: &'static str = "google.protobuf.Any";

    fn layout() -> &'static MessageLayout {
        &LAYOUT
    }

    fn decode_message<D: Decoder>(&mut self, decoder: &mut D) -> Result<(), D::Error> {
        while let Some(field_number) = decoder.next_field_number()? {
            match field_number {
                1 => decoder.decode_singular_string_field(&mut self.type_url)?,
                2 => {
                    let mut value = Vec::new();
                    decoder.decode_singular_bytes_field(&mut value)?;
                    self.payload = Payload::Binary(value);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn traverse<V: Visitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        if !self.type_url.is_empty() {
            visitor.visit_singular_string_field(&self.type_url, 1)?;
        }
        let value = self.value()?;
        if !value.is_empty() {
            visitor.visit_singular_bytes_field(&value, 2)?;
        }
        Ok(())
    }

    fn custom_json(&self) -> Option<&dyn CustomJsonCodable> {
        Some(self)
    }

    fn custom_json_mut(&mut self) -> Option<&mut dyn CustomJsonCodable> {
        Some(self)
    }

    fn custom_text(&self) -> Option<&dyn CustomTextCodable> {
        Some(self)
    }

    fn custom_text_mut(&mut self) -> Option<&mut dyn CustomTextCodable> {
        Some(self)
    }
}

impl CustomJsonCodable for Any {
    fn encode_json(
        &self,
        encoder: &mut JsonEncoder,
        options: &JsonEncodingOptions,
    ) -> Result<(), JsonEncodeError> {
        if self.type_url.is_empty() {
            return match &self.payload {
                Payload::Binary(bytes) if bytes.is_empty() => {
                    encoder.start_object();
                    encoder.end_object();
                    Ok(())
                }
                _ => Err(JsonEncodeError::AnyTranscodeFailure),
            };
        }
        encoder.start_object();
        encoder.start_field(TYPE_KEY);
        encoder.put_string(&self.type_url);
        match self.with_message(|message| message.encode_json_members(encoder, options)) {
            Some(result) => result?,
            None => match &self.payload {
                Payload::Json { text, options } => copy_members(text, options, encoder)
                    .map_err(|_| JsonEncodeError::AnyTranscodeFailure)?,
                _ => return Err(JsonEncodeError::AnyTranscodeFailure),
            },
        }
        encoder.end_object();
        Ok(())
    }

    fn decode_json(&mut self, decoder: &mut JsonDecoder<'_, '_>) -> Result<(), JsonDecodeError> {
        match decoder.scanner().peek()? {
            Some(JsonToken::BeginObject) => {}
            Some(_) => return Err(JsonDecodeError::SchemaMismatch),
            None => return Err(JsonDecodeError::Truncated),
        }
        let options = decoder.options();
        let extensions = decoder.extensions();
        let text = decoder.scanner().skip_value()?;
        let Some(type_url) = find_type_url(text, &options)? else {
            *self = Any::default();
            return Ok(());
        };
        let name = type_name_from_url(&type_url).ok_or(JsonDecodeError::InvalidAnyTypeUrl)?;
        self.payload = match AnyRegistry::lookup(name) {
            Some(codec) => Payload::Message((codec.decode_json)(text, &options, extensions)?),
            None => {
                log::debug!("keeping google.protobuf.Any JSON of unregistered type {name}");
                Payload::Json {
                    text: text.to_owned(),
                    options,
                }
            }
        };
        self.type_url = type_url;
        Ok(())
    }
}

impl CustomTextCodable for Any {
    /// Writes `[type_url] { ... }` when the payload type is known.
    fn encode_text(
        &self,
        encoder: &mut TextEncoder,
        options: &TextFormatEncodingOptions,
    ) -> Result<bool, TextEncodeError> {
        if self.type_url.is_empty() {
            return Ok(false);
        }
        let written = self.with_message(|message| {
            encoder.start_bracketed_field(&self.type_url);
            encoder.start_block();
            let result = message.encode_text_body(encoder, options);
            encoder.end_block();
            result
        });
        match written {
            Some(result) => result.map(|()| true),
            None => Ok(false),
        }
    }

    fn decode_expanded_field(
        &mut self,
        type_url: &str,
        decoder: &mut TextDecoder<'_, '_>,
    ) -> Result<(), TextDecodeError> {
        let codec = type_name_from_url(type_url)
            .and_then(AnyRegistry::lookup)
            .ok_or_else(|| TextDecodeError::UnregisteredAnyType(type_url.to_owned()))?;
        self.payload = Payload::Message((codec.decode_text)(decoder)?);
        self.type_url = type_url.to_owned();
        Ok(())
    }
}

/// Decodes the payload of an `Any` JSON object as an `M`.
pub(crate) fn decode_json_payload<M: Message>(
    text: &str,
    options: &JsonDecodingOptions,
    extensions: Option<&ExtensionRegistry>,
) -> Result<M, JsonDecodeError> {
    let mut message = M::default();
    if message.custom_json().is_some() {
        decode_value_member(&mut message, text, options, extensions)?;
    } else {
        json::merge_skipping_key(&mut message, text, TYPE_KEY, options, extensions)?;
    }
    Ok(message)
}

/// Reads `{"@type": ..., "value": ...}`, the form used for payloads with a custom JSON form.
fn decode_value_member<M: Message>(
    message: &mut M,
    text: &str,
    options: &JsonDecodingOptions,
    extensions: Option<&ExtensionRegistry>,
) -> Result<(), JsonDecodeError> {
    let mut scanner = JsonScanner::new(text, options.message_depth_limit);
    scanner.expect(&JsonToken::BeginObject)?;
    let mut first = true;
    while !scanner.skip_optional(&JsonToken::EndObject)? {
        if !first {
            scanner.expect(&JsonToken::Comma)?;
        }
        first = false;
        let key = scanner.next_key()?;
        match &*key {
            TYPE_KEY => {
                scanner.skip_value()?;
            }
            VALUE_KEY => JsonDecoder::new(&mut scanner, *options, extensions, M::layout())
                .decode_message(message)?,
            _ if options.ignore_unknown_fields => {
                scanner.skip_value()?;
            }
            _ => return Err(JsonDecodeError::UnknownField(key.into_owned())),
        }
    }
    scanner.expect_end()
}

/// The `@type` of an `Any` JSON object, or `None` for `{}`.
fn find_type_url(
    text: &str,
    options: &JsonDecodingOptions,
) -> Result<Option<String>, JsonDecodeError> {
    let mut scanner = JsonScanner::new(text, options.message_depth_limit);
    scanner.expect(&JsonToken::BeginObject)?;
    if scanner.skip_optional(&JsonToken::EndObject)? {
        return Ok(None);
    }
    loop {
        if scanner.next_key()? == TYPE_KEY {
            return match scanner.next()? {
                JsonToken::String(type_url) => Ok(Some(type_url.into_owned())),
                _ => Err(JsonDecodeError::InvalidAnyTypeUrl),
            };
        }
        scanner.skip_value()?;
        if scanner.skip_optional(&JsonToken::EndObject)? {
            return Err(JsonDecodeError::InvalidAnyTypeUrl);
        }
        scanner.expect(&JsonToken::Comma)?;
    }
}

/// Re-emits every member of a stored JSON object except `@type`.
fn copy_members(
    text: &str,
    options: &JsonDecodingOptions,
    encoder: &mut JsonEncoder,
) -> Result<(), JsonDecodeError> {
    let mut scanner = JsonScanner::new(text, options.message_depth_limit);
    scanner.expect(&JsonToken::BeginObject)?;
    let mut first = true;
    while !scanner.skip_optional(&JsonToken::EndObject)? {
        if !first {
            scanner.expect(&JsonToken::Comma)?;
        }
        first = false;
        let key = scanner.next_key()?;
        let value = scanner.skip_value()?;
        if key != TYPE_KEY {
            encoder.start_field(&key);
            encoder.append_raw(value);
        }
    }
    Ok(())
}
