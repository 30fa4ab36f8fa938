use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{LazyLock, PoisonError, RwLock};

use protokit::text::TextDecoder;
use protokit::{
    BinaryDecodingOptions, DecodeError, ExtensionRegistry, JsonDecodeError, JsonDecodingOptions,
    Message, TextDecodeError,
};

use crate::any::{decode_json_payload, AnyMessage};
use crate::{
    Any, BoolValue, BytesValue, DoubleValue, Duration, Empty, FieldMask, FloatValue, Int32Value,
    Int64Value, ListValue, StringValue, Struct, Timestamp, UInt32Value, UInt64Value, Value,
};

/// Type-erased constructors for one registered message type.
#[derive(Clone, Copy)]
pub(crate) struct AnyCodec {
    type_id: TypeId,
    pub(crate) decode_binary: fn(&[u8]) -> Result<Box<dyn AnyMessage>, DecodeError>,
    /// Reads a complete `Any` JSON object, `@type` included.
    pub(crate) decode_json: fn(
        &str,
        &JsonDecodingOptions,
        Option<&ExtensionRegistry>,
    ) -> Result<Box<dyn AnyMessage>, JsonDecodeError>,
    /// Reads the `{ ... }` block of an expanded `[type_url] { ... }` field.
    pub(crate) decode_text: fn(&mut TextDecoder<'_, '_>) -> Result<Box<dyn AnyMessage>, TextDecodeError>,
}

impl AnyCodec {
    fn of<M: Message>() -> AnyCodec {
        AnyCodec {
            type_id: TypeId::of::<M>(),
            decode_binary: decode_binary::<M>,
            decode_json: decode_json::<M>,
            decode_text: decode_text::<M>,
        }
    }
}

fn decode_binary<M: Message>(bytes: &[u8]) -> Result<Box<dyn AnyMessage>, DecodeError> {
    let message = M::decode_with(bytes, None, true, &BinaryDecodingOptions::default())?;
    Ok(Box::new(message))
}

fn decode_json<M: Message>(
    text: &str,
    options: &JsonDecodingOptions,
    extensions: Option<&ExtensionRegistry>,
) -> Result<Box<dyn AnyMessage>, JsonDecodeError> {
    let message: M = decode_json_payload(text, options, extensions)?;
    Ok(Box::new(message))
}

fn decode_text<M: Message>(
    decoder: &mut TextDecoder<'_, '_>,
) -> Result<Box<dyn AnyMessage>, TextDecodeError> {
    let mut message = M::default();
    decoder.decode_message(&mut message)?;
    Ok(Box::new(message))
}

static REGISTRY: LazyLock<RwLock<AnyRegistry>> =
    LazyLock::new(|| RwLock::new(AnyRegistry::with_well_known_types()));

/// The message types `Any` can expand, shared by the whole process.
///
/// JSON and the text format write an `Any` payload as the payload's own fields, which needs the
/// payload type. Binary `Any` values of unregistered types still round trip through the binary
/// format; converting them to JSON fails with `AnyTranscodeFailure`. JSON payloads of
/// unregistered types are kept as text until the type is registered.
///
/// The well-known types are registered from the start.
pub struct AnyRegistry {
    codecs: HashMap<&'static str, AnyCodec>,
}

impl AnyRegistry {
    fn with_well_known_types() -> AnyRegistry {
        let mut registry = AnyRegistry {
            codecs: HashMap::new(),
        };
        registry.insert::<Any>();
        registry.insert::<Duration>();
        registry.insert::<Timestamp>();
        registry.insert::<Empty>();
        registry.insert::<FieldMask>();
        registry.insert::<Struct>();
        registry.insert::<Value>();
        registry.insert::<ListValue>();
        registry.insert::<DoubleValue>();
        registry.insert::<FloatValue>();
        registry.insert::<Int64Value>();
        registry.insert::<UInt64Value>();
        registry.insert::<Int32Value>();
        registry.insert::<UInt32Value>();
        registry.insert::<BoolValue>();
        registry.insert::<StringValue>();
        registry.insert::<BytesValue>();
        registry
    }

    fn insert<M: Message>(&mut self) -> bool {
        let codec = AnyCodec::of::<M>();
        match self.codecs.get(M::NAME) {
            Some(existing) => existing.type_id == codec.type_id,
            None => {
                self.codecs.insert(M::NAME, codec);
                true
            }
        }
    }

    /// Makes `M` resolvable by name.
    ///
    /// Registering the same type twice is harmless. Returns `false`, and leaves the registry
    /// unchanged, if a different type already claimed `M::NAME`.
    pub fn register<M: Message>() -> bool {
        let registered = REGISTRY
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert::<M>();
        if registered {
            log::debug!("registered {} for google.protobuf.Any", M::NAME);
        } else {
            log::warn!(
                "not registering {} for google.protobuf.Any: another type has that name",
                M::NAME
            );
        }
        registered
    }

    pub fn is_registered(full_name: &str) -> bool {
        AnyRegistry::lookup(full_name).is_some()
    }

    pub(crate) fn lookup(full_name: &str) -> Option<AnyCodec> {
        REGISTRY
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .codecs
            .get(full_name)
            .copied()
    }
}
