//! proto2 extension fields.
//!
//! An extension is declared once as a `static` [`Extension`], whose kind type parameter fixes the
//! Rust type of its value. Messages with extension ranges hold an [`ExtensionSet`]; values in it
//! are type erased behind [`AnyExtensionField`] so the container never needs to know the
//! extension types. Decoders find extensions through an [`ExtensionRegistry`] passed in by the
//! caller.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::marker::PhantomData;

use bytes::BufMut;

use crate::binary::{BinaryDecoder, BinaryEncodingVisitor, BinaryReverseEncodingVisitor, SizeVisitor};
use crate::field_types::FieldType;
use crate::hash::HashVisitor;
use crate::json::{JsonDecodeError, JsonDecoder, JsonEncodeError, JsonEncodingVisitor};
use crate::text::{TextDecodeError, TextDecoder, TextEncodeError, TextEncodingVisitor};
use crate::{DecodeError, Decoder, EncodeError, Enum, Message, Visitor};

/// The identity of an extension field.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ExtensionDescriptor {
    pub field_number: u32,
    /// Fully qualified name of the extension, as written in `[...]` keys.
    pub full_name: &'static str,
    /// Fully qualified name of the message being extended.
    pub extendee: &'static str,
}

/// How an extension's value is stored, decoded and visited.
pub trait ExtensionKind: 'static {
    type Value: Clone + fmt::Debug + PartialEq + Send + Sync + 'static;

    fn decode<D: Decoder>(decoder: &mut D, value: &mut Option<Self::Value>) -> Result<(), D::Error>;

    fn traverse<V: Visitor>(
        value: &Self::Value,
        field_number: u32,
        visitor: &mut V,
    ) -> Result<(), V::Error>;

    fn is_initialized(_value: &Self::Value) -> bool {
        true
    }
}

macro_rules! kind {
    ($(#[$meta:meta])* $name:ident<$param:ident: $bound:ident>) => {
        $(#[$meta])*
        pub struct $name<$param: $bound>(PhantomData<fn() -> $param>);
    };
}

kind!(
    /// A singular scalar extension.
    Optional<T: FieldType>
);
kind!(Repeated<T: FieldType>);
kind!(Packed<T: FieldType>);
kind!(OptionalEnum<E: Enum>);
kind!(RepeatedEnum<E: Enum>);
kind!(PackedEnum<E: Enum>);
kind!(OptionalMessage<M: Message>);
kind!(RepeatedMessage<M: Message>);
kind!(OptionalGroup<M: Message>);
kind!(RepeatedGroup<M: Message>);

/// Moves decoded elements into `value`, leaving it unset if nothing was read.
fn store_repeated<T>(value: &mut Option<Vec<T>>, values: Vec<T>) {
    if !values.is_empty() {
        *value = Some(values);
    }
}

impl<T: FieldType> ExtensionKind for Optional<T> {
    type Value = T::Value;

    fn decode<D: Decoder>(decoder: &mut D, value: &mut Option<T::Value>) -> Result<(), D::Error> {
        T::decode_optional(decoder, value)
    }

    fn traverse<V: Visitor>(value: &T::Value, field_number: u32, visitor: &mut V) -> Result<(), V::Error> {
        T::visit_singular(value, field_number, visitor)
    }
}

impl<T: FieldType> ExtensionKind for Repeated<T> {
    type Value = Vec<T::Value>;

    fn decode<D: Decoder>(decoder: &mut D, value: &mut Option<Vec<T::Value>>) -> Result<(), D::Error> {
        let mut values = value.take().unwrap_or_default();
        T::decode_repeated(decoder, &mut values)?;
        store_repeated(value, values);
        Ok(())
    }

    fn traverse<V: Visitor>(value: &Vec<T::Value>, field_number: u32, visitor: &mut V) -> Result<(), V::Error> {
        T::visit_repeated(value, field_number, visitor)
    }
}

impl<T: FieldType> ExtensionKind for Packed<T> {
    type Value = Vec<T::Value>;

    fn decode<D: Decoder>(decoder: &mut D, value: &mut Option<Vec<T::Value>>) -> Result<(), D::Error> {
        let mut values = value.take().unwrap_or_default();
        T::decode_repeated(decoder, &mut values)?;
        store_repeated(value, values);
        Ok(())
    }

    fn traverse<V: Visitor>(value: &Vec<T::Value>, field_number: u32, visitor: &mut V) -> Result<(), V::Error> {
        T::visit_packed(value, field_number, visitor)
    }
}

impl<E: Enum> ExtensionKind for OptionalEnum<E> {
    type Value = E;

    fn decode<D: Decoder>(decoder: &mut D, value: &mut Option<E>) -> Result<(), D::Error> {
        decoder.decode_optional_enum_field(value)
    }

    fn traverse<V: Visitor>(value: &E, field_number: u32, visitor: &mut V) -> Result<(), V::Error> {
        visitor.visit_singular_enum_field(*value, field_number)
    }
}

impl<E: Enum> ExtensionKind for RepeatedEnum<E> {
    type Value = Vec<E>;

    fn decode<D: Decoder>(decoder: &mut D, value: &mut Option<Vec<E>>) -> Result<(), D::Error> {
        let mut values = value.take().unwrap_or_default();
        decoder.decode_repeated_enum_field(&mut values)?;
        store_repeated(value, values);
        Ok(())
    }

    fn traverse<V: Visitor>(value: &Vec<E>, field_number: u32, visitor: &mut V) -> Result<(), V::Error> {
        visitor.visit_repeated_enum_field(value, field_number)
    }
}

impl<E: Enum> ExtensionKind for PackedEnum<E> {
    type Value = Vec<E>;

    fn decode<D: Decoder>(decoder: &mut D, value: &mut Option<Vec<E>>) -> Result<(), D::Error> {
        let mut values = value.take().unwrap_or_default();
        decoder.decode_repeated_enum_field(&mut values)?;
        store_repeated(value, values);
        Ok(())
    }

    fn traverse<V: Visitor>(value: &Vec<E>, field_number: u32, visitor: &mut V) -> Result<(), V::Error> {
        visitor.visit_packed_enum_field(value, field_number)
    }
}

impl<M: Message> ExtensionKind for OptionalMessage<M> {
    type Value = M;

    fn decode<D: Decoder>(decoder: &mut D, value: &mut Option<M>) -> Result<(), D::Error> {
        decoder.decode_singular_message_field(value)
    }

    fn traverse<V: Visitor>(value: &M, field_number: u32, visitor: &mut V) -> Result<(), V::Error> {
        visitor.visit_singular_message_field(value, field_number)
    }

    fn is_initialized(value: &M) -> bool {
        value.is_initialized()
    }
}

impl<M: Message> ExtensionKind for RepeatedMessage<M> {
    type Value = Vec<M>;

    fn decode<D: Decoder>(decoder: &mut D, value: &mut Option<Vec<M>>) -> Result<(), D::Error> {
        let mut values = value.take().unwrap_or_default();
        decoder.decode_repeated_message_field(&mut values)?;
        store_repeated(value, values);
        Ok(())
    }

    fn traverse<V: Visitor>(value: &Vec<M>, field_number: u32, visitor: &mut V) -> Result<(), V::Error> {
        visitor.visit_repeated_message_field(value, field_number)
    }

    fn is_initialized(value: &Vec<M>) -> bool {
        value.iter().all(Message::is_initialized)
    }
}

impl<M: Message> ExtensionKind for OptionalGroup<M> {
    type Value = M;

    fn decode<D: Decoder>(decoder: &mut D, value: &mut Option<M>) -> Result<(), D::Error> {
        decoder.decode_singular_group_field(value)
    }

    fn traverse<V: Visitor>(value: &M, field_number: u32, visitor: &mut V) -> Result<(), V::Error> {
        visitor.visit_singular_group_field(value, field_number)
    }

    fn is_initialized(value: &M) -> bool {
        value.is_initialized()
    }
}

impl<M: Message> ExtensionKind for RepeatedGroup<M> {
    type Value = Vec<M>;

    fn decode<D: Decoder>(decoder: &mut D, value: &mut Option<Vec<M>>) -> Result<(), D::Error> {
        let mut values = value.take().unwrap_or_default();
        decoder.decode_repeated_group_field(&mut values)?;
        store_repeated(value, values);
        Ok(())
    }

    fn traverse<V: Visitor>(value: &Vec<M>, field_number: u32, visitor: &mut V) -> Result<(), V::Error> {
        visitor.visit_repeated_group_field(value, field_number)
    }

    fn is_initialized(value: &Vec<M>) -> bool {
        value.iter().all(Message::is_initialized)
    }
}

/// A typed extension declaration.
pub struct Extension<K: ExtensionKind> {
    descriptor: ExtensionDescriptor,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ExtensionKind> Extension<K> {
    pub const fn new(
        field_number: u32,
        full_name: &'static str,
        extendee: &'static str,
    ) -> Extension<K> {
        Extension {
            descriptor: ExtensionDescriptor {
                field_number,
                full_name,
                extendee,
            },
            _kind: PhantomData,
        }
    }

    pub fn descriptor(&self) -> &ExtensionDescriptor {
        &self.descriptor
    }
}

impl<K: ExtensionKind> fmt::Debug for Extension<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Extension").field(&self.descriptor).finish()
    }
}

/// A type-erased extension value, as stored in an [`ExtensionSet`].
///
/// Each method hands the value to one of the library's visitors or decoders, which cannot be
/// generic here.
pub trait AnyExtensionField: fmt::Debug + Send + Sync {
    fn descriptor(&self) -> &'static ExtensionDescriptor;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn box_clone(&self) -> Box<dyn AnyExtensionField>;
    fn dyn_eq(&self, other: &dyn AnyExtensionField) -> bool;
    fn is_initialized(&self) -> bool;
    fn visit_size(&self, visitor: &mut SizeVisitor) -> Result<(), EncodeError>;
    fn visit_binary(&self, visitor: &mut BinaryEncodingVisitor<&mut dyn BufMut>) -> Result<(), EncodeError>;
    fn visit_binary_reverse(&self, visitor: &mut BinaryReverseEncodingVisitor<'_>) -> Result<(), EncodeError>;
    fn visit_json(&self, visitor: &mut JsonEncodingVisitor<'_>) -> Result<(), JsonEncodeError>;
    fn visit_text(&self, visitor: &mut TextEncodingVisitor<'_>) -> Result<(), TextEncodeError>;
    fn visit_hash(&self, visitor: &mut HashVisitor) -> Result<(), EncodeError>;
}

struct ExtensionValue<K: ExtensionKind> {
    descriptor: &'static ExtensionDescriptor,
    value: K::Value,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ExtensionKind> ExtensionValue<K> {
    fn new(descriptor: &'static ExtensionDescriptor, value: K::Value) -> ExtensionValue<K> {
        ExtensionValue {
            descriptor,
            value,
            _kind: PhantomData,
        }
    }

    fn traverse<V: Visitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        K::traverse(&self.value, self.descriptor.field_number, visitor)
    }
}

impl<K: ExtensionKind> fmt::Debug for ExtensionValue<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionValue")
            .field("name", &self.descriptor.full_name)
            .field("value", &self.value)
            .finish()
    }
}

impl<K: ExtensionKind> AnyExtensionField for ExtensionValue<K> {
    fn descriptor(&self) -> &'static ExtensionDescriptor {
        self.descriptor
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn box_clone(&self) -> Box<dyn AnyExtensionField> {
        Box::new(ExtensionValue::<K>::new(self.descriptor, self.value.clone()))
    }

    fn dyn_eq(&self, other: &dyn AnyExtensionField) -> bool {
        other
            .as_any()
            .downcast_ref::<ExtensionValue<K>>()
            .is_some_and(|other| other.value == self.value)
    }

    fn is_initialized(&self) -> bool {
        K::is_initialized(&self.value)
    }

    fn visit_size(&self, visitor: &mut SizeVisitor) -> Result<(), EncodeError> {
        self.traverse(visitor)
    }

    fn visit_binary(&self, visitor: &mut BinaryEncodingVisitor<&mut dyn BufMut>) -> Result<(), EncodeError> {
        self.traverse(visitor)
    }

    fn visit_binary_reverse(&self, visitor: &mut BinaryReverseEncodingVisitor<'_>) -> Result<(), EncodeError> {
        self.traverse(visitor)
    }

    fn visit_json(&self, visitor: &mut JsonEncodingVisitor<'_>) -> Result<(), JsonEncodeError> {
        let previous = visitor.set_extension_name(Some(self.descriptor.full_name));
        let result = self.traverse(visitor);
        visitor.set_extension_name(previous);
        result
    }

    fn visit_text(&self, visitor: &mut TextEncodingVisitor<'_>) -> Result<(), TextEncodeError> {
        let previous = visitor.set_extension_name(Some(self.descriptor.full_name));
        let result = self.traverse(visitor);
        visitor.set_extension_name(previous);
        result
    }

    fn visit_hash(&self, visitor: &mut HashVisitor) -> Result<(), EncodeError> {
        self.traverse(visitor)
    }
}

/// Returned by [`ExtensionSet::try_get`] when the stored value has a different type.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("extension field {field_number} holds `{stored}`, not `{requested}`")]
pub struct ExtensionMismatch {
    pub field_number: u32,
    pub stored: &'static str,
    pub requested: &'static str,
}

/// The extension values set on one message, keyed by field number.
#[derive(Default)]
pub struct ExtensionSet {
    values: BTreeMap<u32, Box<dyn AnyExtensionField>>,
}

impl ExtensionSet {
    pub fn new() -> ExtensionSet {
        ExtensionSet::default()
    }

    pub fn get<K: ExtensionKind>(&self, extension: &'static Extension<K>) -> Option<&K::Value> {
        self.try_get(extension).ok().flatten()
    }

    /// Like [`ExtensionSet::get`], but reports a value of another type stored under the same
    /// field number instead of hiding it.
    pub fn try_get<K: ExtensionKind>(
        &self,
        extension: &'static Extension<K>,
    ) -> Result<Option<&K::Value>, ExtensionMismatch> {
        let number = extension.descriptor.field_number;
        let Some(field) = self.values.get(&number) else {
            return Ok(None);
        };
        match field.as_any().downcast_ref::<ExtensionValue<K>>() {
            Some(stored) if stored.descriptor == &extension.descriptor => Ok(Some(&stored.value)),
            _ => Err(ExtensionMismatch {
                field_number: number,
                stored: field.descriptor().full_name,
                requested: extension.descriptor.full_name,
            }),
        }
    }

    pub fn get_mut<K: ExtensionKind>(&mut self, extension: &'static Extension<K>) -> Option<&mut K::Value> {
        self.values
            .get_mut(&extension.descriptor.field_number)?
            .as_any_mut()
            .downcast_mut::<ExtensionValue<K>>()
            .filter(|stored| stored.descriptor == &extension.descriptor)
            .map(|stored| &mut stored.value)
    }

    pub fn set<K: ExtensionKind>(&mut self, extension: &'static Extension<K>, value: K::Value) {
        self.values.insert(
            extension.descriptor.field_number,
            Box::new(ExtensionValue::<K>::new(&extension.descriptor, value)),
        );
    }

    pub fn has<K: ExtensionKind>(&self, extension: &'static Extension<K>) -> bool {
        self.values
            .get(&extension.descriptor.field_number)
            .is_some_and(|field| field.descriptor() == &extension.descriptor)
    }

    pub fn clear<K: ExtensionKind>(&mut self, extension: &'static Extension<K>) {
        if self.has(extension) {
            self.values.remove(&extension.descriptor.field_number);
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn AnyExtensionField> + '_ {
        self.values.values().map(|field| &**field)
    }

    /// The values whose field numbers fall in `start..end`, in ascending order.
    pub fn range(&self, start: u32, end: u32) -> impl Iterator<Item = &dyn AnyExtensionField> + '_ {
        self.values
            .range(start..end.max(start))
            .map(|(_, field)| &**field)
    }

    pub fn is_initialized(&self) -> bool {
        self.values.values().all(|field| field.is_initialized())
    }

    /// Removes and returns the value for `extension`, so decoding can merge into it.
    fn take<K: ExtensionKind>(&mut self, extension: &'static Extension<K>) -> Option<K::Value> {
        let field = self.values.remove(&extension.descriptor.field_number)?;
        field
            .into_any()
            .downcast::<ExtensionValue<K>>()
            .ok()
            .map(|stored| stored.value)
    }
}

impl Clone for ExtensionSet {
    fn clone(&self) -> ExtensionSet {
        ExtensionSet {
            values: self
                .values
                .iter()
                .map(|(number, field)| (*number, field.box_clone()))
                .collect(),
        }
    }
}

impl PartialEq for ExtensionSet {
    fn eq(&self, other: &ExtensionSet) -> bool {
        self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(other.values.iter())
                .all(|((a_number, a), (b_number, b))| a_number == b_number && a.dyn_eq(&**b))
    }
}

impl fmt::Debug for ExtensionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values.values()).finish()
    }
}

/// A registered extension as seen by the decoders.
pub trait ExtensionHandle: Send + Sync {
    fn descriptor(&self) -> &'static ExtensionDescriptor;

    fn decode_binary(
        &self,
        decoder: &mut BinaryDecoder<'_>,
        values: &mut ExtensionSet,
    ) -> Result<(), DecodeError>;

    fn decode_json(
        &self,
        decoder: &mut JsonDecoder<'_, '_>,
        values: &mut ExtensionSet,
    ) -> Result<(), JsonDecodeError>;

    fn decode_text(
        &self,
        decoder: &mut TextDecoder<'_, '_>,
        values: &mut ExtensionSet,
    ) -> Result<(), TextDecodeError>;
}

struct Registered<K: ExtensionKind>(&'static Extension<K>);

impl<K: ExtensionKind> Registered<K> {
    fn decode<D: Decoder>(&self, decoder: &mut D, values: &mut ExtensionSet) -> Result<(), D::Error> {
        let mut value = values.take(self.0);
        let result = K::decode(decoder, &mut value);
        if let Some(value) = value {
            values.set(self.0, value);
        }
        result
    }
}

impl<K: ExtensionKind> ExtensionHandle for Registered<K> {
    fn descriptor(&self) -> &'static ExtensionDescriptor {
        &self.0.descriptor
    }

    fn decode_binary(
        &self,
        decoder: &mut BinaryDecoder<'_>,
        values: &mut ExtensionSet,
    ) -> Result<(), DecodeError> {
        self.decode(decoder, values)
    }

    fn decode_json(
        &self,
        decoder: &mut JsonDecoder<'_, '_>,
        values: &mut ExtensionSet,
    ) -> Result<(), JsonDecodeError> {
        self.decode(decoder, values)
    }

    fn decode_text(
        &self,
        decoder: &mut TextDecoder<'_, '_>,
        values: &mut ExtensionSet,
    ) -> Result<(), TextDecodeError> {
        self.decode(decoder, values)
    }
}

/// The extensions a decode call should recognize.
#[derive(Default)]
pub struct ExtensionRegistry {
    by_number: HashMap<(&'static str, u32), Box<dyn ExtensionHandle>>,
    by_name: HashMap<&'static str, (&'static str, u32)>,
}

impl ExtensionRegistry {
    pub fn new() -> ExtensionRegistry {
        ExtensionRegistry::default()
    }

    pub fn insert<K: ExtensionKind>(&mut self, extension: &'static Extension<K>) {
        let descriptor = &extension.descriptor;
        let key = (descriptor.extendee, descriptor.field_number);
        log::debug!(
            "registering extension {} on {}",
            descriptor.full_name,
            descriptor.extendee
        );
        self.by_name.insert(descriptor.full_name, key);
        self.by_number.insert(key, Box::new(Registered(extension)));
    }

    /// Builder form of [`ExtensionRegistry::insert`].
    pub fn with<K: ExtensionKind>(mut self, extension: &'static Extension<K>) -> ExtensionRegistry {
        self.insert(extension);
        self
    }

    pub fn find(&self, extendee: &'static str, field_number: u32) -> Option<&dyn ExtensionHandle> {
        self.by_number
            .get(&(extendee, field_number))
            .map(|handle| &**handle)
    }

    /// Looks up an extension of `extendee` by the name used in `[...]` keys.
    pub fn find_by_name(&self, extendee: &str, full_name: &str) -> Option<&dyn ExtensionHandle> {
        let key = self.by_name.get(full_name)?;
        if key.0 != extendee {
            return None;
        }
        self.by_number.get(key).map(|handle| &**handle)
    }

    pub fn len(&self) -> usize {
        self.by_number.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_number.is_empty()
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.by_name.keys()).finish()
    }
}
