use protokit::json::{JsonDecoder, JsonEncoder, JsonToken};
use protokit::name_map::{from_json_name, to_json_name};
use protokit::wkt::CustomJsonCodable;
use protokit::{
    Cardinality, Decoder, FieldDescriptor, FieldKind, FieldMaskError, FieldName,
    JsonDecodeError, JsonEncodeError, JsonEncodingOptions, MergeOptions, Message, MessageLayout,
    Syntax, Visitor,
};

static FIELDS: [FieldDescriptor; 1] = [FieldDescriptor::new(
    1,
    FieldName::Same("paths"),
    FieldKind::String,
    Cardinality::Repeated,
)];

static LAYOUT: MessageLayout =
    MessageLayout::new("google.protobuf.FieldMask", Syntax::Proto3, &FIELDS);

/// A set of field paths such as `user.display_name`: `google.protobuf.FieldMask`.
///
/// JSON joins the paths with commas, each written in lowerCamelCase (`"user.displayName"`). A
/// path only has a JSON form if converting it to camel case and back gives the same path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct FieldMask {
    pub paths: Vec<String>,
}

impl FieldMask {
    pub fn new<I, S>(paths: I) -> FieldMask
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldMask {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether every path names a field of `M`, descending through singular message fields.
    pub fn is_valid_for<M: Message>(&self) -> bool {
        self.paths
            .iter()
            .all(|path| protokit::field_mask::is_valid_path::<M>(path))
    }

    /// Clears the fields this mask names in `message`.
    pub fn clear<M: Message>(&self, message: &mut M) -> Result<(), FieldMaskError> {
        message.mask(&self.paths)
    }

    /// Copies the fields this mask names from `source` into `message`.
    pub fn copy<M: Message>(
        &self,
        message: &mut M,
        source: &M,
        options: &MergeOptions,
    ) -> Result<(), FieldMaskError> {
        message.override_with(source, &self.paths, options)
    }

    fn json_text(&self) -> Option<String> {
        let mut paths = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            let json = to_json_name(path);
            if from_json_name(&json).as_deref() != Some(path.as_str()) {
                return None;
            }
            paths.push(json);
        }
        Some(paths.join(","))
    }

    fn from_json_text(text: &str) -> Option<FieldMask> {
        if text.is_empty() {
            return Some(FieldMask::default());
        }
        let paths = text
            .split(',')
            .map(from_json_name)
            .collect::<Option<Vec<_>>>()?;
        Some(FieldMask { paths })
    }
}

impl Message for FieldMask {
    const NAME: &'static str = "google.protobuf.FieldMask";

    fn layout() -> &'static MessageLayout {
        &LAYOUT
    }

    fn decode_message<D: Decoder>(&mut self, decoder: &mut D) -> Result<(), D::Error> {
        while let Some(field_number) = decoder.next_field_number()? {
            if field_number == 1 {
                decoder.decode_repeated_string_field(&mut self.paths)?;
            }
        }
        Ok(())
    }

    fn traverse<V: Visitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        if !self.paths.is_empty() {
            visitor.visit_repeated_string_field(&self.paths, 1)?;
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

impl CustomJsonCodable for FieldMask {
    fn encode_json(
        &self,
        encoder: &mut JsonEncoder,
        _options: &JsonEncodingOptions,
    ) -> Result<(), JsonEncodeError> {
        let text = self.json_text().ok_or(JsonEncodeError::FieldMaskConversion)?;
        encoder.put_string(&text);
        Ok(())
    }

    fn decode_json(&mut self, decoder: &mut JsonDecoder<'_, '_>) -> Result<(), JsonDecodeError> {
        match decoder.scanner().next()? {
            JsonToken::String(text) => {
                *self = FieldMask::from_json_text(&text).ok_or(JsonDecodeError::MalformedFieldMask)?;
                Ok(())
            }
            _ => Err(JsonDecodeError::MalformedFieldMask),
        }
    }
}
