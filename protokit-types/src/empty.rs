use protokit::{Decoder, Message, MessageLayout, Syntax, Visitor};

static LAYOUT: MessageLayout = MessageLayout::new("google.protobuf.Empty", Syntax::Proto3, &[]);

/// A message with no fields, for methods that take or return nothing: `google.protobuf.Empty`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct Empty {}

impl Message for Empty {
    const NAME: &'static str = "google.protobuf.Empty";

    fn layout() -> &'static MessageLayout {
        &LAYOUT
    }

    fn decode_message<D: Decoder>(&mut self, decoder: &mut D) -> Result<(), D::Error> {
        while decoder.next_field_number()?.is_some() {}
        Ok(())
    }

    fn traverse<V: Visitor>(&self, _visitor: &mut V) -> Result<(), V::Error> {
        Ok(())
    }
}
