use std::fmt;

use crate::Visitor;

/// Raw wire-format bytes of fields the decoding schema did not recognize.
///
/// The bytes are kept exactly as they were read (tag followed by value) so a decode followed by
/// an encode reproduces them verbatim.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct UnknownFields {
    data: Vec<u8>,
}

impl UnknownFields {
    pub const fn new() -> UnknownFields {
        UnknownFields { data: Vec::new() }
    }

    /// Appends raw `tag + value` bytes.
    pub fn append(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Hands the stored bytes to the visitor, if there are any.
    pub fn traverse<V: Visitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
        if self.data.is_empty() {
            Ok(())
        } else {
            visitor.visit_unknown(&self.data)
        }
    }
}

impl fmt::Debug for UnknownFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnknownFields({} bytes)", self.data.len())
    }
}

impl From<Vec<u8>> for UnknownFields {
    fn from(data: Vec<u8>) -> UnknownFields {
        UnknownFields { data }
    }
}
