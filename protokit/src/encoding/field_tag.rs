use std::fmt;

use super::{WireType, MAX_TAG, MIN_TAG};
use crate::DecodeError;

/// A field number and wire type packed into the 32-bit value that precedes
/// every field on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldTag(u32);

impl FieldTag {
    /// Packs a field number and wire type.
    ///
    /// Panics in debug builds if the field number is outside `1..=2^29-1`.
    #[inline]
    pub fn new(field_number: u32, wire_type: WireType) -> FieldTag {
        debug_assert!((MIN_TAG..=MAX_TAG).contains(&field_number));
        FieldTag((field_number << 3) | wire_type as u32)
    }

    #[inline]
    pub fn field_number(self) -> u32 {
        self.0 >> 3
    }

    #[inline]
    pub fn wire_type(self) -> WireType {
        // The low three bits were validated on construction.
        match self.0 & 7 {
            0 => WireType::Varint,
            1 => WireType::SixtyFourBit,
            2 => WireType::LengthDelimited,
            3 => WireType::StartGroup,
            4 => WireType::EndGroup,
            _ => WireType::ThirtyTwoBit,
        }
    }

    #[inline]
    pub fn raw_value(self) -> u32 {
        self.0
    }
}

impl TryFrom<u64> for FieldTag {
    type Error = DecodeError;

    /// Validates a raw key read from the wire.
    #[inline]
    fn try_from(key: u64) -> Result<FieldTag, DecodeError> {
        if key > u64::from(u32::MAX) {
            return Err(DecodeError::malformed(format!("invalid key value: {key}")));
        }
        WireType::try_from(key & 0x07)?;
        let tag = key as u32;
        if tag >> 3 < MIN_TAG {
            return Err(DecodeError::malformed("invalid tag value: 0"));
        }
        Ok(FieldTag(tag))
    }
}

impl fmt::Debug for FieldTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldTag")
            .field("field_number", &self.field_number())
            .field("wire_type", &self.wire_type())
            .finish()
    }
}
