/// Options for binary decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BinaryDecodingOptions {
    /// How many levels of nested messages and groups are accepted. The outermost message counts
    /// as one level.
    pub message_depth_limit: u32,
    /// Drop unrecognized fields instead of preserving them on proto2 messages.
    pub discard_unknown_fields: bool,
}

impl Default for BinaryDecodingOptions {
    fn default() -> BinaryDecodingOptions {
        BinaryDecodingOptions {
            message_depth_limit: crate::DEFAULT_DEPTH_LIMIT,
            discard_unknown_fields: false,
        }
    }
}

impl BinaryDecodingOptions {
    pub fn with_message_depth_limit(mut self, limit: u32) -> BinaryDecodingOptions {
        self.message_depth_limit = limit;
        self
    }

    pub fn with_discard_unknown_fields(mut self, discard: bool) -> BinaryDecodingOptions {
        self.discard_unknown_fields = discard;
        self
    }
}

/// Options for binary encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BinaryEncodingOptions {
    /// Emit map entries sorted by key, so equal messages encode to equal bytes.
    pub use_deterministic_ordering: bool,
}

impl BinaryEncodingOptions {
    pub fn with_deterministic_ordering(mut self, deterministic: bool) -> BinaryEncodingOptions {
        self.use_deterministic_ordering = deterministic;
        self
    }
}
