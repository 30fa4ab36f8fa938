/// Options for reading the text format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextFormatDecodingOptions {
    /// How many levels of nested messages are accepted.
    pub message_depth_limit: u32,
    /// Skip fields whose names the message does not declare.
    pub ignore_unknown_fields: bool,
    /// Skip `[extension]` fields missing from the registry.
    pub ignore_unknown_extension_fields: bool,
}

impl Default for TextFormatDecodingOptions {
    fn default() -> TextFormatDecodingOptions {
        TextFormatDecodingOptions {
            message_depth_limit: crate::DEFAULT_DEPTH_LIMIT,
            ignore_unknown_fields: false,
            ignore_unknown_extension_fields: false,
        }
    }
}

impl TextFormatDecodingOptions {
    pub fn with_message_depth_limit(mut self, limit: u32) -> TextFormatDecodingOptions {
        self.message_depth_limit = limit;
        self
    }

    pub fn with_ignore_unknown_fields(mut self, ignore: bool) -> TextFormatDecodingOptions {
        self.ignore_unknown_fields = ignore;
        self
    }

    pub fn with_ignore_unknown_extension_fields(mut self, ignore: bool) -> TextFormatDecodingOptions {
        self.ignore_unknown_extension_fields = ignore;
        self
    }
}

/// Options for writing the text format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextFormatEncodingOptions {
    /// Print preserved unknown fields by field number.
    pub print_unknown_fields: bool,
}

impl Default for TextFormatEncodingOptions {
    fn default() -> TextFormatEncodingOptions {
        TextFormatEncodingOptions {
            print_unknown_fields: true,
        }
    }
}

impl TextFormatEncodingOptions {
    pub fn with_print_unknown_fields(mut self, enabled: bool) -> TextFormatEncodingOptions {
        self.print_unknown_fields = enabled;
        self
    }
}
