/// Options for writing JSON.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JsonEncodingOptions {
    /// Write 64-bit integers as bare numbers instead of strings.
    pub always_print_int64s_as_numbers: bool,
    /// Write enum values as numbers instead of names.
    pub always_print_enums_as_ints: bool,
    /// Use the `.proto` field names instead of lowerCamelCase ones.
    pub preserve_proto_field_names: bool,
    /// Sort map entries by key.
    pub use_deterministic_ordering: bool,
}

impl JsonEncodingOptions {
    pub fn with_int64s_as_numbers(mut self, enabled: bool) -> JsonEncodingOptions {
        self.always_print_int64s_as_numbers = enabled;
        self
    }

    pub fn with_enums_as_ints(mut self, enabled: bool) -> JsonEncodingOptions {
        self.always_print_enums_as_ints = enabled;
        self
    }

    pub fn with_proto_field_names(mut self, enabled: bool) -> JsonEncodingOptions {
        self.preserve_proto_field_names = enabled;
        self
    }

    pub fn with_deterministic_ordering(mut self, enabled: bool) -> JsonEncodingOptions {
        self.use_deterministic_ordering = enabled;
        self
    }
}

/// Options for reading JSON.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JsonDecodingOptions {
    /// Skip object keys that name no field, and enum names that name no value.
    pub ignore_unknown_fields: bool,
    /// How many levels of nested objects and arrays are accepted.
    pub message_depth_limit: u32,
}

impl Default for JsonDecodingOptions {
    fn default() -> JsonDecodingOptions {
        JsonDecodingOptions {
            ignore_unknown_fields: false,
            message_depth_limit: crate::DEFAULT_DEPTH_LIMIT,
        }
    }
}

impl JsonDecodingOptions {
    pub fn with_ignore_unknown_fields(mut self, ignore: bool) -> JsonDecodingOptions {
        self.ignore_unknown_fields = ignore;
        self
    }

    pub fn with_message_depth_limit(mut self, limit: u32) -> JsonDecodingOptions {
        self.message_depth_limit = limit;
        self
    }
}
