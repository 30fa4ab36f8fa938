use std::fmt::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::float;

/// Builds JSON text one token at a time.
///
/// The writer inserts commas itself: every value, including a whole object or array, marks that
/// the next value needs a separator, and `start_field`, `start_object` and `start_array` clear
/// the mark.
#[derive(Debug, Default)]
pub struct JsonEncoder {
    out: String,
    separator: bool,
}

impl JsonEncoder {
    pub fn new() -> JsonEncoder {
        JsonEncoder::default()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn separate(&mut self) {
        if self.separator {
            self.out.push(',');
            self.separator = false;
        }
    }

    fn value_written(&mut self) {
        self.separator = true;
    }

    /// Writes `"name":`.
    pub fn start_field(&mut self, name: &str) {
        self.separate();
        write_quoted(&mut self.out, name);
        self.out.push(':');
    }

    /// Writes `"[full.name]":`.
    pub fn start_extension_field(&mut self, full_name: &str) {
        self.separate();
        self.out.push_str("\"[");
        write_escaped(&mut self.out, full_name);
        self.out.push_str("]\":");
    }

    pub fn start_object(&mut self) {
        self.separate();
        self.out.push('{');
    }

    pub fn end_object(&mut self) {
        self.out.push('}');
        self.value_written();
    }

    pub fn start_array(&mut self) {
        self.separate();
        self.out.push('[');
    }

    pub fn end_array(&mut self) {
        self.out.push(']');
        self.value_written();
    }

    pub fn put_string(&mut self, value: &str) {
        self.separate();
        write_quoted(&mut self.out, value);
        self.value_written();
    }

    pub fn put_i32(&mut self, value: i32) {
        self.separate();
        let _ = write!(self.out, "{value}");
        self.value_written();
    }

    pub fn put_u32(&mut self, value: u32) {
        self.separate();
        let _ = write!(self.out, "{value}");
        self.value_written();
    }

    /// 64-bit integers are quoted unless `quoted` is false; not every JSON reader keeps 64 bits
    /// of precision.
    pub fn put_i64(&mut self, value: i64, quoted: bool) {
        self.separate();
        if quoted {
            let _ = write!(self.out, "\"{value}\"");
        } else {
            let _ = write!(self.out, "{value}");
        }
        self.value_written();
    }

    pub fn put_u64(&mut self, value: u64, quoted: bool) {
        self.separate();
        if quoted {
            let _ = write!(self.out, "\"{value}\"");
        } else {
            let _ = write!(self.out, "{value}");
        }
        self.value_written();
    }

    pub fn put_f64(&mut self, value: f64) {
        self.separate();
        if value.is_finite() {
            float::write_double(&mut self.out, value);
        } else {
            self.out.push_str(non_finite(value));
        }
        self.value_written();
    }

    pub fn put_f32(&mut self, value: f32) {
        self.separate();
        if value.is_finite() {
            float::write_float(&mut self.out, value);
        } else {
            self.out.push_str(non_finite(f64::from(value)));
        }
        self.value_written();
    }

    pub fn put_bool(&mut self, value: bool) {
        self.separate();
        self.out.push_str(if value { "true" } else { "false" });
        self.value_written();
    }

    pub fn put_null(&mut self) {
        self.separate();
        self.out.push_str("null");
        self.value_written();
    }

    /// Standard base64 with padding.
    pub fn put_bytes(&mut self, value: &[u8]) {
        self.separate();
        self.out.push('"');
        STANDARD.encode_string(value, &mut self.out);
        self.out.push('"');
        self.value_written();
    }

    /// Appends one complete, already valid JSON value.
    pub fn append_raw(&mut self, json: &str) {
        self.separate();
        self.out.push_str(json);
        self.value_written();
    }
}

fn non_finite(value: f64) -> &'static str {
    if value.is_nan() {
        "\"NaN\""
    } else if value > 0.0 {
        "\"Infinity\""
    } else {
        "\"-Infinity\""
    }
}

fn write_quoted(out: &mut String, value: &str) {
    out.push('"');
    write_escaped(out, value);
    out.push('"');
}

fn write_escaped(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
}
