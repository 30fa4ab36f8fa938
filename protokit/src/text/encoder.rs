use std::fmt::Write;

use bytes::Buf;

use crate::encoding::{decode_key, decode_len, decode_varint, WireType};
use crate::{float, DecodeError, DEFAULT_DEPTH_LIMIT};

/// Builds text format output line by line, indenting nested blocks by two spaces.
#[derive(Debug, Default)]
pub struct TextEncoder {
    out: String,
    indent: usize,
}

impl TextEncoder {
    pub fn new() -> TextEncoder {
        TextEncoder::default()
    }

    fn with_indent(indent: usize) -> TextEncoder {
        TextEncoder {
            out: String::new(),
            indent,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn start_line(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    pub fn start_field(&mut self, name: &str) {
        self.start_line();
        self.out.push_str(name);
    }

    /// Starts a field written as `[name]`: extensions and expanded `Any` payloads.
    pub fn start_bracketed_field(&mut self, name: &str) {
        self.start_line();
        self.out.push('[');
        self.out.push_str(name);
        self.out.push(']');
    }

    pub fn start_number_field(&mut self, number: u32) {
        self.start_line();
        let _ = write!(self.out, "{number}");
    }

    /// Writes the `: ` between a field name and a scalar value.
    pub fn start_scalar(&mut self) {
        self.out.push_str(": ");
    }

    pub fn end_scalar(&mut self) {
        self.out.push('\n');
    }

    pub fn start_block(&mut self) {
        self.out.push_str(" {\n");
        self.indent += 1;
    }

    pub fn end_block(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.start_line();
        self.out.push_str("}\n");
    }

    pub fn put_i64(&mut self, value: i64) {
        let _ = write!(self.out, "{value}");
    }

    pub fn put_u64(&mut self, value: u64) {
        let _ = write!(self.out, "{value}");
    }

    pub fn put_f64(&mut self, value: f64) {
        float::write_double(&mut self.out, value);
    }

    pub fn put_f32(&mut self, value: f32) {
        float::write_float(&mut self.out, value);
    }

    pub fn put_bool(&mut self, value: bool) {
        self.out.push_str(if value { "true" } else { "false" });
    }

    /// Writes an enum value name or other bare identifier.
    pub fn put_identifier(&mut self, name: &str) {
        self.out.push_str(name);
    }

    /// Non-ASCII characters are written as UTF-8; control characters are escaped.
    pub fn put_string(&mut self, value: &str) {
        self.out.push('"');
        for c in value.chars() {
            if c.is_ascii() {
                self.put_escaped_byte(c as u8);
            } else {
                self.out.push(c);
            }
        }
        self.out.push('"');
    }

    /// Every byte outside printable ASCII is written as a three digit octal escape.
    pub fn put_bytes(&mut self, value: &[u8]) {
        self.out.push('"');
        for &byte in value {
            self.put_escaped_byte(byte);
        }
        self.out.push('"');
    }

    fn put_escaped_byte(&mut self, byte: u8) {
        match byte {
            b'\n' => self.out.push_str("\\n"),
            b'\r' => self.out.push_str("\\r"),
            b'\t' => self.out.push_str("\\t"),
            b'"' => self.out.push_str("\\\""),
            b'\'' => self.out.push_str("\\'"),
            b'\\' => self.out.push_str("\\\\"),
            0x20..=0x7E => self.out.push(char::from(byte)),
            _ => {
                let _ = write!(self.out, "\\{byte:03o}");
            }
        }
    }

    /// Prints raw wire-format fields by number.
    ///
    /// Length-delimited values that parse as a message are printed as blocks, everything else as
    /// bytes. Nothing is written if `data` is not valid wire format.
    pub fn put_unknown_fields(&mut self, data: &[u8]) {
        let mut rendered = TextEncoder::with_indent(self.indent);
        let mut data = data;
        if write_wire_fields(&mut rendered, &mut data, None, DEFAULT_DEPTH_LIMIT).is_ok() {
            self.out.push_str(&rendered.out);
        } else {
            log::debug!("unknown fields are not valid wire format; omitting them");
        }
    }
}

fn write_wire_fields(
    encoder: &mut TextEncoder,
    data: &mut &[u8],
    group: Option<u32>,
    depth: u32,
) -> Result<(), DecodeError> {
    if depth == 0 {
        return Err(DecodeError::new(crate::DecodeErrorKind::DepthLimitExceeded));
    }
    while data.has_remaining() {
        let (number, wire_type) = decode_key(data)?;
        match wire_type {
            WireType::Varint => {
                let value = decode_varint(data)?;
                encoder.start_number_field(number);
                encoder.start_scalar();
                encoder.put_u64(value);
                encoder.end_scalar();
            }
            WireType::SixtyFourBit => {
                if data.remaining() < 8 {
                    return Err(DecodeError::truncated());
                }
                let value = data.get_u64_le();
                encoder.start_number_field(number);
                encoder.start_scalar();
                let _ = write!(encoder.out, "0x{value:016x}");
                encoder.end_scalar();
            }
            WireType::ThirtyTwoBit => {
                if data.remaining() < 4 {
                    return Err(DecodeError::truncated());
                }
                let value = data.get_u32_le();
                encoder.start_number_field(number);
                encoder.start_scalar();
                let _ = write!(encoder.out, "0x{value:08x}");
                encoder.end_scalar();
            }
            WireType::LengthDelimited => {
                let len = decode_len(data)?;
                if data.remaining() < len {
                    return Err(DecodeError::truncated());
                }
                let remaining: &[u8] = data;
                let (payload, rest) = remaining.split_at(len);
                *data = rest;

                let mut nested = TextEncoder::with_indent(encoder.indent + 1);
                let mut probe = payload;
                let is_message = !payload.is_empty()
                    && write_wire_fields(&mut nested, &mut probe, None, depth - 1).is_ok();
                encoder.start_number_field(number);
                if is_message {
                    encoder.start_block();
                    encoder.out.push_str(&nested.out);
                    encoder.end_block();
                } else {
                    encoder.start_scalar();
                    encoder.put_bytes(payload);
                    encoder.end_scalar();
                }
            }
            WireType::StartGroup => {
                encoder.start_number_field(number);
                encoder.start_block();
                write_wire_fields(encoder, data, Some(number), depth - 1)?;
                encoder.end_block();
            }
            WireType::EndGroup => {
                return if group == Some(number) {
                    Ok(())
                } else {
                    Err(DecodeError::malformed("unmatched end group"))
                };
            }
        }
    }
    match group {
        Some(_) => Err(DecodeError::truncated()),
        None => Ok(()),
    }
}
