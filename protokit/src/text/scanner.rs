//! Text format tokenizer.

use crate::float;
use crate::text::TextDecodeError;

type Result<T> = std::result::Result<T, TextDecodeError>;

/// The name in front of a field value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldKey<'a> {
    /// A plain identifier.
    Name(&'a str),
    /// `[pkg.ext]` or `[type.googleapis.com/pkg.Msg]`, with interior whitespace removed.
    Bracketed(String),
}

/// Reads text format tokens on demand.
///
/// Unlike JSON, the text format has no self-describing tokens (`1` is an integer, a float, a
/// bool or an enum depending on the field), so the decoder asks for the kind of value it expects.
#[derive(Debug)]
pub struct TextScanner<'a> {
    source: &'a str,
    pos: usize,
    depth_remaining: u32,
}

impl<'a> TextScanner<'a> {
    pub fn new(source: &'a str, depth_limit: u32) -> TextScanner<'a> {
        TextScanner {
            source,
            pos: 0,
            depth_remaining: depth_limit,
        }
    }

    pub fn depth_remaining(&self) -> u32 {
        self.depth_remaining
    }

    pub fn enter(&mut self) -> Result<()> {
        self.depth_remaining = self
            .depth_remaining
            .checked_sub(1)
            .ok_or(TextDecodeError::DepthLimitExceeded)?;
        Ok(())
    }

    pub fn leave(&mut self) {
        self.depth_remaining += 1;
    }

    fn bytes(&self) -> &'a [u8] {
        self.source.as_bytes()
    }

    /// Skips whitespace and `#` comments.
    fn skip_whitespace(&mut self) {
        let bytes = self.bytes();
        while let Some(&byte) = bytes.get(self.pos) {
            match byte {
                b' ' | b'\t' | b'\r' | b'\n' | 0x0B | 0x0C => self.pos += 1,
                b'#' => {
                    self.pos = bytes[self.pos..]
                        .iter()
                        .position(|&byte| byte == b'\n')
                        .map_or(bytes.len(), |offset| self.pos + offset);
                }
                _ => break,
            }
        }
    }

    pub fn is_at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.pos >= self.source.len()
    }

    pub fn peek_byte(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.bytes().get(self.pos).copied()
    }

    pub fn skip_optional_byte(&mut self, expected: u8) -> bool {
        if self.peek_byte() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn skip_required_byte(&mut self, expected: u8) -> Result<()> {
        if self.skip_optional_byte(expected) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    /// Fields may be separated by `,` or `;`.
    pub fn skip_optional_separator(&mut self) {
        if !self.skip_optional_byte(b',') {
            self.skip_optional_byte(b';');
        }
    }

    /// Opens a message block, returning the byte that closes it.
    pub fn open_block(&mut self) -> Result<u8> {
        if self.skip_optional_byte(b'{') {
            Ok(b'}')
        } else if self.skip_optional_byte(b'<') {
            Ok(b'>')
        } else {
            Err(self.unexpected())
        }
    }

    fn unexpected(&mut self) -> TextDecodeError {
        if self.is_at_end() {
            TextDecodeError::Truncated
        } else {
            TextDecodeError::Malformed
        }
    }

    pub fn peek_is_identifier(&mut self) -> bool {
        self.peek_byte()
            .is_some_and(|byte| byte.is_ascii_alphabetic() || byte == b'_')
    }

    pub fn next_identifier(&mut self) -> Result<&'a str> {
        if !self.peek_is_identifier() {
            return Err(self.unexpected());
        }
        let start = self.pos;
        self.pos = self.word_end(start);
        Ok(&self.source[start..self.pos])
    }

    fn word_end(&self, start: usize) -> usize {
        let bytes = self.bytes();
        bytes[start..]
            .iter()
            .position(|byte| !(byte.is_ascii_alphanumeric() || *byte == b'_'))
            .map_or(bytes.len(), |offset| start + offset)
    }

    pub fn next_field_key(&mut self) -> Result<FieldKey<'a>> {
        if self.skip_optional_byte(b'[') {
            Ok(FieldKey::Bracketed(self.next_bracketed_name()?))
        } else {
            Ok(FieldKey::Name(self.next_identifier()?))
        }
    }

    /// Reads up to the closing `]`.
    fn next_bracketed_name(&mut self) -> Result<String> {
        let mut name = String::new();
        loop {
            self.skip_whitespace();
            let Some(&byte) = self.bytes().get(self.pos) else {
                return Err(TextDecodeError::Truncated);
            };
            self.pos += 1;
            match byte {
                b']' if !name.is_empty() => return Ok(name),
                byte if byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'.' | b'/' | b'-') => {
                    name.push(char::from(byte));
                }
                _ => return Err(TextDecodeError::Malformed),
            }
        }
    }

    /// Consumes `[prefix/full.Name]` if that is what comes next; extension names are left alone.
    pub fn next_type_url(&mut self) -> Result<Option<String>> {
        let start = self.pos;
        if !self.skip_optional_byte(b'[') {
            return Ok(None);
        }
        let name = self.next_bracketed_name()?;
        if name.contains('/') {
            Ok(Some(name))
        } else {
            self.pos = start;
            Ok(None)
        }
    }

    /// Lexes an optional `-` and a run of number characters.
    fn next_number_token(&mut self) -> Result<(bool, &'a str)> {
        let negative = self.skip_optional_byte(b'-');
        self.skip_whitespace();
        let bytes = self.bytes();
        let start = self.pos;
        let hex = matches!(bytes.get(start..start + 2), Some(b"0x" | b"0X"));
        let mut end = start;
        while let Some(&byte) = bytes.get(end) {
            let exponent_sign = matches!(byte, b'+' | b'-')
                && !hex
                && end > start
                && matches!(bytes[end - 1], b'e' | b'E');
            if byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'.') || exponent_sign {
                end += 1;
            } else {
                break;
            }
        }
        if end == start {
            return Err(self.unexpected());
        }
        self.pos = end;
        Ok((negative, &self.source[start..end]))
    }

    pub fn next_u64(&mut self) -> Result<u64> {
        let (negative, body) = self.next_number_token()?;
        if negative {
            return Err(TextDecodeError::MalformedNumber);
        }
        parse_unsigned(body).ok_or(TextDecodeError::MalformedNumber)
    }

    pub fn next_i64(&mut self) -> Result<i64> {
        let (negative, body) = self.next_number_token()?;
        let magnitude = parse_unsigned(body).ok_or(TextDecodeError::MalformedNumber)?;
        if negative {
            if magnitude == 1 << 63 {
                Ok(i64::MIN)
            } else {
                i64::try_from(magnitude)
                    .map(|value| -value)
                    .map_err(|_| TextDecodeError::MalformedNumber)
            }
        } else {
            i64::try_from(magnitude).map_err(|_| TextDecodeError::MalformedNumber)
        }
    }

    /// Accepts integers, decimals with an optional `f` suffix, `nan`, `inf` and `infinity`.
    pub fn next_f64(&mut self) -> Result<f64> {
        let (negative, body) = self.next_number_token()?;
        let lower = body.to_ascii_lowercase();
        let magnitude = match lower.as_str() {
            "inf" | "infinity" => f64::INFINITY,
            "nan" => f64::NAN,
            _ => {
                let digits = lower.strip_suffix('f').unwrap_or(&lower);
                match float::parse_double(digits) {
                    Some(value) if !digits.starts_with(['-', '+']) => value,
                    _ => parse_unsigned(body)
                        .map(|value| value as f64)
                        .ok_or(TextDecodeError::MalformedNumber)?,
                }
            }
        };
        Ok(if negative { -magnitude } else { magnitude })
    }

    pub fn next_f32(&mut self) -> Result<f32> {
        Ok(self.next_f64()? as f32)
    }

    pub fn next_bool(&mut self) -> Result<bool> {
        self.skip_whitespace();
        let start = self.pos;
        let end = self.word_end(start);
        let source = self.source;
        let value = match &source[start..end] {
            "true" | "True" | "t" | "1" => true,
            "false" | "False" | "f" | "0" => false,
            "" => return Err(self.unexpected()),
            _ => return Err(TextDecodeError::Malformed),
        };
        self.pos = end;
        Ok(value)
    }

    /// Reads one or more adjacent quoted literals as raw bytes.
    pub fn next_bytes(&mut self) -> Result<Vec<u8>> {
        if !matches!(self.peek_byte(), Some(b'"' | b'\'')) {
            return Err(self.unexpected());
        }
        let mut out = Vec::new();
        while matches!(self.peek_byte(), Some(b'"' | b'\'')) {
            self.lex_literal(&mut out)?;
        }
        Ok(out)
    }

    pub fn next_string(&mut self) -> Result<String> {
        String::from_utf8(self.next_bytes()?).map_err(|_| TextDecodeError::InvalidUtf8)
    }

    fn lex_literal(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let bytes = self.bytes();
        let quote = bytes[self.pos];
        let mut pos = self.pos + 1;
        loop {
            let Some(&byte) = bytes.get(pos) else {
                return Err(TextDecodeError::Truncated);
            };
            pos += 1;
            match byte {
                b'\n' => return Err(TextDecodeError::Malformed),
                byte if byte == quote => break,
                b'\\' => {
                    let Some(&escape) = bytes.get(pos) else {
                        return Err(TextDecodeError::Truncated);
                    };
                    pos += 1;
                    match escape {
                        b'a' => out.push(0x07),
                        b'b' => out.push(0x08),
                        b'f' => out.push(0x0C),
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        b'v' => out.push(0x0B),
                        b'\\' | b'\'' | b'"' | b'?' => out.push(escape),
                        b'0'..=b'7' => {
                            let mut value = u32::from(escape - b'0');
                            for _ in 0..2 {
                                match bytes.get(pos) {
                                    Some(digit @ b'0'..=b'7') => {
                                        value = value * 8 + u32::from(digit - b'0');
                                        pos += 1;
                                    }
                                    _ => break,
                                }
                            }
                            out.push(u8::try_from(value).map_err(|_| TextDecodeError::Malformed)?);
                        }
                        b'x' | b'X' => {
                            let mut value = 0u8;
                            let mut count = 0;
                            while count < 2 {
                                match bytes.get(pos).and_then(|digit| char::from(*digit).to_digit(16)) {
                                    Some(digit) => {
                                        value = value * 16 + digit as u8;
                                        pos += 1;
                                        count += 1;
                                    }
                                    None => break,
                                }
                            }
                            if count == 0 {
                                return Err(TextDecodeError::Malformed);
                            }
                            out.push(value);
                        }
                        _ => return Err(TextDecodeError::Malformed),
                    }
                }
                byte => out.push(byte),
            }
        }
        self.pos = pos;
        Ok(())
    }

    /// Skips one scalar: string literals, or a number or identifier.
    pub fn skip_scalar(&mut self) -> Result<()> {
        match self.peek_byte() {
            Some(b'"' | b'\'') => self.next_bytes().map(drop),
            Some(_) => self.next_number_token().map(drop),
            None => Err(TextDecodeError::Truncated),
        }
    }
}

/// Decimal, `0x` hex or `0`-prefixed octal.
fn parse_unsigned(body: &str) -> Option<u64> {
    if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        if !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return None;
        }
        u64::from_str_radix(hex, 16).ok()
    } else if !body.bytes().all(|byte| byte.is_ascii_digit()) {
        None
    } else if body.len() > 1 && body.starts_with('0') {
        u64::from_str_radix(&body[1..], 8).ok()
    } else {
        body.parse().ok()
    }
}
