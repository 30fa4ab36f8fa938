//! JSON tokenizer.

use std::borrow::Cow;

use base64::alphabet;
use base64::engine::general_purpose::GeneralPurpose;
use base64::engine::{DecodePaddingMode, GeneralPurposeConfig};
use base64::Engine;

use crate::json::JsonDecodeError;

type Result<T> = std::result::Result<T, JsonDecodeError>;

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// How a number token was written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumberClass {
    /// Has a fraction or an exponent.
    Double,
    NegativeInteger,
    UnsignedInteger,
}

/// The text of a number token, validated against the JSON number grammar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JsonNumber<'a> {
    pub text: &'a str,
    pub class: NumberClass,
}

impl<'a> JsonNumber<'a> {
    /// Validates `text` as one complete JSON number.
    pub fn parse(text: &'a str) -> Result<JsonNumber<'a>> {
        let (end, class) = lex_number(text.as_bytes(), 0)?;
        if end != text.len() {
            return Err(JsonDecodeError::MalformedNumber);
        }
        Ok(JsonNumber { text, class })
    }

    /// Integral values only; doubles must have no fraction.
    pub fn to_i64(self) -> Result<i64> {
        match self.class {
            NumberClass::Double => {
                let value = self.to_f64()?;
                if value.fract() != 0.0 {
                    return Err(JsonDecodeError::MalformedNumber);
                }
                // i64::MAX rounds up to 2^63 as an f64, which is out of range.
                if !(-9.223_372_036_854_776e18..9.223_372_036_854_776e18).contains(&value) {
                    return Err(JsonDecodeError::NumberRange);
                }
                Ok(value as i64)
            }
            _ => self
                .text
                .parse()
                .map_err(|_| JsonDecodeError::NumberRange),
        }
    }

    pub fn to_u64(self) -> Result<u64> {
        match self.class {
            NumberClass::Double => {
                let value = self.to_f64()?;
                if value.fract() != 0.0 {
                    return Err(JsonDecodeError::MalformedNumber);
                }
                if !(0.0..1.844_674_407_370_955_2e19).contains(&value) {
                    return Err(JsonDecodeError::NumberRange);
                }
                Ok(value as u64)
            }
            NumberClass::NegativeInteger => {
                if self.text.bytes().skip(1).all(|digit| digit == b'0') {
                    Ok(0)
                } else {
                    Err(JsonDecodeError::NumberRange)
                }
            }
            NumberClass::UnsignedInteger => self
                .text
                .parse()
                .map_err(|_| JsonDecodeError::NumberRange),
        }
    }

    /// Finite values only; a literal too large for an `f64` is out of range.
    pub fn to_f64(self) -> Result<f64> {
        let value: f64 = self
            .text
            .parse()
            .map_err(|_| JsonDecodeError::MalformedNumber)?;
        if value.is_infinite() {
            return Err(JsonDecodeError::NumberRange);
        }
        Ok(value)
    }
}

/// Lexes a number starting at `start`, returning where it ends.
fn lex_number(bytes: &[u8], start: usize) -> Result<(usize, NumberClass)> {
    let digits = |mut pos: usize| {
        let begin = pos;
        while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
            pos += 1;
        }
        (pos, pos - begin)
    };

    let mut pos = start;
    let negative = bytes.get(pos) == Some(&b'-');
    if negative {
        pos += 1;
    }
    let integer_start = pos;
    let (end, count) = digits(pos);
    if count == 0 {
        return Err(JsonDecodeError::MalformedNumber);
    }
    if count > 1 && bytes[integer_start] == b'0' {
        return Err(JsonDecodeError::LeadingZero);
    }
    pos = end;

    let mut class = if negative {
        NumberClass::NegativeInteger
    } else {
        NumberClass::UnsignedInteger
    };
    if bytes.get(pos) == Some(&b'.') {
        let (end, count) = digits(pos + 1);
        if count == 0 {
            return Err(JsonDecodeError::MalformedNumber);
        }
        pos = end;
        class = NumberClass::Double;
    }
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        let (end, count) = digits(pos);
        if count == 0 {
            return Err(JsonDecodeError::MalformedNumber);
        }
        pos = end;
        class = NumberClass::Double;
    }
    if bytes
        .get(pos)
        .is_some_and(|byte| byte.is_ascii_alphanumeric() || *byte == b'.')
    {
        return Err(JsonDecodeError::MalformedNumber);
    }
    Ok((pos, class))
}

#[derive(Clone, Debug, PartialEq)]
pub enum JsonToken<'a> {
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    Colon,
    Comma,
    Null,
    True,
    False,
    String(Cow<'a, str>),
    Number(JsonNumber<'a>),
}

#[derive(Debug)]
struct Peeked<'a> {
    start: usize,
    end: usize,
    token: JsonToken<'a>,
}

/// Splits JSON text into tokens, with one token of lookahead.
///
/// The scanner also holds the nesting budget, which decoders spend on every nested message and
/// which [`JsonScanner::skip_value`] spends on nested objects and arrays.
#[derive(Debug)]
pub struct JsonScanner<'a> {
    source: &'a str,
    pos: usize,
    peeked: Option<Peeked<'a>>,
    /// End offset of the last token returned by `next`.
    last_end: usize,
    depth_remaining: u32,
}

impl<'a> JsonScanner<'a> {
    pub fn new(source: &'a str, depth_limit: u32) -> JsonScanner<'a> {
        JsonScanner {
            source,
            pos: 0,
            peeked: None,
            last_end: 0,
            depth_remaining: depth_limit,
        }
    }

    pub fn depth_remaining(&self) -> u32 {
        self.depth_remaining
    }

    /// Spends one level of the nesting budget.
    pub fn enter(&mut self) -> Result<()> {
        self.depth_remaining = self
            .depth_remaining
            .checked_sub(1)
            .ok_or(JsonDecodeError::DepthLimitExceeded)?;
        Ok(())
    }

    pub fn leave(&mut self) {
        self.depth_remaining += 1;
    }

    pub fn peek(&mut self) -> Result<Option<&JsonToken<'a>>> {
        if self.peeked.is_none() {
            self.peeked = self.lex()?;
        }
        Ok(self.peeked.as_ref().map(|peeked| &peeked.token))
    }

    pub fn next(&mut self) -> Result<JsonToken<'a>> {
        let peeked = match self.peeked.take() {
            Some(peeked) => peeked,
            None => self.lex()?.ok_or(JsonDecodeError::Truncated)?,
        };
        self.last_end = peeked.end;
        Ok(peeked.token)
    }

    /// Fails unless only whitespace remains.
    pub fn expect_end(&mut self) -> Result<()> {
        match self.peek()? {
            None => Ok(()),
            Some(_) => Err(JsonDecodeError::TrailingGarbage),
        }
    }

    /// Consumes the next token, which must be `expected`.
    pub fn expect(&mut self, expected: &JsonToken<'_>) -> Result<()> {
        let token = self.next()?;
        if token == *expected {
            Ok(())
        } else {
            Err(JsonDecodeError::Malformed)
        }
    }

    /// Consumes the next token if it is `expected`.
    pub fn skip_optional(&mut self, expected: &JsonToken<'_>) -> Result<bool> {
        match self.peek()? {
            Some(token) if token == expected => {
                self.next()?;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(JsonDecodeError::Truncated),
        }
    }

    pub fn skip_optional_null(&mut self) -> Result<bool> {
        self.skip_optional(&JsonToken::Null)
    }

    pub fn peek_is_null(&mut self) -> Result<bool> {
        Ok(matches!(self.peek()?, Some(JsonToken::Null)))
    }

    pub fn next_quoted_string(&mut self) -> Result<Cow<'a, str>> {
        match self.next()? {
            JsonToken::String(value) => Ok(value),
            _ => Err(JsonDecodeError::MalformedString),
        }
    }

    /// An object key followed by its colon.
    pub fn next_key(&mut self) -> Result<Cow<'a, str>> {
        let key = match self.next()? {
            JsonToken::String(key) => key,
            _ => return Err(JsonDecodeError::Malformed),
        };
        self.expect(&JsonToken::Colon)?;
        Ok(key)
    }

    /// A number token, or a string holding a number.
    fn next_number_text(&mut self) -> Result<NumberText<'a>> {
        match self.next()? {
            JsonToken::Number(number) => Ok(NumberText::Bare(number)),
            JsonToken::String(text) => Ok(NumberText::Quoted(text)),
            _ => Err(JsonDecodeError::MalformedNumber),
        }
    }

    pub fn next_sint(&mut self) -> Result<i64> {
        match self.next_number_text()? {
            NumberText::Bare(number) => number.to_i64(),
            NumberText::Quoted(text) => JsonNumber::parse(&text)?.to_i64(),
        }
    }

    pub fn next_uint(&mut self) -> Result<u64> {
        match self.next_number_text()? {
            NumberText::Bare(number) => number.to_u64(),
            NumberText::Quoted(text) => JsonNumber::parse(&text)?.to_u64(),
        }
    }

    pub fn next_double(&mut self) -> Result<f64> {
        match self.next_number_text()? {
            NumberText::Bare(number) => number.to_f64(),
            NumberText::Quoted(text) => match &*text {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                text => JsonNumber::parse(text)?.to_f64(),
            },
        }
    }

    pub fn next_float(&mut self) -> Result<f32> {
        let value = self.next_double()?;
        let narrowed = value as f32;
        if value.is_finite() && narrowed.is_infinite() {
            return Err(JsonDecodeError::NumberRange);
        }
        Ok(narrowed)
    }

    pub fn next_bool(&mut self) -> Result<bool> {
        match self.next()? {
            JsonToken::True => Ok(true),
            JsonToken::False => Ok(false),
            _ => Err(JsonDecodeError::MalformedBool),
        }
    }

    /// Base64 in either the standard or the URL-safe alphabet, padded or not.
    pub fn next_bytes(&mut self) -> Result<Vec<u8>> {
        let text = self.next_quoted_string()?;
        let engine = if text.contains(['-', '_']) {
            &URL_SAFE_LENIENT
        } else {
            &STANDARD_LENIENT
        };
        engine
            .decode(text.as_bytes())
            .map_err(|_| JsonDecodeError::MalformedString)
    }

    /// Consumes one complete value and returns its source text.
    pub fn skip_value(&mut self) -> Result<&'a str> {
        if self.peek()?.is_none() {
            return Err(JsonDecodeError::Truncated);
        }
        let start = self.peeked.as_ref().map_or(self.pos, |peeked| peeked.start);
        self.skip_value_tokens()?;
        Ok(&self.source[start..self.last_end])
    }

    fn skip_value_tokens(&mut self) -> Result<()> {
        match self.next()? {
            JsonToken::BeginObject => {
                self.enter()?;
                if !self.skip_optional(&JsonToken::EndObject)? {
                    loop {
                        self.next_key()?;
                        self.skip_value_tokens()?;
                        if self.skip_optional(&JsonToken::EndObject)? {
                            break;
                        }
                        self.expect(&JsonToken::Comma)?;
                    }
                }
                self.leave();
                Ok(())
            }
            JsonToken::BeginArray => {
                self.enter()?;
                if !self.skip_optional(&JsonToken::EndArray)? {
                    loop {
                        self.skip_value_tokens()?;
                        if self.skip_optional(&JsonToken::EndArray)? {
                            break;
                        }
                        self.expect(&JsonToken::Comma)?;
                    }
                }
                self.leave();
                Ok(())
            }
            JsonToken::Null
            | JsonToken::True
            | JsonToken::False
            | JsonToken::String(_)
            | JsonToken::Number(_) => Ok(()),
            _ => Err(JsonDecodeError::Malformed),
        }
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.source.as_bytes();
        while matches!(bytes.get(self.pos), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    fn lex(&mut self) -> Result<Option<Peeked<'a>>> {
        self.skip_whitespace();
        let bytes = self.source.as_bytes();
        let start = self.pos;
        let Some(&byte) = bytes.get(start) else {
            return Ok(None);
        };
        let token = match byte {
            b'{' => self.punctuation(JsonToken::BeginObject),
            b'}' => self.punctuation(JsonToken::EndObject),
            b'[' => self.punctuation(JsonToken::BeginArray),
            b']' => self.punctuation(JsonToken::EndArray),
            b':' => self.punctuation(JsonToken::Colon),
            b',' => self.punctuation(JsonToken::Comma),
            b'"' => JsonToken::String(self.lex_string()?),
            b'-' | b'0'..=b'9' => {
                let (end, class) = lex_number(bytes, start)?;
                self.pos = end;
                JsonToken::Number(JsonNumber {
                    text: &self.source[start..end],
                    class,
                })
            }
            b't' => self.literal("true", JsonToken::True, JsonDecodeError::MalformedBool)?,
            b'f' => self.literal("false", JsonToken::False, JsonDecodeError::MalformedBool)?,
            b'n' => self.literal("null", JsonToken::Null, JsonDecodeError::Malformed)?,
            _ => return Err(JsonDecodeError::Malformed),
        };
        Ok(Some(Peeked {
            start,
            end: self.pos,
            token,
        }))
    }

    fn punctuation(&mut self, token: JsonToken<'a>) -> JsonToken<'a> {
        self.pos += 1;
        token
    }

    fn literal(
        &mut self,
        word: &str,
        token: JsonToken<'a>,
        error: JsonDecodeError,
    ) -> Result<JsonToken<'a>> {
        let rest = &self.source.as_bytes()[self.pos..];
        if !rest.starts_with(word.as_bytes()) {
            return Err(if rest.len() < word.len() && word.as_bytes().starts_with(rest) {
                JsonDecodeError::Truncated
            } else {
                error
            });
        }
        if rest
            .get(word.len())
            .is_some_and(|byte| byte.is_ascii_alphanumeric() || *byte == b'_')
        {
            return Err(error);
        }
        self.pos += word.len();
        Ok(token)
    }

    /// Lexes a string starting at the opening quote.
    fn lex_string(&mut self) -> Result<Cow<'a, str>> {
        let bytes = self.source.as_bytes();
        let start = self.pos + 1;
        let mut pos = start;
        loop {
            match bytes.get(pos) {
                None => return Err(JsonDecodeError::Truncated),
                Some(b'"') => {
                    self.pos = pos + 1;
                    return Ok(Cow::Borrowed(&self.source[start..pos]));
                }
                Some(b'\\') => break,
                Some(byte) if *byte < 0x20 => return Err(JsonDecodeError::MalformedString),
                Some(_) => pos += 1,
            }
        }

        let mut value = String::from(&self.source[start..pos]);
        loop {
            let Some(&byte) = bytes.get(pos) else {
                return Err(JsonDecodeError::Truncated);
            };
            match byte {
                b'"' => {
                    self.pos = pos + 1;
                    return Ok(Cow::Owned(value));
                }
                b'\\' => {
                    let escape = *bytes.get(pos + 1).ok_or(JsonDecodeError::Truncated)?;
                    pos += 2;
                    match escape {
                        b'"' => value.push('"'),
                        b'\\' => value.push('\\'),
                        b'/' => value.push('/'),
                        b'b' => value.push('\u{08}'),
                        b'f' => value.push('\u{0C}'),
                        b'n' => value.push('\n'),
                        b'r' => value.push('\r'),
                        b't' => value.push('\t'),
                        b'u' => {
                            let (c, end) = self.lex_unicode_escape(pos)?;
                            value.push(c);
                            pos = end;
                        }
                        _ => return Err(JsonDecodeError::MalformedString),
                    }
                }
                byte if byte < 0x20 => return Err(JsonDecodeError::MalformedString),
                _ => {
                    // Copy the whole UTF-8 sequence.
                    let run_end = bytes[pos..]
                        .iter()
                        .position(|byte| matches!(byte, b'"' | b'\\') || *byte < 0x20)
                        .map_or(bytes.len(), |offset| pos + offset);
                    value.push_str(&self.source[pos..run_end]);
                    pos = run_end;
                }
            }
        }
    }

    /// Decodes the digits of a `\u` escape at `pos`, including a following low surrogate.
    fn lex_unicode_escape(&self, pos: usize) -> Result<(char, usize)> {
        let first = self.hex4(pos)?;
        match first {
            0xD800..=0xDBFF => {
                let bytes = self.source.as_bytes();
                if bytes.get(pos + 4) != Some(&b'\\') || bytes.get(pos + 5) != Some(&b'u') {
                    return Err(JsonDecodeError::MalformedString);
                }
                let second = self.hex4(pos + 6)?;
                if !(0xDC00..=0xDFFF).contains(&second) {
                    return Err(JsonDecodeError::MalformedString);
                }
                let code = 0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00);
                let c = char::from_u32(code).ok_or(JsonDecodeError::MalformedString)?;
                Ok((c, pos + 10))
            }
            0xDC00..=0xDFFF => Err(JsonDecodeError::MalformedString),
            code => {
                let c = char::from_u32(code).ok_or(JsonDecodeError::MalformedString)?;
                Ok((c, pos + 4))
            }
        }
    }

    fn hex4(&self, pos: usize) -> Result<u32> {
        let digits = self
            .source
            .get(pos..pos + 4)
            .ok_or(JsonDecodeError::Truncated)?;
        if !digits.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return Err(JsonDecodeError::MalformedString);
        }
        u32::from_str_radix(digits, 16).map_err(|_| JsonDecodeError::MalformedString)
    }
}

enum NumberText<'a> {
    Bare(JsonNumber<'a>),
    Quoted(Cow<'a, str>),
}
