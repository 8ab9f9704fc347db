//! PDF value decoder.
//!
//! This module turns tokens from a [`TokenSource`] into [`Value`]s.
//!
//! # Architecture
//!
//! The decoder uses a recursive descent approach:
//! 1. Read a token (or take the one handed in by the caller)
//! 2. Dispatch on its literal text
//! 3. For composite types (arrays, dicts), recursively decode contents
//!
//! Integers need two tokens of lookahead: `12 0 R` and `12 0 obj` both
//! decode to [`Value::ObjectRef`], while a bare `12` stays numeric.
//!
//! # Failure
//!
//! `Ok(None)` means the token stream could not produce a usable value
//! (end of input, missing dictionary key). `Err` is reserved for IO errors
//! and hard limits such as nesting depth.

use crate::error::{Error, Result};
use crate::lexer::{TokenSource, parse_integer, parse_real};
use crate::object::{Dictionary, ObjectRef, Token, Value};
use crate::parser_config::ParserOptions;

/// Decode escape sequences in PDF literal strings.
///
/// PDF literal strings (enclosed in parentheses) support escape sequences
/// per ISO 32000-1:2008, Section 7.3.4.2:
///
/// - `\n` → Line Feed (0x0A)
/// - `\r` → Carriage Return (0x0D)
/// - `\t` → Horizontal Tab (0x09)
/// - `\b` → Backspace (0x08)
/// - `\f` → Form Feed (0x0C)
/// - `\(` → Left Parenthesis
/// - `\)` → Right Parenthesis
/// - `\\` → Backslash
/// - `\ddd` → Character with octal code (1-3 digits)
/// - `\<newline>` → Line continuation (ignored)
///
/// # Examples
///
/// ```
/// # use pdf_import::parser::decode_literal_string_escapes;
/// let input = b"Section \\247 71.01";
/// let decoded = decode_literal_string_escapes(input);
/// assert_eq!(decoded, b"Section \xa7 71.01");
/// ```
pub fn decode_literal_string_escapes(raw: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        if raw[i] != b'\\' || i + 1 >= raw.len() {
            result.push(raw[i]);
            i += 1;
            continue;
        }

        match raw[i + 1] {
            b'n' => result.push(b'\n'),
            b'r' => result.push(b'\r'),
            b't' => result.push(b'\t'),
            b'b' => result.push(8),
            b'f' => result.push(12),
            b'(' | b')' | b'\\' => result.push(raw[i + 1]),
            b'\n' => {},
            b'\r' => {
                if raw.get(i + 2) == Some(&b'\n') {
                    i += 1;
                }
            },
            b'0'..=b'7' => {
                let digits = raw[i + 1..]
                    .iter()
                    .take(3)
                    .take_while(|d| (b'0'..=b'7').contains(*d))
                    .count();
                let value = raw[i + 1..i + 1 + digits]
                    .iter()
                    .fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
                result.push((value & 0xFF) as u8);
                i += 1 + digits;
                continue;
            },
            // Unknown escape: the backslash is dropped, the byte kept
            other => result.push(other),
        }
        i += 2;
    }

    result
}

/// Decode a hex string to bytes.
///
/// Whitespace is ignored. If there's an odd number of hex digits, the last
/// digit is padded with 0.
///
/// # Example
///
/// ```
/// use pdf_import::parser::decode_hex;
///
/// let decoded = decode_hex(b"48656C6C6F").unwrap();
/// assert_eq!(decoded, b"Hello");
/// ```
///
/// # Errors
///
/// Returns `Err` if the input contains non-hex, non-whitespace characters.
pub fn decode_hex(hex_bytes: &[u8]) -> Result<Vec<u8>> {
    let digits = hex_bytes
        .iter()
        .filter(|c| !crate::lexer::is_whitespace(**c))
        .map(|&c| {
            char::from(c)
                .to_digit(16)
                .map(|d| d as u8)
                .ok_or_else(|| Error::ParseError {
                    offset: 0,
                    reason: format!("Invalid hex digit: {:?}", char::from(c)),
                })
        })
        .collect::<Result<Vec<u8>>>()?;

    Ok(digits
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect())
}

/// Recursive decoder over a token source.
///
/// # Example
///
/// ```
/// use pdf_import::lexer::TokenReader;
/// use pdf_import::object::Value;
/// use pdf_import::parser::Decoder;
/// use pdf_import::parser_config::ParserOptions;
/// use std::io::Cursor;
///
/// let mut source = TokenReader::new(Cursor::new(b"[1 2 3]".to_vec()))?;
/// let options = ParserOptions::default();
/// let value = Decoder::new(&mut source, &options).decode(None)?;
/// assert_eq!(value, Some(Value::Array(vec![
///     Value::Numeric(1),
///     Value::Numeric(2),
///     Value::Numeric(3),
/// ])));
/// # Ok::<(), pdf_import::error::Error>(())
/// ```
pub struct Decoder<'a, S: TokenSource + ?Sized> {
    source: &'a mut S,
    options: &'a ParserOptions,
    depth: usize,
}

impl<'a, S: TokenSource + ?Sized> Decoder<'a, S> {
    /// Create a decoder reading from `source`.
    pub fn new(source: &'a mut S, options: &'a ParserOptions) -> Self {
        Self {
            source,
            options,
            depth: 0,
        }
    }

    /// Decode one value.
    ///
    /// If `token` is `None` the first token is pulled from the source,
    /// otherwise decoding starts from the given token.
    pub fn decode(&mut self, token: Option<Token>) -> Result<Option<Value>> {
        let token = match token {
            Some(tok) => tok,
            None => match self.source.read_token()? {
                Some(tok) => tok,
                None => return Ok(None),
            },
        };

        match token.as_bytes() {
            b"<" => self.decode_hex_string(),
            b"<<" => self.nested(Self::decode_dictionary),
            b"[" => self.nested(Self::decode_array),
            b"(" => self.decode_literal_string().map(Some),
            b"stream" => Ok(Some(Value::Stream)),
            _ => self.decode_scalar(token).map(Some),
        }
    }

    fn nested(&mut self, decode: fn(&mut Self) -> Result<Option<Value>>) -> Result<Option<Value>> {
        if self.depth >= self.options.max_nesting {
            return Err(Error::RecursionLimitExceeded(self.options.max_nesting));
        }
        self.depth += 1;
        let result = decode(self);
        self.depth -= 1;
        result
    }

    fn decode_hex_string(&mut self) -> Result<Option<Value>> {
        let offset = self.source.position()?;
        let Some(raw) = self.source.read_bytes_to_token(b">")? else {
            log::warn!("Unterminated hex string at byte {}", offset);
            return Ok(None);
        };
        let bytes = match decode_hex(&raw) {
            Ok(bytes) => bytes,
            Err(Error::ParseError { reason, .. }) if self.options.strict => {
                return Err(Error::ParseError { offset, reason });
            },
            Err(Error::ParseError { reason, .. }) => {
                log::warn!("{} in hex string at byte {}, skipping invalid digits", reason, offset);
                let digits: Vec<u8> = raw.into_iter().filter(u8::is_ascii_hexdigit).collect();
                decode_hex(&digits)?
            },
            Err(e) => return Err(e),
        };
        Ok(Some(Value::Hex(bytes)))
    }

    fn decode_dictionary(&mut self) -> Result<Option<Value>> {
        let mut dict = Dictionary::new();

        loop {
            let Some(key) = self.source.read_token()? else {
                log::warn!("Dictionary ended without '>>'");
                return Ok(None);
            };
            if key.is(b">>") {
                break;
            }
            if !key.is_name() || key.len() < 2 {
                log::warn!("Dictionary key {:?} is not a name", key.to_string());
                return Ok(None);
            }
            let key = key.to_string();

            let Some(value) = self.decode(None)? else {
                return Ok(None);
            };

            // A key directly followed by '>>' has no value
            if value.is_token(b">>") {
                dict.insert(key, Value::Null);
                break;
            }

            dict.insert(key, value);
        }

        Ok(Some(Value::Dictionary(dict)))
    }

    fn decode_array(&mut self) -> Result<Option<Value>> {
        let mut items = Vec::new();

        loop {
            let Some(token) = self.source.read_token()? else {
                log::warn!("Array ended without ']'");
                return Ok(None);
            };
            if token.is(b"]") {
                break;
            }
            match self.decode(Some(token))? {
                Some(value) => items.push(value),
                None => return Ok(None),
            }
        }

        Ok(Some(Value::Array(items)))
    }

    /// Scan a literal string body after its opening `(`.
    fn decode_literal_string(&mut self) -> Result<Value> {
        let start = self.source.position()?;
        let mut raw = Vec::new();
        let mut depth = 1usize;

        loop {
            let Some(b) = self.source.read_byte()? else {
                if self.options.strict {
                    return Err(Error::ParseError {
                        offset: start,
                        reason: "unterminated literal string".to_string(),
                    });
                }
                log::warn!("Unterminated literal string at byte {}", start);
                break;
            };

            match b {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                },
                _ => {},
            }
            raw.push(b);

            // The escaped byte never changes the depth
            if b == b'\\' {
                if let Some(escaped) = self.source.read_byte()? {
                    raw.push(escaped);
                }
            }

            if raw.len() > self.options.max_string_length {
                return Err(Error::ParseError {
                    offset: start,
                    reason: format!(
                        "literal string exceeds {} bytes",
                        self.options.max_string_length
                    ),
                });
            }
        }

        Ok(Value::String(decode_literal_string_escapes(&raw)))
    }

    fn decode_scalar(&mut self, token: Token) -> Result<Value> {
        let bytes = token.as_bytes();

        if let Some(number) = parse_integer(bytes) {
            // Two integers followed by 'R' or 'obj' form a reference or a header
            let ahead = self.source.peek_tokens(2)?;
            if let [generation, keyword] = ahead.as_slice() {
                if keyword.is(b"R") || keyword.is(b"obj") {
                    let reference = parse_integer(generation.as_bytes())
                        .and_then(|gen| ObjectRef::from_numbers(number, gen));
                    if let Some(reference) = reference {
                        self.source.read_tokens(2)?;
                        return Ok(Value::ObjectRef(reference));
                    }
                }
            }
            return Ok(Value::Numeric(number));
        }

        if let Some(real) = parse_real(bytes) {
            return Ok(Value::Real(real));
        }

        Ok(match bytes {
            b"true" => Value::Boolean(true),
            b"false" => Value::Boolean(false),
            b"null" => Value::Null,
            _ => Value::Token(token),
        })
    }
}

/// Decode a single value from the current position of `source`.
pub fn decode_value<S: TokenSource + ?Sized>(
    source: &mut S,
    options: &ParserOptions,
) -> Result<Option<Value>> {
    Decoder::new(source, options).decode(None)
}
