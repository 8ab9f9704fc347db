//! PDF token reader.
//!
//! This module provides the low-level byte and token access the object
//! decoder is built on. Tokens are returned as raw atoms; classifying them
//! (numbers, names, keywords) is left to the decoder.
//!
//! # Lexical rules
//!
//! - Whitespace: NUL, TAB, LF, FF, CR, SPACE
//! - Comments: `%` to end of line, skipped
//! - Delimiters `( ) [ ] { }` are single-byte tokens
//! - `<<` and `>>` are two-byte tokens, a lone `<` or `>` is one byte
//! - `/` starts a name token, which keeps its slash
//! - Anything else is a run of regular bytes
//!
//! Literal and hex string bodies are not tokenized here; after the opening
//! `(` or `<` token the decoder reads raw bytes.

use crate::error::Result;
use crate::object::Token;
use nom::{
    IResult,
    branch::alt,
    character::complete::{char, digit0, digit1, one_of},
    combinator::{all_consuming, opt, recognize},
    sequence::{pair, tuple},
};
use std::io::{self, Read, Seek, SeekFrom};

/// Size of the read buffer used by [`TokenReader`].
const CHUNK_SIZE: usize = 8192;

/// Byte-source capability required by the decoder, xref builder and resolver.
///
/// All positions are absolute byte offsets into the source.
pub trait TokenSource {
    /// Locate the byte offset of the cross-reference table.
    fn find_xref_table(&mut self) -> Result<u64>;

    /// Move the cursor, returning the new absolute position.
    fn seek(&mut self, pos: SeekFrom) -> Result<u64>;

    /// Read the next token, or `None` at end of input.
    fn read_token(&mut self) -> Result<Option<Token>>;

    /// Read raw bytes up to `delimiter`, consuming the delimiter.
    ///
    /// Returns `None` if the input ends before the delimiter is found.
    fn read_bytes_to_token(&mut self, delimiter: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Read whole lines until a line starting with the token `delimiter`.
    ///
    /// The delimiter line itself is not returned. Returns `None` if the input
    /// ends before the delimiter is found.
    fn read_lines_to_token(&mut self, delimiter: &[u8]) -> Result<Option<Vec<Vec<u8>>>>;

    /// Scan forward to the next occurrence of `literal` on token boundaries.
    ///
    /// On success the cursor is left at the first byte of the match. On
    /// failure the cursor is left where it was.
    fn skip_to_token(&mut self, literal: &[u8]) -> Result<bool>;

    /// Read a single raw byte.
    fn read_byte(&mut self) -> Result<Option<u8>>;

    /// Current absolute position.
    fn position(&mut self) -> Result<u64> {
        self.seek(SeekFrom::Current(0))
    }

    /// Look at the next `n` tokens without consuming them.
    ///
    /// Fewer tokens are returned if the input ends first.
    fn peek_tokens(&mut self, n: usize) -> Result<Vec<Token>> {
        let origin = self.position()?;
        let mut tokens = Vec::with_capacity(n);
        let mut outcome = Ok(());
        for _ in 0..n {
            match self.read_token() {
                Ok(Some(tok)) => tokens.push(tok),
                Ok(None) => break,
                Err(e) => {
                    outcome = Err(e);
                    break;
                },
            }
        }
        self.seek(SeekFrom::Start(origin))?;
        outcome.map(|_| tokens)
    }

    /// Consume and discard the next `n` tokens.
    fn read_tokens(&mut self, n: usize) -> Result<()> {
        for _ in 0..n {
            if self.read_token()?.is_none() {
                break;
            }
        }
        Ok(())
    }

    /// Skip `n` raw bytes.
    fn skip_bytes(&mut self, n: u64) -> Result<()> {
        let offset = i64::try_from(n).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "skip distance too large")
        })?;
        self.seek(SeekFrom::Current(offset))?;
        Ok(())
    }
}

/// PDF whitespace characters (PDF Ref 1.7, Table 3.1).
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C)
}

/// PDF delimiter characters (PDF Ref 1.7, Table 3.2).
pub fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

/// Whether `b` ends a token.
fn is_boundary(b: u8) -> bool {
    is_whitespace(b) || is_delimiter(b)
}

fn integer(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(pair(opt(one_of("+-")), digit1))(input)
}

fn real(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(pair(
        opt(one_of("+-")),
        alt((
            recognize(tuple((digit1, char('.'), digit0))),
            recognize(pair(char('.'), digit1)),
            digit1,
        )),
    ))(input)
}

/// Parse a token as a PDF integer (`42`, `-7`, `+3`).
pub fn parse_integer(bytes: &[u8]) -> Option<i64> {
    let (_, digits) = all_consuming(integer)(bytes).ok()?;
    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// Parse a token as a PDF real (`3.14`, `-.5`, `5.`).
///
/// Exponent notation is not part of PDF syntax and is rejected.
pub fn parse_real(bytes: &[u8]) -> Option<f64> {
    let (_, text) = all_consuming(real)(bytes).ok()?;
    std::str::from_utf8(text).ok()?.parse().ok()
}

/// Buffered token reader over any `Read + Seek` source.
///
/// The reader keeps one chunk of the source in memory. Seeks that land
/// inside that chunk are served without touching the underlying source.
pub struct TokenReader<R> {
    inner: R,
    buf: Vec<u8>,
    /// Cursor inside `buf`
    buf_pos: usize,
    /// Absolute offset of `buf[0]`; `inner` always sits at `buf_offset + buf.len()`
    buf_offset: u64,
}

impl<R> std::fmt::Debug for TokenReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenReader")
            .field("position", &(self.buf_offset + self.buf_pos as u64))
            .field("buffered", &self.buf.len())
            .finish_non_exhaustive()
    }
}

impl<R: Read + Seek> TokenReader<R> {
    /// Wrap a source, starting at its beginning.
    pub fn new(mut inner: R) -> Result<Self> {
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self {
            inner,
            buf: Vec::with_capacity(CHUNK_SIZE),
            buf_pos: 0,
            buf_offset: 0,
        })
    }

    /// Release the reader and return the underlying source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn current(&self) -> u64 {
        self.buf_offset + self.buf_pos as u64
    }

    /// Drop the buffer and position the source at `pos`.
    fn reset_to(&mut self, pos: u64) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        self.buf.clear();
        self.buf_pos = 0;
        self.buf_offset = pos;
        Ok(())
    }

    /// Make sure at least one byte is buffered. Returns false at end of input.
    fn fill(&mut self) -> io::Result<bool> {
        if self.buf_pos < self.buf.len() {
            return Ok(true);
        }
        self.buf_offset += self.buf.len() as u64;
        self.buf.clear();
        self.buf_pos = 0;
        (&mut self.inner)
            .take(CHUNK_SIZE as u64)
            .read_to_end(&mut self.buf)?;
        Ok(!self.buf.is_empty())
    }

    fn peek(&mut self) -> io::Result<Option<u8>> {
        if self.fill()? {
            Ok(Some(self.buf[self.buf_pos]))
        } else {
            Ok(None)
        }
    }

    fn next(&mut self) -> io::Result<Option<u8>> {
        let b = self.peek()?;
        if b.is_some() {
            self.buf_pos += 1;
        }
        Ok(b)
    }

    fn skip_whitespace_and_comments(&mut self) -> io::Result<()> {
        while let Some(b) = self.peek()? {
            if is_whitespace(b) {
                self.buf_pos += 1;
            } else if b == b'%' {
                while let Some(c) = self.peek()? {
                    if c == b'\r' || c == b'\n' {
                        break;
                    }
                    self.buf_pos += 1;
                }
            } else {
                break;
            }
        }
        Ok(())
    }

    fn take_regular(&mut self, bytes: &mut Vec<u8>) -> io::Result<()> {
        while let Some(b) = self.peek()? {
            if is_boundary(b) {
                break;
            }
            bytes.push(b);
            self.buf_pos += 1;
        }
        Ok(())
    }

    /// Read one line, handling CR, LF and CRLF endings.
    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        let mut saw_any = false;
        while let Some(b) = self.next()? {
            saw_any = true;
            match b {
                b'\n' => return Ok(Some(line)),
                b'\r' => {
                    if self.peek()? == Some(b'\n') {
                        self.buf_pos += 1;
                    }
                    return Ok(Some(line));
                },
                _ => line.push(b),
            }
        }
        Ok(saw_any.then_some(line))
    }
}

impl<R: Read + Seek> TokenSource for TokenReader<R> {
    fn find_xref_table(&mut self) -> Result<u64> {
        let origin = self.current();
        let found = crate::xref::find_xref_offset(&mut self.inner);
        self.reset_to(origin)?;
        found
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let target = match pos {
            SeekFrom::Start(p) => p,
            SeekFrom::Current(delta) => self.current().checked_add_signed(delta).ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "seek before start of source")
            })?,
            SeekFrom::End(delta) => {
                let target = self.inner.seek(SeekFrom::End(delta))?;
                self.reset_to(target)?;
                return Ok(target);
            },
        };

        let buffered_end = self.buf_offset + self.buf.len() as u64;
        if target >= self.buf_offset && target <= buffered_end {
            self.buf_pos = (target - self.buf_offset) as usize;
        } else {
            self.reset_to(target)?;
        }
        Ok(target)
    }

    fn read_token(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace_and_comments()?;

        let Some(first) = self.next()? else {
            return Ok(None);
        };
        let mut bytes = vec![first];
        match first {
            b'(' | b')' | b'[' | b']' | b'{' | b'}' => {},
            b'<' | b'>' => {
                if self.peek()? == Some(first) {
                    self.buf_pos += 1;
                    bytes.push(first);
                }
            },
            _ => self.take_regular(&mut bytes)?,
        }
        Ok(Some(Token::new(bytes)))
    }

    fn read_bytes_to_token(&mut self, delimiter: &[u8]) -> Result<Option<Vec<u8>>> {
        let mut bytes = Vec::new();
        while let Some(b) = self.next()? {
            bytes.push(b);
            if bytes.ends_with(delimiter) {
                bytes.truncate(bytes.len() - delimiter.len());
                return Ok(Some(bytes));
            }
        }
        Ok(None)
    }

    fn read_lines_to_token(&mut self, delimiter: &[u8]) -> Result<Option<Vec<Vec<u8>>>> {
        let mut lines = Vec::new();
        while let Some(line) = self.read_line()? {
            let trimmed = trim_ascii(&line);
            let is_delimiter_line = trimmed.starts_with(delimiter)
                && trimmed
                    .get(delimiter.len())
                    .map_or(true, |&b| is_boundary(b));
            if is_delimiter_line {
                return Ok(Some(lines));
            }
            lines.push(line);
        }
        Ok(None)
    }

    fn skip_to_token(&mut self, literal: &[u8]) -> Result<bool> {
        if literal.is_empty() {
            return Ok(true);
        }

        let origin = self.current();
        // Start one byte early so the boundary before the first candidate is visible.
        let mut base = origin.saturating_sub(1);
        let mut window = Vec::with_capacity(CHUNK_SIZE + literal.len() + 1);

        loop {
            self.inner.seek(SeekFrom::Start(base))?;
            window.clear();
            (&mut self.inner)
                .take((CHUNK_SIZE + literal.len() + 1) as u64)
                .read_to_end(&mut window)?;

            let first = usize::from(base != 0);
            let exhausted = window.len() < CHUNK_SIZE + literal.len() + 1;
            // The last window has no successor, so it is scanned to its end
            let limit = if exhausted {
                window.len()
            } else {
                CHUNK_SIZE
            };
            for i in first..limit {
                let abs = base + i as u64;
                if abs < origin || !window[i..].starts_with(literal) {
                    continue;
                }
                let before_ok = abs == 0 || is_boundary(window[i - 1]);
                let after_ok = window
                    .get(i + literal.len())
                    .map_or(true, |&b| is_boundary(b));
                if before_ok && after_ok {
                    self.reset_to(abs)?;
                    return Ok(true);
                }
            }

            if exhausted || limit <= first {
                break;
            }
            base += (limit - 1) as u64;
        }

        self.reset_to(origin)?;
        Ok(false)
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        Ok(self.next()?)
    }
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| !is_whitespace(b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|&b| !is_whitespace(b)).map_or(start, |i| i + 1);
    &bytes[start..end]
}
