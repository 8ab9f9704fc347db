//! Cross-reference table parser.
//!
//! The xref table maps (object number, generation) pairs to byte offsets in
//! the PDF file, enabling random access to PDF objects.
//!
//! Only traditional xref tables are read, and only the section that
//! `startxref` points at: `/Prev` chains of incrementally updated files are
//! not followed.

use crate::error::{Error, Result};
use crate::lexer::TokenSource;
use crate::object::{Dictionary, ObjectRef, Value};
use crate::parser::decode_value;
use crate::parser_config::ParserOptions;
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_till1},
    character::complete::{digit1, multispace0, space0, space1},
    combinator::{all_consuming, map, map_res},
    sequence::{delimited, preceded, tuple},
};
use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

/// How many bytes from the end of the file are searched for `startxref`.
const STARTXREF_WINDOW: u64 = 2048;

/// One line of a traditional xref section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefLine<'a> {
    /// Subsection header `start end`
    Subsection {
        /// First object number of the subsection
        start: u32,
        /// Second number of the header
        end: u32,
    },
    /// Entry `offset generation flag`
    Entry {
        /// Byte offset of the object
        offset: u64,
        /// Generation number
        generation: u16,
        /// `n` for in-use, `f` for free
        flag: &'a [u8],
    },
}

fn number<T: std::str::FromStr>(input: &[u8]) -> IResult<&[u8], T> {
    map_res(digit1, |digits: &[u8]| {
        std::str::from_utf8(digits)
            .map_err(|_| ())
            .and_then(|s| s.parse::<T>().map_err(|_| ()))
    })(input)
}

fn entry_line(input: &[u8]) -> IResult<&[u8], XrefLine<'_>> {
    map(
        tuple((
            number::<u64>,
            space1,
            number::<u16>,
            space1,
            take_till1(|c: u8| c.is_ascii_whitespace()),
        )),
        |(offset, _, generation, _, flag)| XrefLine::Entry {
            offset,
            generation,
            flag,
        },
    )(input)
}

fn subsection_line(input: &[u8]) -> IResult<&[u8], XrefLine<'_>> {
    map(tuple((number::<u32>, space1, number::<u32>)), |(start, _, end)| {
        XrefLine::Subsection { start, end }
    })(input)
}

/// Parse one trimmed, non-empty xref line.
///
/// Returns `None` for any shape other than two or three fields.
pub fn parse_xref_line(line: &[u8]) -> Option<XrefLine<'_>> {
    all_consuming(delimited(space0, alt((entry_line, subsection_line)), space0))(line)
        .ok()
        .map(|(_, parsed)| parsed)
}

/// Find the byte offset of the xref table by scanning from the end of the file.
///
/// Searches for the last "startxref" keyword in the final 2 KiB of the file,
/// then parses the decimal offset that follows it.
///
/// # Errors
///
/// Returns `Error::XrefNotFound` if the keyword is missing or no offset
/// follows it.
pub fn find_xref_offset<R: Read + Seek>(reader: &mut R) -> Result<u64> {
    let file_size = reader.seek(SeekFrom::End(0))?;
    let read_size = STARTXREF_WINDOW.min(file_size);
    reader.seek(SeekFrom::Start(file_size - read_size))?;

    let mut buf = Vec::with_capacity(read_size as usize);
    reader.take(read_size).read_to_end(&mut buf)?;

    let keyword = b"startxref";
    let pos = buf
        .windows(keyword.len())
        .rposition(|w| w == keyword)
        .ok_or(Error::XrefNotFound)?;

    let mut offset_parser = preceded(tag(&keyword[..]), preceded(multispace0, number::<u64>));
    let (_, offset) = offset_parser(&buf[pos..]).map_err(|_: nom::Err<nom::error::Error<&[u8]>>| {
        log::warn!("startxref is not followed by a byte offset");
        Error::XrefNotFound
    })?;

    log::debug!("startxref points at byte {}", offset);
    Ok(offset)
}

/// Cross-reference state of one parser session.
#[derive(Debug, Clone, Default)]
pub struct CrossRefTable {
    /// Highest object number seen in subsection headers
    max_object: u32,
    /// Byte offset of the first section read
    location: Option<u64>,
    /// In-use entries; the first entry for a key wins
    entries: HashMap<ObjectRef, u64>,
    /// Trailer of the last section read
    trailer: Dictionary,
}

impl CrossRefTable {
    /// Create a new empty cross-reference table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest object number seen in any `start end` header.
    pub fn max_object(&self) -> u32 {
        self.max_object
    }

    /// Byte offset where the xref section starts.
    pub fn location(&self) -> Option<u64> {
        self.location
    }

    /// Offset recorded for `reference`.
    pub fn get(&self, reference: ObjectRef) -> Option<u64> {
        self.entries.get(&reference).copied()
    }

    /// Get the number of in-use entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Trailer dictionary.
    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    /// Read the xref section at `offset` and the trailer that follows it.
    ///
    /// Entries already present are kept (first writer wins); the trailer is
    /// replaced by the one read here.
    ///
    /// # Errors
    ///
    /// - `Error::UnterminatedXref` if no `trailer` line follows the table
    /// - `Error::InvalidXrefLine` for a line that is not `start end` or
    ///   `offset generation flag`
    /// - `Error::InvalidTrailer` if the trailer is not a dictionary
    pub fn read_section<S: TokenSource + ?Sized>(
        &mut self,
        source: &mut S,
        offset: u64,
        options: &ParserOptions,
    ) -> Result<()> {
        log::debug!("Reading xref section at offset {}", offset);
        source.seek(SeekFrom::Start(offset))?;

        let lines = source
            .read_lines_to_token(b"trailer")?
            .ok_or(Error::UnterminatedXref)?;

        if self.location.is_none() {
            self.location = Some(offset);
        }

        let mut cursor = 1u32;
        for line in &lines {
            self.record_line(line, &mut cursor, options)?;
        }
        log::debug!(
            "xref section holds {} in-use entries, max object {}",
            self.entries.len(),
            self.max_object
        );

        source.seek(SeekFrom::Start(offset))?;
        if !source.skip_to_token(b"trailer")? {
            return Err(Error::TrailerNotFound);
        }
        source.read_token()?;

        match decode_value(source, options)? {
            Some(Value::Dictionary(trailer)) => {
                if trailer.contains_key("/Prev") {
                    log::debug!("Trailer has /Prev; earlier xref sections are not read");
                }
                self.trailer = trailer;
                Ok(())
            },
            Some(other) => Err(Error::InvalidTrailer {
                found: other.type_name(),
            }),
            None => Err(Error::InvalidTrailer { found: "nothing" }),
        }
    }

    /// Apply one raw line of an xref section.
    fn record_line(&mut self, raw: &[u8], cursor: &mut u32, options: &ParserOptions) -> Result<()> {
        let text = String::from_utf8_lossy(raw);
        let line = text.trim();
        if line.is_empty() || line == "xref" {
            return Ok(());
        }

        match parse_xref_line(line.as_bytes()) {
            Some(XrefLine::Subsection { start, end }) => {
                *cursor = start;
                self.max_object = self.max_object.max(end);
            },
            Some(XrefLine::Entry {
                offset,
                generation,
                flag,
            }) => {
                match flag {
                    b"n" => {
                        self.entries
                            .entry(ObjectRef::new(*cursor, generation))
                            .or_insert(offset);
                    },
                    b"f" => {},
                    _ if options.strict => return Err(Error::InvalidXrefLine(line.to_string())),
                    _ => log::warn!("Unknown xref entry flag in '{}', treating as free", line),
                }
                *cursor = cursor
                    .checked_add(1)
                    .ok_or_else(|| Error::InvalidXrefLine(line.to_string()))?;
            },
            None => return Err(Error::InvalidXrefLine(line.to_string())),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::TokenReader;
    use std::io::Cursor;

    fn read(input: &str) -> Result<CrossRefTable> {
        let mut source = TokenReader::new(Cursor::new(input.as_bytes().to_vec()))?;
        let mut table = CrossRefTable::new();
        table.read_section(&mut source, 0, &ParserOptions::default())?;
        Ok(table)
    }

    #[test]
    fn test_parse_subsection_line() {
        assert_eq!(parse_xref_line(b"0 6"), Some(XrefLine::Subsection { start: 0, end: 6 }));
    }

    #[test]
    fn test_parse_entry_line() {
        assert_eq!(
            parse_xref_line(b"0000000018 00000 n"),
            Some(XrefLine::Entry {
                offset: 18,
                generation: 0,
                flag: b"n",
            })
        );
    }

    #[test]
    fn test_parse_malformed_lines() {
        assert_eq!(parse_xref_line(b"7"), None);
        assert_eq!(parse_xref_line(b"1 2 3 4"), None);
        assert_eq!(parse_xref_line(b"abc def"), None);
    }

    #[test]
    fn test_read_simple_table() {
        let table = read(
            "xref\n0 3\n0000000000 65535 f\n0000000018 00000 n\n0000000077 00000 n\ntrailer\n<< /Size 3 /Root 1 0 R >>\n",
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(ObjectRef::new(1, 0)), Some(18));
        assert_eq!(table.get(ObjectRef::new(2, 0)), Some(77));
        assert_eq!(table.get(ObjectRef::new(0, 65535)), None);
        assert_eq!(table.max_object(), 3);
        assert_eq!(table.location(), Some(0));
        assert_eq!(table.trailer()["/Root"], Value::ObjectRef(ObjectRef::new(1, 0)));
    }

    #[test]
    fn test_multiple_subsections() {
        let table = read(
            "xref\n0 1\n0000000000 65535 f\n4 2\n0000000100 00000 n\n0000000200 00001 n\ntrailer\n<< >>",
        )
        .unwrap();
        assert_eq!(table.get(ObjectRef::new(4, 0)), Some(100));
        assert_eq!(table.get(ObjectRef::new(5, 1)), Some(200));
        assert_eq!(table.max_object(), 2);
    }

    #[test]
    fn test_first_entry_wins() {
        let table = read(
            "xref\n3 1\n0000000100 00000 n\n3 1\n0000000999 00000 n\ntrailer\n<< >>",
        )
        .unwrap();
        assert_eq!(table.get(ObjectRef::new(3, 0)), Some(100));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_malformed_line_is_fatal() {
        let err = read("xref\n0 1\ngarbage\ntrailer\n<< >>").unwrap_err();
        assert!(matches!(err, Error::InvalidXrefLine(ref l) if l == "garbage"));
    }

    #[test]
    fn test_missing_trailer() {
        assert!(matches!(read("xref\n0 1\n0000000000 65535 f\n"), Err(Error::UnterminatedXref)));
    }

    #[test]
    fn test_trailer_not_dictionary() {
        assert!(matches!(
            read("xref\n0 0\ntrailer\n[1 2]"),
            Err(Error::InvalidTrailer { found: "Array" })
        ));
    }

    #[test]
    fn test_unknown_flag() {
        let input = "xref\n1 2\n0000000010 00000 x\n0000000020 00000 n\ntrailer\n<< >>";
        let table = read(input).unwrap();
        assert_eq!(table.get(ObjectRef::new(2, 0)), Some(20));
        assert_eq!(table.get(ObjectRef::new(1, 0)), None);

        let mut source = TokenReader::new(Cursor::new(input.as_bytes().to_vec())).unwrap();
        let mut strict = CrossRefTable::new();
        assert!(strict.read_section(&mut source, 0, &ParserOptions::strict()).is_err());
    }

    #[test]
    fn test_find_xref_offset() {
        let mut data = Cursor::new(b"%PDF-1.4\n...\nstartxref\n1234\n%%EOF\n".to_vec());
        assert_eq!(find_xref_offset(&mut data).unwrap(), 1234);
    }

    #[test]
    fn test_find_last_startxref() {
        let mut data = Cursor::new(b"startxref\n10\n%%EOF\nstartxref\r\n20\r\n%%EOF".to_vec());
        assert_eq!(find_xref_offset(&mut data).unwrap(), 20);
    }

    #[test]
    fn test_find_xref_offset_missing() {
        let mut data = Cursor::new(b"%PDF-1.4\nno pointer here".to_vec());
        assert!(matches!(find_xref_offset(&mut data), Err(Error::XrefNotFound)));

        let mut data = Cursor::new(b"startxref\n%%EOF".to_vec());
        assert!(matches!(find_xref_offset(&mut data), Err(Error::XrefNotFound)));
    }
}
