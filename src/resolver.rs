//! Indirect object resolution.
//!
//! Objects are loaded on demand by seeking to the offset recorded in the
//! cross-reference table. Nothing is cached: every call decodes again.
//!
//! Offsets in hand-edited or incrementally updated files are often off by a
//! few bytes. When the header found at the recorded offset does not name the
//! requested object, the whole source is scanned for `N G obj` instead.
//!
//! Resolution never moves the caller's cursor: the position is saved on
//! entry and restored on every exit path, so resolutions can interleave with
//! other reads of the same source.

use crate::error::{Error, Result};
use crate::lexer::TokenSource;
use crate::object::{Dictionary, ObjectDeclaration, ObjectRef, Value};
use crate::parser::decode_value;
use crate::parser_config::ParserOptions;
use crate::xref::CrossRefTable;
use std::io::SeekFrom;
use std::ops::{Deref, DerefMut};

/// At most this many values are collected between `obj` and `endobj`.
const MAX_DECLARATION_VALUES: usize = 2;

/// Input accepted by [`Resolver::resolve`].
#[derive(Debug, Clone, Copy)]
pub enum Resolvable<'a> {
    /// A decoded value; only `Value::ObjectRef` resolves
    Value(&'a Value),
    /// An already decoded object, returned as is
    Declaration(&'a ObjectDeclaration),
}

impl<'a> From<&'a Value> for Resolvable<'a> {
    fn from(value: &'a Value) -> Self {
        Resolvable::Value(value)
    }
}

impl<'a> From<&'a ObjectDeclaration> for Resolvable<'a> {
    fn from(declaration: &'a ObjectDeclaration) -> Self {
        Resolvable::Declaration(declaration)
    }
}

/// Restores the source position it was created at when dropped.
struct PositionGuard<'a, S: TokenSource + ?Sized> {
    source: &'a mut S,
    origin: u64,
}

impl<'a, S: TokenSource + ?Sized> PositionGuard<'a, S> {
    fn new(source: &'a mut S) -> Result<Self> {
        let origin = source.position()?;
        Ok(Self { source, origin })
    }
}

impl<S: TokenSource + ?Sized> Deref for PositionGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        &*self.source
    }
}

impl<S: TokenSource + ?Sized> DerefMut for PositionGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut *self.source
    }
}

impl<S: TokenSource + ?Sized> Drop for PositionGuard<'_, S> {
    fn drop(&mut self) {
        if let Err(e) = self.source.seek(SeekFrom::Start(self.origin)) {
            log::error!("Failed to restore position {}: {}", self.origin, e);
        }
    }
}

/// Resolves references against one cross-reference table.
pub struct Resolver<'a, S: TokenSource + ?Sized> {
    source: &'a mut S,
    xref: &'a CrossRefTable,
    options: &'a ParserOptions,
}

impl<'a, S: TokenSource + ?Sized> Resolver<'a, S> {
    /// Create a resolver.
    pub fn new(source: &'a mut S, xref: &'a CrossRefTable, options: &'a ParserOptions) -> Self {
        Self {
            source,
            xref,
            options,
        }
    }

    /// Resolve a reference to its declaration.
    ///
    /// Returns `Ok(None)` when the input is not a reference, the reference
    /// has no in-use xref entry, or its header cannot be found anywhere in
    /// the source. A declaration passed in is returned unchanged.
    ///
    /// # Errors
    ///
    /// I/O failures and hard parse errors in the object body.
    pub fn resolve<'v>(&mut self, target: impl Into<Resolvable<'v>>) -> Result<Option<ObjectDeclaration>> {
        let reference = match target.into() {
            Resolvable::Declaration(declaration) => return Ok(Some(declaration.clone())),
            Resolvable::Value(Value::ObjectRef(reference)) => *reference,
            Resolvable::Value(other) => {
                log::debug!("Cannot resolve a {} value", other.type_name());
                return Ok(None);
            },
        };

        let Some(offset) = self.xref.get(reference) else {
            log::debug!("Object {} is not in the xref table", reference);
            return Ok(None);
        };

        let options = self.options;
        let mut source = PositionGuard::new(&mut *self.source)?;

        if !Self::position_at_header(&mut *source, reference, offset, options)? {
            return Ok(None);
        }

        let mut declaration = ObjectDeclaration::new(reference);
        while let Some(value) = decode_value(&mut *source, options)? {
            if value.is_token(b"endobj") {
                break;
            }
            let is_stream = matches!(value, Value::Stream);
            declaration.values.push(value);
            if is_stream || declaration.values.len() >= MAX_DECLARATION_VALUES {
                break;
            }
        }

        Ok(Some(declaration))
    }

    /// Resolve a value and return the first value of the object as a
    /// dictionary.
    ///
    /// An inline dictionary is returned as is.
    pub fn resolve_dictionary(&mut self, value: &Value) -> Result<Option<Dictionary>> {
        if let Value::Dictionary(dict) = value {
            return Ok(Some(dict.clone()));
        }
        Ok(self.resolve(value)?.and_then(ObjectDeclaration::into_dictionary))
    }

    /// Leave the cursor just past the `N G obj` header of `reference`.
    fn position_at_header(
        source: &mut S,
        reference: ObjectRef,
        offset: u64,
        options: &ParserOptions,
    ) -> Result<bool> {
        source.seek(SeekFrom::Start(offset))?;
        let header = match decode_value(source, options) {
            Ok(value) => value,
            Err(Error::Io(e)) => return Err(Error::Io(e)),
            Err(e) => {
                log::debug!("Undecodable data at offset {}: {}", offset, e);
                None
            },
        };

        if header.as_ref().and_then(Value::as_reference) == Some(reference) {
            return Ok(true);
        }

        log::warn!(
            "Object {} is not at its xref offset {}, scanning the file",
            reference,
            offset
        );
        let pattern = format!("{} {} obj", reference.id, reference.gen);
        source.seek(SeekFrom::Start(0))?;
        if !source.skip_to_token(pattern.as_bytes())? {
            log::warn!("Object header '{}' not found", pattern);
            return Ok(false);
        }
        let found = source.position()?;
        source.read_tokens(3)?;
        log::info!("Found object {} at byte offset {} (scanned file)", reference, found);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::TokenReader;
    use crate::object::Token;
    use std::io::Cursor;

    const DOC: &[u8] = b"1 0 obj\n<< /Type /Catalog >>\nendobj\n2 0 obj\n[1 2 3]\nendobj\n3 0 obj\n42 43 44\nendobj\n";

    fn table(entries: &[(u32, u64)]) -> CrossRefTable {
        let mut xref = String::from("xref\n");
        for (id, offset) in entries {
            xref.push_str(&format!("{} 1\n{:010} 00000 n\n", id, offset));
        }
        xref.push_str("trailer\n<< >>\n");

        let mut source = TokenReader::new(Cursor::new(xref.into_bytes())).unwrap();
        let mut table = CrossRefTable::new();
        table.read_section(&mut source, 0, &ParserOptions::default()).unwrap();
        table
    }

    fn offset_of(needle: &str) -> u64 {
        DOC.windows(needle.len())
            .position(|w| w == needle.as_bytes())
            .unwrap() as u64
    }

    fn reader() -> TokenReader<Cursor<Vec<u8>>> {
        TokenReader::new(Cursor::new(DOC.to_vec())).unwrap()
    }

    #[test]
    fn test_resolve_at_recorded_offset() {
        let xref = table(&[(1, 0)]);
        let options = ParserOptions::default();
        let mut source = reader();
        let mut resolver = Resolver::new(&mut source, &xref, &options);

        let decl = resolver
            .resolve(&Value::ObjectRef(ObjectRef::new(1, 0)))
            .unwrap()
            .unwrap();
        assert_eq!(decl.reference, ObjectRef::new(1, 0));
        assert_eq!(decl.values.len(), 1);
        assert_eq!(decl.dictionary().unwrap()["/Type"].as_name(), Some("/Catalog"));
    }

    #[test]
    fn test_resolve_with_drifted_offset() {
        let xref = table(&[(2, offset_of("2 0 obj") - 5)]);
        let options = ParserOptions::default();
        let mut source = reader();
        source.seek(SeekFrom::Start(17)).unwrap();

        let decl = Resolver::new(&mut source, &xref, &options)
            .resolve(&Value::ObjectRef(ObjectRef::new(2, 0)))
            .unwrap()
            .unwrap();
        assert_eq!(decl.array().map(<[Value]>::len), Some(3));
        assert_eq!(source.position().unwrap(), 17);
    }

    #[test]
    fn test_resolve_missing_header_restores_position() {
        let xref = table(&[(9, 0)]);
        let options = ParserOptions::default();
        let mut source = reader();
        source.seek(SeekFrom::Start(8)).unwrap();

        let result = Resolver::new(&mut source, &xref, &options)
            .resolve(&Value::ObjectRef(ObjectRef::new(9, 0)))
            .unwrap();
        assert!(result.is_none());
        assert_eq!(source.position().unwrap(), 8);
    }

    #[test]
    fn test_resolve_unknown_reference() {
        let xref = table(&[(1, 0)]);
        let options = ParserOptions::default();
        let mut source = reader();
        let result = Resolver::new(&mut source, &xref, &options)
            .resolve(&Value::ObjectRef(ObjectRef::new(5, 0)))
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_resolve_non_reference() {
        let xref = CrossRefTable::new();
        let options = ParserOptions::default();
        let mut source = reader();
        let mut resolver = Resolver::new(&mut source, &xref, &options);
        assert!(resolver.resolve(&Value::Numeric(1)).unwrap().is_none());
        assert!(resolver.resolve(&Value::Token(Token::from("/Name"))).unwrap().is_none());
    }

    #[test]
    fn test_resolve_declaration_is_identity() {
        let xref = CrossRefTable::new();
        let options = ParserOptions::default();
        let mut source = reader();
        let mut decl = ObjectDeclaration::new(ObjectRef::new(7, 0));
        decl.values.push(Value::Boolean(true));

        let resolved = Resolver::new(&mut source, &xref, &options).resolve(&decl).unwrap();
        assert_eq!(resolved, Some(decl));
    }

    #[test]
    fn test_resolve_collects_at_most_two_values() {
        let xref = table(&[(3, offset_of("3 0 obj"))]);
        let options = ParserOptions::default();
        let mut source = reader();
        let decl = Resolver::new(&mut source, &xref, &options)
            .resolve(&Value::ObjectRef(ObjectRef::new(3, 0)))
            .unwrap()
            .unwrap();
        assert_eq!(decl.values, vec![Value::Numeric(42), Value::Numeric(43)]);
    }

    #[test]
    fn test_resolve_stops_after_stream() {
        let data = b"4 0 obj\n<< /Length 3 >>\nstream\nabc\nendstream\nendobj\n".to_vec();
        let xref = table(&[(4, 0)]);
        let options = ParserOptions::default();
        let mut source = TokenReader::new(Cursor::new(data)).unwrap();
        let decl = Resolver::new(&mut source, &xref, &options)
            .resolve(&Value::ObjectRef(ObjectRef::new(4, 0)))
            .unwrap()
            .unwrap();
        assert_eq!(decl.values.len(), 2);
        assert_eq!(decl.values[1], Value::Stream);
    }

    #[test]
    fn test_resolve_dictionary_inline() {
        let xref = CrossRefTable::new();
        let options = ParserOptions::default();
        let mut source = reader();
        let mut dict = Dictionary::new();
        dict.insert("/A".to_string(), Value::Null);

        let resolved = Resolver::new(&mut source, &xref, &options)
            .resolve_dictionary(&Value::Dictionary(dict.clone()))
            .unwrap();
        assert_eq!(resolved, Some(dict));
    }
}
