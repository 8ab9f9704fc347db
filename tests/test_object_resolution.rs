//! Test object resolution and xref handling.

mod common;

use common::{PdfBuilder, find, two_page_document};
use pdf_import::{
    CrossRefTable, ObjectDeclaration, ObjectRef, ParserOptions, PdfParser, Resolver, TokenReader, TokenSource,
    Value,
};
use std::io::{Cursor, SeekFrom};

fn load(data: Vec<u8>) -> (TokenReader<Cursor<Vec<u8>>>, CrossRefTable) {
    let mut source = TokenReader::new(Cursor::new(data)).unwrap();
    let offset = source.find_xref_table().unwrap();
    let mut xref = CrossRefTable::new();
    xref.read_section(&mut source, offset, &ParserOptions::default())
        .unwrap();
    (source, xref)
}

/// An offset that no longer points at its header is recovered by scanning,
/// and the caller's position is unchanged afterwards.
#[test]
fn test_drifted_offset_resolves_by_linear_scan() {
    let data = two_page_document().drift(3, -4).build();
    let (mut source, xref) = load(data);
    let options = ParserOptions::default();

    source.seek(SeekFrom::Start(11)).unwrap();
    let declaration = Resolver::new(&mut source, &xref, &options)
        .resolve(&Value::ObjectRef(ObjectRef::new(3, 0)))
        .unwrap()
        .expect("object 3 found by scan");

    assert_eq!(declaration.reference, ObjectRef::new(3, 0));
    assert_eq!(declaration.dictionary().unwrap()["/Type"].as_name(), Some("/Page"));
    assert_eq!(source.position().unwrap(), 11);
}

#[test]
fn test_scan_respects_token_boundaries() {
    // Object 13 would contain "3 0 obj" as a substring
    let data = PdfBuilder::new()
        .object(13, "(thirteen)")
        .object(3, "(three)")
        .drift(3, 100_000)
        .build();
    let (mut source, xref) = load(data);
    let options = ParserOptions::default();

    let declaration = Resolver::new(&mut source, &xref, &options)
        .resolve(&Value::ObjectRef(ObjectRef::new(3, 0)))
        .unwrap()
        .unwrap();
    assert_eq!(declaration.values, vec![Value::String(b"three".to_vec())]);
}

#[test]
fn test_missing_header_is_a_miss() {
    let data = two_page_document().build();
    let mut bogus = data.clone();
    let at = find(&bogus, "3 0 obj");
    bogus[at] = b'9';

    let (mut source, xref) = load(bogus);
    let options = ParserOptions::default();
    source.seek(SeekFrom::Start(20)).unwrap();

    let result = Resolver::new(&mut source, &xref, &options)
        .resolve(&Value::ObjectRef(ObjectRef::new(3, 0)))
        .unwrap();
    assert!(result.is_none());
    assert_eq!(source.position().unwrap(), 20);
}

#[test]
fn test_resolution_interleaves_with_reads() {
    let data = two_page_document().build();
    let (mut source, xref) = load(data.clone());
    let options = ParserOptions::default();

    let start = find(&data, "/Kids") as u64;
    source.seek(SeekFrom::Start(start)).unwrap();
    assert_eq!(source.read_token().unwrap().unwrap().to_string(), "/Kids");

    Resolver::new(&mut source, &xref, &options)
        .resolve(&Value::ObjectRef(ObjectRef::new(4, 0)))
        .unwrap()
        .unwrap();

    assert_eq!(source.read_token().unwrap().unwrap().to_string(), "[");
}

#[test]
fn test_parser_resolve() {
    let mut parser = PdfParser::from_reader(Cursor::new(two_page_document().build())).unwrap();

    let catalog = parser
        .resolve(&Value::ObjectRef(ObjectRef::new(1, 0)))
        .unwrap()
        .unwrap();
    assert_eq!(catalog.dictionary().unwrap()["/Pages"], Value::ObjectRef(ObjectRef::new(2, 0)));

    assert!(parser.resolve(&Value::Numeric(1)).unwrap().is_none());
    assert!(parser.resolve(&Value::ObjectRef(ObjectRef::new(42, 0))).unwrap().is_none());

    let held = ObjectDeclaration::new(ObjectRef::new(77, 0));
    assert_eq!(parser.resolve(&held).unwrap(), Some(held.clone()));
}

#[test]
fn test_object_without_endobj() {
    let mut data = b"%PDF-1.4\n".to_vec();
    let offset = data.len();
    data.extend_from_slice(b"1 0 obj\n<< /A 1 >>\n<< /B 2 >>\n<< /C 3 >>\n");
    let xref_offset = data.len();
    data.extend_from_slice(
        format!(
            "xref\n1 1\n{:010} 00000 n \ntrailer\n<< /Size 2 >>\nstartxref\n{}\n%%EOF\n",
            offset, xref_offset
        )
        .as_bytes(),
    );

    let (mut source, xref) = load(data);
    let options = ParserOptions::default();
    let declaration = Resolver::new(&mut source, &xref, &options)
        .resolve(&Value::ObjectRef(ObjectRef::new(1, 0)))
        .unwrap()
        .unwrap();
    assert_eq!(declaration.values.len(), 2);
}
