//! PDF document parser.
//!
//! Opening a document reads the cross-reference table and trailer, resolves
//! the catalog and the page tree root, and walks `/Kids` into a page list.
//! Page boxes and rotation are looked up on demand, following `/Parent`
//! links for inherited attributes.

use crate::error::{Error, Result};
use crate::geometry::{BoxType, PageBox, PageBoxes};
use crate::lexer::{TokenReader, TokenSource};
use crate::object::{Dictionary, ObjectDeclaration, ObjectRef, Value};
use crate::page::{PdfPage, box_from_array, normalize_rotation};
use crate::parser_config::ParserOptions;
use crate::resolver::{Resolvable, Resolver};
use crate::xref::CrossRefTable;
use std::borrow::Cow;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// A PDF document opened for object model import.
///
/// The parser owns the byte source, the cross-reference table and the
/// decoded page list. It is not meant to be shared between threads.
///
/// # Example
///
/// ```no_run
/// use pdf_import::document::PdfParser;
/// use pdf_import::geometry::BoxType;
///
/// let mut parser = PdfParser::open("sample.pdf")?;
/// println!("Page count: {}", parser.page_count());
///
/// let boxes = parser.page_boxes(1, 1.0)?;
/// if let Some(media) = boxes.get(BoxType::MediaBox) {
///     println!("{} x {}", media.size.w, media.size.h);
/// }
/// # Ok::<(), pdf_import::error::Error>(())
/// ```
pub struct PdfParser<S> {
    /// Token source over the file
    source: S,
    /// Limits and leniency switches
    options: ParserOptions,
    /// Cross-reference table and trailer
    xref: CrossRefTable,
    /// Document catalog
    root: Dictionary,
    /// Root node of the page tree
    pages_root: Dictionary,
    /// Leaf pages in document order
    pages: Vec<PdfPage>,
    /// Current page (1-based, 0 when unset)
    page_number: usize,
    /// Box type returned by the last `page_box` call
    last_used_page_box: BoxType,
}

impl<S> std::fmt::Debug for PdfParser<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfParser")
            .field("xref_entries", &self.xref.len())
            .field("page_count", &self.pages.len())
            .field("page_number", &self.page_number)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl PdfParser<TokenReader<BufReader<File>>> {
    /// Open a PDF document from a file path with default options.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be opened
    /// - The cross-reference table cannot be found or parsed
    /// - The trailer, catalog or page tree root is missing or malformed
    /// - The document is encrypted
    /// - A page listed in `/Kids` cannot be resolved
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, ParserOptions::default())
    }

    /// Open a PDF document from a file path.
    pub fn open_with_options(path: impl AsRef<Path>, options: ParserOptions) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        log::debug!("Opening {}", path.as_ref().display());
        Self::with_options(TokenReader::new(BufReader::new(file))?, options)
    }
}

impl<R: Read + Seek> PdfParser<TokenReader<R>> {
    /// Open a PDF document held by any seekable reader, with default options.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pdf_import::document::PdfParser;
    /// use std::io::Cursor;
    ///
    /// let bytes = std::fs::read("sample.pdf")?;
    /// let parser = PdfParser::from_reader(Cursor::new(bytes))?;
    /// # Ok::<(), pdf_import::error::Error>(())
    /// ```
    pub fn from_reader(reader: R) -> Result<Self> {
        Self::with_options(TokenReader::new(reader)?, ParserOptions::default())
    }
}

impl<S: TokenSource> PdfParser<S> {
    /// Run the open sequence over `source`.
    pub fn with_options(mut source: S, options: ParserOptions) -> Result<Self> {
        let offset = source.find_xref_table()?;
        let mut xref = CrossRefTable::new();
        xref.read_section(&mut source, offset, &options)?;
        log::debug!("Loaded xref table with {} entries", xref.len());

        let mut resolver = Resolver::new(&mut source, &xref, &options);

        let root = required_dictionary(&mut resolver, xref.trailer(), "/Root", "trailer")?;

        if xref.trailer().contains_key("/Encrypt") {
            log::warn!("Trailer has /Encrypt, refusing to open");
            return Err(Error::Encrypted);
        }

        let pages_root = required_dictionary(&mut resolver, &root, "/Pages", "document catalog")?;

        let mut pages = Vec::new();
        collect_pages(&mut resolver, &pages_root, &options, 0, &mut pages)?;
        log::info!("Found {} pages", pages.len());

        Ok(Self {
            source,
            options,
            xref,
            root,
            pages_root,
            pages,
            page_number: 0,
            last_used_page_box: options.default_box,
        })
    }

    /// Resolve an indirect reference against this document.
    ///
    /// See [`Resolver::resolve`].
    pub fn resolve<'v>(&mut self, target: impl Into<Resolvable<'v>>) -> Result<Option<ObjectDeclaration>> {
        Resolver::new(&mut self.source, &self.xref, &self.options).resolve(target)
    }

    /// Get the number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All pages in document order.
    pub fn pages(&self) -> &[PdfPage] {
        &self.pages
    }

    /// Page by 1-based number.
    pub fn page(&self, page_number: usize) -> Option<&PdfPage> {
        page_number.checked_sub(1).and_then(|i| self.pages.get(i))
    }

    /// Get the trailer dictionary.
    pub fn trailer(&self) -> &Dictionary {
        self.xref.trailer()
    }

    /// Document catalog.
    pub fn root(&self) -> &Dictionary {
        &self.root
    }

    /// Root node of the page tree.
    pub fn pages_root(&self) -> &Dictionary {
        &self.pages_root
    }

    /// Cross-reference table.
    pub fn xref(&self) -> &CrossRefTable {
        &self.xref
    }

    /// Options the document was opened with.
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Set the current page.
    pub fn set_page_number(&mut self, page_number: usize) {
        self.page_number = page_number;
    }

    /// Current page, 0 when never set.
    pub fn page_number(&self) -> usize {
        self.page_number
    }

    /// Box type returned by the most recent [`page_box`](Self::page_box)
    /// call, the default box before any call.
    pub fn last_used_page_box(&self) -> BoxType {
        self.last_used_page_box
    }

    /// Compute the boxes of a page, divided by `scale`.
    ///
    /// Boxes missing on the page are inherited from the nearest ancestor
    /// that has them. A page number of 0 or past the last page gives an
    /// empty set.
    ///
    /// # Errors
    ///
    /// `Error::InvalidScale` unless `scale` is finite and non-zero; I/O and
    /// parse errors while resolving ancestors.
    pub fn page_boxes(&mut self, page_number: usize, scale: f64) -> Result<PageBoxes> {
        if !scale.is_finite() || scale == 0.0 {
            return Err(Error::InvalidScale(scale));
        }

        let mut boxes = PageBoxes::new(self.options.default_box);
        let Some(page) = page_number.checked_sub(1).and_then(|i| self.pages.get(i)) else {
            log::debug!("No page {} in a document of {} pages", page_number, self.pages.len());
            return Ok(boxes);
        };

        let mut resolver = Resolver::new(&mut self.source, &self.xref, &self.options);
        for box_type in BoxType::ALL {
            let Some(value) = inherited_attribute(
                &mut resolver,
                &page.dictionary,
                box_type.key(),
                self.options.max_parent_depth,
            )?
            else {
                continue;
            };

            let values = match value {
                Value::Array(values) => values,
                other => match resolver.resolve(&other)? {
                    Some(ObjectDeclaration { values, .. }) => match values.into_iter().next() {
                        Some(Value::Array(values)) => values,
                        _ => Vec::new(),
                    },
                    None => Vec::new(),
                },
            };

            match box_from_array(&values, scale) {
                Some(page_box) => boxes.insert(box_type, page_box),
                None => log::warn!("Page {} has a malformed {}", page_number, box_type.key()),
            }
        }

        Ok(boxes)
    }

    /// Box of the requested type, falling back as described in
    /// [`PageBoxes::effective`].
    ///
    /// Records the type of the returned box as the last used page box.
    pub fn page_box(&mut self, page_number: usize, box_type: BoxType, scale: f64) -> Result<Option<PageBox>> {
        let boxes = self.page_boxes(page_number, scale)?;
        let mut current = Some(box_type);
        while let Some(candidate) = current {
            if let Some(found) = boxes.get(candidate) {
                self.last_used_page_box = candidate;
                return Ok(Some(*found));
            }
            current = candidate.fallback();
        }
        Ok(None)
    }

    /// Page rotation in degrees: 0, 90, 180 or 270.
    ///
    /// `/Rotate` is inherited like the boxes; a page without one (or a page
    /// number out of range) is not rotated.
    pub fn page_rotation(&mut self, page_number: usize) -> Result<i64> {
        let Some(page) = page_number.checked_sub(1).and_then(|i| self.pages.get(i)) else {
            return Ok(0);
        };

        let mut resolver = Resolver::new(&mut self.source, &self.xref, &self.options);
        let value = inherited_attribute(
            &mut resolver,
            &page.dictionary,
            "/Rotate",
            self.options.max_parent_depth,
        )?;

        let degrees = match value {
            None => None,
            Some(Value::Numeric(n)) => Some(n),
            Some(other) => resolver
                .resolve(&other)?
                .and_then(|decl| decl.first().and_then(Value::as_integer)),
        };
        Ok(degrees.map_or(0, normalize_rotation))
    }

    /// Close the document and give back the byte source.
    pub fn close(self) -> S {
        self.source
    }
}

/// Read `key` from `dict`, which must hold a reference to a dictionary.
fn required_dictionary<S: TokenSource + ?Sized>(
    resolver: &mut Resolver<'_, S>,
    dict: &Dictionary,
    key: &'static str,
    context: &'static str,
) -> Result<Dictionary> {
    let value = dict.get(key).ok_or(Error::MissingKey { key, context })?;
    let Value::ObjectRef(reference) = value else {
        return Err(Error::InvalidObjectType {
            key,
            expected: "ObjectRef",
            found: value.type_name(),
        });
    };

    let declaration = resolver.resolve(value)?.ok_or(Error::Unresolved {
        key,
        reference: *reference,
    })?;
    match declaration.values.into_iter().next() {
        Some(Value::Dictionary(resolved)) => Ok(resolved),
        other => Err(Error::InvalidObjectType {
            key,
            expected: "Dictionary",
            found: other.as_ref().map_or("nothing", Value::type_name),
        }),
    }
}

/// Walk the `/Kids` of a page tree node into `pages`.
///
/// Kids are leaves unless nested trees are followed and the kid's `/Type`
/// is `/Pages`.
fn collect_pages<S: TokenSource + ?Sized>(
    resolver: &mut Resolver<'_, S>,
    node: &Dictionary,
    options: &ParserOptions,
    depth: usize,
    pages: &mut Vec<PdfPage>,
) -> Result<()> {
    if depth >= options.max_nesting {
        return Err(Error::RecursionLimitExceeded(options.max_nesting));
    }

    let kids = node.get("/Kids").ok_or(Error::MissingKey {
        key: "/Kids",
        context: "page tree node",
    })?;
    let kids = kids.as_array().ok_or(Error::InvalidObjectType {
        key: "/Kids",
        expected: "Array",
        found: kids.type_name(),
    })?;

    for (index, kid) in kids.iter().enumerate() {
        let dictionary = resolver
            .resolve_dictionary(kid)?
            .ok_or(Error::UnresolvedKid { index })?;

        let is_tree_node = dictionary.get("/Type").and_then(Value::as_name) == Some("/Pages");
        if options.follow_nested_page_trees && is_tree_node {
            log::debug!("Descending into nested page tree node at /Kids index {}", index);
            collect_pages(resolver, &dictionary, options, depth + 1, pages)?;
            continue;
        }

        pages.push(PdfPage::new(pages.len() + 1, dictionary));
    }
    Ok(())
}

/// Look up `key` on `start` and then on its `/Parent` chain.
///
/// Stops at the first node that has the key. A missing or unresolvable
/// parent, a repeated parent reference or more than `max_depth` hops end
/// the walk without a value.
fn inherited_attribute<S: TokenSource + ?Sized>(
    resolver: &mut Resolver<'_, S>,
    start: &Dictionary,
    key: &str,
    max_depth: usize,
) -> Result<Option<Value>> {
    let mut current = Cow::Borrowed(start);
    let mut visited: HashSet<ObjectRef> = HashSet::new();

    for _ in 0..=max_depth {
        if let Some(value) = current.get(key) {
            return Ok(Some(value.clone()));
        }
        let Some(parent) = current.get("/Parent") else {
            return Ok(None);
        };
        if let Value::ObjectRef(reference) = parent {
            if !visited.insert(*reference) {
                log::warn!("Cycle in /Parent chain at {}", reference);
                return Ok(None);
            }
        }
        match resolver.resolve_dictionary(parent)? {
            Some(dict) => current = Cow::Owned(dict),
            None => {
                log::warn!("Could not resolve /Parent while looking up {}", key);
                return Ok(None);
            },
        }
    }

    log::warn!("/Parent chain longer than {} while looking up {}", max_depth, key);
    Ok(None)
}
