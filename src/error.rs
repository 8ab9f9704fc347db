//! Error types for the PDF import library.
//!
//! Everything that makes a document unusable at open time is a typed error.
//! A reference that simply cannot be satisfied is not an error: the resolver
//! reports it as `None` and the caller decides whether that is fatal.

use crate::object::ObjectRef;

/// Result type alias for PDF import operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while decoding a PDF object model.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error from the underlying byte source
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No usable `startxref` pointer near the end of the file
    #[error("Could not locate the cross-reference table")]
    XrefNotFound,

    /// A line inside the xref section has an unexpected shape
    #[error("Unexpected data in xref table: '{0}'")]
    InvalidXrefLine(String),

    /// The xref section is not followed by a `trailer` keyword
    #[error("Cannot read end of xref table")]
    UnterminatedXref,

    /// The `trailer` keyword could not be found again after the table
    #[error("Cannot find trailer after xref table")]
    TrailerNotFound,

    /// The value after `trailer` is not a dictionary
    #[error("Trailer is not a dictionary, found {found}")]
    InvalidTrailer {
        /// Type of the value that was decoded instead
        found: &'static str,
    },

    /// A mandatory dictionary key is absent
    #[error("Could not find {key} in {context}")]
    MissingKey {
        /// Dictionary key including its leading slash
        key: &'static str,
        /// Dictionary the key was expected in
        context: &'static str,
    },

    /// A value has the wrong type for the key it is stored under
    #[error("Wrong type of {key}: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Dictionary key including its leading slash
        key: &'static str,
        /// Expected value type
        expected: &'static str,
        /// Actual value type
        found: &'static str,
    },

    /// A mandatory indirect reference could not be resolved
    #[error("Could not resolve {key} ({reference})")]
    Unresolved {
        /// Dictionary key the reference was read from
        key: &'static str,
        /// The reference that failed
        reference: ObjectRef,
    },

    /// An entry of the `/Kids` array could not be resolved to a dictionary
    #[error("Could not resolve page at index {index} of /Kids")]
    UnresolvedKid {
        /// Zero-based index inside `/Kids`
        index: usize,
    },

    /// The trailer carries an `/Encrypt` entry
    #[error("File is encrypted")]
    Encrypted,

    /// Malformed syntax at a known byte offset
    #[error("Failed to parse object at byte {offset}: {reason}")]
    ParseError {
        /// Byte offset where the problem was detected
        offset: u64,
        /// Reason for the failure
        reason: String,
    },

    /// Nesting of arrays, dictionaries or page tree nodes is too deep
    #[error("Recursion depth limit exceeded (max: {0})")]
    RecursionLimitExceeded(usize),

    /// Box queries need a finite, non-zero scale factor
    #[error("Invalid scale factor: {0}")]
    InvalidScale(f64),
}
