//! # PDF Import
//!
//! Read-only decoder for the PDF object model, built for importing existing
//! pages as reusable templates.
//!
//! ## Core Features
//!
//! - **Value Decoding**: recursive descent over dictionaries, arrays, literal
//!   and hex strings, numbers, booleans, null, references and object headers
//! - **Cross-Reference Tables**: `startxref` discovery, traditional xref
//!   sections and the trailer dictionary
//! - **Object Resolution**: on-demand seek to recorded offsets, with a
//!   linear scan when offsets have drifted
//! - **Page Tree**: `/Kids` walk into a page list, page boxes and rotation
//!   inherited through `/Parent`
//!
//! Encrypted documents are detected and rejected. Stream bodies are not
//! decoded, and nothing is ever written back.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf_import::{BoxType, PdfParser};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut parser = PdfParser::open("template.pdf")?;
//!
//! // Boxes in millimetres (72 points per inch, 25.4 mm per inch)
//! let boxes = parser.page_boxes(1, 72.0 / 25.4)?;
//! if let Some(crop) = boxes.effective(BoxType::CropBox) {
//!     println!("{:.1} x {:.1} mm", crop.size.w, crop.size.h);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Core PDF parsing
pub mod document;
pub mod lexer;
pub mod object;
pub mod parser;
/// Parser configuration options
pub mod parser_config;
pub mod resolver;
pub mod xref;

// Page model
pub mod geometry;
pub mod page;

// Re-exports
pub use document::PdfParser;
pub use error::{Error, Result};
pub use geometry::{BoxType, PageBox, PageBoxes, Point, Size};
pub use lexer::{TokenReader, TokenSource};
pub use object::{Dictionary, ObjectDeclaration, ObjectRef, Token, Value};
pub use page::PdfPage;
pub use parser_config::ParserOptions;
pub use resolver::{Resolvable, Resolver};
pub use xref::CrossRefTable;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "pdf_import");
    }
}
