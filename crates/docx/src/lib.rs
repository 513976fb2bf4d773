//! clinnote word-processor boundary
//!
//! This crate translates between the in-memory paragraph model used by the note assembler and
//! the WordprocessingML (`.docx`) package format. It knows nothing about clinical sections;
//! styling decisions are made by the caller and arrive here as explicit run and paragraph
//! formats.
//!
//! ## Design Principles
//!
//! - Serialisation returns bytes, never a path: callers decide whether to persist or stream
//! - Output is deterministic: no timestamps, document properties or random identifiers
//! - Decoding is done entirely in memory, so remote templates never touch the disk
//! - Every run carries its font explicitly; documents do not rely on Word's defaults
//!
//! ## Example Usage
//!
//! ```
//! use clinnote_docx::{read_paragraphs, write_docx, Document, Font, Paragraph, ParagraphFormat, Run, RunFormat};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let font = Font::from_points("Arial", 9.0);
//! let spacing = ParagraphFormat::single(12.0);
//! let mut document = Document::new(font.clone(), spacing);
//! document.push(Paragraph::new(
//!     vec![Run::new("ASSESSMENT:", RunFormat::plain(font).bold().underline())],
//!     spacing,
//! ));
//!
//! let bytes = write_docx(&document)?;
//! assert_eq!(read_paragraphs(&bytes)?, vec!["ASSESSMENT:".to_string()]);
//! # Ok(())
//! # }
//! ```

mod model;
mod reader;
mod writer;

pub use model::{Document, Font, Paragraph, ParagraphFormat, Run, RunFormat};
pub use reader::read_paragraphs;
pub use writer::write_docx;

/// Name of the main document part inside a `.docx` package.
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Errors that can occur while reading or writing `.docx` packages
#[derive(Debug, thiserror::Error)]
pub enum DocxError {
    /// Input bytes are not a zip-based document package
    #[error("not a word-processor document (detected: {0})")]
    NotDocx(String),

    /// A required part is absent from the package
    #[error("document package is missing part: {0}")]
    MissingPart(&'static str),

    /// The zip container could not be read or written
    #[error("invalid document archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The document XML could not be parsed
    #[error("invalid document XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// I/O error while streaming package parts
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
