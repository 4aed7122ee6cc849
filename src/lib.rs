//! Text reconstruction from positioned PDF glyph runs
//!
//! PDF pages store positioned text fragments, not words or lines. This crate
//! infers both from geometry:
//! - Word joining inside a row, with two gap policies (simple and raw)
//! - Page-wide line assembly by y clustering
//! - A physical layout that projects runs onto an 80-column character grid
//!
//! Glyph runs come from a [`RowSource`]. [`PdfSource`] reads them from PDF
//! content streams with lopdf; other parsers can plug in through the trait.
//! [`strings`] lists the string literals a PDF carries without any layout.

pub mod config;
pub mod document;
pub mod extract;
pub mod extractor;
pub mod grid;
pub mod joiner;
pub mod lines;
pub mod pages;
pub mod source;
pub mod strings;
pub mod types;

pub use config::{ExtractConfig, DEFAULT_PAGE_SEPARATOR};
pub use document::Document;
pub use extract::{
    extract_document, extract_page, extract_pages, extract_selected, par_extract_pages,
    par_extract_selected,
};
pub use extractor::PdfSource;
pub use grid::{GridRenderer, DEFAULT_PAGE_WIDTH, GRID_COLUMNS};
pub use joiner::{Conservative, StreamOrder, WordJoiner};
pub use lines::assemble_lines;
pub use pages::parse_page_range;
pub use source::{MemorySource, RowSource, SourceError};
pub use strings::{content_string_literals, extract_string_literals};
pub use types::{GlyphRun, LayoutMode, Line, Row};

use std::path::Path;

/// Result type alias for layout operations
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Open a PDF file and extract all of its text with the given options
pub fn extract_text<P: AsRef<Path>>(path: P, config: &ExtractConfig) -> Result<String> {
    let doc = Document::load(path)?;
    extract_document(&doc, config)
}

/// Extract all text of a PDF held in memory
pub fn extract_text_mem(buffer: &[u8], config: &ExtractConfig) -> Result<String> {
    let doc = Document::load_mem(buffer)?;
    extract_document(&doc, config)
}

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("invalid page {page} (document has {page_count} pages)")]
    InvalidPage { page: u32, page_count: u32 },
    #[error("failed to extract rows from page {page}: {source}")]
    RowExtractionFailed {
        page: u32,
        #[source]
        source: SourceError,
    },
    #[error("document is closed")]
    DocumentClosed,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid page range: {0}")]
    InvalidPageRange(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("PDF is encrypted; password required")]
    PasswordRequired,
    #[error("incorrect password")]
    WrongPassword,
    #[error("failed to read content stream of page {page}: {source}")]
    ContentStreamFailed {
        page: u32,
        #[source]
        source: SourceError,
    },
}

impl LayoutError {
    /// Page the error refers to, if any
    pub fn page(&self) -> Option<u32> {
        match self {
            LayoutError::InvalidPage { page, .. }
            | LayoutError::RowExtractionFailed { page, .. }
            | LayoutError::ContentStreamFailed { page, .. } => Some(*page),
            _ => None,
        }
    }
}

impl From<lopdf::Error> for LayoutError {
    fn from(e: lopdf::Error) -> Self {
        LayoutError::Parse(e.to_string())
    }
}
