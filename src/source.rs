//! Row sources: where positioned glyph runs come from
//!
//! Layout never parses documents itself. It asks a [`RowSource`] for the rows
//! of a page (1-based), and for the physical layout, the flat list of runs.

use crate::types::{GlyphRun, Row};

/// Errors reported by a row source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("page {0} does not exist")]
    MissingPage(u32),
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("PDF content error: {0}")]
    Content(String),
    #[error("source has no content streams")]
    NoContentStream,
}

impl From<lopdf::Error> for SourceError {
    fn from(e: lopdf::Error) -> Self {
        SourceError::Parse(e.to_string())
    }
}

/// Supplies rows of glyph runs per page
pub trait RowSource {
    /// Number of pages available
    fn page_count(&self) -> u32;

    /// Rows of a page in top-to-bottom order
    fn rows(&self, page: u32) -> Result<Vec<Row>, SourceError>;

    /// All runs of a page, in no particular order
    fn styled_runs(&self, page: u32) -> Result<Vec<GlyphRun>, SourceError> {
        Ok(self
            .rows(page)?
            .into_iter()
            .flat_map(|row| row.runs)
            .collect())
    }

    /// Raw content stream bytes of a page, for sources backed by a PDF
    fn content_stream(&self, _page: u32) -> Result<Vec<u8>, SourceError> {
        Err(SourceError::NoContentStream)
    }
}

/// Rows already held in memory, one `Vec<Row>` per page
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pages: Vec<Vec<Row>>,
}

impl MemorySource {
    pub fn new(pages: Vec<Vec<Row>>) -> Self {
        Self { pages }
    }

    /// Append a page and return its 1-based number
    pub fn push_page(&mut self, rows: Vec<Row>) -> u32 {
        self.pages.push(rows);
        self.pages.len() as u32
    }
}

impl RowSource for MemorySource {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn rows(&self, page: u32) -> Result<Vec<Row>, SourceError> {
        page.checked_sub(1)
            .and_then(|idx| self.pages.get(idx as usize))
            .cloned()
            .ok_or(SourceError::MissingPage(page))
    }
}
