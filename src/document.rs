//! An open document: a row source plus its open/closed lifecycle

use crate::extractor::PdfSource;
use crate::source::RowSource;
use crate::{LayoutError, Result};
use log::debug;
use std::path::{Path, PathBuf};

type BoxedSource = Box<dyn RowSource + Send + Sync>;

/// A document whose pages can be extracted until it is closed
pub struct Document {
    source: Option<BoxedSource>,
    page_count: u32,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("page_count", &self.page_count)
            .field("path", &self.path)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Document {
    /// Open a PDF file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = PdfSource::load(&path)?;
        let mut doc = Self::from_source(source);
        doc.path = Some(path.as_ref().to_path_buf());
        Ok(doc)
    }

    /// Open a PDF from a memory buffer
    pub fn load_mem(buffer: &[u8]) -> Result<Self> {
        Ok(Self::from_source(PdfSource::load_mem(buffer)?))
    }

    /// Open an encrypted PDF file with its password
    pub fn load_with_password<P: AsRef<Path>>(path: P, password: &str) -> Result<Self> {
        let source = PdfSource::load_with_password(&path, password)?;
        let mut doc = Self::from_source(source);
        doc.path = Some(path.as_ref().to_path_buf());
        Ok(doc)
    }

    /// Open an encrypted PDF held in memory with its password
    pub fn load_mem_with_password(buffer: &[u8], password: &str) -> Result<Self> {
        Ok(Self::from_source(PdfSource::load_mem_with_password(
            buffer, password,
        )?))
    }

    /// Wrap any row source, e.g. one backed by another parser
    pub fn from_source<S>(source: S) -> Self
    where
        S: RowSource + Send + Sync + 'static,
    {
        let page_count = source.page_count();
        Self {
            source: Some(Box::new(source)),
            page_count,
            path: None,
        }
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// File path, when the document was loaded from disk
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.source.is_none()
    }

    /// Release the underlying source. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.source.take().is_some() {
            debug!("document closed");
        }
    }

    /// The row source, or [`LayoutError::DocumentClosed`] after [`close`](Self::close)
    pub fn source(&self) -> Result<&(dyn RowSource + Send + Sync)> {
        self.source.as_deref().ok_or(LayoutError::DocumentClosed)
    }

    /// Raw content stream bytes of a page (1-based)
    pub fn content_stream(&self, page: u32) -> Result<Vec<u8>> {
        let source = self.source()?;
        self.check_page(page)?;
        source
            .content_stream(page)
            .map_err(|source| LayoutError::ContentStreamFailed { page, source })
    }

    /// Check that `page` is a valid 1-based page number
    pub fn check_page(&self, page: u32) -> Result<()> {
        if page == 0 || page > self.page_count {
            return Err(LayoutError::InvalidPage {
                page,
                page_count: self.page_count,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use crate::types::Row;

    #[test]
    fn test_close_is_idempotent() {
        let mut doc = Document::from_source(MemorySource::new(vec![vec![Row::default()]]));
        assert!(!doc.is_closed());
        assert!(doc.source().is_ok());
        doc.close();
        doc.close();
        assert!(doc.is_closed());
        assert!(matches!(doc.source(), Err(LayoutError::DocumentClosed)));
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn test_check_page_bounds() {
        let doc = Document::from_source(MemorySource::new(vec![Vec::new(), Vec::new()]));
        assert!(doc.check_page(1).is_ok());
        assert!(doc.check_page(2).is_ok());
        assert!(matches!(
            doc.check_page(0),
            Err(LayoutError::InvalidPage { page: 0, page_count: 2 })
        ));
        assert!(matches!(
            doc.check_page(3),
            Err(LayoutError::InvalidPage { page: 3, .. })
        ));
    }

    #[test]
    fn test_content_stream_checks_state() {
        let mut doc = Document::from_source(MemorySource::new(vec![Vec::new()]));
        assert!(matches!(
            doc.content_stream(2),
            Err(LayoutError::InvalidPage { page: 2, .. })
        ));
        let err = doc.content_stream(1).unwrap_err();
        assert_eq!(err.page(), Some(1));
        doc.close();
        assert!(matches!(
            doc.content_stream(1),
            Err(LayoutError::DocumentClosed)
        ));
    }

    #[test]
    fn test_load_mem_rejects_garbage() {
        assert!(Document::load_mem(b"not a pdf").is_err());
    }
}
