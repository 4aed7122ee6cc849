//! Page and document text extraction
//!
//! Each [`LayoutMode`] maps to one strategy:
//! - `Simple`: rows joined with [`Conservative`]
//! - `Raw`: rows joined with [`StreamOrder`]
//! - `Physical`: page-wide runs assembled into lines and rendered on the grid
//!
//! Multi-page operations are fail-fast: the first failing page aborts the
//! whole call and no partial text is returned.

use crate::config::ExtractConfig;
use crate::document::Document;
use crate::grid::physical_layout;
use crate::joiner::{Conservative, StreamOrder, WordJoiner};
use crate::source::{RowSource, SourceError};
use crate::types::LayoutMode;
use crate::{LayoutError, Result};
use log::debug;
use rayon::prelude::*;

/// Extract the text of one page (1-based)
pub fn extract_page(doc: &Document, page: u32, config: &ExtractConfig) -> Result<String> {
    config.validate()?;
    let source = doc.source()?;
    doc.check_page(page)?;
    render_page(source, page, doc.page_count(), config)
}

/// Extract every page, one string per page
pub fn extract_pages(doc: &Document, config: &ExtractConfig) -> Result<Vec<String>> {
    let pages: Vec<u32> = (1..=doc.page_count()).collect();
    extract_each(doc, &pages, config)
}

/// Extract every page and join them with the configured separator
pub fn extract_document(doc: &Document, config: &ExtractConfig) -> Result<String> {
    Ok(extract_pages(doc, config)?.join(&config.page_separator))
}

/// Extract the given pages, in the given order, joined with the separator
pub fn extract_selected(doc: &Document, pages: &[u32], config: &ExtractConfig) -> Result<String> {
    Ok(extract_each(doc, pages, config)?.join(&config.page_separator))
}

/// Extract every page on the rayon thread pool
///
/// Results come back in page order. When several pages fail, the error of the
/// lowest page is returned.
pub fn par_extract_pages(doc: &Document, config: &ExtractConfig) -> Result<Vec<String>> {
    let pages: Vec<u32> = (1..=doc.page_count()).collect();
    par_extract_selected(doc, &pages, config)
}

/// Parallel form of [`extract_selected`], one string per requested page
pub fn par_extract_selected(
    doc: &Document,
    pages: &[u32],
    config: &ExtractConfig,
) -> Result<Vec<String>> {
    config.validate()?;
    let source = doc.source()?;
    for &page in pages {
        doc.check_page(page)?;
    }

    let page_count = doc.page_count();
    let results: Vec<Result<String>> = pages
        .par_iter()
        .map(|&page| render_page(source, page, page_count, config))
        .collect();
    results.into_iter().collect()
}

fn extract_each(doc: &Document, pages: &[u32], config: &ExtractConfig) -> Result<Vec<String>> {
    config.validate()?;
    let source = doc.source()?;

    let mut texts = Vec::with_capacity(pages.len());
    for &page in pages {
        doc.check_page(page)?;
        texts.push(render_page(source, page, doc.page_count(), config)?);
    }
    Ok(texts)
}

fn render_page(
    source: &(dyn RowSource + Send + Sync),
    page: u32,
    page_count: u32,
    config: &ExtractConfig,
) -> Result<String> {
    let wrap = |e: SourceError| match e {
        SourceError::MissingPage(p) => LayoutError::InvalidPage {
            page: p,
            page_count,
        },
        other => LayoutError::RowExtractionFailed {
            page,
            source: other,
        },
    };

    let text = match config.layout {
        LayoutMode::Simple => {
            let rows = source.rows(page).map_err(wrap)?;
            debug!("page {}: {} rows, simple layout", page, rows.len());
            Conservative.join_rows(&rows)
        }
        LayoutMode::Raw => {
            let rows = source.rows(page).map_err(wrap)?;
            debug!("page {}: {} rows, raw layout", page, rows.len());
            StreamOrder.join_rows(&rows)
        }
        LayoutMode::Physical => {
            let runs = source.styled_runs(page).map_err(wrap)?;
            debug!("page {}: {} runs, physical layout", page, runs.len());
            physical_layout(runs, config.page_width)
        }
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use crate::types::{GlyphRun, Row};

    fn one_page(text: &str) -> Vec<Row> {
        vec![Row::new(
            700,
            vec![GlyphRun::new(text, 72.0, 700.0, "F1", 12.0)],
        )]
    }

    fn three_pages() -> Document {
        Document::from_source(MemorySource::new(vec![
            one_page("one"),
            one_page("two"),
            one_page("three"),
        ]))
    }

    #[test]
    fn test_extract_document_joins_pages() {
        let doc = three_pages();
        let text = extract_document(&doc, &ExtractConfig::default()).unwrap();
        assert_eq!(text, "one\n\ntwo\n\nthree");
    }

    #[test]
    fn test_custom_separator() {
        let doc = three_pages();
        let config = ExtractConfig {
            page_separator: "\x0c".to_string(),
            ..ExtractConfig::default()
        };
        assert_eq!(extract_document(&doc, &config).unwrap(), "one\x0ctwo\x0cthree");
    }

    #[test]
    fn test_extract_selected_order() {
        let doc = three_pages();
        let config = ExtractConfig::default();
        assert_eq!(extract_selected(&doc, &[3, 1], &config).unwrap(), "three\n\none");
        assert!(matches!(
            extract_selected(&doc, &[1, 4], &config),
            Err(LayoutError::InvalidPage { page: 4, page_count: 3 })
        ));
    }

    #[test]
    fn test_invalid_page() {
        let doc = three_pages();
        let config = ExtractConfig::default();
        assert!(matches!(
            extract_page(&doc, 0, &config),
            Err(LayoutError::InvalidPage { page: 0, .. })
        ));
        assert!(matches!(
            extract_page(&doc, 4, &config),
            Err(LayoutError::InvalidPage { page: 4, .. })
        ));
    }

    #[test]
    fn test_closed_document() {
        let mut doc = three_pages();
        doc.close();
        let config = ExtractConfig::default();
        assert!(matches!(
            extract_page(&doc, 1, &config),
            Err(LayoutError::DocumentClosed)
        ));
        assert!(matches!(
            extract_document(&doc, &config),
            Err(LayoutError::DocumentClosed)
        ));
        assert!(matches!(
            par_extract_pages(&doc, &config),
            Err(LayoutError::DocumentClosed)
        ));
        // Closed wins over an invalid page number.
        assert!(matches!(
            extract_page(&doc, 99, &config),
            Err(LayoutError::DocumentClosed)
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let doc = three_pages();
        let config = ExtractConfig {
            page_width: f32::NAN,
            ..ExtractConfig::with_layout(LayoutMode::Physical)
        };
        assert!(matches!(
            extract_page(&doc, 1, &config),
            Err(LayoutError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_par_extract_matches_sequential() {
        let doc = three_pages();
        for layout in [LayoutMode::Simple, LayoutMode::Raw, LayoutMode::Physical] {
            let config = ExtractConfig::with_layout(layout);
            assert_eq!(
                par_extract_pages(&doc, &config).unwrap(),
                extract_pages(&doc, &config).unwrap()
            );
        }
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::from_source(MemorySource::default());
        assert_eq!(extract_document(&doc, &ExtractConfig::default()).unwrap(), "");
    }
}
