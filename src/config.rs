//! Extraction configuration

use crate::grid::DEFAULT_PAGE_WIDTH;
use crate::types::LayoutMode;
use crate::{LayoutError, Result};

/// Separator placed between pages of a multi-page extraction
pub const DEFAULT_PAGE_SEPARATOR: &str = "\n\n";

/// Options for a text extraction
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractConfig {
    /// Layout strategy (default: [`LayoutMode::Simple`])
    pub layout: LayoutMode,
    /// Placed between pages (default: two newlines)
    pub page_separator: String,
    /// Page width in points for [`LayoutMode::Physical`] (default: 612).
    /// Non-positive widths mean the default.
    pub page_width: f32,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            layout: LayoutMode::Simple,
            page_separator: DEFAULT_PAGE_SEPARATOR.to_string(),
            page_width: DEFAULT_PAGE_WIDTH,
        }
    }
}

impl ExtractConfig {
    /// Build a validated configuration
    pub fn new(
        layout: LayoutMode,
        page_separator: impl Into<String>,
        page_width: f32,
    ) -> Result<Self> {
        let config = Self {
            layout,
            page_separator: page_separator.into(),
            page_width,
        };
        config.validate()?;
        Ok(config)
    }

    /// Default options with the given layout
    pub fn with_layout(layout: LayoutMode) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.page_width.is_finite() {
            return Err(LayoutError::InvalidConfig(format!(
                "page width must be a finite number, got {}",
                self.page_width
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExtractConfig::default();
        assert_eq!(config.layout, LayoutMode::Simple);
        assert_eq!(config.page_separator, "\n\n");
        assert_eq!(config.page_width, 612.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_new_validates_width() {
        assert!(ExtractConfig::new(LayoutMode::Physical, "\n", 800.0).is_ok());
        assert!(ExtractConfig::new(LayoutMode::Physical, "\n", 0.0).is_ok());
        assert!(matches!(
            ExtractConfig::new(LayoutMode::Physical, "\n", f32::NAN),
            Err(LayoutError::InvalidConfig(_))
        ));
        assert!(ExtractConfig::new(LayoutMode::Raw, "", f32::INFINITY).is_err());
    }

    #[test]
    fn test_with_layout_keeps_defaults() {
        let config = ExtractConfig::with_layout(LayoutMode::Raw);
        assert_eq!(config.layout, LayoutMode::Raw);
        assert_eq!(config.page_separator, DEFAULT_PAGE_SEPARATOR);
    }
}
