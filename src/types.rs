//! Positioned text data shared by the layout strategies

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::LayoutError;

/// A positioned fragment of decoded text
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    /// The text content (non-empty)
    pub text: String,
    /// X position on page
    pub x: f32,
    /// Y position on page (PDF coordinates, origin at bottom-left)
    pub y: f32,
    /// Font name
    pub font: String,
    /// Font size
    pub font_size: f32,
}

impl GlyphRun {
    pub fn new(
        text: impl Into<String>,
        x: f32,
        y: f32,
        font: impl Into<String>,
        font_size: f32,
    ) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            font: font.into(),
            font_size,
        }
    }

    /// Number of characters in the run
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Left-to-right order. Equal x falls back to text, then y, so the
/// order never depends on how the runs arrived.
pub(crate) fn cmp_by_x(a: &GlyphRun, b: &GlyphRun) -> Ordering {
    a.x.total_cmp(&b.x)
        .then_with(|| a.text.cmp(&b.text))
        .then_with(|| a.y.total_cmp(&b.y))
}

/// Top-to-bottom, then left-to-right order for a whole page.
pub(crate) fn cmp_reading_order(a: &GlyphRun, b: &GlyphRun) -> Ordering {
    b.y.total_cmp(&a.y)
        .then_with(|| a.x.total_cmp(&b.x))
        .then_with(|| a.text.cmp(&b.text))
}

/// A row of glyph runs as delivered by a [`RowSource`](crate::RowSource)
///
/// Runs inside a row are in source order, not sorted by x.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub vertical_anchor: i64,
    pub runs: Vec<GlyphRun>,
}

impl Row {
    pub fn new(vertical_anchor: i64, runs: Vec<GlyphRun>) -> Self {
        Self {
            vertical_anchor,
            runs,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Copy of the runs sorted left to right
    pub fn sorted_runs(&self) -> Vec<GlyphRun> {
        let mut runs = self.runs.clone();
        runs.sort_by(cmp_by_x);
        runs
    }
}

/// A visual line built by clustering page-wide runs on y
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Y of the first run assigned to the line
    pub anchor_y: f32,
    pub runs: Vec<GlyphRun>,
}

impl Line {
    /// Concatenated run texts in stored order, without separators
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// How rows of glyph runs are turned into text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LayoutMode {
    /// Rows joined with the conservative geometric word-join policy
    #[default]
    Simple,
    /// Rows joined with the stream-order font-size policy
    Raw,
    /// Runs projected onto a fixed-width character grid
    Physical,
}

impl LayoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutMode::Simple => "simple",
            LayoutMode::Raw => "raw",
            LayoutMode::Physical => "physical",
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutMode {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(LayoutMode::Simple),
            "raw" => Ok(LayoutMode::Raw),
            "physical" => Ok(LayoutMode::Physical),
            other => Err(LayoutError::InvalidConfig(format!(
                "unknown layout mode '{}' (expected simple, raw or physical)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_mode_from_str() {
        assert_eq!("simple".parse::<LayoutMode>().unwrap(), LayoutMode::Simple);
        assert_eq!("RAW".parse::<LayoutMode>().unwrap(), LayoutMode::Raw);
        assert_eq!(" Physical ".parse::<LayoutMode>().unwrap(), LayoutMode::Physical);
        assert!("columns".parse::<LayoutMode>().is_err());
    }

    #[test]
    fn test_layout_mode_display_parses_back() {
        for mode in [LayoutMode::Simple, LayoutMode::Raw, LayoutMode::Physical] {
            assert_eq!(mode.to_string().parse::<LayoutMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_sorted_runs_breaks_ties_by_text() {
        let row = Row::new(
            700,
            vec![
                GlyphRun::new("b", 10.0, 700.0, "F1", 12.0),
                GlyphRun::new("a", 10.0, 700.0, "F1", 12.0),
                GlyphRun::new("c", 0.0, 700.0, "F1", 12.0),
            ],
        );
        let texts: Vec<String> = row.sorted_runs().into_iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_char_count_counts_chars_not_bytes() {
        let run = GlyphRun::new("héllo", 0.0, 0.0, "F1", 12.0);
        assert_eq!(run.char_count(), 5);
    }
}
