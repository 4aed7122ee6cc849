//! Physical layout on a fixed character grid
//!
//! A monospaced approximation of the page: each line becomes an 80-column
//! buffer and every run is written at the column its x maps to. There are no
//! glyph metrics involved, only `page_width / 80` points per column.

use crate::lines::assemble_lines;
use crate::types::{GlyphRun, Line};

/// Columns per rendered line
pub const GRID_COLUMNS: usize = 80;

/// Page width used when none is given (US Letter, in points)
pub const DEFAULT_PAGE_WIDTH: f32 = 612.0;

/// Renders lines onto a fixed-width character grid
#[derive(Debug, Clone, Copy)]
pub struct GridRenderer {
    char_width: f32,
}

impl Default for GridRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_WIDTH)
    }
}

impl GridRenderer {
    /// Non-positive or non-finite widths fall back to [`DEFAULT_PAGE_WIDTH`].
    pub fn new(page_width: f32) -> Self {
        let page_width = if page_width.is_finite() && page_width > 0.0 {
            page_width
        } else {
            DEFAULT_PAGE_WIDTH
        };
        Self {
            char_width: page_width / GRID_COLUMNS as f32,
        }
    }

    pub fn char_width(&self) -> f32 {
        self.char_width
    }

    /// Grid column for an x position, clamped to the grid
    pub fn column_for(&self, x: f32) -> usize {
        let col = (x / self.char_width).floor();
        if col.is_nan() || col < 0.0 {
            0
        } else {
            (col as usize).min(GRID_COLUMNS - 1)
        }
    }

    /// Render one line. Runs are written in x order, so later runs
    /// overwrite earlier ones; characters past the last column are dropped.
    pub fn render_line(&self, line: &Line) -> String {
        let mut cells = [' '; GRID_COLUMNS];

        for run in &line.runs {
            let start = self.column_for(run.x);
            for (cell, ch) in cells[start..].iter_mut().zip(run.text.chars()) {
                *cell = ch;
            }
        }

        let rendered: String = cells.iter().collect();
        rendered.trim_end_matches(' ').to_string()
    }

    /// Render all lines joined by `\n`. No lines gives "".
    pub fn render(&self, lines: &[Line]) -> String {
        lines
            .iter()
            .map(|line| self.render_line(line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Assemble a page's runs into lines and render them on the grid
pub fn physical_layout(runs: Vec<GlyphRun>, page_width: f32) -> String {
    if runs.is_empty() {
        return String::new();
    }
    let lines = assemble_lines(runs);
    GridRenderer::new(page_width).render(&lines)
}
