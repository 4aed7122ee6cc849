//! Word joining within a row
//!
//! Glyph runs carry no word-boundary markers, so each adjacent pair is
//! classified as either a word break or kerning from the horizontal gap
//! between where the previous run would end and where the next one starts.
//! Two policies exist with different width estimators and thresholds:
//! - [`Conservative`]: per-row geometric estimate, half a character of slack
//! - [`StreamOrder`]: per-pair font-size estimate, 0.3 of a character of slack

use crate::types::{GlyphRun, Row};
use log::trace;

/// Font size assumed when a run reports none
pub const DEFAULT_FONT_SIZE: f32 = 12.0;

/// Outcome of comparing two x-adjacent runs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairDecision {
    /// Where the previous run would end if its characters were contiguous
    pub prev_end_x: f32,
    /// Distance from `prev_end_x` to the start of the current run
    pub gap: f32,
    /// Gap above which a space is inserted
    pub threshold: f32,
    pub insert_space: bool,
}

impl PairDecision {
    fn new(prev: &GlyphRun, curr: &GlyphRun, char_width: f32, slack: f32) -> Self {
        let prev_end_x = prev.x + prev.char_count() as f32 * char_width;
        let gap = curr.x - prev_end_x;
        let threshold = char_width * slack;
        Self {
            prev_end_x,
            gap,
            threshold,
            insert_space: gap > threshold,
        }
    }
}

/// A strategy that turns rows of glyph runs into lines of text
pub trait WordJoiner {
    /// Join one row into a single line. An empty row yields "".
    fn join_row(&self, row: &Row) -> String;

    /// Join every row, one line per row, separated by `\n`
    fn join_rows(&self, rows: &[Row]) -> String {
        rows.iter()
            .map(|row| self.join_row(row))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Row-local geometric policy used for [`LayoutMode::Simple`](crate::LayoutMode::Simple)
///
/// The tightest per-character advance seen between consecutive runs of a row
/// is taken as the character width. Contiguous pairs dominate that minimum,
/// while pairs split by a real word gap only inflate their own advance.
#[derive(Debug, Clone, Copy, Default)]
pub struct Conservative;

impl Conservative {
    const FALLBACK_WIDTH_FACTOR: f32 = 0.6;
    const SPACE_SLACK: f32 = 0.5;

    /// Smallest positive per-character advance across x-sorted `runs`,
    /// or `font_size * 0.6` of the first run when none exists
    pub fn min_char_width(runs: &[GlyphRun]) -> f32 {
        let min_advance = runs
            .windows(2)
            .filter_map(|pair| {
                let (prev, curr) = (&pair[0], &pair[1]);
                let len = prev.char_count();
                if len == 0 {
                    return None;
                }
                let advance = (curr.x - prev.x) / len as f32;
                (advance > 0.0).then_some(advance)
            })
            .reduce(f32::min);

        min_advance.unwrap_or_else(|| {
            let font_size = runs
                .first()
                .map(|r| r.font_size)
                .filter(|&s| s > 0.0)
                .unwrap_or(DEFAULT_FONT_SIZE);
            font_size * Self::FALLBACK_WIDTH_FACTOR
        })
    }

    pub fn decide(min_char_width: f32, prev: &GlyphRun, curr: &GlyphRun) -> PairDecision {
        PairDecision::new(prev, curr, min_char_width, Self::SPACE_SLACK)
    }
}

impl WordJoiner for Conservative {
    fn join_row(&self, row: &Row) -> String {
        let runs = row.sorted_runs();
        let min_char_width = Self::min_char_width(&runs);
        join_sorted(&runs, |prev, curr| {
            Self::decide(min_char_width, prev, curr)
        })
    }
}

/// Font-size policy used for [`LayoutMode::Raw`](crate::LayoutMode::Raw)
///
/// Each pair is judged on its own, with half the font size as character width.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamOrder;

impl StreamOrder {
    const WIDTH_FACTOR: f32 = 0.5;
    const SPACE_SLACK: f32 = 0.3;

    /// Average character width for a pair: prefers the previous run's size
    pub fn avg_char_width(prev: &GlyphRun, curr: &GlyphRun) -> f32 {
        let font_size = [prev.font_size, curr.font_size]
            .into_iter()
            .find(|&s| s > 0.0)
            .unwrap_or(DEFAULT_FONT_SIZE);
        font_size * Self::WIDTH_FACTOR
    }

    pub fn decide(prev: &GlyphRun, curr: &GlyphRun) -> PairDecision {
        PairDecision::new(prev, curr, Self::avg_char_width(prev, curr), Self::SPACE_SLACK)
    }
}

impl WordJoiner for StreamOrder {
    fn join_row(&self, row: &Row) -> String {
        let runs = row.sorted_runs();
        join_sorted(&runs, Self::decide)
    }
}

/// Concatenate x-sorted runs, inserting a single space where `decide` says so
fn join_sorted<F>(runs: &[GlyphRun], decide: F) -> String
where
    F: Fn(&GlyphRun, &GlyphRun) -> PairDecision,
{
    let Some(first) = runs.first() else {
        return String::new();
    };

    let mut out = String::with_capacity(runs.iter().map(|r| r.text.len() + 1).sum());
    out.push_str(&first.text);

    for pair in runs.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        let decision = decide(prev, curr);
        trace!(
            "'{}' -> '{}': gap {:.2} vs {:.2}, space={}",
            prev.text,
            curr.text,
            decision.gap,
            decision.threshold,
            decision.insert_space
        );
        if decision.insert_space {
            out.push(' ');
        }
        out.push_str(&curr.text);
    }

    out
}
