//! Page-wide line assembly for the physical layout
//!
//! Works on the flat set of runs of a page, ignoring how the row source
//! grouped them.

use crate::types::{cmp_by_x, cmp_reading_order, GlyphRun, Line};

/// Maximum vertical distance from a line's anchor for a run to join it
pub const Y_TOLERANCE: f32 = 2.0;

/// Cluster runs into visual lines, top of the page first
///
/// Runs are visited in reading order (y descending, x ascending). A run joins
/// the current line when its y is within [`Y_TOLERANCE`] of the line anchor,
/// which stays fixed at the y of the line's first run. Runs of each line end
/// up sorted by x.
pub fn assemble_lines(mut runs: Vec<GlyphRun>) -> Vec<Line> {
    runs.sort_by(cmp_reading_order);

    let mut lines: Vec<Line> = Vec::new();
    for run in runs {
        let starts_line = lines
            .last()
            .map_or(true, |line| (line.anchor_y - run.y).abs() > Y_TOLERANCE);

        if starts_line {
            lines.push(Line {
                anchor_y: run.y,
                runs: vec![run],
            });
        } else if let Some(line) = lines.last_mut() {
            line.runs.push(run);
        }
    }

    for line in &mut lines {
        line.runs.sort_by(cmp_by_x);
    }

    lines
}
