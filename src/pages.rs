//! Page selection syntax: `"1-5"`, `"1,3,5"`, `"2, 4-6"`

use crate::{LayoutError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static PAGE_PART_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)(?:\s*-\s*(\d+))?$").unwrap());

/// Parse a page selection into 1-based page numbers, in the order given
///
/// An empty selection means every page.
pub fn parse_page_range(selection: &str, total_pages: u32) -> Result<Vec<u32>> {
    if selection.trim().is_empty() {
        return Ok((1..=total_pages).collect());
    }

    let mut pages = Vec::new();
    for part in selection.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let caps = PAGE_PART_RE.captures(part).ok_or_else(|| {
            LayoutError::InvalidPageRange(format!("malformed part {:?}", part))
        })?;

        let start = parse_page(&caps[1], part)?;
        let end = match caps.get(2) {
            Some(m) => parse_page(m.as_str(), part)?,
            None => start,
        };

        for page in [start, end] {
            if page < 1 || page > total_pages {
                return Err(LayoutError::InvalidPageRange(format!(
                    "page {} out of bounds in {:?} (document has {} pages)",
                    page, part, total_pages
                )));
            }
        }
        if start > end {
            return Err(LayoutError::InvalidPageRange(format!(
                "start > end in {:?}",
                part
            )));
        }
        pages.extend(start..=end);
    }

    Ok(pages)
}

fn parse_page(digits: &str, part: &str) -> Result<u32> {
    digits
        .parse()
        .map_err(|_| LayoutError::InvalidPageRange(format!("bad page number in {:?}", part)))
}
