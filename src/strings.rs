//! String literals carried by a PDF, without laying anything out
//!
//! Two scans, both regex based:
//! - [`extract_string_literals`] walks the raw file bytes for literal `(...)`
//!   and hex `<...>` strings. Compressed streams are not inflated, so this
//!   only sees what is stored in the clear.
//! - [`content_string_literals`] walks a decoded content stream and keeps
//!   only strings passed to text-showing operators. A `TJ` array yields one
//!   string with its kerning numbers dropped.
//!
//! Results are cleaned (escapes resolved, control characters removed,
//! trimmed), strings shorter than two characters are dropped, and duplicates
//! are removed keeping the first occurrence.

use crate::extractor::decode_fallback;
use once_cell::sync::Lazy;
use regex::bytes::Regex as BytesRegex;
use regex::Regex;
use std::collections::HashSet;

/// Literal string with balanced escapes: `(a\)b)` captures `a\)b`
static LITERAL_RE: Lazy<BytesRegex> =
    Lazy::new(|| BytesRegex::new(r"(?-u)\(((?:\\.|[^\\)])*)\)").unwrap());

static HEX_RE: Lazy<BytesRegex> =
    Lazy::new(|| BytesRegex::new(r"(?-u)<([0-9A-Fa-f\s]+)>").unwrap());

/// `(..) Tj`, `(..) '`, `(..) "` or `[..] TJ`
static SHOW_TEXT_RE: Lazy<BytesRegex> = Lazy::new(|| {
    BytesRegex::new(r#"(?-u)\(((?:\\.|[^\\)])*)\)\s*(?:Tj|'|")|\[((?:\\.|[^\\\]])*)\]\s*TJ"#)
        .unwrap()
});

static CONTROL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\x00-\x1F\x7F]").unwrap());

/// Strings shorter than this are treated as artifacts
const MIN_LITERAL_CHARS: usize = 2;

/// Every literal and hex string in the raw bytes of a PDF file
///
/// Literal strings come first, then hex strings, each in file order.
pub fn extract_string_literals(pdf_bytes: &[u8]) -> Vec<String> {
    let literals = LITERAL_RE
        .captures_iter(pdf_bytes)
        .map(|caps| decode_fallback(&caps[1]));
    let hex = HEX_RE
        .captures_iter(pdf_bytes)
        .map(|caps| decode_fallback(&decode_hex(&caps[1])));
    clean_literals(literals.chain(hex))
}

/// Strings shown by `Tj`, `TJ`, `'` and `"` in a decoded content stream
pub fn content_string_literals(content: &[u8]) -> Vec<String> {
    let shown = SHOW_TEXT_RE.captures_iter(content).map(|caps| {
        if let Some(single) = caps.get(1) {
            return decode_fallback(single.as_bytes());
        }
        let array = caps.get(2).map_or(&[][..], |m| m.as_bytes());
        let joined: Vec<u8> = LITERAL_RE
            .captures_iter(array)
            .flat_map(|part| part[1].to_vec())
            .collect();
        decode_fallback(&joined)
    });
    clean_literals(shown)
}

/// Clean, filter and deduplicate raw literals, keeping first occurrences
pub fn clean_literals<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|s| clean_literal(&s))
        .filter(|s| s.chars().count() >= MIN_LITERAL_CHARS)
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

fn clean_literal(raw: &str) -> String {
    let unescaped = raw
        .replace("\\(", "(")
        .replace("\\)", ")")
        .replace("\\n", " ")
        .replace("\\r", " ")
        .replace("\\t", " ")
        .replace("\\\\", "\\");
    CONTROL_RE.replace_all(&unescaped, "").trim().to_string()
}

/// Hex digits to bytes; whitespace is skipped and an odd final digit is
/// padded with 0
fn decode_hex(digits: &[u8]) -> Vec<u8> {
    let nibbles: Vec<u8> = digits
        .iter()
        .filter_map(|&b| (b as char).to_digit(16))
        .map(|d| d as u8)
        .collect();
    nibbles
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect()
}
