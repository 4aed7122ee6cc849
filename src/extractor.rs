//! Glyph-run extraction from PDF content streams using lopdf
//!
//! [`PdfSource`] walks each page's content stream, tracking the graphics and
//! text state needed to place every shown string, and groups the resulting
//! runs into rows by their rounded baseline.

use crate::source::{RowSource, SourceError};
use crate::types::{GlyphRun, Row};
use crate::LayoutError;
use log::{debug, warn};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::Path;

/// Leading used by `T*`, `'` and `"` when the stream never set one
const DEFAULT_LEADING_FACTOR: f32 = 1.2;

/// Estimated glyph width as a fraction of the font size
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// A [`RowSource`] over a loaded lopdf document
#[derive(Debug)]
pub struct PdfSource {
    doc: Document,
    pages: BTreeMap<u32, ObjectId>,
}

impl PdfSource {
    /// Load a PDF file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LayoutError> {
        let doc = Document::load(path)?;
        Self::open(doc, None)
    }

    /// Load a PDF from a memory buffer
    pub fn load_mem(buffer: &[u8]) -> Result<Self, LayoutError> {
        let doc = Document::load_mem(buffer)?;
        Self::open(doc, None)
    }

    /// Load an encrypted PDF file, decrypting it with `password`
    pub fn load_with_password<P: AsRef<Path>>(
        path: P,
        password: &str,
    ) -> Result<Self, LayoutError> {
        let doc = Document::load(path)?;
        Self::open(doc, Some(password))
    }

    /// Load an encrypted PDF from memory, decrypting it with `password`
    pub fn load_mem_with_password(buffer: &[u8], password: &str) -> Result<Self, LayoutError> {
        let doc = Document::load_mem(buffer)?;
        Self::open(doc, Some(password))
    }

    pub fn from_document(doc: Document) -> Result<Self, LayoutError> {
        Self::open(doc, None)
    }

    /// Wrap a loaded document, decrypting it first when needed.
    ///
    /// A password is ignored for documents that are not encrypted.
    pub fn open(mut doc: Document, password: Option<&str>) -> Result<Self, LayoutError> {
        if doc.is_encrypted() {
            let password = password.ok_or(LayoutError::PasswordRequired)?;
            doc.decrypt(password).map_err(|e| match e {
                lopdf::Error::Decryption(_) => LayoutError::WrongPassword,
                other => LayoutError::from(other),
            })?;
            debug!("decrypted PDF");
        }
        let pages = doc.get_pages();
        debug!("loaded PDF with {} pages", pages.len());
        Ok(Self { doc, pages })
    }

    fn page_id(&self, page: u32) -> Result<ObjectId, SourceError> {
        self.pages
            .get(&page)
            .copied()
            .ok_or(SourceError::MissingPage(page))
    }

    /// Glyph runs of a page in content-stream order
    pub fn page_runs(&self, page: u32) -> Result<Vec<GlyphRun>, SourceError> {
        let page_id = self.page_id(page)?;
        extract_page_runs(&self.doc, page_id)
    }

    /// Raw (decompressed) content stream bytes of a page
    pub fn page_content(&self, page: u32) -> Result<Vec<u8>, SourceError> {
        let page_id = self.page_id(page)?;
        Ok(self.doc.get_page_content(page_id)?)
    }
}

impl RowSource for PdfSource {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn rows(&self, page: u32) -> Result<Vec<Row>, SourceError> {
        Ok(group_into_rows(self.page_runs(page)?))
    }

    fn styled_runs(&self, page: u32) -> Result<Vec<GlyphRun>, SourceError> {
        self.page_runs(page)
    }

    fn content_stream(&self, page: u32) -> Result<Vec<u8>, SourceError> {
        self.page_content(page)
    }
}

/// Group runs by rounded y, top row first. Runs inside a row keep the order
/// they were given in.
pub fn group_into_rows(runs: Vec<GlyphRun>) -> Vec<Row> {
    let mut rows: BTreeMap<i64, Vec<GlyphRun>> = BTreeMap::new();
    for run in runs {
        rows.entry(run.y.round() as i64).or_default().push(run);
    }
    rows.into_iter()
        .rev()
        .map(|(anchor, runs)| Row::new(anchor, runs))
        .collect()
}

/// Multiply two 2D transformation matrices
/// Matrix format: [a, b, c, d, e, f] representing:
/// | a  b  0 |
/// | c  d  0 |
/// | e  f  1 |
fn multiply_matrices(m1: &Matrix, m2: &Matrix) -> Matrix {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

/// Text state carried across operators of one content stream
struct TextState<'a> {
    doc: &'a Document,
    fonts: BTreeMap<Vec<u8>, &'a Dictionary>,
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    font: String,
    font_size: f32,
    leading: Option<f32>,
    char_spacing: f32,
    word_spacing: f32,
    horiz_scale: f32,
    text_matrix: Matrix,
    line_matrix: Matrix,
    in_text_block: bool,
    runs: Vec<GlyphRun>,
}

impl<'a> TextState<'a> {
    fn new(doc: &'a Document, fonts: BTreeMap<Vec<u8>, &'a Dictionary>) -> Self {
        Self {
            doc,
            fonts,
            ctm: IDENTITY,
            ctm_stack: Vec::new(),
            font: String::new(),
            font_size: 12.0,
            leading: None,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horiz_scale: 1.0,
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            in_text_block: false,
            runs: Vec::new(),
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix[4] += tx;
        self.line_matrix[5] += ty;
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self
            .leading
            .unwrap_or(self.font_size * DEFAULT_LEADING_FACTOR);
        self.move_line(0.0, -leading);
    }

    /// Move the text position along the baseline by `dx` text-space units
    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Estimated horizontal displacement of `text` in text space.
    ///
    /// Glyph widths are not read from the font, every glyph counts as
    /// [`APPROX_CHAR_WIDTH_RATIO`] of the font size.
    fn text_advance(&self, text: &str) -> f32 {
        let glyph_width = self.font_size * APPROX_CHAR_WIDTH_RATIO;
        let width: f32 = text
            .chars()
            .map(|ch| {
                let spacing = if ch == ' ' {
                    self.char_spacing + self.word_spacing
                } else {
                    self.char_spacing
                };
                glyph_width + spacing
            })
            .sum();
        width * self.horiz_scale
    }

    /// Emit a run at the current text position, then advance past it
    fn show(&mut self, text: String) {
        if !self.in_text_block {
            return;
        }
        let advance = self.text_advance(&text);
        if !text.trim().is_empty() {
            let combined = multiply_matrices(&self.text_matrix, &self.ctm);
            self.runs.push(GlyphRun {
                text,
                x: combined[4],
                y: combined[5],
                font: self.font.clone(),
                font_size: effective_font_size(self.font_size, &self.text_matrix),
            });
        }
        self.advance_x(advance);
    }

    /// `TJ`: every string is its own run, numbers shift the position by
    /// thousandths of the font size (negative moves right)
    fn show_array(&mut self, elements: &[Object]) {
        for element in elements {
            if let Some(adjustment) = get_number(element) {
                if self.in_text_block {
                    self.advance_x(-adjustment / 1000.0 * self.font_size * self.horiz_scale);
                }
            } else if let Some(text) = self.decode(element) {
                self.show(text);
            }
        }
    }

    fn decode(&self, obj: &Object) -> Option<String> {
        decode_operand(obj, self.doc, &self.fonts, &self.font)
    }

    fn apply(&mut self, operator: &str, operands: &[Object]) {
        match operator {
            // Save graphics state
            "q" => self.ctm_stack.push(self.ctm),
            // Restore graphics state
            "Q" => {
                if let Some(saved) = self.ctm_stack.pop() {
                    self.ctm = saved;
                }
            }
            // Concatenate matrix to CTM
            "cm" => {
                if let Some(m) = read_matrix(operands) {
                    self.ctm = multiply_matrices(&m, &self.ctm);
                }
            }
            // Begin text block
            "BT" => {
                self.in_text_block = true;
                self.text_matrix = IDENTITY;
                self.line_matrix = IDENTITY;
            }
            // End text block
            "ET" => self.in_text_block = false,
            // Set font and size
            "Tf" => {
                if operands.len() >= 2 {
                    if let Ok(name) = operands[0].as_name() {
                        self.font = String::from_utf8_lossy(name).to_string();
                    }
                    if let Some(size) = get_number(&operands[1]) {
                        self.font_size = size;
                    }
                }
            }
            // Set leading
            "TL" => {
                if let Some(leading) = operands.first().and_then(get_number) {
                    self.leading = Some(leading);
                }
            }
            // Character spacing
            "Tc" => {
                if let Some(spacing) = operands.first().and_then(get_number) {
                    self.char_spacing = spacing;
                }
            }
            // Word spacing
            "Tw" => {
                if let Some(spacing) = operands.first().and_then(get_number) {
                    self.word_spacing = spacing;
                }
            }
            // Horizontal scaling, in percent
            "Tz" => {
                if let Some(scale) = operands.first().and_then(get_number) {
                    self.horiz_scale = scale / 100.0;
                }
            }
            // Move text position (TD also sets leading)
            "Td" | "TD" => {
                if operands.len() >= 2 {
                    let tx = get_number(&operands[0]).unwrap_or(0.0);
                    let ty = get_number(&operands[1]).unwrap_or(0.0);
                    if operator == "TD" {
                        self.leading = Some(-ty);
                    }
                    self.move_line(tx, ty);
                }
            }
            // Set text matrix
            "Tm" => {
                if let Some(m) = read_matrix(operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            // Move to start of next line
            "T*" => self.next_line(),
            // Show text
            "Tj" => {
                if let Some(text) = operands.first().and_then(|o| self.decode(o)) {
                    self.show(text);
                }
            }
            // Show text with individual glyph positioning
            "TJ" => {
                if let Some(Ok(array)) = operands.first().map(|o| o.as_array()) {
                    self.show_array(array);
                }
            }
            // Next line, then show text
            "'" => {
                self.next_line();
                if let Some(text) = operands.first().and_then(|o| self.decode(o)) {
                    self.show(text);
                }
            }
            // Set word and character spacing, next line, then show text
            "\"" => {
                if operands.len() >= 3 {
                    if let Some(aw) = get_number(&operands[0]) {
                        self.word_spacing = aw;
                    }
                    if let Some(ac) = get_number(&operands[1]) {
                        self.char_spacing = ac;
                    }
                }
                self.next_line();
                if let Some(text) = operands.get(2).and_then(|o| self.decode(o)) {
                    self.show(text);
                }
            }
            _ => {}
        }
    }
}

/// Extract glyph runs from a single page
fn extract_page_runs(doc: &Document, page_id: ObjectId) -> Result<Vec<GlyphRun>, SourceError> {
    let fonts = doc.get_page_fonts(page_id).unwrap_or_default();

    let content_data = doc.get_page_content(page_id)?;
    let content =
        Content::decode(&content_data).map_err(|e| SourceError::Content(e.to_string()))?;

    let mut state = TextState::new(doc, fonts);
    for op in &content.operations {
        state.apply(op.operator.as_str(), &op.operands);
    }

    if state.in_text_block {
        warn!("page content ended inside a text object");
    }
    Ok(state.runs)
}

/// Helper to get f32 from Object
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

fn read_matrix(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = IDENTITY;
    for (i, operand) in operands.iter().take(6).enumerate() {
        if let Some(v) = get_number(operand) {
            m[i] = v;
        }
    }
    Some(m)
}

/// Font size scaled by the text matrix
fn effective_font_size(base_size: f32, text_matrix: &Matrix) -> f32 {
    let scale_x = (text_matrix[0].powi(2) + text_matrix[1].powi(2)).sqrt();
    let scale_y = (text_matrix[2].powi(2) + text_matrix[3].powi(2)).sqrt();
    base_size * scale_x.max(scale_y)
}

/// Decode a string operand through the current font's encoding
fn decode_operand(
    obj: &Object,
    doc: &Document,
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
    current_font: &str,
) -> Option<String> {
    let Object::String(bytes, _) = obj else {
        return None;
    };

    if let Some(font_dict) = fonts.get(current_font.as_bytes()) {
        if let Ok(encoding) = font_dict.get_font_encoding(doc) {
            if let Ok(text) = Document::decode_text(&encoding, bytes) {
                return Some(text);
            }
        }
    }

    Some(decode_fallback(bytes))
}

/// UTF-16BE when a byte order mark is present, Latin-1 otherwise
pub(crate) fn decode_fallback(bytes: &[u8]) -> String {
    if let [0xFE, 0xFF, rest @ ..] = bytes {
        let utf16: Vec<u16> = rest
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn run(text: &str, x: f32, y: f32) -> GlyphRun {
        GlyphRun::new(text, x, y, "F1", 12.0)
    }

    fn int(v: i64) -> Object {
        Object::Integer(v)
    }

    #[test]
    fn test_group_into_rows_top_first() {
        let rows = group_into_rows(vec![
            run("low", 10.0, 100.2),
            run("high", 10.0, 700.0),
            run("high-right", 200.0, 699.8),
            run("low-left", 0.0, 99.9),
        ]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].vertical_anchor, 700);
        assert_eq!(rows[1].vertical_anchor, 100);
        let low: Vec<&str> = rows[1].runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(low, vec!["low", "low-left"]);
    }

    #[test]
    fn test_group_into_rows_empty() {
        assert!(group_into_rows(Vec::new()).is_empty());
    }

    #[test]
    fn test_multiply_identity() {
        let m = [2.0, 0.0, 0.0, 2.0, 10.0, 20.0];
        assert_eq!(multiply_matrices(&m, &IDENTITY), m);
        assert_eq!(multiply_matrices(&IDENTITY, &m), m);
    }

    #[test]
    fn test_effective_font_size_scales() {
        assert_eq!(effective_font_size(10.0, &IDENTITY), 10.0);
        assert_eq!(effective_font_size(1.0, &[12.0, 0.0, 0.0, 12.0, 0.0, 0.0]), 12.0);
    }

    #[test]
    fn test_decode_fallback() {
        assert_eq!(decode_fallback(b"caf\xe9"), "café");
        assert_eq!(decode_fallback(&[0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69]), "Hi");
    }

    #[test]
    fn test_text_state_tracks_positions() {
        let doc = Document::with_version("1.5");
        let mut state = TextState::new(&doc, BTreeMap::new());
        let s = |t: &str| Object::string_literal(t);

        state.apply("BT", &[]);
        state.apply("Tf", &[Object::Name(b"F1".to_vec()), int(10)]);
        state.apply("Td", &[int(72), int(700)]);
        state.apply("Tj", &[s("Hello")]);
        state.apply("TL", &[int(14)]);
        state.apply("T*", &[]);
        state.apply("TJ", &[Object::Array(vec![s("Wor"), int(-20), s("ld")])]);
        state.apply("'", &[s("   ")]);
        state.apply("ET", &[]);
        state.apply("Tj", &[s("outside")]);

        let texts: Vec<&str> = state.runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello", "Wor", "ld"]);
        assert_eq!((state.runs[0].x, state.runs[0].y), (72.0, 700.0));
        assert_eq!((state.runs[1].x, state.runs[1].y), (72.0, 686.0));
        // "Wor" advances 3 * 5.0, the -20 adjustment adds 0.2
        assert!((state.runs[2].x - 87.2).abs() < 1e-4);
        assert_eq!(state.runs[2].y, 686.0);
        assert_eq!(state.runs[0].font, "F1");
        assert_eq!(state.runs[0].font_size, 10.0);
    }

    #[test]
    fn test_consecutive_shows_advance() {
        let doc = Document::with_version("1.5");
        let mut state = TextState::new(&doc, BTreeMap::new());

        state.apply("BT", &[]);
        state.apply("Tf", &[Object::Name(b"F1".to_vec()), int(12)]);
        state.apply("Td", &[int(72), int(700)]);
        state.apply("Tj", &[Object::string_literal("Hello")]);
        state.apply("Tj", &[Object::string_literal(" ")]);
        state.apply("Tj", &[Object::string_literal("World")]);
        state.apply("ET", &[]);

        let xs: Vec<f32> = state.runs.iter().map(|r| r.x).collect();
        // 6.0 per glyph at size 12; the blank string is not emitted but
        // still moves the position.
        assert_eq!(xs, vec![72.0, 108.0]);
    }

    #[test]
    fn test_spacing_operators_widen_advance() {
        let doc = Document::with_version("1.5");
        let mut state = TextState::new(&doc, BTreeMap::new());

        state.apply("BT", &[]);
        state.apply("Tf", &[Object::Name(b"F1".to_vec()), int(10)]);
        state.apply("Tc", &[int(1)]);
        state.apply("Tw", &[int(4)]);
        state.apply("Tz", &[int(200)]);
        state.apply("Tj", &[Object::string_literal("a b")]);
        state.apply("Tj", &[Object::string_literal("c")]);
        state.apply("ET", &[]);

        // (3 * (5 + 1) + 4) * 2.0
        assert_eq!(state.runs[1].x, 44.0);
    }

    #[test]
    fn test_tj_array_positive_adjustment_moves_left() {
        let doc = Document::with_version("1.5");
        let mut state = TextState::new(&doc, BTreeMap::new());
        let s = |t: &str| Object::string_literal(t);

        state.apply("BT", &[]);
        state.apply("Tf", &[Object::Name(b"F1".to_vec()), int(10)]);
        state.apply("TJ", &[Object::Array(vec![s("AV"), int(500), s("A")])]);
        state.apply("ET", &[]);

        // "AV" advances 10.0, then 500/1000 * 10 moves back 5.0
        assert_eq!(state.runs[1].x, 5.0);
    }

    #[test]
    fn test_show_outside_text_block_does_not_advance() {
        let doc = Document::with_version("1.5");
        let mut state = TextState::new(&doc, BTreeMap::new());

        state.apply("Tj", &[Object::string_literal("stray")]);
        state.apply("BT", &[]);
        state.apply("Tj", &[Object::string_literal("kept")]);
        state.apply("ET", &[]);

        assert_eq!(state.runs.len(), 1);
        assert_eq!(state.runs[0].x, 0.0);
    }

    #[test]
    fn test_encrypted_document_needs_password() {
        let mut doc = Document::with_version("1.5");
        let encrypt_id = doc.add_object(lopdf::dictionary! {
            "Filter" => "Standard",
        });
        doc.trailer.set("Encrypt", encrypt_id);
        assert!(doc.is_encrypted());

        assert!(matches!(
            PdfSource::open(doc, None),
            Err(LayoutError::PasswordRequired)
        ));
    }

    #[test]
    fn test_password_ignored_for_plain_document() {
        let doc = Document::with_version("1.5");
        let source = PdfSource::open(doc, Some("secret")).unwrap();
        assert_eq!(source.page_count(), 0);
        assert!(matches!(
            source.page_content(1),
            Err(SourceError::MissingPage(1))
        ));
    }

    #[test]
    fn test_text_state_applies_ctm() {
        let doc = Document::with_version("1.5");
        let mut state = TextState::new(&doc, BTreeMap::new());

        state.apply("q", &[]);
        state.apply("cm", &[int(1), int(0), int(0), int(1), int(50), int(100)]);
        state.apply("BT", &[]);
        state.apply("Td", &[int(10), int(20)]);
        state.apply("Tj", &[Object::string_literal("moved")]);
        state.apply("ET", &[]);
        state.apply("Q", &[]);
        state.apply("BT", &[]);
        state.apply("Tj", &[Object::string_literal("origin")]);
        state.apply("ET", &[]);

        assert_eq!((state.runs[0].x, state.runs[0].y), (60.0, 120.0));
        assert_eq!((state.runs[1].x, state.runs[1].y), (0.0, 0.0));
    }
}
