//! Content stream walking.
//!
//! Turns a page's content stream into positioned text spans and the
//! horizontal/vertical rules drawn on it. Both table strategies work from
//! this layout.

use super::backend::{get_number_from_value, ContentOp, PageId, PdfBackend, PdfValue};
use crate::error::Result;

/// Average glyph width as a fraction of font size, used when no metrics
/// are available.
const GLYPH_WIDTH_FACTOR: f32 = 0.5;

/// Rules thinner than this are treated as lines.
const RULE_THICKNESS: f32 = 2.0;

/// TJ adjustment (thousandths of an em) treated as a word space.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A text span with position information.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Estimated width of the text
    pub width: f32,
    /// Font size in points
    pub font_size: f32,
}

impl TextSpan {
    /// Create a span, estimating its width from the character count.
    pub fn new(text: impl Into<String>, x: f32, y: f32, font_size: f32) -> Self {
        let text = text.into();
        let width = text.chars().count() as f32 * font_size * GLYPH_WIDTH_FACTOR;
        Self {
            text,
            x,
            y,
            width,
            font_size,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// Orientation of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Horizontal,
    Vertical,
}

/// A straight rule drawn on the page, in page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub kind: RuleKind,
    /// Y for horizontal rules, X for vertical rules
    pub position: f32,
    /// Start of the covered span along the rule
    pub from: f32,
    /// End of the covered span along the rule
    pub to: f32,
}

impl Rule {
    /// Classify a segment; diagonal segments are not rules.
    pub fn from_segment(x1: f32, y1: f32, x2: f32, y2: f32) -> Option<Self> {
        if (y1 - y2).abs() <= RULE_THICKNESS {
            Some(Self {
                kind: RuleKind::Horizontal,
                position: (y1 + y2) / 2.0,
                from: x1.min(x2),
                to: x1.max(x2),
            })
        } else if (x1 - x2).abs() <= RULE_THICKNESS {
            Some(Self {
                kind: RuleKind::Vertical,
                position: (x1 + x2) / 2.0,
                from: y1.min(y2),
                to: y1.max(y2),
            })
        } else {
            None
        }
    }

    /// Edges of a rectangle; a thin rectangle is a single rule.
    pub fn from_rect(x: f32, y: f32, w: f32, h: f32) -> Vec<Self> {
        let (x1, x2) = (x.min(x + w), x.max(x + w));
        let (y1, y2) = (y.min(y + h), y.max(y + h));

        if y2 - y1 <= RULE_THICKNESS {
            return Self::from_segment(x1, (y1 + y2) / 2.0, x2, (y1 + y2) / 2.0)
                .into_iter()
                .collect();
        }
        if x2 - x1 <= RULE_THICKNESS {
            return Self::from_segment((x1 + x2) / 2.0, y1, (x1 + x2) / 2.0, y2)
                .into_iter()
                .collect();
        }

        [
            (x1, y1, x2, y1),
            (x1, y2, x2, y2),
            (x1, y1, x1, y2),
            (x2, y1, x2, y2),
        ]
        .into_iter()
        .filter_map(|(ax, ay, bx, by)| Self::from_segment(ax, ay, bx, by))
        .collect()
    }
}

/// Text and rules of one page.
#[derive(Debug, Clone, Default)]
pub struct PageLayout {
    pub spans: Vec<TextSpan>,
    pub rules: Vec<Rule>,
}

impl PageLayout {
    /// Rules of one orientation.
    pub fn rules(&self, kind: RuleKind) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(move |r| r.kind == kind)
    }
}

/// Affine transform `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }
}

impl Matrix {
    fn from_op(op: &ContentOp) -> Option<Self> {
        Some(Self {
            a: op.number(0)?,
            b: op.number(1)?,
            c: op.number(2)?,
            d: op.number(3)?,
            e: op.number(4)?,
            f: op.number(5)?,
        })
    }

    /// `self × other`: apply `self` first, then `other`.
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }

    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

/// Text state inside a BT/ET block.
#[derive(Debug, Clone, Copy, Default)]
struct TextState {
    matrix: Matrix,
    line_matrix: Matrix,
    leading: f32,
}

impl TextState {
    fn move_line(&mut self, tx: f32, ty: f32) {
        let shift = Matrix {
            e: tx,
            f: ty,
            ..Matrix::default()
        };
        self.line_matrix = shift.then(&self.line_matrix);
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        // Some producers never set TL; fall back to a 12pt leading.
        let leading = if self.leading == 0.0 { 12.0 } else { self.leading };
        self.move_line(0.0, -leading);
    }

    fn set(&mut self, m: Matrix) {
        self.matrix = m;
        self.line_matrix = m;
    }
}

/// Extract the layout of a 1-indexed page.
pub fn extract_page_layout<B: PdfBackend + ?Sized>(backend: &B, page_num: u32) -> Result<PageLayout> {
    let page_id = backend.page_id(page_num)?;
    let content = backend.page_content(page_id)?;
    let ops = backend.decode_content(&content)?;
    Ok(walk_operations(backend, page_id, &ops))
}

/// Interpret content stream operations.
pub fn walk_operations<B: PdfBackend + ?Sized>(
    backend: &B,
    page_id: PageId,
    ops: &[ContentOp],
) -> PageLayout {
    let mut layout = PageLayout::default();

    let mut ctm = Matrix::default();
    let mut ctm_stack: Vec<Matrix> = Vec::new();
    let mut text = TextState::default();
    let mut in_text_block = false;
    let mut font_name: Vec<u8> = Vec::new();
    let mut font_size: f32 = 12.0;

    // Current path, in page space
    let mut pending_rules: Vec<Rule> = Vec::new();
    let mut cursor: Option<(f32, f32)> = None;
    let mut subpath_start: Option<(f32, f32)> = None;

    for op in ops {
        match op.operator.as_str() {
            "q" => ctm_stack.push(ctm),
            "Q" => ctm = ctm_stack.pop().unwrap_or_default(),
            "cm" => {
                if let Some(m) = Matrix::from_op(op) {
                    ctm = m.then(&ctm);
                }
            }
            "BT" => {
                in_text_block = true;
                text = TextState {
                    leading: text.leading,
                    ..TextState::default()
                };
            }
            "ET" => in_text_block = false,
            "Tf" => {
                if let Some(PdfValue::Name(name)) = op.operands.first() {
                    font_name = name.clone();
                }
                font_size = op.number(1).unwrap_or(12.0);
            }
            "TL" => text.leading = op.number(0).unwrap_or(0.0),
            "Td" => {
                text.move_line(op.number(0).unwrap_or(0.0), op.number(1).unwrap_or(0.0));
            }
            "TD" => {
                let ty = op.number(1).unwrap_or(0.0);
                text.leading = -ty;
                text.move_line(op.number(0).unwrap_or(0.0), ty);
            }
            "Tm" => {
                if let Some(m) = Matrix::from_op(op) {
                    text.set(m);
                }
            }
            "T*" => text.next_line(),
            "Tj" | "TJ" | "'" | "\"" => {
                if op.operator == "'" || op.operator == "\"" {
                    text.next_line();
                }
                if !in_text_block {
                    continue;
                }

                let decoded = match op.operator.as_str() {
                    "TJ" => match op.operands.first() {
                        Some(PdfValue::Array(items)) => {
                            decode_tj_array(backend, page_id, &font_name, items)
                        }
                        _ => String::new(),
                    },
                    _ => {
                        let index = if op.operator == "\"" { 2 } else { 0 };
                        match op.operands.get(index) {
                            Some(PdfValue::Str(bytes)) => {
                                backend.decode_text(page_id, &font_name, bytes)
                            }
                            _ => String::new(),
                        }
                    }
                };

                if !decoded.trim().is_empty() {
                    let to_page = text.matrix.then(&ctm);
                    let (x, y) = to_page.apply(0.0, 0.0);
                    let size = font_size * to_page.vertical_scale();
                    let span = TextSpan::new(decoded, x, y, size);
                    // Advance so consecutive shows without repositioning do not overlap.
                    let advance = span.width / to_page.vertical_scale().max(f32::EPSILON);
                    text.matrix = Matrix {
                        e: advance,
                        ..Matrix::default()
                    }
                    .then(&text.matrix);
                    layout.spans.push(span);
                }
            }
            "re" => {
                if let (Some(x), Some(y), Some(w), Some(h)) =
                    (op.number(0), op.number(1), op.number(2), op.number(3))
                {
                    let (x1, y1) = ctm.apply(x, y);
                    let (x2, y2) = ctm.apply(x + w, y + h);
                    pending_rules.extend(Rule::from_rect(x1, y1, x2 - x1, y2 - y1));
                    cursor = Some(ctm.apply(x, y));
                    subpath_start = cursor;
                }
            }
            "m" => {
                if let (Some(x), Some(y)) = (op.number(0), op.number(1)) {
                    cursor = Some(ctm.apply(x, y));
                    subpath_start = cursor;
                }
            }
            "l" => {
                if let (Some(x), Some(y)) = (op.number(0), op.number(1)) {
                    let to = ctm.apply(x, y);
                    if let Some(from) = cursor {
                        pending_rules.extend(Rule::from_segment(from.0, from.1, to.0, to.1));
                    }
                    cursor = Some(to);
                }
            }
            "h" => {
                if let (Some(from), Some(start)) = (cursor, subpath_start) {
                    pending_rules.extend(Rule::from_segment(from.0, from.1, start.0, start.1));
                    cursor = Some(start);
                }
            }
            "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" => {
                layout.rules.append(&mut pending_rules);
                cursor = None;
                subpath_start = None;
            }
            "n" => {
                pending_rules.clear();
                cursor = None;
                subpath_start = None;
            }
            _ => {}
        }
    }

    layout
}

fn decode_tj_array<B: PdfBackend + ?Sized>(
    backend: &B,
    page_id: PageId,
    font_name: &[u8],
    items: &[PdfValue],
) -> String {
    let mut combined = String::new();
    for item in items {
        match item {
            PdfValue::Str(bytes) => combined.push_str(&backend.decode_text(page_id, font_name, bytes)),
            other => {
                // Negative adjustments move right; large ones separate words.
                let adjustment = get_number_from_value(other).map(|n| -n).unwrap_or(0.0);
                if adjustment > TJ_SPACE_THRESHOLD && !combined.is_empty() && !combined.ends_with(' ')
                {
                    combined.push(' ');
                }
            }
        }
    }
    combined
}
