//! Output types from the layout engine.
//!
//! A [`PaginatedLayout`] is the complete, positioned content of a document:
//! pages of drawing elements in top-left page coordinates (points, y grows
//! downwards), plus the faces those elements use.

use crate::fonts::FontFace;
use chrono::NaiveDateTime;
use quire_idf::DynamicField;
use quire_style::TextAlign;
use quire_types::Color;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PaginatedLayout {
    pub pages: Vec<LaidOutPage>,
    pub total_pages: usize,
    /// Every face referenced by a text element, in first-use order.
    pub fonts: Vec<Arc<FontFace>>,
    pub title: Option<String>,
    /// Set when the document shows the generation timestamp.
    pub generated_at: Option<NaiveDateTime>,
    /// Number of layout passes it took to settle the page count.
    pub passes: usize,
}

impl PaginatedLayout {
    /// All text on a page, in drawing order, one element per entry.
    pub fn page_text(&self, index: usize) -> Vec<&str> {
        self.pages
            .get(index)
            .map(|p| p.texts().map(|t| t.content.as_str()).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct LaidOutPage {
    /// 1-based, global across sections.
    pub number: usize,
    /// Index of the section this page belongs to.
    pub section: usize,
    pub width: f32,
    pub height: f32,
    pub elements: Vec<PositionedElement>,
}

impl LaidOutPage {
    pub fn texts(&self) -> impl Iterator<Item = &TextElement> {
        self.elements.iter().filter_map(|e| match &e.element {
            LayoutElement::Text(t) => Some(t),
            _ => None,
        })
    }
}

/// An element with its bounding box on the page.
#[derive(Debug, Clone)]
pub struct PositionedElement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub element: LayoutElement,
}

#[derive(Debug, Clone)]
pub enum LayoutElement {
    Text(TextElement),
    /// A filled rectangle covering the element's box.
    Rect(RectElement),
    /// A stroked segment from `(x, y)` to `(x + width, y + height)`.
    Line(LineElement),
}

#[derive(Debug, Clone)]
pub struct TextElement {
    pub content: String,
    pub font: Arc<FontFace>,
    pub font_size: f32,
    pub color: Color,
    /// Absolute y of the baseline.
    pub baseline: f32,
    /// The field this text was produced from, if any.
    pub field: Option<DynamicField>,
    pub line: LineBox,
}

/// The box a line of text was aligned in. Fragments with the same baseline
/// and box belong to one line.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineBox {
    pub x: f32,
    pub width: f32,
    pub align: TextAlign,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RectElement {
    pub fill: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineElement {
    pub stroke_width: f32,
    pub color: Color,
}
