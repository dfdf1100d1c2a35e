//! Intermediate Document Format (IDF)
//!
//! The immutable, in-memory description of a document after composition and
//! before layout: sections holding paragraphs and tables, with styles referred
//! to by [`StyleId`] and dynamic fields left unresolved. Documents are produced
//! by [`DocumentBuilder`], which checks the structural invariants once so the
//! layout engine can rely on them.

mod builder;

pub use builder::{
    BlockBuilder, BuildError, CellBuilder, DocumentBuilder, ParagraphBuilder, RowBuilder,
    SectionBuilder, TableBuilder, DEFAULT_PLACEHOLDER,
};

use quire_style::{Border, Margins, PageSize, StyleAttributes, StyleId, StyleRegistry, TextAlign};
use quire_types::{units, Color};
use std::sync::Arc;

pub type TextStr = String;

/// A validated document. Only [`DocumentBuilder::build`] creates one.
#[derive(Debug, Clone)]
pub struct Document {
    styles: Arc<StyleRegistry>,
    sections: Vec<Section>,
    title: Option<TextStr>,
}

impl Document {
    pub fn styles(&self) -> &Arc<StyleRegistry> {
        &self.styles
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// True when any section's body, header or footer contains a date field.
    pub fn has_date_field(&self) -> bool {
        self.sections.iter().any(|s| {
            s.all_blocks()
                .any(|b| b.paragraphs().any(|p| p.fields().any(|f| matches!(f, DynamicField::Date { .. }))))
        })
    }
}

/// Page geometry of a section. All lengths are in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSetup {
    pub size: PageSize,
    pub margins: Margins,
    /// Distance from the top page edge to the top of the header.
    pub header_distance: f32,
    /// Distance from the bottom page edge to the bottom of the footer.
    pub footer_distance: f32,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            size: PageSize::A4,
            margins: Margins::all(units::cm(2.5)),
            header_distance: units::cm(1.25),
            footer_distance: units::cm(1.25),
        }
    }
}

impl PageSetup {
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    pub fn with_size(mut self, size: PageSize) -> Self {
        self.size = size;
        self
    }

    pub fn dimensions(&self) -> (f32, f32) {
        self.size.dimensions_pt()
    }

    pub fn body_width(&self) -> f32 {
        self.dimensions().0 - self.margins.horizontal()
    }

    pub fn body_height(&self) -> f32 {
        self.dimensions().1 - self.margins.vertical()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Section {
    pub page_setup: PageSetup,
    pub blocks: Vec<Block>,
    pub header: Vec<Block>,
    pub footer: Vec<Block>,
}

impl Section {
    pub fn new(page_setup: PageSetup) -> Self {
        Self {
            page_setup,
            ..Default::default()
        }
    }

    fn all_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().chain(&self.header).chain(&self.footer)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

impl Block {
    /// Every paragraph in the block, including those inside table cells.
    pub fn paragraphs(&self) -> Box<dyn Iterator<Item = &Paragraph> + '_> {
        match self {
            Block::Paragraph(p) => Box::new(std::iter::once(p)),
            Block::Table(t) => Box::new(
                t.rows
                    .iter()
                    .flat_map(|r| r.cells())
                    .flat_map(|(_, c)| c.paragraphs.iter()),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub style: StyleId,
    /// Per-paragraph overrides of the style (alignment, spacing, font).
    pub format: StyleAttributes,
    pub runs: Vec<InlineRun>,
}

impl Paragraph {
    pub fn new(style: StyleId) -> Self {
        Self {
            style,
            format: StyleAttributes::default(),
            runs: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &DynamicField> {
        self.runs.iter().filter_map(|r| match r {
            InlineRun::Field { field, .. } => Some(field),
            _ => None,
        })
    }

    /// Concatenated literal text, with line breaks as `\n` and fields omitted.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            match run {
                InlineRun::Text { text, .. } => out.push_str(text),
                InlineRun::LineBreak => out.push('\n'),
                InlineRun::Field { .. } => {}
            }
        }
        out
    }

    fn style_ids(&self) -> impl Iterator<Item = StyleId> + '_ {
        std::iter::once(self.style).chain(self.runs.iter().filter_map(|r| match r {
            InlineRun::Text { style, .. } | InlineRun::Field { style, .. } => *style,
            InlineRun::LineBreak => None,
        }))
    }
}

/// Inline content of a paragraph. A run's style and format override the
/// paragraph's.
#[derive(Debug, Clone, PartialEq)]
pub enum InlineRun {
    Text {
        text: TextStr,
        style: Option<StyleId>,
        format: StyleAttributes,
    },
    LineBreak,
    Field {
        field: DynamicField,
        style: Option<StyleId>,
        format: StyleAttributes,
    },
}

/// Content whose value is only known during layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DynamicField {
    /// The generation timestamp, rendered with a `strftime` pattern.
    Date { format: String },
    /// The 1-based number of the page the field lands on.
    PageNumber,
    /// The total number of pages in the document.
    PageCount,
}

impl DynamicField {
    pub fn date(format: impl Into<String>) -> Self {
        DynamicField::Date {
            format: format.into(),
        }
    }

    pub fn depends_on_pagination(&self) -> bool {
        matches!(self, DynamicField::PageNumber | DynamicField::PageCount)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub borders: TableBorders,
    pub padding: Margins,
    pub space_before: f32,
    pub space_after: f32,
}

impl Table {
    pub fn width(&self) -> f32 {
        self.columns.iter().map(|c| c.width).sum()
    }

    /// Number of leading rows flagged as headings.
    pub fn heading_rows(&self) -> usize {
        self.rows.iter().take_while(|r| r.heading).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub width: f32,
    pub align: TextAlign,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub slots: Vec<CellSlot>,
    /// The row is at least this tall.
    pub min_height: Option<f32>,
    pub shading: Option<Color>,
    /// Heading rows repeat at the top of every continuation page.
    pub heading: bool,
    /// Font overrides applied to every cell of the row.
    pub font: StyleAttributes,
}

impl Row {
    /// Cells with their starting column index, skipping merged slots.
    pub fn cells(&self) -> impl Iterator<Item = (usize, &Cell)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| match s {
            CellSlot::Cell(c) => Some((i, c)),
            CellSlot::Merged => None,
        })
    }
}

/// One column position in a row.
#[derive(Debug, Clone, PartialEq)]
pub enum CellSlot {
    Cell(Cell),
    /// Covered by the span of a cell to the left.
    Merged,
}

impl Default for CellSlot {
    fn default() -> Self {
        CellSlot::Cell(Cell::default())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub paragraphs: Vec<Paragraph>,
    /// Number of additional columns to the right this cell spans.
    pub merge_right: usize,
    pub align: Option<TextAlign>,
    pub shading: Option<Color>,
    pub font: StyleAttributes,
    pub borders: CellBorders,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        self.paragraphs.iter().all(Paragraph::is_empty)
    }
}

/// Per-edge border overrides for a single cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellBorders {
    pub top: Option<Border>,
    pub right: Option<Border>,
    pub bottom: Option<Border>,
    pub left: Option<Border>,
}

/// Default edges for every cell of a table, plus an optional box drawn around
/// the table's outline on each page it occupies.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableBorders {
    pub top: Option<Border>,
    pub right: Option<Border>,
    pub bottom: Option<Border>,
    pub left: Option<Border>,
    pub outer: Option<Border>,
}

impl TableBorders {
    /// The same border on every cell edge.
    pub fn grid(border: Border) -> Self {
        Self {
            top: Some(border.clone()),
            right: Some(border.clone()),
            bottom: Some(border.clone()),
            left: Some(border),
            outer: None,
        }
    }
}
