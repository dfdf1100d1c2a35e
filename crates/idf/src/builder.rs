use crate::{
    Block, Cell, CellSlot, Column, Document, DynamicField, InlineRun, PageSetup, Paragraph, Row,
    Section, Table, TableBorders, TextStr,
};
use quire_style::{Border, Margins, StyleAttributes, StyleId, StyleRegistry, TextAlign};
use quire_types::Color;
use std::sync::Arc;
use thiserror::Error;

/// Text rendered in place of a missing or blank value.
pub const DEFAULT_PLACEHOLDER: &str = "N/A";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Document has no sections")]
    EmptyDocument,
    #[error("Row {row} of table {table} in section {section} has {found} cells, expected {expected}")]
    CellCountMismatch {
        section: usize,
        table: usize,
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Invalid cell merge at row {row}, column {column} of table {table} in section {section}: {reason}")]
    InvalidMerge {
        section: usize,
        table: usize,
        row: usize,
        column: usize,
        reason: &'static str,
    },
    #[error("Column {column} of table {table} in section {section} has invalid width {width}")]
    InvalidColumnWidth {
        section: usize,
        table: usize,
        column: usize,
        width: f32,
    },
    #[error("Section {section} leaves no room for content: {reason}")]
    InvalidPageSetup { section: usize, reason: String },
    #[error("Style {0} is not defined in the document's registry")]
    UnknownStyle(StyleId),
}

/// Assembles a [`Document`].
///
/// Builders for nested content borrow their parent, so content is written in
/// place and there is nothing to "attach" afterwards:
///
/// ```ignore
/// let mut doc = DocumentBuilder::new(styles);
/// let mut section = doc.add_section(PageSetup::default());
/// section.paragraph(header).text("INVOICE").align(TextAlign::Center);
/// let document = doc.build()?;
/// ```
#[derive(Debug)]
pub struct DocumentBuilder {
    styles: Arc<StyleRegistry>,
    sections: Vec<Section>,
    placeholder: String,
    title: Option<TextStr>,
}

impl DocumentBuilder {
    pub fn new(styles: Arc<StyleRegistry>) -> Self {
        Self {
            styles,
            sections: Vec::new(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            title: None,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn styles(&self) -> &Arc<StyleRegistry> {
        &self.styles
    }

    /// Starts a new section. Every section begins on a fresh page.
    pub fn add_section(&mut self, page_setup: PageSetup) -> SectionBuilder<'_> {
        let index = self.sections.len();
        self.sections.push(Section::new(page_setup));
        SectionBuilder {
            section: &mut self.sections[index],
            placeholder: &self.placeholder,
        }
    }

    /// Validates the structure and freezes the document.
    pub fn build(self) -> Result<Document, BuildError> {
        if self.sections.is_empty() {
            return Err(BuildError::EmptyDocument);
        }
        let mut sections = self.sections;
        for (index, section) in sections.iter_mut().enumerate() {
            validate_page_setup(index, &section.page_setup)?;
            let mut tables = 0;
            for block in section
                .blocks
                .iter_mut()
                .chain(section.header.iter_mut())
                .chain(section.footer.iter_mut())
            {
                if let Block::Table(table) = &mut *block {
                    seal_table(index, tables, table)?;
                    tables += 1;
                }
                for paragraph in block.paragraphs() {
                    if let Some(id) = paragraph.style_ids().find(|id| !self.styles.contains(*id)) {
                        return Err(BuildError::UnknownStyle(id));
                    }
                }
            }
        }
        log::debug!("Built document with {} section(s)", sections.len());
        Ok(Document {
            styles: self.styles,
            sections,
            title: self.title,
        })
    }
}

fn validate_page_setup(section: usize, setup: &PageSetup) -> Result<(), BuildError> {
    let (width, height) = setup.dimensions();
    let margins = [
        setup.margins.top,
        setup.margins.right,
        setup.margins.bottom,
        setup.margins.left,
    ];
    if margins.iter().any(|m| !m.is_finite() || *m < 0.0) {
        return Err(BuildError::InvalidPageSetup {
            section,
            reason: "margins must be non-negative".to_string(),
        });
    }
    if setup.body_width() <= 0.0 || setup.body_height() <= 0.0 {
        return Err(BuildError::InvalidPageSetup {
            section,
            reason: format!(
                "margins {:?} exceed the {}x{}pt page",
                setup.margins, width, height
            ),
        });
    }
    Ok(())
}

/// Checks the slot invariants of every row and turns the empty slots covered
/// by a `merge_right` span into [`CellSlot::Merged`].
fn seal_table(section: usize, table_index: usize, table: &mut Table) -> Result<(), BuildError> {
    for (column, c) in table.columns.iter().enumerate() {
        if !(c.width.is_finite() && c.width > 0.0) {
            return Err(BuildError::InvalidColumnWidth {
                section,
                table: table_index,
                column,
                width: c.width,
            });
        }
    }

    let expected = table.columns.len();
    for (row_index, row) in table.rows.iter_mut().enumerate() {
        if row.slots.len() != expected {
            return Err(BuildError::CellCountMismatch {
                section,
                table: table_index,
                row: row_index,
                expected,
                found: row.slots.len(),
            });
        }
        let merge_error = |column, reason| BuildError::InvalidMerge {
            section,
            table: table_index,
            row: row_index,
            column,
            reason,
        };

        let mut column = 0;
        while column < expected {
            let span = match &row.slots[column] {
                CellSlot::Cell(cell) => cell.merge_right,
                CellSlot::Merged => return Err(merge_error(column, "merged slot is not covered by a span")),
            };
            if column + span >= expected {
                return Err(merge_error(column, "span runs past the last column"));
            }
            for covered in column + 1..=column + span {
                let seal = match &row.slots[covered] {
                    CellSlot::Merged => false,
                    CellSlot::Cell(cell) if cell.is_empty() => true,
                    CellSlot::Cell(_) => {
                        return Err(merge_error(covered, "span covers a cell with content"));
                    }
                };
                if seal {
                    row.slots[covered] = CellSlot::Merged;
                }
            }
            column += span + 1;
        }
    }
    Ok(())
}

/// Appends blocks to a section body, header or footer.
#[derive(Debug)]
pub struct BlockBuilder<'a> {
    blocks: &'a mut Vec<Block>,
    placeholder: &'a str,
}

impl<'a> BlockBuilder<'a> {
    pub fn paragraph(&mut self, style: StyleId) -> ParagraphBuilder<'_> {
        self.reborrow().into_paragraph(style)
    }

    /// An empty `Normal` paragraph used purely as vertical spacing.
    pub fn empty_paragraph(&mut self, space_after: f32) {
        let mut paragraph = Paragraph::new(StyleId::NORMAL);
        paragraph.format.space_after = Some(space_after);
        self.blocks.push(Block::Paragraph(paragraph));
    }

    pub fn table(&mut self) -> TableBuilder<'_> {
        self.reborrow().into_table()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Horizontal cell padding of 1.2mm, no vertical padding.
fn default_cell_padding() -> Margins {
    Margins::x(quire_types::units::mm(1.2))
}

#[derive(Debug)]
pub struct SectionBuilder<'a> {
    section: &'a mut Section,
    placeholder: &'a str,
}

impl<'a> SectionBuilder<'a> {
    fn body(&mut self) -> BlockBuilder<'_> {
        BlockBuilder {
            blocks: &mut self.section.blocks,
            placeholder: self.placeholder,
        }
    }

    pub fn paragraph(&mut self, style: StyleId) -> ParagraphBuilder<'_> {
        self.body().into_paragraph(style)
    }

    pub fn empty_paragraph(&mut self, space_after: f32) {
        self.body().empty_paragraph(space_after);
    }

    pub fn table(&mut self) -> TableBuilder<'_> {
        self.body().into_table()
    }

    /// Content repeated in the top margin of every page of the section.
    pub fn header(&mut self) -> BlockBuilder<'_> {
        BlockBuilder {
            blocks: &mut self.section.header,
            placeholder: self.placeholder,
        }
    }

    /// Content repeated in the bottom margin of every page of the section.
    pub fn footer(&mut self) -> BlockBuilder<'_> {
        BlockBuilder {
            blocks: &mut self.section.footer,
            placeholder: self.placeholder,
        }
    }

    pub fn page_setup(&self) -> &PageSetup {
        &self.section.page_setup
    }
}

impl<'a> BlockBuilder<'a> {
    fn reborrow(&mut self) -> BlockBuilder<'_> {
        BlockBuilder {
            blocks: &mut *self.blocks,
            placeholder: self.placeholder,
        }
    }

    fn into_paragraph(self, style: StyleId) -> ParagraphBuilder<'a> {
        self.blocks.push(Block::Paragraph(Paragraph::new(style)));
        let Some(Block::Paragraph(paragraph)) = self.blocks.last_mut() else {
            unreachable!("a paragraph was just pushed")
        };
        ParagraphBuilder {
            paragraph,
            placeholder: self.placeholder,
        }
    }

    fn into_table(self) -> TableBuilder<'a> {
        self.blocks.push(Block::Table(Table {
            padding: default_cell_padding(),
            ..Default::default()
        }));
        let Some(Block::Table(table)) = self.blocks.last_mut() else {
            unreachable!("a table was just pushed")
        };
        TableBuilder {
            table,
            placeholder: self.placeholder,
        }
    }
}

#[derive(Debug)]
pub struct ParagraphBuilder<'a> {
    paragraph: &'a mut Paragraph,
    placeholder: &'a str,
}

impl<'a> ParagraphBuilder<'a> {
    pub fn text(&mut self, text: impl Into<String>) -> &mut Self {
        self.push_text(text.into(), None)
    }

    /// Appends `value`, or the document placeholder when it is missing or blank.
    pub fn text_or_placeholder(&mut self, value: Option<&str>) -> &mut Self {
        let text = match value.map(str::trim) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => self.placeholder.to_string(),
        };
        self.push_text(text, None)
    }

    /// Appends text in a character style other than the paragraph's.
    pub fn formatted(&mut self, text: impl Into<String>, style: StyleId) -> &mut Self {
        self.push_text(text.into(), Some(style))
    }

    pub fn line_break(&mut self) -> &mut Self {
        self.paragraph.runs.push(InlineRun::LineBreak);
        self
    }

    pub fn field(&mut self, field: DynamicField) -> &mut Self {
        self.paragraph.runs.push(InlineRun::Field {
            field,
            style: None,
            format: StyleAttributes::default(),
        });
        self
    }

    pub fn align(&mut self, align: TextAlign) -> &mut Self {
        self.paragraph.format.text_align = Some(align);
        self
    }

    pub fn space_before(&mut self, points: f32) -> &mut Self {
        self.paragraph.format.space_before = Some(points);
        self
    }

    pub fn space_after(&mut self, points: f32) -> &mut Self {
        self.paragraph.format.space_after = Some(points);
        self
    }

    /// Overrides font attributes for the whole paragraph.
    pub fn font(&mut self, attributes: StyleAttributes) -> &mut Self {
        self.paragraph.format = self.paragraph.format.merge(&attributes);
        self
    }

    fn push_text(&mut self, text: String, style: Option<StyleId>) -> &mut Self {
        self.paragraph.runs.push(InlineRun::Text {
            text,
            style,
            format: StyleAttributes::default(),
        });
        self
    }
}

#[derive(Debug)]
pub struct TableBuilder<'a> {
    table: &'a mut Table,
    placeholder: &'a str,
}

impl<'a> TableBuilder<'a> {
    pub fn column(&mut self, width: f32, align: TextAlign) -> &mut Self {
        self.table.columns.push(Column { width, align });
        self
    }

    /// Appends a row with one empty cell per column declared so far.
    pub fn row(&mut self) -> RowBuilder<'_> {
        let slots = vec![CellSlot::default(); self.table.columns.len()];
        let index = self.table.rows.len();
        self.table.rows.push(Row {
            slots,
            ..Default::default()
        });
        RowBuilder {
            row: &mut self.table.rows[index],
            placeholder: self.placeholder,
        }
    }

    /// Sets the same border on every cell edge.
    pub fn borders(&mut self, width: f32, color: Color) -> &mut Self {
        let outer = self.table.borders.outer.take();
        self.table.borders = TableBorders::grid(Border::solid(width, color));
        self.table.borders.outer = outer;
        self
    }

    pub fn border_left(&mut self, border: Border) -> &mut Self {
        self.table.borders.left = Some(border);
        self
    }

    pub fn border_right(&mut self, border: Border) -> &mut Self {
        self.table.borders.right = Some(border);
        self
    }

    /// A box around the table outline on every page it spans.
    pub fn outer_edge(&mut self, width: f32, color: Color) -> &mut Self {
        self.table.borders.outer = Some(Border::solid(width, color));
        self
    }

    pub fn padding(&mut self, padding: Margins) -> &mut Self {
        self.table.padding = padding;
        self
    }

    pub fn space_before(&mut self, points: f32) -> &mut Self {
        self.table.space_before = points;
        self
    }

    pub fn space_after(&mut self, points: f32) -> &mut Self {
        self.table.space_after = points;
        self
    }
}

#[derive(Debug)]
pub struct RowBuilder<'a> {
    row: &'a mut Row,
    placeholder: &'a str,
}

impl<'a> RowBuilder<'a> {
    pub fn min_height(&mut self, points: f32) -> &mut Self {
        self.row.min_height = Some(points);
        self
    }

    pub fn shading(&mut self, color: Color) -> &mut Self {
        self.row.shading = Some(color);
        self
    }

    pub fn heading(&mut self) -> &mut Self {
        self.row.heading = true;
        self
    }

    pub fn font(&mut self, attributes: StyleAttributes) -> &mut Self {
        self.row.font = self.row.font.merge(&attributes);
        self
    }

    /// The cell at `column`. Addressing a column beyond the declared ones
    /// extends the row, which [`DocumentBuilder::build`] then rejects.
    pub fn cell(&mut self, column: usize) -> CellBuilder<'_> {
        if column >= self.row.slots.len() {
            self.row.slots.resize_with(column + 1, CellSlot::default);
        }
        let slot = &mut self.row.slots[column];
        if matches!(slot, CellSlot::Merged) {
            *slot = CellSlot::default();
        }
        let CellSlot::Cell(cell) = slot else {
            unreachable!("merged slots were replaced above")
        };
        CellBuilder {
            cell,
            placeholder: self.placeholder,
        }
    }
}

#[derive(Debug)]
pub struct CellBuilder<'a> {
    cell: &'a mut Cell,
    placeholder: &'a str,
}

impl<'a> CellBuilder<'a> {
    pub fn paragraph(&mut self, style: StyleId) -> ParagraphBuilder<'_> {
        let index = self.cell.paragraphs.len();
        self.cell.paragraphs.push(Paragraph::new(style));
        ParagraphBuilder {
            paragraph: &mut self.cell.paragraphs[index],
            placeholder: self.placeholder,
        }
    }

    /// Spans this cell over the next `columns` columns.
    pub fn merge_right(&mut self, columns: usize) -> &mut Self {
        self.cell.merge_right = columns;
        self
    }

    pub fn align(&mut self, align: TextAlign) -> &mut Self {
        self.cell.align = Some(align);
        self
    }

    pub fn shading(&mut self, color: Color) -> &mut Self {
        self.cell.shading = Some(color);
        self
    }

    pub fn border_top(&mut self, border: Border) -> &mut Self {
        self.cell.borders.top = Some(border);
        self
    }

    pub fn border_bottom(&mut self, border: Border) -> &mut Self {
        self.cell.borders.bottom = Some(border);
        self
    }

    pub fn font(&mut self, attributes: StyleAttributes) -> &mut Self {
        self.cell.font = self.cell.font.merge(&attributes);
        self
    }
}
