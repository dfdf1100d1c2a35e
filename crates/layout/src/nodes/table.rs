use super::paragraph::ParagraphLayout;
use crate::algorithms::pagination::collapsed_spacing;
use crate::interface::LayoutEnvironment;
use crate::output::{LayoutElement, LineElement, PositionedElement, RectElement};
use crate::LayoutError;
use quire_idf::{Cell, Table};
use quire_style::{Border, Margins};
use quire_types::Color;

/// A table with every row measured. Rows are atomic; the paginator decides
/// where they go.
#[derive(Debug, Clone)]
pub(crate) struct TableLayout {
    pub rows: Vec<RowLayout>,
    pub heading_rows: usize,
    pub width: f32,
    pub space_before: f32,
    pub space_after: f32,
    outer: Option<Border>,
    padding: Margins,
}

#[derive(Debug, Clone)]
pub(crate) struct RowLayout {
    pub height: f32,
    cells: Vec<CellLayout>,
}

#[derive(Debug, Clone)]
struct CellLayout {
    x: f32,
    width: f32,
    shading: Option<Color>,
    top: Option<Border>,
    right: Option<Border>,
    bottom: Option<Border>,
    left: Option<Border>,
    /// Paragraphs with their offset from the top of the content box.
    content: Vec<(f32, ParagraphLayout)>,
}

impl TableLayout {
    pub fn measure(table: &Table, env: &LayoutEnvironment<'_>) -> Result<Self, LayoutError> {
        let mut offsets = Vec::with_capacity(table.columns.len() + 1);
        let mut x = 0.0;
        offsets.push(x);
        for column in &table.columns {
            x += column.width;
            offsets.push(x);
        }
        let last_column = table.columns.len().saturating_sub(1);

        let mut rows = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let mut cells = Vec::new();
            let mut content_height = 0.0f32;
            for (index, cell) in row.cells() {
                let end = (index + cell.merge_right).min(last_column);
                let x = offsets[index];
                let width = offsets[end + 1] - x;
                let inner_width = (width - table.padding.horizontal()).max(0.0);

                let container = row.font.merge(&cell.font);
                let align = cell.align.or(table.columns.get(index).map(|c| c.align));
                let (height, content) = measure_cell(cell, &container, align, inner_width, env)?;
                content_height = content_height.max(height);

                cells.push(CellLayout {
                    x,
                    width,
                    shading: cell.shading.clone().or_else(|| row.shading.clone()),
                    top: visible(cell.borders.top.as_ref().or(table.borders.top.as_ref())),
                    right: visible(cell.borders.right.as_ref().or(table.borders.right.as_ref())),
                    bottom: visible(cell.borders.bottom.as_ref().or(table.borders.bottom.as_ref())),
                    left: visible(cell.borders.left.as_ref().or(table.borders.left.as_ref())),
                    content,
                });
            }
            let height = (content_height + table.padding.vertical()).max(row.min_height.unwrap_or(0.0));
            rows.push(RowLayout { height, cells });
        }

        Ok(Self {
            rows,
            heading_rows: table.heading_rows(),
            width: table.width(),
            space_before: table.space_before,
            space_after: table.space_after,
            outer: visible(table.borders.outer.as_ref()),
            padding: table.padding,
        })
    }

    /// Emits one row with its top-left corner at `(x, y)`. Fills and text go
    /// to `content`; cell edges go to `strokes` so they can be drawn above the
    /// fills of later rows.
    pub fn emit_row(
        &self,
        index: usize,
        x: f32,
        y: f32,
        content: &mut Vec<PositionedElement>,
        strokes: &mut Vec<PositionedElement>,
    ) {
        let row = &self.rows[index];
        for cell in &row.cells {
            if let Some(fill) = &cell.shading {
                content.push(PositionedElement {
                    x: x + cell.x,
                    y,
                    width: cell.width,
                    height: row.height,
                    element: LayoutElement::Rect(RectElement { fill: fill.clone() }),
                });
            }
        }
        for cell in &row.cells {
            let left = x + cell.x + self.padding.left;
            let top = y + self.padding.top;
            for (offset, paragraph) in &cell.content {
                paragraph.emit(left, top + offset, content);
            }

            let (x0, x1, y1) = (x + cell.x, x + cell.x + cell.width, y + row.height);
            let edges = [
                (&cell.top, (x0, y), (cell.width, 0.0)),
                (&cell.bottom, (x0, y1), (cell.width, 0.0)),
                (&cell.left, (x0, y), (0.0, row.height)),
                (&cell.right, (x1, y), (0.0, row.height)),
            ];
            for (border, origin, extent) in edges {
                if let Some(border) = border {
                    strokes.push(stroke(border, origin, extent));
                }
            }
        }
    }

    /// Emits the outer box edge around one page's fragment of the table.
    pub fn emit_outer(&self, x: f32, top: f32, bottom: f32, strokes: &mut Vec<PositionedElement>) {
        let Some(border) = &self.outer else {
            return;
        };
        let height = bottom - top;
        strokes.push(stroke(border, (x, top), (self.width, 0.0)));
        strokes.push(stroke(border, (x, bottom), (self.width, 0.0)));
        strokes.push(stroke(border, (x, top), (0.0, height)));
        strokes.push(stroke(border, (x + self.width, top), (0.0, height)));
    }

    /// Emits the whole table without page breaks. Returns its height.
    pub fn emit(&self, x: f32, y: f32, out: &mut Vec<PositionedElement>) -> f32 {
        let mut strokes = Vec::new();
        let mut top = y;
        for index in 0..self.rows.len() {
            self.emit_row(index, x, top, out, &mut strokes);
            top += self.rows[index].height;
        }
        if !self.rows.is_empty() {
            self.emit_outer(x, y, top, &mut strokes);
        }
        out.append(&mut strokes);
        top - y
    }
}

fn measure_cell(
    cell: &Cell,
    container: &quire_style::StyleAttributes,
    align: Option<quire_style::TextAlign>,
    width: f32,
    env: &LayoutEnvironment<'_>,
) -> Result<(f32, Vec<(f32, ParagraphLayout)>), LayoutError> {
    let mut content = Vec::with_capacity(cell.paragraphs.len());
    let mut y = 0.0;
    let mut previous_after = None;
    for paragraph in &cell.paragraphs {
        let layout = ParagraphLayout::measure(paragraph, container, align, width, env)?;
        y += collapsed_spacing(previous_after, layout.space_before);
        previous_after = Some(layout.space_after);
        let height = layout.height();
        content.push((y, layout));
        y += height;
    }
    Ok((y, content))
}

fn visible(border: Option<&Border>) -> Option<Border> {
    border.filter(|b| b.is_visible()).cloned()
}

fn stroke(border: &Border, (x, y): (f32, f32), (width, height): (f32, f32)) -> PositionedElement {
    PositionedElement {
        x,
        y,
        width,
        height,
        element: LayoutElement::Line(LineElement {
            stroke_width: border.width,
            color: border.color.clone(),
        }),
    }
}
