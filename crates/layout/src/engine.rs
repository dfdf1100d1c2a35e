use crate::LayoutError;
use crate::algorithms::pagination::collapsed_spacing;
use crate::config::LayoutConfig;
use crate::fields::{FieldContext, FieldValues};
use crate::fonts::{FontFace, SharedFontLibrary};
use crate::interface::LayoutEnvironment;
use crate::nodes::{ParagraphLayout, TableLayout};
use crate::output::{LaidOutPage, LayoutElement, PaginatedLayout, PositionedElement};
use crate::paginator::{PageDraft, Paginator};
use log::{debug, warn};
use quire_idf::{Block, Document, Section};
use quire_style::{StyleAttributes, TextAlign};
use std::collections::HashSet;
use std::sync::Arc;

/// The main layout engine. Cheap to clone; one engine can serve many
/// documents concurrently.
#[derive(Clone, Debug)]
pub struct LayoutEngine {
    fonts: SharedFontLibrary,
    config: LayoutConfig,
}

enum MeasuredBlock {
    Paragraph(ParagraphLayout),
    Table(TableLayout),
}

impl MeasuredBlock {
    fn space_before(&self) -> f32 {
        match self {
            MeasuredBlock::Paragraph(p) => p.space_before,
            MeasuredBlock::Table(t) => t.space_before,
        }
    }

    fn space_after(&self) -> f32 {
        match self {
            MeasuredBlock::Paragraph(p) => p.space_after,
            MeasuredBlock::Table(t) => t.space_after,
        }
    }

    fn height(&self) -> f32 {
        match self {
            MeasuredBlock::Paragraph(p) => p.height(),
            MeasuredBlock::Table(t) => t.rows.iter().map(|r| r.height).sum(),
        }
    }
}

impl LayoutEngine {
    pub fn new(fonts: SharedFontLibrary, config: LayoutConfig) -> Self {
        Self { fonts, config }
    }

    pub fn fonts(&self) -> &SharedFontLibrary {
        &self.fonts
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lays out a document.
    ///
    /// The first pass measures with the page count unknown; each further pass
    /// uses the count of the one before, until a pass reproduces the count it
    /// was given or the pass limit is reached. Page fields of the final pass
    /// are then stamped from its own page count, so they are always exact.
    pub fn paginate(
        &self,
        document: &Document,
        context: &FieldContext,
    ) -> Result<PaginatedLayout, LayoutError> {
        let limit = self.config.pass_limit();
        let mut hint = None;
        let mut passes = 0;
        let mut pages = loop {
            passes += 1;
            let pages = self.run_pass(document, context, hint)?;
            let total = pages.len();
            debug!("Layout pass {passes} produced {total} page(s) (hint {hint:?})");
            if hint == Some(total) {
                break pages;
            }
            if passes >= limit {
                warn!(
                    "Page count did not settle after {passes} passes (last {total}, previous {hint:?}); using the last pass"
                );
                break pages;
            }
            hint = Some(total);
        };

        let total_pages = pages.len();
        stamp_page_fields(&mut pages, context, total_pages)?;

        Ok(PaginatedLayout {
            fonts: collect_fonts(&pages),
            pages,
            total_pages,
            title: document.title().map(str::to_string),
            generated_at: document.has_date_field().then_some(context.generated_at),
            passes,
        })
    }

    fn run_pass(
        &self,
        document: &Document,
        context: &FieldContext,
        total_hint: Option<usize>,
    ) -> Result<Vec<LaidOutPage>, LayoutError> {
        let env = LayoutEnvironment {
            styles: document.styles(),
            fonts: &self.fonts,
            fields: FieldValues::provisional(context, total_hint),
        };

        let mut paginator = Paginator::new();
        for (index, section) in document.sections().iter().enumerate() {
            paginator.begin_section(index, section.page_setup)?;
            let width = section.page_setup.body_width();
            for block in &section.blocks {
                match measure_block(block, width, &env)? {
                    MeasuredBlock::Paragraph(p) => paginator.place_paragraph(&p)?,
                    MeasuredBlock::Table(t) => paginator.place_table(&t)?,
                }
            }
        }
        let drafts = paginator.finish()?;

        let total = drafts.len();
        drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| {
                let section = &document.sections()[draft.section];
                finish_page(draft, section, index + 1, env.on_page(index + 1, total))
            })
            .collect()
    }
}

fn measure_block(
    block: &Block,
    width: f32,
    env: &LayoutEnvironment<'_>,
) -> Result<MeasuredBlock, LayoutError> {
    Ok(match block {
        Block::Paragraph(p) => MeasuredBlock::Paragraph(ParagraphLayout::measure(
            p,
            &StyleAttributes::default(),
            None,
            width,
            env,
        )?),
        Block::Table(t) => MeasuredBlock::Table(TableLayout::measure(t, env)?),
    })
}

/// Adds the section's header and footer around the body of a page.
fn finish_page(
    draft: PageDraft,
    section: &Section,
    number: usize,
    env: LayoutEnvironment<'_>,
) -> Result<LaidOutPage, LayoutError> {
    let setup = draft.setup;
    let (width, height) = setup.dimensions();
    let body_width = setup.body_width();
    let left = setup.margins.left;

    let header = section
        .header
        .iter()
        .map(|b| measure_block(b, body_width, &env))
        .collect::<Result<Vec<_>, _>>()?;
    let footer = section
        .footer
        .iter()
        .map(|b| measure_block(b, body_width, &env))
        .collect::<Result<Vec<_>, _>>()?;

    let mut elements = Vec::with_capacity(draft.elements.len() + 8);
    emit_stack(&header, left, setup.header_distance, &mut elements);
    elements.extend(draft.elements);
    let footer_top = height - setup.footer_distance - stack_height(&footer);
    emit_stack(&footer, left, footer_top, &mut elements);

    Ok(LaidOutPage {
        number,
        section: draft.section,
        width,
        height,
        elements,
    })
}

fn stack_height(blocks: &[MeasuredBlock]) -> f32 {
    let mut height = 0.0;
    let mut previous_after = None;
    for block in blocks {
        height += collapsed_spacing(previous_after, block.space_before()) + block.height();
        previous_after = Some(block.space_after());
    }
    height
}

/// Stacks blocks top to bottom without breaking; header and footer content
/// overflows rather than moving.
fn emit_stack(blocks: &[MeasuredBlock], x: f32, y: f32, out: &mut Vec<PositionedElement>) {
    let mut top = y;
    let mut previous_after = None;
    for block in blocks {
        top += collapsed_spacing(previous_after, block.space_before());
        top += match block {
            MeasuredBlock::Paragraph(p) => p.emit(x, top, out),
            MeasuredBlock::Table(t) => t.emit(x, top, out),
        };
        previous_after = Some(block.space_after());
    }
}

/// Rewrites page-number and page-count text from the final page list. A field
/// whose width changes realigns the rest of its line.
fn stamp_page_fields(
    pages: &mut [LaidOutPage],
    context: &FieldContext,
    total_pages: usize,
) -> Result<(), LayoutError> {
    for page in pages.iter_mut() {
        let values = FieldValues::provisional(context, None).on_page(page.number, total_pages);
        let mut resized = Vec::new();
        for (index, positioned) in page.elements.iter_mut().enumerate() {
            let LayoutElement::Text(text) = &mut positioned.element else {
                continue;
            };
            let Some(field) = text.field.as_ref().filter(|f| f.depends_on_pagination()) else {
                continue;
            };
            let content = values.text(field)?;
            if content != text.content {
                let width = text.font.text_width(&content, text.font_size);
                resized.push((index, width - positioned.width));
                positioned.width = width;
                text.content = content;
            }
        }
        for (index, delta) in resized {
            realign_line(&mut page.elements, index, delta);
        }
    }
    Ok(())
}

/// Shifts the fragments of the line holding `elements[index]` after that
/// fragment grew by `delta`.
fn realign_line(elements: &mut [PositionedElement], index: usize, delta: f32) {
    let anchor = &elements[index];
    let LayoutElement::Text(text) = &anchor.element else {
        return;
    };
    let (x, baseline, line) = (anchor.x, text.baseline, text.line);
    for (i, positioned) in elements.iter_mut().enumerate() {
        let LayoutElement::Text(other) = &positioned.element else {
            continue;
        };
        if other.baseline != baseline || other.line != line {
            continue;
        }
        let after = i != index && positioned.x > x;
        positioned.x += match line.align {
            TextAlign::Right if after => 0.0,
            TextAlign::Right => -delta,
            TextAlign::Center if after => delta / 2.0,
            TextAlign::Center => -delta / 2.0,
            TextAlign::Left | TextAlign::Justify if after => delta,
            TextAlign::Left | TextAlign::Justify => 0.0,
        };
    }
}

fn collect_fonts(pages: &[LaidOutPage]) -> Vec<Arc<FontFace>> {
    let mut seen = HashSet::new();
    let mut fonts = Vec::new();
    for text in pages.iter().flat_map(|p| p.texts()) {
        if seen.insert(text.font.postscript_name.clone()) {
            fonts.push(text.font.clone());
        }
    }
    fonts
}
