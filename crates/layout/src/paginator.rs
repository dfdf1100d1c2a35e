//! Flows measured blocks down the body area of a section's pages.

use crate::algorithms::pagination::{check_child_fit, collapsed_spacing};
use crate::interface::PaginatorState;
use crate::nodes::{ParagraphLayout, TableLayout};
use crate::output::PositionedElement;
use crate::LayoutError;
use log::trace;
use quire_idf::PageSetup;

/// A page while its body is being filled.
#[derive(Debug)]
pub(crate) struct PageDraft {
    pub section: usize,
    pub setup: PageSetup,
    pub elements: Vec<PositionedElement>,
}

/// The single-pass page breaker. Build a fresh one per layout pass.
#[derive(Debug)]
pub(crate) struct Paginator {
    state: PaginatorState,
    pages: Vec<PageDraft>,
    /// Offset from the top of the body area.
    cursor: f32,
    /// Space after the last block on the page; `None` at the top of a page.
    previous_after: Option<f32>,
}

impl Paginator {
    pub fn new() -> Self {
        Self {
            state: PaginatorState::Unpaginated,
            pages: Vec::new(),
            cursor: 0.0,
            previous_after: None,
        }
    }

    fn transition(&mut self, next: PaginatorState) -> Result<(), LayoutError> {
        self.state = self.state.transition(next)?;
        Ok(())
    }

    /// Starts a section on a new page.
    pub fn begin_section(&mut self, section: usize, setup: PageSetup) -> Result<(), LayoutError> {
        if self.state != PaginatorState::Unpaginated {
            self.transition(PaginatorState::PageBroken)?;
        }
        self.transition(PaginatorState::Measuring)?;
        self.open_page(section, setup);
        Ok(())
    }

    fn open_page(&mut self, section: usize, setup: PageSetup) {
        trace!("Opening page {} (section {})", self.pages.len() + 1, section);
        self.pages.push(PageDraft {
            section,
            setup,
            elements: Vec::new(),
        });
        self.cursor = 0.0;
        self.previous_after = None;
    }

    fn break_page(&mut self) -> Result<(), LayoutError> {
        let (section, setup) = self.current()?;
        self.transition(PaginatorState::PageBroken)?;
        self.open_page(section, setup);
        self.transition(PaginatorState::Measuring)
    }

    fn current(&self) -> Result<(usize, PageSetup), LayoutError> {
        self.pages
            .last()
            .map(|p| (p.section, p.setup))
            .ok_or(LayoutError::StateTransition {
                from: self.state,
                to: PaginatorState::Measuring,
            })
    }

    fn at_page_top(&self) -> bool {
        self.previous_after.is_none()
    }

    fn body_origin(&self) -> Result<(f32, f32, f32), LayoutError> {
        let (_, setup) = self.current()?;
        Ok((setup.margins.left, setup.margins.top, setup.body_height()))
    }

    fn elements(&mut self) -> Result<&mut Vec<PositionedElement>, LayoutError> {
        let state = self.state;
        self.pages
            .last_mut()
            .map(|page| &mut page.elements)
            .ok_or(LayoutError::StateTransition {
                from: state,
                to: PaginatorState::Measuring,
            })
    }

    /// Places a paragraph. It moves to the next page whole when it fits on an
    /// empty page, and is split between lines otherwise.
    pub fn place_paragraph(&mut self, paragraph: &ParagraphLayout) -> Result<(), LayoutError> {
        self.ensure_measuring()?;
        let (left, top, body_height) = self.body_origin()?;
        let spacing = collapsed_spacing(self.previous_after, paragraph.space_before);
        let height = paragraph.height();

        let fits_here = !check_child_fit(self.cursor + spacing, height, body_height).should_break;
        let fits_empty_page = !check_child_fit(0.0, height, body_height).should_break;

        if fits_here {
            let y = top + self.cursor + spacing;
            paragraph.emit(left, y, self.elements()?);
            self.cursor += spacing + height;
        } else if fits_empty_page && !self.at_page_top() {
            self.break_page()?;
            paragraph.emit(left, top, self.elements()?);
            self.cursor = height;
        } else {
            let mut y = if self.at_page_top() { 0.0 } else { self.cursor + spacing };
            for (index, line) in paragraph.lines.iter().enumerate() {
                if y > 0.0 && check_child_fit(y, line.height, body_height).should_break {
                    self.break_page()?;
                    y = 0.0;
                }
                let offset = top + y;
                y += paragraph.emit_lines(index..index + 1, left, offset, self.elements()?);
            }
            self.cursor = y;
        }
        self.previous_after = Some(paragraph.space_after);
        Ok(())
    }

    /// Places a table row by row. Rows never split; heading rows repeat at
    /// the top of every continuation page, and a row taller than a page is
    /// left to overflow on a page of its own.
    pub fn place_table(&mut self, table: &TableLayout) -> Result<(), LayoutError> {
        self.ensure_measuring()?;
        if table.rows.is_empty() {
            return Ok(());
        }
        let (left, top, body_height) = self.body_origin()?;
        let spacing = collapsed_spacing(self.previous_after, table.space_before);

        // Keep the heading rows together with the first body row.
        let lead_rows = (table.heading_rows + 1).min(table.rows.len());
        let lead: f32 = table.rows[..lead_rows].iter().map(|r| r.height).sum();
        if !self.at_page_top()
            && check_child_fit(self.cursor + spacing, lead, body_height).should_break
            && !check_child_fit(0.0, lead, body_height).should_break
        {
            self.break_page()?;
        }

        let mut y = if self.at_page_top() { 0.0 } else { self.cursor + spacing };
        let mut fragment_top = y;
        let mut strokes = Vec::new();
        let mut can_break = !self.at_page_top();

        for index in 0..table.rows.len() {
            let height = table.rows[index].height;
            if can_break && check_child_fit(y, height, body_height).should_break {
                if y > fragment_top {
                    table.emit_outer(left, top + fragment_top, top + y, &mut strokes);
                }
                self.elements()?.append(&mut strokes);
                self.break_page()?;
                y = 0.0;
                fragment_top = 0.0;
                can_break = false;
                if index >= table.heading_rows {
                    for heading in 0..table.heading_rows {
                        table.emit_row(heading, left, top + y, self.elements()?, &mut strokes);
                        y += table.rows[heading].height;
                    }
                }
            }
            table.emit_row(index, left, top + y, self.elements()?, &mut strokes);
            y += height;
            can_break = true;
        }
        table.emit_outer(left, top + fragment_top, top + y, &mut strokes);
        self.elements()?.append(&mut strokes);

        self.cursor = y;
        self.previous_after = Some(table.space_after);
        Ok(())
    }

    fn ensure_measuring(&self) -> Result<(), LayoutError> {
        if self.state == PaginatorState::Measuring {
            Ok(())
        } else {
            Err(LayoutError::StateTransition {
                from: self.state,
                to: PaginatorState::Measuring,
            })
        }
    }

    /// Ends the pass and hands over the pages.
    pub fn finish(mut self) -> Result<Vec<PageDraft>, LayoutError> {
        self.transition(PaginatorState::Paginated)?;
        Ok(self.pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldValues;
    use crate::fonts::SharedFontLibrary;
    use crate::interface::LayoutEnvironment;
    use crate::output::LayoutElement;
    use crate::test_utils::{build, builder, fixed_context};
    use quire_idf::{Block, Document, PageSetup};
    use quire_style::{Margins, StyleAttributes, StyleId, TextAlign};

    /// A page whose body is exactly 100pt tall.
    fn small_page() -> PageSetup {
        PageSetup::default()
            .with_size(quire_style::PageSize::Custom {
                width: 200.0,
                height: 140.0,
            })
            .with_margins(Margins::new(20.0, 10.0, 20.0, 10.0))
    }

    fn run(doc: &Document) -> Result<Vec<PageDraft>, LayoutError> {
        let fonts = SharedFontLibrary::new();
        let ctx = fixed_context();
        let env = LayoutEnvironment {
            styles: doc.styles(),
            fonts: &fonts,
            fields: FieldValues::provisional(&ctx, None),
        };
        let mut paginator = Paginator::new();
        for (index, section) in doc.sections().iter().enumerate() {
            paginator.begin_section(index, section.page_setup)?;
            let width = section.page_setup.body_width();
            for block in &section.blocks {
                match block {
                    Block::Paragraph(p) => paginator.place_paragraph(&ParagraphLayout::measure(
                        p,
                        &StyleAttributes::default(),
                        None,
                        width,
                        &env,
                    )?)?,
                    Block::Table(t) => paginator.place_table(&TableLayout::measure(t, &env)?)?,
                }
            }
        }
        paginator.finish()
    }

    fn text_on(page: &PageDraft) -> Vec<String> {
        page.elements
            .iter()
            .filter_map(|e| match &e.element {
                LayoutElement::Text(t) => Some(t.content.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn placing_before_a_section_is_rejected() {
        let doc = {
            let mut b = builder();
            b.add_section(PageSetup::default()).paragraph(StyleId::NORMAL).text("x");
            build(b)
        };
        let mut paginator = Paginator::new();
        let fonts = SharedFontLibrary::new();
        let ctx = fixed_context();
        let env = LayoutEnvironment {
            styles: doc.styles(),
            fonts: &fonts,
            fields: FieldValues::provisional(&ctx, None),
        };
        let Block::Paragraph(p) = &doc.sections()[0].blocks[0] else {
            panic!("expected a paragraph");
        };
        let layout =
            ParagraphLayout::measure(p, &StyleAttributes::default(), None, 100.0, &env).unwrap();
        let err = paginator.place_paragraph(&layout).unwrap_err();
        assert!(matches!(err, LayoutError::StateTransition { from: PaginatorState::Unpaginated, .. }));
    }

    #[test]
    fn every_section_starts_a_new_page() {
        let mut b = builder();
        b.add_section(small_page()).paragraph(StyleId::NORMAL).text("one");
        b.add_section(small_page()).paragraph(StyleId::NORMAL).text("two");
        let pages = run(&build(b)).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].section, 1);
        assert_eq!(text_on(&pages[1]), vec!["two"]);
    }

    #[test]
    fn paragraphs_move_whole_to_the_next_page() {
        let mut b = builder();
        {
            let mut s = b.add_section(small_page());
            // 12pt lines: seven fill 84 of the 100pt body.
            for i in 0..7 {
                s.paragraph(StyleId::NORMAL).text(format!("line {i}"));
            }
            s.paragraph(StyleId::NORMAL)
                .text("first")
                .line_break()
                .text("second");
        }
        let pages = run(&build(b)).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(text_on(&pages[1]), vec!["first", "second"]);
    }

    #[test]
    fn spacing_is_suppressed_at_the_top_of_a_page() {
        let mut b = builder();
        {
            let mut s = b.add_section(small_page());
            for i in 0..8 {
                s.paragraph(StyleId::NORMAL).text(format!("line {i}"));
            }
            s.paragraph(StyleId::NORMAL).space_before(30.0).text("top");
        }
        let pages = run(&build(b)).unwrap();
        let first = &pages[1].elements[0];
        assert_eq!(first.y, 20.0);
    }

    #[test]
    fn oversized_paragraphs_split_between_lines() {
        let mut b = builder();
        {
            let mut s = b.add_section(small_page());
            let mut p = s.paragraph(StyleId::NORMAL);
            for i in 0..12 {
                p.text(format!("row {i}")).line_break();
            }
            p.text("end");
        }
        let pages = run(&build(b)).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(text_on(&pages[0]).len(), 8);
        assert_eq!(text_on(&pages[1]).first().map(String::as_str), Some("row 8"));
    }

    #[test]
    fn tables_break_between_rows_and_repeat_headings() {
        let mut b = builder();
        {
            let mut s = b.add_section(small_page());
            let mut t = s.table();
            t.column(100.0, TextAlign::Left);
            t.row().heading().min_height(20.0).cell(0).paragraph(StyleId::NORMAL).text("Head");
            for i in 0..6 {
                t.row().min_height(20.0).cell(0).paragraph(StyleId::NORMAL).text(format!("r{i}"));
            }
        }
        let pages = run(&build(b)).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(text_on(&pages[0]), vec!["Head", "r0", "r1", "r2", "r3"]);
        assert_eq!(text_on(&pages[1]), vec!["Head", "r4", "r5"]);
    }

    #[test]
    fn oversized_rows_overflow_on_their_own_page() {
        let mut b = builder();
        {
            let mut s = b.add_section(small_page());
            s.paragraph(StyleId::NORMAL).text("intro");
            let mut t = s.table();
            t.column(100.0, TextAlign::Left);
            t.row().min_height(250.0).cell(0).paragraph(StyleId::NORMAL).text("huge");
            t.row().cell(0).paragraph(StyleId::NORMAL).text("after");
        }
        let pages = run(&build(b)).unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(text_on(&pages[1]), vec!["huge"]);
        assert_eq!(text_on(&pages[2]), vec!["after"]);
    }
}
