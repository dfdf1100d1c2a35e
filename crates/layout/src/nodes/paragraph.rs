use crate::interface::LayoutEnvironment;
use crate::output::{LayoutElement, LineBox, PositionedElement, TextElement};
use crate::text::{LineLayout, RunStyle, break_lines, shape_paragraph};
use crate::LayoutError;
use quire_idf::Paragraph;
use quire_style::{StyleAttributes, TextAlign};
use std::ops::Range;

/// A paragraph broken into lines for a fixed width.
#[derive(Debug, Clone)]
pub(crate) struct ParagraphLayout {
    pub runs: Vec<RunStyle>,
    pub lines: Vec<LineLayout>,
    pub space_before: f32,
    pub space_after: f32,
    width: f32,
    align: TextAlign,
}

impl ParagraphLayout {
    /// `container` holds the font overrides of the enclosing row and cell;
    /// `inherited_align` the cell or column alignment. The paragraph's own
    /// format wins over both.
    pub fn measure(
        paragraph: &Paragraph,
        container: &StyleAttributes,
        inherited_align: Option<TextAlign>,
        width: f32,
        env: &LayoutEnvironment<'_>,
    ) -> Result<Self, LayoutError> {
        let style = env
            .styles
            .resolve(paragraph.style)?
            .apply(container)
            .apply(&paragraph.format);
        let align = paragraph
            .format
            .text_align
            .or(inherited_align)
            .unwrap_or(style.text_align);

        let shaped = shape_paragraph(paragraph, &style, env)?;
        let lines = break_lines(&shaped, width, align);
        Ok(Self {
            runs: shaped.runs,
            lines,
            space_before: style.space_before,
            space_after: style.space_after,
            width,
            align,
        })
    }

    pub fn height(&self) -> f32 {
        self.lines.iter().map(|l| l.height).sum()
    }

    /// Emits the given lines with the first line's top at `y`. Returns the
    /// height consumed.
    pub fn emit_lines(
        &self,
        range: Range<usize>,
        x: f32,
        y: f32,
        out: &mut Vec<PositionedElement>,
    ) -> f32 {
        let line_box = LineBox {
            x,
            width: self.width,
            align: self.align,
        };
        let mut top = y;
        for line in &self.lines[range] {
            for item in &line.items {
                if item.field.is_none() && item.text.trim().is_empty() {
                    continue;
                }
                let run = &self.runs[item.run];
                out.push(PositionedElement {
                    x: x + item.x,
                    y: top,
                    width: item.width,
                    height: line.height,
                    element: LayoutElement::Text(TextElement {
                        content: item.text.clone(),
                        font: run.font.clone(),
                        font_size: run.font_size,
                        color: run.color.clone(),
                        baseline: top + line.baseline,
                        field: item.field.clone(),
                        line: line_box,
                    }),
                });
            }
            top += line.height;
        }
        top - y
    }

    pub fn emit(&self, x: f32, y: f32, out: &mut Vec<PositionedElement>) -> f32 {
        self.emit_lines(0..self.lines.len(), x, y, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldContext, FieldValues};
    use crate::fonts::SharedFontLibrary;
    use crate::test_utils::{fixed_context, test_registry};
    use quire_idf::InlineRun;
    use quire_style::{StyleId, StyleRegistry};

    fn env<'a>(
        registry: &'a StyleRegistry,
        fonts: &'a SharedFontLibrary,
        ctx: &'a FieldContext,
    ) -> LayoutEnvironment<'a> {
        LayoutEnvironment {
            styles: registry,
            fonts,
            fields: FieldValues::provisional(ctx, None),
        }
    }

    fn paragraph(style: StyleId, text: &str) -> Paragraph {
        let mut p = Paragraph::new(style);
        p.runs.push(InlineRun::Text {
            text: text.to_string(),
            style: None,
            format: StyleAttributes::default(),
        });
        p
    }

    #[test]
    fn spacing_and_height_come_from_the_style() {
        let registry = test_registry();
        let fonts = SharedFontLibrary::new();
        let ctx = fixed_context();
        let heading = registry.id("Heading").unwrap();
        let layout = ParagraphLayout::measure(
            &paragraph(heading, "Utility Charges"),
            &StyleAttributes::default(),
            None,
            400.0,
            &env(&registry, &fonts, &ctx),
        )
        .unwrap();
        assert_eq!(layout.lines.len(), 1);
        assert!((layout.height() - 14.4).abs() < 0.001);
        assert_eq!(layout.space_after, 6.0);
    }

    #[test]
    fn container_font_applies_under_the_paragraph_format() {
        let registry = test_registry();
        let fonts = SharedFontLibrary::new();
        let ctx = fixed_context();
        let mut p = paragraph(StyleId::NORMAL, "Amount");
        p.format = StyleAttributes::new().font_size(8.0);
        let container = StyleAttributes::new().bold().font_size(14.0);
        let layout = ParagraphLayout::measure(
            &p,
            &container,
            None,
            400.0,
            &env(&registry, &fonts, &ctx),
        )
        .unwrap();
        assert_eq!(layout.runs[0].font.postscript_name, "Helvetica-Bold");
        assert_eq!(layout.runs[0].font_size, 8.0);
    }

    #[test]
    fn inherited_alignment_yields_to_the_paragraph_format() {
        let registry = test_registry();
        let fonts = SharedFontLibrary::new();
        let ctx = fixed_context();
        let env = env(&registry, &fonts, &ctx);

        let p = paragraph(StyleId::NORMAL, "Total");
        let right = ParagraphLayout::measure(&p, &StyleAttributes::default(), Some(TextAlign::Right), 100.0, &env).unwrap();
        assert!(right.lines[0].items[0].x > 70.0);

        let mut left = paragraph(StyleId::NORMAL, "Total");
        left.format.text_align = Some(TextAlign::Left);
        let left = ParagraphLayout::measure(&left, &StyleAttributes::default(), Some(TextAlign::Right), 100.0, &env).unwrap();
        assert_eq!(left.lines[0].items[0].x, 0.0);
    }

    #[test]
    fn emitted_text_carries_baselines_below_the_top() {
        let registry = test_registry();
        let fonts = SharedFontLibrary::new();
        let ctx = fixed_context();
        let layout = ParagraphLayout::measure(
            &paragraph(StyleId::NORMAL, "Bill To"),
            &StyleAttributes::default(),
            None,
            400.0,
            &env(&registry, &fonts, &ctx),
        )
        .unwrap();
        let mut out = Vec::new();
        let used = layout.emit(50.0, 100.0, &mut out);
        assert!((used - 12.0).abs() < 0.001);
        assert_eq!(out.len(), 1);
        let LayoutElement::Text(text) = &out[0].element else {
            panic!("expected text");
        };
        assert_eq!(text.content, "Bill To");
        assert!(text.baseline > 100.0 && text.baseline < 112.0);
        assert_eq!(out[0].x, 50.0);
    }
}
