//! Drawing positioned layout elements as PDF content-stream operations.

use lopdf::content::{Content, Operation};
use lopdf::{Object, StringFormat};
use quire_layout::{LaidOutPage, LayoutElement, LineElement, PositionedElement, TextElement};
use quire_render_core::RenderError;
use quire_render_core::utils::{color_components, flip_y};
use quire_types::Color;
use std::collections::HashMap;

/// Builds the content stream of one page. `font_map` maps PostScript names
/// to resource names.
pub fn render_page_content(
    page: &LaidOutPage,
    font_map: &HashMap<String, String>,
) -> Result<Content, RenderError> {
    let mut ctx = PageContext::new(page.height, font_map);
    for el in &page.elements {
        ctx.draw_element(el)?;
    }
    Ok(ctx.finish())
}

struct PageContext<'a> {
    page_height: f32,
    operations: Vec<Operation>,
    state: PageRenderState,
    font_map: &'a HashMap<String, String>,
}

/// Graphics state already set in the stream, to skip redundant operators.
#[derive(Default)]
struct PageRenderState {
    font: Option<(String, f32)>,
    fill_color: Option<Color>,
    stroke_color: Option<Color>,
    line_width: Option<f32>,
}

impl<'a> PageContext<'a> {
    fn new(page_height: f32, font_map: &'a HashMap<String, String>) -> Self {
        Self {
            page_height,
            operations: Vec::new(),
            state: PageRenderState::default(),
            font_map,
        }
    }

    fn finish(self) -> Content {
        Content {
            operations: self.operations,
        }
    }

    fn push(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }

    fn draw_element(&mut self, el: &PositionedElement) -> Result<(), RenderError> {
        match &el.element {
            LayoutElement::Text(text) => self.draw_text(text, el)?,
            LayoutElement::Rect(rect) => {
                self.set_fill_color(&rect.fill);
                let y = flip_y(el.y + el.height, self.page_height);
                self.push("re", vec![el.x.into(), y.into(), el.width.into(), el.height.into()]);
                self.push("f", vec![]);
            }
            LayoutElement::Line(line) => self.draw_line(line, el),
        }
        Ok(())
    }

    fn draw_line(&mut self, line: &LineElement, el: &PositionedElement) {
        if self.state.line_width != Some(line.stroke_width) {
            self.push("w", vec![line.stroke_width.into()]);
            self.state.line_width = Some(line.stroke_width);
        }
        if self.state.stroke_color.as_ref() != Some(&line.color) {
            let [r, g, b] = color_components(&line.color);
            self.push("RG", vec![r.into(), g.into(), b.into()]);
            self.state.stroke_color = Some(line.color.clone());
        }
        self.push("m", vec![el.x.into(), flip_y(el.y, self.page_height).into()]);
        self.push(
            "l",
            vec![
                (el.x + el.width).into(),
                flip_y(el.y + el.height, self.page_height).into(),
            ],
        );
        self.push("S", vec![]);
    }

    fn set_fill_color(&mut self, color: &Color) {
        if self.state.fill_color.as_ref() != Some(color) {
            let [r, g, b] = color_components(color);
            self.push("rg", vec![r.into(), g.into(), b.into()]);
            self.state.fill_color = Some(color.clone());
        }
    }

    fn set_font(&mut self, text: &TextElement) -> Result<(), RenderError> {
        let name = self
            .font_map
            .get(&text.font.postscript_name)
            .ok_or_else(|| {
                RenderError::Other(format!(
                    "Font '{}' was not registered with the document",
                    text.font.postscript_name
                ))
            })?
            .clone();
        let current = (name, text.font_size);
        if self.state.font.as_ref() != Some(&current) {
            self.push(
                "Tf",
                vec![Object::Name(current.0.as_bytes().to_vec()), text.font_size.into()],
            );
            self.state.font = Some(current);
        }
        Ok(())
    }

    fn draw_text(&mut self, text: &TextElement, el: &PositionedElement) -> Result<(), RenderError> {
        if text.content.trim().is_empty() {
            return Ok(());
        }
        self.push("BT", vec![]);
        self.set_font(text)?;
        self.set_fill_color(&text.color);
        let y = flip_y(text.baseline, self.page_height);
        self.push("Td", vec![el.x.into(), y.into()]);
        let format = if text.font.is_embedded() {
            StringFormat::Hexadecimal
        } else {
            StringFormat::Literal
        };
        self.push(
            "Tj",
            vec![Object::String(text.font.encode_text(&text.content), format)],
        );
        self.push("ET", vec![]);
        Ok(())
    }
}
