use crate::LayoutError;
use crate::fonts::{FontFace, SharedFontLibrary};
use crate::interface::LayoutEnvironment;
use quire_idf::{DynamicField, InlineRun, Paragraph};
use quire_style::{ResolvedStyle, StyleAttributes, StyleId};
use quire_types::Color;
use std::sync::Arc;

/// The font and color a stretch of text is set in.
#[derive(Debug, Clone)]
pub(crate) struct RunStyle {
    pub font: Arc<FontFace>,
    pub font_size: f32,
    pub color: Color,
    pub line_height: f32,
    pub ascent: f32,
    pub descent: f32,
}

impl RunStyle {
    pub fn resolve(style: &ResolvedStyle, fonts: &SharedFontLibrary) -> Self {
        let font = fonts.resolve(&style.font_family, style.font_weight, style.font_style);
        let size = style.font_size;
        Self {
            ascent: font.metrics.ascender(size),
            descent: font.metrics.descender(size),
            line_height: style.line_height(),
            font_size: size,
            color: style.color.clone(),
            font,
        }
    }

    pub fn width(&self, text: &str) -> f32 {
        self.font.text_width(text, self.font_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Word,
    Space,
    LineBreak,
}

/// An unbreakable piece of a paragraph.
#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Index into [`ShapedParagraph::runs`].
    pub run: usize,
    pub width: f32,
    pub field: Option<DynamicField>,
}

#[derive(Debug, Clone)]
pub(crate) struct ShapedParagraph {
    /// Run styles; index 0 is always the paragraph's own style.
    pub runs: Vec<RunStyle>,
    pub tokens: Vec<Token>,
}

/// Measures a paragraph's runs. `base` is the paragraph style with every
/// container override already applied.
pub(crate) fn shape_paragraph(
    paragraph: &Paragraph,
    base: &ResolvedStyle,
    env: &LayoutEnvironment<'_>,
) -> Result<ShapedParagraph, LayoutError> {
    let mut runs = vec![RunStyle::resolve(base, env.fonts)];
    let mut tokens = Vec::new();
    let mut last_run = 0;

    for inline in &paragraph.runs {
        match inline {
            InlineRun::Text {
                text,
                style,
                format,
            } => {
                last_run = push_run(&mut runs, base, *style, format, env)?;
                tokenize(text, last_run, &runs[last_run], &mut tokens);
            }
            InlineRun::LineBreak => tokens.push(Token {
                kind: TokenKind::LineBreak,
                text: String::new(),
                run: last_run,
                width: 0.0,
                field: None,
            }),
            InlineRun::Field {
                field,
                style,
                format,
            } => {
                last_run = push_run(&mut runs, base, *style, format, env)?;
                let text = env.fields.text(field)?;
                tokens.push(Token {
                    kind: TokenKind::Word,
                    width: runs[last_run].width(&text),
                    text,
                    run: last_run,
                    field: Some(field.clone()),
                });
            }
        }
    }

    Ok(ShapedParagraph { runs, tokens })
}

fn push_run(
    runs: &mut Vec<RunStyle>,
    base: &ResolvedStyle,
    style: Option<StyleId>,
    format: &StyleAttributes,
    env: &LayoutEnvironment<'_>,
) -> Result<usize, LayoutError> {
    if style.is_none() && format.is_empty() {
        return Ok(0);
    }
    let resolved = match style {
        Some(id) => env.styles.resolve(id)?.apply(format),
        None => base.apply(format),
    };
    runs.push(RunStyle::resolve(&resolved, env.fonts));
    Ok(runs.len() - 1)
}

/// Splits text into words and whitespace. Newlines inside text act as line
/// breaks; tabs are set as spaces.
fn tokenize(text: &str, run: usize, style: &RunStyle, out: &mut Vec<Token>) {
    let mut current = String::new();
    let mut current_is_space = false;

    let flush = |current: &mut String, is_space: bool, out: &mut Vec<Token>| {
        if current.is_empty() {
            return;
        }
        let text = std::mem::take(current);
        out.push(Token {
            kind: if is_space {
                TokenKind::Space
            } else {
                TokenKind::Word
            },
            width: style.width(&text),
            text,
            run,
            field: None,
        });
    };

    for ch in text.chars() {
        if ch == '\n' {
            flush(&mut current, current_is_space, out);
            out.push(Token {
                kind: TokenKind::LineBreak,
                text: String::new(),
                run,
                width: 0.0,
                field: None,
            });
            continue;
        }
        if ch == '\r' {
            continue;
        }
        let is_space = ch.is_whitespace();
        if is_space != current_is_space {
            flush(&mut current, current_is_space, out);
            current_is_space = is_space;
        }
        current.push(if ch == '\t' { ' ' } else { ch });
    }
    flush(&mut current, current_is_space, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldContext, FieldValues};
    use crate::test_utils::{fixed_context, test_registry};
    use quire_style::FontWeight;

    fn kinds(shaped: &ShapedParagraph) -> Vec<(TokenKind, &str)> {
        shaped
            .tokens
            .iter()
            .map(|t| (t.kind, t.text.as_str()))
            .collect()
    }

    fn env<'a>(
        registry: &'a quire_style::StyleRegistry,
        fonts: &'a SharedFontLibrary,
        ctx: &'a FieldContext,
    ) -> LayoutEnvironment<'a> {
        LayoutEnvironment {
            styles: registry,
            fonts,
            fields: FieldValues::provisional(ctx, None),
        }
    }

    #[test]
    fn text_splits_into_words_and_spaces() {
        let registry = test_registry();
        let fonts = SharedFontLibrary::new();
        let ctx = fixed_context();
        let mut p = Paragraph::new(StyleId::NORMAL);
        p.runs.push(InlineRun::Text {
            text: "Bill To:\nMain\tSt".to_string(),
            style: None,
            format: StyleAttributes::default(),
        });
        let base = registry.resolve(StyleId::NORMAL).unwrap().clone();
        let shaped = shape_paragraph(&p, &base, &env(&registry, &fonts, &ctx)).unwrap();
        assert_eq!(
            kinds(&shaped),
            vec![
                (TokenKind::Word, "Bill"),
                (TokenKind::Space, " "),
                (TokenKind::Word, "To:"),
                (TokenKind::LineBreak, ""),
                (TokenKind::Word, "Main"),
                (TokenKind::Space, " "),
                (TokenKind::Word, "St"),
            ]
        );
        assert_eq!(shaped.runs.len(), 1);
    }

    #[test]
    fn formatted_runs_get_their_own_style() {
        let registry = test_registry();
        let fonts = SharedFontLibrary::new();
        let ctx = fixed_context();
        let mut p = Paragraph::new(StyleId::NORMAL);
        p.runs.push(InlineRun::Text {
            text: "Total".to_string(),
            style: None,
            format: StyleAttributes::new().bold(),
        });
        let base = registry.resolve(StyleId::NORMAL).unwrap().clone();
        let shaped = shape_paragraph(&p, &base, &env(&registry, &fonts, &ctx)).unwrap();
        assert_eq!(shaped.runs.len(), 2);
        assert_eq!(shaped.runs[1].font.weight, FontWeight::Bold);
        assert_eq!(shaped.tokens[0].run, 1);
        // Helvetica-Bold "Total" = 611 + 611 + 333 + 556 + 278
        assert!((shaped.tokens[0].width - 23.89).abs() < 0.001);
    }

    #[test]
    fn fields_are_single_words() {
        let registry = test_registry();
        let fonts = SharedFontLibrary::new();
        let ctx = fixed_context();
        let mut p = Paragraph::new(StyleId::NORMAL);
        p.runs.push(InlineRun::Field {
            field: DynamicField::date("%Y-%m-%d %H:%M"),
            style: None,
            format: StyleAttributes::default(),
        });
        let base = registry.resolve(StyleId::NORMAL).unwrap().clone();
        let shaped = shape_paragraph(&p, &base, &env(&registry, &fonts, &ctx)).unwrap();
        assert_eq!(shaped.tokens.len(), 1);
        assert_eq!(shaped.tokens[0].kind, TokenKind::Word);
        assert_eq!(shaped.tokens[0].text, "2024-03-09 14:05");
        assert!(shaped.tokens[0].field.is_some());
    }
}
