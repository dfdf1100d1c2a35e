use super::shaper::{RunStyle, ShapedParagraph, Token, TokenKind};
use crate::algorithms::pagination::EPSILON;
use quire_idf::DynamicField;
use quire_style::TextAlign;

#[derive(Debug, Clone)]
pub(crate) struct LineLayout {
    pub items: Vec<LineItem>,
    /// Natural width of the content, before alignment.
    pub width: f32,
    pub height: f32,
    /// Offset of the baseline from the top of the line.
    pub baseline: f32,
}

#[derive(Debug, Clone)]
pub(crate) struct LineItem {
    pub run: usize,
    pub text: String,
    /// Offset from the left edge of the paragraph box, alignment applied.
    pub x: f32,
    pub width: f32,
    pub field: Option<DynamicField>,
}

#[derive(Debug)]
struct PendingLine {
    items: Vec<LineItem>,
    width: f32,
    /// Run whose metrics size the line when it has no content.
    run_hint: usize,
    has_words: bool,
}

impl PendingLine {
    fn new(run_hint: usize) -> Self {
        Self {
            items: Vec::new(),
            width: 0.0,
            run_hint,
            has_words: false,
        }
    }

    fn push(&mut self, run: usize, text: String, width: f32, field: Option<DynamicField>, word: bool) {
        self.items.push(LineItem {
            run,
            text,
            x: self.width,
            width,
            field,
        });
        self.width += width;
        self.has_words |= word;
    }
}

/// Greedy line breaking. Lines break at whitespace; a word wider than a whole
/// line is broken between characters. Whitespace at a wrap point is dropped.
/// Always returns at least one line.
pub(crate) fn break_lines(
    shaped: &ShapedParagraph,
    max_width: f32,
    align: TextAlign,
) -> Vec<LineLayout> {
    let runs = &shaped.runs;
    let mut lines = Vec::new();
    let mut current = PendingLine::new(0);
    let mut pending_spaces: Vec<&Token> = Vec::new();
    let mut ended_by_break = false;

    for token in &shaped.tokens {
        ended_by_break = false;
        match token.kind {
            TokenKind::LineBreak => {
                pending_spaces.clear();
                let done = std::mem::replace(&mut current, PendingLine::new(token.run));
                lines.push(finalize(done, runs, max_width, align, true));
                ended_by_break = true;
            }
            TokenKind::Space => pending_spaces.push(token),
            TokenKind::Word => {
                let spaces: f32 = pending_spaces.iter().map(|t| t.width).sum();
                if current.has_words && current.width + spaces + token.width > max_width + EPSILON {
                    let done = std::mem::replace(&mut current, PendingLine::new(token.run));
                    lines.push(finalize(done, runs, max_width, align, false));
                } else if current.has_words {
                    for space in &pending_spaces {
                        current.push(space.run, space.text.clone(), space.width, None, false);
                    }
                }
                pending_spaces.clear();

                if !current.has_words
                    && token.field.is_none()
                    && token.width > max_width + EPSILON
                    && max_width > 0.0
                {
                    let style = &runs[token.run];
                    let mut pieces = split_word(&token.text, style, max_width).into_iter().peekable();
                    while let Some(piece) = pieces.next() {
                        let width = style.width(&piece);
                        current.push(token.run, piece, width, None, true);
                        if pieces.peek().is_some() {
                            let done = std::mem::replace(&mut current, PendingLine::new(token.run));
                            lines.push(finalize(done, runs, max_width, align, false));
                        }
                    }
                } else {
                    current.push(token.run, token.text.clone(), token.width, token.field.clone(), true);
                }
            }
        }
    }

    if current.has_words || lines.is_empty() || ended_by_break {
        lines.push(finalize(current, runs, max_width, align, true));
    }
    lines
}

/// Breaks a word into pieces no wider than `max_width`, keeping at least one
/// character per piece.
fn split_word(word: &str, style: &RunStyle, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for ch in word.chars() {
        piece.push(ch);
        if piece.chars().count() > 1 && style.width(&piece) > max_width + EPSILON {
            piece.pop();
            pieces.push(std::mem::take(&mut piece));
            piece.push(ch);
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

fn finalize(
    line: PendingLine,
    runs: &[RunStyle],
    max_width: f32,
    align: TextAlign,
    last_of_paragraph: bool,
) -> LineLayout {
    let PendingLine {
        mut items,
        width,
        run_hint,
        ..
    } = line;

    let (mut height, mut ascent, mut descent) = (0.0f32, 0.0f32, 0.0f32);
    let mut sized = false;
    for run in items.iter().map(|i| &runs[i.run]) {
        height = height.max(run.line_height);
        ascent = ascent.max(run.ascent);
        descent = descent.max(run.descent);
        sized = true;
    }
    if !sized {
        let run = &runs[run_hint];
        (height, ascent, descent) = (run.line_height, run.ascent, run.descent);
    }
    let baseline = (height - (ascent + descent)) / 2.0 + ascent;

    let free = (max_width - width).max(0.0);
    let justify = align == TextAlign::Justify && !last_of_paragraph;
    if justify {
        let gaps = items.iter().filter(|i| is_space(&i.text)).count();
        if gaps > 0 {
            let extra = free / gaps as f32;
            let mut shift = 0.0;
            for item in &mut items {
                item.x += shift;
                if is_space(&item.text) {
                    item.width += extra;
                    shift += extra;
                }
            }
        }
    } else {
        let offset = match align {
            TextAlign::Left | TextAlign::Justify => 0.0,
            TextAlign::Center => free / 2.0,
            TextAlign::Right => free,
        };
        items = merge_items(items);
        for item in &mut items {
            item.x += offset;
        }
    }

    LineLayout {
        items,
        width,
        height,
        baseline,
    }
}

fn is_space(text: &str) -> bool {
    !text.is_empty() && text.chars().all(char::is_whitespace)
}

/// Joins neighbouring items set in the same run so each line draws as few
/// text elements as possible. Fields stay separate.
fn merge_items(items: Vec<LineItem>) -> Vec<LineItem> {
    let mut merged: Vec<LineItem> = Vec::with_capacity(items.len());
    for item in items {
        match merged.last_mut() {
            Some(prev) if prev.run == item.run && prev.field.is_none() && item.field.is_none() => {
                prev.text.push_str(&item.text);
                prev.width += item.width;
            }
            _ => merged.push(item),
        }
    }
    merged
}
