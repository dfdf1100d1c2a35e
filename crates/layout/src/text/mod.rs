//! Text measurement and line breaking.
//!
//! [`shaper`] turns a paragraph's inline runs into measured tokens;
//! [`wrapper`] breaks the tokens into aligned lines for a given width.

pub(crate) mod shaper;
pub(crate) mod wrapper;

pub(crate) use shaper::{RunStyle, shape_paragraph};
pub(crate) use wrapper::{LineLayout, break_lines};
