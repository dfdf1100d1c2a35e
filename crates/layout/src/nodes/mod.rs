//! Measured forms of the document's block types, ready to be placed.

pub(crate) mod paragraph;
pub(crate) mod table;

pub(crate) use paragraph::ParagraphLayout;
pub(crate) use table::TableLayout;
