//! Layout engine: turns a validated [`quire_idf::Document`] into positioned
//! pages ready for rendering.
//!
//! Layout is deterministic. Every measurement goes through the same
//! [`fonts::FontMetrics`] tables the renderer writes into the PDF, and dynamic
//! fields that depend on pagination are settled by re-running layout until the
//! page count stops changing.

use quire_style::StyleError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("Illegal paginator transition from {from:?} to {to:?}.")]
    StateTransition {
        from: PaginatorState,
        to: PaginatorState,
    },
    #[error("Invalid date field format '{0}'.")]
    InvalidFieldFormat(String),
    #[error(transparent)]
    Style(#[from] StyleError),
    #[error("Generic layout error: {0}")]
    Generic(String),
}

pub mod algorithms;
pub mod config;
mod engine;
pub mod fields;
pub mod fonts;
pub mod interface;
mod nodes;
pub mod output;
mod paginator;
mod text;

pub use self::config::LayoutConfig;
pub use self::engine::LayoutEngine;
pub use self::fields::{FieldContext, format_date};
pub use self::fonts::{FontFace, SharedFontLibrary};
pub use self::interface::PaginatorState;
pub use self::output::{
    LaidOutPage, LayoutElement, LineBox, LineElement, PaginatedLayout, PositionedElement,
    RectElement, TextElement,
};

#[cfg(test)]
mod test_utils;
