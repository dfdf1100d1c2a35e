//! PDF renderer using lopdf.
//!
//! Objects are built with lopdf's object model and serialized by a small
//! writer of our own, so output is a pure function of the laid-out document.

mod fonts;
mod helpers;
mod renderer;
mod writer;

pub use helpers::render_page_content;
pub use renderer::{LopdfDocumentRenderer, LopdfRenderer};
pub use writer::StreamingPdfWriter;
