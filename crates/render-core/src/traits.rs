use crate::error::RenderError;
use lopdf::ObjectId;
use quire_layout::{LaidOutPage, PaginatedLayout};
use std::io::{Seek, Write};

/// A trait for document renderers, abstracting the PDF-writing steps.
///
/// A renderer is driven in order: `begin_document` once, `render_page` for
/// every page, then `finish`, which hands back the writer.
pub trait DocumentRenderer<W: Write + Seek + Send> {
    /// Starts the document and registers every font the layout uses.
    fn begin_document(&mut self, writer: W, layout: &PaginatedLayout) -> Result<(), RenderError>;

    /// Writes one page's content stream and page object.
    fn render_page(&mut self, page: &LaidOutPage) -> Result<ObjectId, RenderError>;

    fn finish(self) -> Result<W, RenderError>
    where
        Self: Sized;
}
