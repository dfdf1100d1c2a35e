use crate::fonts::register_fonts;
use crate::helpers::render_page_content;
use crate::writer::StreamingPdfWriter;
use lopdf::{Dictionary, Object, ObjectId, StringFormat, dictionary};
use quire_layout::{LaidOutPage, PaginatedLayout};
use quire_render_core::utils::{pdf_date, pdf_text};
use quire_render_core::{DocumentRenderer, RenderConfig, RenderError};
use std::collections::HashMap;
use std::io::{Cursor, Seek, Write};

const PDF_VERSION: &str = "1.7";

/// Renders a finished layout into PDF bytes.
#[derive(Debug, Clone, Default)]
pub struct LopdfRenderer {
    config: RenderConfig,
}

impl LopdfRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn render(&self, layout: &PaginatedLayout) -> Result<Vec<u8>, RenderError> {
        let mut renderer = LopdfDocumentRenderer::new(self.config.clone());
        renderer.begin_document(Cursor::new(Vec::new()), layout)?;
        for page in &layout.pages {
            renderer.render_page(page)?;
        }
        Ok(renderer.finish()?.into_inner())
    }
}

/// The step-wise [`DocumentRenderer`] behind [`LopdfRenderer`].
pub struct LopdfDocumentRenderer<W: Write + Seek + Send> {
    config: RenderConfig,
    writer: Option<StreamingPdfWriter<W>>,
    font_names: HashMap<String, String>,
    page_ids: Vec<ObjectId>,
}

impl<W: Write + Seek + Send> LopdfDocumentRenderer<W> {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            writer: None,
            font_names: HashMap::new(),
            page_ids: Vec::new(),
        }
    }

    fn writer(&mut self) -> Result<&mut StreamingPdfWriter<W>, RenderError> {
        self.writer
            .as_mut()
            .ok_or_else(|| RenderError::Other("Document not started".into()))
    }

    fn info(&self, layout: &PaginatedLayout) -> Dictionary {
        let mut info = dictionary! {
            "Producer" => Object::String(pdf_text(&self.config.producer), StringFormat::Literal),
        };
        if let Some(title) = &layout.title {
            info.set("Title", Object::String(pdf_text(title), StringFormat::Literal));
        }
        if let Some(at) = &layout.generated_at {
            info.set(
                "CreationDate",
                Object::String(pdf_date(at).into_bytes(), StringFormat::Literal),
            );
        }
        info
    }
}

impl<W: Write + Seek + Send> DocumentRenderer<W> for LopdfDocumentRenderer<W> {
    fn begin_document(&mut self, writer: W, layout: &PaginatedLayout) -> Result<(), RenderError> {
        let mut writer = StreamingPdfWriter::new(writer, PDF_VERSION, self.config.compress)?;
        let (fonts, names) = register_fonts(&mut writer, &layout.fonts, &layout.pages)?;
        let resources = dictionary! {
            "Font" => fonts,
            "ProcSet" => vec![Object::Name(b"PDF".to_vec()), Object::Name(b"Text".to_vec())],
        };
        let resources_id = writer.resources_id;
        writer.buffer_object_at_id(resources_id, resources.into());
        writer.set_catalog_entry("PageLayout", Object::Name(b"SinglePage".to_vec()));
        writer.set_catalog_entry("ViewerPreferences", dictionary! { "FitWindow" => true });
        writer.set_info(self.info(layout));

        log::debug!(
            "Starting PDF with {} fonts for {} pages",
            names.len(),
            layout.pages.len()
        );
        self.font_names = names;
        self.page_ids.clear();
        self.writer = Some(writer);
        Ok(())
    }

    fn render_page(&mut self, page: &LaidOutPage) -> Result<ObjectId, RenderError> {
        let content = render_page_content(page, &self.font_names)?;
        let writer = self.writer()?;
        let content_id = writer.buffer_content_stream(content)?;
        let page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => writer.pages_id,
            "MediaBox" => vec![0.0.into(), 0.0.into(), page.width.into(), page.height.into()],
            "Contents" => content_id,
            "Resources" => writer.resources_id,
        };
        let page_id = writer.buffer_object(page_dict.into());
        self.page_ids.push(page_id);
        Ok(page_id)
    }

    fn finish(mut self) -> Result<W, RenderError> {
        let mut writer = self
            .writer
            .take()
            .ok_or_else(|| RenderError::Other("Document not started".into()))?;
        writer.set_page_ids(std::mem::take(&mut self.page_ids));
        Ok(writer.finish()?)
    }
}
