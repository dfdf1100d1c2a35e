//! The end-to-end generation pipeline: compose, paginate, render.

use crate::config::EngineConfig;
use crate::error::PipelineError;
use crate::invoice::{InvoiceComposer, InvoiceRecord, InvoiceStyles};
use chrono::{NaiveDate, NaiveDateTime};
use quire_idf::Document;
use quire_layout::{FieldContext, LayoutEngine, PaginatedLayout};
use quire_render_lopdf::LopdfRenderer;
use quire_style::StyleRegistry;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Generates invoice PDFs for one configuration.
///
/// Building a generator loads fonts and defines styles once; every call then
/// shares them read-only, so a generator can serve many threads.
#[derive(Debug, Clone)]
pub struct Generator {
    config: EngineConfig,
    registry: Arc<StyleRegistry>,
    styles: InvoiceStyles,
    engine: LayoutEngine,
    renderer: LopdfRenderer,
    generated_at: Option<NaiveDateTime>,
}

impl Generator {
    pub fn new(config: EngineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let (registry, styles) = InvoiceStyles::registry(&config.styles)?;
        let engine = LayoutEngine::new(config.font_library()?, config.layout_config());
        let renderer = LopdfRenderer::new(config.render_config());
        Ok(Self {
            config,
            registry,
            styles,
            engine,
            renderer,
            generated_at: None,
        })
    }

    /// Pins the timestamp shown by date fields. Without it every call uses
    /// the local time at the moment of the call.
    pub fn with_generated_at(mut self, at: NaiveDateTime) -> Self {
        self.generated_at = Some(at);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn styles(&self) -> &Arc<StyleRegistry> {
        &self.registry
    }

    fn composer(&self) -> InvoiceComposer<'_> {
        InvoiceComposer::new(&self.config, self.registry.clone(), self.styles)
    }

    fn field_context(&self) -> FieldContext {
        self.generated_at.map(FieldContext::at).unwrap_or_else(FieldContext::now)
    }

    /// The summary page followed by one page group per record.
    pub fn generate_batch(&self, records: &[InvoiceRecord]) -> Result<Vec<u8>, PipelineError> {
        log::info!("Generating batch of {} invoice(s)", records.len());
        let document = self.composer().batch_document(records)?;
        self.render_document(&document, &self.field_context())
    }

    /// One record as a standalone document.
    pub fn generate_single(&self, record: &InvoiceRecord) -> Result<Vec<u8>, PipelineError> {
        self.generate_single_at(record, &self.field_context())
    }

    /// One standalone document per record, generated in parallel. All
    /// documents show the same generation time.
    pub fn generate_each(&self, records: &[InvoiceRecord]) -> Vec<Result<Vec<u8>, PipelineError>> {
        log::info!("Generating {} separate invoice(s)", records.len());
        let context = self.field_context();

        #[cfg(feature = "rayon-executor")]
        {
            use rayon::prelude::*;
            records
                .par_iter()
                .map(|record| self.generate_single_at(record, &context))
                .collect()
        }
        #[cfg(not(feature = "rayon-executor"))]
        {
            records
                .iter()
                .map(|record| self.generate_single_at(record, &context))
                .collect()
        }
    }

    /// Writes one PDF per record into `dir`, named by `single_file_name`.
    /// A record that fails does not stop the others; the call still fails
    /// with [`PipelineError::Incomplete`] once every record has been tried.
    pub fn write_each(
        &self,
        records: &[InvoiceRecord],
        dir: &Path,
    ) -> Result<Vec<PathBuf>, PipelineError> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(records.len());
        let mut failed = 0;
        for (index, result) in self.generate_each(records).into_iter().enumerate() {
            let path = dir.join(single_file_name(&records[index], index));
            match result.and_then(|bytes| fs::write(&path, bytes).map_err(PipelineError::from)) {
                Ok(()) => {
                    log::info!("Wrote {}", path.display());
                    written.push(path);
                }
                Err(e) => {
                    failed += 1;
                    log::error!("Invoice {} failed: {e}", index + 1);
                }
            }
        }
        if failed > 0 {
            return Err(PipelineError::Incomplete {
                failed,
                total: records.len(),
            });
        }
        Ok(written)
    }

    fn generate_single_at(
        &self,
        record: &InvoiceRecord,
        context: &FieldContext,
    ) -> Result<Vec<u8>, PipelineError> {
        let document = self.composer().single_document(record)?;
        self.render_document(&document, context)
    }

    pub fn paginate(
        &self,
        document: &Document,
        context: &FieldContext,
    ) -> Result<PaginatedLayout, PipelineError> {
        Ok(self.engine.paginate(document, context)?)
    }

    /// Lays out and renders a composed document.
    pub fn render_document(
        &self,
        document: &Document,
        context: &FieldContext,
    ) -> Result<Vec<u8>, PipelineError> {
        let layout = self.paginate(document, context)?;
        let bytes = self.renderer.render(&layout)?;
        log::info!(
            "Rendered {} page(s) in {} layout pass(es), {} bytes",
            layout.total_pages,
            layout.passes,
            bytes.len()
        );
        Ok(bytes)
    }
}

/// `Invoice_Batch_Report_YYYY-MM-DD.pdf`
pub fn batch_file_name(date: NaiveDate) -> String {
    format!("Invoice_Batch_Report_{}.pdf", date.format("%Y-%m-%d"))
}

/// File name for a standalone invoice, from its number when it has one.
pub fn single_file_name(record: &InvoiceRecord, index: usize) -> String {
    let number = record
        .invoice_number
        .as_deref()
        .map(|n| {
            n.trim()
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
                .collect::<String>()
        })
        .filter(|n| !n.is_empty());
    match number {
        Some(n) => format!("Invoice_{n}.pdf"),
        None => format!("Invoice_{}.pdf", index + 1),
    }
}
