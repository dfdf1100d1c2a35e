pub mod fixtures;
pub mod pdf_assertions;

use chrono::{NaiveDate, NaiveDateTime};
use lopdf::Document as LopdfDocument;
use quire::{EngineConfig, Generator, InvoiceRecord, PipelineError};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// The generation time every test document shows.
pub fn fixed_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 9)
        .and_then(|d| d.and_hms_opt(14, 5, 7))
        .expect("valid timestamp")
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn generator() -> Generator {
    generator_with(EngineConfig::default())
}

pub fn generator_with(config: EngineConfig) -> Generator {
    init_logging();
    Generator::new(config)
        .expect("test configuration is valid")
        .with_generated_at(fixed_time())
}

/// Wrapper around a generated PDF with helper methods
pub struct GeneratedPdf {
    pub bytes: Vec<u8>,
    pub doc: LopdfDocument,
}

impl GeneratedPdf {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, Box<dyn std::error::Error>> {
        let doc = LopdfDocument::load_mem(&bytes)?;
        Ok(Self { bytes, doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// The strings shown on a 1-based page, in drawing order.
    pub fn page_strings(&self, page: u32) -> Vec<String> {
        pdf_assertions::shown_strings(&self.doc, page)
    }

    /// All text on a 1-based page, concatenated.
    pub fn page_text(&self, page: u32) -> String {
        self.page_strings(page).concat()
    }

    /// Save PDF to a file for manual debugging
    #[allow(dead_code)]
    pub fn save_for_debug(&self, name: &str) -> std::io::Result<()> {
        std::fs::write(format!("test_output_{}.pdf", name), &self.bytes)
    }
}

pub fn generate_batch(records: &[InvoiceRecord]) -> Result<GeneratedPdf, PipelineError> {
    let bytes = generator().generate_batch(records)?;
    Ok(GeneratedPdf::from_bytes(bytes).expect("generated PDF parses"))
}
