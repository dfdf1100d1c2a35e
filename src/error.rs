use crate::config::ConfigError;
use quire_idf::BuildError;
use quire_layout::LayoutError;
use quire_render_core::RenderError;
use quire_style::StyleError;
use thiserror::Error;

/// A comprehensive error type for the invoice generation pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration is invalid: {0}")]
    Config(#[from] ConfigError),

    #[error("Document is malformed: {0}")]
    Build(#[from] BuildError),

    #[error("Layout failed: {0}")]
    Layout(#[from] LayoutError),

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{failed} of {total} invoice(s) could not be written")]
    Incomplete { failed: usize, total: usize },
}

// Style definitions are configuration, whichever layer reports them.
impl From<StyleError> for PipelineError {
    fn from(e: StyleError) -> Self {
        PipelineError::Config(ConfigError::Style(e))
    }
}
