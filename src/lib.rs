//! Utility invoice PDFs.
//!
//! Records are composed into a [`quire_idf::Document`] with the invoice
//! styles, paginated by [`quire_layout::LayoutEngine`] and written by
//! [`quire_render_lopdf::LopdfRenderer`]. [`Generator`] wires the three
//! together for a fixed [`EngineConfig`].

pub mod config;
pub mod error;
pub mod invoice;
pub mod pipeline;

pub use config::{ConfigError, EngineConfig, FontFileConfig};
pub use error::PipelineError;
pub use invoice::{InvoiceComposer, InvoiceRecord, InvoiceStyles, LineItem};
pub use pipeline::{Generator, batch_file_name, single_file_name};

pub use quire_idf as idf;
pub use quire_layout as layout;
pub use quire_render_lopdf as render;
pub use quire_style as style;
