//! Core rendering abstractions for PDF generation.
//!
//! This crate provides the pieces shared by rendering backends:
//! - the `DocumentRenderer` trait, abstracting the PDF-writing steps
//! - `RenderError` and `RenderConfig`
//! - text encoding, color and coordinate helpers

mod config;
mod error;
mod traits;
pub mod utils;

pub use config::RenderConfig;
pub use error::RenderError;
pub use traits::DocumentRenderer;
