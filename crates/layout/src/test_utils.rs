use crate::fields::FieldContext;
use chrono::NaiveDate;
use quire_idf::{Document, DocumentBuilder};
use quire_style::{StyleAttributes, StyleRegistry};
use quire_types::Color;
use std::sync::Arc;

pub fn fixed_context() -> FieldContext {
    FieldContext::at(
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap(),
    )
}

/// `Normal` plus a bold `Heading` and a larger `Title`.
pub fn test_registry() -> StyleRegistry {
    let mut registry = StyleRegistry::new();
    registry
        .define(
            "Heading",
            StyleAttributes::new().font_size(12.0).bold().space_after(6.0),
            None,
        )
        .unwrap();
    registry
        .define(
            "Title",
            StyleAttributes::new()
                .font_size(20.0)
                .bold()
                .color(Color::rgb(0, 32, 96)),
            Some("Heading"),
        )
        .unwrap();
    registry
}

pub fn builder() -> DocumentBuilder {
    DocumentBuilder::new(Arc::new(test_registry()))
}

pub fn build(builder: DocumentBuilder) -> Document {
    builder.build().expect("test document is valid")
}
