//! The named styles invoice documents are composed with.

use crate::config::ConfigError;
use quire_style::{StyleAttributes, StyleId, StyleRegistry};
use quire_types::Color;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Typed handles to every style an invoice document uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceStyles {
    pub normal: StyleId,
    pub header: StyleId,
    pub subheader: StyleId,
    pub label: StyleId,
    pub value: StyleId,
    pub table_header: StyleId,
    pub table_cell: StyleId,
    pub total: StyleId,
}

impl InvoiceStyles {
    pub const NAMES: [&'static str; 8] = [
        "Normal",
        "Header",
        "Subheader",
        "Label",
        "Value",
        "TableHeader",
        "TableCell",
        "Total",
    ];

    /// Builds a registry with the invoice styles, applying `overrides` on top
    /// of the built-in attributes. Overrides of `Normal` carry through to
    /// every style.
    pub fn registry(
        overrides: &BTreeMap<String, StyleAttributes>,
    ) -> Result<(Arc<StyleRegistry>, InvoiceStyles), ConfigError> {
        if let Some(unknown) = overrides.keys().find(|k| !Self::NAMES.contains(&k.as_str())) {
            return Err(ConfigError::UnknownStyle(unknown.clone()));
        }
        let with = |name: &str, attributes: StyleAttributes| match overrides.get(name) {
            Some(o) => attributes.merge(o),
            None => attributes,
        };

        let normal = StyleAttributes::new().font_family("Arial").font_size(10.0);
        let mut registry = StyleRegistry::with_normal(with("Normal", normal))?;
        let mut define = |name: &str, attributes: StyleAttributes| {
            registry.define(name, with(name, attributes), None)
        };

        let header = define(
            "Header",
            StyleAttributes::new()
                .font_size(24.0)
                .bold()
                .color(Color::DARK_BLUE)
                .space_before(0.0)
                .space_after(12.0),
        )?;
        let subheader = define(
            "Subheader",
            StyleAttributes::new()
                .font_size(14.0)
                .bold()
                .color(Color::DARK_BLUE)
                .space_before(12.0)
                .space_after(6.0),
        )?;
        let label = define("Label", StyleAttributes::new().bold().font_size(9.0))?;
        let value = define("Value", StyleAttributes::new().font_size(9.0))?;
        let table_header = define(
            "TableHeader",
            StyleAttributes::new().bold().font_size(9.0).color(Color::WHITE),
        )?;
        let table_cell = define("TableCell", StyleAttributes::new().font_size(9.0))?;
        let total = define(
            "Total",
            StyleAttributes::new()
                .bold()
                .font_size(12.0)
                .color(Color::DARK_BLUE),
        )?;

        let styles = InvoiceStyles {
            normal: StyleId::NORMAL,
            header,
            subheader,
            label,
            value,
            table_header,
            table_cell,
            total,
        };
        Ok((Arc::new(registry), styles))
    }
}
