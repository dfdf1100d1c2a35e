//! Installed system fonts, discovered through `fontdb`.

use quire_style::{FontStyle, FontWeight};
use quire_traits::{FontDescriptor, FontError, FontProvider, FontQuery, SharedFontData};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SystemFontProvider {
    db: Arc<fontdb::Database>,
}

impl Default for SystemFontProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemFontProvider {
    /// Scans the platform's font directories.
    pub fn new() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        log::debug!("Discovered {} system font faces", db.len());
        Self { db: Arc::new(db) }
    }

    /// Scans only the given directory.
    pub fn from_dir<P: AsRef<Path>>(path: P) -> Self {
        let mut db = fontdb::Database::new();
        db.load_fonts_dir(path);
        Self { db: Arc::new(db) }
    }
}

impl FontProvider for SystemFontProvider {
    fn load_font(&self, query: &FontQuery<'_>) -> Result<(FontDescriptor, SharedFontData), FontError> {
        let not_found = || FontError::NotFound {
            family: query.family.to_string(),
            weight: query.weight,
            style: query.style,
        };
        let id = self
            .db
            .query(&fontdb::Query {
                families: &[fontdb::Family::Name(query.family)],
                weight: fontdb::Weight(query.weight.numeric_value()),
                stretch: fontdb::Stretch::Normal,
                style: map_style(query.style),
            })
            .ok_or_else(not_found)?;
        let info = self.db.face(id).ok_or_else(not_found)?;

        let descriptor = FontDescriptor {
            family: info
                .families
                .first()
                .map(|(name, _)| name.clone())
                .unwrap_or_else(|| query.family.to_string()),
            weight: FontWeight::Numeric(info.weight.0),
            style: match info.style {
                fontdb::Style::Normal => FontStyle::Normal,
                fontdb::Style::Italic => FontStyle::Italic,
                fontdb::Style::Oblique => FontStyle::Oblique,
            },
            postscript_name: Some(info.post_script_name.clone()),
        };
        // fontdb picks the nearest face in the family; a regular face is not an
        // acceptable answer to a bold request.
        if !descriptor.satisfies(query) || info.index != 0 {
            return Err(not_found());
        }

        let data = self
            .db
            .with_face_data(id, |data, _| data.to_vec())
            .ok_or_else(|| FontError::LoadFailed {
                path: info.post_script_name.clone(),
                message: "face data is no longer available".to_string(),
            })?;
        Ok((descriptor, Arc::new(data)))
    }

    fn list_families(&self) -> Vec<String> {
        let mut families: Vec<String> = self
            .db
            .faces()
            .filter_map(|f| f.families.first().map(|(name, _)| name.clone()))
            .collect();
        families.sort();
        families.dedup();
        families
    }

    fn name(&self) -> &'static str {
        "SystemFontProvider"
    }
}

fn map_style(s: FontStyle) -> fontdb::Style {
    match s {
        FontStyle::Normal => fontdb::Style::Normal,
        FontStyle::Italic => fontdb::Style::Italic,
        FontStyle::Oblique => fontdb::Style::Oblique,
    }
}
