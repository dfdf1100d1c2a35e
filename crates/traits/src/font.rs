//! The seam through which TrueType faces reach the font resolver.
//!
//! A provider answers one question: "do you have this exact face?". Fallback
//! policy (aliases, substitution, the built-in last resort) is the resolver's
//! job, so providers stay strict and easy to reason about.

use std::fmt::Debug;
use std::sync::{Arc, RwLock};
use thiserror::Error;

use quire_style::{FontStyle, FontWeight};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FontError {
    #[error("Font not found: {family} (weight: {weight:?}, style: {style:?})")]
    NotFound {
        family: String,
        weight: FontWeight,
        style: FontStyle,
    },

    #[error("Failed to load font '{path}': {message}")]
    LoadFailed { path: String, message: String },

    #[error("Invalid font data: {0}")]
    InvalidData(String),
}

/// Reference-counted font file bytes.
pub type SharedFontData = Arc<Vec<u8>>;

/// Describes one face held by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct FontDescriptor {
    pub family: String,
    pub weight: FontWeight,
    pub style: FontStyle,
    pub postscript_name: Option<String>,
}

impl FontDescriptor {
    pub fn new(family: impl Into<String>, weight: FontWeight, style: FontStyle) -> Self {
        Self {
            family: family.into(),
            weight,
            style,
            postscript_name: None,
        }
    }

    pub fn with_postscript_name(mut self, name: impl Into<String>) -> Self {
        self.postscript_name = Some(name.into());
        self
    }

    /// A face satisfies a query when the family matches (case-insensitively)
    /// and it agrees on boldness and slant.
    pub fn satisfies(&self, query: &FontQuery<'_>) -> bool {
        self.family.eq_ignore_ascii_case(query.family)
            && self.weight.is_bold() == query.weight.is_bold()
            && self.style.is_slanted() == query.style.is_slanted()
    }
}

/// A request for one face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontQuery<'a> {
    pub family: &'a str,
    pub weight: FontWeight,
    pub style: FontStyle,
}

impl<'a> FontQuery<'a> {
    pub fn new(family: &'a str) -> Self {
        Self {
            family,
            weight: FontWeight::Regular,
            style: FontStyle::Normal,
        }
    }

    pub fn with_weight(mut self, weight: FontWeight) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_style(mut self, style: FontStyle) -> Self {
        self.style = style;
        self
    }

    fn not_found(&self) -> FontError {
        FontError::NotFound {
            family: self.family.to_string(),
            weight: self.weight,
            style: self.style,
        }
    }
}

/// A source of TrueType faces.
///
/// Implementations must be cheap to query repeatedly; the resolver caches the
/// outcome of each distinct request, but not across libraries.
pub trait FontProvider: Send + Sync + Debug {
    /// Loads the face best matching `query`.
    ///
    /// Returns `FontError::NotFound` when no face of the family has the
    /// requested boldness and slant.
    fn load_font(&self, query: &FontQuery<'_>) -> Result<(FontDescriptor, SharedFontData), FontError>;

    fn has_font(&self, query: &FontQuery<'_>) -> bool {
        self.load_font(query).is_ok()
    }

    /// Unique family names, sorted.
    fn list_families(&self) -> Vec<String>;

    /// Name used in log output.
    fn name(&self) -> &'static str;
}

/// Faces registered from bytes already in memory.
#[derive(Debug, Default)]
pub struct InMemoryFontProvider {
    fonts: RwLock<Vec<(FontDescriptor, SharedFontData)>>,
}

impl InMemoryFontProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a face. Registering the same family/weight/style twice
    /// replaces the earlier bytes.
    pub fn add_font(
        &self,
        family: impl Into<String>,
        weight: FontWeight,
        style: FontStyle,
        data: Vec<u8>,
    ) -> Result<(), FontError> {
        self.add_font_with_descriptor(FontDescriptor::new(family, weight, style), Arc::new(data))
    }

    pub fn add_font_with_descriptor(
        &self,
        descriptor: FontDescriptor,
        data: SharedFontData,
    ) -> Result<(), FontError> {
        if data.is_empty() {
            return Err(FontError::InvalidData(format!(
                "empty font data for '{}'",
                descriptor.family
            )));
        }
        let mut fonts = self.fonts.write().map_err(|_| FontError::LoadFailed {
            path: descriptor.family.clone(),
            message: "font store lock poisoned".to_string(),
        })?;
        fonts.retain(|(d, _)| {
            !(d.family.eq_ignore_ascii_case(&descriptor.family)
                && d.weight == descriptor.weight
                && d.style == descriptor.style)
        });
        fonts.push((descriptor, data));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.fonts.read().map(|f| f.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FontProvider for InMemoryFontProvider {
    fn load_font(&self, query: &FontQuery<'_>) -> Result<(FontDescriptor, SharedFontData), FontError> {
        let fonts = self.fonts.read().map_err(|_| FontError::LoadFailed {
            path: query.family.to_string(),
            message: "font store lock poisoned".to_string(),
        })?;

        // Among acceptable faces prefer the closest numeric weight.
        let target = query.weight.numeric_value() as i32;
        fonts
            .iter()
            .filter(|(d, _)| d.satisfies(query))
            .min_by_key(|(d, _)| (d.weight.numeric_value() as i32 - target).abs())
            .map(|(d, data)| (d.clone(), data.clone()))
            .ok_or_else(|| query.not_found())
    }

    fn list_families(&self) -> Vec<String> {
        let Ok(fonts) = self.fonts.read() else {
            return Vec::new();
        };
        let mut families: Vec<_> = fonts.iter().map(|(d, _)| d.family.clone()).collect();
        families.sort();
        families.dedup();
        families
    }

    fn name(&self) -> &'static str {
        "InMemoryFontProvider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake(name: &str) -> Vec<u8> {
        name.as_bytes().to_vec()
    }

    #[test]
    fn loads_exact_face() {
        let provider = InMemoryFontProvider::new();
        provider
            .add_font("Inter", FontWeight::Regular, FontStyle::Normal, fake("regular"))
            .unwrap();
        provider
            .add_font("Inter", FontWeight::Bold, FontStyle::Normal, fake("bold"))
            .unwrap();

        let (desc, data) = provider
            .load_font(&FontQuery::new("Inter").with_weight(FontWeight::Bold))
            .unwrap();
        assert_eq!(desc.weight, FontWeight::Bold);
        assert_eq!(&*data, b"bold");
    }

    #[test]
    fn family_match_is_case_insensitive() {
        let provider = InMemoryFontProvider::new();
        provider
            .add_font("Inter", FontWeight::Regular, FontStyle::Normal, fake("x"))
            .unwrap();
        assert!(provider.has_font(&FontQuery::new("INTER")));
    }

    #[test]
    fn missing_slant_is_not_substituted() {
        let provider = InMemoryFontProvider::new();
        provider
            .add_font("Inter", FontWeight::Regular, FontStyle::Normal, fake("x"))
            .unwrap();
        let err = provider
            .load_font(&FontQuery::new("Inter").with_style(FontStyle::Italic))
            .unwrap_err();
        assert!(matches!(err, FontError::NotFound { ref family, .. } if family == "Inter"));
    }

    #[test]
    fn closest_weight_within_boldness_wins() {
        let provider = InMemoryFontProvider::new();
        provider
            .add_font("Inter", FontWeight::Bold, FontStyle::Normal, fake("700"))
            .unwrap();
        provider
            .add_font("Inter", FontWeight::Black, FontStyle::Normal, fake("900"))
            .unwrap();
        let (_, data) = provider
            .load_font(&FontQuery::new("Inter").with_weight(FontWeight::Numeric(650)))
            .unwrap();
        assert_eq!(&*data, b"700");
    }

    #[test]
    fn re_registering_replaces_face() {
        let provider = InMemoryFontProvider::new();
        provider
            .add_font("Inter", FontWeight::Regular, FontStyle::Normal, fake("old"))
            .unwrap();
        provider
            .add_font("inter", FontWeight::Regular, FontStyle::Normal, fake("new"))
            .unwrap();
        assert_eq!(provider.len(), 1);
        let (_, data) = provider.load_font(&FontQuery::new("Inter")).unwrap();
        assert_eq!(&*data, b"new");
    }

    #[test]
    fn empty_data_is_rejected() {
        let provider = InMemoryFontProvider::new();
        let err = provider
            .add_font("Inter", FontWeight::Regular, FontStyle::Normal, Vec::new())
            .unwrap_err();
        assert!(matches!(err, FontError::InvalidData(_)));
        assert!(provider.is_empty());
    }

    #[test]
    fn families_are_sorted_and_unique() {
        let provider = InMemoryFontProvider::new();
        provider
            .add_font("Roboto", FontWeight::Regular, FontStyle::Normal, fake("a"))
            .unwrap();
        provider
            .add_font("Inter", FontWeight::Bold, FontStyle::Normal, fake("b"))
            .unwrap();
        provider
            .add_font("Inter", FontWeight::Regular, FontStyle::Normal, fake("c"))
            .unwrap();
        assert_eq!(provider.list_families(), vec!["Inter", "Roboto"]);
    }
}
