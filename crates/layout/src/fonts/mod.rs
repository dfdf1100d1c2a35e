//! Font library abstraction for the layout engine.
//!
//! `SharedFontLibrary` maps a requested family, weight and slant to a
//! [`FontFace`] that both the layout engine (for metrics) and the renderer
//! (for font dictionaries and embedding) use.
//!
//! ## Resolution order
//!
//! 1. TrueType faces from the registered [`FontProvider`]s, in order.
//! 2. The built-in base fonts by canonical name (Helvetica, Times, Courier).
//! 3. Metric-compatible aliases of the base fonts (`Arial` is set in Helvetica).
//! 4. The configured fallback family, keeping the requested weight and slant.
//! 5. Built-in Helvetica.
//!
//! Resolution never fails. Steps 4 and 5 log a warning the first time a given
//! request misses; results are cached per request.

mod encoding;
mod metrics;
mod standard;
#[cfg(feature = "system-fonts")]
mod system;

pub use encoding::{to_win_ansi, win_ansi_char, win_ansi_code};
pub use metrics::{FontMetrics, Glyph};
pub use standard::{StandardFamily, StandardFont};
#[cfg(feature = "system-fonts")]
pub use system::SystemFontProvider;

use quire_style::{FontStyle, FontWeight};
use quire_traits::{FontDescriptor, FontError, FontProvider, FontQuery, SharedFontData};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Where a face's glyphs come from.
#[derive(Debug, Clone, PartialEq)]
pub enum FontSource {
    /// A base font every PDF viewer provides; referenced, never embedded.
    Standard(StandardFont),
    /// A TrueType program embedded into the output.
    TrueType(SharedFontData),
}

/// A concrete face with its metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct FontFace {
    pub postscript_name: String,
    pub family: String,
    pub weight: FontWeight,
    pub style: FontStyle,
    pub source: FontSource,
    pub metrics: FontMetrics,
}

impl FontFace {
    pub fn standard(font: StandardFont) -> Self {
        Self {
            postscript_name: font.postscript_name().to_string(),
            family: font.family.name().to_string(),
            weight: font.weight(),
            style: font.style(),
            source: FontSource::Standard(font),
            metrics: FontMetrics::standard(font),
        }
    }

    /// Parses a TrueType face. Fails with `FontError::InvalidData` when the
    /// bytes are not a usable font.
    pub fn true_type(descriptor: FontDescriptor, data: SharedFontData) -> Result<Self, FontError> {
        let metrics = FontMetrics::true_type(&data)?;
        let postscript_name = descriptor
            .postscript_name
            .clone()
            .or_else(|| extract_postscript_name(&data))
            .unwrap_or_else(|| {
                format!(
                    "{}-{}{}",
                    descriptor.family.replace(' ', ""),
                    descriptor.weight.numeric_value(),
                    if descriptor.style.is_slanted() { "Italic" } else { "" }
                )
            });
        Ok(Self {
            postscript_name,
            family: descriptor.family,
            weight: descriptor.weight,
            style: descriptor.style,
            source: FontSource::TrueType(data),
            metrics,
        })
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self.source, FontSource::TrueType(_))
    }

    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        self.metrics.text_width(text, size)
    }

    /// The bytes of a PDF string showing `text` in this face: WinAnsi codes
    /// for base fonts, big-endian glyph ids for embedded faces. Characters
    /// an embedded face lacks are shown as `.notdef`.
    pub fn encode_text(&self, text: &str) -> Vec<u8> {
        if !self.metrics.is_unicode() {
            return to_win_ansi(text);
        }
        text.chars()
            .flat_map(|c| self.metrics.glyph(c).map_or(0, |g| g.id).to_be_bytes())
            .collect()
    }
}

/// Extracts the PostScript name (name ID 6), falling back to the full name.
fn extract_postscript_name(data: &[u8]) -> Option<String> {
    let face = ttf_parser::Face::parse(data, 0).ok()?;
    let find = |id| {
        face.names()
            .into_iter()
            .find(|n| n.name_id == id)
            .and_then(|n| n.to_string())
    };
    find(ttf_parser::name_id::POST_SCRIPT_NAME)
        .or_else(|| find(ttf_parser::name_id::FULL_NAME).map(|n| n.replace(' ', "")))
}

/// Key for the resolution cache.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct FontCacheKey {
    family: String,
    weight: u16,
    style: u8, // 0=Normal, 1=Italic, 2=Oblique
}

impl FontCacheKey {
    fn new(family: &str, weight: FontWeight, style: FontStyle) -> Self {
        Self {
            family: family.trim().to_lowercase(),
            weight: weight.numeric_value(),
            style: style_to_u8(style),
        }
    }
}

fn style_to_u8(s: FontStyle) -> u8 {
    match s {
        FontStyle::Normal => 0,
        FontStyle::Italic => 1,
        FontStyle::Oblique => 2,
    }
}

enum Resolution {
    Exact(Arc<FontFace>),
    Alias(Arc<FontFace>),
    Fallback { face: Arc<FontFace>, cause: FontError },
}

/// A thread-safe, cloneable handle to the font sources and the resolution
/// cache. Clones share the cache.
#[derive(Clone)]
pub struct SharedFontLibrary {
    providers: Vec<Arc<dyn FontProvider>>,
    fallback_family: Arc<str>,
    cache: Arc<RwLock<HashMap<FontCacheKey, Arc<FontFace>>>>,
}

impl fmt::Debug for SharedFontLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let providers: Vec<_> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("SharedFontLibrary")
            .field("providers", &providers)
            .field("fallback_family", &self.fallback_family)
            .finish()
    }
}

impl Default for SharedFontLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedFontLibrary {
    /// A library with only the built-in base fonts, falling back to Helvetica.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            fallback_family: Arc::from("Helvetica"),
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Adds a source of TrueType faces. Earlier providers take precedence.
    pub fn with_provider(mut self, provider: Arc<dyn FontProvider>) -> Self {
        self.providers.push(provider);
        self.clear_cache();
        self
    }

    /// Sets the family substituted for unavailable requests.
    pub fn with_fallback_family(mut self, family: impl Into<String>) -> Self {
        self.fallback_family = Arc::from(family.into());
        self.clear_cache();
        self
    }

    /// Adds installed system fonts as a provider.
    #[cfg(feature = "system-fonts")]
    pub fn with_system_fonts(self) -> Self {
        self.with_provider(Arc::new(SystemFontProvider::new()))
    }

    pub fn fallback_family(&self) -> &str {
        &self.fallback_family
    }

    fn clear_cache(&mut self) {
        // A fresh map, so clones made before reconfiguration keep their own.
        self.cache = Arc::new(RwLock::new(HashMap::new()));
    }

    /// Resolves a face for the request. Never fails.
    pub fn resolve(&self, family: &str, weight: FontWeight, style: FontStyle) -> Arc<FontFace> {
        let key = FontCacheKey::new(family, weight, style);
        if let Ok(cache) = self.cache.read()
            && let Some(font) = cache.get(&key)
        {
            return font.clone();
        }

        let resolution = self.resolve_uncached(family, weight, style);
        let resolved = match &resolution {
            Resolution::Exact(face) | Resolution::Alias(face) | Resolution::Fallback { face, .. } => {
                face.clone()
            }
        };

        match self.cache.write() {
            Ok(mut cache) => cache
                .entry(key)
                .or_insert_with(|| {
                    log_resolution(family, &resolution);
                    resolved
                })
                .clone(),
            Err(_) => resolved,
        }
    }

    fn resolve_uncached(&self, family: &str, weight: FontWeight, style: FontStyle) -> Resolution {
        let cause = match self.lookup(family, weight, style) {
            Ok(face) => return Resolution::Exact(face),
            Err(e) => e,
        };
        if let Some(base) = StandardFamily::from_alias(family) {
            return Resolution::Alias(Arc::new(FontFace::standard(base.face(weight, style))));
        }

        let fallback = self.fallback_family.as_ref();
        let face = self
            .lookup(fallback, weight, style)
            .ok()
            .or_else(|| {
                StandardFamily::from_alias(fallback)
                    .map(|base| Arc::new(FontFace::standard(base.face(weight, style))))
            })
            .unwrap_or_else(|| {
                Arc::new(FontFace::standard(
                    StandardFamily::Helvetica.face(weight, style),
                ))
            });
        Resolution::Fallback { face, cause }
    }

    /// Providers first, then the base fonts by canonical name.
    fn lookup(
        &self,
        family: &str,
        weight: FontWeight,
        style: FontStyle,
    ) -> Result<Arc<FontFace>, FontError> {
        let query = FontQuery::new(family).with_weight(weight).with_style(style);
        for provider in &self.providers {
            match provider.load_font(&query) {
                Ok((descriptor, data)) => match FontFace::true_type(descriptor, data) {
                    Ok(face) => return Ok(Arc::new(face)),
                    Err(e) => log::warn!(
                        "Ignoring unusable face for '{}' from {}: {}",
                        family,
                        provider.name(),
                        e
                    ),
                },
                Err(FontError::NotFound { .. }) => {}
                Err(e) => log::warn!("{} failed to load '{}': {}", provider.name(), family, e),
            }
        }
        StandardFamily::from_name(family)
            .map(|base| Arc::new(FontFace::standard(base.face(weight, style))))
            .ok_or_else(|| FontError::NotFound {
                family: family.to_string(),
                weight,
                style,
            })
    }
}

fn log_resolution(family: &str, resolution: &Resolution) {
    match resolution {
        Resolution::Exact(face) => {
            log::debug!("Resolved font '{}' to {}", family, face.postscript_name)
        }
        Resolution::Alias(face) => log::debug!(
            "Font '{}' is set in the built-in {}",
            family,
            face.postscript_name
        ),
        Resolution::Fallback { face, cause } => log::warn!(
            "{}; substituting {}",
            cause,
            face.postscript_name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_traits::InMemoryFontProvider;

    #[test]
    fn canonical_base_font_is_exact() {
        let library = SharedFontLibrary::new();
        let font = library.resolve("Times", FontWeight::Bold, FontStyle::Italic);
        assert_eq!(font.postscript_name, "Times-BoldItalic");
        assert_eq!(font.family, "Times");
        assert!(!font.is_embedded());
    }

    #[test]
    fn alias_resolves_to_the_base_font() {
        let library = SharedFontLibrary::new();
        let font = library.resolve("Arial", FontWeight::Bold, FontStyle::Normal);
        assert_eq!(font.postscript_name, "Helvetica-Bold");
    }

    #[test]
    fn missing_family_falls_back_preserving_weight_and_slant() {
        let library = SharedFontLibrary::new().with_fallback_family("Courier");
        let font = library.resolve("Comic Neue", FontWeight::Bold, FontStyle::Italic);
        assert_eq!(font.postscript_name, "Courier-BoldOblique");
    }

    #[test]
    fn unknown_fallback_ends_at_helvetica() {
        let library = SharedFontLibrary::new().with_fallback_family("Nope");
        let font = library.resolve("Also Nope", FontWeight::Regular, FontStyle::Normal);
        assert_eq!(font.postscript_name, "Helvetica");
    }

    #[test]
    fn unparsable_provider_face_is_skipped() {
        let provider = InMemoryFontProvider::new();
        provider
            .add_font("Broken", FontWeight::Regular, FontStyle::Normal, vec![0, 1, 2, 3])
            .unwrap();
        let library = SharedFontLibrary::new().with_provider(Arc::new(provider));
        let font = library.resolve("Broken", FontWeight::Regular, FontStyle::Normal);
        assert_eq!(font.postscript_name, "Helvetica");
    }

    #[test]
    fn results_are_cached_per_request() {
        let library = SharedFontLibrary::new();
        let a = library.resolve("helvetica", FontWeight::Regular, FontStyle::Normal);
        let b = library.resolve("Helvetica ", FontWeight::Regular, FontStyle::Normal);
        assert!(Arc::ptr_eq(&a, &b));
        let clone = library.clone();
        let c = clone.resolve("Helvetica", FontWeight::Regular, FontStyle::Normal);
        assert!(Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn cache_key_ignores_case() {
        let key1 = FontCacheKey::new("Arial", FontWeight::Bold, FontStyle::Normal);
        let key2 = FontCacheKey::new("arial", FontWeight::Bold, FontStyle::Normal);
        let key3 = FontCacheKey::new("Arial", FontWeight::Regular, FontStyle::Normal);
        assert_eq!(key1, key2);
        assert_ne!(key1, key3);
    }

    #[test]
    fn library_is_shareable_across_threads() {
        let library = SharedFontLibrary::new();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let lib = library.clone();
                std::thread::spawn(move || {
                    lib.resolve("Arial", FontWeight::Regular, FontStyle::Normal)
                        .postscript_name
                        .clone()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), "Helvetica");
        }
    }
}
