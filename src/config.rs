//! Engine configuration, loaded from camelCase JSON.
//!
//! Every field has a default, so `{}` is a complete configuration and a
//! file only needs to name what it changes:
//!
//! ```json
//! {
//!   "placeholder": "-",
//!   "pageSize": "Letter",
//!   "styles": { "Header": { "fontSize": 20 } },
//!   "fonts": [{ "family": "Inter", "weight": "bold", "path": "fonts/Inter-Bold.ttf" }]
//! }
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use quire_layout::{LayoutConfig, SharedFontLibrary};
use quire_render_core::RenderConfig;
use quire_style::{FontStyle, FontWeight, PageSize, StyleAttributes, StyleError};
use quire_traits::{FontError, InMemoryFontProvider};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{field}' is not a usable format: '{pattern}'")]
    InvalidDateFormat { field: &'static str, pattern: String },

    #[error("No invoice style is named '{0}'")]
    UnknownStyle(String),

    #[error(transparent)]
    Style(#[from] StyleError),

    #[error(transparent)]
    Font(#[from] FontError),

    #[error("{0}")]
    Invalid(String),
}

/// One pass to measure and one to confirm the page count.
const MIN_LAYOUT_PASSES: usize = 2;

/// A TrueType face to register under a family name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FontFileConfig {
    pub family: String,
    #[serde(default)]
    pub weight: FontWeight,
    #[serde(default)]
    pub style: FontStyle,
    /// Relative paths are taken from the configuration file's directory.
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Family substituted for fonts that cannot be resolved.
    pub fallback_font_family: String,
    /// Shown in place of missing or blank record values.
    pub placeholder: String,
    pub currency_symbol: String,
    /// `strftime` pattern for invoice and line-item dates.
    pub date_format: String,
    /// `strftime` pattern for the generation timestamp.
    pub date_time_format: String,
    pub page_size: PageSize,
    /// Deflate content streams and embedded fonts.
    pub compress: bool,
    /// Document title written to the PDF information dictionary.
    pub title: String,
    pub max_layout_passes: usize,
    /// Attribute overrides keyed by invoice style name.
    pub styles: BTreeMap<String, StyleAttributes>,
    pub fonts: Vec<FontFileConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fallback_font_family: "Helvetica".to_string(),
            placeholder: quire_idf::DEFAULT_PLACEHOLDER.to_string(),
            currency_symbol: "$".to_string(),
            date_format: "%Y-%m-%d".to_string(),
            date_time_format: "%Y-%m-%d %H:%M:%S".to_string(),
            page_size: PageSize::A4,
            compress: true,
            title: "Invoice Batch Report".to_string(),
            max_layout_passes: LayoutConfig::default().max_passes,
            styles: BTreeMap::new(),
            fonts: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file. Font paths are resolved against the
    /// file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_json(&json)?;
        if let Some(dir) = path.parent() {
            for font in &mut config.fonts {
                if font.path.is_relative() {
                    font.path = dir.join(&font.path);
                }
            }
        }
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fallback_font_family.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "'fallbackFontFamily' must not be empty".to_string(),
            ));
        }
        if self.max_layout_passes < MIN_LAYOUT_PASSES {
            return Err(ConfigError::Invalid(format!(
                "'maxLayoutPasses' must be at least {MIN_LAYOUT_PASSES}, got {}",
                self.max_layout_passes
            )));
        }
        let sample = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default();
        format_day(&sample, &self.date_format).map_err(|_| ConfigError::InvalidDateFormat {
            field: "dateFormat",
            pattern: self.date_format.clone(),
        })?;
        quire_layout::format_date(&NaiveDateTime::from(sample), &self.date_time_format).map_err(
            |_| ConfigError::InvalidDateFormat {
                field: "dateTimeFormat",
                pattern: self.date_time_format.clone(),
            },
        )?;
        Ok(())
    }

    pub fn layout_config(&self) -> LayoutConfig {
        LayoutConfig::default().with_max_passes(self.max_layout_passes)
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            compress: self.compress,
            ..RenderConfig::default()
        }
    }

    /// Builds the font library: registered TrueType files first, then the
    /// built-in base fonts, falling back to `fallbackFontFamily`.
    pub fn font_library(&self) -> Result<SharedFontLibrary, ConfigError> {
        let mut library =
            SharedFontLibrary::new().with_fallback_family(self.fallback_font_family.clone());
        if !self.fonts.is_empty() {
            let provider = InMemoryFontProvider::new();
            for font in &self.fonts {
                let data = std::fs::read(&font.path).map_err(|source| ConfigError::Io {
                    path: font.path.clone(),
                    source,
                })?;
                provider.add_font(font.family.clone(), font.weight, font.style, data)?;
                log::debug!("Registered font '{}' from {}", font.family, font.path.display());
            }
            library = library.with_provider(Arc::new(provider));
        }
        #[cfg(feature = "system-fonts")]
        {
            library = library.with_system_fonts();
        }
        Ok(library)
    }
}

/// Formats a calendar date, rejecting patterns that need a time of day.
pub fn format_day(date: &NaiveDate, pattern: &str) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write!(out, "{}", date.format(pattern))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_types::Color;

    #[test]
    fn empty_object_is_the_default_configuration() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.placeholder, "N/A");
        assert!(config.compress);
    }

    #[test]
    fn keys_are_camel_case() {
        let config = EngineConfig::from_json(
            r##"{
                "placeholder": "-",
                "currencySymbol": "€",
                "pageSize": "Letter",
                "compress": false,
                "styles": { "Header": { "fontSize": 20, "color": "#336699" } }
            }"##,
        )
        .unwrap();
        assert_eq!(config.placeholder, "-");
        assert_eq!(config.currency_symbol, "€");
        assert_eq!(config.page_size, PageSize::Letter);
        assert!(!config.render_config().compress);
        assert_eq!(config.styles["Header"].font_size, Some(20.0));
        assert_eq!(config.styles["Header"].color, Some(Color::rgb(0x33, 0x66, 0x99)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = EngineConfig::from_json(r#"{ "pageSise": "A4" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn date_patterns_are_checked_up_front() {
        let err = EngineConfig::from_json(r#"{ "dateFormat": "%Y-%m-%d %H:%M" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDateFormat { field: "dateFormat", .. }));

        let err = EngineConfig::from_json(r#"{ "dateTimeFormat": "%Q" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDateFormat { field: "dateTimeFormat", .. }));
    }

    #[test]
    fn missing_font_files_are_reported_with_their_path() {
        let config = EngineConfig::from_json(
            r#"{ "fonts": [{ "family": "Inter", "path": "/nonexistent/Inter.ttf" }] }"#,
        )
        .unwrap();
        let err = config.font_library().unwrap_err();
        assert!(matches!(err, ConfigError::Io { ref path, .. } if path.ends_with("Inter.ttf")));
    }

    #[test]
    fn layout_pass_limit_needs_a_confirming_pass() {
        let err = EngineConfig::from_json(r#"{ "maxLayoutPasses": 1 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref m) if m.contains("at least 2")));
        let config = EngineConfig::from_json(r#"{ "maxLayoutPasses": 2 }"#).unwrap();
        assert_eq!(config.layout_config().max_passes, 2);
    }

    #[test]
    fn day_format_rejects_time_fields() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(format_day(&day, "%d.%m.%Y").unwrap(), "09.03.2024");
        assert!(format_day(&day, "%H").is_err());
    }
}
