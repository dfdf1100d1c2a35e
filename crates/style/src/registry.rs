//! The named style registry.
//!
//! Styles are defined once, by name, optionally on top of a base style. The
//! base's attributes are merged in at definition time, so every entry already
//! holds its complete attribute set and resolution is a plain index lookup.
//! Callers receive a typed [`StyleId`] from [`StyleRegistry::define`] or
//! [`StyleRegistry::id`]; document content never carries style names.

use crate::font::{FontStyle, FontWeight};
use crate::text::TextAlign;
use quire_types::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Name of the root style every other style derives from by default.
pub const NORMAL: &str = "Normal";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StyleError {
    #[error("Style '{0}' is already defined")]
    DuplicateStyle(String),
    #[error("Style '{style}' is based on '{base}', which is not defined")]
    UnknownBaseStyle { style: String, base: String },
    #[error("Style '{0}' is not defined")]
    UnknownStyle(String),
    #[error("Style id {0} does not belong to this registry")]
    UnknownStyleId(StyleId),
    #[error("Invalid value for '{attribute}' in style '{style}': {message}")]
    InvalidAttribute {
        style: String,
        attribute: &'static str,
        message: String,
    },
}

/// Handle to a style defined in a [`StyleRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleId(u32);

impl StyleId {
    /// The root `Normal` style, present in every registry.
    pub const NORMAL: StyleId = StyleId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StyleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A partial set of style attributes. `None` means "inherit".
#[derive(Deserialize, Serialize, Default, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StyleAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_style: Option<FontStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_before: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_after: Option<f32>,
    /// Line height as a multiple of the font size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_spacing: Option<f32>,
}

impl StyleAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }

    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn bold(mut self) -> Self {
        self.font_weight = Some(FontWeight::Bold);
        self
    }

    pub fn italic(mut self) -> Self {
        self.font_style = Some(FontStyle::Italic);
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn align(mut self, align: TextAlign) -> Self {
        self.text_align = Some(align);
        self
    }

    pub fn space_before(mut self, points: f32) -> Self {
        self.space_before = Some(points);
        self
    }

    pub fn space_after(mut self, points: f32) -> Self {
        self.space_after = Some(points);
        self
    }

    pub fn line_spacing(mut self, factor: f32) -> Self {
        self.line_spacing = Some(factor);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns `self` with every attribute set in `overrides` replaced.
    pub fn merge(&self, overrides: &StyleAttributes) -> StyleAttributes {
        StyleAttributes {
            font_family: overrides
                .font_family
                .clone()
                .or_else(|| self.font_family.clone()),
            font_size: overrides.font_size.or(self.font_size),
            font_weight: overrides.font_weight.or(self.font_weight),
            font_style: overrides.font_style.or(self.font_style),
            color: overrides.color.clone().or_else(|| self.color.clone()),
            text_align: overrides.text_align.or(self.text_align),
            space_before: overrides.space_before.or(self.space_before),
            space_after: overrides.space_after.or(self.space_after),
            line_spacing: overrides.line_spacing.or(self.line_spacing),
        }
    }

    fn validate(&self, style: &str) -> Result<(), StyleError> {
        let invalid = |attribute: &'static str, message: String| StyleError::InvalidAttribute {
            style: style.to_string(),
            attribute,
            message,
        };
        if let Some(size) = self.font_size
            && !(size.is_finite() && size > 0.0)
        {
            return Err(invalid("fontSize", format!("{} is not a positive size", size)));
        }
        if let Some(factor) = self.line_spacing
            && !(factor.is_finite() && factor > 0.0)
        {
            return Err(invalid(
                "lineSpacing",
                format!("{} is not a positive factor", factor),
            ));
        }
        for (attribute, value) in [
            ("spaceBefore", self.space_before),
            ("spaceAfter", self.space_after),
        ] {
            if let Some(v) = value
                && !(v.is_finite() && v >= 0.0)
            {
                return Err(invalid(attribute, format!("{} is negative", v)));
            }
        }
        if let Some(family) = &self.font_family
            && family.trim().is_empty()
        {
            return Err(invalid("fontFamily", "family name is empty".to_string()));
        }
        Ok(())
    }
}

/// A fully concrete style: every attribute has a value.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub font_family: String,
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub color: Color,
    pub text_align: TextAlign,
    pub space_before: f32,
    pub space_after: f32,
    pub line_spacing: f32,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self {
            font_family: "Helvetica".to_string(),
            font_size: 10.0,
            font_weight: FontWeight::Regular,
            font_style: FontStyle::Normal,
            color: Color::BLACK,
            text_align: TextAlign::Left,
            space_before: 0.0,
            space_after: 0.0,
            line_spacing: 1.2,
        }
    }
}

impl ResolvedStyle {
    /// Returns a copy with the given overrides applied.
    pub fn apply(&self, overrides: &StyleAttributes) -> ResolvedStyle {
        ResolvedStyle {
            font_family: overrides
                .font_family
                .clone()
                .unwrap_or_else(|| self.font_family.clone()),
            font_size: overrides.font_size.unwrap_or(self.font_size),
            font_weight: overrides.font_weight.unwrap_or(self.font_weight),
            font_style: overrides.font_style.unwrap_or(self.font_style),
            color: overrides.color.clone().unwrap_or_else(|| self.color.clone()),
            text_align: overrides.text_align.unwrap_or(self.text_align),
            space_before: overrides.space_before.unwrap_or(self.space_before),
            space_after: overrides.space_after.unwrap_or(self.space_after),
            line_spacing: overrides.line_spacing.unwrap_or(self.line_spacing),
        }
    }

    pub fn line_height(&self) -> f32 {
        self.font_size * self.line_spacing
    }
}

#[derive(Debug, Clone)]
struct StyleEntry {
    name: String,
    base: Option<StyleId>,
    attributes: StyleAttributes,
    resolved: ResolvedStyle,
}

/// Named style definitions, built once and then shared read-only.
#[derive(Debug, Clone)]
pub struct StyleRegistry {
    entries: Vec<StyleEntry>,
    by_name: HashMap<String, StyleId>,
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleRegistry {
    /// Creates a registry holding only the default `Normal` style.
    pub fn new() -> Self {
        Self::root(StyleAttributes::default())
    }

    /// Creates a registry whose `Normal` style carries the given attributes.
    pub fn with_normal(attributes: StyleAttributes) -> Result<Self, StyleError> {
        attributes.validate(NORMAL)?;
        Ok(Self::root(attributes))
    }

    fn root(attributes: StyleAttributes) -> Self {
        let resolved = ResolvedStyle::default().apply(&attributes);
        let mut by_name = HashMap::new();
        by_name.insert(NORMAL.to_string(), StyleId::NORMAL);
        Self {
            entries: vec![StyleEntry {
                name: NORMAL.to_string(),
                base: None,
                attributes,
                resolved,
            }],
            by_name,
        }
    }

    /// Defines a new named style.
    ///
    /// `base` defaults to `Normal`. The base must already exist; its attributes
    /// are merged with `attributes`, the latter winning per attribute.
    pub fn define(
        &mut self,
        name: &str,
        attributes: StyleAttributes,
        base: Option<&str>,
    ) -> Result<StyleId, StyleError> {
        if self.by_name.contains_key(name) {
            return Err(StyleError::DuplicateStyle(name.to_string()));
        }
        let base_id = match base {
            Some(base_name) => {
                *self
                    .by_name
                    .get(base_name)
                    .ok_or_else(|| StyleError::UnknownBaseStyle {
                        style: name.to_string(),
                        base: base_name.to_string(),
                    })?
            }
            None => StyleId::NORMAL,
        };
        attributes.validate(name)?;

        let base_entry = &self.entries[base_id.index()];
        let merged = base_entry.attributes.merge(&attributes);
        let resolved = ResolvedStyle::default().apply(&merged);
        log::debug!("Defined style '{}' based on '{}'", name, base_entry.name);

        let id = StyleId(self.entries.len() as u32);
        self.entries.push(StyleEntry {
            name: name.to_string(),
            base: Some(base_id),
            attributes: merged,
            resolved,
        });
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    /// Looks up the id of a named style.
    pub fn id(&self, name: &str) -> Result<StyleId, StyleError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| StyleError::UnknownStyle(name.to_string()))
    }

    /// Returns the fully merged attribute set of a style.
    pub fn resolve(&self, id: StyleId) -> Result<&ResolvedStyle, StyleError> {
        self.entries
            .get(id.index())
            .map(|e| &e.resolved)
            .ok_or(StyleError::UnknownStyleId(id))
    }

    /// The merged (still partial) attributes of a style, as defined.
    pub fn attributes(&self, id: StyleId) -> Result<&StyleAttributes, StyleError> {
        self.entries
            .get(id.index())
            .map(|e| &e.attributes)
            .ok_or(StyleError::UnknownStyleId(id))
    }

    pub fn name(&self, id: StyleId) -> Option<&str> {
        self.entries.get(id.index()).map(|e| e.name.as_str())
    }

    pub fn base_of(&self, id: StyleId) -> Option<StyleId> {
        self.entries.get(id.index()).and_then(|e| e.base)
    }

    pub fn contains(&self, id: StyleId) -> bool {
        id.index() < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
