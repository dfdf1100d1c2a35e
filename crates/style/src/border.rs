use quire_types::Color;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum BorderStyle {
    None,
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// A single stroked edge. A width of zero draws nothing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Border {
    pub width: f32,
    #[serde(default)]
    pub style: BorderStyle,
    #[serde(default)]
    pub color: Color,
}

impl Eq for Border {}

impl Hash for Border {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.width.to_bits().hash(state);
        self.style.hash(state);
        self.color.hash(state);
    }
}

impl Border {
    pub fn solid(width: f32, color: Color) -> Self {
        Self {
            width,
            style: BorderStyle::Solid,
            color,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.style != BorderStyle::None
    }
}
