use super::encoding::{REPLACEMENT, win_ansi_char, win_ansi_code};
use super::standard::StandardFont;
use quire_traits::FontError;
use std::collections::HashMap;
use std::sync::Arc;

/// Glyph id and advance width (1/1000 em) of one character in a TrueType face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub id: u16,
    pub width: u16,
}

#[derive(Debug, Clone, PartialEq)]
enum Widths {
    /// Indexed by WinAnsi code.
    WinAnsi(Vec<u16>),
    /// Every character the face's Unicode cmap maps.
    Unicode(Arc<HashMap<char, Glyph>>),
}

/// Horizontal and vertical metrics of a face, in 1/1000 em.
///
/// Base fonts are measured per WinAnsi code, the only encoding they are
/// written with. TrueType faces are measured per Unicode character through
/// their cmap, and text set in them is written as glyph ids.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    widths: Widths,
    /// Advance used for characters the face cannot show.
    pub missing_width: u16,
    pub ascent: i16,
    pub descent: i16,
    pub cap_height: i16,
    pub bbox: [i16; 4],
    pub italic_angle: f32,
    pub fixed_pitch: bool,
}

impl FontMetrics {
    pub fn standard(font: StandardFont) -> Self {
        let widths: Vec<u16> = (0u8..=255)
            .map(|code| win_ansi_char(code).map(|c| font.char_width(c)).unwrap_or(0))
            .collect();
        let (ascent, descent, cap_height) = font.vertical_metrics();
        Self {
            missing_width: widths[REPLACEMENT as usize],
            widths: Widths::WinAnsi(widths),
            ascent,
            descent,
            cap_height,
            bbox: font.bounding_box(),
            italic_angle: font.italic_angle(),
            fixed_pitch: font.is_fixed_pitch(),
        }
    }

    /// Reads metrics and the Unicode glyph map from a TrueType/OpenType face.
    pub fn true_type(data: &[u8]) -> Result<Self, FontError> {
        let face = ttf_parser::Face::parse(data, 0)
            .map_err(|e| FontError::InvalidData(e.to_string()))?;
        let units = face.units_per_em() as f32;
        if units <= 0.0 {
            return Err(FontError::InvalidData("units per em is zero".to_string()));
        }
        let scale = |v: f32| (v * 1000.0 / units).round();
        let advance = |gid| face.glyph_hor_advance(gid).map(|w| scale(w as f32) as u16);

        let missing = advance(ttf_parser::GlyphId(0)).unwrap_or(0);
        let mut glyphs = HashMap::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables.into_iter().filter(|s| s.is_unicode()) {
                subtable.codepoints(|code_point| {
                    let Some(ch) = char::from_u32(code_point) else {
                        return;
                    };
                    if glyphs.contains_key(&ch) {
                        return;
                    }
                    if let Some(gid) = subtable.glyph_index(code_point).filter(|g| g.0 != 0) {
                        let width = advance(gid).unwrap_or(missing);
                        glyphs.insert(ch, Glyph { id: gid.0, width });
                    }
                });
            }
        }
        if glyphs.is_empty() {
            return Err(FontError::InvalidData("no Unicode character map".to_string()));
        }

        let ascent = scale(face.ascender() as f32) as i16;
        let descent = scale(face.descender() as f32) as i16;
        let bbox = face.global_bounding_box();
        Ok(Self {
            widths: Widths::Unicode(Arc::new(glyphs)),
            missing_width: missing,
            ascent,
            descent,
            cap_height: face
                .capital_height()
                .map(|h| scale(h as f32) as i16)
                .unwrap_or(ascent),
            bbox: [
                scale(bbox.x_min as f32) as i16,
                scale(bbox.y_min as f32) as i16,
                scale(bbox.x_max as f32) as i16,
                scale(bbox.y_max as f32) as i16,
            ],
            italic_angle: face.italic_angle(),
            fixed_pitch: face.is_monospaced(),
        })
    }

    /// True when text in this face is addressed by glyph id rather than by
    /// WinAnsi code.
    pub fn is_unicode(&self) -> bool {
        matches!(self.widths, Widths::Unicode(_))
    }

    /// The glyph a TrueType face shows for `ch`. `None` for base fonts and
    /// for characters the face lacks.
    pub fn glyph(&self, ch: char) -> Option<Glyph> {
        match &self.widths {
            Widths::Unicode(glyphs) => glyphs.get(&normalize(ch)).copied(),
            Widths::WinAnsi(_) => None,
        }
    }

    pub fn char_width(&self, ch: char) -> u16 {
        let ch = normalize(ch);
        match &self.widths {
            Widths::WinAnsi(widths) => widths[win_ansi_code(ch).unwrap_or(REPLACEMENT) as usize],
            Widths::Unicode(glyphs) => glyphs.get(&ch).map_or(self.missing_width, |g| g.width),
        }
    }

    /// Width of `text` set at `size` points.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| self.char_width(c) as u32).sum();
        units as f32 * size / 1000.0
    }

    /// Distance from the baseline to the top of the ascender, in points.
    pub fn ascender(&self, size: f32) -> f32 {
        self.ascent as f32 * size / 1000.0
    }

    /// Distance from the baseline to the bottom of the descender, in points
    /// (positive).
    pub fn descender(&self, size: f32) -> f32 {
        -(self.descent as f32) * size / 1000.0
    }
}

/// Tabs are set as spaces.
fn normalize(ch: char) -> char {
    if ch == '\t' { ' ' } else { ch }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::standard::StandardFamily;
    use quire_style::{FontStyle, FontWeight};

    #[test]
    fn standard_widths_scale_with_size() {
        let m = FontMetrics::standard(StandardFont::HELVETICA);
        // "Total" = 611 + 556 + 278 + 556 + 222
        assert!((m.text_width("Total", 10.0) - 22.23).abs() < 0.001);
        assert!((m.text_width("Total", 20.0) - 44.46).abs() < 0.001);
    }

    #[test]
    fn unencodable_text_measures_as_replacement() {
        let m = FontMetrics::standard(StandardFont::HELVETICA);
        assert_eq!(m.char_width('→'), m.char_width('?'));
    }

    #[test]
    fn widths_table_matches_direct_lookup() {
        let bold = StandardFamily::Helvetica.face(FontWeight::Bold, FontStyle::Normal);
        let m = FontMetrics::standard(bold);
        assert_eq!(m.char_width('a'), bold.char_width('a'));
        assert_eq!(m.char_width('\u{2022}'), 350);
        assert_eq!(m.char_width('\t'), m.char_width(' '));
        assert!(!m.is_unicode());
        assert_eq!(m.glyph('a'), None);
    }

    #[test]
    fn true_type_faces_measure_any_mapped_character() {
        let data = std::fs::read(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../tests/fixtures/fonts/DejaVuSansMono.ttf"
        ))
        .unwrap();
        let m = FontMetrics::true_type(&data).unwrap();
        assert!(m.is_unicode());
        let latin = m.glyph('a').unwrap();
        let cyrillic = m.glyph('\u{0416}').unwrap();
        assert_ne!(latin.id, cyrillic.id);
        // Monospaced: every mapped glyph has the same advance.
        assert_eq!(latin.width, cyrillic.width);
        assert_eq!(m.char_width('\u{0416}'), latin.width);
    }

    #[test]
    fn garbage_is_not_a_true_type_face() {
        let err = FontMetrics::true_type(b"definitely not a font").unwrap_err();
        assert!(matches!(err, FontError::InvalidData(_)));
    }
}
