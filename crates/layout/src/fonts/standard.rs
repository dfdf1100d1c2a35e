//! Metrics for the standard PDF base fonts.
//!
//! Widths come from the Adobe Core14 AFM files, in 1/1000 em. Only the
//! printable ASCII range is tabulated; the remaining WinAnsi characters are
//! mapped to a similar ASCII glyph or given the font's default width.

use quire_style::{FontStyle, FontWeight};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFamily {
    Helvetica,
    Times,
    Courier,
}

impl StandardFamily {
    /// Matches the canonical family names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "helvetica" => Some(Self::Helvetica),
            "times" | "times-roman" => Some(Self::Times),
            "courier" => Some(Self::Courier),
            _ => None,
        }
    }

    /// Matches common metric-compatible names that stand in for a base font.
    pub fn from_alias(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "arial" | "arimo" | "liberation sans" | "helvetica neue" | "nimbus sans"
            | "sans-serif" => Some(Self::Helvetica),
            "times new roman" | "tinos" | "liberation serif" | "nimbus roman" | "serif" => {
                Some(Self::Times)
            }
            "courier new" | "cousine" | "liberation mono" | "nimbus mono" | "monospace" => {
                Some(Self::Courier)
            }
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::Times => "Times",
            Self::Courier => "Courier",
        }
    }

    pub fn face(&self, weight: FontWeight, style: FontStyle) -> StandardFont {
        StandardFont {
            family: *self,
            bold: weight.is_bold(),
            slanted: style.is_slanted(),
        }
    }
}

/// One of the twelve Latin base fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StandardFont {
    pub family: StandardFamily,
    pub bold: bool,
    pub slanted: bool,
}

impl StandardFont {
    pub const HELVETICA: StandardFont = StandardFont {
        family: StandardFamily::Helvetica,
        bold: false,
        slanted: false,
    };

    /// The `/BaseFont` name.
    pub fn postscript_name(&self) -> &'static str {
        use StandardFamily::*;
        match (self.family, self.bold, self.slanted) {
            (Helvetica, false, false) => "Helvetica",
            (Helvetica, true, false) => "Helvetica-Bold",
            (Helvetica, false, true) => "Helvetica-Oblique",
            (Helvetica, true, true) => "Helvetica-BoldOblique",
            (Times, false, false) => "Times-Roman",
            (Times, true, false) => "Times-Bold",
            (Times, false, true) => "Times-Italic",
            (Times, true, true) => "Times-BoldItalic",
            (Courier, false, false) => "Courier",
            (Courier, true, false) => "Courier-Bold",
            (Courier, false, true) => "Courier-Oblique",
            (Courier, true, true) => "Courier-BoldOblique",
        }
    }

    pub fn weight(&self) -> FontWeight {
        if self.bold {
            FontWeight::Bold
        } else {
            FontWeight::Regular
        }
    }

    pub fn style(&self) -> FontStyle {
        match (self.slanted, self.family) {
            (false, _) => FontStyle::Normal,
            (true, StandardFamily::Times) => FontStyle::Italic,
            (true, _) => FontStyle::Oblique,
        }
    }

    /// Ascender, descender and cap height.
    pub fn vertical_metrics(&self) -> (i16, i16, i16) {
        match (self.family, self.bold) {
            (StandardFamily::Helvetica, _) => (718, -207, 718),
            (StandardFamily::Times, false) => (683, -217, 662),
            (StandardFamily::Times, true) => (683, -217, 676),
            (StandardFamily::Courier, _) => (629, -157, 562),
        }
    }

    pub fn bounding_box(&self) -> [i16; 4] {
        match (self.family, self.bold) {
            (StandardFamily::Helvetica, false) => [-166, -225, 1000, 931],
            (StandardFamily::Helvetica, true) => [-170, -228, 1003, 962],
            (StandardFamily::Times, false) => [-168, -218, 1000, 898],
            (StandardFamily::Times, true) => [-168, -218, 1000, 935],
            (StandardFamily::Courier, _) => [-23, -250, 715, 805],
        }
    }

    pub fn italic_angle(&self) -> f32 {
        match (self.slanted, self.family) {
            (false, _) => 0.0,
            (true, StandardFamily::Times) => -15.5,
            (true, _) => -12.0,
        }
    }

    pub fn is_fixed_pitch(&self) -> bool {
        self.family == StandardFamily::Courier
    }

    /// Advance width of `ch` in 1/1000 em.
    pub fn char_width(&self, ch: char) -> u16 {
        let table = match (self.family, self.bold) {
            (StandardFamily::Helvetica, false) => &HELVETICA,
            (StandardFamily::Helvetica, true) => &HELVETICA_BOLD,
            // Italic Times widths differ slightly; the upright table is close enough
            // for line breaking.
            (StandardFamily::Times, false) => &TIMES_ROMAN,
            (StandardFamily::Times, true) => &TIMES_BOLD,
            (StandardFamily::Courier, _) => return 600,
        };
        let ascii = |c: char| table[(c as usize) - 0x20];
        match ch {
            ' '..='~' => ascii(ch),
            '\u{A0}' => ascii(' '),
            '\u{2022}' => 350,
            '\u{2013}' => self.en_dash(),
            '\u{2014}' | '\u{2026}' | '\u{2030}' | '\u{2122}' => 1000,
            '\u{2018}' | '\u{2019}' | '\u{201A}' => self.single_quote(),
            '\u{201C}' | '\u{201D}' | '\u{201E}' => self.double_quote(),
            '\u{20AC}' => self.default_width(),
            c => latin1_base(c).map(ascii).unwrap_or_else(|| self.default_width()),
        }
    }

    fn default_width(&self) -> u16 {
        match self.family {
            StandardFamily::Helvetica => 556,
            _ => 500,
        }
    }

    fn en_dash(&self) -> u16 {
        self.default_width()
    }

    fn single_quote(&self) -> u16 {
        match (self.family, self.bold) {
            (StandardFamily::Helvetica, false) => 222,
            (StandardFamily::Helvetica, true) => 278,
            _ => 333,
        }
    }

    fn double_quote(&self) -> u16 {
        match (self.family, self.bold) {
            (StandardFamily::Helvetica, false) => 333,
            (StandardFamily::Helvetica, true) => 500,
            (_, false) => 444,
            (_, true) => 500,
        }
    }
}

/// Accented Latin-1 letters measure like their unaccented base letter.
fn latin1_base(ch: char) -> Option<char> {
    Some(match ch {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' | 'Ÿ' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'ß' => 'B',
        'Š' => 'S',
        'š' => 's',
        'Ž' => 'Z',
        'ž' => 'z',
        _ => return None,
    })
}

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
const TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_cover_printable_ascii() {
        let helv = StandardFont::HELVETICA;
        assert_eq!(helv.char_width(' '), 278);
        assert_eq!(helv.char_width('a'), 556);
        assert_eq!(helv.char_width('i'), 222);
        assert_eq!(helv.char_width('W'), 944);
        assert_eq!(helv.char_width('~'), 584);
    }

    #[test]
    fn bold_differs_from_regular() {
        let bold = StandardFamily::Helvetica.face(FontWeight::Bold, FontStyle::Normal);
        assert_eq!(bold.postscript_name(), "Helvetica-Bold");
        assert_eq!(bold.char_width('i'), 278);
        assert_eq!(bold.char_width('b'), 611);
    }

    #[test]
    fn courier_is_fixed_pitch() {
        let courier = StandardFamily::Courier.face(FontWeight::Regular, FontStyle::Italic);
        assert_eq!(courier.postscript_name(), "Courier-Oblique");
        assert_eq!(courier.char_width('i'), 600);
        assert_eq!(courier.char_width('M'), 600);
    }

    #[test]
    fn non_ascii_characters_have_sensible_widths() {
        let helv = StandardFont::HELVETICA;
        assert_eq!(helv.char_width('•'), 350);
        assert_eq!(helv.char_width('é'), helv.char_width('e'));
        assert_eq!(helv.char_width('—'), 1000);
        assert_eq!(helv.char_width('→'), 556);
    }

    #[test]
    fn names_and_aliases_are_distinct() {
        assert_eq!(StandardFamily::from_name("Times-Roman"), Some(StandardFamily::Times));
        assert_eq!(StandardFamily::from_name("Arial"), None);
        assert_eq!(StandardFamily::from_alias("Arial"), Some(StandardFamily::Helvetica));
        assert_eq!(StandardFamily::from_alias("Courier New"), Some(StandardFamily::Courier));
    }
}
