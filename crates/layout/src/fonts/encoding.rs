//! WinAnsiEncoding (PDF 32000-1, Annex D), the single-byte encoding used for
//! every font the engine emits.

/// Code points assigned to the 0x80..=0x9F range. Unassigned slots are `None`.
const HIGH_TABLE: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

/// Byte substituted for characters the encoding cannot represent.
pub const REPLACEMENT: u8 = b'?';

/// The WinAnsi byte for `ch`, if it has one.
pub fn win_ansi_code(ch: char) -> Option<u8> {
    match ch as u32 {
        0x20..=0x7E | 0xA0..=0xFF => Some(ch as u8),
        _ => HIGH_TABLE
            .iter()
            .position(|c| *c == Some(ch))
            .map(|i| 0x80 + i as u8),
    }
}

/// The character a WinAnsi byte stands for.
pub fn win_ansi_char(code: u8) -> Option<char> {
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as char),
        0x80..=0x9F => HIGH_TABLE[(code - 0x80) as usize],
        _ => None,
    }
}

/// Encodes text for a PDF string operand. Tabs become spaces and anything
/// else outside the encoding becomes `?`.
pub fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\t' => b' ',
            c => win_ansi_code(c).unwrap_or(REPLACEMENT),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_typographic_characters() {
        assert_eq!(to_win_ansi("• Title"), vec![0x95, b' ', b'T', b'i', b't', b'l', b'e']);
        assert_eq!(win_ansi_code('€'), Some(0x80));
        assert_eq!(win_ansi_code('–'), Some(0x96));
        assert_eq!(win_ansi_code('—'), Some(0x97));
        assert_eq!(win_ansi_code('\u{201C}'), Some(0x93));
    }

    #[test]
    fn latin1_passes_through() {
        assert_eq!(to_win_ansi("Müller"), vec![b'M', 0xFC, b'l', b'l', b'e', b'r']);
    }

    #[test]
    fn unknown_characters_become_question_marks() {
        assert_eq!(to_win_ansi("a→b"), b"a?b".to_vec());
        assert_eq!(to_win_ansi("日本"), b"??".to_vec());
    }

    #[test]
    fn decoding_inverts_encoding() {
        for code in (0x20u8..=0x7E).chain(0x80..=0x9F).chain(0xA0..=0xFF) {
            if let Some(ch) = win_ansi_char(code) {
                assert_eq!(win_ansi_code(ch), Some(code), "code {:#x}", code);
            }
        }
        assert_eq!(win_ansi_char(0x81), None);
        assert_eq!(win_ansi_char(0x0A), None);
    }
}
