use chrono::NaiveDateTime;
use quire_types::Color;

/// Convert layout Y coordinate to PDF Y coordinate (flip origin)
pub fn flip_y(y: f32, page_height: f32) -> f32 {
    page_height - y
}

/// Bytes of a PDF text string for the document information dictionary:
/// ASCII as is, anything else as UTF-16BE behind a byte-order mark.
pub fn pdf_text(text: &str) -> Vec<u8> {
    if text.is_ascii() {
        return text.as_bytes().to_vec();
    }
    let mut bytes = vec![0xFE, 0xFF];
    bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
    bytes
}

/// RGB components in the 0..=1 range used by `rg`/`RG`.
pub fn color_components(color: &Color) -> [f32; 3] {
    color.components()
}

/// A PDF date string (`D:YYYYMMDDHHmmSS`).
pub fn pdf_date(at: &NaiveDateTime) -> String {
    at.format("D:%Y%m%d%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn flips_against_page_height() {
        assert_eq!(flip_y(100.0, 842.0), 742.0);
    }

    #[test]
    fn dates_use_pdf_syntax() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap();
        assert_eq!(pdf_date(&at), "D:20240309140507");
    }

    #[test]
    fn text_strings_switch_to_utf16_outside_ascii() {
        assert_eq!(pdf_text("Invoices"), b"Invoices".to_vec());
        assert_eq!(pdf_text("Счёт"), vec![0xFE, 0xFF, 0x04, 0x21, 0x04, 0x47, 0x04, 0x51, 0x04, 0x42]);
    }
}
