use lopdf::content::Content;
use lopdf::{Document as LopdfDocument, Object, ObjectId};
use quire::layout::fonts::win_ansi_char;
use std::collections::HashMap;

/// How the strings shown in one font resource decode back to text.
enum TextDecoder {
    WinAnsi,
    /// Two-byte glyph ids, mapped through the font's ToUnicode CMap.
    GlyphIds(HashMap<u16, String>),
}

impl TextDecoder {
    fn decode(&self, bytes: &[u8]) -> String {
        match self {
            TextDecoder::WinAnsi => bytes.iter().map(|b| win_ansi_char(*b).unwrap_or('?')).collect(),
            TextDecoder::GlyphIds(map) => bytes
                .chunks(2)
                .map(|pair| {
                    let gid = u16::from_be_bytes([pair[0], *pair.get(1).unwrap_or(&0)]);
                    map.get(&gid).map_or("\u{FFFD}", String::as_str).to_string()
                })
                .collect(),
        }
    }
}

/// Operands of every `Tj` on a 1-based page, decoded per the font in use.
pub fn shown_strings(doc: &LopdfDocument, page: u32) -> Vec<String> {
    let Some(page_id) = doc.get_pages().get(&page).copied() else {
        return Vec::new();
    };
    let Ok(data) = doc.get_page_content(page_id) else {
        return Vec::new();
    };
    let Ok(content) = Content::decode(&data) else {
        return Vec::new();
    };
    let decoders = page_decoders(doc, page_id);
    let mut current: Option<&TextDecoder> = None;
    let mut shown = Vec::new();
    for op in &content.operations {
        match op.operator.as_str() {
            "Tf" => {
                current = op
                    .operands
                    .first()
                    .and_then(|o| o.as_name().ok())
                    .and_then(|name| decoders.get(name));
            }
            "Tj" => {
                if let Some(bytes) = op.operands.first().and_then(|o| o.as_str().ok()) {
                    shown.push(current.unwrap_or(&TextDecoder::WinAnsi).decode(bytes));
                }
            }
            _ => {}
        }
    }
    shown
}

fn page_decoders(doc: &LopdfDocument, page_id: ObjectId) -> HashMap<Vec<u8>, TextDecoder> {
    doc.get_page_fonts(page_id)
        .unwrap_or_default()
        .into_iter()
        .map(|(name, font)| {
            let decoder = font
                .get(b"ToUnicode")
                .and_then(Object::as_reference)
                .and_then(|id| doc.get_object(id))
                .and_then(Object::as_stream)
                .map(|stream| {
                    let data = stream
                        .decompressed_content()
                        .unwrap_or_else(|_| stream.content.clone());
                    TextDecoder::GlyphIds(parse_to_unicode(&data))
                })
                .unwrap_or(TextDecoder::WinAnsi);
            (name, decoder)
        })
        .collect()
}

/// Reads the `bfchar` entries of a ToUnicode CMap.
fn parse_to_unicode(cmap: &[u8]) -> HashMap<u16, String> {
    let text = String::from_utf8_lossy(cmap);
    let mut map = HashMap::new();
    let mut in_block = false;
    for line in text.lines().map(str::trim) {
        if line.ends_with("beginbfchar") {
            in_block = true;
        } else if line == "endbfchar" {
            in_block = false;
        } else if in_block {
            let fields: Vec<&str> = line
                .split(['<', '>'])
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .collect();
            let [gid, unicode] = fields[..] else { continue };
            let Ok(gid) = u16::from_str_radix(gid, 16) else { continue };
            let units: Vec<u16> = unicode
                .as_bytes()
                .chunks(4)
                .filter_map(|c| u16::from_str_radix(std::str::from_utf8(c).ok()?, 16).ok())
                .collect();
            map.insert(gid, String::from_utf16_lossy(&units));
        }
    }
    map
}

/// Whether any embedded font program is present.
pub fn has_embedded_font(doc: &LopdfDocument) -> bool {
    doc.objects
        .values()
        .filter_map(|o| o.as_dict().ok())
        .any(|d| d.has(b"FontFile2"))
}

/// `BaseFont` names of every font in the shared resources. Descendants of
/// composite fonts are not listed separately.
pub fn font_names(doc: &LopdfDocument) -> Vec<String> {
    let mut names: Vec<String> = doc
        .objects
        .values()
        .filter_map(|o| o.as_dict().ok())
        .filter(|d| d.get(b"Type").and_then(|t| t.as_name()).ok() == Some(b"Font".as_slice()))
        .filter(|d| d.get(b"Subtype").and_then(|t| t.as_name()).ok() != Some(b"CIDFontType2".as_slice()))
        .filter_map(|d| d.get(b"BaseFont").and_then(|n| n.as_name()).ok())
        .map(|n| String::from_utf8_lossy(n).into_owned())
        .collect();
    names.sort();
    names
}

/// The `N of M` pairs of every page footer, in page order.
pub fn page_numbers(doc: &LopdfDocument) -> Vec<(usize, usize)> {
    (1..=doc.get_pages().len() as u32)
        .filter_map(|page| {
            let text = shown_strings(doc, page).concat();
            let start = text.rfind("Page ")?;
            let mut parts = text[start + 5..].split(" of ");
            let n = parts.next()?.trim().parse().ok()?;
            let m: String = parts.next()?.chars().take_while(char::is_ascii_digit).collect();
            Some((n, m.parse().ok()?))
        })
        .collect()
}
