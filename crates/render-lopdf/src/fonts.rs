//! Font dictionaries for the faces a layout uses.

use crate::writer::StreamingPdfWriter;
use lopdf::{Dictionary, Object, dictionary};
use quire_layout::LaidOutPage;
use quire_layout::fonts::{FontFace, FontSource, win_ansi_code};
use quire_render_core::RenderError;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{Seek, Write};
use std::sync::Arc;

const FLAG_FIXED_PITCH: i64 = 1;
const FLAG_NONSYMBOLIC: i64 = 32;
const FLAG_ITALIC: i64 = 64;

/// bfchar entries per block; the CMap syntax allows at most 100.
const CMAP_BLOCK: usize = 100;

/// Characters shown in one embedded face, keyed by glyph id.
type GlyphUsage = BTreeMap<u16, char>;

/// Writes one font dictionary per face and returns the resource dictionary
/// together with the PostScript name to resource name map.
///
/// Base fonts are referenced with WinAnsiEncoding. TrueType faces are
/// embedded as composite fonts addressed by glyph id, with widths and a
/// ToUnicode map for the glyphs `pages` actually show.
pub(crate) fn register_fonts<W: Write + Seek>(
    writer: &mut StreamingPdfWriter<W>,
    fonts: &[Arc<FontFace>],
    pages: &[LaidOutPage],
) -> Result<(Dictionary, HashMap<String, String>), RenderError> {
    let usage = glyph_usage(pages);
    let empty = GlyphUsage::new();
    let mut resources = Dictionary::new();
    let mut names = HashMap::new();
    for (index, face) in fonts.iter().enumerate() {
        let name = format!("F{}", index + 1);
        let dict = match &face.source {
            FontSource::Standard(_) => dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => face.postscript_name.clone(),
                "Encoding" => "WinAnsiEncoding",
            },
            FontSource::TrueType(data) => {
                let used = usage.get(face.postscript_name.as_str()).unwrap_or(&empty);
                embed_true_type(writer, face, data, used)?
            }
        };
        let id = writer.buffer_object(dict.into());
        resources.set(name.as_bytes(), id);
        names.insert(face.postscript_name.clone(), name);
    }
    Ok((resources, names))
}

/// Glyphs shown per embedded face. Characters a face cannot show are logged
/// once per face.
fn glyph_usage(pages: &[LaidOutPage]) -> HashMap<&str, GlyphUsage> {
    let mut usage: HashMap<&str, GlyphUsage> = HashMap::new();
    let mut missing: BTreeMap<&str, BTreeSet<char>> = BTreeMap::new();
    for text in pages.iter().flat_map(|p| p.texts()) {
        let font = &text.font;
        let name = font.postscript_name.as_str();
        for ch in text.content.chars().filter(|c| *c != '\t') {
            if font.is_embedded() {
                match font.metrics.glyph(ch) {
                    Some(glyph) => {
                        usage.entry(name).or_default().entry(glyph.id).or_insert(ch);
                    }
                    None => {
                        missing.entry(name).or_default().insert(ch);
                    }
                }
            } else if win_ansi_code(ch).is_none() {
                missing.entry(name).or_default().insert(ch);
            }
        }
    }
    for (name, chars) in missing {
        let sample: String = chars.iter().take(10).collect();
        log::warn!(
            "{name} cannot show {} character(s) such as '{sample}'; configure a TrueType font that covers them",
            chars.len()
        );
    }
    usage
}

fn embed_true_type<W: Write + Seek>(
    writer: &mut StreamingPdfWriter<W>,
    face: &FontFace,
    data: &[u8],
    used: &GlyphUsage,
) -> Result<Dictionary, RenderError> {
    ttf_parser::Face::parse(data, 0).map_err(|e| RenderError::CorruptFont {
        font: face.postscript_name.clone(),
        message: e.to_string(),
    })?;

    let base_font = sanitize_name(&face.postscript_name);
    let metrics = &face.metrics;

    let file_id = writer.buffer_stream(
        dictionary! { "Length1" => data.len() as i64 },
        data.to_vec(),
    )?;

    let mut flags = FLAG_NONSYMBOLIC;
    if metrics.fixed_pitch {
        flags |= FLAG_FIXED_PITCH;
    }
    if face.style.is_slanted() {
        flags |= FLAG_ITALIC;
    }
    let descriptor = dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => base_font.clone(),
        "Flags" => flags,
        "FontBBox" => metrics.bbox.iter().map(|v| Object::Integer(*v as i64)).collect::<Vec<_>>(),
        "ItalicAngle" => metrics.italic_angle,
        "Ascent" => metrics.ascent as i64,
        "Descent" => metrics.descent as i64,
        "CapHeight" => metrics.cap_height as i64,
        "StemV" => if face.weight.is_bold() { 120i64 } else { 80i64 },
        "FontFile2" => file_id,
    };
    let descriptor_id = writer.buffer_object(descriptor.into());

    let widths: Vec<Object> = used
        .iter()
        .flat_map(|(gid, ch)| {
            [
                Object::Integer(i64::from(*gid)),
                Object::Array(vec![Object::Integer(i64::from(metrics.char_width(*ch)))]),
            ]
        })
        .collect();
    let cid_font = dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => base_font.clone(),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0i64,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => i64::from(metrics.missing_width),
        "W" => widths,
        "CIDToGIDMap" => "Identity",
    };
    let cid_font_id = writer.buffer_object(cid_font.into());
    let to_unicode_id = writer.buffer_stream(dictionary! {}, to_unicode_cmap(used).into_bytes())?;

    log::debug!(
        "Embedding {} ({} bytes, {} glyphs shown)",
        face.postscript_name,
        data.len(),
        used.len()
    );
    Ok(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => base_font,
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(cid_font_id)],
        "ToUnicode" => to_unicode_id,
    })
}

/// A CMap from two-byte glyph ids back to the characters they show, so text
/// can be searched and copied.
fn to_unicode_cmap(used: &GlyphUsage) -> String {
    let mut out = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );
    let entries: Vec<_> = used.iter().collect();
    for block in entries.chunks(CMAP_BLOCK) {
        out.push_str(&format!("{} beginbfchar\n", block.len()));
        for (gid, ch) in block {
            let mut units = [0u16; 2];
            let hex: String = ch
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{u:04X}"))
                .collect();
            out.push_str(&format!("<{gid:04X}> <{hex}>\n"));
        }
        out.push_str("endbfchar\n");
    }
    out.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    out
}

/// PDF names cannot hold whitespace or delimiters.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_graphic() && !"()<>[]{}/%#".contains(*c))
        .collect()
}
