use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::content::Content;
use lopdf::{Dictionary, Object, ObjectId, Stream, dictionary};
use quire_render_core::RenderError;
use std::collections::BTreeMap;
use std::io::{self, Seek, Write};

/// Buffers indirect objects and serializes them, with the cross-reference
/// table and trailer, when the document is finished.
///
/// Object numbers 1 to 3 are reserved for the shared resources, the page
/// tree and the catalog.
pub struct StreamingPdfWriter<W: Write + Seek> {
    writer: W,
    max_id: u32,
    compress: bool,
    pub catalog_id: ObjectId,
    pub pages_id: ObjectId,
    pub resources_id: ObjectId,
    page_ids: Vec<ObjectId>,
    catalog_entries: Dictionary,
    info: Option<Dictionary>,
    buffered_objects: BTreeMap<ObjectId, Object>,
}

impl<W: Write + Seek> StreamingPdfWriter<W> {
    pub fn new(mut writer: W, version: &str, compress: bool) -> io::Result<Self> {
        writer.write_all(format!("%PDF-{version}\n").as_bytes())?;
        // Binary marker so transfer tools treat the file as binary.
        writer.write_all(b"%\xE2\xE3\xCF\xD3\n")?;

        Ok(Self {
            writer,
            max_id: 3,
            compress,
            resources_id: (1, 0),
            pages_id: (2, 0),
            catalog_id: (3, 0),
            page_ids: Vec::new(),
            catalog_entries: Dictionary::new(),
            info: None,
            buffered_objects: BTreeMap::new(),
        })
    }

    pub fn new_object_id(&mut self) -> ObjectId {
        self.max_id += 1;
        (self.max_id, 0)
    }

    pub fn buffer_object(&mut self, object: Object) -> ObjectId {
        let id = self.new_object_id();
        self.buffered_objects.insert(id, object);
        id
    }

    pub fn buffer_object_at_id(&mut self, id: ObjectId, object: Object) {
        if id.0 > self.max_id {
            self.max_id = id.0;
        }
        self.buffered_objects.insert(id, object);
    }

    /// Buffers a stream, deflating it when compression is on.
    pub fn buffer_stream(&mut self, mut dict: Dictionary, data: Vec<u8>) -> io::Result<ObjectId> {
        let content = if self.compress {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&data)?;
            dict.set("Filter", "FlateDecode");
            encoder.finish()?
        } else {
            data
        };
        Ok(self.buffer_object(Object::Stream(Stream::new(dict, content))))
    }

    pub fn buffer_content_stream(&mut self, content: Content) -> Result<ObjectId, RenderError> {
        let data = content.encode()?;
        Ok(self.buffer_stream(dictionary! {}, data)?)
    }

    pub fn set_page_ids(&mut self, page_ids: Vec<ObjectId>) {
        self.page_ids = page_ids;
    }

    /// Adds an entry to the document catalog.
    pub fn set_catalog_entry(&mut self, key: &str, value: impl Into<Object>) {
        self.catalog_entries.set(key, value);
    }

    pub fn set_info(&mut self, info: Dictionary) {
        self.info = Some(info);
    }

    pub fn finish(mut self) -> io::Result<W> {
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => self.page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<Object>>(),
            "Count" => self.page_ids.len() as i64,
        };
        self.buffer_object_at_id(self.pages_id, pages_dict.into());

        let mut catalog_dict = dictionary! { "Type" => "Catalog", "Pages" => self.pages_id };
        for (key, value) in self.catalog_entries.iter() {
            catalog_dict.set(key.clone(), value.clone());
        }
        self.buffer_object_at_id(self.catalog_id, catalog_dict.into());

        let info_id = self.info.take().map(|info| self.buffer_object(info.into()));

        let null = Object::Null;
        let mut offsets = Vec::with_capacity(self.max_id as usize);
        for number in 1..=self.max_id {
            let id = (number, 0);
            offsets.push(self.writer.stream_position()?);
            let object = self.buffered_objects.get(&id).unwrap_or(&null);
            internal_writer::write_indirect_object(&mut self.writer, id, object)?;
        }

        let xref_start = self.writer.stream_position()?;
        internal_writer::write_xref(&mut self.writer, &offsets)?;

        let mut trailer = dictionary! {
            "Size" => (self.max_id + 1) as i64,
            "Root" => self.catalog_id,
        };
        if let Some(info_id) = info_id {
            trailer.set("Info", info_id);
        }
        writeln!(self.writer, "trailer")?;
        internal_writer::write_dictionary(&mut self.writer, &trailer)?;
        writeln!(self.writer, "\nstartxref")?;
        writeln!(self.writer, "{xref_start}")?;
        write!(self.writer, "%%EOF")?;

        self.writer.flush()?;
        Ok(self.writer)
    }
}

mod internal_writer {
    use super::*;
    use lopdf::StringFormat;

    pub fn write_indirect_object<W: Write>(writer: &mut W, id: ObjectId, object: &Object) -> io::Result<()> {
        writeln!(writer, "{} {} obj", id.0, id.1)?;
        write_object(writer, object)?;
        writeln!(writer, "\nendobj")?;
        Ok(())
    }

    pub fn write_object(writer: &mut dyn Write, object: &Object) -> io::Result<()> {
        match object {
            Object::Null => writer.write_all(b"null"),
            Object::Boolean(b) => writer.write_all(if *b { b"true" } else { b"false" }),
            Object::Integer(i) => write!(writer, "{i}"),
            Object::Real(r) => write_real(writer, *r),
            Object::Name(n) => {
                writer.write_all(b"/")?;
                writer.write_all(n)
            }
            Object::String(s, format) => match format {
                StringFormat::Literal => {
                    writer.write_all(b"(")?;
                    for &byte in s {
                        match byte {
                            b'(' | b')' | b'\\' => writer.write_all(&[b'\\', byte])?,
                            b'\r' => writer.write_all(b"\\r")?,
                            b'\n' => writer.write_all(b"\\n")?,
                            _ => writer.write_all(&[byte])?,
                        }
                    }
                    writer.write_all(b")")
                }
                StringFormat::Hexadecimal => {
                    writer.write_all(b"<")?;
                    for byte in s {
                        write!(writer, "{byte:02X}")?;
                    }
                    writer.write_all(b">")
                }
            },
            Object::Array(arr) => {
                writer.write_all(b"[")?;
                for (i, obj) in arr.iter().enumerate() {
                    if i > 0 {
                        writer.write_all(b" ")?;
                    }
                    write_object(writer, obj)?;
                }
                writer.write_all(b"]")
            }
            Object::Dictionary(dict) => write_dictionary(writer, dict),
            Object::Stream(stream) => {
                let mut dict = stream.dict.clone();
                dict.set("Length", stream.content.len() as i64);
                write_dictionary(writer, &dict)?;
                writer.write_all(b"\nstream\n")?;
                writer.write_all(&stream.content)?;
                writer.write_all(b"\nendstream")
            }
            Object::Reference(id) => write!(writer, "{} {} R", id.0, id.1),
        }
    }

    /// Reals with at most three decimals and no trailing zeros.
    fn write_real(writer: &mut dyn Write, value: f32) -> io::Result<()> {
        let text = format!("{value:.3}");
        let text = text.trim_end_matches('0').trim_end_matches('.');
        let text = if text == "-0" { "0" } else { text };
        writer.write_all(text.as_bytes())
    }

    pub fn write_dictionary(writer: &mut dyn Write, dict: &Dictionary) -> io::Result<()> {
        writer.write_all(b"<<")?;
        let mut entries: Vec<_> = dict.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        for (key, value) in entries {
            writer.write_all(b"/")?;
            writer.write_all(key)?;
            writer.write_all(b" ")?;
            write_object(writer, value)?;
            writer.write_all(b" ")?;
        }
        writer.write_all(b">>")
    }

    /// A single-section table covering object 0 to the last object.
    pub fn write_xref<W: Write>(writer: &mut W, offsets: &[u64]) -> io::Result<()> {
        writeln!(writer, "xref")?;
        writeln!(writer, "0 {}", offsets.len() + 1)?;
        writeln!(writer, "0000000000 65535 f ")?;
        for offset in offsets {
            writeln!(writer, "{offset:010} 00000 n ")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn finish(writer: StreamingPdfWriter<Cursor<Vec<u8>>>) -> String {
        let bytes = writer.finish().unwrap().into_inner();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[test]
    fn writes_header_xref_and_trailer() {
        let mut writer = StreamingPdfWriter::new(Cursor::new(Vec::new()), "1.7", false).unwrap();
        writer.buffer_object_at_id(writer.resources_id, dictionary! {}.into());
        let out = finish(writer);
        assert!(out.starts_with("%PDF-1.7\n"));
        assert!(out.contains("xref\n0 4\n0000000000 65535 f \n"));
        assert!(out.contains("/Root 3 0 R"));
        assert!(out.ends_with("%%EOF"));
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let mut writer = StreamingPdfWriter::new(Cursor::new(Vec::new()), "1.7", false).unwrap();
        writer.buffer_object(Object::Integer(42));
        let bytes = writer.finish().unwrap().into_inner();
        // Offsets count raw bytes, including the binary comment after the header.
        let xref = bytes.windows(5).rposition(|w| w == b"xref\n").unwrap();
        let table = std::str::from_utf8(&bytes[xref..]).unwrap();
        let fourth = table.lines().nth(6).unwrap();
        let offset: usize = fourth[..10].parse().unwrap();
        assert!(bytes[offset..].starts_with(b"4 0 obj\n42"));
    }

    #[test]
    fn streams_are_deflated_when_compressing() {
        let mut writer = StreamingPdfWriter::new(Cursor::new(Vec::new()), "1.7", true).unwrap();
        let id = writer.buffer_stream(dictionary! {}, b"BT ET".repeat(50)).unwrap();
        let Some(Object::Stream(stream)) = writer.buffered_objects.get(&id) else {
            panic!("expected a stream");
        };
        assert_eq!(stream.dict.get(b"Filter").unwrap().as_name().unwrap(), b"FlateDecode");
        assert!(stream.content.len() < 250);
    }

    #[test]
    fn reals_are_compact() {
        let mut out = Vec::new();
        internal_writer::write_object(&mut out, &Object::Real(12.5)).unwrap();
        out.push(b' ');
        internal_writer::write_object(&mut out, &Object::Real(3.0)).unwrap();
        out.push(b' ');
        internal_writer::write_object(&mut out, &Object::Real(-0.0001)).unwrap();
        assert_eq!(out, b"12.5 3 0");
    }
}
