//! Shared OOXML package helpers
//!
//! DOCX and PPTX are ZIP archives of XML parts. These helpers open the
//! archive over in-memory bytes, read parts as strings, and resolve
//! relationship files (`_rels/*.rels`).

use std::collections::HashMap;
use std::io::{Cursor, Read};

use insight_core::{ParseError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::result::ZipError;
use zip::ZipArchive;

/// Archive over borrowed bytes.
pub type Package<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// Open an OOXML package.
///
/// # Errors
///
/// [`ParseError::DecodeFailure`] if the bytes are not a ZIP archive.
pub fn open_package<'a>(format: &'static str, data: &'a [u8]) -> Result<Package<'a>> {
    ZipArchive::new(Cursor::new(data)).map_err(|e| ParseError::decode(format, e))
}

/// Read a part as UTF-8 text; `None` when the part does not exist.
///
/// # Errors
///
/// [`ParseError::DecodeFailure`] for unreadable or non-UTF-8 parts.
pub fn read_part(
    format: &'static str,
    archive: &mut Package<'_>,
    name: &str,
) -> Result<Option<String>> {
    let mut part = match archive.by_name(name) {
        Ok(part) => part,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(ParseError::decode(format, e)),
    };
    let mut content = String::new();
    part.read_to_string(&mut content)
        .map_err(|e| ParseError::decode(format, e))?;
    Ok(Some(content))
}

/// Read a part that must exist.
///
/// # Errors
///
/// As [`read_part`], plus [`ParseError::DecodeFailure`] when it is missing.
pub fn require_part(
    format: &'static str,
    archive: &mut Package<'_>,
    name: &str,
) -> Result<String> {
    read_part(format, archive, name)?
        .ok_or_else(|| ParseError::decode_msg(format, format!("missing {name}")))
}

/// Attribute value by qualified key.
#[inline]
pub fn get_attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .filter_map(std::result::Result::ok)
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// Map relationship ids (`rId7`) to targets (`slides/slide1.xml`).
///
/// # Errors
///
/// [`ParseError::DecodeFailure`] for malformed XML.
pub fn parse_relationships(format: &'static str, xml: &str) -> Result<HashMap<String, String>> {
    let mut relationships = HashMap::new();
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e) | Event::Start(e)) if e.name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (get_attr(&e, b"Id"), get_attr(&e, b"Target")) {
                    relationships.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::decode(format, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(relationships)
}

/// Resolve a relationship target relative to the directory of its source part.
///
/// `("ppt", "slides/slide1.xml")` → `ppt/slides/slide1.xml`; absolute
/// targets (`/ppt/slides/slide1.xml`) drop the leading slash.
#[must_use]
pub fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[cfg(test)]
pub(crate) mod test_support {
    //! In-memory package builder for tests.

    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    pub fn build_package(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in parts {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }
}
