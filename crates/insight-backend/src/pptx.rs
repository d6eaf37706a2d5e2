//! PPTX (Microsoft PowerPoint) presentation parser
//!
//! # Architecture
//!
//! PPTX files are ZIP archives containing:
//! - `ppt/presentation.xml`: slide list (`p:sldIdLst`) in presentation order
//! - `ppt/_rels/presentation.xml.rels`: relationship ids → slide parts
//! - `ppt/slides/slideN.xml`: shapes, text frames and tables
//!
//! Slide order follows `p:sldId` entries; if they cannot be resolved the
//! `slideN.xml` parts are taken in numeric order. Every `a:p` on a slide
//! (text frames and table cells alike) is flattened into one item per slide.

use insight_core::{
    normalize_binary_source, normalize_whitespace, ParseError, ParseItem, ParseOptions,
    ParseResult, Result, Source, MIME_PPTX,
};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::json;

use crate::ooxml::{
    get_attr, open_package, parse_relationships, read_part, require_part, resolve_target, Package,
};
use crate::traits::Parser;
use crate::utils::{finish_result, metadata_from};

const FORMAT: &str = "pptx";

/// PPTX strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PptxBackend;

impl PptxBackend {
    /// Create a new PPTX backend
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Slide part names in presentation order.
    fn slide_parts(archive: &mut Package<'_>) -> Result<Vec<String>> {
        let ordered: Vec<String> = match (
            read_part(FORMAT, archive, "ppt/presentation.xml")?,
            read_part(FORMAT, archive, "ppt/_rels/presentation.xml.rels")?,
        ) {
            (Some(presentation), Some(rels)) => {
                let relationships = parse_relationships(FORMAT, &rels)?;
                slide_relationship_ids(&presentation)?
                    .iter()
                    .filter_map(|id| relationships.get(id))
                    .map(|target| resolve_target("ppt", target))
                    .collect()
            }
            _ => Vec::new(),
        };
        if !ordered.is_empty() {
            return Ok(ordered);
        }

        log::debug!("PPTX: no resolvable slide list, ordering slide parts by number");
        let mut numbered: Vec<(u32, String)> = archive
            .file_names()
            .filter_map(|name| {
                let number = name
                    .strip_prefix("ppt/slides/slide")?
                    .strip_suffix(".xml")?
                    .parse::<u32>()
                    .ok()?;
                Some((number, name.to_string()))
            })
            .collect();
        numbered.sort_unstable();
        Ok(numbered.into_iter().map(|(_, name)| name).collect())
    }
}

/// `r:id` of every `p:sldId`, in document order.
fn slide_relationship_ids(presentation_xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(presentation_xml);
    let mut ids = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e) | Event::Start(e)) if e.name().as_ref() == b"p:sldId" => {
                if let Some(id) = get_attr(&e, b"r:id") {
                    ids.push(id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::decode(FORMAT, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(ids)
}

/// Normalized paragraph texts of one slide.
fn slide_paragraphs(slide_xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(slide_xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"a:p" => current.clear(),
                b"a:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) if e.name().as_ref() == b"a:br" => current.push(' '),
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"a:p" => {
                    let text = normalize_whitespace(&current);
                    if !text.is_empty() {
                        paragraphs.push(text);
                    }
                    current.clear();
                }
                b"a:t" => in_text = false,
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                current.push_str(&e.unescape().map_err(|e| ParseError::decode(FORMAT, e))?);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::decode(FORMAT, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(paragraphs)
}

impl Parser for PptxBackend {
    fn name(&self) -> &'static str {
        "pptx"
    }

    fn parse(&self, source: Source, options: &ParseOptions) -> Result<ParseResult> {
        let input = normalize_binary_source(source)?;
        let mut archive = open_package(FORMAT, &input.data)?;
        let slides = Self::slide_parts(&mut archive)?;

        let mut items: Vec<ParseItem> = Vec::new();
        for (index, part) in slides.iter().enumerate() {
            let slide_number = index + 1;
            let xml = require_part(FORMAT, &mut archive, part)?;
            let text = normalize_whitespace(&slide_paragraphs(&xml)?.join(" "));
            if text.is_empty() {
                continue;
            }
            items.push(
                ParseItem::new(format!("slide-{slide_number}"), text, items.len() + 1)
                    .with_metadata(metadata_from([("slide", json!(slide_number))])),
            );
        }
        log::debug!("PPTX: {} slides, {} with text", slides.len(), items.len());

        let mut result = ParseResult::new(self.name());
        result.source = input.resolved_path;
        result.items = items;
        result
            .metadata
            .insert("slide_count".to_string(), json!(slides.len()));
        Ok(finish_result(result, MIME_PPTX, options))
    }
}
