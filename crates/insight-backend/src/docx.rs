//! DOCX (Microsoft Word) document parser
//!
//! # Architecture
//!
//! Manual ZIP + XML parsing over `word/document.xml`:
//!
//! - Body paragraphs (`w:p` outside any table) become `para-<n>` items, `n`
//!   counting every body paragraph including empty ones.
//! - Rows of top-level tables become `table-<t>-row-<r>` items with the cell
//!   texts joined by spaces. Nested tables fold into their enclosing cell.
//!
//! Paragraph items come first, then table rows, with one position counter.

use insight_core::{
    normalize_binary_source, normalize_whitespace, Metadata, ParseError, ParseItem, ParseOptions,
    ParseResult, Result, Source, MIME_DOCX,
};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::json;

use crate::ooxml::{open_package, require_part};
use crate::traits::Parser;
use crate::utils::{finish_result, metadata_from};

const FORMAT: &str = "docx";

/// Text gathered from `word/document.xml`.
#[derive(Debug, Default, PartialEq, Eq)]
struct DocxBody {
    /// Every body paragraph, empty ones included
    paragraphs: Vec<String>,
    /// Tables → rows → cell texts
    tables: Vec<Vec<Vec<String>>>,
}

#[derive(Default)]
struct WalkBodyState {
    body: DocxBody,
    paragraph: String,
    paragraph_depth: usize,
    table_depth: usize,
    row: Vec<String>,
    cell: String,
    in_text: bool,
}

impl WalkBodyState {
    fn handle_start(&mut self, name: &[u8]) {
        match name {
            b"w:p" => {
                if self.paragraph_depth > 0 {
                    self.paragraph.push(' ');
                }
                self.paragraph_depth += 1;
            }
            b"w:t" => self.in_text = true,
            b"w:tbl" => {
                self.table_depth += 1;
                if self.table_depth == 1 {
                    self.body.tables.push(Vec::new());
                }
            }
            b"w:tr" if self.table_depth == 1 => self.row.clear(),
            b"w:tc" if self.table_depth == 1 => self.cell.clear(),
            _ => {}
        }
    }

    fn handle_empty(&mut self, name: &[u8]) {
        match name {
            b"w:tab" => self.paragraph.push('\t'),
            b"w:br" | b"w:cr" => self.paragraph.push('\n'),
            // An empty paragraph still counts
            b"w:p" if self.table_depth == 0 && self.paragraph_depth == 0 => {
                self.body.paragraphs.push(String::new());
            }
            _ => {}
        }
    }

    fn handle_end(&mut self, name: &[u8]) {
        match name {
            b"w:p" => {
                self.paragraph_depth = self.paragraph_depth.saturating_sub(1);
                if self.paragraph_depth == 0 {
                    let text = std::mem::take(&mut self.paragraph);
                    if self.table_depth == 0 {
                        self.body.paragraphs.push(text);
                    } else {
                        if !self.cell.is_empty() {
                            self.cell.push('\n');
                        }
                        self.cell.push_str(&text);
                    }
                }
            }
            b"w:t" => self.in_text = false,
            b"w:tc" if self.table_depth == 1 => {
                self.row.push(std::mem::take(&mut self.cell));
            }
            b"w:tr" if self.table_depth == 1 => {
                let row = std::mem::take(&mut self.row);
                if let Some(table) = self.body.tables.last_mut() {
                    table.push(row);
                }
            }
            b"w:tbl" => self.table_depth = self.table_depth.saturating_sub(1),
            _ => {}
        }
    }

    fn handle_text(&mut self, text: &str) {
        if self.in_text {
            self.paragraph.push_str(text);
        }
    }
}

/// Walk `word/document.xml`.
fn walk_body(xml: &str) -> Result<DocxBody> {
    let mut reader = Reader::from_str(xml);
    let mut state = WalkBodyState::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => state.handle_start(e.name().as_ref()),
            Ok(Event::Empty(e)) => state.handle_empty(e.name().as_ref()),
            Ok(Event::End(e)) => state.handle_end(e.name().as_ref()),
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|e| ParseError::decode(FORMAT, e))?;
                state.handle_text(&text);
            }
            Ok(Event::CData(e)) => state.handle_text(&String::from_utf8_lossy(&e)),
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::decode(FORMAT, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(state.body)
}

/// DOCX strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DocxBackend;

impl DocxBackend {
    /// Create a new DOCX backend
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn build_items(body: &DocxBody) -> Vec<ParseItem> {
        let mut items = Vec::new();
        for (index, paragraph) in body.paragraphs.iter().enumerate() {
            let text = normalize_whitespace(paragraph);
            if text.is_empty() {
                continue;
            }
            let number = index + 1;
            items.push(
                ParseItem::new(format!("para-{number}"), text, items.len() + 1)
                    .with_metadata(metadata_from([("paragraph", json!(number))])),
            );
        }

        for (table_index, table) in body.tables.iter().enumerate() {
            let table_number = table_index + 1;
            for (row_index, row) in table.iter().enumerate() {
                let text = normalize_whitespace(&row.join(" "));
                if text.is_empty() {
                    continue;
                }
                let row_number = row_index + 1;
                let metadata: Metadata =
                    metadata_from([("table", json!(table_number)), ("row", json!(row_number))]);
                items.push(
                    ParseItem::new(
                        format!("table-{table_number}-row-{row_number}"),
                        text,
                        items.len() + 1,
                    )
                    .with_metadata(metadata),
                );
            }
        }
        items
    }
}

impl Parser for DocxBackend {
    fn name(&self) -> &'static str {
        "docx"
    }

    fn parse(&self, source: Source, options: &ParseOptions) -> Result<ParseResult> {
        let input = normalize_binary_source(source)?;
        let mut archive = open_package(FORMAT, &input.data)?;
        let xml = require_part(FORMAT, &mut archive, "word/document.xml")?;
        let body = walk_body(&xml)?;
        log::debug!(
            "DOCX: {} paragraphs, {} tables",
            body.paragraphs.len(),
            body.tables.len()
        );

        let mut result = ParseResult::new(self.name());
        result.source = input.resolved_path;
        result.items = Self::build_items(&body);
        result
            .metadata
            .insert("paragraph_count".to_string(), json!(body.paragraphs.len()));
        result
            .metadata
            .insert("table_count".to_string(), json!(body.tables.len()));
        Ok(finish_result(result, MIME_DOCX, options))
    }
}
