//! PDF Backend - Page-by-page text extraction with `lopdf`
//!
//! Each page's text is split into paragraphs; a page whose text does not
//! split into anything but is not blank is kept whole. Positions run across
//! pages, and item ids are scoped by page (`page-<p>-chunk-<n>`) so they stay
//! unique. A failure on any page fails the whole parse.

use insight_core::{
    build_items_from_chunks, next_position, normalize_binary_source, split_into_paragraphs,
    BoxError, Metadata, ParseError, ParseItem, ParseOptions, ParseResult, Result, Source,
    MIME_PDF,
};
use lopdf::Document;
use serde_json::json;

use crate::traits::Parser;
use crate::utils::finish_result;

/// Per-page text access.
trait PageText {
    /// Page numbers in reading order (1-based).
    fn page_numbers(&self) -> Vec<u32>;

    /// Extracted text of one page.
    fn page_text(&self, page: u32) -> std::result::Result<String, BoxError>;
}

impl PageText for Document {
    fn page_numbers(&self) -> Vec<u32> {
        self.get_pages().keys().copied().collect()
    }

    fn page_text(&self, page: u32) -> std::result::Result<String, BoxError> {
        self.extract_text(&[page]).map_err(Into::into)
    }
}

/// PDF strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PdfBackend;

impl PdfBackend {
    /// Create a new PDF backend
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Paragraphs of one page's text.
    fn page_paragraphs(text: &str) -> Vec<String> {
        let paragraphs = split_into_paragraphs(text);
        if paragraphs.is_empty() && !text.trim().is_empty() {
            vec![text.to_string()]
        } else {
            paragraphs
        }
    }

    fn collect_items(pages: &dyn PageText) -> Result<(Vec<ParseItem>, usize)> {
        let page_numbers = pages.page_numbers();
        let mut items: Vec<ParseItem> = Vec::new();

        for &page in &page_numbers {
            let text = pages
                .page_text(page)
                .map_err(|e| {
                    ParseError::external(format!("extract text from PDF page {page}"), e)
                })?;
            let paragraphs = Self::page_paragraphs(&text);

            let page_metadata = |_: usize, _: &str| {
                let mut metadata = Metadata::new();
                metadata.insert("page".to_string(), json!(page));
                metadata
            };
            let page_items =
                build_items_from_chunks(&paragraphs, next_position(&items), Some(&page_metadata));
            log::debug!("PDF page {page}: {} items", page_items.len());

            items.extend(page_items.into_iter().map(|mut item| {
                item.id = format!("page-{page}-{}", item.id);
                item
            }));
        }
        Ok((items, page_numbers.len()))
    }
}

impl Parser for PdfBackend {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn parse(&self, source: Source, options: &ParseOptions) -> Result<ParseResult> {
        let input = normalize_binary_source(source)?;
        let document = Document::load_mem(&input.data).map_err(|e| ParseError::decode("pdf", e))?;
        let (items, page_count) = Self::collect_items(&document)?;

        let mut result = ParseResult::new(self.name());
        result.source = input.resolved_path;
        result.items = items;
        result
            .metadata
            .insert("page_count".to_string(), json!(page_count));
        result
            .metadata
            .insert("pdf_version".to_string(), json!(document.version));
        Ok(finish_result(result, MIME_PDF, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    struct FakePages(BTreeMap<u32, Option<&'static str>>);

    impl PageText for FakePages {
        fn page_numbers(&self) -> Vec<u32> {
            self.0.keys().copied().collect()
        }

        fn page_text(&self, page: u32) -> std::result::Result<String, BoxError> {
            match self.0.get(&page).copied().flatten() {
                Some(text) => Ok(text.to_string()),
                None => Err("content stream is corrupt".into()),
            }
        }
    }

    fn pages(texts: &[Option<&'static str>]) -> FakePages {
        FakePages((1..).zip(texts.iter().copied()).collect())
    }

    /// Test 1: positions continue across pages, ids stay unique
    #[test]
    fn test_positions_continue_across_pages() {
        let fake = pages(&[Some("One\n\nTwo"), Some(""), Some("Three")]);
        let (items, page_count) = PdfBackend::collect_items(&fake).unwrap();
        assert_eq!(page_count, 3);
        let summary: Vec<(&str, usize, u64)> = items
            .iter()
            .map(|i| {
                (
                    i.id.as_str(),
                    i.position,
                    i.metadata["page"].as_u64().unwrap(),
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("page-1-chunk-1", 1, 1),
                ("page-1-chunk-2", 2, 1),
                ("page-3-chunk-1", 3, 3),
            ]
        );
    }

    /// Test 2: any page failure fails the parse
    #[test]
    fn test_page_failure_is_fatal() {
        let err = PdfBackend::collect_items(&pages(&[Some("fine"), None])).unwrap_err();
        assert!(matches!(err, ParseError::ExternalOperation { .. }));
        assert!(err.to_string().contains("page 2"));
    }

    /// Test 3: whitespace-only page contributes nothing
    #[test]
    fn test_page_paragraphs() {
        assert!(PdfBackend::page_paragraphs(" \n\t ").is_empty());
        assert_eq!(PdfBackend::page_paragraphs("a\n\nb"), vec!["a", "b"]);
    }

    /// Test 4: non-PDF bytes are a decode failure
    #[test]
    fn test_invalid_bytes() {
        let err = PdfBackend
            .parse_bytes(b"definitely not a pdf", &ParseOptions::new())
            .unwrap_err();
        assert!(matches!(err, ParseError::DecodeFailure { format: "pdf", .. }));
    }

    /// Test 5: literal content is not a PDF source
    #[test]
    fn test_literal_content_rejected() {
        let err = PdfBackend
            .parse(Source::content("hello"), &ParseOptions::new())
            .unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedSourceType(_)));
    }

    /// Test 6: missing path-like string
    #[test]
    fn test_missing_path() {
        let err = PdfBackend
            .parse(Source::from("reports/2024/q1.pdf"), &ParseOptions::new())
            .unwrap_err();
        assert!(matches!(err, ParseError::SourceNotFound(_)));
    }
}
