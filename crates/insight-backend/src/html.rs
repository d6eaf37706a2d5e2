//! HTML Backend - Extract block text and images from HTML
//!
//! Parses HTML with `scraper` (html5ever) and collects:
//!
//! - Text of block-level tags (`p`, `li`, `h1`-`h6`, `blockquote`, `pre`) in
//!   document order. `pre` keeps its line structure; every other block joins
//!   its descendant text nodes with single spaces.
//! - If no block tag matched anywhere, every text node outside `script` and
//!   `style`, split into paragraphs on blank lines.
//! - One `img-<n>` attachment per `<img>` with a non-empty `src`. The index
//!   counts every `<img>`, so skipped images still consume a number.
//!
//! Relative image URLs resolve against the `base_url` option, else the
//! document's `<base href>`, else stay as written.

use insight_core::{
    build_items_from_chunks, normalize_text_source, split_into_paragraphs, Attachment, MediaKind,
    ParseError, ParseOptions, ParseResult, Result, Source, MIME_HTML,
};
use scraper::{ElementRef, Html, Selector};
use serde_json::json;

use crate::traits::Parser;
use crate::utils::{finish_result, parse_dimension, resolve_url};

const BLOCK_SELECTOR: &str = "p, li, h1, h2, h3, h4, h5, h6, blockquote, pre";

/// HTML strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HtmlBackend;

impl HtmlBackend {
    /// Create a new HTML backend
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn block_paragraphs(document: &Html) -> Result<Vec<String>> {
        let blocks = selector(BLOCK_SELECTOR)?;
        Ok(document
            .select(&blocks)
            .filter_map(|element| {
                let separator = if element.value().name() == "pre" {
                    "\n"
                } else {
                    " "
                };
                let text = stripped_text(element, separator);
                (!text.is_empty()).then_some(text)
            })
            .collect())
    }

    fn fallback_paragraphs(document: &Html) -> Vec<String> {
        let text = document
            .root_element()
            .descendants()
            .filter(|node| {
                !node.ancestors().any(|ancestor| {
                    ancestor
                        .value()
                        .as_element()
                        .is_some_and(|e| matches!(e.name(), "script" | "style"))
                })
            })
            .filter_map(|node| node.value().as_text())
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        split_into_paragraphs(&text)
    }

    fn base_url(document: &Html, options: &ParseOptions) -> Result<Option<String>> {
        if let Some(base_url) = options.base_url.as_deref() {
            return Ok(Some(base_url.to_string()));
        }
        let base = selector("base[href]")?;
        Ok(document
            .select(&base)
            .find_map(|element| element.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(str::to_string))
    }

    fn images(document: &Html, base_url: Option<&str>) -> Result<Vec<Attachment>> {
        let img = selector("img")?;
        let mut attachments = Vec::new();
        for (index, element) in document.select(&img).enumerate() {
            let value = element.value();
            let Some(src) = value.attr("src").map(str::trim).filter(|s| !s.is_empty()) else {
                continue;
            };
            let mut attachment = Attachment::new(format!("img-{}", index + 1), MediaKind::Image);
            attachment.url = Some(resolve_url(base_url, src));
            attachment.mime = value
                .attr("type")
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            attachment.width = parse_dimension(value.attr("width"));
            attachment.height = parse_dimension(value.attr("height"));
            if let Some(alt) = value.attr("alt").map(str::trim).filter(|a| !a.is_empty()) {
                attachment.metadata.insert("alt".to_string(), json!(alt));
            }
            attachments.push(attachment);
        }
        Ok(attachments)
    }

    fn title(document: &Html) -> Result<Option<String>> {
        let title = selector("title")?;
        Ok(document
            .select(&title)
            .next()
            .map(|element| stripped_text(element, " "))
            .filter(|title| !title.is_empty()))
    }
}

impl Parser for HtmlBackend {
    fn name(&self) -> &'static str {
        "html"
    }

    fn parse(&self, source: Source, options: &ParseOptions) -> Result<ParseResult> {
        let input = normalize_text_source(source, options.encoding.as_deref())?;
        let document = Html::parse_document(&input.text);

        let mut paragraphs = Self::block_paragraphs(&document)?;
        if paragraphs.is_empty() {
            log::debug!("HTML: no block-level tags, falling back to full text");
            paragraphs = Self::fallback_paragraphs(&document);
        }

        let base_url = Self::base_url(&document, options)?;
        let attachments = Self::images(&document, base_url.as_deref())?;

        let mut result = ParseResult::new(self.name());
        result.source = input.resolved_path;
        result.items = build_items_from_chunks(&paragraphs, 1, None);
        if let Some(title) = Self::title(&document)? {
            result.metadata.insert("title".to_string(), json!(title));
        }
        result
            .metadata
            .insert("image_count".to_string(), json!(attachments.len()));
        result.attachments = attachments;
        Ok(finish_result(result, MIME_HTML, options))
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| ParseError::decode_msg("html", format!("Invalid selector '{css}': {e}")))
}

/// Descendant text nodes, each trimmed, empties dropped, joined by `separator`.
fn stripped_text(element: ElementRef<'_>, separator: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}
