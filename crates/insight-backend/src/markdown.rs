//! Markdown Backend - Extract paragraphs and images from Markdown
//!
//! Parses Markdown with `pulldown-cmark` into a small closed node tree, then
//! walks the tree once, collecting one paragraph string per block-level node
//! and one image attachment per inline image.
//!
//! ## Features
//! - Paragraphs, headings (H1-H6), list items and block quotes → one item each
//! - Nested list items → their own items, never folded into the parent item's text
//! - Fenced and indented code blocks → one item each
//! - Tables → one item per cell (head before body, row by row, left to right)
//! - Images → `img-<n>` attachments, URLs resolved against `base_url`
//! - Thematic breaks and raw HTML contribute nothing
//!
//! ## Architecture
//! The event stream is folded into [`Node`]s with an explicit frame stack.
//! Nested lists are walked after their parent item so every item yields its
//! own paragraph; everything below a paragraph-level node flattens into that
//! node's text.
//!
//! ## Options
//! - `base_url`: base for relative image URLs
//! - `plugins`: parser extensions (`table`, `strikethrough`, `footnotes`,
//!   `task_lists`, `url`); defaults to the first three plus `url`
//! - `encoding`: label used when reading from a path

// Clippy pedantic allows:
// - Unit struct &self convention
#![allow(clippy::trivially_copy_pass_by_ref)]

use insight_core::{
    build_items_from_chunks, normalize_text_source, Attachment, MediaKind, ParseOptions,
    ParseResult, Result, Source, MIME_MARKDOWN,
};
use pulldown_cmark::{Event, Options, Parser as CmarkParser, Tag};
use serde_json::json;

use crate::traits::Parser;
use crate::utils::{finish_result, mime_type_from_url, resolve_url};

/// Plugins enabled when the caller does not pass `plugins`.
pub const DEFAULT_PLUGINS: [&str; 4] = ["table", "strikethrough", "footnotes", "url"];

/// Markdown strategy.
///
/// # Examples
///
/// ```rust
/// use insight_backend::{MarkdownBackend, Parser};
/// use insight_core::{ParseOptions, Source};
///
/// let backend = MarkdownBackend;
/// let result = backend.parse(Source::content("# Title\n\nBody text"), &ParseOptions::new())?;
/// assert_eq!(result.items.len(), 2);
/// assert_eq!(result.items[0].text.as_deref(), Some("Title"));
/// # Ok::<(), insight_core::ParseError>(())
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MarkdownBackend;

impl MarkdownBackend {
    /// Create a new Markdown backend
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Parser for MarkdownBackend {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn parse(&self, source: Source, options: &ParseOptions) -> Result<ParseResult> {
        let input = normalize_text_source(source, options.encoding.as_deref())?;

        let tree = build_tree(CmarkParser::new_ext(&input.text, parser_options(options)));
        let mut collector = Collector::new(options.base_url.as_deref());
        for node in &tree {
            collector.walk(node);
        }
        log::debug!(
            "Markdown: {} paragraphs, {} images",
            collector.paragraphs.len(),
            collector.images.len()
        );

        let mut result = ParseResult::new(self.name());
        result.source = input.resolved_path;
        result.items = build_items_from_chunks(&collector.paragraphs, 1, None);
        result
            .metadata
            .insert("image_count".to_string(), json!(collector.images.len()));
        result.attachments = collector.images;
        Ok(finish_result(result, MIME_MARKDOWN, options))
    }
}

fn parser_options(options: &ParseOptions) -> Options {
    let mut flags = Options::empty();
    let plugins: Vec<&str> = options.plugins.as_ref().map_or_else(
        || DEFAULT_PLUGINS.to_vec(),
        |plugins| plugins.iter().map(String::as_str).collect(),
    );
    for plugin in plugins {
        match plugin.trim().to_ascii_lowercase().as_str() {
            "table" | "tables" => flags.insert(Options::ENABLE_TABLES),
            "strikethrough" => flags.insert(Options::ENABLE_STRIKETHROUGH),
            "footnotes" => flags.insert(Options::ENABLE_FOOTNOTES),
            "task_lists" | "tasklists" => flags.insert(Options::ENABLE_TASKLISTS),
            // Bare URLs are already plain text to the extractor
            "url" => {}
            other => log::debug!("Ignoring unknown markdown plugin '{other}'"),
        }
    }
    flags
}

/// Closed set of node kinds the walker understands.
#[derive(Debug, Clone, PartialEq)]
enum Node {
    Paragraph(Vec<Node>),
    Heading(Vec<Node>),
    BlockQuote(Vec<Node>),
    List(Vec<Node>),
    Item(Vec<Node>),
    CodeBlock(Vec<Node>),
    TableCell(Vec<Node>),
    Image {
        url: String,
        title: String,
        alt: Vec<Node>,
    },
    /// Tables, rows, inline formatting, links, footnote definitions
    Container(Vec<Node>),
    Text(String),
    Break,
    /// Raw HTML, rules, task markers
    Ignored,
}

/// Open frame on the build stack.
enum Frame {
    Paragraph,
    Heading,
    BlockQuote,
    List,
    Item,
    CodeBlock,
    TableCell,
    Image { url: String, title: String },
    Container,
    Ignored,
}

impl Frame {
    fn open(tag: Tag<'_>) -> Self {
        match tag {
            Tag::Paragraph => Self::Paragraph,
            Tag::Heading { .. } => Self::Heading,
            Tag::BlockQuote(_) => Self::BlockQuote,
            Tag::CodeBlock(_) => Self::CodeBlock,
            Tag::List(_) => Self::List,
            Tag::Item => Self::Item,
            Tag::TableCell => Self::TableCell,
            Tag::Image {
                dest_url, title, ..
            } => Self::Image {
                url: dest_url.into_string(),
                title: title.into_string(),
            },
            Tag::HtmlBlock | Tag::MetadataBlock(_) => Self::Ignored,
            _ => Self::Container,
        }
    }

    fn close(self, children: Vec<Node>) -> Node {
        match self {
            Self::Paragraph => Node::Paragraph(children),
            Self::Heading => Node::Heading(children),
            Self::BlockQuote => Node::BlockQuote(children),
            Self::List => Node::List(children),
            Self::Item => Node::Item(children),
            Self::CodeBlock => Node::CodeBlock(children),
            Self::TableCell => Node::TableCell(children),
            Self::Image { url, title } => Node::Image {
                url,
                title,
                alt: children,
            },
            Self::Container => Node::Container(children),
            Self::Ignored => Node::Ignored,
        }
    }
}

fn build_tree<'a>(events: impl Iterator<Item = Event<'a>>) -> Vec<Node> {
    let mut stack: Vec<(Frame, Vec<Node>)> = vec![(Frame::Container, Vec::new())];

    fn attach(stack: &mut [(Frame, Vec<Node>)], node: Node) {
        if let Some((_, children)) = stack.last_mut() {
            children.push(node);
        }
    }

    fn close_top(stack: &mut Vec<(Frame, Vec<Node>)>) {
        if stack.len() > 1 {
            if let Some((frame, children)) = stack.pop() {
                let node = frame.close(children);
                attach(stack, node);
            }
        }
    }

    for event in events {
        match event {
            Event::Start(tag) => stack.push((Frame::open(tag), Vec::new())),
            Event::End(_) => close_top(&mut stack),
            Event::Text(text) | Event::Code(text) => {
                attach(&mut stack, Node::Text(text.into_string()));
            }
            Event::SoftBreak | Event::HardBreak => attach(&mut stack, Node::Break),
            _ => attach(&mut stack, Node::Ignored),
        }
    }
    while stack.len() > 1 {
        close_top(&mut stack);
    }
    stack.pop().map(|(_, children)| children).unwrap_or_default()
}

struct Collector<'a> {
    base_url: Option<&'a str>,
    paragraphs: Vec<String>,
    images: Vec<Attachment>,
}

impl<'a> Collector<'a> {
    const fn new(base_url: Option<&'a str>) -> Self {
        Self {
            base_url,
            paragraphs: Vec::new(),
            images: Vec::new(),
        }
    }

    fn push(&mut self, text: &str) {
        let text = text.trim();
        if !text.is_empty() {
            self.paragraphs.push(text.to_string());
        }
    }

    fn walk(&mut self, node: &Node) {
        match node {
            Node::Paragraph(children)
            | Node::Heading(children)
            | Node::BlockQuote(children)
            | Node::TableCell(children) => {
                let text = self.inline_text(children);
                self.push(&text);
            }
            Node::Item(children) => {
                let (nested, own): (Vec<&Node>, Vec<&Node>) = children
                    .iter()
                    .partition(|child| matches!(child, Node::List(_)));
                let mut text = String::new();
                for child in own {
                    self.append_inline(child, &mut text);
                }
                self.push(&text);
                for list in nested {
                    self.walk(list);
                }
            }
            Node::CodeBlock(children) => {
                let code: String = children
                    .iter()
                    .filter_map(|child| match child {
                        Node::Text(text) => Some(text.as_str()),
                        _ => None,
                    })
                    .collect();
                self.push(&code);
            }
            Node::List(children) | Node::Container(children) => {
                for child in children {
                    self.walk(child);
                }
            }
            Node::Image { .. } => {
                let text = self.inline_text(std::slice::from_ref(node));
                self.push(&text);
            }
            Node::Text(_) | Node::Break | Node::Ignored => {}
        }
    }

    fn inline_text(&mut self, nodes: &[Node]) -> String {
        let mut text = String::new();
        for node in nodes {
            self.append_inline(node, &mut text);
        }
        text
    }

    fn append_inline(&mut self, node: &Node, out: &mut String) {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Break => out.push(' '),
            Node::Image { url, title, alt } => {
                let alt_text = self.inline_text(alt);
                self.register_image(url, title, alt_text.trim());
                out.push_str(&alt_text);
            }
            Node::Paragraph(children)
            | Node::Heading(children)
            | Node::BlockQuote(children)
            | Node::List(children)
            | Node::Item(children)
            | Node::CodeBlock(children)
            | Node::TableCell(children) => {
                if !out.is_empty() {
                    out.push(' ');
                }
                for child in children {
                    self.append_inline(child, out);
                }
            }
            Node::Container(children) => {
                for child in children {
                    self.append_inline(child, out);
                }
            }
            Node::Ignored => {}
        }
    }

    fn register_image(&mut self, url: &str, title: &str, alt: &str) {
        let url = url.trim();
        if url.is_empty() {
            return;
        }
        let resolved = resolve_url(self.base_url, url);
        let mut attachment =
            Attachment::new(format!("img-{}", self.images.len() + 1), MediaKind::Image);
        attachment.mime = mime_type_from_url(&resolved).map(str::to_string);
        if !alt.is_empty() {
            attachment.metadata.insert("alt".to_string(), json!(alt));
        }
        if !title.is_empty() {
            attachment.metadata.insert("title".to_string(), json!(title));
        }
        attachment.url = Some(resolved);
        self.images.push(attachment);
    }
}
