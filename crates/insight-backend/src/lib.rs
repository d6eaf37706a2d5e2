//! Format strategies for insight-parse
//!
//! This crate turns Markdown, HTML, PDF, Office (OOXML and legacy binary),
//! spreadsheet and audio inputs into the canonical
//! [`ParseResult`](insight_core::ParseResult) defined in `insight-core`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      DocumentConverter                       │
//! │        (extension → format → registry name → strategy)       │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 ParserRegistry / Parser trait                │
//! │  fn parse(&self, source: Source, options) -> ParseResult     │
//! └──────────────────────────────────────────────────────────────┘
//!          │                    │                      │
//!          ▼                    ▼                      ▼
//!  ┌──────────────┐    ┌────────────────┐    ┌──────────────────┐
//!  │ PdfBackend   │    │ DocxBackend    │    │ AudioBackend     │
//!  │ (lopdf)      │    │ (zip + xml)    │    │ (MultiModal +    │
//!  │              │    │                │    │  recognizer)     │
//!  └──────────────┘    └────────────────┘    └──────────────────┘
//! ```
//!
//! # Supported Formats
//!
//! | Registry name | Backend | Inputs |
//! |---------------|---------|--------|
//! | `markdown` | [`MarkdownBackend`] | `CommonMark` with GFM extensions |
//! | `html` | [`HtmlBackend`] | HTML documents |
//! | `pdf` | [`PdfBackend`] | PDF text layer, page by page |
//! | `docx` | [`DocxBackend`] | Word 2007+ |
//! | `doc` | [`DocBackend`] | Word 97-2003, carved text |
//! | `pptx` | [`PptxBackend`] | `PowerPoint` 2007+ |
//! | `ppt` | [`PptBackend`] | `PowerPoint` 97-2003, carved text |
//! | `excel` | [`ExcelBackend`] | XLSX and XLS |
//! | `audio` | [`AudioBackend`] | WAV probing plus speech recognition |
//!
//! # Quick Start
//!
//! ```rust
//! use insight_backend::{default_registry, ParserConfig};
//! use insight_core::{ParseOptions, Source};
//!
//! let registry = default_registry();
//! let parser = registry.create("markdown", &ParserConfig::new())?;
//! let result = parser.parse(
//!     Source::content("# Title\n\nBody paragraph."),
//!     &ParseOptions::new(),
//! )?;
//! assert_eq!(result.items.len(), 2);
//! assert_eq!(result.items[0].id, "chunk-1");
//! # Ok::<(), insight_core::ParseError>(())
//! ```

pub mod audio;
pub mod converter;
pub mod docx;
pub mod html;
pub mod legacy;
pub mod markdown;
pub mod multimodal;
pub mod ooxml;
pub mod pdf;
pub mod pptx;
pub mod registry;
pub mod traits;
pub mod utils;
pub mod xlsx;

pub use audio::{AudioBackend, AudioConfig, RecognizerResolver};
pub use converter::DocumentConverter;
pub use docx::DocxBackend;
pub use html::HtmlBackend;
pub use legacy::{DocBackend, PptBackend};
pub use markdown::MarkdownBackend;
pub use multimodal::{
    dispatch, HandlerError, HandlerResult, MediaDispatch, MediaHandler, MultiModalParser,
};
pub use pdf::PdfBackend;
pub use pptx::PptxBackend;
pub use registry::{default_registry, ParserConfig, ParserConstructor, ParserRegistry};
pub use traits::Parser;
pub use xlsx::{ExcelBackend, ExcelFormat};
