//! # Insight Core - Canonical Parse Model
//!
//! Shared foundation for the insight-parse strategies: the result shape every
//! parser produces, the error taxonomy, source normalization and the text
//! helpers that assign ids and positions.
//!
//! ## Architecture
//!
//! - [`types`]: `ParseItem`, `Attachment`, `MediaSegment`, `ParseResult`
//! - [`error`]: `ParseError` and the `Result` alias
//! - [`source`]: the `Source` sum type and the text/binary normalizers
//! - [`text`]: whitespace normalization, paragraph splitting, chunk to item
//! - [`options`]: per-call `ParseOptions`
//! - [`format`]: extension to strategy-name mapping
//!
//! ## Quick Start
//!
//! ```rust
//! use insight_core::{build_items_from_chunks, split_into_paragraphs};
//!
//! let paragraphs = split_into_paragraphs("First paragraph.\n\nSecond one.");
//! let items = build_items_from_chunks(&paragraphs, 1, None);
//! assert_eq!(items.len(), 2);
//! assert_eq!(items[1].id, "chunk-2");
//! assert_eq!(items[1].position, 2);
//! ```

pub mod error;
pub mod format;
pub mod options;
pub mod source;
pub mod text;
pub mod types;

pub use error::{BoxError, ParseError, Result};
pub use format::{
    DocumentFormat, MIME_DOC, MIME_DOCX, MIME_HTML, MIME_MARKDOWN, MIME_PDF, MIME_PPT, MIME_PPTX,
    MIME_WAV, MIME_XLS, MIME_XLSX,
};
pub use options::ParseOptions;
pub use source::{
    classify_string, decode_bytes, looks_like_path, normalize_binary_source,
    normalize_text_source, BinarySource, ReadMode, ReaderStream, Source, SourceStream,
    StreamPayload, StringSource, TextSource,
};
pub use text::{
    build_items_from_chunks, next_position, normalize_whitespace, split_into_paragraphs,
    MetadataFn,
};
pub use types::{
    Attachment, BoundingBox, Confidence, MediaKind, MediaSegment, Metadata, ModelError, ParseItem,
    ParseResult,
};
