//! Document formats the built-in strategies understand.
//!
//! Maps file extensions to the registry name of the strategy that handles
//! them and to a canonical content type.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Content type for Markdown.
pub const MIME_MARKDOWN: &str = "text/markdown";
/// Content type for HTML.
pub const MIME_HTML: &str = "text/html";
/// Content type for PDF.
pub const MIME_PDF: &str = "application/pdf";
/// Content type for DOCX.
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
/// Content type for legacy Word.
pub const MIME_DOC: &str = "application/msword";
/// Content type for PPTX.
pub const MIME_PPTX: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
/// Content type for legacy `PowerPoint`.
pub const MIME_PPT: &str = "application/vnd.ms-powerpoint";
/// Content type for XLSX.
pub const MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// Content type for legacy Excel.
pub const MIME_XLS: &str = "application/vnd.ms-excel";
/// Content type for WAV.
pub const MIME_WAV: &str = "audio/wav";

/// Input document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Markdown (.md, .markdown)
    Markdown,
    /// HTML (.html, .htm)
    Html,
    /// PDF
    Pdf,
    /// Word 2007+ (.docx)
    Docx,
    /// Word 97-2003 (.doc)
    Doc,
    /// `PowerPoint` 2007+ (.pptx)
    Pptx,
    /// `PowerPoint` 97-2003 (.ppt)
    Ppt,
    /// Excel 2007+ (.xlsx)
    Xlsx,
    /// Excel 97-2003 (.xls)
    Xls,
    /// Audio (.wav, .mp3, .flac, .aac, .ogg, .m4a)
    Audio,
}

impl DocumentFormat {
    /// Format for an extension, with or without the leading dot.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "html" | "htm" => Some(Self::Html),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "doc" => Some(Self::Doc),
            "pptx" => Some(Self::Pptx),
            "ppt" => Some(Self::Ppt),
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            "wav" | "mp3" | "flac" | "aac" | "ogg" | "m4a" => Some(Self::Audio),
            _ => None,
        }
    }

    /// Format for a path's extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Registry name of the strategy handling this format.
    #[inline]
    #[must_use = "returns the parser name without side effects"]
    pub const fn parser_name(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Doc => "doc",
            Self::Pptx => "pptx",
            Self::Ppt => "ppt",
            Self::Xlsx | Self::Xls => "excel",
            Self::Audio => "audio",
        }
    }

    /// Canonical content type.
    #[inline]
    #[must_use = "returns the content type without side effects"]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Markdown => MIME_MARKDOWN,
            Self::Html => MIME_HTML,
            Self::Pdf => MIME_PDF,
            Self::Docx => MIME_DOCX,
            Self::Doc => MIME_DOC,
            Self::Pptx => MIME_PPTX,
            Self::Ppt => MIME_PPT,
            Self::Xlsx => MIME_XLSX,
            Self::Xls => MIME_XLS,
            Self::Audio => MIME_WAV,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Markdown => "Markdown",
            Self::Html => "HTML",
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
            Self::Doc => "DOC",
            Self::Pptx => "PPTX",
            Self::Ppt => "PPT",
            Self::Xlsx => "XLSX",
            Self::Xls => "XLS",
            Self::Audio => "Audio",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(DocumentFormat::from_extension("pdf"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_extension(".PDF"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_extension("htm"), Some(DocumentFormat::Html));
        assert_eq!(DocumentFormat::from_extension("rtf"), None);
    }

    #[test]
    fn test_spreadsheets_share_parser() {
        assert_eq!(DocumentFormat::Xls.parser_name(), "excel");
        assert_eq!(DocumentFormat::Xlsx.parser_name(), "excel");
        assert_ne!(
            DocumentFormat::Xls.content_type(),
            DocumentFormat::Xlsx.content_type()
        );
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("/tmp/deck.PPTX")),
            Some(DocumentFormat::Pptx)
        );
        assert_eq!(DocumentFormat::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&DocumentFormat::Markdown).unwrap();
        assert_eq!(json, r#""markdown""#);
        assert_eq!(DocumentFormat::Doc.to_string(), "DOC");
    }
}
