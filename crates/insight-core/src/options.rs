//! Per-call parse options.
//!
//! Options arrive either from code (builder methods) or as an open JSON map
//! from a host application. Keys a strategy does not recognize are ignored;
//! a recognized key holding the wrong type is [`ParseError::InvalidOptions`].

use serde::{Deserialize, Serialize};

use crate::error::{ParseError, Result};
use crate::types::Metadata;

/// Options recognized across strategies.
///
/// # Examples
///
/// ```rust
/// use insight_core::ParseOptions;
///
/// let options = ParseOptions::new()
///     .with_base_url("http://a.com/docs/")
///     .with_content_type("text/markdown");
/// assert_eq!(options.base_url.as_deref(), Some("http://a.com/docs/"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Declared content type
    pub content_type: Option<String>,
    /// Base for resolving relative URLs
    pub base_url: Option<String>,
    /// Merged into result metadata; caller keys win
    pub metadata: Metadata,
    /// Explicit file extension, with or without the leading dot
    #[serde(alias = "file_extension")]
    pub extension: Option<String>,
    /// Page selector (accepted, currently unused)
    pub page: Option<u32>,
    /// Encoding label for text sources read from disk
    pub encoding: Option<String>,
    /// Markdown extensions to enable
    pub plugins: Option<Vec<String>>,
    /// Speech model name
    pub model: Option<String>,
    /// Speech language
    pub lang: Option<String>,
    /// Target sample rate for transcription
    pub sample_rate: Option<u32>,
    /// Transcription decode method
    pub decode_method: Option<String>,
    /// Recognizer configuration file
    pub config: Option<String>,
    /// Recognizer checkpoint path
    pub ckpt_path: Option<String>,
}

impl ParseOptions {
    /// Empty options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an open key/value map, ignoring unknown keys.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidOptions`] if a recognized key holds a
    /// value of the wrong type.
    pub fn from_map(map: Metadata) -> Result<Self> {
        serde_json::from_value(serde_json::Value::Object(map))
            .map_err(|e| ParseError::InvalidOptions(e.to_string()))
    }

    /// Set the declared content type.
    #[inline]
    #[must_use = "returns the updated options"]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the base URL.
    #[inline]
    #[must_use = "returns the updated options"]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set caller metadata.
    #[inline]
    #[must_use = "returns the updated options"]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set the explicit extension.
    #[inline]
    #[must_use = "returns the updated options"]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    /// Set the encoding label for path reads.
    #[inline]
    #[must_use = "returns the updated options"]
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Set the Markdown extensions.
    #[inline]
    #[must_use = "returns the updated options"]
    pub fn with_plugins<I, S>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plugins = Some(plugins.into_iter().map(Into::into).collect());
        self
    }

    /// Explicit extension, lowercased, with a leading dot.
    #[must_use]
    pub fn dotted_extension(&self) -> Option<String> {
        let ext = self.extension.as_deref()?.trim();
        if ext.is_empty() {
            return None;
        }
        let ext = ext.to_ascii_lowercase();
        Some(if ext.starts_with('.') { ext } else { format!(".{ext}") })
    }

    /// Declared content type, lowercased and stripped of parameters.
    #[must_use]
    pub fn essence_content_type(&self) -> Option<String> {
        let content_type = self.content_type.as_deref()?;
        let essence = content_type.split(';').next().unwrap_or(content_type).trim();
        (!essence.is_empty()).then(|| essence.to_ascii_lowercase())
    }
}
