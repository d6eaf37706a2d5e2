//! Media-kind dispatch for strategies covering several related media types.
//!
//! A [`MultiModalParser`] implements some of `parse_text`, `parse_image`,
//! `parse_video` and `parse_audio`; [`dispatch`] decides which one a call
//! goes to:
//!
//! 1. a `content_type` option is matched against the prefix table in
//!    registration order
//! 2. a path or bare string is matched by extension; no match goes to
//!    `parse_text`
//! 3. raw bytes try image, then video, then audio
//!
//! Handlers that do not apply return [`HandlerError::NotImplemented`].
//! Strategies extend the tables by returning their own [`MediaDispatch`]
//! (built once, usually in a `Lazy` static) from `media_dispatch`.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;

use insight_core::{MediaKind, ParseError, ParseOptions, ParseResult, Result, Source};

/// Outcome of a kind-specific handler.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The strategy does not handle this media kind
    #[error("media kind not handled by this parser")]
    NotImplemented,
    /// The strategy handles it but parsing failed
    #[error(transparent)]
    Failed(#[from] ParseError),
}

/// Result of a kind-specific handler.
pub type HandlerResult = std::result::Result<ParseResult, HandlerError>;

/// Handler a dispatch table entry routes to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MediaHandler {
    /// `parse_text`
    Text,
    /// `parse_image`
    Image,
    /// `parse_video`
    Video,
    /// `parse_audio`
    Audio,
    /// `parse_custom` with the given handler name
    Custom(String),
}

impl MediaHandler {
    /// Media kind the handler covers, if it is one of the built-in kinds.
    #[must_use]
    pub const fn media_kind(&self) -> Option<MediaKind> {
        match self {
            Self::Text => Some(MediaKind::Text),
            Self::Image => Some(MediaKind::Image),
            Self::Video => Some(MediaKind::Video),
            Self::Audio => Some(MediaKind::Audio),
            Self::Custom(_) => None,
        }
    }
}

/// Content-type prefix and extension tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDispatch {
    prefixes: Vec<(String, MediaHandler)>,
    extensions: HashMap<String, MediaHandler>,
}

impl Default for MediaDispatch {
    fn default() -> Self {
        let mut dispatch = Self {
            prefixes: Vec::new(),
            extensions: HashMap::new(),
        };
        dispatch.register_media("image/", MediaHandler::Image);
        dispatch.register_media("video/", MediaHandler::Video);
        dispatch.register_media("audio/", MediaHandler::Audio);
        dispatch.register_media("text/", MediaHandler::Text);
        for ext in [".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff"] {
            dispatch.register_extension(ext, MediaHandler::Image);
        }
        for ext in [".mp4", ".mov", ".avi", ".mkv", ".webm"] {
            dispatch.register_extension(ext, MediaHandler::Video);
        }
        for ext in [".mp3", ".wav", ".flac", ".aac"] {
            dispatch.register_extension(ext, MediaHandler::Audio);
        }
        dispatch
    }
}

/// Base tables shared by strategies that do not extend them.
pub static BASE_DISPATCH: Lazy<MediaDispatch> = Lazy::new(MediaDispatch::default);

impl MediaDispatch {
    /// Append a content-type prefix; earlier registrations win on overlap.
    pub fn register_media(&mut self, prefix: &str, handler: MediaHandler) {
        self.prefixes.push((prefix.to_ascii_lowercase(), handler));
    }

    /// Map an extension (with or without the dot) to a handler.
    pub fn register_extension(&mut self, extension: &str, handler: MediaHandler) {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        self.extensions.insert(format!(".{ext}"), handler);
    }

    /// Builder form of [`MediaDispatch::register_media`].
    #[must_use = "returns the extended table"]
    pub fn with_media(mut self, prefix: &str, handler: MediaHandler) -> Self {
        self.register_media(prefix, handler);
        self
    }

    /// Builder form of [`MediaDispatch::register_extension`].
    #[must_use = "returns the extended table"]
    pub fn with_extension(mut self, extension: &str, handler: MediaHandler) -> Self {
        self.register_extension(extension, handler);
        self
    }

    /// First registered prefix matching the lowercased content type.
    #[must_use]
    pub fn handler_for_content_type(&self, content_type: &str) -> Option<&MediaHandler> {
        let content_type = content_type.trim().to_ascii_lowercase();
        self.prefixes
            .iter()
            .find(|(prefix, _)| content_type.starts_with(prefix.as_str()))
            .map(|(_, handler)| handler)
    }

    /// Handler for a path's extension.
    #[must_use]
    pub fn handler_for_path(&self, path: &Path) -> Option<&MediaHandler> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.extensions.get(&format!(".{ext}"))
    }
}

/// Strategy split into per-media-kind handlers.
pub trait MultiModalParser: Send + Sync {
    /// Dispatch tables for this strategy.
    fn media_dispatch(&self) -> &MediaDispatch {
        &BASE_DISPATCH
    }

    /// Generic text extraction.
    ///
    /// # Errors
    ///
    /// [`HandlerError::NotImplemented`] unless overridden.
    fn parse_text(&self, _source: Source, _options: &ParseOptions) -> HandlerResult {
        Err(HandlerError::NotImplemented)
    }

    /// Image extraction.
    ///
    /// # Errors
    ///
    /// [`HandlerError::NotImplemented`] unless overridden.
    fn parse_image(&self, _source: Source, _options: &ParseOptions) -> HandlerResult {
        Err(HandlerError::NotImplemented)
    }

    /// Video extraction.
    ///
    /// # Errors
    ///
    /// [`HandlerError::NotImplemented`] unless overridden.
    fn parse_video(&self, _source: Source, _options: &ParseOptions) -> HandlerResult {
        Err(HandlerError::NotImplemented)
    }

    /// Audio extraction.
    ///
    /// # Errors
    ///
    /// [`HandlerError::NotImplemented`] unless overridden.
    fn parse_audio(&self, _source: Source, _options: &ParseOptions) -> HandlerResult {
        Err(HandlerError::NotImplemented)
    }

    /// Extraction for a custom handler registered in the dispatch table.
    ///
    /// # Errors
    ///
    /// [`HandlerError::NotImplemented`] unless overridden.
    fn parse_custom(
        &self,
        _handler: &str,
        _source: Source,
        _options: &ParseOptions,
    ) -> HandlerResult {
        Err(HandlerError::NotImplemented)
    }
}

fn invoke<P: MultiModalParser + ?Sized>(
    parser: &P,
    handler: &MediaHandler,
    source: Source,
    options: &ParseOptions,
) -> HandlerResult {
    match handler {
        MediaHandler::Text => parser.parse_text(source, options),
        MediaHandler::Image => parser.parse_image(source, options),
        MediaHandler::Video => parser.parse_video(source, options),
        MediaHandler::Audio => parser.parse_audio(source, options),
        MediaHandler::Custom(name) => parser.parse_custom(name, source, options),
    }
}

fn unsupported(handler: &MediaHandler, hint: &str) -> ParseError {
    ParseError::FormatDetection(format!(
        "{hint} maps to {handler:?}, which this parser does not support"
    ))
}

/// Route a call to the handler the source and options select.
///
/// # Errors
///
/// [`ParseError::FormatDetection`] when no handler accepts the input, or the
/// selected handler's own error.
pub fn dispatch<P: MultiModalParser + ?Sized>(
    parser: &P,
    source: Source,
    options: &ParseOptions,
) -> Result<ParseResult> {
    let table = parser.media_dispatch();

    if let Some(content_type) = options.content_type.as_deref() {
        if let Some(handler) = table.handler_for_content_type(content_type) {
            log::debug!("Dispatching content type '{content_type}' to {handler:?}");
            return match invoke(parser, handler, source, options) {
                Ok(result) => Ok(result),
                Err(HandlerError::Failed(e)) => Err(e),
                Err(HandlerError::NotImplemented) => {
                    Err(unsupported(handler, &format!("content type '{content_type}'")))
                }
            };
        }
    }

    if matches!(source, Source::Bytes(_)) {
        return dispatch_bytes(parser, source, options);
    }

    let named_path = match &source {
        Source::Path(path) => Some(path.clone()),
        Source::Ambiguous(text) => Some(Path::new(text.trim()).to_path_buf()),
        Source::Stream(stream) => stream.name().map(|name| Path::new(name).to_path_buf()),
        Source::Content(_) | Source::Bytes(_) => None,
    };

    match named_path {
        Some(path) => {
            if let Some(handler) = table.handler_for_path(&path) {
                return match invoke(parser, handler, source, options) {
                    Ok(result) => Ok(result),
                    Err(HandlerError::Failed(e)) => Err(e),
                    Err(HandlerError::NotImplemented) => {
                        Err(unsupported(handler, &format!("extension of '{}'", path.display())))
                    }
                };
            }
            dispatch_text(parser, source, options)
        }
        None if matches!(source, Source::Content(_)) => dispatch_text(parser, source, options),
        None => Err(ParseError::FormatDetection(
            "Unable to infer media type; provide content_type".to_string(),
        )),
    }
}

fn dispatch_text<P: MultiModalParser + ?Sized>(
    parser: &P,
    source: Source,
    options: &ParseOptions,
) -> Result<ParseResult> {
    match parser.parse_text(source, options) {
        Ok(result) => Ok(result),
        Err(HandlerError::Failed(e)) => Err(e),
        Err(HandlerError::NotImplemented) => Err(ParseError::FormatDetection(
            "Unable to infer media type for string source; provide content_type".to_string(),
        )),
    }
}

fn dispatch_bytes<P: MultiModalParser + ?Sized>(
    parser: &P,
    source: Source,
    options: &ParseOptions,
) -> Result<ParseResult> {
    let Source::Bytes(data) = source else {
        return Err(ParseError::UnsupportedSourceType(source.kind().to_string()));
    };
    for handler in [MediaHandler::Image, MediaHandler::Video, MediaHandler::Audio] {
        match invoke(parser, &handler, Source::Bytes(data.clone()), options) {
            Ok(result) => return Ok(result),
            Err(HandlerError::Failed(e)) => return Err(e),
            Err(HandlerError::NotImplemented) => {
                log::debug!("{handler:?} handler not implemented for raw bytes, trying next");
            }
        }
    }
    Err(ParseError::FormatDetection(
        "Unable to infer media type for raw bytes; provide content_type".to_string(),
    ))
}
