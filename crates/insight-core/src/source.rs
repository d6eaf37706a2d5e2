//! Source normalization.
//!
//! A [`Source`] is whatever the caller handed over: a path, literal content,
//! a bare string that may be either, a byte buffer or a readable stream.
//! Strategies never inspect the variant themselves; they call
//! [`normalize_text_source`] or [`normalize_binary_source`] and work on the
//! result.
//!
//! ## Bare strings
//!
//! [`Source::Ambiguous`] follows a fixed decision rule:
//!
//! 1. blank strings are content
//! 2. a string naming an existing filesystem entry is a path
//! 3. a string that looks path-like (contains `/` or `\`, or ends in a short
//!    alphanumeric extension) but does not exist is [`ParseError::SourceNotFound`]
//! 4. anything else is content
//!
//! Callers holding content that happens to look like a path (HTML with
//! closing tags, Markdown with links) should use [`Source::Content`].

use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, UTF_8};

use crate::error::{ParseError, Result};

const MAX_EXTENSION_LEN: usize = 5;

/// What a [`SourceStream`] produced when drained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamPayload {
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Already-decoded text
    Text(String),
    /// Anything else; the string names what was produced
    Other(String),
}

/// Readable input consumed once in full.
pub trait SourceStream: Send {
    /// Drain the stream.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if reading fails.
    fn read_payload(&mut self) -> io::Result<StreamPayload>;

    /// File name the stream was opened from, if any.
    fn name(&self) -> Option<&str> {
        None
    }
}

/// Whether a [`ReaderStream`] yields bytes or text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Yield raw bytes
    #[default]
    Bytes,
    /// Yield UTF-8 text
    Text,
}

/// [`SourceStream`] over any [`Read`] implementation.
pub struct ReaderStream<R> {
    reader: R,
    name: Option<String>,
    mode: ReadMode,
}

impl<R: Read + Send> ReaderStream<R> {
    /// Byte-yielding stream.
    pub const fn new(reader: R) -> Self {
        Self {
            reader,
            name: None,
            mode: ReadMode::Bytes,
        }
    }

    /// Attach a file name.
    #[must_use = "returns the named stream"]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Choose bytes or text output.
    #[must_use = "returns the reconfigured stream"]
    pub const fn with_mode(mut self, mode: ReadMode) -> Self {
        self.mode = mode;
        self
    }
}

impl<R: Read + Send> SourceStream for ReaderStream<R> {
    fn read_payload(&mut self) -> io::Result<StreamPayload> {
        match self.mode {
            ReadMode::Bytes => {
                let mut data = Vec::new();
                self.reader.read_to_end(&mut data)?;
                Ok(StreamPayload::Bytes(data))
            }
            ReadMode::Text => {
                let mut text = String::new();
                self.reader.read_to_string(&mut text)?;
                Ok(StreamPayload::Text(text))
            }
        }
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Input handed to a parser.
pub enum Source {
    /// Filesystem path
    Path(PathBuf),
    /// Literal content, never treated as a path
    Content(String),
    /// Bare string; path or content per the module-level rule
    Ambiguous(String),
    /// In-memory bytes
    Bytes(Vec<u8>),
    /// Readable stream
    Stream(Box<dyn SourceStream>),
}

impl Source {
    /// Literal content.
    #[inline]
    #[must_use]
    pub fn content(text: impl Into<String>) -> Self {
        Self::Content(text.into())
    }

    /// Stream over a byte reader.
    #[must_use]
    pub fn reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self::Stream(Box::new(ReaderStream::new(reader)))
    }

    /// Stream over a byte reader carrying a file name.
    #[must_use]
    pub fn named_reader<R: Read + Send + 'static>(name: impl Into<String>, reader: R) -> Self {
        Self::Stream(Box::new(ReaderStream::new(reader).with_name(name)))
    }

    /// Short label for the variant, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Path(_) => "path",
            Self::Content(_) => "content",
            Self::Ambiguous(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Stream(_) => "stream",
        }
    }

    /// Lowercased extension (with leading dot) from the path, bare string or
    /// stream name.
    #[must_use]
    pub fn extension_hint(&self) -> Option<String> {
        let name = match self {
            Self::Path(path) => return dotted_extension(path),
            Self::Ambiguous(text) => text.as_str(),
            Self::Stream(stream) => stream.name()?,
            Self::Content(_) | Self::Bytes(_) => return None,
        };
        dotted_extension(Path::new(name.trim()))
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Content(text) => f.debug_tuple("Content").field(&text.len()).finish(),
            Self::Ambiguous(text) => f.debug_tuple("Ambiguous").field(text).finish(),
            Self::Bytes(data) => f.debug_tuple("Bytes").field(&data.len()).finish(),
            Self::Stream(stream) => f.debug_tuple("Stream").field(&stream.name()).finish(),
        }
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<String> for Source {
    fn from(text: String) -> Self {
        Self::Ambiguous(text)
    }
}

impl From<&str> for Source {
    fn from(text: &str) -> Self {
        Self::Ambiguous(text.to_string())
    }
}

impl From<Vec<u8>> for Source {
    fn from(data: Vec<u8>) -> Self {
        Self::Bytes(data)
    }
}

impl From<&[u8]> for Source {
    fn from(data: &[u8]) -> Self {
        Self::Bytes(data.to_vec())
    }
}

/// How a bare string was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringSource {
    /// Names an existing filesystem entry
    ExistingPath(PathBuf),
    /// Looks like a path but nothing exists there
    MissingPath(String),
    /// Literal content
    Content,
}

/// Classify a bare string.
#[must_use]
pub fn classify_string(text: &str) -> StringSource {
    if text.trim().is_empty() {
        return StringSource::Content;
    }
    let path = Path::new(text);
    if path.exists() {
        return StringSource::ExistingPath(path.to_path_buf());
    }
    if looks_like_path(text) {
        StringSource::MissingPath(text.to_string())
    } else {
        StringSource::Content
    }
}

/// Separator present, or a short alphanumeric extension at the end.
#[must_use]
pub fn looks_like_path(text: &str) -> bool {
    if text.contains('/') || text.contains('\\') {
        return true;
    }
    Path::new(text)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            (1..=MAX_EXTENSION_LEN).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
}

fn dotted_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
}

/// Decoded text plus the path it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSource {
    /// Decoded content
    pub text: String,
    /// Path the text was read from
    pub resolved_path: Option<String>,
}

/// Raw bytes plus the path (or stream name) they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinarySource {
    /// Raw content
    pub data: Vec<u8>,
    /// Path or stream name the bytes were read from
    pub resolved_path: Option<String>,
}

impl BinarySource {
    /// Seekable view over the bytes.
    #[inline]
    #[must_use]
    pub fn cursor(&self) -> Cursor<&[u8]> {
        Cursor::new(self.data.as_slice())
    }
}

/// Resolve a source to text.
///
/// `encoding_hint` is a WHATWG encoding label applied to path reads; unknown
/// labels fall back to UTF-8.
///
/// # Errors
///
/// [`ParseError::SourceNotFound`] for missing paths,
/// [`ParseError::UnsupportedStreamYield`] for streams producing neither text
/// nor bytes, and [`ParseError::Io`] when reading fails.
pub fn normalize_text_source(source: Source, encoding_hint: Option<&str>) -> Result<TextSource> {
    match source {
        Source::Path(path) => read_text_file(&path, encoding_hint),
        Source::Content(text) => Ok(TextSource {
            text,
            resolved_path: None,
        }),
        Source::Ambiguous(text) => match classify_string(&text) {
            StringSource::ExistingPath(path) => read_text_file(&path, encoding_hint),
            StringSource::MissingPath(path) => Err(ParseError::SourceNotFound(path)),
            StringSource::Content => Ok(TextSource {
                text,
                resolved_path: None,
            }),
        },
        Source::Bytes(data) => Ok(TextSource {
            text: decode_bytes(&data),
            resolved_path: None,
        }),
        Source::Stream(mut stream) => {
            let text = match stream.read_payload()? {
                StreamPayload::Bytes(data) => decode_bytes(&data),
                StreamPayload::Text(text) => text,
                StreamPayload::Other(what) => return Err(ParseError::UnsupportedStreamYield(what)),
            };
            Ok(TextSource {
                text,
                resolved_path: None,
            })
        }
    }
}

/// Resolve a source to raw bytes.
///
/// # Errors
///
/// As [`normalize_text_source`], plus [`ParseError::UnsupportedSourceType`]
/// for literal content, which has no byte representation to decode.
pub fn normalize_binary_source(source: Source) -> Result<BinarySource> {
    match source {
        Source::Path(path) => read_binary_file(&path),
        Source::Ambiguous(text) => match classify_string(&text) {
            StringSource::ExistingPath(path) => read_binary_file(&path),
            StringSource::MissingPath(path) => Err(ParseError::SourceNotFound(path)),
            StringSource::Content => Err(ParseError::UnsupportedSourceType(
                "string is neither an existing path nor binary data".to_string(),
            )),
        },
        Source::Content(_) => Err(ParseError::UnsupportedSourceType(
            "literal text content cannot be read as a binary document".to_string(),
        )),
        Source::Bytes(data) => Ok(BinarySource {
            data,
            resolved_path: None,
        }),
        Source::Stream(mut stream) => {
            let resolved_path = stream.name().map(str::to_string);
            let data = match stream.read_payload()? {
                StreamPayload::Bytes(data) => data,
                StreamPayload::Text(text) => text.into_bytes(),
                StreamPayload::Other(what) => return Err(ParseError::UnsupportedStreamYield(what)),
            };
            Ok(BinarySource {
                data,
                resolved_path,
            })
        }
    }
}

fn read_binary_file(path: &Path) -> Result<BinarySource> {
    if !path.exists() {
        return Err(ParseError::not_found(path));
    }
    Ok(BinarySource {
        data: fs::read(path)?,
        resolved_path: Some(path.display().to_string()),
    })
}

fn read_text_file(path: &Path, encoding_hint: Option<&str>) -> Result<TextSource> {
    if !path.exists() {
        return Err(ParseError::not_found(path));
    }
    let data = fs::read(path)?;
    let encoding = encoding_hint
        .and_then(|label| {
            let encoding = Encoding::for_label(label.trim().as_bytes());
            if encoding.is_none() {
                log::warn!("Unknown encoding label '{label}', reading {} as UTF-8", path.display());
            }
            encoding
        })
        .unwrap_or(UTF_8);

    let text = match encoding.decode_without_bom_handling_and_without_replacement(&data) {
        Some(text) => strip_bom(text).into_owned(),
        None => {
            log::warn!(
                "{} is not valid {}, substituting undecodable bytes",
                path.display(),
                encoding.name()
            );
            String::from_utf8_lossy(&data).into_owned()
        }
    };
    Ok(TextSource {
        text,
        resolved_path: Some(path.display().to_string()),
    })
}

fn strip_bom(text: Cow<'_, str>) -> Cow<'_, str> {
    match text {
        Cow::Borrowed(s) => Cow::Borrowed(s.strip_prefix('\u{feff}').unwrap_or(s)),
        Cow::Owned(s) => match s.strip_prefix('\u{feff}') {
            Some(rest) => Cow::Owned(rest.to_string()),
            None => Cow::Owned(s),
        },
    }
}

/// Decode in-memory bytes: BOM-aware UTF-8, UTF-8, Latin-1, then lossy UTF-8.
#[must_use]
pub fn decode_bytes(data: &[u8]) -> String {
    let attempts: [(&str, fn(&[u8]) -> Option<String>); 3] = [
        ("utf-8-sig", decode_utf8_sig),
        ("utf-8", decode_utf8),
        ("latin-1", decode_latin1),
    ];
    for (label, attempt) in attempts {
        if let Some(text) = attempt(data) {
            log::debug!("Decoded {} bytes as {label}", data.len());
            return text;
        }
    }
    String::from_utf8_lossy(data).into_owned()
}

fn decode_utf8_sig(data: &[u8]) -> Option<String> {
    let (text, had_errors) = UTF_8.decode_with_bom_removal(data);
    (!had_errors).then(|| text.into_owned())
}

fn decode_utf8(data: &[u8]) -> Option<String> {
    std::str::from_utf8(data).ok().map(str::to_string)
}

fn decode_latin1(data: &[u8]) -> Option<String> {
    Some(data.iter().map(|&byte| char::from(byte)).collect())
}
