//! Canonical parse result model.
//!
//! Every strategy produces the same shape: ordered [`ParseItem`]s, optional
//! time-anchored [`MediaSegment`]s, top-level [`Attachment`]s and an open
//! metadata map. Fields a strategy has nothing to say about stay empty.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Open key/value metadata map.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Kind of media an attachment refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image
    Image,
    /// Video stream
    Video,
    /// Audio stream
    Audio,
    /// Opaque binary payload
    Binary,
    /// Text payload
    Text,
}

impl MediaKind {
    /// Wire name of the kind.
    #[inline]
    #[must_use = "returns the kind name without side effects"]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Binary => "binary",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            "binary" => Ok(Self::Binary),
            "text" => Ok(Self::Text),
            _ => Err(ModelError::UnknownMediaKind(s.to_string())),
        }
    }
}

/// Validation failures raised while constructing model values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Confidence outside `0.0..=1.0` (or NaN).
    #[error("confidence must be within 0.0..=1.0, got {0}")]
    ConfidenceOutOfRange(f64),
    /// Unknown media kind name.
    #[error("unknown media kind '{0}'")]
    UnknownMediaKind(String),
}

/// Probability-like score in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    /// Validate a raw score.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ConfidenceOutOfRange`] for values outside
    /// `0.0..=1.0` and for NaN.
    pub fn new(value: f64) -> Result<Self, ModelError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ModelError::ConfidenceOutOfRange(value))
        }
    }

    /// Raw score.
    #[inline]
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Confidence {
    type Error = ModelError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(confidence: Confidence) -> Self {
        confidence.0
    }
}

/// Reference to embedded or linked media discovered while parsing.
///
/// `data` is only filled when the source was in memory and no `url` exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Identifier, unique within one result (e.g. `img-1`)
    pub id: String,
    /// Content type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    /// Absolute or relative URL, or resolved path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Raw bytes for in-memory sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
    /// Media kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MediaKind>,
    /// Width in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Height in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Frames (video) or samples (audio) per second
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<f64>,
    /// Audio channel count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_count: Option<u16>,
    /// Preview image location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Language tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Transcript of the media, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription_text: Option<String>,
    /// Detection or transcription confidence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    /// Free-form metadata
    #[serde(default)]
    pub metadata: Metadata,
}

impl Attachment {
    /// Attachment with an id and kind; everything else empty.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            id: id.into(),
            kind: Some(kind),
            ..Self::default()
        }
    }
}

/// Rectangle in the unit carried by the owning item's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
    /// Detection confidence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
}

/// One structural unit of extracted content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseItem {
    /// Identifier, unique within one result
    pub id: String,
    /// Extracted text; absent for non-textual items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Character count of `text`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    /// 1-based ordinal, strictly increasing in emission order
    pub position: usize,
    /// Media embedded directly in this item
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    /// Start offset in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    /// End offset in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    /// Location on the page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    /// Free-form metadata
    #[serde(default)]
    pub metadata: Metadata,
}

impl ParseItem {
    /// Text item; `length` is derived from `text`.
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>, position: usize) -> Self {
        let text = text.into();
        Self {
            id: id.into(),
            length: Some(text.chars().count()),
            text: Some(text),
            position,
            ..Self::default()
        }
    }

    /// Replace the metadata map.
    #[inline]
    #[must_use = "returns the updated item"]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Anchor the item in time.
    #[inline]
    #[must_use = "returns the updated item"]
    pub const fn with_times(mut self, start_time: Option<f64>, end_time: Option<f64>) -> Self {
        self.start_time = start_time;
        self.end_time = end_time;
        self
    }
}

/// Time-anchored chunk of audio or video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaSegment {
    /// Identifier, unique within one result
    pub id: String,
    /// Start offset in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    /// End offset in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    /// Transcript or caption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Language tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Transcription confidence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    /// Media embedded in the segment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    /// Location in the frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    /// Free-form metadata
    #[serde(default)]
    pub metadata: Metadata,
}

/// Output of one parse call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    /// Resolved path, `None` for inputs without filesystem identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Ordered content units
    #[serde(default)]
    pub items: Vec<ParseItem>,
    /// Ordered time-anchored segments
    #[serde(default)]
    pub segments: Vec<MediaSegment>,
    /// Top-level attachments
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Always contains `parser`
    #[serde(default)]
    pub metadata: Metadata,
}

impl ParseResult {
    /// Empty result seeded with the producing parser's name.
    #[must_use]
    pub fn new(parser: &str) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert("parser".to_string(), parser.into());
        Self {
            metadata,
            ..Self::default()
        }
    }

    /// Overlay caller metadata; caller keys win, `parser` included.
    #[must_use = "returns the updated result"]
    pub fn with_caller_metadata(mut self, caller: &Metadata) -> Self {
        for (key, value) in caller {
            self.metadata.insert(key.clone(), value.clone());
        }
        self
    }

    /// Name of the strategy recorded in metadata.
    #[inline]
    #[must_use]
    pub fn parser(&self) -> Option<&str> {
        self.metadata.get("parser").and_then(serde_json::Value::as_str)
    }

    /// Item texts joined by blank lines.
    #[must_use]
    pub fn full_text(&self) -> String {
        self.items
            .iter()
            .filter_map(|item| item.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// True when nothing was extracted.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.segments.is_empty() && self.attachments.is_empty()
    }
}
