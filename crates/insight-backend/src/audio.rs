//! Audio Backend - Transcribe speech through an external recognizer
//!
//! Accepts a path, in-memory bytes or a readable stream. Non-path inputs are
//! written to a temporary file for the duration of the call; the file is
//! removed on every exit path, transcription failures included.
//!
//! ## Architecture
//!
//! `AudioBackend` is a [`MultiModalParser`]: `parse` routes through
//! [`dispatch`] and only `parse_audio` is implemented. WAV containers are
//! probed with `hound` (duration, channels, sample rate, mean amplitude).
//! Transcription goes through [`SpeechRecognizer`]; a recognizer that rejects
//! some arguments is retried once with `model` and `lang` only.
//!
//! ## Recognizer resolution
//!
//! An explicitly supplied recognizer always wins. Otherwise the bundled one
//! (feature `transcription`) is resolved on first use, exactly once, and a
//! missing recognizer is reported as [`ParseError::CapabilityUnavailable`].

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use insight_audio::{
    default_recognizer, probe_wav, transcribe_with_fallback, AudioError, SpeechRecognizer,
    TranscriptionRequest, WavProbe,
};
use insight_core::{
    classify_string, Attachment, MediaKind, MediaSegment, Metadata, ParseError, ParseItem,
    ParseOptions, ParseResult, Result, Source, StreamPayload, StringSource, MIME_WAV,
};
use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tempfile::NamedTempFile;

use crate::multimodal::{dispatch, HandlerResult, MediaDispatch, MediaHandler, MultiModalParser};
use crate::registry::ParserConfig;
use crate::traits::Parser;

/// Dispatch tables: the base tables plus Ogg/Opus/M4A.
static AUDIO_DISPATCH: Lazy<MediaDispatch> = Lazy::new(|| {
    MediaDispatch::default()
        .with_media("application/ogg", MediaHandler::Audio)
        .with_extension(".m4a", MediaHandler::Audio)
        .with_extension(".ogg", MediaHandler::Audio)
        .with_extension(".opus", MediaHandler::Audio)
});

/// Suffix given to temporary files when nothing else names one.
const DEFAULT_SUFFIX: &str = ".wav";

/// Temporary-file suffix for a declared content type.
#[must_use]
pub fn suffix_for_content_type(content_type: &str) -> Option<&'static str> {
    match content_type {
        "audio/wav" | "audio/x-wav" => Some(".wav"),
        "audio/mpeg" | "audio/mp3" => Some(".mp3"),
        "audio/flac" => Some(".flac"),
        "audio/aac" => Some(".aac"),
        "audio/ogg" => Some(".ogg"),
        _ => None,
    }
}

/// Construction options for [`AudioBackend`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Recognition model name
    pub model: String,
    /// Spoken language
    pub lang: String,
    /// Sample rate the model expects
    pub sample_rate: u32,
    /// Decoding strategy
    pub decode_method: String,
    /// Engine configuration file
    pub config: Option<String>,
    /// Model checkpoint
    pub ckpt_path: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            model: "conformer_wenetspeech".to_string(),
            lang: "zh".to_string(),
            sample_rate: 16_000,
            decode_method: "attention_rescoring".to_string(),
            config: None,
            ckpt_path: None,
        }
    }
}

impl AudioConfig {
    /// Request for one call, per-call options overriding the configured values.
    #[must_use]
    pub fn request(&self, options: &ParseOptions) -> TranscriptionRequest {
        TranscriptionRequest {
            model: Some(options.model.clone().unwrap_or_else(|| self.model.clone())),
            lang: Some(options.lang.clone().unwrap_or_else(|| self.lang.clone())),
            sample_rate: Some(options.sample_rate.unwrap_or(self.sample_rate)),
            decode_method: Some(
                options
                    .decode_method
                    .clone()
                    .unwrap_or_else(|| self.decode_method.clone()),
            ),
            config: options
                .config
                .as_ref()
                .or(self.config.as_ref())
                .map(PathBuf::from),
            ckpt_path: options
                .ckpt_path
                .as_ref()
                .or(self.ckpt_path.as_ref())
                .map(PathBuf::from),
        }
    }
}

/// Audio file on disk for the duration of one call.
///
/// Dropping a temporary input deletes it.
#[derive(Debug)]
struct AudioInput {
    path: PathBuf,
    /// Path or stream name reported back to the caller
    reference: Option<String>,
    /// Original bytes for in-memory inputs
    data: Option<Vec<u8>>,
    _temp: Option<NamedTempFile>,
}

impl AudioInput {
    fn on_disk(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Err(ParseError::not_found(&path));
        }
        Ok(Self {
            reference: Some(path.display().to_string()),
            path,
            data: None,
            _temp: None,
        })
    }

    fn in_memory(data: Vec<u8>, reference: Option<String>, suffix: &str) -> Result<Self> {
        let mut temp = tempfile::Builder::new()
            .prefix("insight-audio-")
            .suffix(suffix)
            .tempfile()?;
        temp.write_all(&data)?;
        temp.flush()?;
        log::debug!("Audio: staged {} bytes at {}", data.len(), temp.path().display());
        Ok(Self {
            path: temp.path().to_path_buf(),
            reference,
            data: Some(data),
            _temp: Some(temp),
        })
    }
}

/// Speech-to-text strategy.
///
/// # Examples
///
/// ```rust
/// use std::path::Path;
/// use std::sync::Arc;
/// use insight_audio::{AudioError, TranscriptionRequest};
/// use insight_backend::{AudioBackend, AudioConfig, Parser};
/// use insight_core::{ParseError, ParseOptions};
///
/// let recognizer = |_: &Path, _: &TranscriptionRequest| -> Result<String, AudioError> {
///     Ok("hello".to_string())
/// };
/// let backend = AudioBackend::new(AudioConfig::default()).with_recognizer(Arc::new(recognizer));
/// let options = ParseOptions::new().with_extension(".mp3");
/// let result = backend.parse_bytes(b"ID3 not really audio", &options)?;
/// assert_eq!(result.items[0].text.as_deref(), Some("hello"));
/// # Ok::<(), ParseError>(())
/// ```
pub struct AudioBackend {
    config: AudioConfig,
    resolver: RecognizerResolver,
    recognizer: OnceCell<Option<Arc<dyn SpeechRecognizer>>>,
}

/// Lookup run once, on first use, when no recognizer was supplied.
pub type RecognizerResolver = fn() -> Option<Arc<dyn SpeechRecognizer>>;

impl std::fmt::Debug for AudioBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioBackend")
            .field("config", &self.config)
            .field(
                "recognizer",
                &self.recognizer.get().map(|r| r.as_ref().map(|_| "<recognizer>")),
            )
            .finish()
    }
}

impl Default for AudioBackend {
    fn default() -> Self {
        Self::new(AudioConfig::default())
    }
}

impl AudioBackend {
    /// Backend resolving the bundled recognizer on first use.
    #[must_use]
    pub fn new(config: AudioConfig) -> Self {
        Self {
            config,
            resolver: default_recognizer,
            recognizer: OnceCell::new(),
        }
    }

    /// Use `recognizer` instead of the bundled one.
    #[must_use]
    pub fn with_recognizer(self, recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        Self {
            recognizer: OnceCell::with_value(Some(recognizer)),
            ..self
        }
    }

    /// Resolve the recognizer with `resolver` instead of the bundled lookup.
    ///
    /// The resolver runs at most once per backend, however many threads
    /// parse through it.
    #[must_use]
    pub fn with_recognizer_resolver(self, resolver: RecognizerResolver) -> Self {
        Self {
            resolver,
            recognizer: OnceCell::new(),
            ..self
        }
    }

    /// Registry constructor: reads [`AudioConfig`] from the construction options.
    ///
    /// # Errors
    ///
    /// [`ParseError::InvalidOptions`] when a known key has the wrong type.
    pub fn from_config(config: &ParserConfig) -> Result<Self> {
        let config: AudioConfig = serde_json::from_value(Value::Object(config.clone()))
            .map_err(|e| ParseError::InvalidOptions(format!("audio parser config: {e}")))?;
        Ok(Self::new(config))
    }

    /// Configured defaults.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &AudioConfig {
        &self.config
    }

    fn recognizer(&self) -> Result<Arc<dyn SpeechRecognizer>> {
        self.recognizer
            .get_or_init(self.resolver)
            .clone()
            .ok_or_else(|| {
                ParseError::CapabilityUnavailable(
                    "no speech recognizer available; enable the `transcription` feature or \
                     supply one with AudioBackend::with_recognizer"
                        .to_string(),
                )
            })
    }

    fn temp_suffix(options: &ParseOptions) -> String {
        options
            .essence_content_type()
            .as_deref()
            .and_then(suffix_for_content_type)
            .map(str::to_string)
            .or_else(|| options.dotted_extension())
            .unwrap_or_else(|| DEFAULT_SUFFIX.to_string())
    }

    fn prepare(source: Source, options: &ParseOptions) -> Result<AudioInput> {
        match source {
            Source::Path(path) => AudioInput::on_disk(path),
            Source::Ambiguous(text) => match classify_string(&text) {
                StringSource::ExistingPath(path) => AudioInput::on_disk(path),
                StringSource::MissingPath(_) | StringSource::Content => {
                    Err(ParseError::SourceNotFound(text))
                }
            },
            Source::Content(_) => Err(ParseError::UnsupportedSourceType(
                "literal text content is not audio".to_string(),
            )),
            Source::Bytes(data) => AudioInput::in_memory(data, None, &Self::temp_suffix(options)),
            Source::Stream(mut stream) => {
                let name = stream.name().map(str::to_string);
                let data = match stream.read_payload()? {
                    StreamPayload::Bytes(data) => data,
                    StreamPayload::Text(text) => text.into_bytes(),
                    StreamPayload::Other(what) => {
                        return Err(ParseError::UnsupportedStreamYield(what))
                    }
                };
                AudioInput::in_memory(data, name, &Self::temp_suffix(options))
            }
        }
    }

    fn probe(path: &Path) -> Result<Option<WavProbe>> {
        let is_wav = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
        if !is_wav {
            return Ok(None);
        }
        probe_wav(path)
            .map(Some)
            .map_err(|e| ParseError::decode("audio", e))
    }

    fn transcribe(&self, path: &Path, request: &TranscriptionRequest) -> Result<String> {
        let recognizer = self.recognizer()?;
        transcribe_with_fallback(recognizer.as_ref(), path, request).map_err(|e| match e {
            AudioError::RecognizerUnavailable { .. } | AudioError::ModelNotFound { .. } => {
                ParseError::CapabilityUnavailable(e.to_string())
            }
            other => ParseError::external("speech recognition", other),
        })
    }

    fn transcribe_source(&self, source: Source, options: &ParseOptions) -> Result<ParseResult> {
        let request = self.config.request(options);
        let input = Self::prepare(source, options)?;
        let probe = Self::probe(&input.path)?;
        let transcript = self.transcribe(&input.path, &request)?;
        let AudioInput {
            reference, data, ..
        } = input;

        let text = transcript.trim();
        let duration = probe.as_ref().map(|p| p.duration_secs);
        let channels = probe.as_ref().map(|p| p.channels);
        let frame_rate = probe.as_ref().map(|p| p.sample_rate);
        let signal_level = probe.as_ref().and_then(|p| p.signal_level);
        let content_type = options
            .content_type
            .clone()
            .or_else(|| probe.as_ref().map(|_| MIME_WAV.to_string()));

        let mut result = ParseResult::new("audio");
        result.source.clone_from(&reference);

        if !text.is_empty() {
            result.items.push(ParseItem::new("segment-1", text, 1));
        }

        let mut segment_metadata = Metadata::new();
        segment_metadata.insert("decode_method".to_string(), json!(request.decode_method));
        result.segments.push(MediaSegment {
            id: "segment-1".to_string(),
            start_time: duration.map(|_| 0.0),
            end_time: duration,
            text: (!text.is_empty()).then(|| text.to_string()),
            language: request.lang.clone(),
            metadata: segment_metadata,
            ..MediaSegment::default()
        });

        let mut attachment = Attachment::new("audio-original", MediaKind::Audio);
        attachment.mime.clone_from(&content_type);
        attachment.data = if reference.is_some() { None } else { data };
        attachment.url = reference;
        attachment.duration = duration;
        attachment.channel_count = channels;
        attachment.frame_rate = frame_rate.map(f64::from);
        attachment.metadata.insert("channels".to_string(), json!(channels));
        attachment.metadata.insert("frame_rate".to_string(), json!(frame_rate));
        attachment
            .metadata
            .insert("signal_level".to_string(), json!(signal_level));
        result.attachments.push(attachment);

        let fields = [
            ("model", json!(request.model)),
            ("lang", json!(request.lang)),
            ("sample_rate", json!(request.sample_rate)),
            ("decode_method", json!(request.decode_method)),
            ("duration", json!(duration)),
            ("channels", json!(channels)),
            ("frame_rate", json!(frame_rate)),
            ("signal_level", json!(signal_level)),
            ("content_type", json!(content_type)),
        ];
        for (key, value) in fields {
            result.metadata.insert(key.to_string(), value);
        }
        Ok(result.with_caller_metadata(&options.metadata))
    }
}

impl MultiModalParser for AudioBackend {
    fn media_dispatch(&self) -> &MediaDispatch {
        &AUDIO_DISPATCH
    }

    fn parse_audio(&self, source: Source, options: &ParseOptions) -> HandlerResult {
        Ok(self.transcribe_source(source, options)?)
    }
}

impl Parser for AudioBackend {
    fn name(&self) -> &'static str {
        "audio"
    }

    fn parse(&self, source: Source, options: &ParseOptions) -> Result<ParseResult> {
        // Broken paths fail as missing before extension routing sees them
        match &source {
            Source::Path(path) if !path.exists() => return Err(ParseError::not_found(path)),
            Source::Ambiguous(text) => {
                if let StringSource::MissingPath(path) = classify_string(text) {
                    return Err(ParseError::SourceNotFound(path));
                }
            }
            _ => {}
        }
        dispatch(self, source, options)
    }
}
