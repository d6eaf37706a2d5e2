//! Speech-recognition capability seam
//!
//! The audio strategy never talks to an ASR engine directly. It builds a
//! [`TranscriptionRequest`] and hands it to a [`SpeechRecognizer`]. Engines
//! that cannot honor every field reject the request with
//! [`AudioError::UnsupportedArguments`]; [`transcribe_with_fallback`] then
//! retries once with only `model` and `lang`.
//!
//! ## Example
//!
//! ```rust
//! use std::path::Path;
//! use insight_audio::{transcribe_with_fallback, AudioError, TranscriptionRequest};
//!
//! let recognizer = |_: &Path, request: &TranscriptionRequest| -> Result<String, AudioError> {
//!     Ok(format!("heard in {}", request.lang.as_deref().unwrap_or("?")))
//! };
//! let request = TranscriptionRequest {
//!     lang: Some("zh".to_string()),
//!     ..TranscriptionRequest::default()
//! };
//! let text = transcribe_with_fallback(&recognizer, Path::new("clip.wav"), &request)?;
//! assert_eq!(text, "heard in zh");
//! # Ok::<(), AudioError>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{AudioError, Result};

/// Arguments passed to a recognizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TranscriptionRequest {
    /// Model name
    pub model: Option<String>,
    /// Spoken language
    pub lang: Option<String>,
    /// Sample rate the model expects
    pub sample_rate: Option<u32>,
    /// Decoding strategy
    pub decode_method: Option<String>,
    /// Engine configuration file
    pub config: Option<PathBuf>,
    /// Model checkpoint
    pub ckpt_path: Option<PathBuf>,
}

impl TranscriptionRequest {
    /// Same request keeping only `model` and `lang`.
    #[must_use]
    pub fn reduced(&self) -> Self {
        Self {
            model: self.model.clone(),
            lang: self.lang.clone(),
            ..Self::default()
        }
    }

    /// Names of the fields that are set.
    #[must_use]
    pub fn argument_names(&self) -> Vec<&'static str> {
        [
            ("model", self.model.is_some()),
            ("lang", self.lang.is_some()),
            ("sample_rate", self.sample_rate.is_some()),
            ("decode_method", self.decode_method.is_some()),
            ("config", self.config.is_some()),
            ("ckpt_path", self.ckpt_path.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }
}

/// External speech-to-text engine.
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe the audio file at `audio`.
    ///
    /// # Errors
    ///
    /// `AudioError::UnsupportedArguments` when the engine cannot honor the
    /// request's fields; any other error is treated as fatal by callers.
    fn transcribe(&self, audio: &Path, request: &TranscriptionRequest) -> Result<String>;
}

impl<F> SpeechRecognizer for F
where
    F: Fn(&Path, &TranscriptionRequest) -> Result<String> + Send + Sync,
{
    fn transcribe(&self, audio: &Path, request: &TranscriptionRequest) -> Result<String> {
        self(audio, request)
    }
}

/// Transcribe, retrying once with the reduced request on an argument mismatch.
///
/// # Errors
///
/// Any error from the retry, or any non-mismatch error from the first call.
pub fn transcribe_with_fallback(
    recognizer: &dyn SpeechRecognizer,
    audio: &Path,
    request: &TranscriptionRequest,
) -> Result<String> {
    match recognizer.transcribe(audio, request) {
        Err(AudioError::UnsupportedArguments { arguments }) => {
            log::debug!(
                "Recognizer rejected [{}], retrying with model and lang only",
                arguments.join(", ")
            );
            recognizer.transcribe(audio, &request.reduced())
        }
        other => other,
    }
}

/// Recognizer bundled with this build, if any.
///
/// With the `transcription` feature this is the whisper engine when a model
/// can be located; otherwise `None`.
#[must_use]
pub fn default_recognizer() -> Option<Arc<dyn SpeechRecognizer>> {
    #[cfg(feature = "transcription")]
    {
        match crate::whisper::WhisperRecognizer::discover() {
            Ok(recognizer) => return Some(Arc::new(recognizer)),
            Err(e) => log::warn!("Whisper recognizer unavailable: {e}"),
        }
    }
    #[cfg(not(feature = "transcription"))]
    log::warn!("Built without the `transcription` feature; no speech recognizer available");
    None
}
