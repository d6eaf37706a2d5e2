//! Whisper speech recognizer
//!
//! Requires the `transcription` feature and a GGML model on disk:
//!
//! ```bash
//! curl -L https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-base.bin \
//!   -o ~/.cache/whisper/ggml-base.bin
//! ```
//!
//! The model path comes from `INSIGHT_WHISPER_MODEL`, falling back to the
//! usual cache locations. Whisper always decodes greedily at 16kHz, so a
//! request naming a different `decode_method`, a `config` or a `ckpt_path`
//! is rejected as unsupported and the caller retries with the reduced set.

use std::path::{Path, PathBuf};

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::error::{AudioError, Result};
use crate::recognizer::{SpeechRecognizer, TranscriptionRequest};
use crate::resample::resample_audio;
use crate::wav::read_wav_samples;

/// Environment variable naming the GGML model file.
pub const MODEL_ENV_VAR: &str = "INSIGHT_WHISPER_MODEL";

const WHISPER_SAMPLE_RATE: u32 = 16_000;

const DEFAULT_MODEL_PATHS: [&str; 4] = [
    "~/.cache/whisper/ggml-base.bin",
    "~/.cache/whisper/ggml-tiny.bin",
    "./models/ggml-base.bin",
    "./models/ggml-tiny.bin",
];

/// Whisper-backed [`SpeechRecognizer`].
pub struct WhisperRecognizer {
    context: WhisperContext,
    model_path: PathBuf,
}

impl std::fmt::Debug for WhisperRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperRecognizer")
            .field("model_path", &self.model_path)
            .finish_non_exhaustive()
    }
}

impl WhisperRecognizer {
    /// Load a model file.
    ///
    /// # Errors
    ///
    /// `ModelNotFound` if the file is missing, `RecognizerUnavailable` if
    /// whisper cannot load it.
    pub fn new(model_path: impl Into<PathBuf>) -> Result<Self> {
        let model_path = model_path.into();
        if !model_path.exists() {
            return Err(AudioError::model_not_found(&model_path));
        }
        let path_str = model_path.to_string_lossy().to_string();
        let context =
            WhisperContext::new_with_params(&path_str, WhisperContextParameters::default())
                .map_err(|e| {
                    AudioError::unavailable(format!("Failed to load Whisper model: {e}"))
                })?;
        Ok(Self {
            context,
            model_path,
        })
    }

    /// Load the model named by the environment or found in a default location.
    ///
    /// # Errors
    ///
    /// `ModelNotFound` if no model file exists.
    pub fn discover() -> Result<Self> {
        if let Some(path) = std::env::var_os(MODEL_ENV_VAR) {
            return Self::new(expand_home(&PathBuf::from(path).to_string_lossy()));
        }
        DEFAULT_MODEL_PATHS
            .iter()
            .map(|path| expand_home(path))
            .find(|path| path.exists())
            .map_or_else(
                || Err(AudioError::model_not_found(DEFAULT_MODEL_PATHS[0])),
                Self::new,
            )
    }

    fn check_request(request: &TranscriptionRequest) -> Result<()> {
        let mut rejected = Vec::new();
        if request
            .decode_method
            .as_deref()
            .is_some_and(|method| method != "greedy")
        {
            rejected.push("decode_method");
        }
        if request.config.is_some() {
            rejected.push("config");
        }
        if request.ckpt_path.is_some() {
            rejected.push("ckpt_path");
        }
        if request
            .sample_rate
            .is_some_and(|rate| rate != WHISPER_SAMPLE_RATE)
        {
            rejected.push("sample_rate");
        }
        if rejected.is_empty() {
            Ok(())
        } else {
            Err(AudioError::unsupported_arguments(rejected))
        }
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn transcribe(&self, audio: &Path, request: &TranscriptionRequest) -> Result<String> {
        Self::check_request(request)?;

        let extension = audio
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if extension != "wav" {
            return Err(AudioError::unsupported_format(extension));
        }

        let (samples, original_rate) = read_wav_samples(audio)?;
        let samples = resample_audio(&samples, original_rate, WHISPER_SAMPLE_RATE)?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        if let Some(lang) = request.lang.as_deref() {
            params.set_language(Some(lang));
        }
        params.set_print_progress(false);
        params.set_print_timestamps(false);

        let mut state = self.context.create_state().map_err(|e| {
            AudioError::transcription_failed(format!("Failed to create Whisper state: {e}"))
        })?;
        state
            .full(params, &samples)
            .map_err(|e| AudioError::transcription_failed(format!("Transcription failed: {e}")))?;

        let mut text = String::new();
        for i in 0..state.full_n_segments() {
            let segment = state.get_segment(i).ok_or_else(|| {
                AudioError::transcription_failed(format!("Failed to get segment {i}"))
            })?;
            let segment_text = segment.to_str_lossy().map_err(|e| {
                AudioError::transcription_failed(format!("Failed to get segment text: {e}"))
            })?;
            text.push_str(segment_text.trim());
            text.push(' ');
        }
        Ok(text.trim().to_string())
    }
}

fn expand_home(path: &str) -> PathBuf {
    path.strip_prefix("~/").map_or_else(
        || PathBuf::from(path),
        |stripped| {
            std::env::var_os("HOME")
                .map_or_else(|| PathBuf::from(path), |home| PathBuf::from(home).join(stripped))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_request_rejects_unsupported_fields() {
        let request = TranscriptionRequest {
            model: Some("base".into()),
            lang: Some("zh".into()),
            sample_rate: Some(16000),
            decode_method: Some("attention_rescoring".into()),
            config: None,
            ckpt_path: None,
        };
        let err = WhisperRecognizer::check_request(&request).unwrap_err();
        assert!(matches!(
            err,
            AudioError::UnsupportedArguments { ref arguments } if arguments == &["decode_method"]
        ));
        assert!(WhisperRecognizer::check_request(&request.reduced()).is_ok());
    }

    #[test]
    fn test_new_missing_model() {
        let err = WhisperRecognizer::new("/nonexistent/ggml.bin").unwrap_err();
        assert!(matches!(err, AudioError::ModelNotFound { .. }));
    }

    #[test]
    fn test_expand_home_plain_path() {
        assert_eq!(expand_home("./models/x.bin"), PathBuf::from("./models/x.bin"));
    }
}
