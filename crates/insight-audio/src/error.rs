//! Error types for audio processing

use std::path::PathBuf;

/// Result type for audio operations
pub type Result<T> = std::result::Result<T, AudioError>;

/// Errors that can occur during audio processing
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// Invalid audio format or corrupted file
    #[error("Invalid audio format in {path}: {message}")]
    InvalidFormat {
        /// Path to the audio file
        path: PathBuf,
        /// Description of the format error
        message: String,
    },

    /// Unsupported audio format
    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat {
        /// Format name that is not supported
        format: String,
    },

    /// No speech recognizer is available in this build or environment
    #[error("Speech recognizer unavailable: {reason}")]
    RecognizerUnavailable {
        /// Why no recognizer could be provided
        reason: String,
    },

    /// Transcription model not found
    #[error("Transcription model not found at {path}")]
    ModelNotFound {
        /// Path where the model was expected
        path: PathBuf,
    },

    /// The recognizer does not accept some of the request arguments
    #[error("Recognizer does not accept arguments: {}", arguments.join(", "))]
    UnsupportedArguments {
        /// Names of the rejected arguments
        arguments: Vec<String>,
    },

    /// Transcription failed
    #[error("Transcription failed: {message}")]
    TranscriptionFailed {
        /// Description of the transcription failure
        message: String,
    },

    /// Audio resampling failed
    #[error("Failed to resample audio: {message}")]
    ResamplingFailed {
        /// Description of the resampling failure
        message: String,
    },
}

impl AudioError {
    /// Create an invalid format error
    #[inline]
    #[must_use = "creates an invalid format error that should be returned or handled"]
    pub fn invalid_format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported format error
    #[inline]
    #[must_use = "creates an unsupported format error that should be returned or handled"]
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Create a recognizer unavailable error
    #[inline]
    #[must_use = "creates a recognizer unavailable error that should be returned or handled"]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::RecognizerUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a model not found error
    #[inline]
    #[must_use = "creates a model not found error that should be returned or handled"]
    pub fn model_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ModelNotFound { path: path.into() }
    }

    /// Create an unsupported arguments error
    #[inline]
    #[must_use = "creates an unsupported arguments error that should be returned or handled"]
    pub fn unsupported_arguments<I, S>(arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::UnsupportedArguments {
            arguments: arguments.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a transcription failed error
    #[inline]
    #[must_use = "creates a transcription failed error that should be returned or handled"]
    pub fn transcription_failed(message: impl Into<String>) -> Self {
        Self::TranscriptionFailed {
            message: message.into(),
        }
    }

    /// Create a resampling failed error
    #[inline]
    #[must_use = "creates a resampling failed error that should be returned or handled"]
    pub fn resampling_failed(message: impl Into<String>) -> Self {
        Self::ResamplingFailed {
            message: message.into(),
        }
    }
}
