//! Audio support for insight-parse
//!
//! This crate provides the pieces the audio strategy builds on:
//!
//! - [`probe_wav`]: container facts (duration, channels, sample rate, signal level)
//! - [`SpeechRecognizer`]: the seam to an external speech-to-text engine
//! - [`transcribe_with_fallback`]: one reduced-argument retry on a signature mismatch
//! - `WhisperRecognizer` (feature `transcription`): a bundled whisper engine
//!
//! ## Features
//!
//! - `transcription`: Enable the whisper recognizer (requires a GGML model)
//!
//! ## Examples
//!
//! ```no_run
//! use insight_audio::probe_wav;
//!
//! let probe = probe_wav("recording.wav")?;
//! println!("{} channels, {:.2}s", probe.channels, probe.duration_secs);
//! # Ok::<(), insight_audio::AudioError>(())
//! ```

pub mod error;
pub mod recognizer;
pub mod resample;
pub mod wav;

#[cfg(feature = "transcription")]
pub mod whisper;

pub use error::{AudioError, Result};
pub use recognizer::{
    default_recognizer, transcribe_with_fallback, SpeechRecognizer, TranscriptionRequest,
};
pub use resample::resample_audio;
pub use wav::{probe_wav, read_wav_samples, WavProbe};

#[cfg(feature = "transcription")]
pub use whisper::WhisperRecognizer;
