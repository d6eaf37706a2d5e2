//! WAV (Waveform Audio Format) probing
//!
//! Reads container facts with the `hound` crate:
//!
//! - sample rate, channel count, bit depth
//! - duration computed from the frame count
//! - a coarse signal level (mean absolute amplitude of 16-bit PCM)
//! - mono f32 samples for recognizers that need raw audio
//!
//! ## Example
//!
//! ```no_run
//! use insight_audio::probe_wav;
//!
//! let probe = probe_wav("recording.wav")?;
//! println!("Sample rate: {}Hz", probe.sample_rate);
//! println!("Duration: {:.2}s", probe.duration_secs);
//! # Ok::<(), insight_audio::AudioError>(())
//! ```

use std::path::Path;

use hound::SampleFormat;

use crate::error::{AudioError, Result};

/// Facts about a WAV file
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WavProbe {
    /// Sample rate in Hz (e.g., 16000, 44100)
    pub sample_rate: u32,

    /// Number of audio channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Bit depth (e.g., 16, 24, 32)
    pub bit_depth: u16,

    /// Duration in seconds
    pub duration_secs: f64,

    /// Frames (samples per channel)
    pub total_frames: u32,

    /// Mean absolute amplitude of 16-bit integer PCM; `None` for other encodings
    pub signal_level: Option<f64>,
}

/// Probe a WAV file.
///
/// # Errors
///
/// Returns `AudioError::InvalidFormat` if the file is not a readable WAV.
#[must_use = "this function returns WAV facts that should be processed"]
pub fn probe_wav<P: AsRef<Path>>(path: P) -> Result<WavProbe> {
    let path = path.as_ref();

    let mut reader = hound::WavReader::open(path)
        .map_err(|e| AudioError::invalid_format(path, format!("Failed to open WAV file: {e}")))?;

    let spec = reader.spec();
    let total_frames = reader.duration();
    let duration_secs = if spec.sample_rate == 0 {
        0.0
    } else {
        f64::from(total_frames) / f64::from(spec.sample_rate)
    };

    let signal_level = if spec.sample_format == SampleFormat::Int && spec.bits_per_sample == 16 {
        Some(mean_abs_amplitude(reader.samples::<i16>().map_while(|s| s.ok())))
    } else {
        None
    };

    Ok(WavProbe {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bit_depth: spec.bits_per_sample,
        duration_secs,
        total_frames,
        signal_level,
    })
}

fn mean_abs_amplitude(samples: impl Iterator<Item = i16>) -> f64 {
    let (sum, count) = samples.fold((0.0_f64, 0_u64), |(sum, count), sample| {
        (sum + f64::from(sample).abs(), count + 1)
    });
    if count == 0 {
        0.0
    } else {
        // Sample counts stay far below f64's exact integer range
        #[allow(clippy::cast_precision_loss)]
        let count = count as f64;
        sum / count
    }
}

/// Read WAV samples as mono f32 in `[-1.0, 1.0]`.
///
/// Multi-channel audio is averaged per frame. Returns the samples and the
/// file's sample rate.
///
/// # Errors
///
/// Returns `AudioError` if the file cannot be read or uses an unsupported
/// bit depth.
#[must_use = "this function returns audio samples that should be processed"]
pub fn read_wav_samples<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, u32)> {
    let path = path.as_ref();

    let mut reader = hound::WavReader::open(path)
        .map_err(|e| AudioError::invalid_format(path, format!("Failed to open WAV file: {e}")))?;

    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader.samples::<f32>().map(|s| s.unwrap_or(0.0)).collect(),
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| f32::from(s.unwrap_or(0)) / 128.0)
            .collect(),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| f32::from(s.unwrap_or(0)) / 32768.0)
            .collect(),
        // 24/32-bit integer PCM to f32 is standard practice in audio processing
        #[allow(clippy::cast_precision_loss)]
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.unwrap_or(0) as f32 / 8_388_608.0)
            .collect(),
        #[allow(clippy::cast_precision_loss)]
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.unwrap_or(0) as f32 / 2_147_483_648.0)
            .collect(),
        (format, bits) => {
            return Err(AudioError::invalid_format(
                path,
                format!("Unsupported sample encoding: {format:?} {bits}-bit"),
            ));
        }
    };

    let mono_samples = if channels == 1 {
        samples
    } else {
        // Channel counts are tiny; the cast is exact
        #[allow(clippy::cast_precision_loss)]
        let divisor = channels as f32;
        samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / divisor)
            .collect()
    };

    Ok((mono_samples, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn write_wav(path: &Path, channels: u16, samples: &[i16]) {
        let spec = WavSpec {
            channels,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &sample in samples {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_parse_nonexistent_wav() {
        let result = probe_wav("nonexistent.wav");
        assert!(matches!(result, Err(AudioError::InvalidFormat { .. })));
    }

    #[test]
    fn test_parse_invalid_wav() {
        // A text file instead of WAV
        let result = probe_wav("Cargo.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_probe_silence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("silence.wav");
        write_wav(&path, 1, &[0; 160]);

        let probe = probe_wav(&path).unwrap();
        assert_eq!(probe.sample_rate, 16_000);
        assert_eq!(probe.channels, 1);
        assert_eq!(probe.total_frames, 160);
        assert!((probe.duration_secs - 0.01).abs() < 1e-9);
        assert_eq!(probe.signal_level, Some(0.0));
    }

    #[test]
    fn test_probe_signal_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, 2, &[100, -100, 300, -300]);

        let probe = probe_wav(&path).unwrap();
        assert_eq!(probe.total_frames, 2);
        assert_eq!(probe.signal_level, Some(200.0));
    }

    #[test]
    fn test_read_samples_downmixes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, &[16384, 0, -16384, -16384]);

        let (samples, rate) = read_wav_samples(&path).unwrap();
        assert_eq!(rate, 16_000);
        assert_eq!(samples, vec![0.25, -0.5]);
    }
}
