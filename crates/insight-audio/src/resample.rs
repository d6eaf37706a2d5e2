//! Sample-rate conversion for recognizers with a fixed input rate.

use crate::error::{AudioError, Result};

/// Resample mono audio from `from_rate` to `to_rate`.
///
/// # Errors
///
/// Returns `AudioError::ResamplingFailed` if the resampler rejects the
/// parameters or the input.
pub fn resample_audio(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
    };

    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    if from_rate == 0 || to_rate == 0 {
        return Err(AudioError::resampling_failed(format!(
            "invalid sample rates {from_rate} -> {to_rate}"
        )));
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(
        f64::from(to_rate) / f64::from(from_rate),
        2.0,
        params,
        samples.len(),
        1,
    )
    .map_err(|e| AudioError::resampling_failed(format!("Failed to create resampler: {e}")))?;

    let waves_in = vec![samples.to_vec()];
    let mut waves_out = resampler
        .process(&waves_in, None)
        .map_err(|e| AudioError::resampling_failed(format!("Resampling failed: {e}")))?;

    Ok(waves_out.swap_remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_audio() {
        // 1 second of silence at 44.1kHz
        let samples: Vec<f32> = vec![0.0; 44100];
        let resampled = resample_audio(&samples, 44100, 16000).unwrap();

        #[allow(clippy::cast_precision_loss)]
        let diff = (resampled.len() as f32 - 16000.0).abs();
        assert!(diff < 100.0);
    }

    #[test]
    fn test_resample_audio_same_rate() {
        let samples: Vec<f32> = vec![0.0; 16000];
        let resampled = resample_audio(&samples, 16000, 16000).unwrap();
        assert_eq!(samples.len(), resampled.len());
    }

    #[test]
    fn test_resample_rejects_zero_rate() {
        assert!(resample_audio(&[0.1, 0.2], 0, 16000).is_err());
    }
}
