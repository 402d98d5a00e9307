//! Sample-rate conversion for mix assembly.
//!
//! Excerpts are resampled with rubato when their source rate differs from
//! the mix output rate.

use rubato::{FftFixedIn, Resampler};

use crate::error::{AutodjError, ErrorCode, Result};

/// Input chunk size fed to the FFT resampler.
const CHUNK_SIZE: usize = 1024;

/// Resamples a mono buffer from one sample rate to another.
///
/// Returns the input unchanged when the rates already match. The output is
/// trimmed to the expected `len * to_rate / from_rate` length after the
/// resampler's group delay is dropped.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler =
        FftFixedIn::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_SIZE, 2, 1).map_err(
            |e| {
                AutodjError::with_source(
                    ErrorCode::DecodeFailed,
                    format!("resampler construction failed ({} -> {} Hz)", from_rate, to_rate),
                    e,
                )
            },
        )?;

    let expected = (samples.len() as u64 * to_rate as u64 / from_rate as u64) as usize;
    let delay = resampler.output_delay();
    let mut out: Vec<f32> = Vec::with_capacity(expected + delay);

    let mut pos = 0;
    while samples.len() - pos >= CHUNK_SIZE {
        let chunk = &samples[pos..pos + CHUNK_SIZE];
        let frames = resampler
            .process(&[chunk], None)
            .map_err(|e| AutodjError::with_source(ErrorCode::DecodeFailed, "resample failed", e))?;
        out.extend_from_slice(&frames[0]);
        pos += CHUNK_SIZE;
    }

    // Feed the final short chunk, then flush the resampler's internal delay.
    if pos < samples.len() {
        let frames = resampler
            .process_partial(Some(&[&samples[pos..]]), None)
            .map_err(|e| AutodjError::with_source(ErrorCode::DecodeFailed, "resample failed", e))?;
        out.extend_from_slice(&frames[0]);
    }

    let tail: Option<&[&[f32]]> = None;
    let frames = resampler
        .process_partial(tail, None)
        .map_err(|e| AutodjError::with_source(ErrorCode::DecodeFailed, "resample failed", e))?;
    out.extend_from_slice(&frames[0]);

    // Drop the leading group delay and trim to the expected length.
    let start = delay.min(out.len());
    let mut out = out.split_off(start);
    out.truncate(expected);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_identity_when_rates_match() {
        let samples = vec![0.1f32, 0.2, 0.3];
        let out = resample(&samples, 44100, 44100).unwrap();
        assert_eq!(out, samples);
    }

    #[test]
    fn resample_halves_length() {
        let samples = vec![0.25f32; 44100];
        let out = resample(&samples, 44100, 22050).unwrap();
        // Expect roughly half the samples, within resampler edge tolerance.
        let expected = 22050;
        assert!(
            (out.len() as i64 - expected as i64).unsigned_abs() < 256,
            "got {} samples, expected about {}",
            out.len(),
            expected
        );
    }

    #[test]
    fn resample_preserves_dc_level() {
        let samples = vec![0.5f32; 48000];
        let out = resample(&samples, 48000, 44100).unwrap();
        // The interior of a constant signal stays at the constant.
        let mid = out[out.len() / 2];
        assert!((mid - 0.5).abs() < 0.05, "mid sample {} drifted", mid);
    }

    #[test]
    fn resample_empty_is_empty() {
        let out = resample(&[], 44100, 48000).unwrap();
        assert!(out.is_empty());
    }
}
