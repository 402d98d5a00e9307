//! Energy envelope extraction.
//!
//! Turns a decoded signal into a normalized time series of short-term
//! root-mean-square energy, one value per analysis frame.

use serde::{Deserialize, Serialize};

use crate::audio::AudioSignal;
use crate::error::{AutodjError, Result};

/// A normalized per-frame energy envelope.
///
/// Values are RMS amplitudes divided by the maximum observed value, so a
/// non-silent signal always peaks at 1.0. A silent signal yields the
/// degenerate all-zero sequence. Frame geometry is carried alongside the
/// values so frame indices can be converted back to time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Normalized RMS value per frame, in [0, 1].
    pub values: Vec<f32>,

    /// Frame length in samples.
    pub frame_length: usize,

    /// Stride between frames in samples.
    pub hop_length: usize,

    /// Sample rate of the analyzed signal in Hz.
    pub sample_rate: u32,
}

impl Envelope {
    /// Creates an envelope with no frames.
    pub fn empty(frame_length: usize, hop_length: usize, sample_rate: u32) -> Self {
        Self {
            values: Vec::new(),
            frame_length,
            hop_length,
            sample_rate,
        }
    }

    /// Returns the number of frames.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the envelope has no frames.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Converts a frame index to a time offset in seconds.
    pub fn frame_to_sec(&self, frame: usize) -> f32 {
        (frame * self.hop_length) as f32 / self.sample_rate as f32
    }
}

/// Extracts a normalized RMS energy envelope from a signal.
///
/// The signal is partitioned into overlapping `frame_length`-sample frames
/// spaced `hop_length` samples apart (no padding; a signal shorter than one
/// frame yields an empty envelope). Deterministic and pure; the only error
/// is a zero-length signal.
pub fn extract(signal: &AudioSignal, frame_length: usize, hop_length: usize) -> Result<Envelope> {
    if signal.is_empty() {
        return Err(AutodjError::empty_signal());
    }

    let samples = &signal.samples;
    let num_frames = if samples.len() >= frame_length {
        (samples.len() - frame_length) / hop_length + 1
    } else {
        0
    };

    let mut values = Vec::with_capacity(num_frames);
    for i in 0..num_frames {
        let start = i * hop_length;
        let end = (start + frame_length).min(samples.len());
        let sum_sq: f32 = samples[start..end].iter().map(|s| s * s).sum();
        let rms = (sum_sq / (end - start) as f32).sqrt();
        values.push(rms);
    }

    // Normalize to [0, 1]; silence stays all-zero.
    let max = values.iter().cloned().fold(0.0f32, f32::max);
    if max > 0.0 {
        for v in values.iter_mut() {
            *v /= max;
        }
    }

    Ok(Envelope {
        values,
        frame_length,
        hop_length,
        sample_rate: signal.sample_rate,
    })
}
