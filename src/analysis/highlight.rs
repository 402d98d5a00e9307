//! Highlight detection.
//!
//! Finds a track's most energetically prominent intervals by smoothing its
//! energy envelope and picking thresholded, well-separated peaks.

use crate::analysis::Envelope;
use crate::types::Highlight;

/// Moving-average window in frames.
const SMOOTHING_WINDOW: usize = 10;

/// A peak must exceed this multiple of the smoothed-envelope mean.
const PEAK_THRESHOLD_RATIO: f32 = 1.5;

/// Minimum spacing between accepted peaks, in seconds.
const PEAK_MIN_SPACING_SEC: f32 = 5.0;

/// Nominal half-width of a highlight window, in seconds.
const HALF_WINDOW_SEC: f32 = 10.0;

/// Maximum number of highlights kept per track.
const MAX_HIGHLIGHTS: usize = 3;

/// Detects highlight windows in an energy envelope.
///
/// Returns at most [`MAX_HIGHLIGHTS`] windows ordered by descending
/// intensity. An empty or too-short envelope yields an empty vec - a valid
/// outcome that downstream consumers handle with a fallback excerpt.
pub fn detect(envelope: &Envelope, track_duration: f32) -> Vec<Highlight> {
    if envelope.is_empty() || track_duration <= 0.0 {
        return Vec::new();
    }

    let smoothed = moving_average(&envelope.values, SMOOTHING_WINDOW);

    let mean = smoothed.iter().sum::<f32>() / smoothed.len() as f32;
    let min_height = mean * PEAK_THRESHOLD_RATIO;

    // Frames between accepted peaks; integer frame rate, matching
    // sample_rate / hop_length * spacing.
    let min_distance =
        ((envelope.sample_rate as usize / envelope.hop_length) as f32 * PEAK_MIN_SPACING_SEC)
            .max(1.0) as usize;

    let peaks = find_peaks(&smoothed, min_height, min_distance);

    let mut highlights: Vec<Highlight> = peaks
        .into_iter()
        .map(|frame| {
            let peak_sec = envelope.frame_to_sec(frame);
            Highlight {
                start_sec: (peak_sec - HALF_WINDOW_SEC).max(0.0),
                end_sec: (peak_sec + HALF_WINDOW_SEC).min(track_duration),
                peak_sec,
                intensity: smoothed[frame],
            }
        })
        .collect();

    highlights.sort_by(|a, b| b.intensity.total_cmp(&a.intensity));
    highlights.truncate(MAX_HIGHLIGHTS);
    highlights
}

/// Centered moving average with zero padding at the edges.
///
/// The divisor stays fixed at the window size, so edge frames are damped
/// rather than renormalized.
fn moving_average(values: &[f32], window: usize) -> Vec<f32> {
    let n = values.len();
    let half_left = window / 2;
    let mut out = Vec::with_capacity(n);

    for i in 0..n {
        let lo = i.saturating_sub(half_left);
        let hi = (i + window - half_left).min(n);
        let sum: f32 = values[lo..hi].iter().sum();
        out.push(sum / window as f32);
    }

    out
}

/// Picks strict local maxima above `min_height`, thinned so accepted peaks
/// are at least `min_distance` frames apart, preferring higher peaks.
fn find_peaks(values: &[f32], min_height: f32, min_distance: usize) -> Vec<usize> {
    let mut candidates: Vec<usize> = Vec::new();
    for i in 1..values.len().saturating_sub(1) {
        if values[i] > values[i - 1] && values[i] > values[i + 1] && values[i] > min_height {
            candidates.push(i);
        }
    }

    // Highest peaks claim their neighborhood first.
    candidates.sort_by(|a, b| values[*b].total_cmp(&values[*a]));

    let mut accepted: Vec<usize> = Vec::new();
    for candidate in candidates {
        if accepted
            .iter()
            .all(|&peak| candidate.abs_diff(peak) >= min_distance)
        {
            accepted.push(candidate);
        }
    }

    accepted.sort_unstable();
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 22050;
    const HOP: usize = 1024;

    /// Builds an envelope for `duration_sec` of audio with unit bumps at
    /// the given second offsets over a quiet baseline.
    fn spiky_envelope(duration_sec: f32, spikes: &[(f32, f32)]) -> Envelope {
        let frames = (duration_sec * SAMPLE_RATE as f32 / HOP as f32) as usize;
        let mut values = vec![0.05f32; frames];
        for &(at_sec, height) in spikes {
            let center = (at_sec * SAMPLE_RATE as f32 / HOP as f32) as usize;
            for i in center.saturating_sub(5)..(center + 5).min(frames) {
                values[i] = height;
            }
        }
        Envelope {
            values,
            frame_length: 2048,
            hop_length: HOP,
            sample_rate: SAMPLE_RATE,
        }
    }

    #[test]
    fn single_spike_yields_centered_window() {
        let envelope = spiky_envelope(60.0, &[(30.0, 1.0)]);
        let highlights = detect(&envelope, 60.0);

        assert_eq!(highlights.len(), 1);
        let h = &highlights[0];
        assert!((h.peak_sec - 30.0).abs() < 1.0, "peak at {}", h.peak_sec);
        assert!((h.start_sec - 20.0).abs() < 1.0);
        assert!((h.end_sec - 40.0).abs() < 1.0);
        assert!(h.validate(60.0).is_none());
    }

    #[test]
    fn window_clamps_to_track_bounds() {
        let envelope = spiky_envelope(60.0, &[(3.0, 1.0)]);
        let highlights = detect(&envelope, 60.0);

        assert_eq!(highlights.len(), 1);
        assert_eq!(highlights[0].start_sec, 0.0);
        assert!(highlights[0].end_sec <= 60.0);
        assert!(highlights[0].duration_sec() <= 20.0 + f32::EPSILON);
    }

    #[test]
    fn highlights_sorted_by_intensity_and_capped() {
        let envelope = spiky_envelope(
            240.0,
            &[(30.0, 0.6), (90.0, 1.0), (150.0, 0.8), (210.0, 0.7)],
        );
        let highlights = detect(&envelope, 240.0);

        assert_eq!(highlights.len(), 3);
        assert!(highlights[0].intensity >= highlights[1].intensity);
        assert!(highlights[1].intensity >= highlights[2].intensity);
        // The weakest spike (30s, 0.6) is the one dropped.
        assert!(highlights.iter().all(|h| (h.peak_sec - 30.0).abs() > 5.0));
    }

    #[test]
    fn close_peaks_are_thinned_to_strongest() {
        // Two spikes 2 seconds apart; minimum spacing is 5 seconds.
        let envelope = spiky_envelope(60.0, &[(30.0, 1.0), (32.0, 0.7)]);
        let highlights = detect(&envelope, 60.0);

        assert_eq!(highlights.len(), 1);
        assert!((highlights[0].peak_sec - 30.0).abs() < 1.5);
    }

    #[test]
    fn flat_envelope_has_no_highlights() {
        let envelope = Envelope {
            values: vec![0.0; 1000],
            frame_length: 2048,
            hop_length: HOP,
            sample_rate: SAMPLE_RATE,
        };
        assert!(detect(&envelope, 60.0).is_empty());
    }

    #[test]
    fn empty_envelope_has_no_highlights() {
        let envelope = Envelope::empty(2048, HOP, SAMPLE_RATE);
        assert!(detect(&envelope, 60.0).is_empty());
    }

    #[test]
    fn uniform_envelope_has_no_highlights() {
        // Constant energy never exceeds 1.5x its own mean.
        let envelope = Envelope {
            values: vec![0.5; 1000],
            frame_length: 2048,
            hop_length: HOP,
            sample_rate: SAMPLE_RATE,
        };
        assert!(detect(&envelope, 60.0).is_empty());
    }

    #[test]
    fn bounds_invariant_holds() {
        let envelope = spiky_envelope(45.0, &[(5.0, 1.0), (40.0, 0.9)]);
        for h in detect(&envelope, 45.0) {
            assert!(h.start_sec >= 0.0);
            assert!(h.start_sec <= h.peak_sec);
            assert!(h.peak_sec <= h.end_sec);
            assert!(h.end_sec <= 45.0);
            assert!(h.duration_sec() <= 20.0 + 1e-3);
        }
    }

    #[test]
    fn moving_average_damps_edges() {
        let values = vec![1.0f32; 20];
        let smoothed = moving_average(&values, 10);
        assert_eq!(smoothed.len(), 20);
        // Interior frames see the full window.
        assert!((smoothed[10] - 1.0).abs() < 1e-6);
        // Edge frames are zero-padded, so they sit below the interior.
        assert!(smoothed[0] < 1.0);
    }
}
