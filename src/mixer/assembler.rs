//! Mix assembly.
//!
//! Orders analyzed tracks by highlight intensity, extracts one excerpt per
//! track, and concatenates the excerpts into a single buffer with fixed
//! fade and crossfade treatment. Per-track problems (missing or unreadable
//! audio, degenerate excerpts) skip the track and never abort assembly.

use log::{info, warn};

use crate::audio::{decode_file, resample, samples_to_duration};
use crate::types::Track;

/// Fade-in/fade-out length applied to every excerpt, in seconds.
pub const FADE_SEC: f32 = 2.0;

/// Overlap between consecutive excerpts, in seconds.
pub const CROSSFADE_SEC: f32 = 2.0;

/// Length of the fallback excerpt for tracks without highlights.
const FALLBACK_EXCERPT_SEC: f32 = 30.0;

/// Minimum excerpt length. Excerpts must outlast the crossfade overlap on
/// both sides, so anything shorter is widened (or the track skipped).
const MIN_EXCERPT_SEC: f32 = 4.0;

/// Output rate used when no track contributes any audio.
const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// A track dropped during assembly, with the reason it was dropped.
#[derive(Debug, Clone)]
pub struct SkippedTrack {
    /// Identity of the skipped track.
    pub track_id: String,
    /// Human-readable skip reason.
    pub reason: String,
}

/// The assembled mix buffer plus per-track diagnostics.
#[derive(Debug)]
pub struct MixOutput {
    /// Mono mix samples.
    pub samples: Vec<f32>,
    /// Sample rate of the mix (the first contributing excerpt's rate).
    pub sample_rate: u32,
    /// Number of tracks that contributed an excerpt.
    pub contributing: usize,
    /// Tracks dropped during assembly.
    pub skipped: Vec<SkippedTrack>,
}

impl MixOutput {
    /// Returns the mix duration in seconds.
    pub fn duration_sec(&self) -> f32 {
        samples_to_duration(self.samples.len(), self.sample_rate)
    }
}

/// Orders tracks by descending mean highlight intensity.
///
/// A track with no highlights ranks as intensity 0 and therefore sorts
/// last. Pure: returns a new ordering and leaves the input untouched.
pub fn rank_by_intensity(tracks: &[Track]) -> Vec<Track> {
    let mut ranked = tracks.to_vec();
    ranked.sort_by(|a, b| {
        b.mean_highlight_intensity()
            .total_cmp(&a.mean_highlight_intensity())
    });
    ranked
}

/// Assembles a crossfaded mix from the given tracks.
///
/// Tracks are ranked by intensity, one excerpt is cut per track (the top
/// highlight, or a 30-second middle excerpt as fallback), every excerpt is
/// faded in and out over 2 seconds, and consecutive excerpts overlap by
/// 2 seconds. Completing with zero or one contributing excerpt is valid.
pub fn assemble(tracks: &[Track]) -> MixOutput {
    let ranked = rank_by_intensity(tracks);

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_rate = DEFAULT_SAMPLE_RATE;
    let mut cursor: usize = 0;
    let mut contributing = 0;
    let mut skipped: Vec<SkippedTrack> = Vec::new();

    for track in &ranked {
        let mut excerpt = match cut_excerpt(track) {
            Ok(excerpt) => excerpt,
            Err(reason) => {
                warn!("skipping track {}: {}", track.track_id, reason);
                skipped.push(SkippedTrack {
                    track_id: track.track_id.clone(),
                    reason,
                });
                continue;
            }
        };

        // The first contributor fixes the mix rate; later excerpts are
        // converted to it.
        if contributing == 0 {
            sample_rate = excerpt.sample_rate;
        } else if excerpt.sample_rate != sample_rate {
            match resample(&excerpt.samples, excerpt.sample_rate, sample_rate) {
                Ok(converted) => excerpt.samples = converted,
                Err(e) => {
                    warn!("skipping track {}: {}", track.track_id, e);
                    skipped.push(SkippedTrack {
                        track_id: track.track_id.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            }
        }

        apply_fades(&mut excerpt.samples, sample_rate);

        let overlap = (CROSSFADE_SEC * sample_rate as f32) as usize;
        if contributing == 0 {
            samples.extend_from_slice(&excerpt.samples);
            cursor = samples.len();
        } else {
            // Overlay the excerpt starting 2 seconds before the cursor so
            // the outgoing fade-out and incoming fade-in overlap.
            let pos = cursor.saturating_sub(overlap);
            let needed = pos + excerpt.samples.len();
            if samples.len() < needed {
                samples.resize(needed, 0.0);
            }
            for (i, s) in excerpt.samples.iter().enumerate() {
                samples[pos + i] += s;
            }
            cursor = pos + excerpt.samples.len();
        }
        contributing += 1;
    }

    info!(
        "assembled mix: {} contributing, {} skipped, {:.1}s",
        contributing,
        skipped.len(),
        samples_to_duration(samples.len(), sample_rate)
    );

    MixOutput {
        samples,
        sample_rate,
        contributing,
        skipped,
    }
}

/// An excerpt cut from a track, still at the track's source rate.
struct Excerpt {
    samples: Vec<f32>,
    sample_rate: u32,
}

/// Decodes a track's local audio and cuts its excerpt.
///
/// Returns a skip reason when the track cannot contribute: no local audio,
/// undecodable file, or a track shorter than the minimum excerpt.
fn cut_excerpt(track: &Track) -> Result<Excerpt, String> {
    let path = track
        .local_path
        .as_ref()
        .ok_or_else(|| "no local audio".to_string())?;

    let signal = decode_file(path).map_err(|e| e.to_string())?;

    let sr = signal.sample_rate as f32;
    let n = signal.len();
    let min_len = (MIN_EXCERPT_SEC * sr) as usize;
    if n < min_len {
        return Err(format!(
            "track is shorter than the {} second minimum excerpt",
            MIN_EXCERPT_SEC
        ));
    }

    let (mut start, mut end) = match track.top_highlight() {
        Some(h) => ((h.start_sec * sr) as usize, (h.end_sec * sr) as usize),
        None => {
            // No highlight cleared detection: fixed-length excerpt centered
            // on the track midpoint.
            let half = (FALLBACK_EXCERPT_SEC / 2.0 * sr) as usize;
            let mid = n / 2;
            (mid.saturating_sub(half), mid + half)
        }
    };

    // Guard against duration drift between analysis and decode.
    end = end.min(n);
    if start >= end {
        start = end.saturating_sub(min_len);
    }

    // Widen degenerate windows so the excerpt carries the crossfade
    // overlap on both sides.
    if end - start < min_len {
        end = (start + min_len).min(n);
        start = end.saturating_sub(min_len);
    }

    Ok(Excerpt {
        samples: signal.samples[start..end].to_vec(),
        sample_rate: signal.sample_rate,
    })
}

/// Applies a linear fade-in and fade-out to an excerpt.
fn apply_fades(samples: &mut [f32], sample_rate: u32) {
    let n = samples.len();
    let fade = ((FADE_SEC * sample_rate as f32) as usize).min(n / 2);
    if fade == 0 {
        return;
    }
    for i in 0..fade {
        let gain = i as f32 / fade as f32;
        samples[i] *= gain;
        samples[n - 1 - i] *= gain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Envelope;
    use crate::audio::write_wav;
    use crate::types::{Highlight, TrackAnalysis};
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    const SR: u32 = 8000;

    fn write_tone(dir: &Path, name: &str, duration_sec: f32, sample_rate: u32) -> PathBuf {
        let path = dir.join(name);
        let n = (duration_sec * sample_rate as f32) as usize;
        let samples: Vec<f32> = (0..n)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                0.25 * (2.0 * std::f32::consts::PI * 110.0 * t).sin()
            })
            .collect();
        write_wav(&samples, &path, sample_rate).unwrap();
        path
    }

    fn highlight(start: f32, end: f32, intensity: f32) -> Highlight {
        Highlight {
            start_sec: start,
            end_sec: end,
            peak_sec: (start + end) / 2.0,
            intensity,
        }
    }

    fn track_with(
        path: PathBuf,
        sample_rate: u32,
        duration_sec: f32,
        highlights: Vec<Highlight>,
    ) -> Track {
        let mut track = Track::new(
            path.file_name().unwrap().to_string_lossy().to_string(),
            None,
            "House",
            path.to_string_lossy().to_string(),
        );
        track.local_path = Some(path);
        track.duration_sec = Some(duration_sec);
        track.analysis = TrackAnalysis::Analyzed {
            envelope: Envelope::empty(2048, 1024, sample_rate),
            highlights,
        };
        track
    }

    #[test]
    fn three_tracks_crossfade_to_fifty_six_seconds() {
        let dir = tempdir().unwrap();
        let tracks: Vec<Track> = (0..3)
            .map(|i| {
                let path = write_tone(dir.path(), &format!("t{}.wav", i), 60.0, SR);
                track_with(
                    path,
                    SR,
                    60.0,
                    vec![highlight(20.0, 40.0, 1.0 - i as f32 * 0.1)],
                )
            })
            .collect();

        let output = assemble(&tracks);

        assert_eq!(output.contributing, 3);
        assert!(output.skipped.is_empty());
        // 20 + (20 - 2) + (20 - 2) = 56 seconds
        assert!(
            (output.duration_sec() - 56.0).abs() < 0.05,
            "duration was {}",
            output.duration_sec()
        );
        // Strictly shorter than the sum of excerpt lengths.
        assert!(output.duration_sec() < 60.0);
    }

    #[test]
    fn single_track_keeps_excerpt_length() {
        let dir = tempdir().unwrap();
        let path = write_tone(dir.path(), "solo.wav", 60.0, SR);
        let tracks = vec![track_with(path, SR, 60.0, vec![highlight(20.0, 40.0, 1.0)])];

        let output = assemble(&tracks);

        assert_eq!(output.contributing, 1);
        assert!((output.duration_sec() - 20.0).abs() < 0.01);
    }

    #[test]
    fn fallback_excerpt_for_empty_highlights() {
        let dir = tempdir().unwrap();
        let path = write_tone(dir.path(), "flat.wav", 60.0, SR);
        // Analyzed, but nothing cleared the detection threshold.
        let tracks = vec![track_with(path, SR, 60.0, vec![])];

        let output = assemble(&tracks);

        assert_eq!(output.contributing, 1);
        assert!(
            (output.duration_sec() - 30.0).abs() < 0.01,
            "duration was {}",
            output.duration_sec()
        );
    }

    #[test]
    fn fallback_excerpt_for_unanalyzed_track() {
        let dir = tempdir().unwrap();
        let path = write_tone(dir.path(), "raw.wav", 45.0, SR);
        let mut track = Track::new("raw", None, "House", "raw.wav");
        track.local_path = Some(path);

        let output = assemble(&[track]);

        assert_eq!(output.contributing, 1);
        assert!((output.duration_sec() - 30.0).abs() < 0.01);
    }

    #[test]
    fn fallback_clamps_to_short_tracks() {
        let dir = tempdir().unwrap();
        // 12 seconds total: the 30-second fallback clamps to the track.
        let path = write_tone(dir.path(), "short.wav", 12.0, SR);
        let tracks = vec![track_with(path, SR, 12.0, vec![])];

        let output = assemble(&tracks);

        assert_eq!(output.contributing, 1);
        assert!(output.duration_sec() <= 12.0 + 0.01);
        assert!(output.duration_sec() >= MIN_EXCERPT_SEC);
    }

    #[test]
    fn excerpt_end_clamps_to_real_sample_length() {
        let dir = tempdir().unwrap();
        // Analysis believed 40 seconds, but the decoded file is 35.
        let path = write_tone(dir.path(), "drift.wav", 35.0, SR);
        let tracks = vec![track_with(path, SR, 40.0, vec![highlight(20.0, 40.0, 1.0)])];

        let output = assemble(&tracks);

        assert_eq!(output.contributing, 1);
        assert!((output.duration_sec() - 15.0).abs() < 0.01);
    }

    #[test]
    fn unreadable_track_is_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        let good_a = write_tone(dir.path(), "a.wav", 60.0, SR);
        let good_b = write_tone(dir.path(), "b.wav", 60.0, SR);

        let mut bad = track_with(
            PathBuf::from("/nonexistent/broken.wav"),
            SR,
            60.0,
            vec![highlight(20.0, 40.0, 0.9)],
        );
        bad.local_path = Some(PathBuf::from("/nonexistent/broken.wav"));

        let tracks = vec![
            track_with(good_a, SR, 60.0, vec![highlight(20.0, 40.0, 1.0)]),
            bad,
            track_with(good_b, SR, 60.0, vec![highlight(20.0, 40.0, 0.8)]),
        ];

        let output = assemble(&tracks);

        assert_eq!(output.contributing, 2);
        assert_eq!(output.skipped.len(), 1);
        // 20 + 18 seconds from the two readable tracks.
        assert!((output.duration_sec() - 38.0).abs() < 0.05);
    }

    #[test]
    fn too_short_track_is_skipped() {
        let dir = tempdir().unwrap();
        let path = write_tone(dir.path(), "blip.wav", 2.0, SR);
        let tracks = vec![track_with(path, SR, 2.0, vec![])];

        let output = assemble(&tracks);

        assert_eq!(output.contributing, 0);
        assert_eq!(output.skipped.len(), 1);
        assert!(output.samples.is_empty());
    }

    #[test]
    fn mixed_sample_rates_are_resampled() {
        let dir = tempdir().unwrap();
        let a = write_tone(dir.path(), "a.wav", 60.0, 8000);
        let b = write_tone(dir.path(), "b.wav", 60.0, 16000);

        let tracks = vec![
            track_with(a, 8000, 60.0, vec![highlight(20.0, 40.0, 1.0)]),
            track_with(b, 16000, 60.0, vec![highlight(20.0, 40.0, 0.5)]),
        ];

        let output = assemble(&tracks);

        assert_eq!(output.contributing, 2);
        assert_eq!(output.sample_rate, 8000);
        assert!(
            (output.duration_sec() - 38.0).abs() < 0.1,
            "duration was {}",
            output.duration_sec()
        );
    }

    #[test]
    fn empty_input_completes_empty() {
        let output = assemble(&[]);
        assert_eq!(output.contributing, 0);
        assert!(output.samples.is_empty());
        assert_eq!(output.duration_sec(), 0.0);
    }

    #[test]
    fn ranking_is_pure_and_descending() {
        let dir = tempdir().unwrap();
        let a = write_tone(dir.path(), "a.wav", 10.0, SR);
        let b = write_tone(dir.path(), "b.wav", 10.0, SR);
        let c = write_tone(dir.path(), "c.wav", 10.0, SR);

        let tracks = vec![
            track_with(a, SR, 10.0, vec![highlight(1.0, 5.0, 0.2)]),
            track_with(b, SR, 10.0, vec![highlight(1.0, 5.0, 0.9)]),
            track_with(c, SR, 10.0, vec![]),
        ];
        let original_first = tracks[0].track_id.clone();

        let ranked = rank_by_intensity(&tracks);

        assert_eq!(ranked[0].track_id, tracks[1].track_id);
        assert_eq!(ranked[1].track_id, tracks[0].track_id);
        // Highlight-less tracks sort last.
        assert_eq!(ranked[2].track_id, tracks[2].track_id);
        // The caller's ordering is untouched.
        assert_eq!(tracks[0].track_id, original_first);
    }

    #[test]
    fn fades_shape_the_excerpt_edges() {
        let mut samples = vec![1.0f32; 8 * SR as usize];
        apply_fades(&mut samples, SR);

        assert_eq!(samples[0], 0.0);
        // Midpoint untouched.
        assert_eq!(samples[4 * SR as usize], 1.0);
        // Last sample nearly silent.
        assert!(samples[8 * SR as usize - 1] < 1e-3);
    }
}
