//! Audio file decoding via Symphonia.
//!
//! Decodes compressed audio (mp3, ogg, flac, wav) into a mono
//! [`AudioSignal`]. Multi-channel sources are downmixed by averaging
//! channels, matching how the analysis pipeline expects its input.

use std::fs::File;
use std::path::Path;

use log::warn;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio::AudioSignal;
use crate::error::{AutodjError, Result};

/// Decodes an audio file into a mono signal.
///
/// The container format is probed from the file contents with the file
/// extension as a hint. The first decodeable audio track is used.
pub fn decode_file(path: &Path) -> Result<AudioSignal> {
    let src = File::open(path).map_err(|e| {
        AutodjError::decode_failed(format!("cannot open {}: {}", path.display(), e))
    })?;

    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| {
            AutodjError::decode_failed(format!("unsupported format {}: {}", path.display(), e))
        })?;

    let mut format = probed.format;

    // Find the first audio track with a known (decodeable) codec.
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| {
            AutodjError::decode_failed(format!("no audio track in {}", path.display()))
        })?;

    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.ok_or_else(|| {
        AutodjError::decode_failed(format!("unknown sample rate in {}", path.display()))
    })?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| {
            AutodjError::decode_failed(format!("unsupported codec {}: {}", path.display(), e))
        })?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            // End of stream.
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(AutodjError::decode_failed(format!(
                    "read error in {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // A corrupt packet is recoverable; skip it.
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("skipping corrupt packet in {}: {}", path.display(), e);
                continue;
            }
            Err(e) => {
                return Err(AutodjError::decode_failed(format!(
                    "decode error in {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count();

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        if channels <= 1 {
            samples.extend_from_slice(sample_buf.samples());
        } else {
            // Downmix interleaved frames to mono by averaging channels.
            for frame in sample_buf.samples().chunks_exact(channels) {
                samples.push(frame.iter().sum::<f32>() / channels as f32);
            }
        }
    }

    if samples.is_empty() {
        return Err(AutodjError::empty_signal());
    }

    Ok(AudioSignal::new(samples, sample_rate))
}
