mod resample;

use crate::config::{AudioLimit, ANALYSIS_SAMPLE_RATE};
use crate::voice::{AcousticError, AudioSamples};
use bytes::Bytes;
use std::io::{Cursor, ErrorKind};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

pub use resample::resample_mono;

const LOG_TARGET: &str = "decode";

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("unsupported or unrecognized audio container: {0}")]
    Unsupported(String),

    #[error("no decodable audio track")]
    NoTrack,

    #[error("audio track does not declare a sample rate")]
    UnknownSampleRate,

    #[error("decoding failed: {0}")]
    Failed(String),

    #[error("decoded stream contained no audio")]
    NoAudio,

    #[error("resampling failed: {0}")]
    Resample(String),

    #[error(transparent)]
    Samples(#[from] AcousticError),
}

pub type Result<T> = std::result::Result<T, DecodeError>;

#[derive(Clone, Debug)]
pub struct DecodeOptions {
    pub limit: AudioLimit,
    /// File extension hint such as `"wav"` or `"mp3"`.
    pub extension: Option<String>,
    /// Rate every recording is resampled to.
    pub sample_rate: u32,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            limit: AudioLimit::default(),
            extension: None,
            sample_rate: ANALYSIS_SAMPLE_RATE,
        }
    }
}

/// Decodes an encoded recording into mono f32 samples at
/// `options.sample_rate`, averaging channels and keeping at most `limit`
/// seconds from the start.
pub fn decode_audio(encoded: Bytes, options: &DecodeOptions) -> Result<AudioSamples> {
    let mut hint = Hint::new();
    if let Some(ext) = options.extension.as_deref() {
        hint.with_extension(ext);
    }

    let mss = MediaSourceStream::new(
        Box::new(Cursor::new(encoded)),
        MediaSourceStreamOptions::default(),
    );
    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError::Unsupported(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoTrack)?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(DecodeError::UnknownSampleRate)?;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::Unsupported(e.to_string()))?;

    let max_frames = options.limit.max_frames(sample_rate);
    let mut mono: Vec<f32> = Vec::new();

    while mono.len() < max_frames {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(DecodeError::Failed(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::warn!(target: LOG_TARGET, error = %e, "skipping corrupt packet");
                continue;
            }
            Err(e) => return Err(DecodeError::Failed(e.to_string())),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        mono.extend(
            buf.samples()
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32),
        );
    }

    mono.truncate(max_frames);
    if mono.is_empty() {
        return Err(DecodeError::NoAudio);
    }

    let resampled = resample_mono(&mono, sample_rate, options.sample_rate)?;
    tracing::debug!(
        target: LOG_TARGET,
        native_rate = sample_rate,
        analysis_rate = options.sample_rate,
        frames = resampled.len(),
        "decoded audio"
    );
    Ok(AudioSamples::new(resampled, options.sample_rate)?)
}
