use crate::decode::DecodeError;
use rubato::{FftFixedIn, Resampler};

const LOG_TARGET: &str = "decode::resample";

/// Input frames handed to the FFT resampler per call.
const CHUNK_FRAMES: usize = 1024;
/// Sub-chunks per FFT chunk; more means lower latency, fewer means higher quality.
const SUB_CHUNKS: usize = 2;
/// Upper bound on flush calls after the input runs out.
const MAX_FLUSH_CHUNKS: usize = 16;

/// Resamples a mono signal from `from_hz` to `to_hz`.
///
/// The output is aligned with the input (the resampler's delay is removed)
/// and holds `round(len * to_hz / from_hz)` samples. Equal rates are a copy.
pub fn resample_mono(samples: &[f32], from_hz: u32, to_hz: u32) -> Result<Vec<f32>, DecodeError> {
    if from_hz == to_hz {
        return Ok(samples.to_vec());
    }

    let mut resampler =
        FftFixedIn::<f32>::new(from_hz as usize, to_hz as usize, CHUNK_FRAMES, SUB_CHUNKS, 1)
            .map_err(|e| DecodeError::Resample(e.to_string()))?;

    let delay = resampler.output_delay();
    let expected = (samples.len() as f64 * f64::from(to_hz) / f64::from(from_hz)).round() as usize;
    let mut out: Vec<f32> = Vec::with_capacity(delay + expected + CHUNK_FRAMES);

    let mut rest = samples;
    while rest.len() >= resampler.input_frames_next() {
        let (chunk, tail) = rest.split_at(resampler.input_frames_next());
        let produced = resampler
            .process(&[chunk], None)
            .map_err(|e| DecodeError::Resample(e.to_string()))?;
        out.extend_from_slice(&produced[0]);
        rest = tail;
    }
    if !rest.is_empty() {
        let produced = resampler
            .process_partial(Some(&[rest]), None)
            .map_err(|e| DecodeError::Resample(e.to_string()))?;
        out.extend_from_slice(&produced[0]);
    }

    // Drain the delay line.
    let mut flushes = 0;
    while out.len() < delay + expected && flushes < MAX_FLUSH_CHUNKS {
        let produced = resampler
            .process_partial(None::<&[&[f32]]>, None)
            .map_err(|e| DecodeError::Resample(e.to_string()))?;
        out.extend_from_slice(&produced[0]);
        flushes += 1;
    }

    let mut aligned = out.split_off(delay.min(out.len()));
    aligned.truncate(expected);

    tracing::debug!(
        target: LOG_TARGET,
        from_hz,
        to_hz,
        input = samples.len(),
        output = aligned.len(),
        "resampled"
    );
    Ok(aligned)
}
