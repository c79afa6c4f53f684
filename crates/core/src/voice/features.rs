use crate::config::{FrameConfig, NoiseGateConfig};
use crate::voice::AudioSamples;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct AcousticObservation {
    /// Mean short-time RMS amplitude.
    pub energy: f32,
    /// Mean short-time zero-crossing rate.
    pub pitch_variability: f32,
}

/// Keeps samples louder than `ratio * peak`. Never returns an empty signal:
/// when nothing survives the gate the input is handed back untouched.
pub fn noise_gate(samples: &[f32], ratio: f32) -> Cow<'_, [f32]> {
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    let floor = ratio * peak;
    let kept: Vec<f32> = samples.iter().copied().filter(|s| s.abs() > floor).collect();
    if kept.is_empty() {
        tracing::debug!(len = samples.len(), "noise gate removed every sample; using raw signal");
        Cow::Borrowed(samples)
    } else {
        Cow::Owned(kept)
    }
}

pub fn extract_acoustic_observation(
    audio: &AudioSamples,
    gate: &NoiseGateConfig,
    frames: &FrameConfig,
) -> AcousticObservation {
    let gated = noise_gate(audio.samples(), gate.ratio);
    let signal: &[f32] = &gated;

    let energy = mean(Frames::new(signal, frames, Padding::Zero).map(|f| rms(&f)));
    let pitch_variability =
        mean(Frames::new(signal, frames, Padding::Edge).map(|f| zero_crossing_rate(&f)));

    tracing::debug!(
        raw_len = audio.samples().len(),
        gated_len = signal.len(),
        energy,
        pitch_variability,
        "acoustic observation"
    );

    AcousticObservation {
        energy,
        pitch_variability,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Padding {
    Zero,
    Edge,
}

/// Centered short-time frames: frame `k` is centered on sample `k * hop`,
/// with the signal padded by half a frame on each side.
struct Frames<'a> {
    signal: &'a [f32],
    frame_length: usize,
    hop_length: usize,
    padding: Padding,
    next: usize,
    total: usize,
}

impl<'a> Frames<'a> {
    fn new(signal: &'a [f32], cfg: &FrameConfig, padding: Padding) -> Self {
        let hop_length = cfg.hop_length.max(1);
        Self {
            signal,
            frame_length: cfg.frame_length.max(1),
            hop_length,
            padding,
            next: 0,
            total: 1 + signal.len() / hop_length,
        }
    }

    fn sample_at(&self, idx: isize) -> f32 {
        let len = self.signal.len();
        if len == 0 {
            return 0.0;
        }
        if idx < 0 {
            match self.padding {
                Padding::Zero => 0.0,
                Padding::Edge => self.signal[0],
            }
        } else if idx as usize >= len {
            match self.padding {
                Padding::Zero => 0.0,
                Padding::Edge => self.signal[len - 1],
            }
        } else {
            self.signal[idx as usize]
        }
    }
}

impl Iterator for Frames<'_> {
    type Item = Vec<f32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }
        let start = (self.next * self.hop_length) as isize - (self.frame_length / 2) as isize;
        self.next += 1;
        Some(
            (0..self.frame_length as isize)
                .map(|i| self.sample_at(start + i))
                .collect(),
        )
    }
}

fn rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let power = frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32;
    power.sqrt()
}

fn zero_crossing_rate(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|w| w[0].is_sign_negative() != w[1].is_sign_negative())
        .count();
    crossings as f32 / frame.len() as f32
}

fn mean(values: impl Iterator<Item = f32>) -> f32 {
    let (sum, n) = values.fold((0.0f32, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq_hz: f32, amplitude: f32, sample_rate: u32, secs: f32) -> Vec<f32> {
        let n = (sample_rate as f32 * secs) as usize;
        (0..n)
            .map(|i| {
                amplitude
                    * (2.0 * std::f32::consts::PI * freq_hz * i as f32 / sample_rate as f32).sin()
            })
            .collect()
    }

    fn observe(samples: Vec<f32>) -> AcousticObservation {
        let audio = AudioSamples::new(samples, 22_050).unwrap();
        extract_acoustic_observation(&audio, &NoiseGateConfig::default(), &FrameConfig::default())
    }

    #[test]
    fn gate_drops_quiet_samples() {
        let out = noise_gate(&[0.01, 1.0, -1.0, 0.02, 0.3], 0.25);
        assert_eq!(&*out, &[1.0, -1.0, 0.3]);
    }

    #[test]
    fn gate_falls_back_to_raw_signal_when_everything_is_removed() {
        let silence = vec![0.0f32; 4096];
        let out = noise_gate(&silence, 0.25);
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out.len(), 4096);
    }

    #[test]
    fn silence_yields_zero_features_not_nan() {
        let obs = observe(vec![0.0; 8192]);
        assert_eq!(obs.energy, 0.0);
        assert_eq!(obs.pitch_variability, 0.0);
    }

    #[test]
    fn single_sample_is_enough() {
        let obs = observe(vec![0.5]);
        assert!(obs.energy.is_finite() && obs.energy > 0.0);
        assert_eq!(obs.pitch_variability, 0.0);
    }

    #[test]
    fn clipped_square_wave_does_not_crash() {
        let square: Vec<f32> = (0..22_050)
            .map(|i| if (i / 50) % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        let obs = observe(square);
        assert!(obs.energy > 0.9 && obs.energy <= 1.0);
        assert!(obs.pitch_variability > 0.0);
    }

    #[test]
    fn louder_signal_has_more_energy() {
        let quiet = observe(sine(220.0, 0.05, 22_050, 1.0));
        let loud = observe(sine(220.0, 0.5, 22_050, 1.0));
        assert!(loud.energy > quiet.energy * 5.0);
    }

    #[test]
    fn higher_pitch_crosses_zero_more_often() {
        let low = observe(sine(200.0, 0.5, 22_050, 1.0));
        let high = observe(sine(2_000.0, 0.5, 22_050, 1.0));
        assert!(high.pitch_variability > low.pitch_variability * 2.0);
    }

    #[test]
    fn frame_count_matches_centered_framing() {
        let signal = vec![0.1f32; 2048];
        let frames = Frames::new(&signal, &FrameConfig::default(), Padding::Zero);
        assert_eq!(frames.count(), 1 + 2048 / 512);
    }
}
