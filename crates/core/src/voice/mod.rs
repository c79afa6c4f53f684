mod classifier;
mod features;

use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

pub use classifier::classify_voice;
pub use features::{extract_acoustic_observation, noise_gate, AcousticObservation};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum VoiceEmotion {
    Neutral,
    Happy,
    Sad,
    Angry,
    Surprised,
    Calm,
    Excited,
}

impl VoiceEmotion {
    pub const ALL: [VoiceEmotion; 7] = [
        VoiceEmotion::Neutral,
        VoiceEmotion::Happy,
        VoiceEmotion::Sad,
        VoiceEmotion::Angry,
        VoiceEmotion::Surprised,
        VoiceEmotion::Calm,
        VoiceEmotion::Excited,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceEmotion::Neutral => "Neutral",
            VoiceEmotion::Happy => "Happy",
            VoiceEmotion::Sad => "Sad",
            VoiceEmotion::Angry => "Angry",
            VoiceEmotion::Surprised => "Surprised",
            VoiceEmotion::Calm => "Calm",
            VoiceEmotion::Excited => "Excited",
        }
    }

    /// Accepts the canonical names plus the noun spellings some upstream
    /// producers emit (Sadness, Anger, Surprise). Case-insensitive.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "neutral" => Some(VoiceEmotion::Neutral),
            "happy" => Some(VoiceEmotion::Happy),
            "sad" | "sadness" => Some(VoiceEmotion::Sad),
            "angry" | "anger" => Some(VoiceEmotion::Angry),
            "surprised" | "surprise" => Some(VoiceEmotion::Surprised),
            "calm" => Some(VoiceEmotion::Calm),
            "excited" => Some(VoiceEmotion::Excited),
            _ => None,
        }
    }
}

impl fmt::Display for VoiceEmotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A voice label as it arrived, with its canonical reading when one exists.
/// The original spelling is what gets reported back to callers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoiceLabel {
    pub as_given: String,
    pub emotion: Option<VoiceEmotion>,
}

impl VoiceLabel {
    pub fn parse<S: Into<String>>(label: S) -> Self {
        let as_given = label.into();
        let emotion = VoiceEmotion::parse(&as_given);
        Self { as_given, emotion }
    }
}

impl From<VoiceEmotion> for VoiceLabel {
    fn from(emotion: VoiceEmotion) -> Self {
        Self {
            as_given: emotion.as_str().to_owned(),
            emotion: Some(emotion),
        }
    }
}

impl fmt::Display for VoiceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_given)
    }
}

/// One bounded mono recording.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSamples {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioSamples {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, AcousticError> {
        if samples.is_empty() {
            return Err(AcousticError::EmptySamples);
        }
        if sample_rate == 0 {
            return Err(AcousticError::InvalidSampleRate);
        }
        if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
            return Err(AcousticError::NonFiniteSample { index });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration(&self) -> Duration {
        let micros = (self.samples.len() as u128 * 1_000_000u128) / u128::from(self.sample_rate);
        Duration::from_micros(micros.min(u128::from(u64::MAX)) as u64)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AcousticError {
    #[error("audio contains no samples")]
    EmptySamples,

    #[error("sample rate must be > 0")]
    InvalidSampleRate,

    #[error("sample {index} is not finite")]
    NonFiniteSample { index: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_upstream_spellings() {
        assert_eq!(VoiceEmotion::parse("Sadness"), Some(VoiceEmotion::Sad));
        assert_eq!(VoiceEmotion::parse("Anger"), Some(VoiceEmotion::Angry));
        assert_eq!(VoiceEmotion::parse("surprise"), Some(VoiceEmotion::Surprised));
        assert_eq!(VoiceEmotion::parse(" calm "), Some(VoiceEmotion::Calm));
        assert_eq!(VoiceEmotion::parse("Excited/Happy"), None);
    }

    #[test]
    fn label_keeps_original_spelling() {
        let l = VoiceLabel::parse("Sadness");
        assert_eq!(l.as_given, "Sadness");
        assert_eq!(l.emotion, Some(VoiceEmotion::Sad));
        assert_eq!(l.to_string(), "Sadness");
    }

    #[test]
    fn canonical_names_round_trip() {
        for e in VoiceEmotion::ALL {
            assert_eq!(VoiceEmotion::parse(e.as_str()), Some(e));
        }
    }

    #[test]
    fn empty_audio_is_invalid_input() {
        assert_eq!(
            AudioSamples::new(Vec::new(), 16_000).unwrap_err(),
            AcousticError::EmptySamples
        );
    }

    #[test]
    fn zero_rate_and_nan_are_rejected() {
        assert_eq!(
            AudioSamples::new(vec![0.1], 0).unwrap_err(),
            AcousticError::InvalidSampleRate
        );
        assert_eq!(
            AudioSamples::new(vec![0.1, f32::NAN], 16_000).unwrap_err(),
            AcousticError::NonFiniteSample { index: 1 }
        );
    }

    #[test]
    fn duration_from_sample_count() {
        let a = AudioSamples::new(vec![0.0; 16_000], 16_000).unwrap();
        assert_eq!(a.duration(), Duration::from_secs(1));
    }
}
