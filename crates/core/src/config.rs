use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, time::Duration};

// Face cascade, evaluated in declaration order.
pub const FACE_HAPPY_SMILE: f32 = 0.015;
pub const FACE_SURPRISE_MOUTH_RATIO: f32 = 0.25;
pub const FACE_SURPRISE_BROW_RAISE: f32 = 0.04;
pub const FACE_ANGRY_GLABELLA: f32 = 0.285;
pub const FACE_ANGRY_BROW_RAISE: f32 = 0.1;
pub const FACE_SAD_SMILE: f32 = -0.005;

/// Floor applied to reference distances before dividing by them.
pub const DISTANCE_FLOOR: f32 = 1e-3;

// Voice grid: loudness tiers x tonal variability.
pub const VOICE_SILENCE_ENERGY: f32 = 0.015;
pub const VOICE_QUIET_ENERGY: f32 = 0.02;
pub const VOICE_LOUD_ENERGY: f32 = 0.08;
pub const VOICE_LOUD_VARIABILITY: f32 = 0.05;
pub const VOICE_MODERATE_VARIABILITY: f32 = 0.06;
pub const VOICE_QUIET_VARIABILITY: f32 = 0.03;

/// Every recording is resampled to this rate before feature extraction; the
/// voice thresholds are only meaningful at this rate.
pub const ANALYSIS_SAMPLE_RATE: u32 = 22_050;

pub const NOISE_GATE_RATIO: f32 = 0.25;
pub const FRAME_LENGTH: usize = 2048;
pub const HOP_LENGTH: usize = 512;

pub const DEFAULT_MAX_AUDIO_SECS: f32 = 5.0;
pub const DEFAULT_LANGUAGE: &str = "en-US";
pub const DEFAULT_FALLBACK_LANGUAGE: &str = "ml-IN";

pub const ENV_THRESHOLDS: &str = "MOOD_FUSION_THRESHOLDS";
pub const ENV_TRACKS: &str = "MOOD_FUSION_TRACKS";
pub const ENV_TRANSCRIBE_URL: &str = "MOOD_FUSION_TRANSCRIBE_URL";
pub const ENV_TRANSCRIBE_API_KEY: &str = "MOOD_FUSION_TRANSCRIBE_API_KEY";
pub const ENV_MAX_AUDIO_SECS: &str = "MOOD_FUSION_MAX_AUDIO_SECS";

/// Cut-offs for the face cascade. All comparisons are strict.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FaceThresholds {
    /// Smile metric above which the face is Happy
    pub happy_smile: f32,
    /// Mouth aspect ratio above which an open mouth counts as surprise
    pub surprise_mouth_ratio: f32,
    /// Brow raise that must accompany the open mouth
    pub surprise_brow_raise: f32,
    /// Normalized glabella below which brows count as squeezed
    pub angry_glabella: f32,
    /// Brow raise that squeezed brows must stay under
    pub angry_brow_raise: f32,
    /// Smile metric below which the face is Sad
    pub sad_smile: f32,
}

impl Default for FaceThresholds {
    fn default() -> Self {
        Self {
            happy_smile: FACE_HAPPY_SMILE,
            surprise_mouth_ratio: FACE_SURPRISE_MOUTH_RATIO,
            surprise_brow_raise: FACE_SURPRISE_BROW_RAISE,
            angry_glabella: FACE_ANGRY_GLABELLA,
            angry_brow_raise: FACE_ANGRY_BROW_RAISE,
            sad_smile: FACE_SAD_SMILE,
        }
    }
}

impl FaceThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("happy_smile", self.happy_smile),
            ("surprise_mouth_ratio", self.surprise_mouth_ratio),
            ("surprise_brow_raise", self.surprise_brow_raise),
            ("angry_glabella", self.angry_glabella),
            ("angry_brow_raise", self.angry_brow_raise),
            ("sad_smile", self.sad_smile),
        ];
        ensure_finite(&named)?;
        if self.sad_smile >= self.happy_smile {
            return Err(ConfigError::OutOfOrder {
                lower: "sad_smile",
                upper: "happy_smile",
            });
        }
        Ok(())
    }
}

/// Cut-offs for the voice grid, calibrated at `ANALYSIS_SAMPLE_RATE`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VoiceThresholds {
    /// Energy below which the recording is treated as silence
    pub silence_energy: f32,
    /// Lower bound of the moderate tier
    pub quiet_energy: f32,
    /// Lower bound of the loud tier
    pub loud_energy: f32,
    /// Variability splitting Excited from Angry in the loud tier
    pub loud_variability: f32,
    /// Variability splitting Happy from Neutral in the moderate tier
    pub moderate_variability: f32,
    /// Variability splitting Sad from Calm in the quiet tier
    pub quiet_variability: f32,
}

impl Default for VoiceThresholds {
    fn default() -> Self {
        Self {
            silence_energy: VOICE_SILENCE_ENERGY,
            quiet_energy: VOICE_QUIET_ENERGY,
            loud_energy: VOICE_LOUD_ENERGY,
            loud_variability: VOICE_LOUD_VARIABILITY,
            moderate_variability: VOICE_MODERATE_VARIABILITY,
            quiet_variability: VOICE_QUIET_VARIABILITY,
        }
    }
}

impl VoiceThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("silence_energy", self.silence_energy),
            ("quiet_energy", self.quiet_energy),
            ("loud_energy", self.loud_energy),
            ("loud_variability", self.loud_variability),
            ("moderate_variability", self.moderate_variability),
            ("quiet_variability", self.quiet_variability),
        ];
        ensure_finite(&named)?;
        if self.silence_energy > self.quiet_energy {
            return Err(ConfigError::OutOfOrder {
                lower: "silence_energy",
                upper: "quiet_energy",
            });
        }
        if self.quiet_energy > self.loud_energy {
            return Err(ConfigError::OutOfOrder {
                lower: "quiet_energy",
                upper: "loud_energy",
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseGateConfig {
    /// Fraction of the peak amplitude a sample must exceed to be kept.
    pub ratio: f32,
}

impl Default for NoiseGateConfig {
    fn default() -> Self {
        Self {
            ratio: NOISE_GATE_RATIO,
        }
    }
}

/// Short-time analysis window, in samples at `ANALYSIS_SAMPLE_RATE`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FrameConfig {
    pub frame_length: usize,
    pub hop_length: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            frame_length: FRAME_LENGTH,
            hop_length: HOP_LENGTH,
        }
    }
}

/// Every tunable constant of the inference core. A recalibration file may
/// override any subset of fields; missing ones keep their defaults.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    pub face: FaceThresholds,
    pub voice: VoiceThresholds,
    pub noise_gate: NoiseGateConfig,
    pub frames: FrameConfig,
}

impl Thresholds {
    /// Parse and validate a recalibration file.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let thresholds: Thresholds =
            serde_json::from_str(raw).map_err(|e| ConfigError::InvalidJson(e.to_string()))?;
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.face.validate()?;
        self.voice.validate()?;
        if !self.noise_gate.ratio.is_finite() || !(0.0..1.0).contains(&self.noise_gate.ratio) {
            return Err(ConfigError::NoiseGateRatio(self.noise_gate.ratio));
        }
        if self.frames.frame_length == 0 || self.frames.hop_length == 0 {
            return Err(ConfigError::ZeroFrame);
        }
        Ok(())
    }
}

fn ensure_finite(named: &[(&'static str, f32)]) -> Result<(), ConfigError> {
    match named.iter().find(|(_, v)| !v.is_finite()) {
        Some((name, _)) => Err(ConfigError::NonFinite(name)),
        None => Ok(()),
    }
}

/// API key for the transcription service. Never printed by `Debug`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(v))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**redacted**)")
    }
}

/// Longest stretch of a recording that gets decoded.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct AudioLimit {
    pub max_secs: f32,
}

impl AudioLimit {
    pub fn new(max_secs: f32) -> Result<Self, ConfigError> {
        if !max_secs.is_finite() || max_secs <= 0.0 {
            return Err(ConfigError::AudioLimit(max_secs));
        }
        Ok(Self { max_secs })
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f32(self.max_secs)
    }

    /// Frame budget at the given native sample rate.
    pub fn max_frames(&self, sample_rate_hz: u32) -> usize {
        (self.max_secs as f64 * f64::from(sample_rate_hz)).floor() as usize
    }
}

impl Default for AudioLimit {
    fn default() -> Self {
        Self {
            max_secs: DEFAULT_MAX_AUDIO_SECS,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TranscribeConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<ApiKey>,
    pub language: String,
    pub fallback_language: Option<String>,
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            language: DEFAULT_LANGUAGE.to_owned(),
            fallback_language: Some(DEFAULT_FALLBACK_LANGUAGE.to_owned()),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub thresholds: Thresholds,
    pub tracks_path: Option<PathBuf>,
    pub audio_limit: AudioLimit,
    pub transcribe: TranscribeConfig,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("threshold `{0}` must be finite")]
    NonFinite(&'static str),
    #[error("threshold `{lower}` must not exceed `{upper}`")]
    OutOfOrder {
        lower: &'static str,
        upper: &'static str,
    },
    #[error("noise gate ratio must be in [0, 1), got {0}")]
    NoiseGateRatio(f32),
    #[error("frame and hop length must be > 0")]
    ZeroFrame,
    #[error("max audio duration must be > 0 s, got {0}")]
    AudioLimit(f32),
    #[error("invalid number for {key}: {value}")]
    InvalidNumber { key: String, value: String },
    #[error("api key must not be empty")]
    EmptyApiKey,
    #[error("invalid configuration json: {0}")]
    InvalidJson(String),
}

/// Source of environment variables, swappable in tests.
pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Resolve an API key: CLI value first, then the environment. Blank keys
/// are rejected.
pub fn resolve_api_key(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Result<Option<ApiKey>, ConfigError> {
    match cli_value.or_else(|| env.var(env_key)) {
        Some(v) => Ok(Some(ApiKey::new(v)?)),
        None => Ok(None),
    }
}

pub fn resolve_optional_string(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Option<String> {
    cli_value.or_else(|| env.var(env_key))
}

/// Resolve a number: CLI value, then environment, then `default`.
pub fn resolve_f32_with_default(
    cli_value: Option<f32>,
    env_key: &str,
    env: &impl Env,
    default: f32,
) -> Result<f32, ConfigError> {
    if let Some(v) = cli_value {
        return Ok(v);
    }
    match env.var(env_key) {
        Some(raw) => raw
            .trim()
            .parse::<f32>()
            .map_err(|_| ConfigError::InvalidNumber {
                key: env_key.to_owned(),
                value: raw,
            }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        Thresholds::default().validate().expect("defaults are consistent");
    }

    #[test]
    fn recalibration_overrides_only_given_fields() {
        let t = Thresholds::from_json_str(r#"{"voice": {"loud_energy": 0.12}}"#)
            .expect("valid recalibration");
        assert_eq!(t.voice.loud_energy, 0.12);
        assert_eq!(t.voice.silence_energy, VOICE_SILENCE_ENERGY);
        assert_eq!(t.face, FaceThresholds::default());
        assert_eq!(t.frames.hop_length, HOP_LENGTH);
    }

    #[test]
    fn recalibration_rejects_inverted_energy_tiers() {
        let err = Thresholds::from_json_str(r#"{"voice": {"quiet_energy": 0.5}}"#).unwrap_err();
        assert_eq!(
            err,
            ConfigError::OutOfOrder {
                lower: "quiet_energy",
                upper: "loud_energy"
            }
        );
    }

    #[test]
    fn recalibration_rejects_zero_hop() {
        let err = Thresholds::from_json_str(r#"{"frames": {"hop_length": 0}}"#).unwrap_err();
        assert_eq!(err, ConfigError::ZeroFrame);
    }

    #[test]
    fn recalibration_rejects_malformed_json() {
        let err = Thresholds::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidJson(_)));
    }

    #[test]
    fn face_thresholds_reject_sad_above_happy() {
        let t = FaceThresholds {
            sad_smile: 0.02,
            ..FaceThresholds::default()
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn api_key_cli_takes_precedence_over_env() {
        let env = MapEnv::default().with_var(ENV_TRANSCRIBE_API_KEY, "env-key");
        let key = resolve_api_key(Some("cli-key".to_owned()), ENV_TRANSCRIBE_API_KEY, &env)
            .expect("valid key")
            .expect("present");
        assert_eq!(key.expose(), "cli-key");
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("secret").expect("non-empty");
        assert!(!format!("{key:?}").contains("secret"));
    }

    #[test]
    fn blank_api_key_from_env_is_rejected() {
        let env = MapEnv::default().with_var(ENV_TRANSCRIBE_API_KEY, "  ");
        let err = resolve_api_key(None, ENV_TRANSCRIBE_API_KEY, &env).unwrap_err();
        assert_eq!(err, ConfigError::EmptyApiKey);
    }

    #[test]
    fn max_audio_secs_resolution_order() {
        let env = MapEnv::default().with_var(ENV_MAX_AUDIO_SECS, "3.5");
        let cli = resolve_f32_with_default(Some(2.0), ENV_MAX_AUDIO_SECS, &env, 5.0).unwrap();
        assert_eq!(cli, 2.0);
        let from_env = resolve_f32_with_default(None, ENV_MAX_AUDIO_SECS, &env, 5.0).unwrap();
        assert_eq!(from_env, 3.5);
        let fallback =
            resolve_f32_with_default(None, ENV_MAX_AUDIO_SECS, &MapEnv::default(), 5.0).unwrap();
        assert_eq!(fallback, 5.0);
    }

    #[test]
    fn max_audio_secs_rejects_garbage() {
        let env = MapEnv::default().with_var(ENV_MAX_AUDIO_SECS, "five");
        assert!(resolve_f32_with_default(None, ENV_MAX_AUDIO_SECS, &env, 5.0).is_err());
    }

    #[test]
    fn audio_limit_frames_simple() {
        let limit = AudioLimit::new(5.0).expect("positive");
        assert_eq!(limit.max_frames(16_000), 80_000);
        assert_eq!(limit.max_frames(22_050), 110_250);
        assert!(AudioLimit::new(0.0).is_err());
    }
}
