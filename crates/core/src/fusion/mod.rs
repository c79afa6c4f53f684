//! Rule-based reconciliation of a face label and a voice label.
//!
//! The rule table is ordered and the first match wins. Confidence values are
//! fixed trust levels attached to each rule, not probabilities.

use crate::face::FaceEmotion;
use crate::voice::{VoiceEmotion, VoiceLabel};
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = "fusion";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FusionRule {
    /// No face was available; the voice stands alone.
    VoiceOnly,
    ExactMatch,
    /// Smiling face over a sad voice.
    HiddenSadness,
    /// Composed face over an angry voice.
    Stoic,
    /// Surprised face over a flat voice.
    SilentShock,
    ExcitementOverride,
    VoicePriority,
}

impl FusionRule {
    pub const fn confidence(self) -> f32 {
        match self {
            FusionRule::VoiceOnly => 0.6,
            FusionRule::ExactMatch => 1.0,
            FusionRule::HiddenSadness => 0.85,
            FusionRule::Stoic => 0.9,
            FusionRule::SilentShock => 0.9,
            FusionRule::ExcitementOverride => 0.95,
            FusionRule::VoicePriority => 0.6,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FusionResult {
    pub final_mood: String,
    pub confidence: f32,
    pub reasoning: String,
    pub rule: FusionRule,
}

impl FusionResult {
    fn new(rule: FusionRule, final_mood: impl Into<String>, reasoning: String) -> Self {
        Self {
            final_mood: final_mood.into(),
            confidence: rule.confidence(),
            reasoning,
            rule,
        }
    }
}

/// Same face as voice, reading voice labels that have no face counterpart
/// (Calm, Excited) as never matching.
fn voice_as_face(voice: VoiceEmotion) -> Option<FaceEmotion> {
    match voice {
        VoiceEmotion::Neutral => Some(FaceEmotion::Neutral),
        VoiceEmotion::Happy => Some(FaceEmotion::Happy),
        VoiceEmotion::Sad => Some(FaceEmotion::Sad),
        VoiceEmotion::Angry => Some(FaceEmotion::Angry),
        VoiceEmotion::Surprised => Some(FaceEmotion::Surprised),
        VoiceEmotion::Calm | VoiceEmotion::Excited => None,
    }
}

pub fn fuse(face: FaceEmotion, voice: &VoiceLabel) -> FusionResult {
    use FaceEmotion as F;
    use VoiceEmotion as V;

    let v = voice.emotion;
    let result = match (face, v) {
        (F::NoFaceDetected, _) => FusionResult::new(
            FusionRule::VoiceOnly,
            voice.as_given.clone(),
            format!("No Face Detected: Relying on voice ({voice}) alone."),
        ),
        (f, Some(v)) if voice_as_face(v) == Some(f) => FusionResult::new(
            FusionRule::ExactMatch,
            f.as_str(),
            format!("Perfect Match: Both face and voice indicate {f}."),
        ),
        (F::Happy, Some(V::Sad)) => FusionResult::new(
            FusionRule::HiddenSadness,
            "Hidden Sadness",
            "Fake Smile Detected: Voice tone indicates sadness despite the smiling face."
                .to_owned(),
        ),
        (F::Neutral, Some(V::Angry)) => FusionResult::new(
            FusionRule::Stoic,
            "Frustration",
            "The Stoic: Face is composed (Neutral) but voice carries Anger, suggesting Frustration."
                .to_owned(),
        ),
        (F::Surprised, Some(V::Neutral | V::Calm)) => FusionResult::new(
            FusionRule::SilentShock,
            "Surprise",
            "Silent Shock: Visibly surprised but speechless/calm. Visual cue takes priority."
                .to_owned(),
        ),
        (F::Neutral | F::Happy, Some(V::Excited)) => FusionResult::new(
            FusionRule::ExcitementOverride,
            "Excited",
            "Excitement Override: High vocal energy overrides the facial expression.".to_owned(),
        ),
        (f, _) => FusionResult::new(
            FusionRule::VoicePriority,
            voice.as_given.clone(),
            format!(
                "Conflicting Signals: Trusting Voice ({voice}) over Face ({f}) as it's a more raw biological signal."
            ),
        ),
    };

    tracing::info!(
        target: LOG_TARGET,
        face = %face,
        voice = %voice,
        final_mood = %result.final_mood,
        confidence = result.confidence,
        rule = ?result.rule,
        "fused"
    );
    result
}

/// Fuses free-form labels, e.g. a legacy face description such as
/// `"Happy: Corners lifted (0.020)"` and a voice label such as `"Sadness"`.
pub fn fuse_descriptions(face: &str, voice: &str) -> FusionResult {
    fuse(FaceEmotion::from_description(face), &VoiceLabel::parse(voice))
}
