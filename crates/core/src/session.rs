//! Per-session record of the latest observations.
//!
//! The inference core itself is stateless; this record is owned by whoever
//! serves requests and is handed in explicitly on every call. It performs no
//! locking: callers sharing one session across tasks must wrap it themselves.

use crate::face::{FaceClassification, FaceEmotion};
use crate::fusion::{fuse, FusionResult};
use crate::voice::VoiceLabel;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MoodSession {
    face: Option<FaceClassification>,
    voice: Option<VoiceLabel>,
    transcript: Option<String>,
    last_fusion: Option<FusionResult>,
}

/// Display-ready copy of a session, detached from it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    pub face: Option<String>,
    pub voice: Option<String>,
    pub transcript: Option<String>,
    pub last_fusion: Option<FusionResult>,
}

impl MoodSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_face(&mut self, face: FaceClassification) {
        tracing::debug!(face = %face, "face recorded");
        self.face = Some(face);
    }

    /// Stores the voice observation and fuses it with the latest face. A
    /// session that never saw a face fuses as `NoFaceDetected`.
    pub fn record_voice(&mut self, voice: VoiceLabel, transcript: Option<String>) -> FusionResult {
        let face = self.face_emotion();
        let result = fuse(face, &voice);
        self.voice = Some(voice);
        self.transcript = transcript;
        self.last_fusion = Some(result.clone());
        result
    }

    pub fn face_emotion(&self) -> FaceEmotion {
        self.face
            .as_ref()
            .map(|f| f.emotion)
            .unwrap_or(FaceEmotion::NoFaceDetected)
    }

    pub fn face(&self) -> Option<&FaceClassification> {
        self.face.as_ref()
    }

    pub fn voice(&self) -> Option<&VoiceLabel> {
        self.voice.as_ref()
    }

    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    pub fn last_fusion(&self) -> Option<&FusionResult> {
        self.last_fusion.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            face: self.face.as_ref().map(ToString::to_string),
            voice: self.voice.as_ref().map(ToString::to_string),
            transcript: self.transcript.clone(),
            last_fusion: self.last_fusion.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
