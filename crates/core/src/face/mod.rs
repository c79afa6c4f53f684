mod classifier;
mod features;
pub mod landmarks;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use classifier::classify_face;
pub use features::{extract_facial_observation, FacialObservation};
pub use landmarks::{FaceDetection, LandmarkSet, Point2};

#[cfg(test)]
pub(crate) use features::fixtures::neutral_face;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FaceEmotion {
    Happy,
    Sad,
    Angry,
    Surprised,
    Neutral,
    NoFaceDetected,
}

impl FaceEmotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaceEmotion::Happy => "Happy",
            FaceEmotion::Sad => "Sad",
            FaceEmotion::Angry => "Angry",
            FaceEmotion::Surprised => "Surprised",
            FaceEmotion::Neutral => "Neutral",
            FaceEmotion::NoFaceDetected => "NoFaceDetected",
        }
    }

    /// Maps a free-form face description onto a label.
    ///
    /// The five canonical names are matched by substring in the order Happy,
    /// Sad, Surprised, Angry, Neutral; anything unrecognized is Neutral. A
    /// "no face" marker is checked first so it never degrades to Neutral.
    pub fn from_description(text: &str) -> Self {
        let lower = text.to_ascii_lowercase();
        if lower.contains("no face") || lower.contains("nofacedetected") {
            return FaceEmotion::NoFaceDetected;
        }
        [
            FaceEmotion::Happy,
            FaceEmotion::Sad,
            FaceEmotion::Surprised,
            FaceEmotion::Angry,
            FaceEmotion::Neutral,
        ]
        .into_iter()
        .find(|e| text.contains(e.as_str()))
        .unwrap_or(FaceEmotion::Neutral)
    }
}

impl fmt::Display for FaceEmotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A face label plus the measurement that produced it. The diagnostic is
/// for humans and logs only; nothing downstream parses it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FaceClassification {
    pub emotion: FaceEmotion,
    pub diagnostic: String,
}

impl FaceClassification {
    pub fn no_face() -> Self {
        Self {
            emotion: FaceEmotion::NoFaceDetected,
            diagnostic: String::new(),
        }
    }
}

impl fmt::Display for FaceClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.emotion {
            FaceEmotion::NoFaceDetected => f.write_str("No Face Detected"),
            FaceEmotion::Neutral => write!(f, "Neutral ({})", self.diagnostic),
            other => write!(f, "{}: {}", other, self.diagnostic),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FaceError {
    #[error("landmark `{name}` (index {index}) missing from a set of {available} points")]
    MissingLandmark {
        name: &'static str,
        index: usize,
        available: usize,
    },

    #[error("landmark `{name}` (index {index}) has a non-finite coordinate")]
    NonFiniteLandmark { name: &'static str, index: usize },

    #[error("malformed landmark data: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_parsing_follows_priority_order() {
        assert_eq!(
            FaceEmotion::from_description("Happy: Corners lifted (0.020)"),
            FaceEmotion::Happy
        );
        assert_eq!(
            FaceEmotion::from_description("Surprised: Mouth open (0.30)"),
            FaceEmotion::Surprised
        );
        assert_eq!(
            FaceEmotion::from_description("Angry: Brows squeezed (0.20)"),
            FaceEmotion::Angry
        );
        assert_eq!(
            FaceEmotion::from_description("Sad: Corners down (-0.010)"),
            FaceEmotion::Sad
        );
        // Happy wins over Sad when both appear.
        assert_eq!(
            FaceEmotion::from_description("Sad but Happy"),
            FaceEmotion::Happy
        );
    }

    #[test]
    fn unrecognized_description_is_neutral() {
        assert_eq!(FaceEmotion::from_description("???"), FaceEmotion::Neutral);
        assert_eq!(FaceEmotion::from_description(""), FaceEmotion::Neutral);
    }

    #[test]
    fn no_face_marker_is_its_own_label() {
        assert_eq!(
            FaceEmotion::from_description("No Face Detected"),
            FaceEmotion::NoFaceDetected
        );
        assert_eq!(
            FaceEmotion::from_description("NoFaceDetected"),
            FaceEmotion::NoFaceDetected
        );
    }

    #[test]
    fn display_round_trips_through_description_parser() {
        for emotion in [
            FaceEmotion::Happy,
            FaceEmotion::Sad,
            FaceEmotion::Angry,
            FaceEmotion::Surprised,
            FaceEmotion::Neutral,
        ] {
            let c = FaceClassification {
                emotion,
                diagnostic: "x (0.1)".to_owned(),
            };
            assert_eq!(FaceEmotion::from_description(&c.to_string()), emotion);
        }
        assert_eq!(
            FaceEmotion::from_description(&FaceClassification::no_face().to_string()),
            FaceEmotion::NoFaceDetected
        );
    }
}
