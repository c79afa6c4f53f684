use crate::config::FaceThresholds;
use crate::face::{FaceClassification, FaceEmotion, FacialObservation};

/// Ordered threshold cascade; the first rule that fires wins.
pub fn classify_face(obs: &FacialObservation, t: &FaceThresholds) -> FaceClassification {
    let (emotion, diagnostic) = if obs.smile_metric > t.happy_smile {
        (
            FaceEmotion::Happy,
            format!("Corners lifted ({:.3})", obs.smile_metric),
        )
    } else if obs.mouth_aspect_ratio > t.surprise_mouth_ratio
        && obs.avg_brow_raise > t.surprise_brow_raise
    {
        (
            FaceEmotion::Surprised,
            format!("Mouth open ({:.2})", obs.mouth_aspect_ratio),
        )
    } else if obs.normalized_glabella < t.angry_glabella && obs.avg_brow_raise < t.angry_brow_raise
    {
        (
            FaceEmotion::Angry,
            format!("Brows squeezed ({:.3})", obs.normalized_glabella),
        )
    } else if obs.smile_metric < t.sad_smile {
        (
            FaceEmotion::Sad,
            format!("Corners down ({:.3})", obs.smile_metric),
        )
    } else {
        (
            FaceEmotion::Neutral,
            format!(
                "Glab:{:.2}, Brow:{:.2}, Smile:{:.3}",
                obs.normalized_glabella, obs.avg_brow_raise, obs.smile_metric
            ),
        )
    };

    tracing::debug!(
        emotion = %emotion,
        smile = obs.smile_metric,
        mar = obs.mouth_aspect_ratio,
        glabella = obs.normalized_glabella,
        brow_raise = obs.avg_brow_raise,
        "face classified"
    );

    FaceClassification {
        emotion,
        diagnostic,
    }
}
