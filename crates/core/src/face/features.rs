use crate::config::DISTANCE_FLOOR;
use crate::face::landmarks::*;
use crate::face::FaceError;
use serde::{Deserialize, Serialize};

/// Scale-invariant geometry of one face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FacialObservation {
    /// Lip-center y minus mouth-corner y; positive when the corners are raised.
    pub smile_metric: f32,
    pub mouth_aspect_ratio: f32,
    /// Inner-brow gap over outer-eye span.
    pub normalized_glabella: f32,
    pub avg_brow_raise: f32,
}

pub fn extract_facial_observation(landmarks: &LandmarkSet) -> Result<FacialObservation, FaceError> {
    let lip_top = landmarks.point(LIP_TOP, "lip_top")?;
    let lip_bottom = landmarks.point(LIP_BOTTOM, "lip_bottom")?;
    let left_corner = landmarks.point(MOUTH_LEFT_CORNER, "mouth_left_corner")?;
    let right_corner = landmarks.point(MOUTH_RIGHT_CORNER, "mouth_right_corner")?;
    let brow_inner_left = landmarks.point(BROW_LEFT_INNER, "brow_inner_left")?;
    let brow_inner_right = landmarks.point(BROW_RIGHT_INNER, "brow_inner_right")?;
    let brow_mid_left = landmarks.point(BROW_LEFT_MID, "brow_mid_left")?;
    let brow_mid_right = landmarks.point(BROW_RIGHT_MID, "brow_mid_right")?;
    let eye_top_left = landmarks.point(EYE_LEFT_TOP, "eye_top_left")?;
    let eye_top_right = landmarks.point(EYE_RIGHT_TOP, "eye_top_right")?;
    let eye_outer_left = landmarks.point(EYE_LEFT_OUTER, "eye_outer_left")?;
    let eye_outer_right = landmarks.point(EYE_RIGHT_OUTER, "eye_outer_right")?;

    let lip_center_y = (lip_top.y + lip_bottom.y) / 2.0;
    let corners_y = (left_corner.y + right_corner.y) / 2.0;
    let smile_metric = lip_center_y - corners_y;

    let mouth_width = left_corner.euclidean_dist(&right_corner).max(DISTANCE_FLOOR);
    let mouth_height = lip_top.euclidean_dist(&lip_bottom);
    let mouth_aspect_ratio = mouth_height / mouth_width;

    let eye_span = eye_outer_left
        .euclidean_dist(&eye_outer_right)
        .max(DISTANCE_FLOOR);
    let normalized_glabella = brow_inner_left.euclidean_dist(&brow_inner_right) / eye_span;

    let left_raise = eye_top_left.euclidean_dist(&brow_mid_left);
    let right_raise = eye_top_right.euclidean_dist(&brow_mid_right);
    let avg_brow_raise = (left_raise + right_raise) / 2.0;

    Ok(FacialObservation {
        smile_metric,
        mouth_aspect_ratio,
        normalized_glabella,
        avg_brow_raise,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A relaxed face: flat mouth, brows at rest.
    pub fn neutral_face() -> Vec<Point2> {
        let mut pts = vec![Point2::new(0.5, 0.5); 468];
        pts[LIP_TOP] = Point2::new(0.50, 0.70);
        pts[LIP_BOTTOM] = Point2::new(0.50, 0.72);
        pts[MOUTH_LEFT_CORNER] = Point2::new(0.42, 0.71);
        pts[MOUTH_RIGHT_CORNER] = Point2::new(0.58, 0.71);
        pts[EYE_LEFT_OUTER] = Point2::new(0.30, 0.40);
        pts[EYE_RIGHT_OUTER] = Point2::new(0.70, 0.40);
        pts[BROW_LEFT_INNER] = Point2::new(0.44, 0.33);
        pts[BROW_RIGHT_INNER] = Point2::new(0.56, 0.33);
        pts[EYE_LEFT_TOP] = Point2::new(0.38, 0.38);
        pts[EYE_RIGHT_TOP] = Point2::new(0.62, 0.38);
        pts[BROW_LEFT_MID] = Point2::new(0.38, 0.32);
        pts[BROW_RIGHT_MID] = Point2::new(0.62, 0.32);
        pts
    }
}
