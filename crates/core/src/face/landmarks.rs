// Indices follow the 468-point face mesh topology.

use crate::face::FaceError;
use serde::{Deserialize, Serialize};

pub const LIP_TOP: usize = 13;
pub const LIP_BOTTOM: usize = 14;
pub const MOUTH_LEFT_CORNER: usize = 61;
pub const MOUTH_RIGHT_CORNER: usize = 291;
pub const BROW_LEFT_INNER: usize = 55;
pub const BROW_RIGHT_INNER: usize = 285;
pub const BROW_LEFT_MID: usize = 105;
pub const BROW_RIGHT_MID: usize = 334;
pub const EYE_LEFT_TOP: usize = 159;
pub const EYE_RIGHT_TOP: usize = 386;
pub const EYE_LEFT_OUTER: usize = 33;
pub const EYE_RIGHT_OUTER: usize = 263;

/// Normalized image coordinates: origin top-left, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint")]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn euclidean_dist(&self, other: &Point2) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

// Detectors emit either `[x, y(, z)]` tuples or `{x, y, z}` objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPoint {
    Seq(Vec<f32>),
    Named { x: f32, y: f32 },
}

impl TryFrom<RawPoint> for Point2 {
    type Error = String;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        match raw {
            RawPoint::Seq(v) if v.len() == 2 || v.len() == 3 => Ok(Point2::new(v[0], v[1])),
            RawPoint::Seq(v) => Err(format!(
                "landmark must have 2 or 3 coordinates, got {}",
                v.len()
            )),
            RawPoint::Named { x, y, .. } => Ok(Point2::new(x, y)),
        }
    }
}

/// One face's worth of landmarks, consumed once per inference call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: Vec<Point2>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize, name: &'static str) -> Result<Point2, FaceError> {
        let p = self
            .points
            .get(index)
            .copied()
            .ok_or(FaceError::MissingLandmark {
                name,
                index,
                available: self.points.len(),
            })?;
        if !p.is_finite() {
            return Err(FaceError::NonFiniteLandmark { name, index });
        }
        Ok(p)
    }
}

impl From<Vec<Point2>> for LandmarkSet {
    fn from(points: Vec<Point2>) -> Self {
        Self::new(points)
    }
}

/// Output of the external face-mesh detector for one image.
#[derive(Debug, Clone, PartialEq)]
pub enum FaceDetection {
    Face(LandmarkSet),
    NoFace,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DetectorFile {
    Faces(Vec<LandmarkSet>),
    Single(LandmarkSet),
}

impl FaceDetection {
    /// Accepts a list of faces (only the first is used) or a single face.
    /// An empty face list means the detector found nothing.
    pub fn from_json_str(raw: &str) -> Result<Self, FaceError> {
        let file: DetectorFile =
            serde_json::from_str(raw).map_err(|e| FaceError::Malformed(e.to_string()))?;
        Ok(match file {
            DetectorFile::Faces(faces) => match faces.into_iter().next() {
                Some(face) => FaceDetection::Face(face),
                None => FaceDetection::NoFace,
            },
            DetectorFile::Single(face) if face.is_empty() => FaceDetection::NoFace,
            DetectorFile::Single(face) => FaceDetection::Face(face),
        })
    }
}
