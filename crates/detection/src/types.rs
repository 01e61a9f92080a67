//! Normalized detection types

use serde::{Deserialize, Serialize};

use crate::DetectionError;

/// Number of points in the reference landmark model
pub const LANDMARK_COUNT: usize = 68;

/// 2D point in frame pixel coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Mean of a set of points (origin for an empty set)
    pub fn centroid(points: &[Point]) -> Point {
        if points.is_empty() {
            return Point::default();
        }
        let n = points.len() as f32;
        let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point::new(sx / n, sy / n)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection over union with another box
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - inter;
        if union > 0.0 {
            inter / union
        } else {
            0.0
        }
    }
}

/// Raw face box as returned by a face detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub bbox: BoundingBox,
    pub confidence: f32,
}

impl FaceBox {
    pub fn new(bbox: BoundingBox, confidence: f32) -> Self {
        Self { bbox, confidence }
    }
}

/// 68-point facial landmarks (iBUG 300-W ordering)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmarks {
    points: Vec<Point>,
}

impl Landmarks {
    pub const JAW: std::ops::Range<usize> = 0..17;
    pub const RIGHT_BROW: std::ops::Range<usize> = 17..22;
    pub const LEFT_BROW: std::ops::Range<usize> = 22..27;
    pub const NOSE: std::ops::Range<usize> = 27..36;
    pub const LEFT_EYE: std::ops::Range<usize> = 36..42;
    pub const RIGHT_EYE: std::ops::Range<usize> = 42..48;
    pub const MOUTH: std::ops::Range<usize> = 48..68;

    pub fn new(points: Vec<Point>) -> Result<Self, DetectionError> {
        if points.len() != LANDMARK_COUNT {
            return Err(DetectionError::LandmarkExtraction(format!(
                "expected {} points, got {}",
                LANDMARK_COUNT,
                points.len()
            )));
        }
        Ok(Self { points })
    }

    /// Build landmarks where only the two eye regions are known.
    ///
    /// Each eye is ordered: outer corner, two upper-lid points, inner corner,
    /// two lower-lid points. Remaining points sit at the origin.
    pub fn from_eye_regions(left_eye: [Point; 6], right_eye: [Point; 6]) -> Self {
        let mut points = vec![Point::default(); LANDMARK_COUNT];
        points[Self::LEFT_EYE].copy_from_slice(&left_eye);
        points[Self::RIGHT_EYE].copy_from_slice(&right_eye);
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn left_eye(&self) -> &[Point] {
        &self.points[Self::LEFT_EYE]
    }

    pub fn right_eye(&self) -> &[Point] {
        &self.points[Self::RIGHT_EYE]
    }

    pub fn mouth(&self) -> &[Point] {
        &self.points[Self::MOUTH]
    }
}

/// Face identity signature
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "vector", rename_all = "snake_case")]
pub enum Embedding {
    /// Fixed-length embedding vector from the recognition model
    Full(Vec<f32>),
    /// Recognition model not available (detection-only)
    #[default]
    Unavailable,
}

impl Embedding {
    pub fn as_vector(&self) -> Option<&[f32]> {
        match self {
            Embedding::Full(v) => Some(v),
            Embedding::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Embedding::Full(_))
    }
}

/// Face after adapter enrichment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub bbox: BoundingBox,
    pub confidence: f32,
    /// Absent when no extractor is configured or extraction failed
    pub landmarks: Option<Landmarks>,
    pub embedding: Embedding,
}

impl Face {
    /// Bare face with no landmarks and no embedding
    pub fn bare(face: FaceBox) -> Self {
        Self {
            bbox: face.bbox,
            confidence: face.confidence,
            landmarks: None,
            embedding: Embedding::Unavailable,
        }
    }
}

/// Detected object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    /// Normalized class label (e.g. "cell_phone")
    pub label: String,
    /// Detection confidence
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl DetectedObject {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }
}

/// Accepted detections for one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detections {
    pub faces: Vec<Face>,
    pub objects: Vec<DetectedObject>,
}

impl Detections {
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty() && self.objects.is_empty()
    }
}
