//! Eye aspect ratio

use detection::{Landmarks, Point};

/// EAR for one 6-point eye contour.
///
/// Points are ordered outer corner, two upper-lid points, inner corner,
/// two lower-lid points. Returns `None` for a malformed contour or when
/// the corners coincide.
pub fn eye_aspect_ratio(eye: &[Point]) -> Option<f32> {
    let [p0, p1, p2, p3, p4, p5] = eye else {
        return None;
    };

    let width = p0.distance(p3);
    if width <= f32::EPSILON || !width.is_finite() {
        return None;
    }

    Some((p1.distance(p5) + p2.distance(p4)) / (2.0 * width))
}

/// Mean EAR of both eyes
pub fn frame_ear(landmarks: &Landmarks) -> Option<f32> {
    let left = eye_aspect_ratio(landmarks.left_eye())?;
    let right = eye_aspect_ratio(landmarks.right_eye())?;
    Some((left + right) / 2.0)
}
