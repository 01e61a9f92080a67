//! Gaze direction and short-horizon history

use std::collections::VecDeque;

use detection::{Landmarks, Point};
use serde::{Deserialize, Serialize};

/// Unit gaze vector (zero when undefined)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Gaze {
    pub x: f32,
    pub y: f32,
}

impl Gaze {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// Direction from the left-eye centroid to the right-eye centroid
pub fn gaze_direction(landmarks: &Landmarks) -> Gaze {
    let left = Point::centroid(landmarks.left_eye());
    let right = Point::centroid(landmarks.right_eye());

    let dx = right.x - left.x;
    let dy = right.y - left.y;
    let norm = (dx * dx + dy * dy).sqrt();
    if norm <= f32::EPSILON || !norm.is_finite() {
        return Gaze::default();
    }
    Gaze::new(dx / norm, dy / norm)
}

/// Bounded gaze history, oldest sample evicted first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredHistory")]
pub struct GazeHistory {
    samples: VecDeque<Gaze>,
    capacity: usize,
}

/// Persisted form; restored through [`GazeHistory::new`] so the capacity
/// bound holds again
#[derive(Deserialize)]
struct StoredHistory {
    samples: VecDeque<Gaze>,
    capacity: usize,
}

impl From<StoredHistory> for GazeHistory {
    fn from(stored: StoredHistory) -> Self {
        let mut history = GazeHistory::new(stored.capacity);
        let skip = stored.samples.len().saturating_sub(history.capacity);
        history.samples.extend(stored.samples.into_iter().skip(skip));
        history
    }
}

impl GazeHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, gaze: Gaze) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(gaze);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Gaze> {
        self.samples.iter()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Population variance of each axis, `None` when empty
    pub fn variance(&self) -> Option<(f32, f32)> {
        if self.samples.is_empty() {
            return None;
        }
        let n = self.samples.len() as f32;
        let (sx, sy) = self.samples.iter().fold((0.0, 0.0), |(sx, sy), g| (sx + g.x, sy + g.y));
        let (mx, my) = (sx / n, sy / n);

        let (vx, vy) = self.samples.iter().fold((0.0, 0.0), |(vx, vy), g| {
            (vx + (g.x - mx).powi(2), vy + (g.y - my).powi(2))
        });
        Some((vx / n, vy / n))
    }

    /// Largest per-axis variance
    pub fn max_variance(&self) -> Option<f32> {
        self.variance().map(|(vx, vy)| vx.max(vy))
    }
}

impl Default for GazeHistory {
    fn default() -> Self {
        Self::new(10)
    }
}
