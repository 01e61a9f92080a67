//! Live identity verification

use detection::{Embedding, Face};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ReferenceIdentity;

/// Identity configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Minimum similarity for a face to count as the enrolled person
    pub similarity_threshold: f32,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.6,
        }
    }
}

/// Outcome of comparing one face against the reference.
///
/// `similarity` is `max(0, 1 - euclidean_distance)`, a linear transform
/// and not a calibrated probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    pub is_match: bool,
    pub similarity: f32,
}

impl Verification {
    /// No usable comparison
    pub const REJECTED: Verification = Verification {
        is_match: false,
        similarity: 0.0,
    };

    /// Detection-only reference: any present face passes
    pub const DETECTION_ONLY: Verification = Verification {
        is_match: true,
        similarity: 1.0,
    };
}

/// Compare a face against the enrolled reference.
///
/// Fails closed when nothing is enrolled.
pub fn verify(
    face: &Face,
    reference: Option<&ReferenceIdentity>,
    config: &IdentityConfig,
) -> Verification {
    let Some(reference) = reference else {
        return Verification::REJECTED;
    };

    let reference_vector = match &reference.embedding {
        Embedding::Unavailable => return Verification::DETECTION_ONLY,
        Embedding::Full(v) => v,
    };

    let Some(live_vector) = face.embedding.as_vector() else {
        debug!("Face has no embedding, rejecting");
        return Verification::REJECTED;
    };

    let Some(distance) = euclidean_distance(reference_vector, live_vector) else {
        debug!(
            "Embedding dimension mismatch: reference {} vs live {}",
            reference_vector.len(),
            live_vector.len()
        );
        return Verification::REJECTED;
    };

    let similarity = (1.0 - distance).max(0.0);
    Verification {
        is_match: similarity >= config.similarity_threshold,
        similarity,
    }
}

/// Euclidean distance between equal-length vectors
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    Some(a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt())
}
