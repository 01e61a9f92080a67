//! Identity Enrollment and Verification
//!
//! Face recognition-based identity checks for a monitored exam-taker:
//! - One-time enrollment of a reference embedding from a profile image
//! - Live verification of each detected face against the reference
//! - Detection-only enrollment when no recognition model is available

mod enrollment;
mod verifier;

pub use enrollment::{enroll, enroll_frame, ReferenceIdentity};
pub use verifier::{euclidean_distance, verify, IdentityConfig, Verification};

use thiserror::Error;

/// Enrollment error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnrollmentError {
    #[error("Reference image could not be decoded: {0}")]
    InvalidImage(String),

    #[error("No face found in reference image")]
    NoFaceInReference,

    #[error("Face detection failed: {0}")]
    Detection(String),

    #[error("Embedding extraction failed for the reference face")]
    EmbeddingFailed,
}
