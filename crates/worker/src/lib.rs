//! Proctoring Worker
//!
//! Line-oriented front end for the proctoring pipeline. Requests arrive
//! as JSON on stdin, responses leave as JSON on stdout; logs go to stderr.

pub mod protocol;
pub mod service;
pub mod settings;

pub use service::{run, ProctorService};
pub use settings::WorkerSettings;

use detection::DetectionConfig;
use proctoring::ProctoringEngine;
use tracing_subscriber::EnvFilter;

/// Initialize logging on stderr; `RUST_LOG` overrides the default level
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.expect("Failed to set tracing subscriber");
}

/// Build the engine from the configured models.
///
/// A face detector is mandatory; every other capability degrades the
/// profile when missing or broken.
#[cfg(feature = "onnx")]
pub fn build_engine(config: &DetectionConfig) -> anyhow::Result<ProctoringEngine> {
    use detection::onnx::{
        OnnxFaceDetector, OnnxFaceEmbedder, OnnxLandmarkExtractor, OnnxObjectDetector,
    };
    use detection::DetectionAdapter;
    use tracing::warn;

    let face_model = config
        .face_model_path
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("detection.face_model_path is not configured"))?;
    let detector = OnnxFaceDetector::new(face_model)?;
    let mut adapter = DetectionAdapter::new(config.clone(), Box::new(detector));

    if let Some(path) = config.landmark_model_path.as_deref() {
        match OnnxLandmarkExtractor::new(path) {
            Ok(extractor) => adapter = adapter.with_landmarks(Box::new(extractor)),
            Err(e) => warn!("Behavior analysis unavailable: {}", e),
        }
    }
    if let Some(path) = config.embedding_model_path.as_deref() {
        match OnnxFaceEmbedder::new(path) {
            Ok(embedder) => adapter = adapter.with_embedder(Box::new(embedder)),
            Err(e) => warn!("Face recognition unavailable: {}", e),
        }
    }
    if let Some(path) = config.object_model_path.as_deref() {
        match OnnxObjectDetector::new(path) {
            Ok(detector) => adapter = adapter.with_objects(Box::new(detector)),
            Err(e) => warn!("Object detection unavailable: {}", e),
        }
    }

    Ok(ProctoringEngine::new(adapter))
}

#[cfg(not(feature = "onnx"))]
pub fn build_engine(_config: &DetectionConfig) -> anyhow::Result<ProctoringEngine> {
    anyhow::bail!("no detection backend compiled in, rebuild with `--features onnx`")
}
