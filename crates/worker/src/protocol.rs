//! JSON-lines message protocol

use base64::Engine;
use proctoring::FrameAnalysisResult;
use serde::{Deserialize, Serialize};

/// Inbound message, one per line
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum Request {
    VideoFrame {
        data: FramePayload,
    },
    LoadReferenceFace {
        /// Local path or `data:` URL
        image_url: String,
        #[serde(default)]
        user_id: Option<String>,
        /// Session to enroll into; every session when absent
        #[serde(default)]
        participant_id: Option<String>,
    },
    StartProcessing,
    StopProcessing,
}

/// Frame submitted for analysis
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FramePayload {
    /// Base64 image, optionally with a `data:image/...;base64,` prefix
    pub image_data: String,
    pub meeting_id: Option<String>,
    pub participant_id: Option<String>,
    pub user_id: Option<String>,
    /// Capture time (milliseconds); receive time when absent
    pub timestamp: Option<u64>,
}

/// Status acknowledgements
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum Status {
    ReferenceFaceLoaded {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    ProcessingStarted,
    ProcessingStopped,
}

/// Analysis result tagged with the session it belongs to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameResponse {
    pub meeting_id: String,
    pub participant_id: String,
    #[serde(flatten)]
    pub result: FrameAnalysisResult,
}

/// Outbound message, one per line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Frame(FrameResponse),
    Status(Status),
}

/// Decode a base64 image, accepting data-URL framing
pub fn decode_image_data(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match encoded.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(rest),
        None => encoded,
    };
    base64::prelude::BASE64_STANDARD.decode(payload.trim())
}
