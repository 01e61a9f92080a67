//! Session routing and frame dispatch

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Context;
use detection::Detections;
use frame_capture::{FrameMetadata, SessionIds};
use proctoring::{
    AnalysisMode, FrameAnalysisResult, ProctorConfig, ProctoringEngine, ReferenceIdentity,
    SessionState,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::protocol::{decode_image_data, FramePayload, FrameResponse, Request, Response, Status};
use crate::settings::WorkerSettings;

/// Participant id used when a frame carries none
pub const DEFAULT_PARTICIPANT: &str = "default";

struct SessionEntry {
    state: Arc<Mutex<SessionState>>,
    next_sequence: u32,
}

/// Worker service: one engine shared by every participant session
pub struct ProctorService {
    engine: Arc<Mutex<ProctoringEngine>>,
    /// Fixed at construction so no request waits on the engine lock for it
    mode: AnalysisMode,
    config: ProctorConfig,
    frame_timeout: Duration,
    reference_timeout: Duration,
    http: reqwest::Client,
    sessions: HashMap<String, SessionEntry>,
    /// Reference applied to sessions without their own
    default_reference: Option<ReferenceIdentity>,
    processing: bool,
}

impl ProctorService {
    pub fn new(engine: ProctoringEngine, settings: &WorkerSettings) -> Self {
        let reference_timeout = settings.reference_timeout();
        let http = reqwest::Client::builder()
            .timeout(reference_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            mode: engine.mode(),
            engine: Arc::new(Mutex::new(engine)),
            config: settings.proctor.clone(),
            frame_timeout: settings.frame_timeout(),
            reference_timeout,
            http,
            sessions: HashMap::new(),
            default_reference: None,
            processing: true,
        }
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Snapshot of a participant's session
    pub fn session_state(&self, participant_id: &str) -> Option<SessionState> {
        self.sessions
            .get(participant_id)
            .map(|entry| lock(&entry.state).clone())
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Handle one request; `None` when nothing should be written back
    pub async fn handle(&mut self, request: Request) -> Option<Response> {
        match request {
            Request::VideoFrame { data } => {
                if !self.processing {
                    debug!("Processing stopped, dropping frame");
                    return None;
                }
                Some(Response::Frame(self.handle_frame(data).await))
            }
            Request::LoadReferenceFace {
                image_url,
                user_id,
                participant_id,
            } => Some(Response::Status(
                self.load_reference(&image_url, user_id, participant_id).await,
            )),
            Request::StartProcessing => {
                info!("Processing started");
                self.processing = true;
                Some(Response::Status(Status::ProcessingStarted))
            }
            Request::StopProcessing => {
                info!("Processing stopped");
                self.processing = false;
                Some(Response::Status(Status::ProcessingStopped))
            }
        }
    }

    async fn handle_frame(&mut self, payload: FramePayload) -> FrameResponse {
        let ids = SessionIds {
            meeting_id: payload.meeting_id.unwrap_or_default(),
            participant_id: payload
                .participant_id
                .unwrap_or_else(|| DEFAULT_PARTICIPANT.to_string()),
            user_id: payload.user_id,
        };
        let timestamp_ms = payload.timestamp.unwrap_or_else(now_ms);
        let (state, sequence) = self.session(&ids);
        lock(&state).refresh_ids(&ids);

        let respond = |result: FrameAnalysisResult| FrameResponse {
            meeting_id: ids.meeting_id.clone(),
            participant_id: ids.participant_id.clone(),
            result,
        };

        let bytes = match decode_image_data(&payload.image_data) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Frame from {} is not valid base64: {}", ids.participant_id, e);
                let error = format!("invalid base64: {}", e);
                return respond(FrameAnalysisResult::failed(timestamp_ms, self.mode, error));
            }
        };

        let metadata = FrameMetadata {
            timestamp_ms,
            sequence,
            session: ids.clone(),
        };

        // The task works on a copy; it is committed only if the analysis
        // completes in time, so an abandoned task cannot touch the session.
        let mut snapshot = lock(&state).clone();
        let engine = Arc::clone(&self.engine);
        let task = tokio::task::spawn_blocking(move || {
            let mut engine = lock(&engine);
            let result = engine.analyze_encoded(&bytes, metadata, &mut snapshot);
            (result, snapshot)
        });

        let result = match tokio::time::timeout(self.frame_timeout, task).await {
            Ok(Ok((result, analyzed))) => {
                *lock(&state) = analyzed;
                result
            }
            Ok(Err(e)) => {
                warn!("Analysis task failed: {}", e);
                self.analysis_failed(&state, timestamp_ms, "analysis task failed")
            }
            Err(_) => {
                warn!(
                    participant = %ids.participant_id,
                    timeout_ms = self.frame_timeout.as_millis() as u64,
                    "Frame analysis timed out"
                );
                self.analysis_failed(&state, timestamp_ms, "analysis timed out")
            }
        };

        respond(result)
    }

    /// Count a frame whose analysis never finished as a detection failure
    fn analysis_failed(
        &self,
        state: &Mutex<SessionState>,
        timestamp_ms: u64,
        error: &str,
    ) -> FrameAnalysisResult {
        let mut state = lock(state);
        let mut result = ProctoringEngine::aggregate_detections(
            self.mode,
            &Detections::default(),
            timestamp_ms,
            &mut state,
        );
        result.error = Some(error.to_string());
        result
    }

    async fn load_reference(
        &mut self,
        image_url: &str,
        user_id: Option<String>,
        participant_id: Option<String>,
    ) -> Status {
        info!("Loading reference face from: {}", image_url);
        let failure = |user_id, error: String| {
            warn!("Reference face not loaded: {}", error);
            Status::ReferenceFaceLoaded {
                success: false,
                user_id,
                error: Some(error),
            }
        };

        let image = match self.read_reference(image_url).await {
            Ok(image) => image,
            Err(e) => return failure(user_id, format!("{:#}", e)),
        };

        let engine = Arc::clone(&self.engine);
        let source = image_url.to_string();
        let task =
            tokio::task::spawn_blocking(move || lock(&engine).enroll_reference(&image, &source));

        let reference = match tokio::time::timeout(self.reference_timeout, task).await {
            Ok(Ok(Ok(reference))) => reference,
            Ok(Ok(Err(e))) => return failure(user_id, e.to_string()),
            Ok(Err(e)) => return failure(user_id, format!("enrollment task failed: {}", e)),
            Err(_) => return failure(user_id, "enrollment timed out".to_string()),
        };

        match participant_id {
            Some(participant) => {
                let ids = SessionIds {
                    participant_id: participant,
                    user_id: user_id.clone(),
                    ..Default::default()
                };
                let (state, _) = self.session(&ids);
                ProctoringEngine::install_reference(reference, &mut lock(&state));
            }
            None => {
                for entry in self.sessions.values() {
                    ProctoringEngine::install_reference(reference.clone(), &mut lock(&entry.state));
                }
                self.default_reference = Some(reference);
            }
        }

        Status::ReferenceFaceLoaded {
            success: true,
            user_id,
            error: None,
        }
    }

    /// Reference image bytes from an http(s) URL, a `data:` URL or a local path
    async fn read_reference(&self, image_url: &str) -> anyhow::Result<Vec<u8>> {
        if image_url.starts_with("data:") {
            return Ok(decode_image_data(image_url)?);
        }
        if image_url.starts_with("http://") || image_url.starts_with("https://") {
            let response = self
                .http
                .get(image_url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .with_context(|| format!("failed to download reference image {}", image_url))?;
            let body = response
                .bytes()
                .await
                .with_context(|| format!("failed to read reference image {}", image_url))?;
            return Ok(body.to_vec());
        }
        tokio::fs::read(image_url)
            .await
            .with_context(|| format!("failed to read reference image {}", image_url))
    }

    /// Session for a participant, created on first sight
    fn session(&mut self, ids: &SessionIds) -> (Arc<Mutex<SessionState>>, u32) {
        let entry = self.sessions.entry(ids.participant_id.clone()).or_insert_with(|| {
            info!(
                meeting = %ids.meeting_id,
                participant = %ids.participant_id,
                "New proctoring session"
            );
            let mut state = SessionState::new(ids.clone(), self.config.clone());
            if let Some(reference) = &self.default_reference {
                state.set_reference(reference.clone());
            }
            SessionEntry {
                state: Arc::new(Mutex::new(state)),
                next_sequence: 0,
            }
        });

        let sequence = entry.next_sequence;
        entry.next_sequence = entry.next_sequence.wrapping_add(1);
        (Arc::clone(&entry.state), sequence)
    }
}

/// Lock, recovering the guard if a previous holder panicked
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Serve requests line by line until the reader closes
pub async fn run<R, W>(mut service: ProctorService, reader: R, mut writer: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request: Request = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                warn!("Ignoring malformed message: {}", e);
                continue;
            }
        };

        if let Some(response) = service.handle(request).await {
            let mut out = serde_json::to_vec(&response)?;
            out.push(b'\n');
            writer.write_all(&out).await?;
            writer.flush().await?;
        }
    }
    Ok(())
}
