//! Minutes HTTP REST API
//!
//! Axum-based HTTP server for the meeting summarizer. Serves the browser
//! client and the JSON endpoints it drives.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to a pure
//! inner function. The inner functions are directly testable without axum dispatch
//! machinery.
//!
//! Endpoints:
//! - GET  /               — single-page client
//! - GET  /health         — liveness
//! - GET  /version        — server version info
//! - POST /api/upload     — extract text from an uploaded `.txt` transcript
//! - POST /api/summarize  — summarize a transcript via the completion provider
//! - POST /api/share      — validate and echo a share request (no delivery)

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use minutes_core::models::{
    ShareAck, ShareRequest, SummarizeRequest, SummarizeResponse, UploadResponse,
};
use minutes_core::{build_messages, CompletionBackend, MinutesConfig};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::ui;
use crate::upload::TranscriptUpload;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub config: MinutesConfig,
    pub completion: Arc<dyn CompletionBackend>,
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    let upload_limit = state.config.upload.max_file_bytes + MULTIPART_OVERHEAD_BYTES;
    let json_limit = state.config.http.json_limit_bytes;
    let cors = cors_layer(&state.config.http.cors_origins);

    Router::new()
        .route("/", get(ui::index_handler))
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route(
            "/api/upload",
            post(upload_handler).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/summarize", post(summarize_handler))
        .route("/api/share", post(share_handler))
        .layer(DefaultBodyLimit::max(json_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy from configured origins; `"*"` allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(origin = %o, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(methods)
        .allow_headers(Any)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    config: MinutesConfig,
    completion: Arc<dyn CompletionBackend>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = config.bind_addr();
    let state = Arc::new(HttpState { config, completion });

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Minutes HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Error body
// ============================================================================

/// Standard HTTP error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            status: "error".to_string(),
        }
    }
}

fn error_body(status: StatusCode, msg: &str) -> (StatusCode, serde_json::Value) {
    (status, serde_json::json!(ErrorResponse::new(msg)))
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

/// Inner health — static liveness payload (pure, no IO).
pub fn health_inner() -> serde_json::Value {
    serde_json::json!({ "ok": true })
}

/// Inner version — returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "service": "minutes",
    })
}

/// Inner extract — reads the stored upload, removes it, returns `{text}`.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected. If the
/// read fails the upload is dropped, which still removes the file.
pub async fn extract_text_inner(upload: TranscriptUpload) -> (StatusCode, serde_json::Value) {
    let bytes = match tokio::fs::read(upload.path()).await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(error = %e, path = %upload.path().display(), "Failed to read uploaded transcript");
            return error_body(StatusCode::INTERNAL_SERVER_ERROR, "Could not read file");
        }
    };

    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("Uploaded transcript is not valid UTF-8, replacing invalid sequences");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };

    if let Err(e) = upload.into_temp_file().close() {
        tracing::error!(error = %e, "Failed to remove uploaded transcript");
        return error_body(StatusCode::INTERNAL_SERVER_ERROR, "Could not read file");
    }

    tracing::info!(chars = text.chars().count(), "Extracted transcript text");
    (StatusCode::OK, serde_json::json!(UploadResponse { text }))
}

/// Inner summarize — validates the transcript and calls the completion backend once.
pub async fn summarize_inner(
    completion: &dyn CompletionBackend,
    req: SummarizeRequest,
) -> (StatusCode, serde_json::Value) {
    let transcript = match req.transcript_text {
        Some(t) if !t.trim().is_empty() => t,
        _ => return error_body(StatusCode::BAD_REQUEST, "transcriptText is required"),
    };

    let messages = build_messages(&transcript, req.prompt.as_deref());
    let start = Instant::now();

    match completion.complete(&messages).await {
        Ok(summary) => {
            let summary = summary.unwrap_or_default();
            tracing::info!(
                backend = completion.name(),
                transcript_chars = transcript.chars().count(),
                summary_chars = summary.chars().count(),
                took_ms = start.elapsed().as_millis() as u64,
                "Transcript summarized"
            );
            (StatusCode::OK, serde_json::json!(SummarizeResponse { summary }))
        }
        Err(e) => {
            tracing::error!(backend = completion.name(), error = %e, "Summarization failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Summarization failed")
        }
    }
}

/// Inner share — validates the summary and echoes an acknowledgement. Nothing is sent.
pub fn share_inner(req: ShareRequest) -> (StatusCode, serde_json::Value) {
    let summary = match req.summary {
        Some(s) if !s.trim().is_empty() => s,
        _ => return error_body(StatusCode::BAD_REQUEST, "summary is required"),
    };

    let ack = ShareAck::echo(req.recipients, req.subject, summary);
    tracing::info!(
        recipients = ack.recipients.len(),
        subject = %ack.subject,
        "Share acknowledged (no delivery)"
    );
    (StatusCode::OK, serde_json::json!(ack))
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(health_inner()))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn upload_handler(upload: TranscriptUpload) -> impl IntoResponse {
    let (status, body) = extract_text_inner(upload).await;
    (status, Json(body))
}

pub async fn summarize_handler(
    State(state): State<Arc<HttpState>>,
    payload: std::result::Result<Json<SummarizeRequest>, JsonRejection>,
) -> impl IntoResponse {
    let (status, body) = match payload {
        Ok(Json(req)) => summarize_inner(state.completion.as_ref(), req).await,
        Err(rejection) => rejection_to_http(rejection),
    };
    (status, Json(body))
}

pub async fn share_handler(
    payload: std::result::Result<Json<ShareRequest>, JsonRejection>,
) -> impl IntoResponse {
    let (status, body) = match payload {
        Ok(Json(req)) => share_inner(req),
        Err(rejection) => rejection_to_http(rejection),
    };
    (status, Json(body))
}

// ============================================================================
// Helpers
// ============================================================================

/// Map a JSON extractor rejection onto the standard error body, keeping its status.
pub fn rejection_to_http(rejection: JsonRejection) -> (StatusCode, serde_json::Value) {
    let status = rejection.status();
    tracing::debug!(status = %status, error = %rejection.body_text(), "Rejected JSON payload");
    error_body(status, &rejection.body_text())
}

// ============================================================================
// Unit Tests — call inner functions directly
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use minutes_core::models::ChatMessage;
    use minutes_core::{CompletionError, DEFAULT_INSTRUCTION};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Backend double that records every prompt it receives.
    struct RecordingBackend {
        reply: Option<String>,
        fail: bool,
        calls: AtomicUsize,
        last_messages: Mutex<Vec<ChatMessage>>,
    }

    impl RecordingBackend {
        fn replying(reply: Option<&str>) -> Self {
            Self {
                reply: reply.map(str::to_string),
                fail: false,
                calls: AtomicUsize::new(0),
                last_messages: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::replying(None)
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionBackend for RecordingBackend {
        async fn complete(
            &self,
            messages: &[ChatMessage],
        ) -> std::result::Result<Option<String>, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_messages.lock().unwrap() = messages.to_vec();
            if self.fail {
                return Err(CompletionError::Api {
                    code: 503,
                    message: "upstream unavailable".to_string(),
                });
            }
            Ok(self.reply.clone())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn summarize_req(transcript: Option<&str>, prompt: Option<&str>) -> SummarizeRequest {
        SummarizeRequest {
            transcript_text: transcript.map(str::to_string),
            prompt: prompt.map(str::to_string),
        }
    }

    // ========================================================================
    // health / version
    // ========================================================================
    #[test]
    fn test_health_inner_static() {
        assert_eq!(health_inner(), serde_json::json!({ "ok": true }));
        // no state, so repeated calls are identical
        assert_eq!(health_inner(), health_inner());
    }

    #[test]
    fn test_version_inner_pure() {
        let v = version_inner();
        assert_eq!(v["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(v["service"], "minutes");
    }

    // ========================================================================
    // summarize
    // ========================================================================
    #[tokio::test]
    async fn test_summarize_blank_transcript_never_calls_backend() {
        let backend = RecordingBackend::replying(Some("unused"));

        for transcript in [None, Some(""), Some("   "), Some("\n\t ")] {
            let (status, body) = summarize_inner(&backend, summarize_req(transcript, None)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "transcriptText is required");
            assert_eq!(body["status"], "error");
        }

        assert_eq!(backend.calls(), 0, "backend must not be called for blank input");
    }

    #[tokio::test]
    async fn test_summarize_prompt_contains_default_instruction_and_verbatim_transcript() {
        let backend = RecordingBackend::replying(Some("- Ship on Friday"));
        let transcript = "Alice: let's ship by Friday.";

        let (status, body) = summarize_inner(&backend, summarize_req(Some(transcript), None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"], "- Ship on Friday");
        assert_eq!(backend.calls(), 1);

        let messages = backend.last_messages.lock().unwrap().clone();
        assert_eq!(messages.len(), 2);
        let user = &messages[1].content;
        assert!(user.contains(DEFAULT_INSTRUCTION), "prompt: {}", user);
        assert!(user.contains(transcript), "prompt: {}", user);
    }

    #[tokio::test]
    async fn test_summarize_uses_custom_instruction() {
        let backend = RecordingBackend::replying(Some("ok"));

        let (status, _) = summarize_inner(
            &backend,
            summarize_req(Some("Bob: budget approved"), Some("Only action items")),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let messages = backend.last_messages.lock().unwrap().clone();
        assert!(messages[1].content.starts_with("Instruction: Only action items\n\n"));
        assert!(!messages[1].content.contains(DEFAULT_INSTRUCTION));
    }

    #[tokio::test]
    async fn test_summarize_empty_completion_yields_empty_summary() {
        let backend = RecordingBackend::replying(None);

        let (status, body) =
            summarize_inner(&backend, summarize_req(Some("Carol: nothing new"), None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"], "");
    }

    #[tokio::test]
    async fn test_summarize_provider_failure_is_generic_500() {
        let backend = RecordingBackend::failing();

        let (status, body) =
            summarize_inner(&backend, summarize_req(Some("Dan: status update"), None)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Summarization failed");
        assert_eq!(backend.calls(), 1, "no retry on failure");
    }

    // ========================================================================
    // share
    // ========================================================================
    #[test]
    fn test_share_echoes_payload() {
        let req = ShareRequest {
            recipients: Some(vec!["a@x.com".to_string()]),
            subject: Some("S".to_string()),
            summary: Some("Hello".to_string()),
        };

        let (status, body) = share_inner(req);

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["recipients"], serde_json::json!(["a@x.com"]));
        assert_eq!(body["subject"], "S");
        assert_eq!(body["summary"], "Hello");
        assert_eq!(body["message"], "Summary shared successfully (no email sent).");
    }

    #[test]
    fn test_share_defaults_recipients_and_subject() {
        let req = ShareRequest {
            summary: Some("Notes".to_string()),
            ..Default::default()
        };

        let (status, body) = share_inner(req);

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recipients"], serde_json::json!([]));
        assert_eq!(body["subject"], "Meeting Summary");
    }

    #[test]
    fn test_share_blank_summary_is_rejected() {
        for summary in [None, Some(""), Some("  \n")] {
            let req = ShareRequest {
                recipients: Some(vec!["a@x.com".to_string()]),
                subject: None,
                summary: summary.map(str::to_string),
            };
            let (status, body) = share_inner(req);
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "summary is required");
        }
    }

    #[test]
    fn test_error_body_matches_error_response_shape() {
        let (status, body) = error_body(StatusCode::BAD_REQUEST, "summary is required");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            serde_json::json!({ "error": "summary is required", "status": "error" })
        );
        assert_eq!(
            body,
            serde_json::to_value(ErrorResponse::new("summary is required")).unwrap()
        );
    }

    // ========================================================================
    // extract
    // ========================================================================
    #[tokio::test]
    async fn test_extract_text_returns_content_and_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = tempfile::NamedTempFile::new_in(dir.path()).unwrap();
        std::io::Write::write_all(&mut file, "Alice: hi\nBob: hello\n".as_bytes()).unwrap();
        let path = file.path().to_path_buf();

        let upload = TranscriptUpload::new(file, Some("call.txt".to_string()), 21);
        let (status, body) = extract_text_inner(upload).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "Alice: hi\nBob: hello\n");
        assert!(!path.exists(), "temporary file must be removed");
    }

    #[tokio::test]
    async fn test_extract_text_replaces_invalid_utf8() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"caf\xff ok").unwrap();
        let path = file.path().to_path_buf();

        let (status, body) = extract_text_inner(TranscriptUpload::new(file, None, 7)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "caf\u{FFFD} ok");
        assert!(!path.exists());
    }

    #[test]
    fn test_cors_layer_accepts_lists_and_wildcard() {
        // construction must not panic for either shape, including bad entries
        let _ = cors_layer(&["*".to_string()]);
        let _ = cors_layer(&["http://localhost:3000".to_string(), "bad\norigin".to_string()]);
    }
}
