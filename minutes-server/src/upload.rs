//! Transcript upload constraints
//!
//! `TranscriptUpload` is an axum extractor: it runs before the upload handler
//! and rejects anything that is not a single `text/plain` file within the
//! configured size. Accepted bytes are streamed into a `NamedTempFile`, which
//! removes itself when dropped, so the file never outlives the request.

use std::path::Path;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::multipart::MultipartError;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use minutes_core::UploadConfig;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::http::{ErrorResponse, HttpState};

pub const TEXT_PLAIN: &str = "text/plain";

/// A validated transcript file held in transient storage.
#[derive(Debug)]
pub struct TranscriptUpload {
    file: NamedTempFile,
    pub file_name: Option<String>,
    pub size: usize,
}

impl TranscriptUpload {
    pub fn new(file: NamedTempFile, file_name: Option<String>, size: usize) -> Self {
        Self {
            file,
            file_name,
            size,
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn into_temp_file(self) -> NamedTempFile {
        self.file
    }
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("No file uploaded")]
    Missing,

    #[error("Only .txt files are allowed.")]
    UnsupportedType(String),

    #[error("Unexpected field")]
    UnexpectedField,

    #[error("File too large")]
    TooLarge { limit: usize },

    #[error("{message}")]
    Multipart { status: StatusCode, message: String },

    #[error("Could not read file")]
    Storage(#[from] std::io::Error),
}

impl UploadError {
    fn from_multipart(err: MultipartError, limit: usize) -> Self {
        let status = err.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::TooLarge { limit };
        }
        Self::Multipart {
            status,
            message: err.body_text(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Missing | Self::UnsupportedType(_) | Self::UnexpectedField => {
                StatusCode::BAD_REQUEST
            }
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Multipart { status, .. } => *status,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        match &self {
            Self::Storage(e) => tracing::error!(error = %e, "Failed to store uploaded transcript"),
            Self::UnsupportedType(content_type) => {
                tracing::warn!(content_type = %content_type, "Rejected non-text upload")
            }
            Self::TooLarge { limit } => tracing::warn!(limit, "Rejected oversized upload"),
            other => tracing::debug!(error = %other, "Rejected upload"),
        }
        (self.status(), Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

#[async_trait]
impl FromRequest<Arc<HttpState>> for TranscriptUpload {
    type Rejection = UploadError;

    async fn from_request(req: Request, state: &Arc<HttpState>) -> Result<Self, Self::Rejection> {
        // A body that is not multipart at all carries no file.
        let multipart = Multipart::from_request(req, state).await.map_err(|e| {
            tracing::debug!(error = %e, "Upload request is not multipart");
            UploadError::Missing
        })?;
        receive_transcript(multipart, &state.config.upload).await
    }
}

/// Strip parameters and compare case-insensitively against `text/plain`.
pub fn is_plain_text(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim().eq_ignore_ascii_case(TEXT_PLAIN))
        .unwrap_or(false)
}

/// Pull the transcript file out of a multipart body.
///
/// Only file parts named `config.field_name` are considered; other parts are
/// skipped. The content type is checked before any file bytes are read. A
/// part without a `Content-Type` header is treated as `text/plain`.
pub async fn receive_transcript(
    mut multipart: Multipart,
    config: &UploadConfig,
) -> Result<TranscriptUpload, UploadError> {
    let mut upload: Option<TranscriptUpload> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::from_multipart(e, config.max_file_bytes))?
    {
        if field.name() != Some(config.field_name.as_str()) || field.file_name().is_none() {
            continue;
        }
        if upload.is_some() {
            return Err(UploadError::UnexpectedField);
        }

        let content_type = field.content_type().unwrap_or(TEXT_PLAIN).to_string();
        if !is_plain_text(&content_type) {
            return Err(UploadError::UnsupportedType(content_type));
        }

        let file_name = field.file_name().map(str::to_string);
        let file = tempfile::Builder::new()
            .prefix("transcript-")
            .suffix(".txt")
            .tempfile_in(config.resolved_temp_dir())?;
        // The NamedTempFile keeps ownership of the path; writes go through an async handle.
        let mut writer = tokio::fs::File::from_std(file.reopen()?);

        let mut size = 0usize;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| UploadError::from_multipart(e, config.max_file_bytes))?
        {
            size += chunk.len();
            if size > config.max_file_bytes {
                return Err(UploadError::TooLarge {
                    limit: config.max_file_bytes,
                });
            }
            writer.write_all(&chunk).await?;
        }
        writer.flush().await?;
        drop(writer);

        tracing::debug!(
            file_name = file_name.as_deref().unwrap_or("<unnamed>"),
            size,
            path = %file.path().display(),
            "Stored uploaded transcript"
        );
        upload = Some(TranscriptUpload::new(file, file_name, size));
    }

    upload.ok_or(UploadError::Missing)
}
