//! Error type shared by every handler.
//!
//! Each variant maps to one status code and a `{"error": "..."}` body.
//! Internal detail is logged here and never sent to the caller.

use axum::Json;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use docchat_pdf::ExtractError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("missing or invalid bearer credential")]
    Unauthorized,

    #[error("prompt is required")]
    MissingPrompt,

    #[error("request body is not valid JSON for this endpoint: {0}")]
    InvalidBody(String),

    #[error("no PDF data provided")]
    EmptyPdf,

    #[error("request body exceeds the configured limit")]
    BodyTooLarge,

    #[error("failed to read request body: {0}")]
    UnreadableBody(String),

    #[error("PDF extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("request handler panicked")]
    Panicked,

    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MissingPrompt
            | Self::InvalidBody(_)
            | Self::EmptyPdf
            | Self::BodyTooLarge
            | Self::UnreadableBody(_) => StatusCode::BAD_REQUEST,
            Self::Extraction(_) | Self::Panicked | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Text placed in the response body.
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed => "Method not allowed",
            Self::Unauthorized => "Unauthorized",
            Self::MissingPrompt => "Prompt is required",
            Self::InvalidBody(_) | Self::UnreadableBody(_) => "Invalid request body",
            Self::BodyTooLarge => "Request body too large",
            Self::EmptyPdf => "No PDF data provided",
            Self::Extraction(_) => "Failed to parse PDF",
            Self::Panicked | Self::Internal(_) => "Internal server error",
        }
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::BodyTooLarge
        } else {
            Self::UnreadableBody(rejection.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Extraction(e) => error!(error = %e, "error parsing PDF"),
            Self::Panicked | Self::Internal(_) => error!(error = %self, "internal server error"),
            _ => {}
        }

        (self.status(), Json(json!({ "error": self.client_message() }))).into_response()
    }
}
