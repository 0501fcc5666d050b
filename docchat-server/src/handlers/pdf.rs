use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use serde::{Deserialize, Serialize};
use tracing::info;

use docchat_core::Data;
use docchat_pdf::extract_on_blocking_pool;

use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct PdfTextResponse {
    pub text: String,
}

/// `POST /api/parse-pdf`: raw document bytes in, extracted text out.
pub async fn parse_pdf(
    State(data): State<Data>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<PdfTextResponse>, ApiError> {
    let body = body?;
    if body.is_empty() {
        return Err(ApiError::EmptyPdf);
    }

    let size = body.len();
    let text = extract_on_blocking_pool(data.extractor.clone(), body.to_vec()).await?;
    info!(bytes = size, chars = text.len(), "parsed uploaded PDF");

    Ok(Json(PdfTextResponse { text }))
}
