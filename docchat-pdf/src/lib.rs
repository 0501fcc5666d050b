//! Plain-text extraction from uploaded PDF bytes.
//!
//! The [`TextExtractor`] trait is the seam the server depends on;
//! [`PdfExtractBackend`] is the production implementation built on the
//! `pdf-extract` crate.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no PDF data provided")]
    Empty,
    #[error("failed to parse PDF: {0}")]
    Parse(String),
    #[error("PDF parser panicked")]
    Panicked,
    #[error("extraction task failed: {0}")]
    Task(String),
}

/// Converts raw document bytes into plain text.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractError>;
}

/// [`TextExtractor`] backed by `pdf-extract`. No content-type or size checks
/// are made; anything that fails to parse is an [`ExtractError::Parse`].
#[derive(Clone, Copy, Debug, Default)]
pub struct PdfExtractBackend;

impl PdfExtractBackend {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for PdfExtractBackend {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        if bytes.is_empty() {
            return Err(ExtractError::Empty);
        }

        // pdf-extract panics on some malformed inputs
        let result = catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(bytes)
        }))
        .map_err(|_| ExtractError::Panicked)?;

        let text = result.map_err(|e| ExtractError::Parse(format!("{e:?}")))?;
        debug!(bytes = bytes.len(), chars = text.len(), "extracted PDF text");
        Ok(text)
    }
}

/// Run an extractor on the blocking pool so parsing never stalls the runtime.
pub async fn extract_on_blocking_pool(
    extractor: Arc<dyn TextExtractor>,
    bytes: Vec<u8>,
) -> Result<String, ExtractError> {
    tokio::task::spawn_blocking(move || extractor.extract_text(&bytes))
        .await
        .map_err(|e| {
            if e.is_panic() {
                ExtractError::Panicked
            } else {
                ExtractError::Task(e.to_string())
            }
        })?
}
