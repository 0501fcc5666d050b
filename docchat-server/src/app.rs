use std::any::Any;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use docchat_core::Data;

use crate::error::ApiError;
use crate::handlers::{self, method_not_allowed};

pub const DEFAULT_MAX_PDF_BYTES: usize = 50 * 1024 * 1024;

/// Build the HTTP surface around an already constructed set of services.
pub fn router(data: Data, max_pdf_bytes: usize) -> Router {
    Router::new()
        .route(
            "/api/chat",
            post(handlers::chat::chat).fallback(method_not_allowed),
        )
        .route(
            "/api/parse-pdf",
            post(handlers::pdf::parse_pdf).fallback(method_not_allowed),
        )
        .route(
            "/api/history",
            get(handlers::history::history).fallback(method_not_allowed),
        )
        .route(
            "/health",
            get(handlers::health::health).fallback(method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(max_pdf_bytes))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(data)
}

fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    ApiError::Panicked.into_response()
}
