use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use docchat_core::Data;
use docchat_database::model::conversation::NewTurn;

use crate::auth::authenticate;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub pdf_text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// `POST /api/chat`
///
/// Authentication runs before the body is looked at, so an unauthenticated
/// caller never reaches the generator or the store.
pub async fn chat(
    State(data): State<Data>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let user = authenticate(&data, &headers).await?;

    let request = parse_chat_request(&body?)?;
    let prompt = request
        .prompt
        .filter(|prompt| !prompt.trim().is_empty())
        .ok_or(ApiError::MissingPrompt)?;
    let context = request.pdf_text.as_deref().filter(|text| !text.is_empty());

    let outcome = data.generator.generate(&prompt, context).await;
    let fallback = outcome.is_fallback();
    let response = outcome.into_text();

    let turn = NewTurn::new(user.id.as_str(), prompt.as_str(), response.as_str(), context);
    if let Err(e) = data.turns.insert_turn(&turn).await {
        error!(?e, user_id = %user.id, "failed to persist conversation turn");
    }

    info!(
        user_id = %user.id,
        with_context = context.is_some(),
        fallback,
        "chat turn completed"
    );

    Ok(Json(ChatResponse { response }))
}

fn parse_chat_request(body: &[u8]) -> Result<ChatRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ChatRequest::default());
    }

    serde_json::from_slice(body).map_err(|e| ApiError::InvalidBody(e.to_string()))
}
