use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use docchat_core::Data;
use docchat_database::model::conversation::ConversationTurn;

use crate::auth::authenticate;
use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub turns: Vec<ConversationTurn>,
}

/// `GET /api/history`: the caller's turns, oldest first.
pub async fn history(
    State(data): State<Data>,
    headers: HeaderMap,
) -> Result<Json<HistoryResponse>, ApiError> {
    let user = authenticate(&data, &headers).await?;
    let turns = data.turns.list_turns(&user.id).await?;

    Ok(Json(HistoryResponse { turns }))
}
