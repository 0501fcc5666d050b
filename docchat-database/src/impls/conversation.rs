use anyhow::Context as _;
use tracing::warn;

use docchat_utils::time::now_unix_secs;

use crate::{
    database::Database,
    model::conversation::{ConversationTurn, NewTurn},
};

#[derive(sqlx::FromRow)]
struct ConversationTurnRow {
    user_id: String,
    user_query: String,
    chatbot_response: String,
    pdf_context: Option<String>,
    created_at: i64,
}

/// Persist one turn and retire the user's cached history.
pub async fn insert_conversation_turn(
    db: &Database,
    turn: &NewTurn,
) -> anyhow::Result<ConversationTurn> {
    let created_at = now_unix_secs();
    let created_at_i64 = i64::try_from(created_at).context("created_at out of i64 range")?;

    sqlx::query(
        "INSERT INTO chat_history (user_id, user_query, chatbot_response, pdf_context, created_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(&turn.user_id)
    .bind(&turn.user_query)
    .bind(&turn.chatbot_response)
    .bind(turn.pdf_context.as_deref())
    .bind(created_at_i64)
    .execute(db.pool())
    .await
    .context("failed to insert chat_history row")?;

    if let Err(e) = db.cache().bump_history_generation(&turn.user_id).await {
        warn!(?e, user_id = %turn.user_id, "failed to invalidate history cache");
    }

    Ok(turn.clone().into_turn(created_at))
}

/// Every turn for `user_id`, oldest first.
pub async fn list_conversation_turns(
    db: &Database,
    user_id: &str,
) -> anyhow::Result<Vec<ConversationTurn>> {
    db.cache()
        .get_or_load_history(user_id, || load_conversation_turns(db, user_id))
        .await
}

async fn load_conversation_turns(
    db: &Database,
    user_id: &str,
) -> anyhow::Result<Vec<ConversationTurn>> {
    let rows: Vec<ConversationTurnRow> = sqlx::query_as(
        "SELECT user_id, user_query, chatbot_response, pdf_context, created_at
         FROM chat_history
         WHERE user_id = $1
         ORDER BY created_at ASC, id ASC",
    )
    .bind(user_id)
    .fetch_all(db.pool())
    .await
    .context("failed to load chat_history rows")?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(ConversationTurn {
            user_id: row.user_id,
            user_query: row.user_query,
            chatbot_response: row.chatbot_response,
            pdf_context: row.pdf_context,
            created_at: u64::try_from(row.created_at)
                .context("created_at row out of u64 range")?,
        });
    }

    Ok(out)
}
