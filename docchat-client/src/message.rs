use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// A rendered chat bubble. Only lives in the interface; turns are what get
/// persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A persisted turn as returned by `GET /api/history`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRecord {
    pub user_query: String,
    pub chatbot_response: String,
    #[serde(default)]
    pub pdf_context: Option<String>,
    pub created_at: u64,
}

/// Expand turns into alternating user/assistant messages, oldest first.
pub fn messages_from_turns(turns: &[TurnRecord]) -> Vec<Message> {
    let mut ordered: Vec<&TurnRecord> = turns.iter().collect();
    // stable, so equal timestamps keep server order
    ordered.sort_by_key(|turn| turn.created_at);

    ordered
        .into_iter()
        .flat_map(|turn| {
            [
                Message::user(turn.user_query.clone()),
                Message::assistant(turn.chatbot_response.clone()),
            ]
        })
        .collect()
}
