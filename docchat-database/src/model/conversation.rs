use serde::{Deserialize, Serialize};

/// One persisted exchange: the user's query and the assistant's reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub user_id: String,
    pub user_query: String,
    pub chatbot_response: String,
    pub pdf_context: Option<String>,
    pub created_at: u64,
}

/// Insert payload for [`ConversationTurn`]; the timestamp is assigned on write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTurn {
    pub user_id: String,
    pub user_query: String,
    pub chatbot_response: String,
    pub pdf_context: Option<String>,
}

impl NewTurn {
    /// Build a turn, storing an empty context as `NULL`.
    pub fn new(
        user_id: impl Into<String>,
        user_query: impl Into<String>,
        chatbot_response: impl Into<String>,
        pdf_context: Option<&str>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            user_query: user_query.into(),
            chatbot_response: chatbot_response.into(),
            pdf_context: pdf_context
                .filter(|context| !context.is_empty())
                .map(str::to_owned),
        }
    }

    pub fn into_turn(self, created_at: u64) -> ConversationTurn {
        ConversationTurn {
            user_id: self.user_id,
            user_query: self.user_query,
            chatbot_response: self.chatbot_response,
            pdf_context: self.pdf_context,
            created_at,
        }
    }
}
