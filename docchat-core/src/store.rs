use async_trait::async_trait;

use docchat_database::{
    Database,
    impls::conversation::{insert_conversation_turn, list_conversation_turns},
    model::conversation::{ConversationTurn, NewTurn},
};

/// Where conversation turns are written and read back.
#[async_trait]
pub trait TurnStore: Send + Sync {
    async fn insert_turn(&self, turn: &NewTurn) -> anyhow::Result<ConversationTurn>;

    /// All turns for a user in creation order.
    async fn list_turns(&self, user_id: &str) -> anyhow::Result<Vec<ConversationTurn>>;
}

#[async_trait]
impl TurnStore for Database {
    async fn insert_turn(&self, turn: &NewTurn) -> anyhow::Result<ConversationTurn> {
        insert_conversation_turn(self, turn).await
    }

    async fn list_turns(&self, user_id: &str) -> anyhow::Result<Vec<ConversationTurn>> {
        list_conversation_turns(self, user_id).await
    }
}
