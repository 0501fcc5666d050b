use anyhow::Context as _;
use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, request::ChatMessageRequest},
};

use docchat_utils::env::{env_string, env_string_or, env_u64};

use crate::backend::GenerationBackend;

#[derive(Clone, Debug)]
pub struct OllamaBackend {
    client: Ollama,
    model: String,
}

impl OllamaBackend {
    pub fn new(host: impl Into<String>, port: u16, model: impl Into<String>) -> Self {
        Self {
            client: Ollama::new(host.into(), port),
            model: model.into(),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let host = env_string_or("OLLAMA_HOST", "http://127.0.0.1");
        let port = u16::try_from(env_u64("OLLAMA_PORT", 11434)).context("OLLAMA_PORT out of range")?;
        let model = env_string("OLLAMA_MODEL").unwrap_or_else(|| "llama3.1:8b".to_owned());

        Ok(Self::new(host, port, model))
    }
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let request =
            ChatMessageRequest::new(self.model.clone(), vec![ChatMessage::user(prompt.to_owned())]);
        let response = self
            .client
            .send_chat_messages(request)
            .await
            .context("failed to get ollama chat response")?;

        Ok(response.message.content.trim().to_owned())
    }
}
