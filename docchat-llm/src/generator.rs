use std::sync::Arc;

use anyhow::bail;
use tracing::{info, warn};

use docchat_utils::env::env_string_or;

use crate::{
    backend::GenerationBackend,
    gemini::GeminiBackend,
    ollama::OllamaBackend,
    prompt::{FALLBACK_REPLY, build_prompt},
};

/// Result of a generation call. Failures are soft: the caller still gets
/// text to show, but can tell the two apart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerationOutcome {
    Generated(String),
    Fallback { reason: String },
}

impl GenerationOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// The text to return to the user.
    pub fn into_text(self) -> String {
        match self {
            Self::Generated(text) => text,
            Self::Fallback { .. } => FALLBACK_REPLY.to_owned(),
        }
    }
}

/// Applies the prompt template and the soft-fail policy on top of a backend.
#[derive(Clone)]
pub struct ResponseGenerator {
    backend: Arc<dyn GenerationBackend>,
}

impl ResponseGenerator {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Select the backend named by `LLM_BACKEND` (`gemini` or `ollama`).
    pub fn from_env(http: reqwest::Client) -> anyhow::Result<Self> {
        let selected = env_string_or("LLM_BACKEND", "gemini").to_ascii_lowercase();
        let backend: Arc<dyn GenerationBackend> = match selected.as_str() {
            "gemini" => Arc::new(GeminiBackend::from_env(http)?),
            "ollama" => Arc::new(OllamaBackend::from_env()?),
            other => bail!("unknown LLM_BACKEND `{other}` (expected `gemini` or `ollama`)"),
        };

        info!(backend = backend.name(), "response generator configured");
        Ok(Self::new(backend))
    }

    pub async fn generate(&self, prompt: &str, context: Option<&str>) -> GenerationOutcome {
        let full_prompt = build_prompt(prompt, context);

        match self.backend.complete(&full_prompt).await {
            Ok(text) => GenerationOutcome::Generated(text),
            Err(e) => {
                warn!(?e, backend = self.backend.name(), "generation failed; using fallback reply");
                GenerationOutcome::Fallback {
                    reason: format!("{e:#}"),
                }
            }
        }
    }
}

impl std::fmt::Debug for ResponseGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseGenerator")
            .field("backend", &self.backend.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct RecordingBackend {
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl GenerationBackend for RecordingBackend {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_owned());
            if self.fail {
                anyhow::bail!("quota exceeded");
            }
            Ok("Paris is the capital of France.".to_owned())
        }
    }

    #[tokio::test]
    async fn sends_raw_prompt_without_context() {
        let backend = Arc::new(RecordingBackend::default());
        let generator = ResponseGenerator::new(backend.clone());

        let outcome = generator.generate("What is the capital of France?", None).await;

        assert_eq!(
            outcome,
            GenerationOutcome::Generated("Paris is the capital of France.".to_owned())
        );
        assert_eq!(
            *backend.prompts.lock().unwrap(),
            vec!["What is the capital of France?".to_owned()]
        );
    }

    #[tokio::test]
    async fn wraps_prompt_when_context_present() {
        let backend = Arc::new(RecordingBackend::default());
        let generator = ResponseGenerator::new(backend.clone());

        generator.generate("Summarize", Some("chapter one")).await;

        let prompts = backend.prompts.lock().unwrap();
        assert_eq!(prompts[0], "Context: chapter one\n\nQuestion: Summarize\nAnswer:");
    }

    #[tokio::test]
    async fn backend_failure_becomes_fallback_reply() {
        let backend = Arc::new(RecordingBackend {
            fail: true,
            ..Default::default()
        });
        let generator = ResponseGenerator::new(backend);

        let outcome = generator.generate("hi", None).await;

        assert!(outcome.is_fallback());
        assert_eq!(outcome.into_text(), FALLBACK_REPLY);
    }
}
