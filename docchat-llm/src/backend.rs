use async_trait::async_trait;

/// A hosted or local model that turns a finished prompt into a completion.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}
