use anyhow::Context as _;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use docchat_utils::env::{env_string, env_string_or};

use crate::backend::GenerationBackend;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-pro";

/// Google Generative Language `generateContent` client.
#[derive(Clone, Debug)]
pub struct GeminiBackend {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiBackend {
    pub fn new(
        http: reqwest::Client,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn from_env(http: reqwest::Client) -> anyhow::Result<Self> {
        let api_key = env_string("GEMINI_API_KEY").context("GEMINI_API_KEY is not set")?;
        let api_base = env_string_or("GEMINI_API_BASE", DEFAULT_API_BASE);
        let model = env_string_or("GEMINI_MODEL", DEFAULT_MODEL);

        Ok(Self::new(http, api_base, api_key, model))
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let body = GenerateContentRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to reach gemini")?
            .error_for_status()
            .context("gemini rejected the request")?;

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .context("failed to decode gemini response")?;

        candidate_text(parsed)
    }
}

fn candidate_text(response: GenerateContentResponse) -> anyhow::Result<String> {
    let content = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .context("gemini returned no candidates")?;

    Ok(content
        .parts
        .into_iter()
        .map(|part| part.text)
        .collect::<Vec<_>>()
        .concat())
}
