use anyhow::Context as _;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use docchat_utils::bearer::bearer_header;

use crate::message::TurnRecord;

/// Calls the interface makes against the docchat server.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn send_chat(
        &self,
        token: Option<&str>,
        prompt: &str,
        pdf_text: Option<&str>,
    ) -> anyhow::Result<String>;

    async fn parse_pdf(&self, bytes: Vec<u8>) -> anyhow::Result<String>;

    async fn load_history(&self, token: &str) -> anyhow::Result<Vec<TurnRecord>>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatBody<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pdf_text: Option<&'a str>,
}

#[derive(Deserialize)]
struct ChatReply {
    response: String,
}

#[derive(Deserialize)]
struct PdfReply {
    text: String,
}

#[derive(Deserialize)]
struct HistoryReply {
    turns: Vec<TurnRecord>,
}

#[derive(Clone, Debug)]
pub struct HttpChatApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpChatApi {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn send_chat(
        &self,
        token: Option<&str>,
        prompt: &str,
        pdf_text: Option<&str>,
    ) -> anyhow::Result<String> {
        let mut request = self
            .http
            .post(self.url("/api/chat"))
            .json(&ChatBody { prompt, pdf_text });
        if let Some(token) = token {
            request = request.header(reqwest::header::AUTHORIZATION, bearer_header(token));
        }

        let reply: ChatReply = request
            .send()
            .await
            .context("failed to reach chat endpoint")?
            .error_for_status()
            .context("failed to get response")?
            .json()
            .await
            .context("failed to decode chat reply")?;

        Ok(reply.response)
    }

    async fn parse_pdf(&self, bytes: Vec<u8>) -> anyhow::Result<String> {
        let reply: PdfReply = self
            .http
            .post(self.url("/api/parse-pdf"))
            .header(reqwest::header::CONTENT_TYPE, "application/pdf")
            .body(bytes)
            .send()
            .await
            .context("failed to reach PDF endpoint")?
            .error_for_status()
            .context("failed to parse PDF")?
            .json()
            .await
            .context("failed to decode PDF reply")?;

        Ok(reply.text)
    }

    async fn load_history(&self, token: &str) -> anyhow::Result<Vec<TurnRecord>> {
        let reply: HistoryReply = self
            .http
            .get(self.url("/api/history"))
            .header(reqwest::header::AUTHORIZATION, bearer_header(token))
            .send()
            .await
            .context("failed to reach history endpoint")?
            .error_for_status()
            .context("failed to load chat history")?
            .json()
            .await
            .context("failed to decode chat history")?;

        Ok(reply.turns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_body_omits_missing_context() {
        let body = serde_json::to_value(ChatBody {
            prompt: "hi",
            pdf_text: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"prompt": "hi"}));

        let body = serde_json::to_value(ChatBody {
            prompt: "hi",
            pdf_text: Some("ctx"),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"prompt": "hi", "pdfText": "ctx"}));
    }

    #[test]
    fn urls_join_without_double_slash() {
        let api = HttpChatApi::new(reqwest::Client::new(), "http://localhost:3000/");
        assert_eq!(api.url("/api/chat"), "http://localhost:3000/api/chat");
    }
}
