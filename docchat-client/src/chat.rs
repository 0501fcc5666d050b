//! Conversation state for one chat page.
//!
//! Requests are split into a `begin_*` step that validates and mutates state
//! synchronously and a `complete_*` step fed with the transport result. While
//! a request is outstanding the phase is not [`Phase::Idle`] and every
//! `begin_*` call is a no-op, which is what keeps at most one request in
//! flight.

use std::sync::Arc;

use tracing::{error, warn};

use crate::api::ChatApi;
use crate::message::{Message, messages_from_turns};

/// Shown in place of a reply when the chat request fails.
pub const TRANSPORT_APOLOGY: &str = "Sorry, I encountered an error processing your request.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingExtraction,
    AwaitingResponse,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingSubmission {
    pub prompt: String,
    pub pdf_text: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingUpload {
    pub bytes: Vec<u8>,
}

pub struct ChatInterface {
    api: Arc<dyn ChatApi>,
    messages: Vec<Message>,
    input: String,
    pdf_text: String,
    pdf_name: String,
    phase: Phase,
    last_error: Option<String>,
}

impl ChatInterface {
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self {
            api,
            messages: Vec::new(),
            input: String::new(),
            pdf_text: String::new(),
            pdf_name: String::new(),
            phase: Phase::Idle,
            last_error: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn pdf_text(&self) -> &str {
        &self.pdf_text
    }

    pub fn pdf_name(&self) -> Option<&str> {
        (!self.pdf_name.is_empty()).then_some(self.pdf_name.as_str())
    }

    /// The most recent extraction failure, cleared by the next upload.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        if !self.is_loading() {
            self.input = input.into();
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.is_loading() && !self.input.trim().is_empty()
    }

    /// Replace the conversation with the signed-in user's stored history.
    /// Without a session, or when the history cannot be loaded, the
    /// conversation is left as it was.
    pub async fn mount(&mut self, token: Option<&str>) {
        let Some(token) = token else {
            return;
        };

        match self.api.load_history(token).await {
            Ok(turns) => self.messages = messages_from_turns(&turns),
            Err(e) => warn!(?e, "failed to load chat history"),
        }
    }

    pub fn begin_submit(&mut self) -> Option<PendingSubmission> {
        if !self.can_submit() {
            return None;
        }

        let prompt = std::mem::take(&mut self.input);
        self.messages.push(Message::user(prompt.clone()));
        self.phase = Phase::AwaitingResponse;

        Some(PendingSubmission {
            prompt,
            pdf_text: (!self.pdf_text.is_empty()).then(|| self.pdf_text.clone()),
        })
    }

    pub fn complete_submit(&mut self, result: anyhow::Result<String>) {
        if self.phase != Phase::AwaitingResponse {
            return;
        }

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                error!(?e, "chat request failed");
                TRANSPORT_APOLOGY.to_owned()
            }
        };
        self.messages.push(Message::assistant(reply));
        self.phase = Phase::Idle;
    }

    /// Send the current input. Returns `false` when nothing was sent.
    pub async fn submit(&mut self, token: Option<&str>) -> bool {
        let Some(pending) = self.begin_submit() else {
            return false;
        };

        let result = self
            .api
            .send_chat(token, &pending.prompt, pending.pdf_text.as_deref())
            .await;
        self.complete_submit(result);
        true
    }

    pub fn begin_upload(
        &mut self,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Option<PendingUpload> {
        if self.is_loading() {
            return None;
        }

        self.pdf_name = file_name.into();
        self.last_error = None;
        self.phase = Phase::AwaitingExtraction;

        Some(PendingUpload { bytes })
    }

    /// On failure the previous context stays active and the error is kept
    /// for display.
    pub fn complete_upload(&mut self, result: anyhow::Result<String>) {
        if self.phase != Phase::AwaitingExtraction {
            return;
        }

        match result {
            Ok(text) => self.pdf_text = text,
            Err(e) => {
                error!(?e, "error parsing PDF");
                self.last_error = Some(format!("{e:#}"));
            }
        }
        self.phase = Phase::Idle;
    }

    /// Upload a selected file and make its text the active context.
    pub async fn select_file(&mut self, file_name: impl Into<String>, bytes: Vec<u8>) -> bool {
        let Some(pending) = self.begin_upload(file_name, bytes) else {
            return false;
        };

        let result = self.api.parse_pdf(pending.bytes).await;
        self.complete_upload(result);
        true
    }

    pub fn clear_pdf(&mut self) {
        if self.is_loading() {
            return;
        }

        self.pdf_text.clear();
        self.pdf_name.clear();
    }

    pub fn empty_state_hint(&self) -> Option<&'static str> {
        if !self.messages.is_empty() {
            return None;
        }

        Some(if self.pdf_text.is_empty() {
            "Upload a PDF to start chatting"
        } else {
            "Ask a question about the PDF"
        })
    }

    pub fn upload_label(&self) -> String {
        match self.pdf_name() {
            Some(name) => format!("Change PDF ({name})"),
            None => "Upload PDF".to_owned(),
        }
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_loading() { "Sending..." } else { "Send" }
    }
}
