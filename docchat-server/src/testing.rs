//! In-memory stand-ins for the injected services, used by handler tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use tower::ServiceExt;

use docchat_core::{AuthenticatedUser, Data, IdentityProvider, TurnStore};
use docchat_database::model::conversation::{ConversationTurn, NewTurn};
use docchat_llm::{GenerationBackend, ResponseGenerator};
use docchat_pdf::{ExtractError, PdfExtractBackend, TextExtractor};

use crate::app::{DEFAULT_MAX_PDF_BYTES, router};

#[derive(Default)]
pub struct FakeIdentity {
    users: Mutex<HashMap<String, String>>,
    outage: AtomicBool,
    calls: AtomicUsize,
}

impl FakeIdentity {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn verify(&self, token: &str) -> anyhow::Result<Option<AuthenticatedUser>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.outage.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused");
        }

        Ok(self.users.lock().unwrap().get(token).map(|id| AuthenticatedUser {
            id: id.clone(),
            email: None,
        }))
    }
}

#[derive(Default)]
pub struct FakeStore {
    turns: Mutex<Vec<ConversationTurn>>,
    inserted: Mutex<Vec<NewTurn>>,
    attempts: AtomicUsize,
    fail: AtomicBool,
}

impl FakeStore {
    pub fn inserted(&self) -> Vec<NewTurn> {
        self.inserted.lock().unwrap().clone()
    }

    pub fn insert_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TurnStore for FakeStore {
    async fn insert_turn(&self, turn: &NewTurn) -> anyhow::Result<ConversationTurn> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("relation \"chat_history\" does not exist");
        }

        self.inserted.lock().unwrap().push(turn.clone());
        let stored = turn.clone().into_turn(0);
        self.turns.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn list_turns(&self, user_id: &str) -> anyhow::Result<Vec<ConversationTurn>> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("connection pool timed out");
        }

        let mut turns: Vec<_> = self
            .turns
            .lock()
            .unwrap()
            .iter()
            .filter(|turn| turn.user_id == user_id)
            .cloned()
            .collect();
        turns.sort_by_key(|turn| turn.created_at);
        Ok(turns)
    }
}

#[derive(Default)]
pub struct FakeBackend {
    prompts: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl FakeBackend {
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_owned());
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("503 Service Unavailable");
        }
        Ok("Paris is the capital of France.".to_owned())
    }
}

#[derive(Default)]
pub struct FakeExtractor {
    text: Mutex<String>,
    received: Mutex<Vec<Vec<u8>>>,
    fail: AtomicBool,
}

impl FakeExtractor {
    pub fn received(&self) -> Vec<Vec<u8>> {
        self.received.lock().unwrap().clone()
    }
}

impl TextExtractor for FakeExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        self.received.lock().unwrap().push(bytes.to_vec());
        if self.fail.load(Ordering::SeqCst) {
            return Err(ExtractError::Parse("invalid cross-reference table".to_owned()));
        }
        Ok(self.text.lock().unwrap().clone())
    }
}

pub struct TestHarness {
    pub identity: Arc<FakeIdentity>,
    pub store: Arc<FakeStore>,
    pub backend: Arc<FakeBackend>,
    pub extractor: Arc<FakeExtractor>,
    real_extractor: bool,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            identity: Arc::default(),
            store: Arc::default(),
            backend: Arc::default(),
            extractor: Arc::default(),
            real_extractor: false,
        }
    }

    pub fn with_user(self, token: &str, user_id: &str) -> Self {
        self.identity
            .users
            .lock()
            .unwrap()
            .insert(token.to_owned(), user_id.to_owned());
        self
    }

    pub fn with_identity_outage(self) -> Self {
        self.identity.outage.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_failing_store(self) -> Self {
        self.store.fail.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_failing_backend(self) -> Self {
        self.backend.fail.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_stored_turn(self, user_id: &str, query: &str, reply: &str, created_at: u64) -> Self {
        self.store
            .turns
            .lock()
            .unwrap()
            .push(NewTurn::new(user_id, query, reply, None).into_turn(created_at));
        self
    }

    pub fn with_extracted_text(self, text: &str) -> Self {
        *self.extractor.text.lock().unwrap() = text.to_owned();
        self
    }

    pub fn with_failing_extractor(self) -> Self {
        self.extractor.fail.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_real_extractor(mut self) -> Self {
        self.real_extractor = true;
        self
    }

    fn data(&self) -> Data {
        let extractor = if self.real_extractor {
            Arc::new(PdfExtractBackend::new()) as Arc<dyn TextExtractor>
        } else {
            self.extractor.clone() as Arc<dyn TextExtractor>
        };

        Data {
            identity: self.identity.clone(),
            turns: self.store.clone(),
            generator: ResponseGenerator::new(self.backend.clone()),
            extractor,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.send_with_limit(request, DEFAULT_MAX_PDF_BYTES).await
    }

    pub async fn send_with_limit(&self, request: Request<Body>, max_body_bytes: usize) -> Response {
        router(self.data(), max_body_bytes)
            .oneshot(request)
            .await
            .unwrap()
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_owned())).unwrap()
}

pub async fn read_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
