use anyhow::Context as _;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use docchat_utils::bearer::bearer_header;
use docchat_utils::env::env_string;

/// An authenticated session issued by the identity backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub user_id: String,
    pub email: Option<String>,
}

/// Sign-in and sign-up against the identity backend.
#[async_trait]
pub trait AuthClient: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> anyhow::Result<Session>;

    /// `Ok(None)` when the account was created but must be confirmed before a
    /// session is issued.
    async fn sign_up(&self, email: &str, password: &str) -> anyhow::Result<Option<Session>>;

    async fn sign_out(&self, session: &Session) -> anyhow::Result<()>;
}

/// Holds the cached session and notifies subscribers on every change.
#[derive(Debug)]
pub struct SessionStore {
    tx: watch::Sender<Option<Session>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.tx.borrow().as_ref().map(|session| session.access_token.clone())
    }

    pub fn set(&self, session: Option<Session>) {
        self.tx.send_replace(session);
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenReply {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<UserReply>,
    // sign-up without a session returns the user at the top level
    #[serde(default)]
    id: Option<String>,
}

#[derive(Deserialize)]
struct UserReply {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl TokenReply {
    fn into_session(self) -> Option<Session> {
        let access_token = self.access_token?;
        let user = self.user?;
        Some(Session {
            access_token,
            user_id: user.id,
            email: user.email,
        })
    }
}

/// Supabase GoTrue compatible [`AuthClient`].
#[derive(Clone, Debug)]
pub struct SupabaseAuth {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseAuth {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            anon_key: anon_key.into(),
        }
    }

    pub fn from_env(http: reqwest::Client) -> anyhow::Result<Self> {
        let base_url = env_string("SUPABASE_URL").context("SUPABASE_URL is not set")?;
        let anon_key = env_string("SUPABASE_ANON_KEY").context("SUPABASE_ANON_KEY is not set")?;

        Ok(Self::new(http, base_url, anon_key))
    }

    async fn post_credentials(
        &self,
        url: String,
        email: &str,
        password: &str,
    ) -> anyhow::Result<TokenReply> {
        self.http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&Credentials { email, password })
            .send()
            .await
            .context("failed to reach identity backend")?
            .error_for_status()
            .context("identity backend rejected credentials")?
            .json()
            .await
            .context("failed to decode identity backend reply")
    }
}

#[async_trait]
impl AuthClient for SupabaseAuth {
    async fn sign_in(&self, email: &str, password: &str) -> anyhow::Result<Session> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        self.post_credentials(url, email, password)
            .await?
            .into_session()
            .context("identity backend returned no session")
    }

    async fn sign_up(&self, email: &str, password: &str) -> anyhow::Result<Option<Session>> {
        let url = format!("{}/auth/v1/signup", self.base_url);
        let reply = self.post_credentials(url, email, password).await?;
        if reply.access_token.is_none() && reply.user.is_none() && reply.id.is_none() {
            anyhow::bail!("identity backend returned neither a user nor a session");
        }

        Ok(reply.into_session())
    }

    async fn sign_out(&self, session: &Session) -> anyhow::Result<()> {
        self.http
            .post(format!("{}/auth/v1/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .header(
                reqwest::header::AUTHORIZATION,
                bearer_header(&session.access_token),
            )
            .send()
            .await
            .context("failed to reach identity backend")?
            .error_for_status()
            .context("identity backend rejected sign-out")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(token: &str) -> Session {
        Session {
            access_token: token.to_owned(),
            user_id: "u1".to_owned(),
            email: None,
        }
    }

    #[tokio::test]
    async fn subscribers_see_every_change() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();
        assert!(rx.borrow_and_update().is_none());

        store.set(Some(session("t1")));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref().map(|s| s.access_token.as_str()), Some("t1"));

        store.set(None);
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
        assert_eq!(store.access_token(), None);
    }

    #[test]
    fn password_grant_reply_becomes_session() {
        let reply: TokenReply = serde_json::from_str(
            r#"{"access_token":"jwt","token_type":"bearer","expires_in":3600,
                "user":{"id":"8d0c","email":"a@b.c"}}"#,
        )
        .unwrap();

        assert_eq!(
            reply.into_session(),
            Some(Session {
                access_token: "jwt".to_owned(),
                user_id: "8d0c".to_owned(),
                email: Some("a@b.c".to_owned()),
            })
        );
    }

    #[test]
    fn unconfirmed_sign_up_has_no_session() {
        let reply: TokenReply =
            serde_json::from_str(r#"{"id":"8d0c","email":"a@b.c","confirmation_sent_at":"now"}"#)
                .unwrap();
        assert!(reply.id.is_some());
        assert_eq!(reply.into_session(), None);
    }
}
