use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use docchat_utils::bearer::bearer_header;
use docchat_utils::env::env_string;

/// A caller whose bearer credential the identity backend accepted.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AuthenticatedUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Validates bearer credentials.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` when the backend rejects the token; `Err` when it could not
    /// be asked.
    async fn verify(&self, token: &str) -> anyhow::Result<Option<AuthenticatedUser>>;
}

/// Supabase GoTrue compatible identity backend.
#[derive(Clone, Debug)]
pub struct SupabaseIdentity {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseIdentity {
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

    fn user_endpoint(&self) -> String {
        format!("{}/auth/v1/user", self.base_url)
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn verify(&self, token: &str) -> anyhow::Result<Option<AuthenticatedUser>> {
        let response = self
            .http
            .get(self.user_endpoint())
            .header("apikey", &self.anon_key)
            .header(reqwest::header::AUTHORIZATION, bearer_header(token))
            .send()
            .await
            .context("failed to reach identity backend")?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!(status = %response.status(), "identity backend rejected token");
                Ok(None)
            }
            status if status.is_success() => {
                let user = response
                    .json::<AuthenticatedUser>()
                    .await
                    .context("failed to decode identity backend user")?;
                Ok(Some(user))
            }
            status => anyhow::bail!("identity backend returned unexpected status {status}"),
        }
    }
}
