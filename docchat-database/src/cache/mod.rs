#[cfg(test)]
mod memory_store;
mod noop_store;
mod redis_store;

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

#[cfg(test)]
use memory_store::MemoryCacheStore;
use noop_store::NoopCacheStore;
use redis_store::RedisCacheStore;

pub const DEFAULT_HISTORY_CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
enum CacheBackend {
    Disabled(NoopCacheStore),
    Redis(RedisCacheStore),
    #[cfg(test)]
    Memory(MemoryCacheStore),
}

/// Read-through JSON cache in front of the database.
///
/// Cache failures never fail a request: reads fall back to the loader and
/// writes are logged and dropped.
#[derive(Clone, Debug)]
pub struct CacheService {
    key_prefix: String,
    backend: CacheBackend,
    history_ttl: Duration,
}

impl CacheService {
    pub fn disabled(prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Disabled(NoopCacheStore),
            history_ttl: DEFAULT_HISTORY_CACHE_TTL,
        }
    }

    pub fn redis(redis_url: &str, prefix: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Redis(RedisCacheStore::from_url(redis_url)?),
            history_ttl: DEFAULT_HISTORY_CACHE_TTL,
        })
    }

    #[cfg(test)]
    fn memory(prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Memory(MemoryCacheStore::default()),
            history_ttl: DEFAULT_HISTORY_CACHE_TTL,
        }
    }

    pub fn configure_history_ttl(&mut self, ttl: Duration) {
        self.history_ttl = ttl.max(Duration::from_secs(1));
    }

    pub fn history_ttl(&self) -> Duration {
        self.history_ttl
    }

    pub fn is_redis_enabled(&self) -> bool {
        matches!(self.backend, CacheBackend::Redis(_))
    }

    pub fn key(&self, suffix: impl AsRef<str>) -> String {
        format!("{}:{}", self.key_prefix, suffix.as_ref())
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        match &self.backend {
            CacheBackend::Disabled(store) => store.ping().await,
            CacheBackend::Redis(store) => store.ping().await,
            #[cfg(test)]
            CacheBackend::Memory(store) => store.ping().await,
        }
    }

    pub async fn get_json<T>(&self, key: &str) -> anyhow::Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let value = match &self.backend {
            CacheBackend::Disabled(store) => store.get(key).await,
            CacheBackend::Redis(store) => store.get(key).await,
            #[cfg(test)]
            CacheBackend::Memory(store) => store.get(key).await,
        }?;

        match value {
            Some(bytes) => {
                let parsed = serde_json::from_slice(&bytes).map_err(|e| {
                    anyhow::anyhow!("failed to deserialize cache value for `{key}`: {e}")
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    pub async fn set_json<T>(&self, key: &str, value: &T, ttl: Duration) -> anyhow::Result<()>
    where
        T: Serialize,
    {
        let ttl_seconds = ttl.as_secs().max(1);
        let payload = serde_json::to_vec(value)
            .map_err(|e| anyhow::anyhow!("failed to serialize cache value for `{key}`: {e}"))?;

        match &self.backend {
            CacheBackend::Disabled(store) => store.set(key, payload, ttl_seconds).await,
            CacheBackend::Redis(store) => store.set(key, payload, ttl_seconds).await,
            #[cfg(test)]
            CacheBackend::Memory(store) => store.set(key, payload, ttl_seconds).await,
        }
    }

    pub async fn incr(&self, key: &str) -> anyhow::Result<u64> {
        match &self.backend {
            CacheBackend::Disabled(store) => store.incr(key).await,
            CacheBackend::Redis(store) => store.incr(key).await,
            #[cfg(test)]
            CacheBackend::Memory(store) => store.incr(key).await,
        }
    }

    pub async fn get_or_load_json<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        loader: F,
    ) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        match self.get_json::<T>(key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => warn!(?e, cache_key = key, "cache get failed; falling back to database"),
        }

        let loaded = loader().await?;

        if let Err(e) = self.set_json(key, &loaded, ttl).await {
            warn!(?e, cache_key = key, "cache set failed; returning database value");
        }

        Ok(loaded)
    }

    /// Current history generation for a user. Every persisted turn bumps it,
    /// so entries written under an older generation are never read again.
    pub async fn history_generation(&self, user_id: &str) -> anyhow::Result<u64> {
        let key = history_generation_key(self, user_id);
        Ok(self.get_json::<u64>(&key).await?.unwrap_or(0))
    }

    pub async fn bump_history_generation(&self, user_id: &str) -> anyhow::Result<u64> {
        self.incr(&history_generation_key(self, user_id)).await
    }

    /// Read-through lookup of one user's history, keyed by generation.
    ///
    /// A loader racing with an insert may store a stale list, but only under
    /// the generation it started with, which the insert has already retired.
    /// If the generation cannot be read the cache is bypassed.
    pub async fn get_or_load_history<T, F, Fut>(&self, user_id: &str, loader: F) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let generation = match self.history_generation(user_id).await {
            Ok(generation) => generation,
            Err(e) => {
                warn!(?e, user_id, "history generation unavailable; bypassing cache");
                return loader().await;
            }
        };

        let key = history_cache_key(self, user_id, generation);
        self.get_or_load_json(&key, self.history_ttl, loader).await
    }
}

fn history_generation_key(cache: &CacheService, user_id: &str) -> String {
    cache.key(format!("history-gen:{user_id}"))
}

/// Key holding one user's ordered turn history at `generation`.
pub fn history_cache_key(cache: &CacheService, user_id: &str, generation: u64) -> String {
    cache.key(format!("history:{user_id}:{generation}"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn keys_are_prefixed() {
        let cache = CacheService::disabled("docchat:test");
        assert_eq!(history_cache_key(&cache, "u-1", 3), "docchat:test:history:u-1:3");
        assert_eq!(
            history_generation_key(&cache, "u-1"),
            "docchat:test:history-gen:u-1"
        );
    }

    #[test]
    fn history_ttl_never_drops_below_one_second() {
        let mut cache = CacheService::disabled("docchat:test");
        assert_eq!(cache.history_ttl(), DEFAULT_HISTORY_CACHE_TTL);
        cache.configure_history_ttl(Duration::ZERO);
        assert_eq!(cache.history_ttl(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn disabled_cache_always_runs_loader() {
        let cache = CacheService::disabled("docchat:test");
        assert!(!cache.is_redis_enabled());
        cache.ping().await.unwrap();

        for expected in [1_u32, 2] {
            let loaded = cache
                .get_or_load_history("u-1", || async move { Ok(expected) })
                .await
                .unwrap();
            assert_eq!(loaded, expected);
        }
    }

    #[tokio::test]
    async fn cached_history_is_served_until_generation_bumps() {
        let cache = CacheService::memory("docchat:test");
        let loads = Arc::new(AtomicUsize::new(0));

        let load = |value: Vec<&'static str>| {
            let loads = loads.clone();
            move || async move {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(value.into_iter().map(str::to_owned).collect::<Vec<String>>())
            }
        };

        let first = cache.get_or_load_history("u-1", load(vec!["q1"])).await.unwrap();
        let again = cache.get_or_load_history("u-1", load(vec!["unused"])).await.unwrap();
        assert_eq!(first, again);
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        assert_eq!(cache.bump_history_generation("u-1").await.unwrap(), 1);

        let fresh = cache
            .get_or_load_history("u-1", load(vec!["q1", "q2"]))
            .await
            .unwrap();
        assert_eq!(fresh, ["q1", "q2"]);
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn insert_during_load_does_not_leave_stale_history() {
        let cache = CacheService::memory("docchat:test");

        // A turn lands after the loader read its rows but before it caches them.
        let racing = cache.clone();
        let stale = cache
            .get_or_load_history("u-1", || async move {
                racing.bump_history_generation("u-1").await?;
                Ok::<_, anyhow::Error>(vec!["q1".to_owned()])
            })
            .await
            .unwrap();
        assert_eq!(stale, ["q1"]);

        let next = cache
            .get_or_load_history("u-1", || async { Ok(vec!["q1".to_owned(), "q2".to_owned()]) })
            .await
            .unwrap();
        assert_eq!(next, ["q1", "q2"]);
    }

    #[tokio::test]
    async fn generations_are_per_user() {
        let cache = CacheService::memory("docchat:test");
        cache.bump_history_generation("alice").await.unwrap();
        cache.bump_history_generation("alice").await.unwrap();

        assert_eq!(cache.history_generation("alice").await.unwrap(), 2);
        assert_eq!(cache.history_generation("bob").await.unwrap(), 0);
    }
}
