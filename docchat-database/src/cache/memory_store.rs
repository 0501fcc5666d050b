use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Process-local store for tests. TTLs are ignored.
#[derive(Clone, Debug, Default)]
pub struct MemoryCacheStore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryCacheStore {
    fn entries(&self) -> anyhow::Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory cache lock poisoned"))
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }

    pub async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.entries()?.get(key).cloned())
    }

    pub async fn set(&self, key: &str, value: Vec<u8>, _ttl_seconds: u64) -> anyhow::Result<()> {
        self.entries()?.insert(key.to_owned(), value);
        Ok(())
    }

    pub async fn incr(&self, key: &str) -> anyhow::Result<u64> {
        let mut entries = self.entries()?;
        let current = entries
            .get(key)
            .and_then(|raw| std::str::from_utf8(raw).ok())
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(0);
        let next = current + 1;
        entries.insert(key.to_owned(), next.to_string().into_bytes());
        Ok(next)
    }
}
