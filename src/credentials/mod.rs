use crate::error::StoreError;
use async_trait::async_trait;
use log::{error, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub const SECURE_TOKEN_KEY: &str = "jwt_token";
pub const CACHE_TOKEN_KEY: &str = "token";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.lock().unwrap_or_else(|e| e.into_inner()).get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values.lock().unwrap_or_else(|e| e.into_inner()).remove(key);
        Ok(())
    }
}

// A JSON object on disk. A missing file reads as empty.
pub struct FileStore {
    path: PathBuf,
    // serializes read-modify-write cycles
    lock: tokio::sync::Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<HashMap<String, String>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, values: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(values)?).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut values = self.read_all().await?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut values = self.read_all().await?;
        if values.remove(key).is_some() {
            self.write_all(&values).await?;
        }
        Ok(())
    }
}

// Bearer credential held in the secure store, with the simple cache as fallback.
#[derive(Clone)]
pub struct Credentials {
    secure: Arc<dyn KeyValueStore>,
    cache: Arc<dyn KeyValueStore>,
}

impl Credentials {
    pub fn new(secure: Arc<dyn KeyValueStore>, cache: Arc<dyn KeyValueStore>) -> Self {
        Self { secure, cache }
    }

    // Read failures count as "no token"
    pub async fn bearer_token(&self) -> Option<String> {
        if let Some(token) = read_token(self.secure.as_ref(), SECURE_TOKEN_KEY).await {
            return Some(token);
        }
        read_token(self.cache.as_ref(), CACHE_TOKEN_KEY).await
    }

    // Removes the token from both stores, attempting both even if the first fails.
    pub async fn invalidate(&self) -> Result<(), StoreError> {
        let secure = self.secure.remove(SECURE_TOKEN_KEY).await;
        let cache = self.cache.remove(CACHE_TOKEN_KEY).await;
        if let Err(e) = &secure {
            error!("Failed to clear secure credential: {}", e);
        }
        if let Err(e) = &cache {
            error!("Failed to clear cached credential: {}", e);
        }
        secure.and(cache)
    }
}

async fn read_token(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key).await {
        Ok(Some(token)) if !token.trim().is_empty() => Some(token),
        Ok(_) => None,
        Err(e) => {
            warn!("Could not read credential '{}': {}", key, e);
            None
        }
    }
}
