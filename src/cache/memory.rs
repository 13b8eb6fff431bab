use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheStore, StoreError};
use crate::data::WeatherResult;
use crate::key::CityKey;

/// In-process cache store
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<CityKey, WeatherResult>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached cities
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &CityKey) -> Result<Option<WeatherResult>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &CityKey, data: &WeatherResult) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.clone(), data.clone());
        Ok(())
    }
}
