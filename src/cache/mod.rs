//! Cache module for storing computed weather results
//!
//! This module defines the `CacheStore` interface the lookup orchestrator
//! reads from and inserts into, plus two implementations: a persistent store
//! that keeps one JSON document per city on disk, and an in-process store.
//! Entries never expire and are never updated by the orchestrator.

mod manager;
mod memory;

pub use manager::CacheManager;
pub use memory::MemoryCache;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::data::WeatherResult;
use crate::key::CityKey;

/// Errors raised by a cache store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying storage could not be read or written
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored document could not be encoded or decoded
    #[error("Cache document is invalid: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Key/value persistence for computed weather results
///
/// Absence is a normal outcome of `get`, reported as `Ok(None)`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CityKey) -> Result<Option<WeatherResult>, StoreError>;

    async fn put(&self, key: &CityKey, data: &WeatherResult) -> Result<(), StoreError>;
}

/// Which cache store the service runs with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheBackend {
    /// Process-local map, lost on restart
    Memory,
    /// One JSON document per city under the given directory
    Directory(PathBuf),
}

impl CacheBackend {
    /// Builds the store for this backend
    pub fn build(&self) -> Arc<dyn CacheStore> {
        match self {
            Self::Memory => Arc::new(MemoryCache::new()),
            Self::Directory(dir) => Arc::new(CacheManager::with_dir(dir.clone())),
        }
    }
}
