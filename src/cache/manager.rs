//! Cache manager for persisting weather results to disk
//!
//! Provides a `CacheManager` that stores each city's result as its own JSON
//! document of shape `{city, data, cached_at}`. Documents are written once and
//! never expire.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;

use super::{CacheStore, StoreError};
use crate::data::WeatherResult;
use crate::key::CityKey;

/// Document stored on disk for one city
#[derive(Debug, Serialize, Deserialize)]
struct CacheDocument<D> {
    /// Normalized city the result belongs to
    city: CityKey,
    /// The cached result
    data: D,
    /// When the result was cached
    cached_at: DateTime<Utc>,
}

/// Distinguishes temp files of concurrent writers within this process
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Longest key (in bytes) whose file name is its plain hex encoding
///
/// Longer keys are named by their SHA-256 digest so every file name stays
/// well under the usual 255-byte limit, temp suffix included.
const MAX_HEX_KEY_BYTES: usize = 64;

/// Manages reading and writing cached results on disk
///
/// Documents live in an XDG-compliant cache directory (`~/.cache/cityweather/`
/// on Linux) unless a directory is given explicitly. File names are the hex
/// encoding of the city key, or `h-<sha256>` for long keys, so any key maps
/// to a safe, bounded file name.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where cache documents are stored
    cache_dir: PathBuf,
}

impl CacheManager {
    /// Creates a new CacheManager using XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "cityweather")?;
        let cache_dir = project_dirs.cache_dir().to_path_buf();
        Some(Self { cache_dir })
    }

    /// Creates a new CacheManager with a custom cache directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path to the document for the given key
    fn cache_path(&self, key: &CityKey) -> PathBuf {
        self.cache_dir.join(format!("{}.json", file_stem(key)))
    }
}

#[async_trait]
impl CacheStore for CacheManager {
    /// Reads the document for `key`
    ///
    /// A missing document is `Ok(None)`; an unreadable or corrupt one is an error.
    async fn get(&self, key: &CityKey) -> Result<Option<WeatherResult>, StoreError> {
        let content = match fs::read_to_string(self.cache_path(key)).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let document: CacheDocument<WeatherResult> = serde_json::from_str(&content)?;
        if document.city != *key {
            tracing::warn!(city = %key, stored = %document.city, "Cache document belongs to another key");
            return Ok(None);
        }
        Ok(Some(document.data))
    }

    /// Writes the document for `key`, replacing any existing one
    ///
    /// The document is written to a temp file and renamed into place so readers
    /// never observe a partial write.
    async fn put(&self, key: &CityKey, data: &WeatherResult) -> Result<(), StoreError> {
        fs::create_dir_all(&self.cache_dir).await?;

        let document = CacheDocument {
            city: key.clone(),
            data,
            cached_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&document)?;

        let path = self.cache_path(key);
        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp_path = path.with_extension(format!("json.{}.{}.tmp", std::process::id(), seq));

        fs::write(&tmp_path, json).await?;
        if let Err(e) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

/// File name stem for a key: hex for short keys, a digest for long ones
fn file_stem(key: &CityKey) -> String {
    let bytes = key.as_str().as_bytes();
    if bytes.is_empty() {
        return "_".to_string();
    }
    if bytes.len() <= MAX_HEX_KEY_BYTES {
        return hex::encode(bytes);
    }
    format!("h-{}", hex::encode(Sha256::digest(bytes)))
}
