//! On-disk cache of fetched pages.
//!
//! One JSON file per fetch target holding `{"data": ..., "expiresAt": <unix millis>}`. Expired
//! records are treated as absent and deleted when next read.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Duration, Utc};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    data: String,
    #[serde(rename = "expiresAt")]
    expires_at: i64,
}

/// Result of a cache lookup
#[derive(Debug, PartialEq, Eq)]
pub enum CacheResult<T> {
    Hit(T),
    Miss,
    Expired,
}

#[derive(Debug, Clone)]
pub struct Cache {
    dir: PathBuf,
    ttl: Duration,
    enabled: bool,
}

impl Cache {
    pub fn new(dir: impl Into<PathBuf>, ttl_hours: u64) -> Self {
        Cache {
            dir: dir.into(),
            ttl: Duration::hours(ttl_hours.min(i64::MAX as u64 / 3_600_000) as i64),
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Cache {
            dir: PathBuf::new(),
            ttl: Duration::zero(),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name = utf8_percent_encode(key, NON_ALPHANUMERIC).to_string();
        self.dir.join(format!("{name}.json"))
    }

    pub fn get(&self, key: &str) -> CacheResult<String> {
        if !self.enabled {
            return CacheResult::Miss;
        }
        let path = self.path_for(key);
        let record: CacheRecord = match fs::read_to_string(&path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
        {
            Some(r) => r,
            None => {
                tracing::debug!(%key, "cache miss");
                return CacheResult::Miss;
            }
        };
        if Utc::now().timestamp_millis() >= record.expires_at {
            tracing::debug!(%key, "cache expired");
            if let Err(e) = fs::remove_file(&path) {
                tracing::debug!(path = %path.display(), "failed to drop expired record: {e}");
            }
            return CacheResult::Expired;
        }
        tracing::debug!(%key, "cache hit");
        CacheResult::Hit(record.data)
    }

    /// Store `data` under `key`. Failures are logged and otherwise ignored.
    pub fn set(&self, key: &str, data: &str) {
        if !self.enabled {
            return;
        }
        let record = CacheRecord {
            data: data.to_string(),
            expires_at: Utc::now()
                .checked_add_signed(self.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
                .timestamp_millis(),
        };
        let write = || -> anyhow::Result<()> {
            fs::create_dir_all(&self.dir)?;
            fs::write(self.path_for(key), serde_json::to_string(&record)?)?;
            Ok(())
        };
        if let Err(e) = write() {
            tracing::warn!(%key, "failed to write cache record: {e}");
        }
    }
}
