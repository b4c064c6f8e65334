//! Driven port for the durable session-token record.
//!
//! One record at most. A missing, unreadable or corrupt record is a cache
//! miss for the session manager; adapters report the difference only for
//! logging.

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::define_port_error;
use crate::domain::CachedTokenRecord;

define_port_error! {
    /// Errors surfaced by token cache adapters.
    pub enum TokenCacheError {
        /// Filesystem or backend failure.
        Io { message: String } => Upstream: "token cache i/o failed: {message}",
        /// Stored record could not be decoded.
        Corrupt { message: String } => Upstream: "token cache record is corrupt: {message}",
    }
}

/// Port persisting the last issued token across restarts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenCache: Send + Sync {
    /// Read the stored record, if any.
    async fn load(&self) -> Result<Option<CachedTokenRecord>, TokenCacheError>;

    /// Replace the stored record.
    async fn store(&self, record: &CachedTokenRecord) -> Result<(), TokenCacheError>;

    /// Remove the stored record. Removing a missing record succeeds.
    async fn clear(&self) -> Result<(), TokenCacheError>;
}

/// Process-local cache used when no cache file is configured.
#[derive(Debug, Default)]
pub struct InMemoryTokenCache {
    record: Mutex<Option<CachedTokenRecord>>,
}

impl InMemoryTokenCache {
    /// Build a cache pre-seeded with `record`.
    pub fn with_record(record: CachedTokenRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }
}

#[async_trait]
impl TokenCache for InMemoryTokenCache {
    async fn load(&self) -> Result<Option<CachedTokenRecord>, TokenCacheError> {
        Ok(self.record.lock().await.clone())
    }

    async fn store(&self, record: &CachedTokenRecord) -> Result<(), TokenCacheError> {
        *self.record.lock().await = Some(record.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenCacheError> {
        self.record.lock().await.take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn in_memory_cache_round_trips_and_clears() {
        let saved_at = Utc
            .with_ymd_and_hms(2026, 3, 1, 8, 0, 0)
            .single()
            .expect("valid time");
        let record =
            CachedTokenRecord::new("tok", saved_at + chrono::TimeDelta::hours(1), saved_at);
        let cache = InMemoryTokenCache::default();

        assert!(cache.load().await.expect("load").is_none());
        cache.store(&record).await.expect("store");
        assert_eq!(cache.load().await.expect("load"), Some(record));
        cache.clear().await.expect("clear");
        cache.clear().await.expect("clear twice");
        assert!(cache.load().await.expect("load").is_none());
    }
}
