//! Token cache persisted as a single JSON file.
//!
//! Writes stage the record in a sibling temp file, flush it and rename it
//! over the target so that readers never observe a torn record.

use std::io::{self, Write};
use std::path::Path;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs::Dir};
use tracing::debug;

use crate::domain::CachedTokenRecord;
use crate::domain::ports::{TokenCache, TokenCacheError};

/// Durable token cache backed by one file.
#[derive(Debug, Clone)]
pub struct FileTokenCache {
    path: Utf8PathBuf,
}

impl FileTokenCache {
    /// Build a cache storing its record at `path`.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the record.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn split(&self) -> Result<(&Utf8Path, &str), TokenCacheError> {
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| TokenCacheError::io(format!("{} has no file name", self.path)))?;
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };
        Ok((parent, file_name))
    }

    fn load_blocking(&self) -> Result<Option<CachedTokenRecord>, TokenCacheError> {
        let (parent, file_name) = self.split()?;
        let directory = match Dir::open_ambient_dir(parent, ambient_authority()) {
            Ok(directory) => directory,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(io_error(parent, &error)),
        };
        let raw = match directory.read_to_string(file_name) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(io_error(&self.path, &error)),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|error| TokenCacheError::corrupt(format!("{}: {error}", self.path)))
    }

    fn store_blocking(&self, record: &CachedTokenRecord) -> Result<(), TokenCacheError> {
        let (parent, file_name) = self.split()?;
        let payload = serde_json::to_vec(record)
            .map_err(|error| TokenCacheError::io(format!("encode record: {error}")))?;

        Dir::create_ambient_dir_all(parent, ambient_authority())
            .map_err(|error| io_error(parent, &error))?;
        let directory = Dir::open_ambient_dir(parent, ambient_authority())
            .map_err(|error| io_error(parent, &error))?;

        let staged_name = format!(".{file_name}.tmp");
        let staged = Path::new(&staged_name);
        let outcome = (|| -> io::Result<()> {
            let mut file = directory.create(staged)?;
            file.write_all(&payload)?;
            file.sync_all()?;
            directory.rename(staged, &directory, file_name)
        })();
        if let Err(error) = outcome {
            let _cleanup_result = directory.remove_file(staged);
            return Err(io_error(&self.path, &error));
        }
        Ok(())
    }

    fn clear_blocking(&self) -> Result<(), TokenCacheError> {
        let (parent, file_name) = self.split()?;
        let directory = match Dir::open_ambient_dir(parent, ambient_authority()) {
            Ok(directory) => directory,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(error) => return Err(io_error(parent, &error)),
        };
        match directory.remove_file(file_name) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(io_error(&self.path, &error)),
        }
    }
}

fn io_error(path: &Utf8Path, error: &io::Error) -> TokenCacheError {
    TokenCacheError::io(format!("{path}: {error}"))
}

async fn run_blocking<T, F>(cache: &FileTokenCache, operation: F) -> Result<T, TokenCacheError>
where
    T: Send + 'static,
    F: FnOnce(&FileTokenCache) -> Result<T, TokenCacheError> + Send + 'static,
{
    let cache = cache.clone();
    tokio::task::spawn_blocking(move || operation(&cache))
        .await
        .map_err(|error| TokenCacheError::io(format!("cache task failed: {error}")))?
}

#[async_trait]
impl TokenCache for FileTokenCache {
    async fn load(&self) -> Result<Option<CachedTokenRecord>, TokenCacheError> {
        run_blocking(self, FileTokenCache::load_blocking).await
    }

    async fn store(&self, record: &CachedTokenRecord) -> Result<(), TokenCacheError> {
        let record = record.clone();
        run_blocking(self, move |cache| cache.store_blocking(&record)).await?;
        debug!(path = %self.path, "stored session token record");
        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenCacheError> {
        run_blocking(self, FileTokenCache::clear_blocking).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn record() -> CachedTokenRecord {
        let saved_at = Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp");
        CachedTokenRecord::new("at-1", saved_at + chrono::TimeDelta::hours(12), saved_at)
    }

    fn cache_in(dir: &tempfile::TempDir, name: &str) -> FileTokenCache {
        let path = Utf8PathBuf::from_path_buf(dir.path().join(name)).expect("utf-8 temp path");
        FileTokenCache::new(path)
    }

    #[tokio::test]
    async fn missing_file_is_a_miss() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cache = cache_in(&dir, "absent/token.json");

        assert_eq!(cache.load().await.expect("load"), None);
        cache.clear().await.expect("clearing a missing record succeeds");
    }

    #[tokio::test]
    async fn stored_record_survives_a_new_instance() {
        let dir = tempfile::tempdir().expect("temp dir");
        cache_in(&dir, "nested/token.json")
            .store(&record())
            .await
            .expect("store");

        let reopened = cache_in(&dir, "nested/token.json");
        assert_eq!(reopened.load().await.expect("load"), Some(record()));
        assert!(!dir.path().join("nested/.token.json.tmp").exists());
    }

    #[tokio::test]
    async fn record_uses_camel_case_fields() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cache = cache_in(&dir, "token.json");
        cache.store(&record()).await.expect("store");

        let raw = std::fs::read_to_string(dir.path().join("token.json")).expect("read back");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["accessToken"], "at-1");
        assert!(value.get("expiresAt").is_some());
        assert!(value.get("savedAt").is_some());
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("token.json"), "{not json").expect("seed");
        let cache = cache_in(&dir, "token.json");

        let err = cache.load().await.expect_err("corrupt record");
        assert!(matches!(err, TokenCacheError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn clear_removes_the_record() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cache = cache_in(&dir, "token.json");
        cache.store(&record()).await.expect("store");

        cache.clear().await.expect("clear");
        assert_eq!(cache.load().await.expect("load"), None);
    }
}
