//! A filesystem-backed webmention cache, one JSON document per target path
//! under a cache directory, per §4.17 step 2 and §3's `WebmentionsCache`
//! persistence requirement.

use janos_core::error::FetchError;
use janos_core::webmention::{CacheStore, WebmentionsCache};
use std::fs;
use std::path::{Path, PathBuf};

/// Persists one `WebmentionsCache` document per content path, keyed by a
/// filesystem-safe slug of that path.
#[derive(Debug)]
pub struct FileCacheStore {
    directory: PathBuf,
}

impl FileCacheStore {
    /// Cache files are written under `directory`, created on first write.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn cache_path(&self, path: &str) -> PathBuf {
        let slug = path.replace(['/', '\\'], "_");
        self.directory.join(format!("{slug}.json"))
    }
}

fn io_err(operation: &str, path: &Path, err: std::io::Error) -> FetchError {
    FetchError {
        operation: format!("{operation} ({})", path.display()),
        reason: err.to_string(),
    }
}

impl CacheStore for FileCacheStore {
    fn read_cache(&self, path: &str) -> Result<Option<WebmentionsCache>, FetchError> {
        let file = self.cache_path(path);
        if !file.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&file).map_err(|e| io_err("read cache", &file, e))?;
        let cache = serde_json::from_str(&raw).map_err(|e| FetchError {
            operation: format!("parse cache ({})", file.display()),
            reason: e.to_string(),
        })?;
        Ok(Some(cache))
    }

    fn write_cache(&self, path: &str, cache: &WebmentionsCache) -> Result<(), FetchError> {
        fs::create_dir_all(&self.directory)
            .map_err(|e| io_err("create cache directory", &self.directory, e))?;
        let file = self.cache_path(path);
        let body = serde_json::to_vec_pretty(cache).map_err(|e| FetchError {
            operation: format!("serialize cache ({})", file.display()),
            reason: e.to_string(),
        })?;
        fs::write(&file, body).map_err(|e| io_err("write cache", &file, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path());
        assert!(store.read_cache("blog/post/").unwrap().is_none());

        let mut cache = WebmentionsCache::default();
        cache.last_wm_id = Some(7);
        store.write_cache("blog/post/", &cache).unwrap();

        let reloaded = store.read_cache("blog/post/").unwrap().unwrap();
        assert_eq!(reloaded.last_wm_id, Some(7));
    }
}
