//! The webmentions stage, per §4.17: for each eligible file, computes the
//! target URL, consults the cache, and fetches fresh mentions concurrently,
//! merging into the cache before any file is rewritten.

use crate::context::Context;
use crate::error::PluginError;
use crate::stage::Stage;
use crate::store::FileStore;
use crate::value::{Metadata, Value};
use crate::webmention::{CacheStore, HttpFetcher, WebmentionsCache};
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Fetches and merges webmentions for matching pages.
pub struct WebmentionsStage {
    /// Glob(s) selecting files eligible for mentions. Default `**/*.html`.
    pub patterns: Vec<String>,
    /// Base URL mentions target, joined with each file's permalink.
    pub site_url: String,
    /// The webmention.io (or compatible) `mentions.jf2` endpoint.
    pub endpoint: String,
    /// Page size requested per fetch.
    pub per_page: u32,
    pub fetcher: Arc<dyn HttpFetcher + Send + Sync>,
    pub cache: Arc<dyn CacheStore + Send + Sync>,
}

/// One file's fetch-and-merge result, gathered before the sequential commit.
struct FetchOutcome {
    path: String,
    url: String,
    cache: WebmentionsCache,
    refreshed: bool,
    /// A recoverable fetch/cache-read failure, surfaced as a warning.
    warning: Option<String>,
}

fn target_url(site_url: &str, file_path: &str, permalink: Option<&str>) -> String {
    let path = permalink.unwrap_or(file_path);
    format!("{}/{}", site_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

impl Stage for WebmentionsStage {
    fn name(&self) -> &str {
        "webmentions"
    }

    fn apply(&self, files: &mut FileStore, ctx: &mut Context) -> Result<(), PluginError> {
        let candidates = files.matching_any(&self.patterns);
        let matched: Vec<String> = candidates
            .into_iter()
            .filter(|path| {
                files
                    .get(path)
                    .map(|f| f.metadata.contains_key("layout") && f.metadata.contains_key("collection"))
                    .unwrap_or(false)
            })
            .collect();

        let targets: Vec<(String, String)> = matched
            .iter()
            .map(|path| {
                let permalink = files
                    .get(path)
                    .and_then(|f| f.metadata.get("permalink"))
                    .and_then(Value::as_str);
                (path.clone(), target_url(&self.site_url, path, permalink))
            })
            .collect();

        // Gather: fetch concurrently, commit sequentially (per §5).
        #[cfg(feature = "parallel")]
        let fetched: Vec<FetchOutcome> = targets.par_iter().map(|(path, url)| self.fetch_one(path, url)).collect();
        #[cfg(not(feature = "parallel"))]
        let fetched: Vec<FetchOutcome> = targets.iter().map(|(path, url)| self.fetch_one(path, url)).collect();

        for outcome in fetched {
            let FetchOutcome { path, url, cache, refreshed, warning } = outcome;
            if let Some(warning) = warning {
                ctx.push_warning(self.name(), format!("{path}: {warning}"));
            }
            if refreshed {
                if let Err(err) = self.cache.write_cache(&url, &cache) {
                    log::error!("{path}: failed to write webmentions cache: {err}");
                    ctx.push_warning(self.name(), format!("{path}: failed to write webmentions cache: {err}"));
                }
            }
            if let Some(f) = files.get_mut(&path) {
                f.metadata.insert("webmentions".to_string(), cache_to_value(&cache));
            }
        }

        Ok(())
    }
}

/// Serialize a [`WebmentionsCache`] into the `Value` tree templates see at
/// `metadata.webmentions`, falling back to an empty map if it cannot be
/// represented as JSON (which the struct's own shape never triggers).
fn cache_to_value(cache: &WebmentionsCache) -> Value {
    match serde_json::to_value(cache) {
        Ok(json) => Value::from(&json),
        Err(err) => {
            log::error!("failed to serialize webmentions cache: {err}");
            Value::Map(Metadata::new())
        }
    }
}

impl WebmentionsStage {
    /// Read the cache, attempt a fetch, and report the resulting cache
    /// value plus whether it was refreshed. On fetch failure, the returned
    /// cache is the pre-fetch one: the cache value remains in effect.
    fn fetch_one(&self, path: &str, url: &str) -> FetchOutcome {
        let mut warning = None;
        let cache = match self.cache.read_cache(url) {
            Ok(existing) => existing.unwrap_or_default(),
            Err(err) => {
                log::warn!("{path}: failed to read webmentions cache for {url}: {err}");
                warning = Some(format!("failed to read webmentions cache for {url}: {err}"));
                WebmentionsCache::default()
            }
        };

        match self
            .fetcher
            .fetch_mentions(&self.endpoint, url, self.per_page, cache.last_wm_id)
        {
            Ok(fresh) => {
                let mut merged = cache;
                merged.merge(fresh);
                FetchOutcome { path: path.to_string(), url: url.to_string(), cache: merged, refreshed: true, warning }
            }
            Err(err) => {
                log::warn!("{path}: webmention fetch failed for {url}: {err}");
                warning = Some(warning.map(|w| format!("{w}; webmention fetch failed for {url}: {err}"))
                    .unwrap_or_else(|| format!("webmention fetch failed for {url}: {err}")));
                FetchOutcome { path: path.to_string(), url: url.to_string(), cache, refreshed: false, warning }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BuildMode, SiteConfig};
    use crate::error::FetchError;
    use crate::file::VirtualFile;
    use crate::webmention::{Webmention, WebmentionProperty};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct StubFetcher {
        mentions: Vec<Webmention>,
    }
    impl HttpFetcher for StubFetcher {
        fn fetch_mentions(
            &self,
            _endpoint: &str,
            _target_url: &str,
            _per_page: u32,
            _since_id: Option<i64>,
        ) -> Result<Vec<Webmention>, FetchError> {
            Ok(self.mentions.clone())
        }
    }

    #[derive(Default)]
    struct MemCache {
        store: Mutex<HashMap<String, WebmentionsCache>>,
    }
    impl CacheStore for MemCache {
        fn read_cache(&self, path: &str) -> Result<Option<WebmentionsCache>, FetchError> {
            Ok(self.store.lock().unwrap().get(path).cloned())
        }
        fn write_cache(&self, path: &str, cache: &WebmentionsCache) -> Result<(), FetchError> {
            self.store.lock().unwrap().insert(path.to_string(), cache.clone());
            Ok(())
        }
    }

    #[test]
    fn fetches_and_merges_into_cache_and_annotates_file() {
        let mut files = FileStore::new();
        let mut file = VirtualFile::new("post.html", b"hi".to_vec());
        file.metadata.insert("layout".to_string(), Value::from("post"));
        file.metadata.insert("collection".to_string(), Value::from("posts"));
        files.set("post.html", file);

        let mention = Webmention {
            wm_id: 20,
            wm_source: "https://example.com/a".to_string(),
            wm_target: "https://example.com/post.html".to_string(),
            wm_property: WebmentionProperty::LikeOf,
            wm_received: "2024-01-01T00:00:00Z".to_string(),
            author: None,
            content: None,
            published: None,
            url: None,
        };

        let stage = WebmentionsStage {
            patterns: vec!["**/*.html".to_string()],
            site_url: "https://example.com".to_string(),
            endpoint: "https://webmention.io/api/mentions.jf2".to_string(),
            per_page: 100,
            fetcher: Arc::new(StubFetcher { mentions: vec![mention] }),
            cache: Arc::new(MemCache::default()),
        };
        let mut ctx = Context::new(SiteConfig::default(), BuildMode::Production);
        stage.apply(&mut files, &mut ctx).unwrap();

        let webmentions = files.get("post.html").unwrap().metadata.get("webmentions").unwrap();
        let map = webmentions.as_map().expect("webmentions should be a map");
        assert_eq!(map.get("children").and_then(Value::as_list).map(|c| c.len()), Some(1));
        assert_eq!(map.get("like-count").and_then(Value::as_f64), Some(1.0));
    }

    #[test]
    fn ineligible_files_are_skipped() {
        let mut files = FileStore::new();
        files.set("about.html", VirtualFile::new("about.html", b"hi".to_vec()));

        let stage = WebmentionsStage {
            patterns: vec!["**/*.html".to_string()],
            site_url: "https://example.com".to_string(),
            endpoint: "https://webmention.io/api/mentions.jf2".to_string(),
            per_page: 100,
            fetcher: Arc::new(StubFetcher { mentions: vec![] }),
            cache: Arc::new(MemCache::default()),
        };
        let mut ctx = Context::new(SiteConfig::default(), BuildMode::Production);
        stage.apply(&mut files, &mut ctx).unwrap();

        assert!(files.get("about.html").unwrap().metadata.get("webmentions").is_none());
    }

    #[test]
    fn fetch_failure_keeps_the_cached_value_in_effect() {
        struct FailingFetcher;
        impl HttpFetcher for FailingFetcher {
            fn fetch_mentions(
                &self,
                _endpoint: &str,
                _target_url: &str,
                _per_page: u32,
                _since_id: Option<i64>,
            ) -> Result<Vec<Webmention>, FetchError> {
                Err(FetchError {
                    operation: "fetch mentions.jf2".to_string(),
                    reason: "503 Service Unavailable".to_string(),
                })
            }
        }

        let mut files = FileStore::new();
        let mut file = VirtualFile::new("post.html", b"hi".to_vec());
        file.metadata.insert("layout".to_string(), Value::from("post"));
        file.metadata.insert("collection".to_string(), Value::from("posts"));
        files.set("post.html", file);

        let cache = Arc::new(MemCache::default());
        let target = target_url("https://example.com", "post.html", None);
        cache
            .store
            .lock()
            .unwrap()
            .insert(target, WebmentionsCache { last_wm_id: Some(5), ..Default::default() });

        let stage = WebmentionsStage {
            patterns: vec!["**/*.html".to_string()],
            site_url: "https://example.com".to_string(),
            endpoint: "https://webmention.io/api/mentions.jf2".to_string(),
            per_page: 100,
            fetcher: Arc::new(FailingFetcher),
            cache,
        };
        let mut ctx = Context::new(SiteConfig::default(), BuildMode::Production);
        stage.apply(&mut files, &mut ctx).unwrap();

        let webmentions = files.get("post.html").unwrap().metadata.get("webmentions").unwrap();
        let map = webmentions.as_map().expect("webmentions should be a map");
        assert_eq!(map.get("lastWmId").and_then(Value::as_f64), Some(5.0));
        assert_eq!(ctx.warnings.len(), 1);
    }
}
