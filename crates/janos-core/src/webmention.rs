//! Webmention types and the abstract fetch/cache collaborators, per §4.17
//! and §3's `WebmentionsCache`/`Webmention` data model. JF2-compatible: wire
//! format matches webmention.io's `mentions.jf2` endpoint.

use crate::error::FetchError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One JF2 webmention entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Webmention {
    /// Unique, monotonically-increasing id assigned by the endpoint.
    #[serde(rename = "wm-id")]
    pub wm_id: i64,
    /// The source URL that mentioned the target.
    #[serde(rename = "wm-source")]
    pub wm_source: String,
    /// The target URL being mentioned (this site's page).
    #[serde(rename = "wm-target")]
    pub wm_target: String,
    /// The mention's relationship to the target.
    #[serde(rename = "wm-property")]
    pub wm_property: WebmentionProperty,
    /// When the endpoint received the mention, RFC 3339.
    #[serde(rename = "wm-received")]
    pub wm_received: String,
    /// Optional author JF2 object, left opaque as JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<serde_json::Value>,
    /// Optional content JF2 object, left opaque as JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
    /// Optional original-publish timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    /// Optional canonical URL of the mentioning entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// The `wm-property` enumeration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum WebmentionProperty {
    /// A reply.
    InReplyTo,
    /// A like.
    LikeOf,
    /// A repost.
    RepostOf,
    /// A plain mention.
    MentionOf,
    /// A bookmark.
    BookmarkOf,
}

/// The per-file cache record, per §3.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WebmentionsCache {
    /// Highest `wm-id` seen so far, used as `since_id` on the next fetch.
    #[serde(rename = "lastWmId")]
    pub last_wm_id: Option<i64>,
    /// All known mentions, unique by `wm-id`.
    pub children: Vec<Webmention>,
    /// Count of `in-reply-to` entries.
    #[serde(rename = "reply-count")]
    pub reply_count: usize,
    /// Count of `like-of` entries.
    #[serde(rename = "like-count")]
    pub like_count: usize,
    /// Count of `repost-of` entries.
    #[serde(rename = "repost-count")]
    pub repost_count: usize,
}

impl WebmentionsCache {
    /// Merge `fresh` entries into this cache, deduplicating by `wm-id`,
    /// recomputing `lastWmId` and the per-type counts, per §4.17 step 5.
    pub fn merge(&mut self, fresh: Vec<Webmention>) {
        if fresh.is_empty() {
            return;
        }
        let mut seen: HashSet<i64> = self.children.iter().map(|w| w.wm_id).collect();
        let fresh_max = fresh.iter().map(|w| w.wm_id).max();
        for wm in fresh {
            if seen.insert(wm.wm_id) {
                self.children.push(wm);
            }
        }
        self.last_wm_id = match (fresh_max, self.last_wm_id) {
            (Some(f), Some(c)) => Some(f.max(c)),
            (Some(f), None) => Some(f),
            (None, c) => c,
        };
        self.recompute_counts();
    }

    fn recompute_counts(&mut self) {
        self.reply_count = 0;
        self.like_count = 0;
        self.repost_count = 0;
        for w in &self.children {
            match w.wm_property {
                WebmentionProperty::InReplyTo => self.reply_count += 1,
                WebmentionProperty::LikeOf => self.like_count += 1,
                WebmentionProperty::RepostOf => self.repost_count += 1,
                WebmentionProperty::MentionOf | WebmentionProperty::BookmarkOf => {}
            }
        }
    }
}

/// The JF2 endpoint response envelope: `{ "children": [...] }`.
#[derive(Debug, Deserialize)]
pub struct MentionsResponse {
    /// Fresh webmentions returned by the endpoint.
    #[serde(default)]
    pub children: Vec<Webmention>,
}

/// Outbound HTTP collaborator for fetching fresh webmentions. Abstract so
/// `janos-core` stays network-free; the root crate supplies a
/// `reqwest`-blocking implementation.
pub trait HttpFetcher {
    /// Fetch fresh mentions for `target_url`, using `since_id` to request
    /// only entries newer than the cache, per §4.17 step 4. A `None` result
    /// means "no new entries" or a tolerated failure (logged by the
    /// caller, not propagated as an error).
    fn fetch_mentions(
        &self,
        endpoint: &str,
        target_url: &str,
        per_page: u32,
        since_id: Option<i64>,
    ) -> Result<Vec<Webmention>, FetchError>;
}

/// Cache storage collaborator, keyed by the target path, per §4.17 step 2.
/// Abstract so `janos-core` stays filesystem-free; the root crate supplies
/// a JSON-file-backed implementation.
pub trait CacheStore {
    /// Read a cached [`WebmentionsCache`] for `path`, if one exists.
    fn read_cache(&self, path: &str) -> Result<Option<WebmentionsCache>, FetchError>;

    /// Persist `cache` for `path`.
    fn write_cache(&self, path: &str, cache: &WebmentionsCache) -> Result<(), FetchError>;
}
