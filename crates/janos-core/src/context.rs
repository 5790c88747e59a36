//! The pipeline's shared, mutable [`Context`] (`GlobalMetadata` of §3):
//! site section, build info, collections, tag index, and arbitrary
//! user-set keys, all visible to every stage and to every template render.

use crate::value::{Metadata, Value};
use std::collections::HashMap;

/// Build mode, controlling publish-filter and development-only behavior
/// (`debug` logging, draft/future-post visibility) per §4.1/§4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Production build: drafts, private and future-dated posts excluded.
    Production,
    /// Development build: drafts and future-dated posts are kept.
    Development,
}

impl Default for BuildMode {
    fn default() -> Self {
        BuildMode::Production
    }
}

/// The `site` section of global metadata.
#[derive(Debug, Clone, Default)]
pub struct SiteConfig {
    /// Site title. Required by config validation.
    pub title: String,
    /// Absolute base URL, no trailing slash. Required by config validation.
    pub base_url: String,
    /// Optional site description.
    pub description: Option<String>,
    /// Optional language tag, e.g. `"en"`.
    pub language: Option<String>,
    /// Optional author name.
    pub author: Option<String>,
    /// Additional free-form site metadata keys.
    pub extra: Metadata,
}

impl SiteConfig {
    /// Flatten this site section into `Value::Map`, the shape exposed to
    /// templates as the `site` context key.
    pub fn to_value(&self) -> Value {
        let mut map = self.extra.clone();
        map.insert("title".to_string(), Value::from(self.title.clone()));
        map.insert("baseUrl".to_string(), Value::from(self.base_url.clone()));
        if let Some(d) = &self.description {
            map.insert("description".to_string(), Value::from(d.clone()));
        }
        if let Some(l) = &self.language {
            map.insert("language".to_string(), Value::from(l.clone()));
        }
        if let Some(a) = &self.author {
            map.insert("author".to_string(), Value::from(a.clone()));
        }
        Value::Map(map)
    }
}

/// The pipeline-wide mutable context: `GlobalMetadata` per §3.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// The `site` section.
    pub site: SiteConfig,
    /// Build mode: production or development.
    pub mode: BuildMode,
    /// Named collections, written by the collections stage, read by
    /// pagination/tag-pages/feeds/layouts.
    pub collections: HashMap<String, Vec<Value>>,
    /// Union of all tags encountered, sorted by name, written by the tags
    /// stage.
    pub all_tags: Vec<Value>,
    /// `name -> {urlSafe, length}` tag cloud, written by the tags stage.
    pub tag_cloud: HashMap<String, Value>,
    /// Arbitrary user-set global-metadata keys (`Metadata(key, value)`).
    pub extra: Metadata,
    /// Non-fatal issues recovered locally by a stage (frontmatter-parse
    /// errors, missing layouts), surfaced in the build's result summary.
    pub warnings: Vec<String>,
    /// Non-fatal but more severe issues recovered locally (template render
    /// failures), surfaced in the build's result summary.
    pub errors: Vec<String>,
    /// Old-key -> new-key edges recorded by every rename-performing stage
    /// (content decoding, permalinks), so later stages can follow a file's
    /// full rename chain instead of relying solely on `source_path`.
    pub renames: HashMap<String, String>,
}

impl Context {
    /// Construct a context for the given site section and mode.
    pub fn new(site: SiteConfig, mode: BuildMode) -> Self {
        Self {
            site,
            mode,
            ..Default::default()
        }
    }

    /// Set a global-metadata entry, visible to all stages and all templates.
    /// Mirrors the driver's `Metadata(key, value)` contract in §4.1.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.extra.insert(key.into(), value);
    }

    /// Record a non-fatal, lower-severity issue (frontmatter parse, missing
    /// layout) against a stage name.
    pub fn push_warning(&mut self, stage: &str, message: impl std::fmt::Display) {
        self.warnings.push(format!("{stage}: {message}"));
    }

    /// Record a non-fatal, higher-severity issue (template render failure)
    /// against a stage name.
    pub fn push_error(&mut self, stage: &str, message: impl std::fmt::Display) {
        self.errors.push(format!("{stage}: {message}"));
    }

    /// Record that a file store key changed, so later stages can resolve a
    /// path through the whole rename chain rather than a single hop.
    pub fn record_rename(&mut self, old_path: impl Into<String>, new_path: impl Into<String>) {
        self.renames.insert(old_path.into(), new_path.into());
    }

    /// Follow the rename chain recorded via [`Context::record_rename`] from
    /// `start` to its final key, guarding against cycles. Returns `start`
    /// unchanged if it was never renamed.
    pub fn resolve_rename(&self, start: &str) -> String {
        chase_rename_chain(&self.renames, start)
    }

    /// Build the merged context map handed to the template engine: `site`,
    /// flattened `site_<key>` primitives, `collections`, `allTags`,
    /// `tagCloud`, and every `extra` key, per §4.12.
    pub fn to_template_data(&self) -> Metadata {
        let mut data = self.extra.clone();
        let site_value = self.site.to_value();
        if let Value::Map(site_map) = &site_value {
            for (k, v) in site_map {
                if matches!(
                    v,
                    Value::String(_) | Value::Int(_) | Value::Float(_) | Value::Bool(_)
                ) {
                    data.insert(format!("site_{k}"), v.clone());
                }
            }
        }
        data.insert("site".to_string(), site_value);
        data.insert(
            "collections".to_string(),
            Value::Map(
                self.collections
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::List(v.clone())))
                    .collect(),
            ),
        );
        data.insert("allTags".to_string(), Value::List(self.all_tags.clone()));
        data.insert(
            "tagCloud".to_string(),
            Value::Map(self.tag_cloud.clone()),
        );
        data
    }
}

/// Follow `renames` (old key -> new key) from `start` to its final key,
/// guarding against cycles. Free function so callers already holding a
/// mutable borrow of another `Context` field can still chase a cloned map.
pub fn chase_rename_chain(renames: &HashMap<String, String>, start: &str) -> String {
    let mut current = start.to_string();
    let mut hops = 0;
    while let Some(next) = renames.get(&current) {
        if next == &current || hops > renames.len() {
            break;
        }
        current = next.clone();
        hops += 1;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_values_flatten_with_prefix() {
        let mut ctx = Context::new(
            SiteConfig {
                title: "My Site".to_string(),
                base_url: "https://example.com".to_string(),
                ..Default::default()
            },
            BuildMode::Production,
        );
        ctx.set_metadata("buildYear", Value::Int(2026));
        let data = ctx.to_template_data();
        assert_eq!(data.get("site_title").unwrap().as_str(), Some("My Site"));
        assert_eq!(data.get("buildYear").unwrap().as_f64(), Some(2026.0));
    }
}
