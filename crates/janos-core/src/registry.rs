//! Assembles the default [`crate::config::StageRegistry`] of built-in
//! stages that can be constructed from JSON options alone, per §4.20's
//! "registry of built-ins (§4.4-4.19 plus markdown/layouts)".
//!
//! `layouts`, `responsive-images`, and `webmentions` are deliberately absent
//! here: they depend on host-supplied collaborators (a template engine map,
//! an image codec, an HTTP fetcher/cache) that this crate stays free of per
//! its WASM-compatible, no-system-dependency design. The root crate
//! registers those three as additional builtins once it has constructed
//! the concrete collaborators.

use crate::config::{StageFactory, StageRegistry};
use crate::error::ConfigError;
use crate::markdown::MarkdownOptions;
use crate::stage::Stage;
use crate::stages::cname::CnameStage;
use crate::stages::collections::{CollectionConfig, CollectionsStage};
use crate::stages::content_decoder::ContentDecoderStage;
use crate::stages::coordination::CoordinationStage;
use crate::stages::css_urls::CssUrlsStage;
use crate::stages::excerpts::ExcerptsStage;
use crate::stages::feeds::FeedsStage;
use crate::stages::inline_source::InlineSourceStage;
use crate::stages::manifest::ManifestStage;
use crate::stages::pagination::{PaginationConfig, PaginationStage};
use crate::stages::permalinks::{Linkset, PermalinksStage};
use crate::stages::publish::PublishStage;
use crate::stages::robots::RobotsStage;
use crate::stages::sitemap::SitemapStage;
use crate::stages::tag_pages::TagPagesStage;
use crate::stages::tags::TagsStage;
use crate::value::{Metadata, Value};
use serde_json::Value as Json;
use std::collections::HashMap;
use std::sync::Arc;

fn str_list(json: &Json, key: &str, default: Vec<String>) -> Vec<String> {
    match json.get(key).and_then(Json::as_array) {
        Some(arr) => arr.iter().filter_map(Json::as_str).map(String::from).collect(),
        None => default,
    }
}

fn str_opt(json: &Json, key: &str) -> Option<String> {
    json.get(key).and_then(Json::as_str).map(String::from)
}

fn bool_field(json: &Json, key: &str, default: bool) -> bool {
    json.get(key).and_then(Json::as_bool).unwrap_or(default)
}

fn usize_field(json: &Json, key: &str, default: usize) -> usize {
    json.get(key).and_then(Json::as_u64).map(|n| n as usize).unwrap_or(default)
}

/// Read a `{ "key": value, ... }` object under `key` into key/expected-value
/// pairs, the shape `filter` and `matchMetadata` both use.
fn pairs_field(json: &Json, key: &str) -> Vec<(String, Value)> {
    json.get(key)
        .and_then(Json::as_object)
        .map(|obj| obj.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect())
        .unwrap_or_default()
}

fn metadata_object(json: &Json, key: &str) -> Metadata {
    let mut out = Metadata::new();
    if let Some(obj) = json.get(key).and_then(Json::as_object) {
        for (k, v) in obj {
            out.insert(k.clone(), Value::from(v));
        }
    }
    out
}

fn register<S: Stage + 'static>(
    registry: &mut StageRegistry,
    name: &'static str,
    build: impl Fn(&Json) -> Result<S, ConfigError> + Send + Sync + 'static,
) {
    let factory: StageFactory = Arc::new(move |json| Ok(Box::new(build(json)?) as Box<dyn Stage>));
    registry.register_builtin(name, factory);
}

/// Build the default registry of JSON-constructible built-in stages.
pub fn default_registry() -> StageRegistry {
    let mut registry = StageRegistry::new();

    register(&mut registry, "markdown", |json| {
        Ok(ContentDecoderStage {
            patterns: str_list(json, "patterns", vec!["**/*.md".to_string(), "**/*.markdown".to_string()]),
            markdown_options: MarkdownOptions {
                allow_raw_html: bool_field(json, "allowRawHtml", true),
            },
        })
    });

    register(&mut registry, "publish", |json| {
        Ok(PublishStage {
            include_drafts: bool_field(json, "includeDrafts", false),
            include_private: bool_field(json, "includePrivate", false),
            include_future: bool_field(json, "includeFuture", false),
        })
    });

    register(&mut registry, "excerpts", |json| {
        Ok(ExcerptsStage {
            patterns: str_list(json, "patterns", vec!["**/*.html".to_string()]),
            marker: json.get("marker").and_then(Json::as_str).unwrap_or("<!-- more -->").to_string(),
            trim: bool_field(json, "trim", true),
        })
    });

    register(&mut registry, "tags", |json| {
        Ok(TagsStage {
            fields: str_list(json, "fields", vec!["tags".to_string()]),
        })
    });

    register(&mut registry, "collections", |json| {
        let mut collections = HashMap::new();
        if let Some(obj) = json.get("collections").and_then(Json::as_object) {
            for (name, entry) in obj {
                collections.insert(
                    name.clone(),
                    CollectionConfig {
                        patterns: str_list(entry, "patterns", Vec::new()),
                        sort_by: str_opt(entry, "sortBy"),
                        reverse: bool_field(entry, "reverse", false),
                        refer: bool_field(entry, "refer", true),
                        limit: entry.get("limit").and_then(Json::as_u64).map(|n| n as usize),
                        filter: pairs_field(entry, "filter"),
                    },
                );
            }
        }
        Ok(CollectionsStage { collections })
    });

    register(&mut registry, "permalinks", |json| {
        let linksets = json
            .get("linksets")
            .and_then(Json::as_array)
            .map(|arr| {
                arr.iter()
                    .map(|entry| Linkset {
                        match_patterns: str_list(entry, "match", Vec::new()),
                        match_metadata: pairs_field(entry, "matchMetadata"),
                        pattern: entry.get("pattern").and_then(Json::as_str).unwrap_or_default().to_string(),
                        trailing_slash: entry.get("trailingSlash").and_then(Json::as_bool),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(PermalinksStage {
            match_patterns: str_list(json, "match", vec!["**/*.html".to_string()]),
            linksets,
            pattern: str_opt(json, "pattern"),
            trailing_slash: bool_field(json, "trailingSlash", true),
        })
    });

    register(&mut registry, "coordination", |_json| Ok(CoordinationStage));

    register(&mut registry, "pagination", |json| {
        let pages = json
            .get("pages")
            .and_then(Json::as_array)
            .map(|arr| {
                arr.iter()
                    .map(|entry| PaginationConfig {
                        collection_ref: entry.get("collection").and_then(Json::as_str).unwrap_or_default().to_string(),
                        per_page: usize_field(entry, "perPage", 10),
                        first: entry.get("first").and_then(Json::as_str).unwrap_or("index.html").to_string(),
                        path: entry.get("path").and_then(Json::as_str).unwrap_or("page/:num/index.html").to_string(),
                        layout: str_opt(entry, "layout"),
                        page_metadata: metadata_object(entry, "metadata"),
                        no_page_one: bool_field(entry, "noPageOne", false),
                        filter: pairs_field(entry, "filter"),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(PaginationStage { pages })
    });

    register(&mut registry, "tag-pages", |json| {
        Ok(TagPagesStage {
            tags_field: json.get("tagsField").and_then(Json::as_str).unwrap_or("tags").to_string(),
            source_patterns: str_list(json, "patterns", vec!["**/*.html".to_string()]),
            sort_by: str_opt(json, "sortBy").or_else(|| Some("date".to_string())),
            reverse: bool_field(json, "reverse", false),
            per_page: json.get("perPage").and_then(Json::as_u64).map(|n| n as usize),
            path_pattern: json.get("path").and_then(Json::as_str).unwrap_or("topics/:tag/index.html").to_string(),
            title_pattern: json.get("title").and_then(Json::as_str).unwrap_or("Tag: :tag").to_string(),
        })
    });

    register(&mut registry, "assets", |json| {
        let mappings = json
            .get("mappings")
            .and_then(Json::as_array)
            .map(|arr| {
                arr.iter()
                    .map(|entry| crate::stages::assets::AssetMapping {
                        source: entry.get("source").and_then(Json::as_str).unwrap_or_default().to_string(),
                        destination: entry.get("destination").and_then(Json::as_str).unwrap_or_default().to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(crate::stages::assets::AssetsStage { mappings })
    });

    register(&mut registry, "css-urls", |json| {
        Ok(CssUrlsStage {
            patterns: str_list(json, "patterns", vec!["**/*.css".to_string()]),
        })
    });

    register(&mut registry, "inline-source", |json| {
        Ok(InlineSourceStage {
            patterns: str_list(json, "patterns", vec!["**/*.html".to_string()]),
            max_size: usize_field(json, "maxSize", 50_000),
        })
    });

    register(&mut registry, "sitemap", |json| {
        Ok(SitemapStage {
            patterns: str_list(json, "patterns", vec!["**/*.html".to_string()]),
            exclude: str_list(
                json,
                "exclude",
                vec!["**/404.html".to_string(), "**/500.html".to_string(), "**/_*/**".to_string()],
            ),
            destination: json.get("destination").and_then(Json::as_str).unwrap_or("sitemap.xml").to_string(),
            default_changefreq: json.get("changefreq").and_then(Json::as_str).unwrap_or("weekly").to_string(),
            default_priority: json
                .get("priority")
                .map(|v| v.to_string())
                .unwrap_or_else(|| "0.5".to_string()),
        })
    });

    register(&mut registry, "feeds", |json| {
        Ok(FeedsStage {
            collection: json.get("collection").and_then(Json::as_str).unwrap_or("posts").to_string(),
            limit: usize_field(json, "limit", 20),
            destination: json.get("destination").and_then(Json::as_str).unwrap_or("rss.xml").to_string(),
            atom_destination: str_opt(json, "atomDestination"),
            description_field: json.get("descriptionField").and_then(Json::as_str).unwrap_or("excerpt").to_string(),
            full_content: bool_field(json, "fullContent", false),
            content_field: json.get("contentField").and_then(Json::as_str).unwrap_or("contents").to_string(),
        })
    });

    register(&mut registry, "robots", |json| {
        Ok(RobotsStage {
            destination: json.get("destination").and_then(Json::as_str).unwrap_or("robots.txt").to_string(),
            sitemap_path: json.get("sitemap").and_then(Json::as_str).unwrap_or("sitemap.xml").to_string(),
            disallow: str_list(json, "disallow", Vec::new()),
        })
    });

    register(&mut registry, "cname", |_json| Ok(CnameStage));

    register(&mut registry, "manifest", |json| {
        Ok(ManifestStage {
            destination: json.get("destination").and_then(Json::as_str).unwrap_or("manifest.json").to_string(),
        })
    });

    registry
}
