//! The tag pages stage, per §4.11: for every unique tag, synthesize one or
//! more listing pages following the same `pagination.pages` convention as
//! §4.10, and expose a `tagPages` summary in global metadata.

use crate::context::Context;
use crate::error::PluginError;
use crate::file::VirtualFile;
use crate::slug;
use crate::stage::Stage;
use crate::store::FileStore;
use crate::value::{Metadata, Value};
use std::collections::HashMap;

/// Synthesizes per-tag listing pages.
#[derive(Debug, Clone)]
pub struct TagPagesStage {
    /// Metadata key holding a file's list of `{name, slug}` tags.
    pub tags_field: String,
    /// Glob(s) selecting files eligible for tag-page membership.
    pub source_patterns: Vec<String>,
    /// Metadata key to sort each tag's items by, default `"date"`.
    pub sort_by: Option<String>,
    /// Reverse the sort order.
    pub reverse: bool,
    /// If `Some`, paginate at this many items per page; if `None`, emit one
    /// page per tag with a one-element `pagination.pages`.
    pub per_page: Option<usize>,
    /// Output path pattern, containing `:tag`. Default `topics/:tag/index.html`.
    pub path_pattern: String,
    /// Title pattern, containing `:tag`. Default `"Tag: :tag"`.
    pub title_pattern: String,
}

impl Default for TagPagesStage {
    fn default() -> Self {
        Self {
            tags_field: "tags".to_string(),
            source_patterns: vec!["**/*.html".to_string()],
            sort_by: Some("date".to_string()),
            reverse: false,
            per_page: None,
            path_pattern: "topics/:tag/index.html".to_string(),
            title_pattern: "Tag: :tag".to_string(),
        }
    }
}

impl Stage for TagPagesStage {
    fn name(&self) -> &str {
        "tag-pages"
    }

    fn apply(&self, files: &mut FileStore, ctx: &mut Context) -> Result<(), PluginError> {
        // tag name -> (slug, members as snapshots)
        let mut by_tag: HashMap<String, (String, Vec<Value>)> = HashMap::new();

        let candidates = files.matching_any(&self.source_patterns);
        for path in &candidates {
            let Some(file) = files.get(path) else { continue };
            let Some(tags) = file.metadata.get(&self.tags_field).and_then(Value::as_list) else {
                continue;
            };
            for tag in tags {
                let Some(map) = tag.as_map() else { continue };
                let Some(name) = map.get("name").and_then(Value::as_str) else {
                    continue;
                };
                let tag_slug = map
                    .get("slug")
                    .and_then(Value::as_str)
                    .map(String::from)
                    .unwrap_or_else(|| slug::slug(name));

                let mut item = file.metadata.clone();
                item.insert("path".to_string(), Value::from(path.as_str()));
                item.insert(
                    "contents".to_string(),
                    Value::from(file.contents_str().unwrap_or_default()),
                );

                by_tag
                    .entry(name.to_string())
                    .or_insert_with(|| (tag_slug.clone(), Vec::new()))
                    .1
                    .push(Value::Map(item));
            }
        }

        let mut tag_pages_summary: Vec<Value> = Vec::new();
        let mut names: Vec<&String> = by_tag.keys().collect();
        names.sort();

        for name in names {
            let (tag_slug, mut items) = by_tag[name].clone();
            let sort_key = self.sort_by.as_deref().unwrap_or("date");
            items.sort_by(|a, b| {
                let av = a.as_map().and_then(|m| m.get(sort_key));
                let bv = b.as_map().and_then(|m| m.get(sort_key));
                super::collections_sort_key(av, bv)
            });
            if self.reverse {
                items.reverse();
            }

            tag_pages_summary.push(Value::map([
                ("name".to_string(), Value::from(name.as_str())),
                ("slug".to_string(), Value::from(tag_slug.as_str())),
                ("count".to_string(), Value::Int(items.len() as i64)),
            ]));

            let per_page = self.per_page.unwrap_or(items.len().max(1));
            let total = items.len().div_ceil(per_page).max(1);

            let page_paths: Vec<String> = (0..total)
                .map(|i| {
                    self.path_pattern
                        .replace(":num", &(i + 1).to_string())
                        .replace(":tag", &tag_slug)
                })
                .collect();
            let pages_meta: Vec<Value> = page_paths
                .iter()
                .enumerate()
                .map(|(i, path)| {
                    Value::map([
                        ("num".to_string(), Value::Int((i + 1) as i64)),
                        ("path".to_string(), Value::from(path.as_str())),
                    ])
                })
                .collect();

            for (i, path) in page_paths.iter().enumerate() {
                let start = i * per_page;
                let end = (start + per_page).min(items.len());
                let slice: Vec<Value> = items[start..end].to_vec();

                let mut metadata = Metadata::new();
                metadata.insert(
                    "title".to_string(),
                    Value::from(self.title_pattern.replace(":tag", name)),
                );
                metadata.insert(
                    "pagination".to_string(),
                    Value::map([
                        ("files".to_string(), Value::List(slice)),
                        ("pages".to_string(), Value::List(pages_meta.clone())),
                        ("current".to_string(), Value::Int((i + 1) as i64)),
                        ("total".to_string(), Value::Int(total as i64)),
                        (
                            "next".to_string(),
                            pages_meta.get(i + 1).cloned().unwrap_or(Value::Null),
                        ),
                        (
                            "previous".to_string(),
                            if i == 0 {
                                Value::Null
                            } else {
                                pages_meta.get(i - 1).cloned().unwrap_or(Value::Null)
                            },
                        ),
                    ]),
                );

                let mut file = VirtualFile::new(path.clone(), Vec::new());
                file.metadata = metadata;
                files.set(path.clone(), file);
            }
        }

        ctx.extra.insert("tagPages".to_string(), Value::List(tag_pages_summary));
        Ok(())
    }
}
