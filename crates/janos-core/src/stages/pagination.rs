//! The pagination stage, per §4.10: synthesizes paged listing files from a
//! referenced collection, each carrying `pagination` metadata with sibling
//! page navigation.

use crate::context::Context;
use crate::error::PluginError;
use crate::file::VirtualFile;
use crate::stage::Stage;
use crate::store::FileStore;
use crate::value::{metadata_matches_all, Metadata, Value};

/// One paginated listing's configuration.
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// Dotted collection reference, e.g. `"collections.posts"`.
    pub collection_ref: String,
    /// Items per page.
    pub per_page: usize,
    /// Output path for page 1.
    pub first: String,
    /// Output path pattern for pages after the first; must contain `:num`.
    pub path: String,
    /// Layout name applied to every synthesized page.
    pub layout: Option<String>,
    /// Extra metadata merged onto every synthesized page.
    pub page_metadata: Metadata,
    /// If `true`, suppress the page-1 file that `path` would otherwise
    /// independently produce. The `first` file is never removed.
    pub no_page_one: bool,
    /// Metadata key/expected-value pairs an item must satisfy to be paged.
    /// Empty means no filtering.
    pub filter: Vec<(String, Value)>,
}

fn resolve_collection<'a>(ctx: &'a Context, dotted_ref: &str) -> Option<&'a Vec<Value>> {
    let name = dotted_ref.strip_prefix("collections.").unwrap_or(dotted_ref);
    ctx.collections.get(name)
}

/// Synthesizes paged listing files from a collection.
#[derive(Debug, Clone, Default)]
pub struct PaginationStage {
    /// One entry per paginated listing to produce.
    pub pages: Vec<PaginationConfig>,
}

impl Stage for PaginationStage {
    fn name(&self) -> &str {
        "pagination"
    }

    fn apply(&self, files: &mut FileStore, ctx: &mut Context) -> Result<(), PluginError> {
        for config in &self.pages {
            let Some(resolved) = resolve_collection(ctx, &config.collection_ref) else {
                continue;
            };
            let filtered;
            let items: &[Value] = if config.filter.is_empty() {
                resolved
            } else {
                filtered = resolved
                    .iter()
                    .filter(|item| {
                        item.as_map()
                            .map(|m| metadata_matches_all(&config.filter, m))
                            .unwrap_or(false)
                    })
                    .cloned()
                    .collect::<Vec<_>>();
                &filtered
            };
            if items.is_empty() {
                continue;
            }
            let per_page = config.per_page.max(1);
            let total = items.len().div_ceil(per_page);

            let page_paths: Vec<String> = (0..total)
                .map(|i| {
                    if i == 0 {
                        config.first.clone()
                    } else {
                        config.path.replace(":num", &(i + 1).to_string())
                    }
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
                if i > 0 && config.no_page_one && path == &config.first {
                    continue;
                }
                let start = i * per_page;
                let end = (start + per_page).min(items.len());
                let slice: Vec<Value> = items[start..end].to_vec();

                let mut metadata = config.page_metadata.clone();
                if let Some(layout) = &config.layout {
                    metadata.insert("layout".to_string(), Value::from(layout.as_str()));
                }
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
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BuildMode, SiteConfig};

    fn ctx_with_posts(n: usize) -> Context {
        let mut ctx = Context::new(SiteConfig::default(), BuildMode::Production);
        let items = (0..n)
            .map(|i| Value::map([("path".to_string(), Value::from(format!("p{i}.html")))]))
            .collect();
        ctx.collections.insert("posts".to_string(), items);
        ctx
    }

    #[test]
    fn pagination_scenario_matches_spec_example() {
        let mut files = FileStore::new();
        let mut ctx = ctx_with_posts(5);
        let stage = PaginationStage {
            pages: vec![PaginationConfig {
                collection_ref: "collections.posts".to_string(),
                per_page: 2,
                first: "index.html".to_string(),
                path: "page/:num/index.html".to_string(),
                layout: None,
                page_metadata: Metadata::new(),
                no_page_one: false,
                filter: Vec::new(),
            }],
        };
        stage.apply(&mut files, &mut ctx).unwrap();

        assert!(files.get("index.html").is_some());
        assert!(files.get("page/2/index.html").is_some());
        assert!(files.get("page/3/index.html").is_some());

        let page1 = files.get("index.html").unwrap();
        let pagination = page1.metadata.get("pagination").unwrap().as_map().unwrap();
        assert_eq!(pagination.get("total").unwrap().as_f64(), Some(3.0));
        assert_eq!(
            pagination
                .get("next")
                .unwrap()
                .as_map()
                .unwrap()
                .get("path")
                .unwrap()
                .as_str(),
            Some("page/2/index.html")
        );
        assert!(pagination.get("previous").unwrap().is_null());
    }

    #[test]
    fn filter_excludes_non_matching_items_before_paging() {
        let mut files = FileStore::new();
        let mut ctx = Context::new(SiteConfig::default(), BuildMode::Production);
        let items = vec![
            Value::map([
                ("path".to_string(), Value::from("keep-1.html")),
                ("featured".to_string(), Value::Bool(true)),
            ]),
            Value::map([
                ("path".to_string(), Value::from("skip.html")),
                ("featured".to_string(), Value::Bool(false)),
            ]),
            Value::map([
                ("path".to_string(), Value::from("keep-2.html")),
                ("featured".to_string(), Value::Bool(true)),
            ]),
        ];
        ctx.collections.insert("posts".to_string(), items);

        let stage = PaginationStage {
            pages: vec![PaginationConfig {
                collection_ref: "collections.posts".to_string(),
                per_page: 10,
                first: "index.html".to_string(),
                path: "page/:num/index.html".to_string(),
                layout: None,
                page_metadata: Metadata::new(),
                no_page_one: false,
                filter: vec![("featured".to_string(), Value::Bool(true))],
            }],
        };
        stage.apply(&mut files, &mut ctx).unwrap();

        let page1 = files.get("index.html").unwrap();
        let pagination = page1.metadata.get("pagination").unwrap().as_map().unwrap();
        let slice = pagination.get("files").unwrap().as_list().unwrap();
        assert_eq!(slice.len(), 2);
    }

    #[test]
    fn missing_collection_is_skipped() {
        let mut files = FileStore::new();
        let mut ctx = Context::new(SiteConfig::default(), BuildMode::Production);
        let stage = PaginationStage {
            pages: vec![PaginationConfig {
                collection_ref: "collections.posts".to_string(),
                per_page: 2,
                first: "index.html".to_string(),
                path: "page/:num/index.html".to_string(),
                layout: None,
                page_metadata: Metadata::new(),
                no_page_one: false,
                filter: Vec::new(),
            }],
        };
        stage.apply(&mut files, &mut ctx).unwrap();
        assert!(files.is_empty());
    }
}
