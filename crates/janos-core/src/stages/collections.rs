//! The collections stage, per §4.7: builds named, ordered item lists from
//! explicit `metadata.collection` assignment and/or glob patterns, sorts
//! and limits them, and records back-references on member files.

use crate::context::Context;
use crate::error::PluginError;
use crate::pattern;
use crate::stage::Stage;
use crate::store::FileStore;
use crate::value::{metadata_matches_all, Value};
use std::collections::HashMap;

/// One configured collection's assembly rules.
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// Glob pattern(s) additionally pulling files into this collection.
    pub patterns: Vec<String>,
    /// Metadata key to sort by, default `"date"`.
    pub sort_by: Option<String>,
    /// Reverse the sort order after sorting ascending.
    pub reverse: bool,
    /// Whether member files get `metadata.collections` back-references.
    /// Defaults to `true`.
    pub refer: bool,
    /// Keep at most this many items, applied after sorting.
    pub limit: Option<usize>,
    /// Metadata key/expected-value pairs a member must satisfy to stay in
    /// the collection. Empty means no filtering.
    pub filter: Vec<(String, Value)>,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            sort_by: None,
            reverse: false,
            refer: true,
            limit: None,
            filter: Vec::new(),
        }
    }
}

impl CollectionConfig {
    fn sort_key(&self) -> &str {
        self.sort_by.as_deref().unwrap_or("date")
    }
}

/// Assembles named collections from per-file `collection` assignment and
/// glob patterns.
#[derive(Debug, Clone, Default)]
pub struct CollectionsStage {
    /// Name -> assembly config, for every collection that should exist even
    /// if no file references it by name.
    pub collections: HashMap<String, CollectionConfig>,
}

impl Stage for CollectionsStage {
    fn name(&self) -> &str {
        "collections"
    }

    fn apply(&self, files: &mut FileStore, ctx: &mut Context) -> Result<(), PluginError> {
        // name -> ordered list of member paths
        let mut members: HashMap<String, Vec<String>> = HashMap::new();
        for name in self.collections.keys() {
            members.entry(name.clone()).or_default();
        }

        // Step 2: explicit `collection` assignment.
        let explicit_assignments: Vec<(String, Vec<String>)> = files
            .iter()
            .map(|(path, file)| {
                let names: Vec<String> = match file.metadata.get("collection") {
                    Some(Value::String(s)) => vec![s.clone()],
                    Some(Value::List(items)) => items
                        .iter()
                        .filter_map(|v| v.as_str().map(String::from))
                        .collect(),
                    _ => Vec::new(),
                };
                (path.clone(), names)
            })
            .collect();

        for (path, names) in explicit_assignments {
            for name in names {
                members.entry(name).or_default().push(path.clone());
            }
        }

        // Step 3: pattern-based membership, skipping files already present.
        for (name, config) in &self.collections {
            if config.patterns.is_empty() {
                continue;
            }
            let already: std::collections::HashSet<String> =
                members.get(name).cloned().unwrap_or_default().into_iter().collect();
            for path in files.matching_any(&config.patterns) {
                if !already.contains(&path) {
                    members.entry(name.clone()).or_default().push(path);
                }
            }
        }

        // Apply per-collection `filter`, if present, before back-references
        // and snapshotting so filtered-out files never appear as members.
        for (name, paths) in members.iter_mut() {
            let Some(config) = self.collections.get(name) else { continue };
            if config.filter.is_empty() {
                continue;
            }
            paths.retain(|path| {
                files
                    .get(path)
                    .map(|f| metadata_matches_all(&config.filter, &f.metadata))
                    .unwrap_or(false)
            });
        }

        // Step 4: back-references and first-collection assignment.
        for (name, paths) in &members {
            let config = self.collections.get(name).cloned().unwrap_or_default();
            if !config.refer {
                continue;
            }
            for path in paths {
                if let Some(file) = files.get_mut(path) {
                    let already_listed = file
                        .metadata
                        .get("collections")
                        .and_then(Value::as_list)
                        .map(|list| {
                            list.iter().any(|v| v.as_str() == Some(name.as_str()))
                        })
                        .unwrap_or(false);
                    if !already_listed {
                        let mut list = file
                            .metadata
                            .get("collections")
                            .and_then(Value::as_list)
                            .map(|l| l.to_vec())
                            .unwrap_or_default();
                        list.push(Value::from(name.as_str()));
                        file.metadata.insert("collections".to_string(), Value::List(list));
                    }
                    if !file.metadata.contains_key("collection") {
                        file.metadata.insert("collection".to_string(), Value::from(name.as_str()));
                    }
                }
            }
        }

        // Steps 5-6: sort and limit, building the final item snapshots.
        let mut result: HashMap<String, Vec<Value>> = HashMap::new();
        for (name, paths) in members {
            let config = self.collections.get(&name).cloned().unwrap_or_default();
            let mut items: Vec<(String, Value)> = paths
                .into_iter()
                .filter_map(|path| {
                    let file = files.get(&path)?;
                    Some((path.clone(), snapshot(&path, file)))
                })
                .collect();

            items.sort_by(|(_, a), (_, b)| {
                let key = config.sort_key();
                let av = a.as_map().and_then(|m| m.get(key));
                let bv = b.as_map().and_then(|m| m.get(key));
                super::collections_sort_key(av, bv)
            });
            if config.reverse {
                items.reverse();
            }
            if let Some(limit) = config.limit {
                items.truncate(limit);
            }

            result.insert(name, items.into_iter().map(|(_, v)| v).collect());
        }

        ctx.collections = result;
        Ok(())
    }
}

/// Build a Collection Item snapshot, per §3/§4.7: file metadata plus `path`
/// and a decoded UTF-8 `contents` string.
fn snapshot(path: &str, file: &crate::file::VirtualFile) -> Value {
    let mut map = file.metadata.clone();
    map.insert("path".to_string(), Value::from(path));
    map.insert(
        "contents".to_string(),
        Value::from(file.contents_str().unwrap_or_default()),
    );
    Value::Map(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BuildMode, SiteConfig};
    use crate::file::VirtualFile;
    use crate::datefmt::parse_date_scalar;

    fn ctx() -> Context {
        Context::new(SiteConfig::default(), BuildMode::Production)
    }

    #[test]
    fn sorts_by_date_reversed() {
        let mut files = FileStore::new();
        let mut a = VirtualFile::new("posts/a.html", vec![]);
        a.metadata.insert("date".to_string(), Value::Date(parse_date_scalar("2024-01-01").unwrap()));
        files.set("posts/a.html", a);
        let mut b = VirtualFile::new("posts/b.html", vec![]);
        b.metadata.insert("date".to_string(), Value::Date(parse_date_scalar("2024-02-01").unwrap()));
        files.set("posts/b.html", b);

        let mut collections = HashMap::new();
        collections.insert(
            "posts".to_string(),
            CollectionConfig {
                patterns: vec!["posts/**/*.html".to_string()],
                sort_by: Some("date".to_string()),
                reverse: true,
                refer: true,
                limit: None,
                filter: Vec::new(),
            },
        );
        let stage = CollectionsStage { collections };
        let mut c = ctx();
        stage.apply(&mut files, &mut c).unwrap();

        let posts = &c.collections["posts"];
        assert_eq!(posts.len(), 2);
        assert_eq!(
            posts[0].as_map().unwrap().get("path").unwrap().as_str(),
            Some("posts/b.html")
        );
    }

    #[test]
    fn filter_excludes_non_matching_members() {
        let mut files = FileStore::new();
        for (i, featured) in [true, false, true].into_iter().enumerate() {
            let mut f = VirtualFile::new(format!("p{i}.html"), vec![]);
            f.metadata.insert("collection".to_string(), Value::from("posts"));
            f.metadata.insert("featured".to_string(), Value::Bool(featured));
            files.set(format!("p{i}.html"), f);
        }
        let mut collections = HashMap::new();
        collections.insert(
            "posts".to_string(),
            CollectionConfig {
                refer: true,
                filter: vec![("featured".to_string(), Value::Bool(true))],
                ..Default::default()
            },
        );
        let stage = CollectionsStage { collections };
        let mut c = ctx();
        stage.apply(&mut files, &mut c).unwrap();
        assert_eq!(c.collections["posts"].len(), 2);
    }

    #[test]
    fn limit_truncates_after_sort() {
        let mut files = FileStore::new();
        for i in 0..5 {
            let mut f = VirtualFile::new(format!("p{i}.html"), vec![]);
            f.metadata.insert("collection".to_string(), Value::from("posts"));
            f.metadata.insert("date".to_string(), Value::Int(i));
            files.set(format!("p{i}.html"), f);
        }
        let mut collections = HashMap::new();
        collections.insert(
            "posts".to_string(),
            CollectionConfig {
                limit: Some(2),
                refer: true,
                ..Default::default()
            },
        );
        let stage = CollectionsStage { collections };
        let mut c = ctx();
        stage.apply(&mut files, &mut c).unwrap();
        assert_eq!(c.collections["posts"].len(), 2);
    }
}
