//! The tags stage, per §4.6: normalizes `tags` (and configured additional
//! fields) to `{name, slug}` pairs, builds the union `allTags` and the
//! `tagCloud` map, and exposes both as global metadata.

use crate::context::Context;
use crate::error::PluginError;
use crate::slug;
use crate::stage::Stage;
use crate::store::FileStore;
use crate::value::{Metadata, Value};
use std::collections::HashMap;

/// Normalizes tag metadata and builds the global tag index.
#[derive(Debug, Clone)]
pub struct TagsStage {
    /// Metadata fields to normalize, in addition to `tags`.
    pub fields: Vec<String>,
}

impl Default for TagsStage {
    fn default() -> Self {
        Self {
            fields: vec!["tags".to_string()],
        }
    }
}

/// Build a `{name, slug}` tag value.
fn tag_value(name: &str) -> Value {
    Value::map([
        ("name".to_string(), Value::from(name)),
        ("slug".to_string(), Value::from(slug::slug(name))),
    ])
}

/// Normalize one metadata value into a list of tag names, per the accepted
/// input shapes in §4.6.
fn extract_tag_names(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => {
            if s.contains(',') {
                s.split(',').map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).collect()
            } else {
                vec![s.trim().to_string()].into_iter().filter(|t| !t.is_empty()).collect()
            }
        }
        Value::List(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Map(m) => m.get("name").and_then(Value::as_str).map(String::from),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

impl Stage for TagsStage {
    fn name(&self) -> &str {
        "tags"
    }

    fn apply(&self, files: &mut FileStore, ctx: &mut Context) -> Result<(), PluginError> {
        let mut counts: HashMap<String, usize> = HashMap::new();

        for (_, file) in files.iter_mut() {
            for field in &self.fields {
                let Some(raw) = file.metadata.get(field).cloned() else {
                    continue;
                };
                let names = extract_tag_names(&raw);
                if names.is_empty() {
                    continue;
                }
                let tags: Vec<Value> = names
                    .iter()
                    .map(|name| {
                        *counts.entry(name.clone()).or_insert(0) += 1;
                        tag_value(name)
                    })
                    .collect();
                file.metadata.insert(field.clone(), Value::List(tags));
            }
        }

        let mut names: Vec<&String> = counts.keys().collect();
        names.sort();
        let all_tags: Vec<Value> = names.iter().map(|n| tag_value(n)).collect();

        let mut tag_cloud: Metadata = Metadata::new();
        for name in &names {
            let count = counts[*name];
            tag_cloud.insert(
                (*name).clone(),
                Value::map([
                    ("urlSafe".to_string(), Value::from(slug::slug(name))),
                    ("length".to_string(), Value::Int(count as i64)),
                ]),
            );
        }

        ctx.all_tags = all_tags;
        ctx.tag_cloud = tag_cloud;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BuildMode, SiteConfig};
    use crate::file::VirtualFile;

    fn ctx() -> Context {
        Context::new(SiteConfig::default(), BuildMode::Production)
    }

    #[test]
    fn normalizes_comma_separated_string() {
        let mut files = FileStore::new();
        let mut f = VirtualFile::new("a.html", vec![]);
        f.metadata.insert("tags".to_string(), Value::from("Rust, SSG"));
        files.set("a.html", f);

        let stage = TagsStage::default();
        let mut c = ctx();
        stage.apply(&mut files, &mut c).unwrap();

        let tags = files.get("a.html").unwrap().metadata.get("tags").unwrap();
        let list = tags.as_list().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(c.all_tags.len(), 2);
    }

    #[test]
    fn tag_cloud_counts_occurrences() {
        let mut files = FileStore::new();
        let mut a = VirtualFile::new("a.html", vec![]);
        a.metadata.insert("tags".to_string(), Value::from("rust"));
        files.set("a.html", a);
        let mut b = VirtualFile::new("b.html", vec![]);
        b.metadata.insert("tags".to_string(), Value::from("rust"));
        files.set("b.html", b);

        let stage = TagsStage::default();
        let mut c = ctx();
        stage.apply(&mut files, &mut c).unwrap();

        let cloud_entry = c.tag_cloud.get("rust").unwrap().as_map().unwrap();
        assert_eq!(cloud_entry.get("length").unwrap().as_f64(), Some(2.0));
    }

    #[test]
    fn slug_is_idempotent() {
        let s1 = slug::slug("My Tag!!");
        let s2 = slug::slug(&s1);
        assert_eq!(s1, s2);
    }
}
