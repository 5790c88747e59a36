//! The permalinks (path rewriter) stage, per §4.8: resolves each file's
//! final URL-shaped key via explicit `metadata.permalink`, linksets, or a
//! global pattern, substitutes placeholders, and resolves uniqueness.

use crate::context::Context;
use crate::error::PluginError;
use crate::pattern;
use crate::slug;
use crate::stage::Stage;
use crate::store::FileStore;
use crate::value::{metadata_matches_all, Value};
use std::collections::HashSet;

/// One linkset entry, per §3: order-sensitive, first-match-wins.
#[derive(Debug, Clone, Default)]
pub struct Linkset {
    /// Path glob(s) a file's key must match, if any.
    pub match_patterns: Vec<String>,
    /// Metadata key/expected-value pairs a file's metadata must satisfy.
    /// Array-valued metadata matches if the expected value is *in* the
    /// array.
    pub match_metadata: Vec<(String, Value)>,
    /// The permalink pattern, with placeholders.
    pub pattern: String,
    /// Override the global `trailingSlash` setting for matches.
    pub trailing_slash: Option<bool>,
}

impl Linkset {
    fn matches(&self, path: &str, metadata: &crate::value::Metadata) -> bool {
        if !self.match_patterns.is_empty() && !pattern::matches_any(self.match_patterns.iter().map(String::as_str), path) {
            return false;
        }
        metadata_matches_all(&self.match_metadata, metadata)
    }
}

/// Rewrites file keys to their final URL-shaped paths.
#[derive(Debug, Clone)]
pub struct PermalinksStage {
    /// Glob(s) selecting candidate files. Default `**/*.html`.
    pub match_patterns: Vec<String>,
    /// Ordered linksets, first match wins.
    pub linksets: Vec<Linkset>,
    /// The global fallback pattern, used when no linkset matches and no
    /// explicit `metadata.permalink` is set.
    pub pattern: Option<String>,
    /// Whether output paths end in `/` + `index.html` rather than `.html`.
    pub trailing_slash: bool,
}

impl Default for PermalinksStage {
    fn default() -> Self {
        Self {
            match_patterns: vec!["**/*.html".to_string()],
            linksets: Vec::new(),
            pattern: None,
            trailing_slash: true,
        }
    }
}

fn substitute(pattern: &str, path: &str, metadata: &crate::value::Metadata) -> String {
    let p = std::path::Path::new(path);
    let basename = p
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    let directory = p
        .parent()
        .and_then(|d| d.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string();
    let title = metadata
        .get("title")
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| basename.clone());
    let date = metadata.get("date").and_then(Value::as_date);

    let mut out = pattern.to_string();
    let mut replacements: Vec<(String, String)> = vec![
        (":basename".to_string(), slug::slug(&basename)),
        (":directory".to_string(), directory.clone()),
        (":dir".to_string(), directory),
        (":title".to_string(), slug::slug(&title)),
        (":slug".to_string(), slug::slug(&title)),
    ];
    if let Some(d) = date {
        use chrono::Datelike;
        replacements.push((":year".to_string(), format!("{:04}", d.year())));
        replacements.push((":month".to_string(), format!("{:02}", d.month())));
        replacements.push((":day".to_string(), format!("{:02}", d.day())));
        replacements.push((
            ":date".to_string(),
            format!("{:04}/{:02}/{:02}", d.year(), d.month(), d.day()),
        ));
    }
    for (key, value) in metadata {
        let token = format!(":{key}");
        if !out.contains(&token) {
            continue;
        }
        let rendered = slug::slug(&value.display_string());
        replacements.push((token, rendered));
    }

    // Longer tokens first so `:directory` doesn't get clipped by a
    // would-be `:dir` partial match.
    replacements.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    for (token, value) in replacements {
        out = out.replace(&token, &value);
    }
    out
}

fn strip_extension(path: &str) -> String {
    match path.rfind('.') {
        Some(idx) => path[..idx].to_string(),
        None => path.to_string(),
    }
}

impl Stage for PermalinksStage {
    fn name(&self) -> &str {
        "permalinks"
    }

    fn apply(&self, files: &mut FileStore, ctx: &mut Context) -> Result<(), PluginError> {
        let candidates = files.matching_any(&self.match_patterns);
        let mut occupied: HashSet<String> = files.iter().map(|(p, _)| p.clone()).collect();

        for path in candidates {
            if path.ends_with("/index.html") || path == "index.html" {
                continue;
            }
            let Some(file) = files.get(&path) else {
                continue;
            };

            let explicit_permalink = file.metadata.get("permalink").and_then(Value::as_str);
            let (chosen_pattern, trailing_slash) = if let Some(p) = explicit_permalink {
                (Some(p.to_string()), self.trailing_slash)
            } else if let Some(ls) = self.linksets.iter().find(|ls| ls.matches(&path, &file.metadata)) {
                (
                    Some(ls.pattern.clone()),
                    ls.trailing_slash.unwrap_or(self.trailing_slash),
                )
            } else if let Some(global) = &self.pattern {
                (Some(global.clone()), self.trailing_slash)
            } else {
                (None, self.trailing_slash)
            };

            let base_key = match chosen_pattern {
                Some(pattern) => substitute(&pattern, &path, &file.metadata),
                None => strip_extension(&path),
            };

            let mut key = base_key.trim_start_matches('/').to_string();
            key = if trailing_slash {
                let trimmed = key.trim_end_matches('/');
                format!("{trimmed}/index.html")
            } else if key.ends_with(".html") {
                key
            } else {
                format!("{key}.html")
            };

            // Uniqueness resolution: append -1, -2, ... to the basename
            // segment before the trailing `/index.html` (or before `.html`).
            occupied.remove(&path);
            let mut candidate_key = key.clone();
            let mut suffix = 0;
            while occupied.contains(&candidate_key) && candidate_key != path {
                suffix += 1;
                candidate_key = with_uniqueness_suffix(&key, suffix);
            }
            occupied.insert(candidate_key.clone());

            let permalink = {
                let trimmed = candidate_key
                    .strip_suffix("index.html")
                    .unwrap_or(&candidate_key);
                format!("/{trimmed}")
            };

            files.rename(&path, candidate_key.clone());
            ctx.record_rename(path.clone(), candidate_key.clone());
            if let Some(f) = files.get_mut(&candidate_key) {
                f.metadata.insert("permalink".to_string(), Value::from(permalink));
            }
        }

        Ok(())
    }
}

fn with_uniqueness_suffix(key: &str, n: u32) -> String {
    if let Some(stripped) = key.strip_suffix("/index.html") {
        format!("{stripped}-{n}/index.html")
    } else if let Some(stripped) = key.strip_suffix(".html") {
        format!("{stripped}-{n}.html")
    } else {
        format!("{key}-{n}")
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
    fn clean_url_fallback_strips_extension() {
        let mut files = FileStore::new();
        files.set("about.html", VirtualFile::new("about.html", b"<h1>About</h1>".to_vec()));
        let stage = PermalinksStage::default();
        stage.apply(&mut files, &mut ctx()).unwrap();
        assert!(files.get("about/index.html").is_some());
        assert_eq!(
            files.get("about/index.html").unwrap().metadata.get("permalink").unwrap().as_str(),
            Some("/about/")
        );
    }

    #[test]
    fn linkset_selection_picks_first_match() {
        let mut files = FileStore::new();
        let mut post = VirtualFile::new("my-post.html", vec![]);
        post.metadata.insert("collection".to_string(), Value::from("posts"));
        post.metadata.insert("title".to_string(), Value::from("My Post"));
        files.set("my-post.html", post);

        let mut page = VirtualFile::new("about-page.html", vec![]);
        page.metadata.insert("collection".to_string(), Value::from("pages"));
        page.metadata.insert("title".to_string(), Value::from("About"));
        files.set("about-page.html", page);

        let stage = PermalinksStage {
            linksets: vec![
                Linkset {
                    match_metadata: vec![("collection".to_string(), Value::from("posts"))],
                    pattern: "blog/:title".to_string(),
                    ..Default::default()
                },
                Linkset {
                    match_metadata: vec![("collection".to_string(), Value::from("pages"))],
                    pattern: ":title".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        stage.apply(&mut files, &mut ctx()).unwrap();
        assert!(files.get("blog/my-post/index.html").is_some());
        assert!(files.get("about/index.html").is_some());
    }

    #[test]
    fn uniqueness_resolution_appends_suffix() {
        let mut files = FileStore::new();
        files.set("a/post.html", VirtualFile::new("a/post.html", vec![]));
        files.set("b/post.html", VirtualFile::new("b/post.html", vec![]));
        // Pre-occupy the target key so both resolve to the same pattern.
        let stage = PermalinksStage {
            pattern: Some(":basename".to_string()),
            ..Default::default()
        };
        stage.apply(&mut files, &mut ctx()).unwrap();
        assert!(files.get("post/index.html").is_some());
        assert!(files.get("post-1/index.html").is_some());
    }
}
