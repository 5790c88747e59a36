//! The inline-source stage, per §4.15: inlines small, internal script,
//! stylesheet, and image references directly into HTML.
//!
//! Implemented as a structural attribute scan (regex matching individual
//! `src=`/`href=` attribute values with anchored, non-greedy captures)
//! rather than a single greedy whole-tag regex.

use crate::context::Context;
use crate::error::PluginError;
use crate::stage::Stage;
use crate::store::FileStore;
use once_cell::sync::Lazy;
use regex::Regex;

/// Inlines small same-origin assets referenced from HTML.
#[derive(Debug, Clone)]
pub struct InlineSourceStage {
    /// Glob(s) selecting HTML files to scan. Default `**/*.html`.
    pub patterns: Vec<String>,
    /// Maximum byte size of an asset eligible for inlining. Default 50000.
    pub max_size: usize,
}

impl Default for InlineSourceStage {
    fn default() -> Self {
        Self {
            patterns: vec!["**/*.html".to_string()],
            max_size: 50_000,
        }
    }
}

static SCRIPT_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<script\s+[^>]*?src="([^"]+)"[^>]*></script>"#).unwrap()
});
static LINK_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<link\s+[^>]*?rel="stylesheet"[^>]*?href="([^"]+)"[^>]*?/?>"#).unwrap()
});
static IMG_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<img\s+[^>]*?src="([^"]+)"[^>]*?/?>"#).unwrap()
});

fn is_external(url: &str) -> bool {
    url.starts_with("http://")
        || url.starts_with("https://")
        || url.starts_with("//")
        || url.starts_with("data:")
}

fn resolve(path: &str, url: &str) -> String {
    if let Some(stripped) = url.strip_prefix('/') {
        return stripped.to_string();
    }
    let base = std::path::Path::new(path).parent().unwrap_or_else(|| std::path::Path::new(""));
    base.join(url).to_string_lossy().replace('\\', "/")
}

fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

impl Stage for InlineSourceStage {
    fn name(&self) -> &str {
        "inline-source"
    }

    fn apply(&self, files: &mut FileStore, _ctx: &mut Context) -> Result<(), PluginError> {
        let matched = files.matching_any(&self.patterns);
        for path in matched {
            let Some(body) = files.get(&path).and_then(|f| f.contents_str()).map(str::to_string) else {
                continue;
            };

            let mut rewritten = body;

            rewritten = rewrite_all(&rewritten, &SCRIPT_TAG, &path, files, self.max_size, |asset_body, _ext| {
                format!("<script type=\"text/javascript\">{asset_body}</script>")
            });
            rewritten = rewrite_all(&rewritten, &LINK_TAG, &path, files, self.max_size, |asset_body, _ext| {
                format!("<style>{asset_body}</style>")
            });
            rewritten = rewrite_image_tags(&rewritten, &path, files, self.max_size);

            if let Some(f) = files.get_mut(&path) {
                f.set_contents_str(rewritten);
            }
        }
        Ok(())
    }
}

fn rewrite_all(
    body: &str,
    re: &Regex,
    path: &str,
    files: &FileStore,
    max_size: usize,
    wrap: impl Fn(&str, &str) -> String,
) -> String {
    re.replace_all(body, |caps: &regex::Captures| {
        let url = &caps[1];
        if is_external(url) {
            return caps[0].to_string();
        }
        let resolved = resolve(path, url);
        match files.get(&resolved) {
            Some(asset) if asset.contents.len() < max_size => {
                let text = asset.contents_str().unwrap_or_default();
                let ext = std::path::Path::new(&resolved)
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or_default();
                wrap(text, ext)
            }
            _ => caps[0].to_string(),
        }
    })
    .into_owned()
}

fn rewrite_image_tags(body: &str, path: &str, files: &FileStore, max_size: usize) -> String {
    IMG_TAG
        .replace_all(body, |caps: &regex::Captures| {
            let url = &caps[1];
            if is_external(url) {
                return caps[0].to_string();
            }
            let resolved = resolve(path, url);
            match files.get(&resolved) {
                Some(asset) if asset.contents.len() < max_size => {
                    use base64::Engine;
                    let ext = std::path::Path::new(&resolved)
                        .extension()
                        .and_then(|e| e.to_str())
                        .unwrap_or_default();
                    let mime = mime_for_extension(ext);
                    let encoded = base64::engine::general_purpose::STANDARD.encode(&asset.contents);
                    let full_tag = &caps[0];
                    full_tag.replace(url, &format!("data:{mime};base64,{encoded}"))
                }
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BuildMode, SiteConfig};
    use crate::file::VirtualFile;

    #[test]
    fn inlines_small_stylesheet() {
        let mut files = FileStore::new();
        files.set("style.css", VirtualFile::new("style.css", b"body{color:red}".to_vec()));
        files.set(
            "index.html",
            VirtualFile::new(
                "index.html",
                br#"<html><link rel="stylesheet" href="style.css"></html>"#.to_vec(),
            ),
        );
        let stage = InlineSourceStage::default();
        let mut ctx = Context::new(SiteConfig::default(), BuildMode::Production);
        stage.apply(&mut files, &mut ctx).unwrap();
        let body = files.get("index.html").unwrap().contents_str().unwrap();
        assert!(body.contains("<style>body{color:red}</style>"));
    }

    #[test]
    fn skips_external_urls() {
        let mut files = FileStore::new();
        files.set(
            "index.html",
            VirtualFile::new(
                "index.html",
                br#"<script src="https://cdn.example.com/a.js"></script>"#.to_vec(),
            ),
        );
        let stage = InlineSourceStage::default();
        let mut ctx = Context::new(SiteConfig::default(), BuildMode::Production);
        stage.apply(&mut files, &mut ctx).unwrap();
        let body = files.get("index.html").unwrap().contents_str().unwrap();
        assert!(body.contains("https://cdn.example.com/a.js"));
    }
}
