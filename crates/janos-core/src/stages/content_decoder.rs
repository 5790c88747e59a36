//! The frontmatter/markdown content decoder, per §4.2. Runs first in a
//! typical pipeline: splits each matching file's leading metadata block,
//! merges it into `file.metadata`, converts the remaining body through
//! `pulldown-cmark`, and re-keys `.md`/`.markdown` files to `.html`.

use crate::context::Context;
use crate::error::PluginError;
use crate::frontmatter;
use crate::markdown::{self, MarkdownOptions};
use crate::stage::Stage;
use crate::store::FileStore;

/// Decodes frontmatter and renders Markdown bodies to HTML.
pub struct ContentDecoderStage {
    /// Glob(s) selecting which files to decode. Defaults to Markdown
    /// extensions via [`ContentDecoderStage::default`].
    pub patterns: Vec<String>,
    /// Markdown rendering options.
    pub markdown_options: MarkdownOptions,
}

impl Default for ContentDecoderStage {
    fn default() -> Self {
        Self {
            patterns: vec!["**/*.md".to_string(), "**/*.markdown".to_string()],
            markdown_options: MarkdownOptions::default(),
        }
    }
}

impl Stage for ContentDecoderStage {
    fn name(&self) -> &str {
        "content-decoder"
    }

    fn apply(&self, files: &mut FileStore, ctx: &mut Context) -> Result<(), PluginError> {
        let matched: Vec<String> = files.matching_any(&self.patterns);

        for path in matched {
            let Some(file) = files.get(&path) else {
                continue;
            };
            let Some(raw) = file.contents_str().map(str::to_string) else {
                continue;
            };

            match frontmatter::decode(&path, &raw) {
                Ok(decoded) => {
                    let html = markdown::to_html(&decoded.body, &self.markdown_options);
                    let new_path = retarget_extension(&path);
                    if let Some(f) = files.get_mut(&path) {
                        for (k, v) in decoded.metadata {
                            f.metadata.insert(k, v);
                        }
                        f.set_contents_str(html);
                    }
                    if new_path != path {
                        files.rename(&path, new_path.clone());
                        ctx.record_rename(path.clone(), new_path);
                    }
                }
                Err(err) => {
                    log::warn!("{err}");
                    ctx.push_warning(self.name(), &err);
                }
            }
        }

        Ok(())
    }
}

fn retarget_extension(path: &str) -> String {
    if let Some(stripped) = path.strip_suffix(".markdown") {
        format!("{stripped}.html")
    } else if let Some(stripped) = path.strip_suffix(".md") {
        format!("{stripped}.html")
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SiteConfig;
    use crate::file::VirtualFile;

    fn ctx() -> Context {
        Context::new(SiteConfig::default(), crate::context::BuildMode::Production)
    }

    #[test]
    fn clean_url_scenario_decodes_and_rekeys() {
        let mut files = FileStore::new();
        files.set("about.md", VirtualFile::new("about.md", b"# About".to_vec()));
        let stage = ContentDecoderStage::default();
        stage.apply(&mut files, &mut ctx()).unwrap();
        assert!(files.get("about.md").is_none());
        let rendered = files.get("about.html").unwrap();
        assert!(rendered.contents_str().unwrap().contains("<h1>About</h1>"));
    }

    #[test]
    fn frontmatter_merges_into_metadata() {
        let mut files = FileStore::new();
        let raw = b"---\ntitle: Hi\n---\nBody".to_vec();
        files.set("post.md", VirtualFile::new("post.md", raw));
        let stage = ContentDecoderStage::default();
        stage.apply(&mut files, &mut ctx()).unwrap();
        let file = files.get("post.html").unwrap();
        assert_eq!(file.metadata.get("title").unwrap().as_str(), Some("Hi"));
    }

    #[test]
    fn unclosed_frontmatter_leaves_body_untouched_and_warns() {
        let mut files = FileStore::new();
        let raw = b"---\ntitle: Hi\nno close".to_vec();
        files.set("post.md", VirtualFile::new("post.md", raw));
        let stage = ContentDecoderStage::default();
        let mut c = ctx();
        stage.apply(&mut files, &mut c).unwrap();
        // File is left under its original key with the original bytes.
        let file = files.get("post.md").unwrap();
        assert!(file.contents_str().unwrap().contains("no close"));
        assert_eq!(c.warnings.len(), 1);
    }
}
