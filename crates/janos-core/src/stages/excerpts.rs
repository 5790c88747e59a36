//! The excerpts stage, per §4.5: extract the text before the first excerpt
//! marker into `metadata.excerpt`, removing the marker from the body.

use crate::context::Context;
use crate::error::PluginError;
use crate::stage::Stage;
use crate::store::FileStore;
use crate::value::Value;

/// Scans matching files for an excerpt marker.
#[derive(Debug, Clone)]
pub struct ExcerptsStage {
    /// Glob(s) selecting which files to scan.
    pub patterns: Vec<String>,
    /// The marker substring, default `<!-- more -->`.
    pub marker: String,
    /// Whether to trim the extracted excerpt's leading/trailing whitespace.
    pub trim: bool,
}

impl Default for ExcerptsStage {
    fn default() -> Self {
        Self {
            patterns: vec!["**/*.html".to_string()],
            marker: "<!-- more -->".to_string(),
            trim: true,
        }
    }
}

impl Stage for ExcerptsStage {
    fn name(&self) -> &str {
        "excerpts"
    }

    fn apply(&self, files: &mut FileStore, _ctx: &mut Context) -> Result<(), PluginError> {
        let matched = files.matching_any(&self.patterns);
        for path in matched {
            let Some(file) = files.get_mut(&path) else {
                continue;
            };
            let Some(body) = file.contents_str() else {
                continue;
            };
            let Some(idx) = body.find(&self.marker) else {
                continue;
            };
            let mut excerpt = body[..idx].to_string();
            if self.trim {
                excerpt = excerpt.trim().to_string();
            }
            let rest = &body[idx + self.marker.len()..];
            let new_body = format!("{}{}", &body[..idx], rest);
            file.metadata.insert("excerpt".to_string(), Value::from(excerpt));
            file.set_contents_str(new_body);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BuildMode, SiteConfig};
    use crate::file::VirtualFile;

    #[test]
    fn extracts_excerpt_and_strips_marker() {
        let mut files = FileStore::new();
        let body = "<p>Hello.</p>\n<!-- more -->\n<p>Rest.</p>";
        files.set("post.html", VirtualFile::new("post.html", body.as_bytes().to_vec()));

        let stage = ExcerptsStage::default();
        let mut ctx = Context::new(SiteConfig::default(), BuildMode::Production);
        stage.apply(&mut files, &mut ctx).unwrap();

        let file = files.get("post.html").unwrap();
        assert_eq!(
            file.metadata.get("excerpt").unwrap().as_str(),
            Some("<p>Hello.</p>")
        );
        let body = file.contents_str().unwrap();
        assert!(!body.contains("<!-- more -->"));
        assert!(body.contains("<p>Hello.</p>"));
        assert!(body.contains("<p>Rest.</p>"));
    }

    #[test]
    fn files_without_marker_are_left_unchanged() {
        let mut files = FileStore::new();
        files.set("post.html", VirtualFile::new("post.html", b"<p>No marker.</p>".to_vec()));
        let stage = ExcerptsStage::default();
        let mut ctx = Context::new(SiteConfig::default(), BuildMode::Production);
        stage.apply(&mut files, &mut ctx).unwrap();
        let file = files.get("post.html").unwrap();
        assert!(file.metadata.get("excerpt").is_none());
    }
}
