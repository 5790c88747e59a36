//! The publish (visibility filter) stage, per §4.4: removes drafts,
//! private files, and future-dated posts, subject to development-mode
//! overrides.

use crate::context::{BuildMode, Context};
use crate::error::PluginError;
use crate::stage::Stage;
use crate::store::FileStore;
use crate::value::Value;
use chrono::Utc;

/// Removes files the site should not publish.
#[derive(Debug, Clone, Default)]
pub struct PublishStage {
    /// When `true`, drafts are kept even in production mode.
    pub include_drafts: bool,
    /// When `true`, private files are kept regardless of mode.
    pub include_private: bool,
    /// When `true`, future-dated files are kept even in production mode.
    pub include_future: bool,
}

impl Stage for PublishStage {
    fn name(&self) -> &str {
        "publish"
    }

    fn apply(&self, files: &mut FileStore, ctx: &mut Context) -> Result<(), PluginError> {
        let dev = ctx.mode == BuildMode::Development;
        let now = Utc::now();

        let mut draft_count = 0;
        let mut private_count = 0;
        let mut future_count = 0;

        let to_remove: Vec<String> = files
            .iter()
            .filter(|(_, file)| {
                let is_draft = is_draft(&file.metadata);
                let is_private = is_private(&file.metadata);
                let is_future = file
                    .metadata
                    .get("date")
                    .and_then(Value::as_date)
                    .map(|date| date > now)
                    .unwrap_or(false);

                let exclude_draft = is_draft && !self.include_drafts && !dev;
                let exclude_private = is_private && !self.include_private;
                let exclude_future = is_future && !self.include_future && !dev;

                if exclude_draft {
                    draft_count += 1;
                }
                if exclude_private {
                    private_count += 1;
                }
                if exclude_future {
                    future_count += 1;
                }

                exclude_draft || exclude_private || exclude_future
            })
            .map(|(path, _)| path.clone())
            .collect();

        for path in &to_remove {
            files.remove(path);
        }

        log::info!(
            "publish: removed {} drafts, {} private, {} future-dated files",
            draft_count,
            private_count,
            future_count
        );

        Ok(())
    }
}

fn is_draft(metadata: &crate::value::Metadata) -> bool {
    metadata.get("draft").and_then(Value::as_bool).unwrap_or(false)
        || metadata.get("publish").and_then(Value::as_str) == Some("draft")
}

fn is_private(metadata: &crate::value::Metadata) -> bool {
    metadata.get("private").and_then(Value::as_bool).unwrap_or(false)
        || metadata.get("publish").and_then(Value::as_str) == Some("private")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SiteConfig;
    use crate::file::VirtualFile;

    fn ctx(mode: BuildMode) -> Context {
        Context::new(SiteConfig::default(), mode)
    }

    #[test]
    fn draft_excluded_in_production_kept_in_development() {
        let mut files = FileStore::new();
        let mut f = VirtualFile::new("a.html", b"x".to_vec());
        f.metadata.insert("draft".to_string(), Value::Bool(true));
        files.set("a.html", f);

        let stage = PublishStage::default();
        let mut prod_files = files.clone();
        stage.apply(&mut prod_files, &mut ctx(BuildMode::Production)).unwrap();
        assert!(prod_files.get("a.html").is_none());

        let mut dev_files = files;
        stage.apply(&mut dev_files, &mut ctx(BuildMode::Development)).unwrap();
        assert!(dev_files.get("a.html").is_some());
    }

    #[test]
    fn private_excluded_regardless_of_mode() {
        let mut files = FileStore::new();
        let mut f = VirtualFile::new("a.html", b"x".to_vec());
        f.metadata.insert("private".to_string(), Value::Bool(true));
        files.set("a.html", f);

        let stage = PublishStage::default();
        stage.apply(&mut files, &mut ctx(BuildMode::Development)).unwrap();
        assert!(files.get("a.html").is_none());
    }

    #[test]
    fn publish_enum_and_booleans_are_equivalent() {
        let mut files = FileStore::new();
        let mut f = VirtualFile::new("a.html", b"x".to_vec());
        f.metadata.insert("publish".to_string(), Value::from("draft"));
        files.set("a.html", f);

        let stage = PublishStage::default();
        stage.apply(&mut files, &mut ctx(BuildMode::Production)).unwrap();
        assert!(files.get("a.html").is_none());
    }
}
