//! The assets stage, per §4.13: copies files from one or more
//! `{source, destination}` directory pairs, leaving the originals in place.

use crate::context::Context;
use crate::error::PluginError;
use crate::stage::Stage;
use crate::store::FileStore;

/// One source -> destination directory mapping.
#[derive(Debug, Clone)]
pub struct AssetMapping {
    /// Source directory prefix, leading/trailing slashes ignored.
    pub source: String,
    /// Destination directory prefix, leading/trailing slashes ignored.
    pub destination: String,
}

/// Copies files between directory prefixes.
#[derive(Debug, Clone, Default)]
pub struct AssetsStage {
    /// The configured source/destination pairs.
    pub mappings: Vec<AssetMapping>,
}

fn normalize_dir(dir: &str) -> String {
    dir.trim_matches('/').to_string()
}

impl Stage for AssetsStage {
    fn name(&self) -> &str {
        "assets"
    }

    fn apply(&self, files: &mut FileStore, _ctx: &mut Context) -> Result<(), PluginError> {
        for mapping in &self.mappings {
            let source = normalize_dir(&mapping.source);
            let destination = normalize_dir(&mapping.destination);
            let prefix = format!("{source}/");

            let matched: Vec<String> = files
                .iter()
                .filter(|(path, _)| path.starts_with(&prefix))
                .map(|(path, _)| path.clone())
                .collect();

            for path in matched {
                let Some(relative) = path.strip_prefix(&prefix) else {
                    continue;
                };
                let new_path = if destination.is_empty() {
                    relative.to_string()
                } else {
                    format!("{destination}/{relative}")
                };
                if let Some(original) = files.get(&path).cloned() {
                    let mut copy = original;
                    copy.path = new_path.clone();
                    files.set(new_path, copy);
                }
            }
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
    fn copies_files_under_destination_keeping_original() {
        let mut files = FileStore::new();
        files.set("static/logo.png", VirtualFile::new("static/logo.png", b"PNG".to_vec()));
        let stage = AssetsStage {
            mappings: vec![AssetMapping {
                source: "static".to_string(),
                destination: "assets".to_string(),
            }],
        };
        let mut ctx = Context::new(SiteConfig::default(), BuildMode::Production);
        stage.apply(&mut files, &mut ctx).unwrap();

        assert!(files.get("static/logo.png").is_some());
        assert!(files.get("assets/logo.png").is_some());
    }
}
