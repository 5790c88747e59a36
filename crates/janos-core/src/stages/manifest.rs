//! The manifest stage (supplemented feature): emits a minimal web app
//! manifest from `site` metadata.

use crate::context::Context;
use crate::error::PluginError;
use crate::file::VirtualFile;
use crate::stage::Stage;
use crate::store::FileStore;
use crate::value::Value;
use serde_json::json;

/// Emits `manifest.json` from `site.name`/`site.shortName`/`site.icons`.
#[derive(Debug, Clone, Default)]
pub struct ManifestStage {
    /// Output path, default `manifest.json`.
    pub destination: String,
}

impl Stage for ManifestStage {
    fn name(&self) -> &str {
        "manifest"
    }

    fn apply(&self, files: &mut FileStore, ctx: &mut Context) -> Result<(), PluginError> {
        let name = ctx
            .site
            .extra
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(&ctx.site.title)
            .to_string();
        if name.is_empty() {
            log::warn!("manifest: site.name/site.title is missing, skipping");
            return Ok(());
        }

        let short_name = ctx.site.extra.get("shortName").and_then(Value::as_str).unwrap_or(&name).to_string();

        let icons: Vec<serde_json::Value> = ctx
            .site
            .extra
            .get("icons")
            .and_then(Value::as_list)
            .map(|list| {
                list.iter()
                    .filter_map(Value::as_str)
                    .map(|src| {
                        json!({
                            "src": src,
                            "sizes": "512x512",
                            "type": "image/png",
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let manifest = json!({
            "name": name,
            "short_name": short_name,
            "start_url": ".",
            "display": "standalone",
            "background_color": "#ffffff",
            "theme_color": "#ffffff",
            "icons": icons,
        });

        let destination = if self.destination.is_empty() {
            "manifest.json".to_string()
        } else {
            self.destination.clone()
        };

        let body = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| PluginError::msg(self.name(), e.to_string()))?;
        let mut file = VirtualFile::new(destination.clone(), body);
        file.metadata.insert("layout".to_string(), Value::Bool(false));
        files.set(destination, file);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BuildMode, SiteConfig};

    #[test]
    fn emits_manifest_with_name_and_icons() {
        let mut files = FileStore::new();
        let mut site = SiteConfig {
            title: "My Site".to_string(),
            ..SiteConfig::default()
        };
        site.extra.insert(
            "icons".to_string(),
            Value::List(vec![Value::from("icon.png")]),
        );
        let mut ctx = Context::new(site, BuildMode::Production);
        ManifestStage::default().apply(&mut files, &mut ctx).unwrap();

        let body = files.get("manifest.json").unwrap().contents_str().unwrap();
        assert!(body.contains("\"name\": \"My Site\""));
        assert!(body.contains("icon.png"));
    }
}
