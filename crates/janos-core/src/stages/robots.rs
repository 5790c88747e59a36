//! The robots stage (supplemented feature): emits `robots.txt` referencing
//! the sitemap when `site.baseUrl` is set. Off by default; enabled only by
//! presence in the pipeline list.

use crate::context::Context;
use crate::error::PluginError;
use crate::file::VirtualFile;
use crate::stage::Stage;
use crate::store::FileStore;
use crate::value::Value;

/// Emits a `robots.txt` referencing the sitemap.
#[derive(Debug, Clone)]
pub struct RobotsStage {
    /// Output path, default `robots.txt`.
    pub destination: String,
    /// Path to the sitemap, joined with `site.baseUrl`. Default `sitemap.xml`.
    pub sitemap_path: String,
    /// Disallow rules, one `User-agent: *` block per entry.
    pub disallow: Vec<String>,
}

impl Default for RobotsStage {
    fn default() -> Self {
        Self {
            destination: "robots.txt".to_string(),
            sitemap_path: "sitemap.xml".to_string(),
            disallow: Vec::new(),
        }
    }
}

impl Stage for RobotsStage {
    fn name(&self) -> &str {
        "robots"
    }

    fn apply(&self, files: &mut FileStore, ctx: &mut Context) -> Result<(), PluginError> {
        if ctx.site.base_url.is_empty() {
            log::warn!("robots: site.baseUrl is missing, skipping");
            return Ok(());
        }

        let mut body = String::from("User-agent: *\n");
        if self.disallow.is_empty() {
            body.push_str("Disallow:\n");
        } else {
            for rule in &self.disallow {
                body.push_str(&format!("Disallow: {rule}\n"));
            }
        }
        body.push_str(&format!(
            "\nSitemap: {}/{}\n",
            ctx.site.base_url.trim_end_matches('/'),
            self.sitemap_path.trim_start_matches('/')
        ));

        let mut file = VirtualFile::new(self.destination.clone(), body.into_bytes());
        file.metadata.insert("layout".to_string(), Value::Bool(false));
        files.set(self.destination.clone(), file);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BuildMode, SiteConfig};

    #[test]
    fn emits_robots_txt_with_sitemap_reference() {
        let mut files = FileStore::new();
        let mut ctx = Context::new(
            SiteConfig {
                base_url: "https://example.com".to_string(),
                ..SiteConfig::default()
            },
            BuildMode::Production,
        );
        RobotsStage::default().apply(&mut files, &mut ctx).unwrap();
        let body = files.get("robots.txt").unwrap().contents_str().unwrap();
        assert!(body.contains("Sitemap: https://example.com/sitemap.xml"));
        assert!(body.contains("User-agent: *"));
    }

    #[test]
    fn skips_when_base_url_missing() {
        let mut files = FileStore::new();
        let mut ctx = Context::new(SiteConfig::default(), BuildMode::Production);
        RobotsStage::default().apply(&mut files, &mut ctx).unwrap();
        assert!(files.get("robots.txt").is_none());
    }
}
