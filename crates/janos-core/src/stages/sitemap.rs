//! The sitemap stage, per §4.19: enumerate publishable HTML files, skip
//! excluded/noindex ones, and emit a Sitemaps-0.9 document.

use crate::context::Context;
use crate::error::PluginError;
use crate::stage::Stage;
use crate::store::FileStore;
use crate::value::Value;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

/// Emits a `sitemap.xml` covering all publishable HTML output.
#[derive(Debug, Clone)]
pub struct SitemapStage {
    /// Glob(s) selecting candidate files. Default `**/*.html`.
    pub patterns: Vec<String>,
    /// Glob(s) excluded regardless of match. Defaults include 404/500 and
    /// underscore-prefixed directories.
    pub exclude: Vec<String>,
    /// Output path, default `sitemap.xml`.
    pub destination: String,
    /// Default `changefreq` when metadata doesn't specify one.
    pub default_changefreq: String,
    /// Default `priority` when metadata doesn't specify one.
    pub default_priority: String,
}

impl Default for SitemapStage {
    fn default() -> Self {
        Self {
            patterns: vec!["**/*.html".to_string()],
            exclude: vec![
                "**/404.html".to_string(),
                "**/500.html".to_string(),
                "**/_*/**".to_string(),
            ],
            destination: "sitemap.xml".to_string(),
            default_changefreq: "weekly".to_string(),
            default_priority: "0.5".to_string(),
        }
    }
}

fn absolute_url(base_url: &str, path: &str, permalink: Option<&str>) -> String {
    let chosen = permalink.unwrap_or(path);
    let stripped = chosen.strip_suffix("index.html").unwrap_or(chosen);
    format!("{}/{}", base_url.trim_end_matches('/'), stripped.trim_start_matches('/'))
}

impl Stage for SitemapStage {
    fn name(&self) -> &str {
        "sitemap"
    }

    fn apply(&self, files: &mut FileStore, ctx: &mut Context) -> Result<(), PluginError> {
        if ctx.site.base_url.is_empty() {
            log::warn!("sitemap: site.baseUrl is missing, skipping");
            return Ok(());
        }
        let base_url = ctx.site.base_url.clone();

        let excluded: Vec<String> = files.matching_any(&self.exclude);
        let candidates: Vec<String> = files
            .matching_any(&self.patterns)
            .into_iter()
            .filter(|p| !excluded.contains(p))
            .collect();

        let mut urls: Vec<(String, Option<String>, String, String)> = Vec::new();
        for path in candidates {
            let Some(file) = files.get(&path) else { continue };
            if file.metadata.get("sitemap") == Some(&Value::Bool(false)) {
                continue;
            }
            if file.metadata.get("noindex") == Some(&Value::Bool(true)) {
                continue;
            }

            let permalink = file.metadata.get("permalink").and_then(Value::as_str).map(String::from);
            let lastmod = file
                .metadata
                .get("modified")
                .or_else(|| file.metadata.get("date"))
                .and_then(Value::as_date)
                .map(|d| d.format("%Y-%m-%d").to_string());
            let changefreq = file
                .metadata
                .get("changefreq")
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_else(|| self.default_changefreq.clone());
            let priority = file
                .metadata
                .get("priority")
                .map(Value::display_string)
                .unwrap_or_else(|| self.default_priority.clone());

            let url = absolute_url(&base_url, &path, permalink.as_deref());
            urls.push((url, lastmod, changefreq, priority));
        }

        urls.sort_by(|a, b| a.0.cmp(&b.0));

        let xml = self
            .build_xml(&urls)
            .map_err(|e| PluginError::msg(self.name(), e.to_string()))?;

        let mut file = crate::file::VirtualFile::new(self.destination.clone(), xml.into_bytes());
        file.metadata.insert("layout".to_string(), Value::Bool(false));
        files.set(self.destination.clone(), file);

        Ok(())
    }
}

impl SitemapStage {
    fn build_xml(&self, urls: &[(String, Option<String>, String, String)]) -> Result<String, quick_xml::Error> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut urlset_start = BytesStart::new("urlset");
        urlset_start.push_attribute(("xmlns", "http://www.sitemaps.org/schemas/sitemap/0.9"));
        writer.write_event(Event::Start(urlset_start))?;

        for (loc, lastmod, changefreq, priority) in urls {
            writer.write_event(Event::Start(BytesStart::new("url")))?;
            writer.write_event(Event::Start(BytesStart::new("loc")))?;
            writer.write_event(Event::Text(BytesText::new(loc)))?;
            writer.write_event(Event::End(BytesEnd::new("loc")))?;

            if let Some(lastmod) = lastmod {
                writer.write_event(Event::Start(BytesStart::new("lastmod")))?;
                writer.write_event(Event::Text(BytesText::new(lastmod)))?;
                writer.write_event(Event::End(BytesEnd::new("lastmod")))?;
            }

            writer.write_event(Event::Start(BytesStart::new("changefreq")))?;
            writer.write_event(Event::Text(BytesText::new(changefreq)))?;
            writer.write_event(Event::End(BytesEnd::new("changefreq")))?;

            writer.write_event(Event::Start(BytesStart::new("priority")))?;
            writer.write_event(Event::Text(BytesText::new(priority)))?;
            writer.write_event(Event::End(BytesEnd::new("priority")))?;

            writer.write_event(Event::End(BytesEnd::new("url")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("urlset")))?;

        Ok(String::from_utf8_lossy(&writer.into_inner().into_inner()).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BuildMode, SiteConfig};
    use crate::file::VirtualFile;

    #[test]
    fn excludes_noindex_and_sorts_lexicographically() {
        let mut files = FileStore::new();
        files.set("b.html", VirtualFile::new("b.html", b"b".to_vec()));
        files.set("a.html", VirtualFile::new("a.html", b"a".to_vec()));
        let mut noindexed = VirtualFile::new("secret.html", b"s".to_vec());
        noindexed.metadata.insert("noindex".to_string(), Value::Bool(true));
        files.set("secret.html", noindexed);
        files.set("404.html", VirtualFile::new("404.html", b"nf".to_vec()));

        let mut ctx = Context::new(
            SiteConfig {
                base_url: "https://example.com".to_string(),
                ..SiteConfig::default()
            },
            BuildMode::Production,
        );
        let stage = SitemapStage::default();
        stage.apply(&mut files, &mut ctx).unwrap();

        let body = files.get("sitemap.xml").unwrap().contents_str().unwrap();
        assert!(body.contains("https://example.com/a.html"));
        assert!(body.contains("https://example.com/b.html"));
        assert!(!body.contains("secret.html"));
        assert!(!body.contains("404.html"));
        let a_pos = body.find("a.html").unwrap();
        let b_pos = body.find("b.html").unwrap();
        assert!(a_pos < b_pos);
    }

    #[test]
    fn missing_base_url_skips_emission() {
        let mut files = FileStore::new();
        files.set("a.html", VirtualFile::new("a.html", b"a".to_vec()));
        let mut ctx = Context::new(SiteConfig::default(), BuildMode::Production);
        let stage = SitemapStage::default();
        stage.apply(&mut files, &mut ctx).unwrap();
        assert!(files.get("sitemap.xml").is_none());
    }
}
