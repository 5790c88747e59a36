//! The feeds stage, per §4.18: RSS 2.0 (and optionally Atom 1.0) over a
//! collection's most recent items, written with `quick-xml`.

use crate::context::Context;
use crate::datefmt::{to_rfc3339, to_rfc822};
use crate::error::PluginError;
use crate::stage::Stage;
use crate::store::FileStore;
use crate::value::Value;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

/// Emits RSS/Atom feeds from a collection's most recent items.
#[derive(Debug, Clone)]
pub struct FeedsStage {
    /// Name of the collection to read, default `posts`.
    pub collection: String,
    /// Number of most-recent items to include, default 20.
    pub limit: usize,
    /// Output path for the RSS document, default `rss.xml`.
    pub destination: String,
    /// Output path for the Atom document, if any.
    pub atom_destination: Option<String>,
    /// Metadata field holding the item description. Default `excerpt`.
    pub description_field: String,
    /// Whether to emit full content as CDATA. Default false.
    pub full_content: bool,
    /// Metadata field holding full content. Default `contents`.
    pub content_field: String,
}

impl Default for FeedsStage {
    fn default() -> Self {
        Self {
            collection: "posts".to_string(),
            limit: 20,
            destination: "rss.xml".to_string(),
            atom_destination: None,
            description_field: "excerpt".to_string(),
            full_content: false,
            content_field: "contents".to_string(),
        }
    }
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, name: &str, content: &str) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(content)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))
}

fn write_cdata<W: std::io::Write>(writer: &mut Writer<W>, name: &str, content: &str) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::CData(quick_xml::events::BytesCData::new(content)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))
}

fn item_link(base_url: &str, item: &Value) -> String {
    let map = item.as_map();
    let path_or_permalink = map
        .and_then(|m| m.get("permalink"))
        .and_then(Value::as_str)
        .or_else(|| map.and_then(|m| m.get("path")).and_then(Value::as_str))
        .unwrap_or("");
    format!("{}/{}", base_url.trim_end_matches('/'), path_or_permalink.trim_start_matches('/'))
}

impl Stage for FeedsStage {
    fn name(&self) -> &str {
        "feeds"
    }

    fn apply(&self, files: &mut FileStore, ctx: &mut Context) -> Result<(), PluginError> {
        let items: Vec<Value> = ctx
            .collections
            .get(&self.collection)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .take(self.limit)
            .collect();

        let base_url = ctx.site.base_url.clone();
        let now = to_rfc822(chrono::Utc::now());

        let rss = self
            .build_rss(&items, &base_url, &now)
            .map_err(|e| PluginError::msg(self.name(), e.to_string()))?;
        let mut rss_file = crate::file::VirtualFile::new(self.destination.clone(), rss.into_bytes());
        rss_file.metadata.insert("layout".to_string(), Value::Bool(false));
        files.set(self.destination.clone(), rss_file);

        if let Some(atom_path) = &self.atom_destination {
            let atom = self
                .build_atom(&items, &base_url)
                .map_err(|e| PluginError::msg(self.name(), e.to_string()))?;
            let mut atom_file = crate::file::VirtualFile::new(atom_path.clone(), atom.into_bytes());
            atom_file.metadata.insert("layout".to_string(), Value::Bool(false));
            files.set(atom_path.clone(), atom_file);
        }

        Ok(())
    }
}

impl FeedsStage {
    fn build_rss(&self, items: &[Value], base_url: &str, last_build_date: &str) -> Result<String, quick_xml::Error> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut rss_start = BytesStart::new("rss");
        rss_start.push_attribute(("version", "2.0"));
        rss_start.push_attribute(("xmlns:atom", "http://www.w3.org/2005/Atom"));
        rss_start.push_attribute(("xmlns:content", "http://purl.org/rss/1.0/modules/content/"));
        writer.write_event(Event::Start(rss_start))?;
        writer.write_event(Event::Start(BytesStart::new("channel")))?;

        write_element(&mut writer, "title", base_url)?;
        write_element(&mut writer, "link", base_url)?;
        write_element(&mut writer, "description", base_url)?;
        write_element(&mut writer, "lastBuildDate", last_build_date)?;

        for item in items {
            let map = item.as_map();
            let title = map.and_then(|m| m.get("title")).map(Value::display_string).unwrap_or_default();
            let link = item_link(base_url, item);
            let description = map
                .and_then(|m| m.get(&self.description_field))
                .map(Value::display_string)
                .unwrap_or_default();
            let pub_date = map
                .and_then(|m| m.get("date"))
                .and_then(Value::as_date)
                .map(to_rfc822)
                .unwrap_or_default();

            writer.write_event(Event::Start(BytesStart::new("item")))?;
            write_element(&mut writer, "title", &title)?;
            write_element(&mut writer, "link", &link)?;

            let mut guid_start = BytesStart::new("guid");
            guid_start.push_attribute(("isPermaLink", "true"));
            writer.write_event(Event::Start(guid_start))?;
            writer.write_event(Event::Text(BytesText::new(&link)))?;
            writer.write_event(Event::End(BytesEnd::new("guid")))?;

            if !pub_date.is_empty() {
                write_element(&mut writer, "pubDate", &pub_date)?;
            }
            write_element(&mut writer, "description", &description)?;

            if self.full_content {
                let full = map
                    .and_then(|m| m.get(&self.content_field))
                    .map(Value::display_string)
                    .unwrap_or_default();
                write_cdata(&mut writer, "content:encoded", &full)?;
            }

            writer.write_event(Event::End(BytesEnd::new("item")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("channel")))?;
        writer.write_event(Event::End(BytesEnd::new("rss")))?;

        Ok(String::from_utf8_lossy(&writer.into_inner().into_inner()).into_owned())
    }

    fn build_atom(&self, items: &[Value], base_url: &str) -> Result<String, quick_xml::Error> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut feed_start = BytesStart::new("feed");
        feed_start.push_attribute(("xmlns", "http://www.w3.org/2005/Atom"));
        writer.write_event(Event::Start(feed_start))?;

        write_element(&mut writer, "title", base_url)?;
        write_element(&mut writer, "id", base_url)?;
        write_element(&mut writer, "updated", &to_rfc3339(chrono::Utc::now()))?;

        for item in items {
            let map = item.as_map();
            let title = map.and_then(|m| m.get("title")).map(Value::display_string).unwrap_or_default();
            let link = item_link(base_url, item);
            let summary = map
                .and_then(|m| m.get(&self.description_field))
                .map(Value::display_string)
                .unwrap_or_default();
            let published = map
                .and_then(|m| m.get("date"))
                .and_then(Value::as_date)
                .map(to_rfc3339)
                .unwrap_or_default();

            writer.write_event(Event::Start(BytesStart::new("entry")))?;
            write_element(&mut writer, "title", &title)?;
            write_element(&mut writer, "id", &link)?;

            let mut link_start = BytesStart::new("link");
            link_start.push_attribute(("href", link.as_str()));
            writer.write_event(Event::Empty(link_start))?;

            if !published.is_empty() {
                write_element(&mut writer, "published", &published)?;
                write_element(&mut writer, "updated", &published)?;
            }
            write_element(&mut writer, "summary", &summary)?;

            if self.full_content {
                let full = map
                    .and_then(|m| m.get(&self.content_field))
                    .map(Value::display_string)
                    .unwrap_or_default();
                write_element(&mut writer, "content", &full)?;
            }

            writer.write_event(Event::End(BytesEnd::new("entry")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("feed")))?;

        Ok(String::from_utf8_lossy(&writer.into_inner().into_inner()).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BuildMode, SiteConfig};
    use crate::value::Metadata;

    fn post(title: &str, path: &str) -> Value {
        let mut m: Metadata = Metadata::new();
        m.insert("title".to_string(), Value::from(title));
        m.insert("path".to_string(), Value::from(path));
        m.insert("excerpt".to_string(), Value::from("summary"));
        Value::Map(m)
    }

    #[test]
    fn emits_rss_with_items_and_layout_false() {
        let mut files = FileStore::new();
        let mut ctx = Context::new(
            SiteConfig {
                title: "My Site".to_string(),
                base_url: "https://example.com".to_string(),
                ..SiteConfig::default()
            },
            BuildMode::Production,
        );
        ctx.collections.insert(
            "posts".to_string(),
            vec![post("First", "posts/first/"), post("Second", "posts/second/")],
        );

        let stage = FeedsStage::default();
        stage.apply(&mut files, &mut ctx).unwrap();

        let rss = files.get("rss.xml").unwrap();
        assert_eq!(rss.metadata.get("layout"), Some(&Value::Bool(false)));
        let body = rss.contents_str().unwrap();
        assert!(body.contains("<rss version=\"2.0\""));
        assert!(body.contains("<title>First</title>"));
        assert!(body.contains("isPermaLink=\"true\""));
    }

    #[test]
    fn limit_truncates_items() {
        let mut files = FileStore::new();
        let mut ctx = Context::new(
            SiteConfig {
                base_url: "https://example.com".to_string(),
                ..SiteConfig::default()
            },
            BuildMode::Production,
        );
        ctx.collections.insert(
            "posts".to_string(),
            (0..5).map(|i| post(&format!("Post {i}"), &format!("posts/{i}/"))).collect(),
        );
        let stage = FeedsStage {
            limit: 2,
            ..FeedsStage::default()
        };
        stage.apply(&mut files, &mut ctx).unwrap();
        let body = files.get("rss.xml").unwrap().contents_str().unwrap();
        assert_eq!(body.matches("<item>").count(), 2);
    }
}
