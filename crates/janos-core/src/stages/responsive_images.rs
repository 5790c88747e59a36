//! The responsive-images stage, per §4.16: turns Markdown-style
//! `![alt](url "title")` image references in matching files into
//! `<picture>` elements backed by codec-generated variants, fanning out
//! across images with `rayon` (bounded by the pool's default parallelism)
//! and committing results sequentially per §5's "gather, then commit" rule.

use crate::context::Context;
use crate::error::PluginError;
use crate::image_codec::{EncodedVariant, ImageCodec, ImageFormat, VariantRequest};
use crate::stage::Stage;
use crate::store::FileStore;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

static IMAGE_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"!\[([^\]]*)\]\(([^ )]+)(?:\s+"([^"]*)")?\)"#).unwrap()
});

/// One requested output configuration.
#[derive(Debug, Clone)]
pub struct ResponsiveImagesConfig {
    /// Output formats, most-modern first is computed automatically via
    /// [`ImageFormat::modernity_rank`] regardless of this order.
    pub formats: Vec<ImageFormat>,
    /// Requested widths, in pixels.
    pub sizes: Vec<u32>,
    /// Encoder quality, 1-100.
    pub quality: u8,
    /// Directory under which generated variants are stored.
    pub output_dir: String,
}

impl Default for ResponsiveImagesConfig {
    fn default() -> Self {
        Self {
            formats: vec![ImageFormat::WebP, ImageFormat::Jpeg],
            sizes: vec![480, 800, 1200],
            quality: 80,
            output_dir: "img/generated".to_string(),
        }
    }
}

/// Transforms Markdown image references into `<picture>` elements.
pub struct ResponsiveImagesStage {
    /// Glob(s) selecting files to scan. Default `**/*.md`, `**/*.html`.
    pub patterns: Vec<String>,
    /// Output configuration.
    pub config: ResponsiveImagesConfig,
    /// The codec collaborator.
    pub codec: Arc<dyn ImageCodec + Send + Sync>,
}

fn is_external(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://") || url.starts_with("//")
}

fn picture_html(alt: &str, title: Option<&str>, variants_by_format: &[(ImageFormat, Vec<(String, u32)>)], fallback: &str, sizes_attr: Option<&str>) -> String {
    let mut sources = String::new();
    let mut sorted = variants_by_format.to_vec();
    sorted.sort_by_key(|(f, _)| f.modernity_rank());
    for (format, srcset) in &sorted {
        let srcset_str = srcset
            .iter()
            .map(|(url, w)| format!("{url} {w}w"))
            .collect::<Vec<_>>()
            .join(", ");
        let sizes_fragment = sizes_attr.map(|s| format!(" sizes=\"{s}\"")).unwrap_or_default();
        sources.push_str(&format!(
            "<source type=\"{}\" srcset=\"{}\"{}>",
            format.mime_type(),
            srcset_str,
            sizes_fragment
        ));
    }
    let title_attr = title.map(|t| format!(" title=\"{t}\"")).unwrap_or_default();
    format!(
        "<picture>{sources}<img src=\"{fallback}\" alt=\"{alt}\"{title_attr} loading=\"lazy\" decoding=\"async\"></picture>"
    )
}

impl Stage for ResponsiveImagesStage {
    fn name(&self) -> &str {
        "responsive-images"
    }

    fn apply(&self, files: &mut FileStore, _ctx: &mut Context) -> Result<(), PluginError> {
        let matched = files.matching_any(&self.patterns);
        let mut cache: HashMap<String, String> = HashMap::new();
        let mut generated_variants: Vec<(String, Vec<u8>)> = Vec::new();

        for path in matched {
            let Some(body) = files.get(&path).and_then(|f| f.contents_str()).map(str::to_string) else {
                continue;
            };

            let refs: Vec<(String, String, Option<String>)> = IMAGE_REF
                .captures_iter(&body)
                .map(|c| {
                    (
                        c.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
                        c.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
                        c.get(3).map(|m| m.as_str().to_string()),
                    )
                })
                .collect();

            let to_process: Vec<(String, String, Option<String>)> = refs
                .into_iter()
                .filter(|(_, url, _)| !is_external(url) && !cache.contains_key(url))
                .collect();

            #[cfg(feature = "parallel")]
            let processed: Vec<Option<(String, String, Vec<(String, Vec<u8>)>)>> = to_process
                .par_iter()
                .map(|(alt, url, title)| self.process_one(files, alt, url, title.as_deref()))
                .collect();
            #[cfg(not(feature = "parallel"))]
            let processed: Vec<Option<(String, String, Vec<(String, Vec<u8>)>)>> = to_process
                .iter()
                .map(|(alt, url, title)| self.process_one(files, alt, url, title.as_deref()))
                .collect();

            for item in processed.into_iter().flatten() {
                let (url, html, variants) = item;
                cache.insert(url, html);
                generated_variants.extend(variants);
            }

            let mut new_body = body;
            for (alt, url, title) in IMAGE_REF
                .captures_iter(&new_body.clone())
                .map(|c| {
                    (
                        c.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
                        c.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
                        c.get(3).map(|m| m.as_str().to_string()),
                    )
                })
                .collect::<Vec<_>>()
            {
                let _ = (&alt, &title);
                if let Some(html) = cache.get(&url) {
                    let full_match = format!(
                        "![{}]({}{})",
                        alt,
                        url,
                        title.as_ref().map(|t| format!(" \"{t}\"")).unwrap_or_default()
                    );
                    new_body = new_body.replacen(&full_match, html, 1);
                }
            }

            for (variant_path, data) in generated_variants.drain(..) {
                files.set(
                    variant_path.clone(),
                    crate::file::VirtualFile::new(variant_path, data),
                );
            }

            if let Some(f) = files.get_mut(&path) {
                f.set_contents_str(new_body);
            }
        }

        Ok(())
    }
}

impl ResponsiveImagesStage {
    fn process_one(
        &self,
        files: &FileStore,
        alt: &str,
        url: &str,
        title: Option<&str>,
    ) -> Option<(String, String, Vec<(String, Vec<u8>)>)> {
        let resolved = url.trim_start_matches('/').to_string();
        let source = files.get(&resolved)?;
        if !self.codec.is_supported(&source.contents) {
            return Some((
                url.to_string(),
                format!("<picture><img src=\"{url}\" alt=\"{alt}\" loading=\"lazy\" decoding=\"async\"></picture>"),
                Vec::new(),
            ));
        }

        let requests: Vec<VariantRequest> = self
            .config
            .formats
            .iter()
            .flat_map(|&format| {
                self.config.sizes.iter().map(move |&width| VariantRequest {
                    format,
                    width,
                    quality: self.config.quality,
                })
            })
            .collect();

        let variants: Vec<EncodedVariant> = self
            .codec
            .process(&source.contents, &requests)
            .unwrap_or_default();

        let stem = std::path::Path::new(&resolved)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");

        let mut by_format: HashMap<ImageFormat, Vec<(String, u32)>> = HashMap::new();
        let mut generated = Vec::new();
        for variant in &variants {
            let name = format!(
                "{}/{}-{}.{}",
                self.config.output_dir,
                stem,
                variant.width,
                variant.format.extension()
            );
            by_format.entry(variant.format).or_default().push((name.clone(), variant.width));
            generated.push((name, variant.data.clone()));
        }

        let fallback = by_format
            .values()
            .flat_map(|v| v.iter())
            .max_by_key(|(_, w)| *w)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| url.to_string());

        let grouped: Vec<(ImageFormat, Vec<(String, u32)>)> = by_format.into_iter().collect();
        let html = picture_html(alt, title, &grouped, &fallback, None);

        Some((url.to_string(), html, generated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BuildMode, SiteConfig};
    use crate::file::VirtualFile;
    use crate::image_codec::CodecError;

    struct StubCodec;
    impl ImageCodec for StubCodec {
        fn is_supported(&self, bytes: &[u8]) -> bool {
            bytes.starts_with(b"\x89PNG")
        }
        fn process(&self, _bytes: &[u8], requests: &[VariantRequest]) -> Result<Vec<EncodedVariant>, CodecError> {
            Ok(requests
                .iter()
                .map(|r| EncodedVariant {
                    format: r.format,
                    data: vec![0; 10],
                    width: r.width,
                    height: r.width / 2,
                })
                .collect())
        }
    }

    #[test]
    fn converts_markdown_image_to_picture() {
        let mut files = FileStore::new();
        files.set("img/a.png", VirtualFile::new("img/a.png", b"\x89PNG\r\n".to_vec()));
        files.set(
            "post.md",
            VirtualFile::new("post.md", b"![alt text](img/a.png \"A title\")".to_vec()),
        );

        let stage = ResponsiveImagesStage {
            patterns: vec!["**/*.md".to_string()],
            config: ResponsiveImagesConfig {
                formats: vec![ImageFormat::WebP],
                sizes: vec![400],
                quality: 80,
                output_dir: "img/generated".to_string(),
            },
            codec: Arc::new(StubCodec),
        };
        let mut ctx = Context::new(SiteConfig::default(), BuildMode::Production);
        stage.apply(&mut files, &mut ctx).unwrap();

        let body = files.get("post.md").unwrap().contents_str().unwrap();
        assert!(body.contains("<picture>"));
        assert!(body.contains("<source type=\"image/webp\""));
    }
}
