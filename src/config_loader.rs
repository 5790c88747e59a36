//! Reads `janos.config.json` from disk and builds a ready-to-run registry
//! and pipeline, per §4.20/§6. `janos-core::parse_config` validates the
//! `site`/`pipeline` shape; the directory defaults (`sourceDir`,
//! `outputDir`, `layoutsDir`) live only at this I/O boundary since core
//! stays filesystem-free.

use anyhow::{Context as _, Result};
use janos_core::config::{build_pipeline, parse_config, StageRegistry};
use janos_core::pipeline::Pipeline;
use serde_json::Value as Json;
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(feature = "templates")]
use crate::engine_minijinja::MinijinjaEngine;
#[cfg(feature = "webmentions")]
use crate::fetch::ReqwestFetcher;
#[cfg(feature = "image-optimization")]
use crate::image_impl::ImageCrateCodec;
#[cfg(feature = "webmentions")]
use crate::cache::FileCacheStore;
#[cfg(any(feature = "templates", feature = "image-optimization", feature = "webmentions"))]
use janos_core::config::StageFactory;
#[cfg(feature = "templates")]
use janos_core::stages::layouts::LayoutsStage;
#[cfg(feature = "templates")]
use janos_core::template_engine::DefaultVirtualLoader;
#[cfg(feature = "image-optimization")]
use janos_core::stages::responsive_images::{ResponsiveImagesConfig, ResponsiveImagesStage};
#[cfg(feature = "webmentions")]
use janos_core::stages::webmentions::WebmentionsStage;
#[cfg(feature = "webmentions")]
use janos_core::error::ConfigError;
#[cfg(any(feature = "templates", feature = "image-optimization", feature = "webmentions"))]
use std::collections::HashMap;
#[cfg(any(feature = "templates", feature = "image-optimization", feature = "webmentions"))]
use std::sync::Arc;

/// Resolved directory layout, per §6: `sourceDir` default `_src`, `outputDir`
/// default `.` (the project root), `layoutsDir` default `_layouts`.
pub struct ResolvedPaths {
    /// Directory the loader reads content from.
    pub source_dir: PathBuf,
    /// Directory the build writes output into.
    pub output_dir: PathBuf,
    /// Layouts directory, relative to `source_dir`'s parent (the project
    /// root), matching the layouts stage's `directory` field.
    pub layouts_dir: String,
}

fn string_field(json: &Json, key: &str, default: &str) -> String {
    json.get(key)
        .and_then(Json::as_str)
        .map(String::from)
        .unwrap_or_else(|| default.to_string())
}

/// Add the host-supplied builtins that depend on collaborators
/// `janos-core` cannot itself construct, per the core/root split in §10.
/// Each is only registered when its backing feature is enabled.
fn register_host_stages(registry: &mut StageRegistry, paths: &ResolvedPaths) {
    #[cfg(feature = "templates")]
    register_layouts(registry, paths);
    #[cfg(feature = "image-optimization")]
    register_responsive_images(registry);
    #[cfg(feature = "webmentions")]
    register_webmentions(registry, paths);
}

#[cfg(feature = "templates")]
fn register_layouts(registry: &mut StageRegistry, paths: &ResolvedPaths) {
    let layouts_dir = paths.layouts_dir.clone();
    let layouts_factory: StageFactory = Arc::new(move |json| {
        let mut engines: HashMap<String, Arc<dyn janos_core::template_engine::TemplateEngine>> =
            HashMap::new();
        let engine: Arc<dyn janos_core::template_engine::TemplateEngine> = Arc::new(MinijinjaEngine);
        for ext in engine.extensions() {
            engines.insert(ext.to_string(), engine.clone());
        }
        Ok(Box::new(LayoutsStage {
            directory: layouts_dir.clone(),
            patterns: json
                .get("patterns")
                .and_then(Json::as_array)
                .map(|arr| arr.iter().filter_map(Json::as_str).map(String::from).collect())
                .unwrap_or_else(|| vec!["**/*.html".to_string()]),
            default_layout: json.get("defaultLayout").and_then(Json::as_str).map(String::from),
            engines,
            loader: Arc::new(DefaultVirtualLoader {
                directory: layouts_dir.clone(),
            }),
            default_extension: "html".to_string(),
        }) as Box<dyn janos_core::stage::Stage>)
    });
    registry.register_builtin("layouts", layouts_factory);
}

#[cfg(feature = "image-optimization")]
fn register_responsive_images(registry: &mut StageRegistry) {
    let responsive_factory: StageFactory = Arc::new(|json| {
        let formats = json
            .get("formats")
            .and_then(Json::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Json::as_str)
                    .filter_map(|s| match s {
                        "avif" => Some(janos_core::image_codec::ImageFormat::Avif),
                        "webp" => Some(janos_core::image_codec::ImageFormat::WebP),
                        "jpeg" | "jpg" => Some(janos_core::image_codec::ImageFormat::Jpeg),
                        "png" => Some(janos_core::image_codec::ImageFormat::Png),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_else(|| {
                vec![
                    janos_core::image_codec::ImageFormat::WebP,
                    janos_core::image_codec::ImageFormat::Jpeg,
                ]
            });
        let sizes = json
            .get("sizes")
            .and_then(Json::as_array)
            .map(|arr| arr.iter().filter_map(Json::as_u64).map(|n| n as u32).collect())
            .unwrap_or_else(|| vec![480, 800, 1200]);
        Ok(Box::new(ResponsiveImagesStage {
            patterns: json
                .get("patterns")
                .and_then(Json::as_array)
                .map(|arr| arr.iter().filter_map(Json::as_str).map(String::from).collect())
                .unwrap_or_else(|| vec!["**/*.html".to_string()]),
            config: ResponsiveImagesConfig {
                formats,
                sizes,
                quality: json.get("quality").and_then(Json::as_u64).map(|n| n as u8).unwrap_or(80),
                output_dir: string_field(json, "outputDir", "img/generated"),
            },
            codec: Arc::new(ImageCrateCodec),
        }) as Box<dyn janos_core::stage::Stage>)
    });
    registry.register_builtin("responsive-images", responsive_factory);
}

#[cfg(feature = "webmentions")]
fn register_webmentions(registry: &mut StageRegistry, paths: &ResolvedPaths) {
    let cache_dir = paths.output_dir.join(".janos-cache").join("webmentions");
    let webmentions_factory: StageFactory = Arc::new(move |json| {
        let fetcher = ReqwestFetcher::new().map_err(|e| ConfigError::Collaborator {
            reason: e.to_string(),
        })?;
        Ok(Box::new(WebmentionsStage {
            patterns: json
                .get("patterns")
                .and_then(Json::as_array)
                .map(|arr| arr.iter().filter_map(Json::as_str).map(String::from).collect())
                .unwrap_or_else(|| vec!["**/*.html".to_string()]),
            site_url: string_field(json, "siteUrl", ""),
            endpoint: string_field(json, "endpoint", "https://webmention.io/api"),
            per_page: json.get("perPage").and_then(Json::as_u64).unwrap_or(20) as u32,
            fetcher: Arc::new(fetcher),
            cache: Arc::new(FileCacheStore::new(cache_dir.clone())),
        }) as Box<dyn janos_core::stage::Stage>)
    });
    registry.register_builtin("webmentions", webmentions_factory);
}

/// Read, parse, and validate `janos.config.json` at `config_path`, returning
/// a ready-to-`process` [`Pipeline`] plus the resolved directory layout.
pub fn load(config_path: &Path) -> Result<(Pipeline, ResolvedPaths)> {
    let raw = fs::read_to_string(config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    let json: Json = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", config_path.display()))?;

    let project_root = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let paths = ResolvedPaths {
        source_dir: project_root.join(string_field(&json, "sourceDir", "_src")),
        output_dir: project_root.join(string_field(&json, "outputDir", ".")),
        layouts_dir: string_field(&json, "layoutsDir", "_layouts"),
    };

    let (site, mode, entries, metadata) =
        parse_config(json).context("validating janos.config.json")?;

    let mut registry = janos_core::default_registry();
    register_host_stages(&mut registry, &paths);

    let pipeline = build_pipeline(site, mode, entries, metadata, &registry)
        .context("building pipeline from janos.config.json")?;

    Ok((pipeline, paths))
}
