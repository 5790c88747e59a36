//! Config model and plugin registry, per §4.20: parses `janos.config.json`'s
//! shape (validation only here — reading the file from disk is the root
//! crate's job), and builds a [`crate::pipeline::Pipeline`] from a registry
//! of built-in and user-registered stage factories.

use crate::context::{BuildMode, SiteConfig};
use crate::error::ConfigError;
use crate::pipeline::Pipeline;
use crate::stage::Stage;
use crate::value::Value;
use serde_json::Value as Json;
use std::collections::HashMap;
use std::sync::Arc;

/// Parsed, validated `site` section of `janos.config.json`.
#[derive(Debug, Clone)]
pub struct RawConfig {
    /// The raw parsed JSON document, retained so stage factories can pull
    /// their own options back out by pipeline-entry key.
    pub json: Json,
}

/// A single `pipeline` array entry: either a bare stage name or a
/// single-key `{name: options}` object.
#[derive(Debug, Clone)]
pub struct PipelineEntry {
    /// The stage name.
    pub name: String,
    /// The stage's options, or `Json::Null` for a bare-name entry.
    pub options: Json,
}

/// Parse and validate the top-level shape of a `janos.config.json`
/// document, per §4.20. Does not instantiate stages; see
/// [`build_pipeline`] for that.
pub fn parse_config(json: Json) -> Result<(SiteConfig, BuildMode, Vec<PipelineEntry>, Json), ConfigError> {
    let site_json = json.get("site").cloned().unwrap_or(Json::Null);
    let title = site_json
        .get("title")
        .and_then(Json::as_str)
        .ok_or_else(|| ConfigError::MissingField {
            field: "site.title".to_string(),
        })?;
    let base_url = site_json
        .get("baseUrl")
        .and_then(Json::as_str)
        .ok_or_else(|| ConfigError::MissingField {
            field: "site.baseUrl".to_string(),
        })?;
    if json.get("sourceDir").and_then(Json::as_str).is_none() {
        // sourceDir defaults to `_src`; presence of the key is optional,
        // but an explicit empty string is still invalid.
        if let Some(explicit) = json.get("sourceDir") {
            if explicit.as_str() == Some("") {
                return Err(ConfigError::MissingField {
                    field: "sourceDir".to_string(),
                });
            }
        }
    }
    if json.get("outputDir").and_then(|v| v.as_str().map(|s| s.is_empty())) == Some(true) {
        return Err(ConfigError::MissingField {
            field: "outputDir".to_string(),
        });
    }

    let mut extra = crate::value::Metadata::new();
    if let Some(obj) = site_json.as_object() {
        for (k, v) in obj {
            if matches!(k.as_str(), "title" | "baseUrl" | "description" | "language" | "author") {
                continue;
            }
            extra.insert(k.clone(), Value::from(v));
        }
    }

    let site = SiteConfig {
        title: title.to_string(),
        base_url: base_url.to_string(),
        description: site_json
            .get("description")
            .and_then(Json::as_str)
            .map(String::from),
        language: site_json
            .get("language")
            .and_then(Json::as_str)
            .map(String::from),
        author: site_json.get("author").and_then(author_name),
        extra,
    };

    let mode = match json.get("mode").and_then(Json::as_str) {
        Some("production") => BuildMode::Production,
        _ => BuildMode::Development,
    };

    let pipeline_json = json
        .get("pipeline")
        .ok_or_else(|| ConfigError::MissingField {
            field: "pipeline".to_string(),
        })?;
    let entries_json = pipeline_json
        .as_array()
        .ok_or_else(|| ConfigError::MalformedPipelineEntry {
            index: 0,
            reason: "pipeline must be an array".to_string(),
        })?;

    let mut entries = Vec::with_capacity(entries_json.len());
    for (index, entry) in entries_json.iter().enumerate() {
        match entry {
            Json::String(name) => entries.push(PipelineEntry {
                name: name.clone(),
                options: Json::Null,
            }),
            Json::Object(map) if map.len() == 1 => {
                let (name, options) = map.iter().next().unwrap();
                entries.push(PipelineEntry {
                    name: name.clone(),
                    options: options.clone(),
                });
            }
            _ => {
                return Err(ConfigError::MalformedPipelineEntry {
                    index,
                    reason: "entry must be a string or a single-key object".to_string(),
                })
            }
        }
    }

    let metadata_json = json.get("metadata").cloned().unwrap_or(Json::Null);

    Ok((site, mode, entries, metadata_json))
}

fn author_name(value: &Json) -> Option<String> {
    match value {
        Json::String(s) => Some(s.clone()),
        Json::Object(map) => map.get("name").and_then(Json::as_str).map(String::from),
        _ => None,
    }
}

/// A stage factory: given a pipeline entry's options, construct the stage.
pub type StageFactory = Arc<dyn Fn(&Json) -> Result<Box<dyn Stage>, ConfigError> + Send + Sync>;

/// The registry of built-in and user-registered stage factories consulted
/// by [`build_pipeline`], per §4.20.
#[derive(Clone, Default)]
pub struct StageRegistry {
    factories: HashMap<String, StageFactory>,
    builtin_names: HashMap<String, ()>,
}

impl StageRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a built-in factory. Not exposed for re-registration by
    /// users — call this only when assembling the default registry.
    pub fn register_builtin(&mut self, name: impl Into<String>, factory: StageFactory) {
        let name = name.into();
        self.builtin_names.insert(name.clone(), ());
        self.factories.insert(name, factory);
    }

    /// Register a user-supplied factory. Fails if `name` collides with a
    /// built-in, per §4.20's "re-registering a built-in name is disallowed".
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: StageFactory,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        if self.builtin_names.contains_key(&name) {
            return Err(ConfigError::BuiltinRedefinition { name });
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Look up a factory by stage name.
    pub fn get(&self, name: &str) -> Option<&StageFactory> {
        self.factories.get(name)
    }
}

/// Build a ready-to-`Process` [`Pipeline`] from validated config pieces and
/// a stage registry, per §4.20's final sentence.
pub fn build_pipeline(
    site: SiteConfig,
    mode: BuildMode,
    entries: Vec<PipelineEntry>,
    metadata: Json,
    registry: &StageRegistry,
) -> Result<Pipeline, ConfigError> {
    let mut pipeline = Pipeline::new(site, mode);

    if let Some(obj) = metadata.as_object() {
        for (k, v) in obj {
            pipeline.context_mut().set_metadata(k.clone(), Value::from(v));
        }
    }

    for entry in entries {
        let factory = registry
            .get(&entry.name)
            .ok_or_else(|| ConfigError::UnknownStage {
                name: entry.name.clone(),
            })?;
        let stage = factory(&entry.options)?;
        pipeline.use_stage(stage);
    }

    Ok(pipeline)
}
