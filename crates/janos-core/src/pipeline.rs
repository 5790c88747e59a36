//! The pipeline driver, per §4.1: holds the ordered stage list, the
//! registered template engines, and the global context; runs stages
//! sequentially over a shared [`FileStore`].

use crate::context::{BuildMode, Context, SiteConfig};
use crate::error::PluginError;
use crate::stage::Stage;
use crate::store::FileStore;
use crate::template_engine::TemplateEngine;
use std::collections::HashMap;
use std::time::Duration;

/// Summary returned by [`Pipeline::process`], mirroring `Build()`'s result
/// summary in §4.1.
#[derive(Debug, Default)]
pub struct BuildResult {
    /// Number of files present in the store before processing.
    pub files_processed: usize,
    /// Number of files present in the store after processing.
    pub files_output: usize,
    /// Wall-clock duration of the `process` call.
    pub duration: Duration,
    /// Non-fatal warnings accumulated by stages (frontmatter-parse errors,
    /// missing layouts, fetch failures per §7).
    pub warnings: Vec<String>,
    /// Non-fatal but more severe issues accumulated by stages (template
    /// render failures per §7).
    pub errors: Vec<String>,
}

/// The ordered pipeline: stages, registered template engines, and the
/// shared [`Context`].
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    engines: HashMap<String, Box<dyn TemplateEngine>>,
    engine_aliases: HashMap<String, String>,
    context: Context,
}

impl Pipeline {
    /// Construct an empty pipeline for the given site section and mode.
    pub fn new(site: SiteConfig, mode: BuildMode) -> Self {
        Self {
            stages: Vec::new(),
            engines: HashMap::new(),
            engine_aliases: HashMap::new(),
            context: Context::new(site, mode),
        }
    }

    /// Append a stage. Mirrors `Use(stage)` in §4.1.
    pub fn use_stage(&mut self, stage: Box<dyn Stage>) -> &mut Self {
        self.stages.push(stage);
        self
    }

    /// Register a template engine under each of its declared extensions.
    /// Mirrors `Engine(engine)` in §4.1.
    pub fn register_engine(&mut self, engine: Box<dyn TemplateEngine>) -> &mut Self {
        // A `Box<dyn TemplateEngine>` can't be cheaply duplicated across
        // extension keys, so it is stored once under its first declared
        // extension and the rest are aliased to that key.
        if let Some(first) = engine.extensions().first().map(|s| s.to_string()) {
            let aliases: Vec<String> = engine.extensions()[1..]
                .iter()
                .map(|s| s.to_string())
                .collect();
            self.engines.insert(first.clone(), engine);
            for alias in aliases {
                self.engine_aliases.insert(alias, first.clone());
            }
        }
        self
    }

    /// Set a global-metadata entry, visible to all stages and templates.
    /// Mirrors `Metadata(key, value)` in §4.1.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: crate::value::Value) {
        self.context.set_metadata(key, value);
    }

    /// Mutable access to the shared context, for config-loader metadata
    /// merging and for host applications that need direct access.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Shared access to the context.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Look up the registered engine for a file extension (without the
    /// leading dot), resolving through alias extensions.
    pub fn engine_for(&self, extension: &str) -> Option<&dyn TemplateEngine> {
        if let Some(engine) = self.engines.get(extension) {
            return Some(engine.as_ref());
        }
        let canonical = self.engine_aliases.get(extension)?;
        self.engines.get(canonical).map(|e| e.as_ref())
    }

    /// Run every stage in order over `files`. Mirrors `Process(files) ->
    /// files` in §4.1: any stage failure aborts the pipeline and is
    /// reported wrapped with the stage name.
    pub fn process(&mut self, files: &mut FileStore) -> Result<BuildResult, PluginError> {
        let started = std::time::Instant::now();
        let files_processed = files.len();
        for stage in &self.stages {
            log::debug!("running stage '{}'", stage.name());
            stage.apply(files, &mut self.context)?;
        }
        Ok(BuildResult {
            files_processed,
            files_output: files.len(),
            duration: started.elapsed(),
            warnings: self.context.warnings.clone(),
            errors: self.context.errors.clone(),
        })
    }
}
