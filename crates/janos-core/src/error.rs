//! Error kinds for the content pipeline.
//!
//! Frontmatter, template, layout and fetch failures are recovered locally
//! and surface only as warnings on the build result; config errors, unknown
//! engines and uncategorised stage failures are fatal and abort the
//! pipeline.

use thiserror::Error;

/// Failure parsing a file's leading `---`-delimited metadata block.
#[derive(Error, Debug)]
pub enum FrontmatterError {
    /// The opening delimiter was found but no closing delimiter followed.
    #[error("{path}: unclosed frontmatter block starting at line {line}")]
    Unclosed {
        /// Path of the file being parsed.
        path: String,
        /// Line on which the opening `---` was found.
        line: usize,
    },

    /// The YAML-subset block failed to parse.
    #[error("{path}: failed to parse frontmatter: {source}")]
    Yaml {
        /// Path of the file being parsed.
        path: String,
        /// Underlying YAML parser error.
        source: serde_yml::Error,
    },
}

/// Failure converting a Markdown body to HTML.
#[derive(Error, Debug)]
pub enum MarkdownError {
    /// The body contained a construct the renderer could not handle.
    #[error("{path}: markdown conversion failed: {reason}")]
    Conversion {
        /// Path of the file being converted.
        path: String,
        /// Human-readable reason.
        reason: String,
    },
}

/// Failure rendering a template.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// The engine rejected the template source or the render-time data.
    #[error("{template}: render failed: {reason}")]
    Render {
        /// Name or path of the template.
        template: String,
        /// Human-readable reason from the engine.
        reason: String,
    },

    /// `extends`/`include` could not resolve a name against the file store.
    #[error("template '{name}' not found via virtual loader")]
    NotFound {
        /// The unresolved template name.
        name: String,
    },
}

/// No layout file could be found for a content file.
#[derive(Error, Debug)]
#[error("{path}: layout '{layout}' not found")]
pub struct LayoutNotFoundError {
    /// Path of the content file that requested the layout.
    pub path: String,
    /// The requested layout name.
    pub layout: String,
}

/// No template engine is registered for a required file extension.
#[derive(Error, Debug)]
#[error("no template engine registered for extension '.{extension}'")]
pub struct EngineNotFoundError {
    /// The unregistered extension, without its leading dot.
    pub extension: String,
}

/// A recoverable failure fetching or caching webmentions / remote assets.
#[derive(Error, Debug)]
#[error("{operation} failed: {reason}")]
pub struct FetchError {
    /// What was being attempted (`"fetch mentions.jf2"`, `"read cache"`, ...).
    pub operation: String,
    /// Human-readable reason.
    pub reason: String,
}

/// Fatal configuration failure raised while building a [`crate::pipeline::Pipeline`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required top-level field was missing or empty.
    #[error("missing required configuration field: {field}")]
    MissingField {
        /// Dotted path of the missing field, e.g. `"site.baseUrl"`.
        field: String,
    },

    /// `pipeline` was not an array, or an entry was neither a bare string
    /// nor a single-key object.
    #[error("malformed pipeline entry at index {index}: {reason}")]
    MalformedPipelineEntry {
        /// Index of the offending entry.
        index: usize,
        /// Human-readable reason.
        reason: String,
    },

    /// A pipeline entry named a stage absent from the registry.
    #[error("unknown stage '{name}' in pipeline")]
    UnknownStage {
        /// The unresolved stage name.
        name: String,
    },

    /// An attempt was made to re-register a built-in stage name.
    #[error("cannot re-register built-in stage '{name}'")]
    BuiltinRedefinition {
        /// The stage name that collided with a built-in.
        name: String,
    },

    /// The JSON document itself failed to parse.
    #[error("invalid configuration JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A host-supplied collaborator (template engine, image codec, HTTP
    /// client, ...) could not be constructed for a stage.
    #[error("failed to construct stage collaborator: {reason}")]
    Collaborator {
        /// Human-readable reason.
        reason: String,
    },
}

/// A stage-internal failure, fatal to the pipeline, carrying the stage name
/// that raised it.
#[derive(Error, Debug)]
#[error("stage '{stage}' failed: {source}")]
pub struct PluginError {
    /// Name of the stage that raised the error.
    pub stage: String,
    /// The underlying cause.
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl PluginError {
    /// Wrap any error as a [`PluginError`] attributed to `stage`.
    pub fn new(
        stage: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            stage: stage.into(),
            source: Box::new(source),
        }
    }

    /// Wrap a plain message as a [`PluginError`] attributed to `stage`.
    pub fn msg(stage: impl Into<String>, message: impl Into<String>) -> Self {
        #[derive(Debug, Error)]
        #[error("{0}")]
        struct Msg(String);
        Self {
            stage: stage.into(),
            source: Box::new(Msg(message.into())),
        }
    }
}

/// Per-file failure that a stage may choose to re-raise as a [`PluginError`]
/// unless it declares the failure recoverable.
#[derive(Error, Debug)]
#[error("{path}: {reason}")]
pub struct FileProcessingError {
    /// Path of the file being processed.
    pub path: String,
    /// Human-readable reason.
    pub reason: String,
}
