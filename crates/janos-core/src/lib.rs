//! Core staged content pipeline for the Janos static site generator.
//!
//! This crate has no system dependencies — no filesystem or network access
//! — so it compiles to WASM as well as native. A `VirtualFile`/`FileStore`
//! pair stands in for the filesystem; stages read and write that store and
//! a shared [`context::Context`] in sequence (see [`pipeline::Pipeline`]).
//! The root `janos` crate wires this up to real I/O, a template engine, an
//! image codec, and an HTTP client.

pub mod config;
pub mod context;
pub mod datefmt;
pub mod error;
pub mod file;
pub mod frontmatter;
pub mod image_codec;
pub mod markdown;
pub mod pattern;
pub mod pipeline;
pub mod registry;
pub mod slug;
pub mod stage;
pub mod stages;
pub mod store;
pub mod template_engine;
pub mod value;
pub mod webmention;

pub use config::{build_pipeline, parse_config, PipelineEntry, RawConfig, StageFactory, StageRegistry};
pub use context::{BuildMode, Context, SiteConfig};
pub use error::PluginError;
pub use file::VirtualFile;
pub use pipeline::{BuildResult, Pipeline};
pub use registry::default_registry;
pub use stage::Stage;
pub use store::FileStore;
pub use value::{Metadata, Value};
