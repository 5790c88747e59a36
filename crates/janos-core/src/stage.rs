//! The `Stage` trait every pipeline plugin implements, per §2 and §4.1's
//! `Process(files) -> files` contract: a stage takes shared mutable access
//! to the file store and the global context, and may fail fatally.

use crate::context::Context;
use crate::error::PluginError;
use crate::store::FileStore;

/// A single pipeline transformation.
///
/// Implementors should be stateless between invocations — any
/// stage-internal configuration (patterns, field names, sort keys) belongs
/// on `self`, set up once when the stage is constructed by the config
/// loader or by application code.
pub trait Stage: Send + Sync {
    /// The stage's name, used in `PluginError` attribution and in the
    /// config-loader's pipeline-entry registry.
    fn name(&self) -> &str;

    /// Apply this stage to `files`, possibly reading and writing `ctx`.
    ///
    /// A stage that wants to report a failure for one file without aborting
    /// the whole pipeline should log it and continue; returning `Err`
    /// aborts the entire `Process` run, wrapped with this stage's name by
    /// the caller.
    fn apply(&self, files: &mut FileStore, ctx: &mut Context) -> Result<(), PluginError>;
}
