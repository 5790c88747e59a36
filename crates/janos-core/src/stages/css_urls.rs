//! The CSS URL rewriting stage, per §4.14: rewrite `url(/` references to a
//! configured root path, for deployments served from a sub-path.

use crate::context::Context;
use crate::error::PluginError;
use crate::stage::Stage;
use crate::store::FileStore;

/// Rewrites absolute `url(/...)` references in CSS files to a site root path.
#[derive(Debug, Clone)]
pub struct CssUrlsStage {
    /// Glob(s) selecting CSS files. Default `**/*.css`.
    pub patterns: Vec<String>,
}

impl Default for CssUrlsStage {
    fn default() -> Self {
        Self {
            patterns: vec!["**/*.css".to_string()],
        }
    }
}

impl Stage for CssUrlsStage {
    fn name(&self) -> &str {
        "css-urls"
    }

    fn apply(&self, files: &mut FileStore, ctx: &mut Context) -> Result<(), PluginError> {
        let Some(rootpath) = ctx.extra.get("site.rootpath").and_then(|v| v.as_str()) else {
            return Ok(());
        };
        if rootpath.is_empty() || rootpath == "/" {
            return Ok(());
        }
        let rootpath = rootpath.to_string();

        let matched = files.matching_any(&self.patterns);
        for path in matched {
            let Some(file) = files.get_mut(&path) else { continue };
            let Some(body) = file.contents_str() else { continue };
            let rewritten = body.replace("url(/", &format!("url({rootpath}"));
            file.set_contents_str(rewritten);
        }
        Ok(())
    }
}
