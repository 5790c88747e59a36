//! The layouts (template rendering) stage, per §4.12: resolves each content
//! file's layout, merges the template context, and renders through the
//! engine registered for the layout's extension.

use crate::context::Context;
use crate::error::PluginError;
use crate::stage::Stage;
use crate::store::FileStore;
use crate::template_engine::{TemplateEngine, VirtualLoader};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Renders content files through their resolved layout template.
pub struct LayoutsStage {
    /// Layouts directory prefix, default `_layouts`.
    pub directory: String,
    /// Glob(s) selecting candidate content files. Default `**/*.html`.
    pub patterns: Vec<String>,
    /// Default layout name, used when a file has no `metadata.layout`.
    pub default_layout: Option<String>,
    /// Engines keyed by the file extension they render (without the dot).
    pub engines: HashMap<String, Arc<dyn TemplateEngine>>,
    /// Resolves `extends`/`include` template names against the File Store.
    pub loader: Arc<dyn VirtualLoader>,
    /// Extension (without dot) layout files are assumed to use when no
    /// suffix-bearing candidate matched, used to pick the rendering engine.
    pub default_extension: String,
}

impl Stage for LayoutsStage {
    fn name(&self) -> &str {
        "layouts"
    }

    fn apply(&self, files: &mut FileStore, ctx: &mut Context) -> Result<(), PluginError> {
        let candidates: Vec<String> = files
            .matching_any(&self.patterns)
            .into_iter()
            .filter(|p| !p.starts_with(&format!("{}/", self.directory.trim_end_matches('/'))))
            .collect();

        let base_data = ctx.to_template_data();

        for path in candidates {
            let Some(file) = files.get(&path) else { continue };

            // `layout: false` suppresses rendering entirely (synthesized
            // feed/sitemap files, per §3's "Lifecycles").
            if file.metadata.get("layout") == Some(&Value::Bool(false)) {
                continue;
            }

            let layout_name = file
                .metadata
                .get("layout")
                .and_then(Value::as_str)
                .map(String::from)
                .or_else(|| self.default_layout.clone());
            let Some(layout_name) = layout_name else { continue };

            let body = file.contents_str().unwrap_or_default().to_string();

            let mut data = base_data.clone();
            for (k, v) in &file.metadata {
                data.insert(k.clone(), v.clone());
            }
            data.insert("contents".to_string(), Value::from(body.clone()));
            data.insert("content".to_string(), Value::from(body));
            data.insert("page".to_string(), Value::Map(file.metadata.clone()));
            data.insert(
                "now".to_string(),
                Value::Date(chrono::Utc::now()),
            );

            let engine = self
                .engines
                .get(&self.default_extension)
                .cloned();
            let Some(engine) = engine else {
                let message = format!("no template engine registered for extension '.{}'", self.default_extension);
                log::error!("{message}");
                ctx.push_warning(self.name(), &message);
                continue;
            };

            match engine.render_file(&layout_name, &data, files, self.loader.as_ref()) {
                Ok(rendered) => {
                    if let Some(f) = files.get_mut(&path) {
                        f.set_contents_str(rendered);
                    }
                }
                Err(err) => {
                    log::error!("{path}: template render failed: {err}");
                    ctx.push_error(self.name(), format!("{path}: {err}"));
                }
            }
        }

        Ok(())
    }
}
