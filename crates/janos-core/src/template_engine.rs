//! The template-engine abstraction, per §9 ("treat the template engine as an
//! interface") and §4.12: `render`/`render_file` plus a virtual loader that
//! resolves `extends`/`include` names against the File Store, so any engine
//! capable of both can be mounted by the host application.

use crate::error::TemplateError;
use crate::store::FileStore;
use crate::value::Metadata;

/// Resolves a template name to its source bytes by searching the File
/// Store's layouts directory, per §4.12's candidate-path rule: the name
/// verbatim, then with `.njk`, `.nunjucks`, `.html` suffixes.
pub trait VirtualLoader {
    /// Look up `name` against the backing File Store, trying the configured
    /// suffixes in order. Returns `None` if no candidate exists.
    fn load(&self, files: &FileStore, name: &str) -> Option<String>;
}

/// The default virtual loader: `directory/name[.suffix]` in the order the
/// spec prescribes.
pub struct DefaultVirtualLoader {
    /// Layouts directory prefix, e.g. `"_layouts"`.
    pub directory: String,
}

impl VirtualLoader for DefaultVirtualLoader {
    fn load(&self, files: &FileStore, name: &str) -> Option<String> {
        let candidates = [
            name.to_string(),
            format!("{name}.njk"),
            format!("{name}.nunjucks"),
            format!("{name}.html"),
        ];
        for candidate in candidates {
            let key = format!(
                "{}/{}",
                self.directory.trim_end_matches('/'),
                candidate.trim_start_matches('/')
            );
            if let Some(file) = files.get(&key) {
                if let Some(text) = file.contents_str() {
                    return Some(text.to_string());
                }
            }
        }
        None
    }
}

/// A host-mountable template engine, per the §9/§4.12 abstraction.
///
/// Implementations are free to add their own filters; `date`, `readingTime`
/// and `slug` are mandatory and must be registered by every implementation
/// (the root crate's MiniJinja-backed engine registers them at
/// construction).
pub trait TemplateEngine {
    /// File extensions this engine handles (without the leading dot), used
    /// by the pipeline driver's `Engine(engine)` registration.
    fn extensions(&self) -> &[&str];

    /// Render a template given directly as a string (no loader resolution).
    fn render(&self, template: &str, data: &Metadata) -> Result<String, TemplateError>;

    /// Render a named template, resolving `extends`/`include` via `loader`.
    fn render_file(
        &self,
        name: &str,
        data: &Metadata,
        files: &FileStore,
        loader: &dyn VirtualLoader,
    ) -> Result<String, TemplateError>;
}
