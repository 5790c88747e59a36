//! The virtual file, per §3: a path, raw byte contents, a metadata map, and
//! an optional source path recording where on disk (or in a prior stage) the
//! file originated from.

use crate::value::Metadata;

/// A single file living in the [`crate::store::FileStore`].
///
/// `path` is the file's current, store-relative key. Stages that rewrite a
/// file's path (permalinks, pagination, tag pages) must update `path` to
/// match the new store key — the store itself never infers one from the
/// other, per the rewrite invariant in §3.
#[derive(Debug, Clone)]
pub struct VirtualFile {
    /// Current store-relative path, e.g. `"blog/my-post/index.html"`.
    pub path: String,
    /// Raw byte contents. Text files are valid UTF-8 but stored as bytes so
    /// binary assets (images, fonts) share the same representation.
    pub contents: Vec<u8>,
    /// Frontmatter-derived and stage-synthesized metadata.
    pub metadata: Metadata,
    /// Original on-disk (or pre-pipeline) path, preserved across rewrites
    /// for diagnostics and for stages that need to recover the source
    /// extension (e.g. the content decoder deciding whether a file is
    /// Markdown).
    pub source_path: Option<String>,
}

impl VirtualFile {
    /// Construct a file with empty metadata and `source_path` set to `path`.
    pub fn new(path: impl Into<String>, contents: Vec<u8>) -> Self {
        let path = path.into();
        Self {
            source_path: Some(path.clone()),
            path,
            contents,
            metadata: Metadata::new(),
        }
    }

    /// Borrow contents as a `&str`, if valid UTF-8.
    pub fn contents_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.contents).ok()
    }

    /// Replace contents from a `String`.
    pub fn set_contents_str(&mut self, s: String) {
        self.contents = s.into_bytes();
    }

    /// The extension of `path` (without leading dot), lowercased.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}
