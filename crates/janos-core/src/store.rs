//! The in-memory virtual file store, per §3: `path -> VirtualFile`, with the
//! single invariant every stage must honor on rename: delete the old key,
//! insert under the new key, and update `file.path` to match.

use crate::file::VirtualFile;
use crate::pattern;
use std::collections::BTreeMap;

/// The shared, single-writer file store threaded through every stage.
///
/// A `BTreeMap` keeps iteration order deterministic by path, which several
/// stages (collections, sitemap, feeds) rely on for stable output ordering
/// when `sortBy` ties occur.
#[derive(Debug, Clone, Default)]
pub struct FileStore {
    files: BTreeMap<String, VirtualFile>,
}

impl FileStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the file at `path`. If `file.path` differs from
    /// `path`, it is corrected to match the key.
    pub fn set(&mut self, path: impl Into<String>, mut file: VirtualFile) {
        let path = path.into();
        file.path = path.clone();
        self.files.insert(path, file);
    }

    /// Look up a file by its current key.
    pub fn get(&self, path: &str) -> Option<&VirtualFile> {
        self.files.get(path)
    }

    /// Look up a file by its current key, mutably.
    pub fn get_mut(&mut self, path: &str) -> Option<&mut VirtualFile> {
        self.files.get_mut(path)
    }

    /// Remove and return the file at `path`.
    pub fn remove(&mut self, path: &str) -> Option<VirtualFile> {
        self.files.remove(path)
    }

    /// Rename a file from `old_path` to `new_path`, updating `file.path`.
    /// Returns `false` if no file existed at `old_path`.
    pub fn rename(&mut self, old_path: &str, new_path: impl Into<String>) -> bool {
        let Some(mut file) = self.files.remove(old_path) else {
            return false;
        };
        let new_path = new_path.into();
        file.path = new_path.clone();
        self.files.insert(new_path, file);
        true
    }

    /// Number of files currently in the store.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// `true` if the store holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate all files in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &VirtualFile)> {
        self.files.iter()
    }

    /// Iterate all files mutably in path order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut VirtualFile)> {
        self.files.iter_mut()
    }

    /// Paths of every file matching `pattern` (per the §4.3 glob subset).
    pub fn matching_paths(&self, glob: &str) -> Vec<String> {
        self.files
            .keys()
            .filter(|p| pattern::matches(glob, p))
            .cloned()
            .collect()
    }

    /// Paths of every file matching any of `globs`.
    pub fn matching_any(&self, globs: &[String]) -> Vec<String> {
        self.files
            .keys()
            .filter(|p| globs.iter().any(|g| pattern::matches(g, p)))
            .cloned()
            .collect()
    }

    /// Consume the store into its underlying map, in path order.
    pub fn into_inner(self) -> BTreeMap<String, VirtualFile> {
        self.files
    }
}

impl<'a> IntoIterator for &'a FileStore {
    type Item = (&'a String, &'a VirtualFile);
    type IntoIter = std::collections::btree_map::Iter<'a, String, VirtualFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_updates_key_and_path_field() {
        let mut store = FileStore::new();
        store.set("a.html", VirtualFile::new("a.html", b"hi".to_vec()));
        assert!(store.rename("a.html", "b/index.html"));
        assert!(store.get("a.html").is_none());
        let moved = store.get("b/index.html").unwrap();
        assert_eq!(moved.path, "b/index.html");
    }

    #[test]
    fn matching_paths_uses_glob_subset() {
        let mut store = FileStore::new();
        store.set("blog/a.html", VirtualFile::new("blog/a.html", vec![]));
        store.set("blog/b.html", VirtualFile::new("blog/b.html", vec![]));
        store.set("about.html", VirtualFile::new("about.html", vec![]));
        let mut found = store.matching_paths("blog/*.html");
        found.sort();
        assert_eq!(found, vec!["blog/a.html", "blog/b.html"]);
    }
}
