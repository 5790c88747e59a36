//! The directory loader, per §6: walks `sourceDir` into a [`FileStore`],
//! excluding hidden directories and `node_modules`.

use janos_core::file::VirtualFile;
use janos_core::store::FileStore;
use std::fs;
use std::io;
use std::path::Path;

fn is_excluded(name: &str) -> bool {
    name == "node_modules" || (name.starts_with('.') && name != "." && name != "..")
}

/// Recursively read every file under `root` into a [`FileStore`], keyed by
/// its path relative to `root` with forward slashes.
pub fn load_directory(root: &Path) -> io::Result<FileStore> {
    let mut store = FileStore::new();
    if root.exists() {
        walk(root, root, &mut store)?;
    }
    Ok(store)
}

fn walk(root: &Path, dir: &Path, store: &mut FileStore) -> io::Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if is_excluded(&name) {
            continue;
        }

        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk(root, &path, store)?;
        } else if file_type.is_file() {
            let relative = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            let contents = fs::read(&path)?;
            store.set(relative.clone(), VirtualFile::new(relative, contents));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn excludes_hidden_and_node_modules_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/HEAD"), "ref").unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.js"), "x").unwrap();
        fs::create_dir_all(dir.path().join("posts")).unwrap();
        fs::write(dir.path().join("posts/a.md"), "# A").unwrap();

        let store = load_directory(dir.path()).unwrap();
        assert!(store.get("posts/a.md").is_some());
        assert!(store.get(".git/HEAD").is_none());
        assert!(store.get("node_modules/pkg/index.js").is_none());
    }

    #[test]
    fn missing_directory_yields_empty_store() {
        let store = load_directory(Path::new("/does/not/exist")).unwrap();
        assert!(store.is_empty());
    }
}
