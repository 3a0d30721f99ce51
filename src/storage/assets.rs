//! Asset store for deck images
//!
//! One persistent directory holds every deck's images, addressed by the
//! original filename. Two decks whose sources both contain an
//! `image1.jpg` share the stored copy: the first writer wins and a
//! pre-existing file is never overwritten. Intentional space saving;
//! identically named files with different contents will alias.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Clone)]
pub struct AssetStore {
    dir: PathBuf,
}

impl AssetStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// The store directory, created on first use.
    pub fn ensure_dir(&self) -> io::Result<&Path> {
        fs::create_dir_all(&self.dir)?;
        Ok(&self.dir)
    }

    /// Copy `source` into the store under `name`. No-op when a file of
    /// that name is already stored.
    pub fn copy_in(&self, name: &str, source: &Path) -> io::Result<()> {
        let dest = self.ensure_dir()?.join(name);
        if dest.exists() {
            log::debug!("Asset {} already stored, keeping existing copy", name);
            return Ok(());
        }
        fs::copy(source, &dest)?;
        Ok(())
    }

    /// Existence check only; never creates anything.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() {
            return None;
        }
        let path = self.dir.join(name);
        path.exists().then_some(path)
    }

    /// Best-effort removal, used when a deck is deleted. Failures are
    /// logged, not surfaced.
    pub fn remove(&self, name: &str) {
        let path = self.dir.join(name);
        if !path.exists() {
            return;
        }
        if let Err(e) = fs::remove_file(&path) {
            log::warn!("Failed to remove asset {}: {}", name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (AssetStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = AssetStore::new(temp_dir.path().join("deck_images"));
        (store, temp_dir)
    }

    #[test]
    fn test_copy_in_and_resolve() {
        let (store, temp_dir) = create_test_store();
        let source = temp_dir.path().join("a.png");
        fs::write(&source, b"png-bytes").unwrap();

        store.copy_in("a.png", &source).unwrap();
        let resolved = store.resolve("a.png").expect("asset should resolve");
        assert_eq!(fs::read(resolved).unwrap(), b"png-bytes");
    }

    #[test]
    fn test_existing_asset_is_not_overwritten() {
        let (store, temp_dir) = create_test_store();
        let first = temp_dir.path().join("first.bin");
        let second = temp_dir.path().join("second.bin");
        fs::write(&first, b"original").unwrap();
        fs::write(&second, b"different").unwrap();

        store.copy_in("img.png", &first).unwrap();
        store.copy_in("img.png", &second).unwrap();

        let resolved = store.resolve("img.png").unwrap();
        assert_eq!(fs::read(resolved).unwrap(), b"original");
    }

    #[test]
    fn test_resolve_missing_or_empty_name() {
        let (store, _temp_dir) = create_test_store();
        store.ensure_dir().unwrap();
        assert!(store.resolve("nope.png").is_none());
        assert!(store.resolve("").is_none());
    }

    #[test]
    fn test_remove_is_best_effort() {
        let (store, temp_dir) = create_test_store();
        let source = temp_dir.path().join("a.png");
        fs::write(&source, b"x").unwrap();
        store.copy_in("a.png", &source).unwrap();

        store.remove("a.png");
        assert!(store.resolve("a.png").is_none());

        // Removing a name that was never stored must not panic.
        store.remove("ghost.png");
    }
}
