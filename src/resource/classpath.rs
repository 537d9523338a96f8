//! `classpath:` resources
//!
//! Resources are looked up first in directories embedded with `include_dir!`,
//! then under each configured resource root. The first hit wins.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use include_dir::{Dir, DirEntry, File};

use super::filesystem::{copy_path, list_dir, read_file};
use super::LoaderBackend;

/// Resource root searched when nothing else is configured
pub const DEFAULT_ROOT: &str = "resources";

/// Resolve a relative resource root against the working directory
pub fn resolve_root(root: &Path) -> PathBuf {
    if root.is_absolute() {
        root.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(root)
    }
}

/// Backend for packaged resources
#[derive(Debug, Clone, Default)]
pub struct ClasspathBackend {
    embedded: Vec<&'static Dir<'static>>,
    roots: Vec<PathBuf>,
}

enum Location {
    EmbeddedDir(&'static Dir<'static>),
    EmbeddedFile(&'static File<'static>),
    Disk(PathBuf),
}

impl ClasspathBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend searching only [`DEFAULT_ROOT`] under the working directory
    pub fn with_default_root() -> Self {
        Self::new().with_root(resolve_root(Path::new(DEFAULT_ROOT)))
    }

    /// Add a directory compiled into the binary
    pub fn embed(mut self, dir: &'static Dir<'static>) -> Self {
        self.embedded.push(dir);
        self
    }

    /// Add a filesystem resource root
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    pub fn with_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.roots.extend(roots.into_iter().map(Into::into));
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn locate(&self, path: &str) -> Option<Location> {
        for &dir in &self.embedded {
            if path.is_empty() {
                return Some(Location::EmbeddedDir(dir));
            }
            if let Some(found) = dir.get_dir(path) {
                return Some(Location::EmbeddedDir(found));
            }
            if let Some(found) = dir.get_file(path) {
                return Some(Location::EmbeddedFile(found));
            }
        }

        self.roots
            .iter()
            .map(|root| root.join(path))
            .find(|candidate| candidate.exists())
            .map(Location::Disk)
    }
}

impl LoaderBackend for ClasspathBackend {
    fn exists(&self, path: &str) -> bool {
        self.locate(path).is_some()
    }

    fn copy_to(&self, path: &str, target: &Path) -> io::Result<()> {
        match self.locate(path) {
            Some(Location::EmbeddedDir(dir)) => copy_embedded_dir(dir, dir.path(), target),
            Some(Location::EmbeddedFile(file)) => {
                let name = file.path().file_name().ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, format!("classpath:{} has no file name", path))
                })?;
                fs::write(target.join(name), file.contents())
            }
            Some(Location::Disk(source)) => copy_path(&source, target),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("classpath:{} not found", path),
            )),
        }
    }

    fn read_to_string(&self, path: &str) -> io::Result<Option<String>> {
        match self.locate(path) {
            Some(Location::EmbeddedFile(file)) => file
                .contents_utf8()
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidData, format!("classpath:{} is not UTF-8", path))
                }),
            Some(Location::Disk(source)) => read_file(&source),
            Some(Location::EmbeddedDir(_)) | None => Ok(None),
        }
    }

    fn list(&self, path: &str) -> Vec<String> {
        match self.locate(path) {
            Some(Location::EmbeddedDir(dir)) => {
                let mut names: Vec<String> = dir
                    .entries()
                    .iter()
                    .filter_map(|entry| entry.path().file_name())
                    .map(|name| name.to_string_lossy().to_string())
                    .collect();
                names.sort();
                names
            }
            Some(Location::Disk(source)) => list_dir(&source),
            Some(Location::EmbeddedFile(_)) | None => Vec::new(),
        }
    }
}

fn copy_embedded_dir(dir: &Dir<'_>, base: &Path, target: &Path) -> io::Result<()> {
    for entry in dir.entries() {
        let relative = entry
            .path()
            .strip_prefix(base)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let destination = target.join(relative);

        match entry {
            DirEntry::Dir(child) => {
                fs::create_dir_all(&destination)?;
                copy_embedded_dir(child, base, target)?;
            }
            DirEntry::File(file) => {
                if let Some(parent) = destination.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&destination, file.contents())?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use include_dir::include_dir;
    use tempfile::tempdir;

    static FIXTURES: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/resources");

    #[test]
    fn test_embedded_lookup() {
        let backend = ClasspathBackend::new().embed(&FIXTURES);
        assert!(backend.exists("schemas/movies"));
        assert!(backend.exists("schemas/movies/movies_sharded/vschema.json"));
        assert!(!backend.exists("schemas/nope"));
        assert_eq!(
            backend.list("schemas/movies"),
            vec!["movies_sharded".to_string(), "movies_unsharded".to_string()]
        );
    }

    #[test]
    fn test_embedded_copy_preserves_content() {
        let target = tempdir().unwrap();
        let backend = ClasspathBackend::new().embed(&FIXTURES);
        backend.copy_to("schemas/movies", target.path()).unwrap();

        let original = FIXTURES
            .get_file("schemas/movies/movies_sharded/vschema.json")
            .unwrap()
            .contents();
        let staged = fs::read(target.path().join("movies_sharded/vschema.json")).unwrap();
        assert_eq!(staged, original);
        assert!(target.path().join("movies_unsharded").is_dir());
    }

    #[test]
    fn test_roots_searched_in_order() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        fs::create_dir_all(second.path().join("schemas")).unwrap();
        fs::write(second.path().join("schemas/marker.txt"), "second").unwrap();

        let backend = ClasspathBackend::new().with_roots([first.path(), second.path()]);
        assert_eq!(
            backend.read_to_string("schemas/marker.txt").unwrap().as_deref(),
            Some("second")
        );

        fs::create_dir_all(first.path().join("schemas")).unwrap();
        fs::write(first.path().join("schemas/marker.txt"), "first").unwrap();
        assert_eq!(
            backend.read_to_string("schemas/marker.txt").unwrap().as_deref(),
            Some("first")
        );
    }

    #[test]
    fn test_default_root_is_resolved_against_working_directory() {
        let backend = ClasspathBackend::with_default_root();
        let expected = std::env::current_dir().unwrap().join(DEFAULT_ROOT);
        assert_eq!(backend.roots(), &[expected]);
        assert_eq!(resolve_root(Path::new("/abs/root")), PathBuf::from("/abs/root"));
    }

    #[test]
    fn test_no_sources_means_missing() {
        let backend = ClasspathBackend::new();
        assert!(!backend.exists("schemas"));
        assert!(backend.copy_to("schemas", Path::new("/nonexistent")).is_err());
    }
}
