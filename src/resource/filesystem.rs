//! `filesystem:` resources

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

use super::LoaderBackend;

/// Backend for plain filesystem paths
#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemBackend;

impl LoaderBackend for FilesystemBackend {
    fn exists(&self, path: &str) -> bool {
        !path.is_empty() && Path::new(path).exists()
    }

    fn copy_to(&self, path: &str, target: &Path) -> io::Result<()> {
        copy_path(Path::new(path), target)
    }

    fn read_to_string(&self, path: &str) -> io::Result<Option<String>> {
        read_file(Path::new(path))
    }

    fn list(&self, path: &str) -> Vec<String> {
        list_dir(Path::new(path))
    }
}

/// Copy a file or directory tree into `target`
pub(crate) fn copy_path(source: &Path, target: &Path) -> io::Result<()> {
    let canonical_source = fs::canonicalize(source)?;
    let canonical_target = fs::canonicalize(target)?;
    if canonical_source.is_dir() && canonical_target.starts_with(&canonical_source) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "target {} is inside the source tree {}",
                canonical_target.display(),
                canonical_source.display()
            ),
        ));
    }

    if source.is_file() {
        let file_name = source.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("{} has no file name", source.display()))
        })?;
        fs::copy(source, target.join(file_name))?;
        return Ok(());
    }
    copy_tree(source, target)
}

/// Recursively copy the contents of `source` into `target`, preserving layout
pub(crate) fn copy_tree(source: &Path, target: &Path) -> io::Result<()> {
    for entry in WalkDir::new(source)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination)?;
        } else {
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &destination)?;
        }
    }
    Ok(())
}

pub(crate) fn read_file(path: &Path) -> io::Result<Option<String>> {
    if !path.is_file() {
        return Ok(None);
    }
    fs::read_to_string(path).map(Some)
}

pub(crate) fn list_dir(path: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(path) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
