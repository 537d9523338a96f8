//! Resource Loading
//!
//! Resolves scheme-prefixed schema directory references and materializes them
//! on disk. Two schemes are supported:
//!
//! - `classpath:` resources packaged with the binary (via `include_dir!`) or found
//!   under configured resource roots
//! - `filesystem:` plain paths, absolute or relative to the working directory
//!
//! Each scheme maps to exactly one [`LoaderBackend`]; callers never match on
//! prefixes themselves.

pub mod classpath;
pub mod filesystem;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SchemaError};

pub use classpath::ClasspathBackend;
pub use filesystem::FilesystemBackend;

/// Supported resource schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheme {
    Classpath,
    Filesystem,
}

impl Scheme {
    pub const ALL: [Scheme; 2] = [Scheme::Classpath, Scheme::Filesystem];

    /// Prefix including the trailing colon, e.g. `classpath:`
    pub fn prefix(&self) -> &'static str {
        match self {
            Scheme::Classpath => "classpath:",
            Scheme::Filesystem => "filesystem:",
        }
    }

    /// Human readable list of prefixes, used in error messages
    pub fn supported_prefixes() -> String {
        let prefixes: Vec<_> = Self::ALL.iter().map(|s| s.prefix()).collect();
        format!("[{}]", prefixes.join(", "))
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix().trim_end_matches(':'))
    }
}

/// A schema directory reference such as `classpath:schemas/movies`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaDirectoryReference {
    scheme: Scheme,
    path: String,
    raw: String,
}

impl SchemaDirectoryReference {
    /// Parse a reference, rejecting unknown schemes before any I/O happens
    pub fn parse(raw: &str) -> Result<Self> {
        for scheme in Scheme::ALL {
            if let Some(rest) = raw.strip_prefix(scheme.prefix()) {
                let path = match scheme {
                    Scheme::Classpath => rest.trim_matches('/'),
                    // the filesystem root keeps its slash
                    Scheme::Filesystem => match rest.trim_end_matches('/') {
                        "" if rest.starts_with('/') => "/",
                        trimmed => trimmed,
                    },
                };
                return Ok(Self {
                    scheme,
                    path: path.to_string(),
                    raw: raw.to_string(),
                });
            }
        }

        Err(SchemaError::UnsupportedScheme {
            reference: raw.to_string(),
            supported: Scheme::supported_prefixes(),
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Path relative to the scheme root
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The reference as originally written
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for SchemaDirectoryReference {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SchemaDirectoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Storage behind one scheme
pub trait LoaderBackend: Send + Sync {
    /// Whether a file or directory exists at `path`
    fn exists(&self, path: &str) -> bool;

    /// Copy the resource at `path` into the existing directory `target`.
    ///
    /// Directories are copied recursively with their layout preserved; a single
    /// file lands at `target/<file name>`.
    fn copy_to(&self, path: &str, target: &Path) -> std::io::Result<()>;

    /// Read a file resource as UTF-8, `None` if there is no such file
    fn read_to_string(&self, path: &str) -> std::io::Result<Option<String>>;

    /// Names of the direct children of a directory resource, sorted
    fn list(&self, path: &str) -> Vec<String>;
}

/// Scheme-keyed table of loader backends
pub struct ResourceLoader {
    classpath: Box<dyn LoaderBackend>,
    filesystem: Box<dyn LoaderBackend>,
}

impl Default for ResourceLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceLoader {
    /// Loader with the default classpath root and plain filesystem access
    pub fn new() -> Self {
        Self {
            classpath: Box::new(ClasspathBackend::with_default_root()),
            filesystem: Box::new(FilesystemBackend),
        }
    }

    /// Replace the backend registered for `scheme`
    pub fn with_backend(mut self, scheme: Scheme, backend: impl LoaderBackend + 'static) -> Self {
        match scheme {
            Scheme::Classpath => self.classpath = Box::new(backend),
            Scheme::Filesystem => self.filesystem = Box::new(backend),
        }
        self
    }

    fn backend(&self, scheme: Scheme) -> &dyn LoaderBackend {
        match scheme {
            Scheme::Classpath => self.classpath.as_ref(),
            Scheme::Filesystem => self.filesystem.as_ref(),
        }
    }

    pub fn exists(&self, reference: &SchemaDirectoryReference) -> bool {
        self.backend(reference.scheme()).exists(reference.path())
    }

    /// Copy the referenced tree into `target`, which must already exist
    pub fn copy_to(&self, reference: &SchemaDirectoryReference, target: &Path) -> Result<()> {
        if !self.exists(reference) {
            return Err(SchemaError::SourceNotFound(reference.to_string()));
        }

        let copy_failure = |source: std::io::Error| SchemaError::CopyFailure {
            reference: reference.to_string(),
            target: target.to_path_buf(),
            source,
        };

        if !target.is_dir() {
            return Err(copy_failure(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "target directory does not exist",
            )));
        }

        debug!(reference = %reference, target = %target.display(), "Copying schema resources");
        self.backend(reference.scheme())
            .copy_to(reference.path(), target)
            .map_err(copy_failure)
    }

    pub fn read_to_string(&self, reference: &SchemaDirectoryReference) -> Result<Option<String>> {
        Ok(self.backend(reference.scheme()).read_to_string(reference.path())?)
    }

    pub fn list(&self, reference: &SchemaDirectoryReference) -> Vec<String> {
        self.backend(reference.scheme()).list(reference.path())
    }
}
