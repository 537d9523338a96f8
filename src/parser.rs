//! Schema Parsing
//!
//! Walks a staged schema directory, groups files into keyspaces, enforces the
//! structural rules and runs the lint rules.
//!
//! ```text
//! <staged root>/
//! ├── movies_sharded/
//! │   ├── vschema.json
//! │   └── v0001__create_movies.sql
//! └── movies_unsharded/
//!     ├── vschema.json
//!     └── v0001__create_movies_seq.sql
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::checksum::Checksum;
use crate::error::{Result, SchemaError};
use crate::keyspace::{Keyspace, MigrationFile};
use crate::lint::RuleRegistry;
use crate::sql::split_statements;
use crate::vschema::{VSchemaValidator, VSCHEMA_FILE};

/// Parses and validates a staged schema tree
pub struct SchemaParser<'a> {
    lint_schema: bool,
    rules: &'a RuleRegistry,
    vschema: VSchemaValidator,
    /// Prefix for paths in error messages, usually the original reference
    source_label: String,
}

impl<'a> SchemaParser<'a> {
    pub fn new(lint_schema: bool, rules: &'a RuleRegistry) -> Result<Self> {
        Ok(Self {
            lint_schema,
            rules,
            vschema: VSchemaValidator::new()?,
            source_label: String::new(),
        })
    }

    pub fn with_source_label(mut self, label: impl Into<String>) -> Self {
        self.source_label = label.into();
        self
    }

    fn label(&self, relative: &str) -> String {
        match (self.source_label.is_empty(), relative.is_empty()) {
            (true, _) => relative.to_string(),
            (false, true) => self.source_label.clone(),
            (false, false) => format!("{}/{}", self.source_label.trim_end_matches('/'), relative),
        }
    }

    /// Parse every keyspace under `root`, sorted by name
    pub fn validate_and_parse(&self, root: &Path) -> Result<Vec<Keyspace>> {
        let keyspace_dirs = self.keyspace_dirs(root)?;
        if keyspace_dirs.is_empty() {
            return Err(SchemaError::validation(
                self.label(""),
                "No keyspace directories found in schema directory",
            ));
        }

        let mut keyspaces = keyspace_dirs
            .iter()
            .map(|(name, dir)| self.parse_keyspace(name, dir))
            .collect::<Result<Vec<_>>>()?;
        keyspaces.sort_by(|a, b| a.name().cmp(b.name()));

        let mut violations = Vec::new();
        for keyspace in &keyspaces {
            let result = self.rules.lint(keyspace);
            for violation in result.violations {
                if self.lint_schema {
                    violations.push(violation.to_string());
                } else {
                    warn!(keyspace = %keyspace.name(), code = violation.code, "{}", violation);
                }
            }
        }

        if !violations.is_empty() {
            return Err(SchemaError::ValidationFailure {
                path: self.label(""),
                violations,
            });
        }

        debug!(count = keyspaces.len(), "Parsed keyspaces");
        Ok(keyspaces)
    }

    fn keyspace_dirs(&self, root: &Path) -> Result<Vec<(String, PathBuf)>> {
        let mut dirs = Vec::new();
        for entry in fs::read_dir(root)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();

            if name.starts_with('.') {
                continue;
            }
            if !path.is_dir() {
                debug!(file = %name, "Ignoring file at schema root");
                continue;
            }
            dirs.push((name, path));
        }
        dirs.sort();
        Ok(dirs)
    }

    fn parse_keyspace(&self, name: &str, dir: &Path) -> Result<Keyspace> {
        let mut entries: Vec<_> = fs::read_dir(dir)?
            .collect::<std::io::Result<Vec<_>>>()?
            .into_iter()
            .map(|e| (e.file_name().to_string_lossy().to_string(), e.path()))
            .collect();
        entries.sort();

        let mut vschema = None;
        let mut migrations = Vec::new();
        let mut ignored_files = Vec::new();

        for (file_name, path) in entries {
            if file_name.starts_with('.') {
                continue;
            }
            if path.is_dir() {
                ignored_files.push(format!("{}/", file_name));
            } else if file_name == VSCHEMA_FILE {
                vschema = Some(self.read_vschema(name, &path)?);
            } else if file_name.ends_with(".sql") {
                migrations.push(self.read_migration(name, &file_name, &path)?);
            } else {
                ignored_files.push(file_name);
            }
        }

        let Some((vschema, vschema_checksum)) = vschema else {
            return Err(SchemaError::validation(
                self.label(name),
                format!("{} not found in keyspace `{}`", VSCHEMA_FILE, name),
            ));
        };

        let mut versions: BTreeMap<u64, &str> = BTreeMap::new();
        for migration in &migrations {
            let Some(version) = migration.version() else { continue };
            if let Some(previous) = versions.insert(version, migration.file_name()) {
                return Err(SchemaError::validation(
                    self.label(name),
                    format!(
                        "Duplicate migration version {}: {} and {}",
                        version,
                        previous,
                        migration.file_name()
                    ),
                ));
            }
        }

        debug!(keyspace = %name, migrations = migrations.len(), "Parsed keyspace");
        Ok(Keyspace::new(name, vschema, vschema_checksum, migrations, ignored_files))
    }

    fn read_vschema(&self, keyspace: &str, path: &Path) -> Result<(serde_json::Value, Checksum)> {
        let label = self.label(&format!("{}/{}", keyspace, VSCHEMA_FILE));
        let bytes = fs::read(path)?;
        let document: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| SchemaError::validation(&label, format!("Invalid JSON: {}", e)))?;

        self.vschema
            .validate(&document)
            .map_err(|violations| SchemaError::ValidationFailure {
                path: label.clone(),
                violations,
            })?;

        Ok((document, Checksum::from_bytes(&bytes)))
    }

    fn read_migration(&self, keyspace: &str, file_name: &str, path: &Path) -> Result<MigrationFile> {
        let label = self.label(&format!("{}/{}", keyspace, file_name));
        let bytes = fs::read(path)?;
        let checksum = Checksum::from_bytes(&bytes);

        let sql = String::from_utf8(bytes)
            .map_err(|e| SchemaError::validation(&label, format!("Not valid UTF-8: {}", e)))?;
        let statements = split_statements(&sql)
            .map_err(|e| SchemaError::validation(&label, format!("Malformed SQL: {}", e)))?;

        Ok(MigrationFile::new(file_name, statements, checksum))
    }
}
