//! Schema Preparer
//!
//! Validates a schema directory reference, stages a copy of it in a fresh
//! temporary directory and parses the copy into keyspaces. All of this happens
//! in the constructor: a `SchemaPreparer` that exists is fully staged and
//! validated.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::checksum::Checksum;
use crate::config::PrepConfig;
use crate::error::{Result, SchemaError};
use crate::keyspace::Keyspace;
use crate::lint::RuleRegistry;
use crate::parser::SchemaParser;
use crate::resource::{ResourceLoader, SchemaDirectoryReference};
use crate::staging::{CleanupPolicy, StagingDirectory};

/// Default prefix for staging directory names
pub const STAGING_PREFIX: &str = "schema-";

/// Everything a preparation run can be customized with
pub struct PrepareOptions {
    /// Fail on lint violations instead of logging them
    pub lint_schema: bool,
    pub rules: RuleRegistry,
    pub loader: ResourceLoader,
    pub cleanup: CleanupPolicy,
    /// Where staging directories are created; system temp dir when `None`
    pub staging_parent: Option<PathBuf>,
    pub staging_prefix: String,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self::new(false)
    }
}

impl PrepareOptions {
    pub fn new(lint_schema: bool) -> Self {
        Self {
            lint_schema,
            rules: RuleRegistry::builtin(),
            loader: ResourceLoader::new(),
            cleanup: CleanupPolicy::default(),
            staging_parent: None,
            staging_prefix: STAGING_PREFIX.to_string(),
        }
    }

    pub fn with_rules(mut self, rules: RuleRegistry) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_loader(mut self, loader: ResourceLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_cleanup(mut self, cleanup: CleanupPolicy) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn with_staging_parent(mut self, parent: impl Into<PathBuf>) -> Self {
        self.staging_parent = Some(parent.into());
        self
    }
}

/// A staged and validated schema directory
#[derive(Debug)]
pub struct SchemaPreparer {
    reference: SchemaDirectoryReference,
    keyspaces: Vec<Keyspace>,
    staging: StagingDirectory,
    bundle_hash: Checksum,
}

impl SchemaPreparer {
    /// Prepare `schema_dir` with default options
    pub fn new(lint_schema: bool, schema_dir: &str) -> Result<Self> {
        Self::with_options(schema_dir, PrepareOptions::new(lint_schema))
    }

    /// Prepare the schema directory named in configuration
    pub fn from_config(config: &PrepConfig) -> Result<Self> {
        let schema_dir = config.schema.dir.as_deref().ok_or_else(|| {
            SchemaError::Config(config_crate::ConfigError::NotFound("schema.dir".to_string()))
        })?;
        Self::with_options(schema_dir, config.prepare_options()?)
    }

    pub fn with_options(schema_dir: &str, options: PrepareOptions) -> Result<Self> {
        let reference = SchemaDirectoryReference::parse(schema_dir)?;
        debug!(reference = %reference, scheme = %reference.scheme(), "Schema directory reference accepted");

        if !options.loader.exists(&reference) {
            return Err(SchemaError::SourceNotFound(reference.to_string()));
        }

        let staging = StagingDirectory::create(
            options.staging_parent.as_deref(),
            &options.staging_prefix,
            options.cleanup,
        )
        .map_err(|source| SchemaError::CopyFailure {
            reference: reference.to_string(),
            target: options
                .staging_parent
                .clone()
                .unwrap_or_else(std::env::temp_dir),
            source,
        })?;
        debug!(path = %staging.path().display(), "Created staging directory");

        options.loader.copy_to(&reference, staging.path())?;

        let keyspaces = SchemaParser::new(options.lint_schema, &options.rules)?
            .with_source_label(reference.as_str())
            .validate_and_parse(staging.path())?;

        let bundle_hash = bundle_hash(&keyspaces);
        info!(
            reference = %reference,
            keyspaces = keyspaces.len(),
            path = %staging.path().display(),
            lint = options.lint_schema,
            "Schema directory staged"
        );

        Ok(Self {
            reference,
            keyspaces,
            staging,
            bundle_hash,
        })
    }

    /// Keyspaces sorted by name
    pub fn keyspaces(&self) -> &[Keyspace] {
        &self.keyspaces
    }

    /// The staged copy of the schema directory
    pub fn current_schema_dir_path(&self) -> &Path {
        self.staging.path()
    }

    pub fn reference(&self) -> &SchemaDirectoryReference {
        &self.reference
    }

    /// Hash over every staged vschema and migration, in keyspace order
    pub fn bundle_hash(&self) -> &Checksum {
        &self.bundle_hash
    }

    /// Remove the staging directory
    pub fn cleanup(self) -> Result<()> {
        let path = self.staging.path().to_path_buf();
        self.staging.cleanup()?;
        debug!(path = %path.display(), "Removed staging directory");
        Ok(())
    }
}

fn bundle_hash(keyspaces: &[Keyspace]) -> Checksum {
    let mut labelled = Vec::new();
    for keyspace in keyspaces {
        labelled.push((format!("{}/vschema.json", keyspace.name()), keyspace.vschema_checksum()));
        for migration in keyspace.migrations() {
            labelled.push((
                format!("{}/{}", keyspace.name(), migration.file_name()),
                migration.checksum(),
            ));
        }
    }
    Checksum::combine(labelled.iter().map(|(label, checksum)| (label.as_str(), *checksum)))
}
