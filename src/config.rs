//! Configuration for schema preparation
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schema-prep.toml)
//! - Environment variables (SCHEMA_PREP__*)
//!
//! ## Example config file (schema-prep.toml):
//! ```toml
//! [schema]
//! dir = "classpath:schemas/movies"
//! lint = true
//!
//! [lint]
//! disabled_rules = ["unexpected-file"]
//!
//! [staging]
//! cleanup = "retain"
//! prefix = "schema-"
//!
//! [classpath]
//! roots = ["resources", "src/test/resources"]
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;
use crate::lint::RuleRegistry;
use crate::preparer::{PrepareOptions, STAGING_PREFIX};
use crate::resource::{classpath, ClasspathBackend, ResourceLoader, Scheme};
use crate::staging::CleanupPolicy;

/// Main configuration for schema preparation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrepConfig {
    /// Which schema directory to stage
    #[serde(default)]
    pub schema: SchemaSection,

    /// Lint rule selection
    #[serde(default)]
    pub lint: LintConfig,

    /// Staging directory settings
    #[serde(default)]
    pub staging: StagingConfig,

    /// Classpath resource roots
    #[serde(default)]
    pub classpath: ClasspathConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaSection {
    /// Scheme-prefixed reference, e.g. `filesystem:db/schema`
    #[serde(default)]
    pub dir: Option<String>,

    /// Fail on lint violations
    #[serde(default)]
    pub lint: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LintConfig {
    /// Rule names to switch off
    #[serde(default)]
    pub disabled_rules: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingConfig {
    #[serde(default)]
    pub cleanup: CleanupPolicy,

    #[serde(default = "default_staging_prefix")]
    pub prefix: String,

    /// Parent directory for staging directories (system temp dir if unset)
    #[serde(default)]
    pub parent: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClasspathConfig {
    /// Directories searched for `classpath:` references, in order
    #[serde(default = "default_classpath_roots")]
    pub roots: Vec<PathBuf>,
}

// Default value functions
fn default_staging_prefix() -> String {
    STAGING_PREFIX.to_string()
}

fn default_classpath_roots() -> Vec<PathBuf> {
    vec![PathBuf::from(classpath::DEFAULT_ROOT)]
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            cleanup: CleanupPolicy::default(),
            prefix: default_staging_prefix(),
            parent: None,
        }
    }
}

impl Default for ClasspathConfig {
    fn default() -> Self {
        Self {
            roots: default_classpath_roots(),
        }
    }
}

impl PrepConfig {
    /// Load configuration from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the default locations
    pub fn load_from(config_path: Option<&str>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "schema-prep.toml",
            ".schema-prep.toml",
            "config/schema-prep.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "vitess", "schema-prep") {
            let xdg_config = config_dir.config_dir().join("schema-prep.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SCHEMA_PREP__SECTION__KEY
        builder = builder.add_source(
            Environment::with_prefix("SCHEMA_PREP")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("lint.disabled_rules")
                .with_list_parse_key("classpath.roots"),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Classpath roots with relative entries resolved against the working directory
    pub fn classpath_roots(&self) -> Vec<PathBuf> {
        self.classpath
            .roots
            .iter()
            .map(|p| classpath::resolve_root(p))
            .collect()
    }

    /// Build preparation options from this configuration
    pub fn prepare_options(&self) -> Result<PrepareOptions> {
        let mut rules = RuleRegistry::builtin();
        rules.disable_all(&self.lint.disabled_rules)?;

        let loader = ResourceLoader::new().with_backend(
            Scheme::Classpath,
            ClasspathBackend::new().with_roots(self.classpath_roots()),
        );

        let mut options = PrepareOptions::new(self.schema.lint)
            .with_rules(rules)
            .with_loader(loader)
            .with_cleanup(self.staging.cleanup);
        options.staging_prefix = self.staging.prefix.clone();
        options.staging_parent = self.staging.parent.clone();
        Ok(options)
    }
}
