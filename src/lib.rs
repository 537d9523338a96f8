//! Vitess Schema Preparation
//!
//! Stages and validates keyspace schema directories before a local Vitess test
//! database is started.
//!
//! ## Features
//!
//! - **Scheme-aware loading**: `classpath:` (embedded or resource roots) and
//!   `filesystem:` references
//! - **Isolated staging**: every run copies its schema into a fresh temp directory
//! - **Structural validation**: `vschema.json` shape, migration ordering, SQL splitting
//! - **Pluggable linting**: named rules that can be switched on and off
//!
//! ## Layout
//!
//! ```text
//! schemas/movies/
//! ├── movies_sharded/
//! │   ├── vschema.json
//! │   └── v0001__create_movies.sql
//! └── movies_unsharded/
//!     ├── vschema.json
//!     └── v0001__create_movies_seq.sql
//! ```
//!
//! ```no_run
//! use vitess_schema_prep::SchemaPreparer;
//!
//! let prepared = SchemaPreparer::new(true, "filesystem:db/schemas/movies")?;
//! for keyspace in prepared.keyspaces() {
//!     println!("{} (sharded: {})", keyspace.name(), keyspace.is_sharded());
//! }
//! println!("staged at {}", prepared.current_schema_dir_path().display());
//! # Ok::<(), vitess_schema_prep::SchemaError>(())
//! ```

pub mod checksum;
pub mod config;
pub mod error;
pub mod keyspace;
pub mod lint;
pub mod parser;
pub mod preparer;
pub mod resource;
pub mod sql;
pub mod staging;
pub mod vschema;

pub use checksum::Checksum;
pub use config::PrepConfig;
pub use error::{Result, SchemaError};
pub use keyspace::{Keyspace, MigrationFile};
pub use lint::{LintRule, RuleRegistry};
pub use parser::SchemaParser;
pub use preparer::{PrepareOptions, SchemaPreparer};
pub use resource::{ClasspathBackend, FilesystemBackend, ResourceLoader, Scheme, SchemaDirectoryReference};
pub use staging::{CleanupPolicy, StagingDirectory};
