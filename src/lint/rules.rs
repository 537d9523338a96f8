//! Built-in lint rules

use regex::Regex;

use super::{LintResult, LintRule};
use crate::keyspace::Keyspace;
use crate::sql::leading_keyword;
use crate::vschema::{self, VSCHEMA_FILE};

fn file_path(keyspace: &Keyspace, file: &str) -> String {
    format!("{}/{}", keyspace.name(), file)
}

/// Keyspace directory names are lower snake_case
pub struct KeyspaceNaming {
    pattern: Regex,
}

impl KeyspaceNaming {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"^[a-z][a-z0-9_]*$").expect("static regex"),
        }
    }
}

impl Default for KeyspaceNaming {
    fn default() -> Self {
        Self::new()
    }
}

impl LintRule for KeyspaceNaming {
    fn name(&self) -> &'static str {
        "keyspace-naming"
    }

    fn description(&self) -> &'static str {
        "Keyspace directory names must be lower snake_case"
    }

    fn check(&self, keyspace: &Keyspace, result: &mut LintResult) {
        if !self.pattern.is_match(keyspace.name()) {
            result.push(
                self.name(),
                keyspace.name(),
                format!("Keyspace name '{}' must match {}", keyspace.name(), self.pattern.as_str()),
            );
        }
    }
}

/// Migration files are named `v<version>__<description>.sql`
pub struct MigrationFileNaming {
    pattern: Regex,
}

impl MigrationFileNaming {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"^v\d+__[a-z0-9_]+\.sql$").expect("static regex"),
        }
    }
}

impl Default for MigrationFileNaming {
    fn default() -> Self {
        Self::new()
    }
}

impl LintRule for MigrationFileNaming {
    fn name(&self) -> &'static str {
        "migration-file-naming"
    }

    fn description(&self) -> &'static str {
        "Migration files must be named v<version>__<snake_case_description>.sql"
    }

    fn check(&self, keyspace: &Keyspace, result: &mut LintResult) {
        for migration in keyspace.migrations() {
            if !self.pattern.is_match(migration.file_name()) {
                result.push(
                    self.name(),
                    file_path(keyspace, migration.file_name()),
                    format!(
                        "Migration file '{}' must match {}",
                        migration.file_name(),
                        self.pattern.as_str()
                    ),
                );
            }
        }
    }
}

pub struct EmptyMigration;

impl LintRule for EmptyMigration {
    fn name(&self) -> &'static str {
        "empty-migration"
    }

    fn description(&self) -> &'static str {
        "Migration files must contain at least one statement"
    }

    fn check(&self, keyspace: &Keyspace, result: &mut LintResult) {
        for migration in keyspace.migrations() {
            if migration.statements().is_empty() {
                result.push(
                    self.name(),
                    file_path(keyspace, migration.file_name()),
                    "Migration file contains no statements",
                );
            }
        }
    }
}

/// Statement kinds allowed in schema migrations
const DDL_KEYWORDS: &[&str] = &["CREATE", "ALTER", "DROP", "RENAME", "TRUNCATE", "INSERT"];

pub struct DdlStatement;

impl LintRule for DdlStatement {
    fn name(&self) -> &'static str {
        "ddl-statement"
    }

    fn description(&self) -> &'static str {
        "Statements must be DDL (CREATE, ALTER, DROP, RENAME, TRUNCATE) or seed INSERTs"
    }

    fn check(&self, keyspace: &Keyspace, result: &mut LintResult) {
        for migration in keyspace.migrations() {
            for (i, statement) in migration.statements().iter().enumerate() {
                let keyword = leading_keyword(statement);
                if !DDL_KEYWORDS.contains(&keyword.as_str()) {
                    result.push(
                        self.name(),
                        format!("{}[{}]", file_path(keyspace, migration.file_name()), i),
                        format!("Unsupported statement kind '{}'. Must be one of: {:?}", keyword, DDL_KEYWORDS),
                    );
                }
            }
        }
    }
}

pub struct UnexpectedFile;

impl LintRule for UnexpectedFile {
    fn name(&self) -> &'static str {
        "unexpected-file"
    }

    fn description(&self) -> &'static str {
        "Keyspace directories may only contain vschema.json and .sql files"
    }

    fn check(&self, keyspace: &Keyspace, result: &mut LintResult) {
        for file in keyspace.ignored_files() {
            result.push(
                self.name(),
                file_path(keyspace, file),
                format!("Unexpected file '{}'. Only {} and .sql files are staged.", file, VSCHEMA_FILE),
            );
        }
    }
}

/// Sharded keyspaces must route every table they create
pub struct VSchemaMissingTable;

impl LintRule for VSchemaMissingTable {
    fn name(&self) -> &'static str {
        "vschema-missing-table"
    }

    fn description(&self) -> &'static str {
        "Tables created in a sharded keyspace must be declared in its vschema"
    }

    fn check(&self, keyspace: &Keyspace, result: &mut LintResult) {
        if !keyspace.is_sharded() {
            return;
        }
        let declared = vschema::tables(keyspace.vschema());
        for table in keyspace.tables() {
            if !declared.contains_key(table.as_str()) {
                result.push(
                    self.name(),
                    file_path(keyspace, VSCHEMA_FILE),
                    format!("Table '{}' is created but not declared in the vschema", table),
                );
            }
        }
    }
}

pub struct VSchemaUnknownTable;

impl LintRule for VSchemaUnknownTable {
    fn name(&self) -> &'static str {
        "vschema-unknown-table"
    }

    fn description(&self) -> &'static str {
        "Tables declared in the vschema must be created by a migration"
    }

    fn check(&self, keyspace: &Keyspace, result: &mut LintResult) {
        let created = keyspace.tables();
        for table in vschema::tables(keyspace.vschema()).keys() {
            if !created.contains(*table) {
                result.push(
                    self.name(),
                    file_path(keyspace, VSCHEMA_FILE),
                    format!("Table '{}' is declared in the vschema but never created", table),
                );
            }
        }
    }
}

pub struct ShardedTableVindex;

impl LintRule for ShardedTableVindex {
    fn name(&self) -> &'static str {
        "sharded-table-vindex"
    }

    fn description(&self) -> &'static str {
        "Tables in a sharded keyspace must declare at least one column vindex"
    }

    fn check(&self, keyspace: &Keyspace, result: &mut LintResult) {
        if !keyspace.is_sharded() {
            return;
        }
        for (table, entry) in vschema::tables(keyspace.vschema()) {
            if matches!(vschema::table_type(entry), Some("sequence") | Some("reference")) {
                continue;
            }
            if vschema::column_vindexes(entry).is_empty() {
                result.push(
                    self.name(),
                    format!("{}:tables.{}", file_path(keyspace, VSCHEMA_FILE), table),
                    format!("Sharded table '{}' has no column_vindexes", table),
                );
            }
        }
    }
}

pub struct ColumnVindexReference;

impl LintRule for ColumnVindexReference {
    fn name(&self) -> &'static str {
        "column-vindex-reference"
    }

    fn description(&self) -> &'static str {
        "Column vindexes must reference a vindex declared in the same vschema"
    }

    fn check(&self, keyspace: &Keyspace, result: &mut LintResult) {
        let declared = vschema::vindex_names(keyspace.vschema());
        for (table, entry) in vschema::tables(keyspace.vschema()) {
            for vindex in vschema::column_vindexes(entry) {
                if !declared.contains(vindex) {
                    result.push(
                        self.name(),
                        format!("{}:tables.{}", file_path(keyspace, VSCHEMA_FILE), table),
                        format!("Column vindex '{}' is not declared in vindexes", vindex),
                    );
                }
            }
        }
    }
}

pub struct SequenceInShardedKeyspace;

impl LintRule for SequenceInShardedKeyspace {
    fn name(&self) -> &'static str {
        "sequence-in-sharded-keyspace"
    }

    fn description(&self) -> &'static str {
        "Sequence tables must live in an unsharded keyspace"
    }

    fn check(&self, keyspace: &Keyspace, result: &mut LintResult) {
        if !keyspace.is_sharded() {
            return;
        }
        for (table, entry) in vschema::tables(keyspace.vschema()) {
            if vschema::table_type(entry) == Some("sequence") {
                result.push(
                    self.name(),
                    format!("{}:tables.{}", file_path(keyspace, VSCHEMA_FILE), table),
                    format!("Sequence table '{}' is declared in a sharded keyspace", table),
                );
            }
        }
    }
}
