//! Keyspace definitions produced by the schema parser

use std::collections::BTreeSet;

use regex::Regex;
use serde::Serialize;

use crate::checksum::Checksum;
use crate::sql::TableNameExtractor;
use crate::vschema;

/// One `.sql` file inside a keyspace directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationFile {
    file_name: String,
    version: Option<u64>,
    statements: Vec<String>,
    checksum: Checksum,
}

impl MigrationFile {
    pub fn new(file_name: impl Into<String>, statements: Vec<String>, checksum: Checksum) -> Self {
        let file_name = file_name.into();
        Self {
            version: parse_version(&file_name),
            file_name,
            statements,
            checksum,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Version from a `v<digits>__<description>.sql` file name
    pub fn version(&self) -> Option<u64> {
        self.version
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }
}

fn parse_version(file_name: &str) -> Option<u64> {
    let re = Regex::new(r"^v(\d+)__.+\.sql$").expect("static regex");
    re.captures(file_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Sort migrations: versioned files by version, then unversioned files by name
pub(crate) fn sort_migrations(migrations: &mut [MigrationFile]) {
    migrations.sort_by(|a, b| {
        (a.version.is_none(), a.version, &a.file_name).cmp(&(b.version.is_none(), b.version, &b.file_name))
    });
}

/// A validated keyspace: its VSchema plus the ordered DDL that builds it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyspace {
    name: String,
    sharded: bool,
    vschema: serde_json::Value,
    vschema_checksum: Checksum,
    migrations: Vec<MigrationFile>,
    ignored_files: Vec<String>,
}

impl Keyspace {
    pub fn new(
        name: impl Into<String>,
        vschema: serde_json::Value,
        vschema_checksum: Checksum,
        mut migrations: Vec<MigrationFile>,
        ignored_files: Vec<String>,
    ) -> Self {
        sort_migrations(&mut migrations);
        Self {
            name: name.into(),
            sharded: vschema::is_sharded(&vschema),
            vschema,
            vschema_checksum,
            migrations,
            ignored_files,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_sharded(&self) -> bool {
        self.sharded
    }

    /// Shards the local test cluster runs for this keyspace
    pub fn shard_count(&self) -> usize {
        if self.sharded {
            2
        } else {
            1
        }
    }

    pub fn vschema(&self) -> &serde_json::Value {
        &self.vschema
    }

    pub fn vschema_checksum(&self) -> &Checksum {
        &self.vschema_checksum
    }

    pub fn migrations(&self) -> &[MigrationFile] {
        &self.migrations
    }

    /// Files in the keyspace directory that are neither `vschema.json` nor `.sql`
    pub fn ignored_files(&self) -> &[String] {
        &self.ignored_files
    }

    /// Every statement in application order
    pub fn ddl_commands(&self) -> impl Iterator<Item = &str> {
        self.migrations
            .iter()
            .flat_map(|m| m.statements.iter().map(String::as_str))
    }

    /// Names of tables created by the migrations
    pub fn tables(&self) -> BTreeSet<String> {
        let extractor = TableNameExtractor::new();
        self.ddl_commands()
            .filter_map(|statement| extractor.created_table(statement))
            .collect()
    }
}
