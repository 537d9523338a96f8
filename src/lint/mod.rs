//! Schema Linting
//!
//! Convention checks that run on every parsed keyspace. Rules are registered
//! explicitly in a [`RuleRegistry`] keyed by rule name and can be enabled or
//! disabled one by one.
//!
//! Whether a violation is fatal is decided by the caller: in lint mode any
//! violation aborts preparation, otherwise violations are only logged.
//!
//! ## Built-in rules
//! - `keyspace-naming`, `migration-file-naming`: directory and file naming
//! - `empty-migration`, `ddl-statement`, `unexpected-file`: migration content
//! - `vschema-missing-table`, `vschema-unknown-table`, `sharded-table-vindex`,
//!   `column-vindex-reference`, `sequence-in-sharded-keyspace`: VSchema
//!   consistency with the DDL

mod rules;

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, SchemaError};
use crate::keyspace::Keyspace;

pub use rules::{
    ColumnVindexReference, DdlStatement, EmptyMigration, KeyspaceNaming, MigrationFileNaming,
    SequenceInShardedKeyspace, ShardedTableVindex, UnexpectedFile, VSchemaMissingTable,
    VSchemaUnknownTable,
};

/// Result of linting one keyspace
#[derive(Debug, Default)]
pub struct LintResult {
    pub keyspace: String,
    pub violations: Vec<LintViolation>,
}

impl LintResult {
    pub fn new(keyspace: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            violations: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn push(&mut self, code: &'static str, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(LintViolation {
            code,
            message: message.into(),
            path: path.into(),
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintViolation {
    pub code: &'static str,
    pub message: String,
    /// Keyspace-relative path, e.g. `movies/v0001__create.sql`
    pub path: String,
}

impl fmt::Display for LintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.path, self.message)
    }
}

/// A single named convention check
pub trait LintRule: Send + Sync {
    /// Stable kebab-case name used in configuration
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn check(&self, keyspace: &Keyspace, result: &mut LintResult);
}

struct RegisteredRule {
    rule: Box<dyn LintRule>,
    enabled: bool,
}

/// Name-keyed table of lint rules
pub struct RuleRegistry {
    rules: BTreeMap<&'static str, RegisteredRule>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleRegistry {
    /// A registry with no rules
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// All built-in rules, enabled
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(KeyspaceNaming::new());
        registry.register(MigrationFileNaming::new());
        registry.register(EmptyMigration);
        registry.register(DdlStatement);
        registry.register(UnexpectedFile);
        registry.register(VSchemaMissingTable);
        registry.register(VSchemaUnknownTable);
        registry.register(ShardedTableVindex);
        registry.register(ColumnVindexReference);
        registry.register(SequenceInShardedKeyspace);
        registry
    }

    /// Register (or replace) a rule, enabled
    pub fn register(&mut self, rule: impl LintRule + 'static) {
        self.rules.insert(
            rule.name(),
            RegisteredRule {
                rule: Box::new(rule),
                enabled: true,
            },
        );
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        match self.rules.get_mut(name) {
            Some(entry) => {
                entry.enabled = enabled;
                Ok(())
            }
            None => Err(SchemaError::UnknownLintRule(name.to_string())),
        }
    }

    /// Disable every named rule, failing on the first unknown name
    pub fn disable_all<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.set_enabled(name.as_ref(), false)?;
        }
        Ok(())
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.rules.get(name).map(|e| e.enabled).unwrap_or(false)
    }

    /// Rules in name order with their enabled flag
    pub fn rules(&self) -> impl Iterator<Item = (&dyn LintRule, bool)> {
        self.rules.values().map(|e| (e.rule.as_ref(), e.enabled))
    }

    /// Run every enabled rule against a keyspace
    pub fn lint(&self, keyspace: &Keyspace) -> LintResult {
        let mut result = LintResult::new(keyspace.name());
        for entry in self.rules.values().filter(|e| e.enabled) {
            entry.rule.check(keyspace, &mut result);
        }
        result
    }
}
