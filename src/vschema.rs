//! VSchema documents (`vschema.json`)
//!
//! Structural checks run against an embedded JSON Schema; the accessors below
//! assume a document that already passed them and fall back to empty values
//! otherwise.

use std::collections::{BTreeMap, BTreeSet};

use jsonschema::JSONSchema;
use serde_json::Value;

use crate::error::Result;

/// File name expected in every keyspace directory
pub const VSCHEMA_FILE: &str = "vschema.json";

const VSCHEMA_META_SCHEMA: &str = r#"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "title": "VSchema",
  "type": "object",
  "properties": {
    "sharded": { "type": "boolean" },
    "vindexes": {
      "type": "object",
      "additionalProperties": {
        "type": "object",
        "required": ["type"],
        "properties": {
          "type": { "type": "string", "minLength": 1 },
          "params": { "type": "object" },
          "owner": { "type": "string" }
        }
      }
    },
    "tables": {
      "type": "object",
      "additionalProperties": {
        "type": "object",
        "properties": {
          "type": { "type": "string" },
          "column_vindexes": {
            "type": "array",
            "items": {
              "type": "object",
              "required": ["name"],
              "properties": {
                "name": { "type": "string", "minLength": 1 },
                "column": { "type": "string", "minLength": 1 },
                "columns": { "type": "array", "items": { "type": "string" }, "minItems": 1 }
              },
              "oneOf": [
                { "required": ["column"] },
                { "required": ["columns"] }
              ]
            }
          },
          "auto_increment": {
            "type": "object",
            "required": ["column", "sequence"],
            "properties": {
              "column": { "type": "string" },
              "sequence": { "type": "string" }
            }
          }
        }
      }
    }
  }
}"#;

/// Compiled structural validator for VSchema documents
pub struct VSchemaValidator {
    compiled: JSONSchema,
}

impl VSchemaValidator {
    pub fn new() -> Result<Self> {
        let meta: Value = serde_json::from_str(VSCHEMA_META_SCHEMA)?;
        let compiled = JSONSchema::compile(&meta).map_err(|e| {
            crate::error::SchemaError::validation("vschema meta-schema", e.to_string())
        })?;
        Ok(Self { compiled })
    }

    /// Validate a document, returning one message per violation
    pub fn validate(&self, document: &Value) -> std::result::Result<(), Vec<String>> {
        match self.compiled.validate(document) {
            Ok(()) => Ok(()),
            Err(errors) => Err(errors
                .map(|e| {
                    let pointer = e.instance_path.to_string();
                    if pointer.is_empty() {
                        e.to_string()
                    } else {
                        format!("{} at {}", e, pointer)
                    }
                })
                .collect()),
        }
    }
}

pub fn is_sharded(vschema: &Value) -> bool {
    vschema.get("sharded").and_then(Value::as_bool).unwrap_or(false)
}

/// Table entries keyed by table name
pub fn tables(vschema: &Value) -> BTreeMap<&str, &Value> {
    vschema
        .get("tables")
        .and_then(Value::as_object)
        .map(|tables| tables.iter().map(|(k, v)| (k.as_str(), v)).collect())
        .unwrap_or_default()
}

pub fn vindex_names(vschema: &Value) -> BTreeSet<&str> {
    vschema
        .get("vindexes")
        .and_then(Value::as_object)
        .map(|vindexes| vindexes.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

/// The `type` of a table entry, e.g. `sequence` or `reference`
pub fn table_type(table: &Value) -> Option<&str> {
    table.get("type").and_then(Value::as_str)
}

/// Vindex names used by a table's `column_vindexes`
pub fn column_vindexes(table: &Value) -> Vec<&str> {
    table
        .get("column_vindexes")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("name").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}
