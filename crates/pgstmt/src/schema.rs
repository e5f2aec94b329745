//! Schema descriptions for optional statement checks.
//!
//! Table descriptions are produced elsewhere (hand-written or generated from the
//! database) and can be loaded from JSON.

use crate::error::{StmtError, StmtResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Columns and constraint names of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default = "default_schema")]
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub columns: Vec<String>,
    /// Primary key / unique constraint names usable with `ON CONFLICT ON CONSTRAINT`.
    #[serde(default)]
    pub constraints: Vec<String>,
}

fn default_schema() -> String {
    "public".to_string()
}

impl TableSchema {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            columns: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn with_columns(mut self, columns: &[&str]) -> Self {
        self.columns.extend(columns.iter().map(|c| c.to_string()));
        self
    }

    pub fn with_constraint(mut self, name: &str) -> Self {
        self.constraints.push(name.to_string());
        self
    }

    /// `table.column` matches on the column part.
    pub fn has_column(&self, column: &str) -> bool {
        let name = column.rsplit('.').next().unwrap_or(column);
        self.columns.iter().any(|c| c == name)
    }

    pub fn has_constraint(&self, name: &str) -> bool {
        self.constraints.iter().any(|c| c == name)
    }

    pub fn require_column(&self, column: &str) -> StmtResult<()> {
        if self.has_column(column) {
            return Ok(());
        }
        Err(StmtError::validation(format!(
            "column '{column}' does not exist on {}.{}",
            self.schema, self.name
        )))
    }

    pub fn require_constraint(&self, name: &str) -> StmtResult<()> {
        if self.has_constraint(name) {
            return Ok(());
        }
        Err(StmtError::validation(format!(
            "constraint '{name}' does not exist on {}.{}",
            self.schema, self.name
        )))
    }
}

/// Registered tables, keyed by `schema.name`.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: HashMap<String, TableSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON array of table descriptions.
    pub fn from_json(json: &str) -> StmtResult<Self> {
        let tables: Vec<TableSchema> = serde_json::from_str(json)
            .map_err(|e| StmtError::validation(format!("invalid schema description: {e}")))?;
        let mut registry = Self::new();
        for table in tables {
            registry.register_table(table);
        }
        Ok(registry)
    }

    pub fn register_table(&mut self, table: TableSchema) {
        let key = format!("{}.{}", table.schema, table.name);
        self.tables.insert(key, table);
    }

    /// Look up `name` (searched in `public`) or `schema.name`.
    pub fn get_table(&self, table: &str) -> Option<&TableSchema> {
        if table.contains('.') {
            self.tables.get(table)
        } else {
            self.tables.get(&format!("public.{table}"))
        }
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
