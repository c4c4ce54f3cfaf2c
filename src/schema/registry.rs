//! Schema registry: the single source of truth for name → index → type
//!
//! A registry is built once, validated, and handed to the database at open
//! time. There is no process-wide schema state.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::types::{ColumnType, TableSchema};
use crate::errors::{DbError, DbResult};

/// Position of a table inside its registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(usize);

impl TableId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Serialized shape of a registry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaDocument {
    tables: Vec<TableSchema>,
}

/// Registry of every table schema known to a database
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SchemaDocument", into = "SchemaDocument")]
pub struct SchemaRegistry {
    tables: Vec<TableSchema>,
    by_name: HashMap<String, TableId>,
}

impl From<SchemaRegistry> for SchemaDocument {
    fn from(registry: SchemaRegistry) -> Self {
        SchemaDocument {
            tables: registry.tables,
        }
    }
}

impl TryFrom<SchemaDocument> for SchemaRegistry {
    type Error = DbError;

    fn try_from(doc: SchemaDocument) -> DbResult<Self> {
        let mut registry = SchemaRegistry::new();
        for table in doc.tables {
            registry.register(table)?;
        }
        registry.validate()?;
        Ok(registry)
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration
    pub fn with_table(mut self, table: TableSchema) -> DbResult<Self> {
        self.register(table)?;
        Ok(self)
    }

    /// Registers a table schema.
    ///
    /// Link targets are checked by [`SchemaRegistry::validate`], so tables
    /// may be registered in any order.
    pub fn register(&mut self, table: TableSchema) -> DbResult<TableId> {
        table
            .validate_structure()
            .map_err(DbError::invalid_argument)?;

        if self.by_name.contains_key(&table.name) {
            return Err(DbError::invalid_argument(format!(
                "Table '{}' is already registered",
                table.name
            )));
        }

        let id = TableId(self.tables.len());
        self.by_name.insert(table.name.clone(), id);
        self.tables.push(table);
        Ok(id)
    }

    /// Checks cross-table references
    pub fn validate(&self) -> DbResult<()> {
        for table in &self.tables {
            for column in &table.columns {
                if let Some(target) = &column.target {
                    if !self.by_name.contains_key(target) {
                        return Err(DbError::invalid_argument(format!(
                            "Column '{}' of '{}' links to unknown table '{}'",
                            column.name, table.name, target
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Parse and validate a registry from a JSON document
    pub fn from_json_str(json: &str) -> DbResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| DbError::invalid_argument(format!("Invalid schema JSON: {}", e)))
    }

    /// Load a registry from a JSON file
    pub fn load(path: &Path) -> DbResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DbError::invalid_argument(format!(
                "Failed to read schema file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&content)
    }

    /// Resolves a table name
    pub fn resolve_table(&self, name: &str) -> DbResult<TableId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| DbError::invalid_argument(format!("Table '{}' does not exist", name)))
    }

    /// Returns the schema of a table.
    ///
    /// Ids only come from this registry, so an out of range id is a handle
    /// from another database.
    pub fn table(&self, id: TableId) -> DbResult<&TableSchema> {
        self.tables.get(id.0).ok_or_else(|| {
            DbError::invalid_argument(format!("Table id {} is not part of this schema", id.0))
        })
    }

    /// Resolves a field name to a column index, naming field and table on failure
    pub fn resolve_column(&self, table: TableId, field: &str) -> DbResult<usize> {
        let schema = self.table(table)?;
        schema
            .column_index(field)
            .ok_or_else(|| DbError::unknown_field(field, &schema.name))
    }

    /// Declared type of a column
    pub fn column_type(&self, table: TableId, column: usize) -> DbResult<ColumnType> {
        let schema = self.table(table)?;
        schema
            .column_at(column)
            .map(|c| c.column_type)
            .ok_or_else(|| {
                DbError::invalid_argument(format!(
                    "Column index {} out of range for '{}'",
                    column, schema.name
                ))
            })
    }

    /// Target table of a link or link list column
    pub fn link_target(&self, table: TableId, column: usize) -> DbResult<TableId> {
        let schema = self.table(table)?;
        let def = schema.column_at(column).ok_or_else(|| {
            DbError::invalid_argument(format!(
                "Column index {} out of range for '{}'",
                column, schema.name
            ))
        })?;
        match &def.target {
            Some(target) => self.resolve_table(target),
            None => Err(DbError::type_mismatch(
                def.name.as_str(),
                format!("{} column does not link to a table", def.column_type.type_name()),
            )),
        }
    }

    /// Iterates over (id, schema) pairs in registration order
    pub fn tables(&self) -> impl Iterator<Item = (TableId, &TableSchema)> {
        self.tables.iter().enumerate().map(|(i, t)| (TableId(i), t))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
