//! Schema type definitions
//!
//! Supported column types:
//! - bool, int (64-bit signed), float (32-bit), double (64-bit)
//! - string (UTF-8), binary, date (UTC timestamp)
//! - link (nullable reference to one row of a target table)
//! - linklist (ordered references to rows of a target table)

use serde::{Deserialize, Serialize};

/// Declared column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Bool,
    Int,
    Float,
    Double,
    String,
    Binary,
    Date,
    Link,
    LinkList,
}

impl ColumnType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnType::Bool => "bool",
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Double => "double",
            ColumnType::String => "string",
            ColumnType::Binary => "binary",
            ColumnType::Date => "date",
            ColumnType::Link => "link",
            ColumnType::LinkList => "linklist",
        }
    }

    /// Link and link list columns reference another table
    pub fn is_link(&self) -> bool {
        matches!(self, ColumnType::Link | ColumnType::LinkList)
    }

    /// Types with a total order usable by range operators
    pub fn is_ordered(&self) -> bool {
        matches!(
            self,
            ColumnType::Int | ColumnType::Float | ColumnType::Double | ColumnType::Date
        )
    }

    /// Types a sort descriptor may name
    pub fn is_sortable(&self) -> bool {
        self.is_ordered() || matches!(self, ColumnType::Bool | ColumnType::String)
    }
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name, any script, unique within its table
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Whether the column is marked as indexed
    #[serde(default)]
    pub indexed: bool,
    /// Target table name for link and link list columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl ColumnDef {
    /// Create a scalar column
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            indexed: false,
            target: None,
        }
    }

    /// Create a link or link list column pointing at `target`
    pub fn link(name: impl Into<String>, column_type: ColumnType, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type,
            indexed: false,
            target: Some(target.into()),
        }
    }

    /// Mark the column as indexed
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }
}

/// Table definition: an ordered, fixed set of uniquely named columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name
    pub name: String,
    /// Columns in declaration order
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    /// Create a table with no columns
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Adds a scalar column
    pub fn column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push(ColumnDef::new(name, column_type));
        self
    }

    /// Adds an indexed scalar column
    pub fn indexed_column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push(ColumnDef::new(name, column_type).indexed());
        self
    }

    /// Adds a link column
    pub fn link(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.columns
            .push(ColumnDef::link(name, ColumnType::Link, target));
        self
    }

    /// Adds a link list column
    pub fn link_list(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.columns
            .push(ColumnDef::link(name, ColumnType::LinkList, target));
        self
    }

    /// Returns the index of the named column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Returns the column at `index`
    pub fn column_at(&self, index: usize) -> Option<&ColumnDef> {
        self.columns.get(index)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column names in declaration order
    pub fn field_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Validates the table structure itself (not its rows)
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Table name must not be empty".into());
        }

        for (i, column) in self.columns.iter().enumerate() {
            if column.name.is_empty() {
                return Err(format!("Column {} of '{}' has an empty name", i, self.name));
            }
            if self.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(format!(
                    "Column '{}' is declared twice in '{}'",
                    column.name, self.name
                ));
            }
            match (column.column_type.is_link(), &column.target) {
                (true, None) => {
                    return Err(format!("Link column '{}' has no target table", column.name));
                }
                (false, Some(_)) => {
                    return Err(format!(
                        "Column '{}' of type {} cannot have a target table",
                        column.name,
                        column.column_type.type_name()
                    ));
                }
                _ => {}
            }
        }

        Ok(())
    }
}
