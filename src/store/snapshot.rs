//! Snapshot - one consistent committed state
//!
//! A snapshot never changes once published. Readers hold it through an
//! `Arc` for as long as an evaluation runs; a writer works on a private
//! copy whose tables are cloned lazily on first mutation.

use std::collections::HashSet;
use std::sync::Arc;

use super::table::Table;
use super::value::{RowId, Value};
use crate::errors::{DbError, DbResult};
use crate::schema::{SchemaRegistry, TableId, TableSchema};

/// Immutable committed state of every table
#[derive(Debug, Clone)]
pub struct Snapshot {
    schema: Arc<SchemaRegistry>,
    tables: Vec<Arc<Table>>,
    version: u64,
}

impl Snapshot {
    /// Creates the initial, empty snapshot for a schema
    pub fn empty(schema: Arc<SchemaRegistry>) -> Self {
        let tables = schema
            .tables()
            .map(|(id, _)| Arc::new(Table::new(id)))
            .collect();
        Self {
            schema,
            tables,
            version: 0,
        }
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    /// Commit version this snapshot was published at
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    pub fn table(&self, id: TableId) -> DbResult<&Table> {
        self.tables
            .get(id.index())
            .map(|t| t.as_ref())
            .ok_or_else(|| DbError::invalid_argument(format!("Unknown table id {}", id.index())))
    }

    /// Copy-on-write access for a staged snapshot
    pub(crate) fn table_mut(&mut self, id: TableId) -> DbResult<&mut Table> {
        self.tables
            .get_mut(id.index())
            .map(Arc::make_mut)
            .ok_or_else(|| DbError::invalid_argument(format!("Unknown table id {}", id.index())))
    }

    /// Schema and rows of one table together
    pub fn table_with_schema(&self, id: TableId) -> DbResult<(&TableSchema, &Table)> {
        Ok((self.schema.table(id)?, self.table(id)?))
    }

    /// Checks that a handle created at `epoch` still points at a live row
    pub fn live_row(&self, id: TableId, epoch: u64, row: RowId) -> DbResult<&[Value]> {
        let table = self.table(id)?;
        let name = &self.schema.table(id)?.name;
        if table.epoch() != epoch {
            return Err(DbError::invalid_state(format!(
                "Table '{}' was cleared after this handle was obtained",
                name
            )));
        }
        table.cells(row).ok_or_else(|| {
            DbError::invalid_state(format!("Row {} of '{}' has been deleted", row, name))
        })
    }

    /// Removes rows from a table and clears every link that pointed at them
    pub(crate) fn delete_rows(&mut self, id: TableId, rows: &[RowId]) -> DbResult<usize> {
        let table = self.table_mut(id)?;
        let removed: Vec<RowId> = rows.iter().copied().filter(|r| table.remove(*r)).collect();
        self.unlink_all(id, &removed)?;
        Ok(removed.len())
    }

    /// Removes every row of a table, invalidating outstanding handles
    pub(crate) fn clear_table(&mut self, id: TableId) -> DbResult<usize> {
        let rows: Vec<RowId> = self.table(id)?.row_ids().collect();
        let removed = self.table_mut(id)?.clear();
        self.unlink_all(id, &rows)?;
        Ok(removed)
    }

    fn unlink_all(&mut self, target: TableId, removed: &[RowId]) -> DbResult<()> {
        if removed.is_empty() {
            return Ok(());
        }
        let removed: HashSet<RowId> = removed.iter().copied().collect();
        let schema = Arc::clone(&self.schema);
        let target_name = schema.table(target)?.name.as_str();
        for (source, table_schema) in schema.tables() {
            let columns: Vec<usize> = table_schema
                .columns
                .iter()
                .enumerate()
                .filter(|(_, c)| c.target.as_deref() == Some(target_name))
                .map(|(i, _)| i)
                .collect();
            if !columns.is_empty() {
                self.table_mut(source)?.unlink(&columns, &removed);
            }
        }
        Ok(())
    }
}
