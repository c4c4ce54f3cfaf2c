//! Table storage
//!
//! Rows are kept in row-id order, which is also creation order. Row-ids
//! increase monotonically and are never handed out twice, not even after
//! `clear`. The epoch advances whenever every existing handle into the
//! table must become invalid.

use std::collections::{BTreeMap, HashSet};

use super::value::{RowId, Value};
use crate::schema::{TableId, TableSchema};

/// Rows of one table
#[derive(Debug, Clone)]
pub struct Table {
    id: TableId,
    rows: BTreeMap<RowId, Vec<Value>>,
    next_row_id: u64,
    epoch: u64,
}

impl Table {
    /// Creates an empty table
    pub fn new(id: TableId) -> Self {
        Self {
            id,
            rows: BTreeMap::new(),
            next_row_id: 0,
            epoch: 0,
        }
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    /// Invalidation counter, bumped by `clear`
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Row-ids in table order
    pub fn row_ids(&self) -> impl Iterator<Item = RowId> + '_ {
        self.rows.keys().copied()
    }

    /// Row-id at a position in table order
    pub fn row_at(&self, index: usize) -> Option<RowId> {
        self.rows.keys().nth(index).copied()
    }

    pub fn contains(&self, row: RowId) -> bool {
        self.rows.contains_key(&row)
    }

    /// All cells of a row, in column order
    pub fn cells(&self, row: RowId) -> Option<&[Value]> {
        self.rows.get(&row).map(|cells| cells.as_slice())
    }

    pub fn cells_mut(&mut self, row: RowId) -> Option<&mut [Value]> {
        self.rows.get_mut(&row).map(|cells| cells.as_mut_slice())
    }

    pub fn cell(&self, row: RowId, column: usize) -> Option<&Value> {
        self.rows.get(&row).and_then(|cells| cells.get(column))
    }

    /// Appends a row holding per-type defaults
    pub fn insert_default(&mut self, schema: &TableSchema) -> RowId {
        let id = RowId(self.next_row_id);
        self.next_row_id += 1;
        let cells = schema
            .columns
            .iter()
            .map(|c| Value::default_for(c.column_type))
            .collect();
        self.rows.insert(id, cells);
        id
    }

    /// Removes a row, returning whether it existed
    pub fn remove(&mut self, row: RowId) -> bool {
        self.rows.remove(&row).is_some()
    }

    /// Removes every row and invalidates all outstanding handles
    pub fn clear(&mut self) -> usize {
        let removed = self.rows.len();
        self.rows.clear();
        self.epoch += 1;
        removed
    }

    /// Drops references to removed rows from the given link columns
    pub fn unlink(&mut self, columns: &[usize], removed: &HashSet<RowId>) {
        if removed.is_empty() {
            return;
        }
        for cells in self.rows.values_mut() {
            for &column in columns {
                match cells.get_mut(column) {
                    Some(Value::Link(link)) => {
                        if link.map_or(false, |id| removed.contains(&id)) {
                            *link = None;
                        }
                    }
                    Some(Value::LinkList(ids)) => ids.retain(|id| !removed.contains(id)),
                    _ => {}
                }
            }
        }
    }
}
