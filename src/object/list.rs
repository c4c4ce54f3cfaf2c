//! Link list view
//!
//! An ordered snapshot of the row-ids held by one link list column. Reads
//! resolve against the current committed state; edits go through
//! `ObjectMut::link_list`.

use super::object::Object;
use crate::errors::{DbError, DbResult};
use crate::query::Query;
use crate::schema::TableId;
use crate::store::{Database, RowId};

/// Objects referenced by a link list, in list order
#[derive(Debug, Clone)]
pub struct List {
    db: Database,
    target: TableId,
    epoch: u64,
    rows: Vec<RowId>,
}

impl List {
    pub(crate) fn new(db: Database, target: TableId, epoch: u64, rows: Vec<RowId>) -> Self {
        Self {
            db,
            target,
            epoch,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Table the list links to
    pub fn target_table(&self) -> TableId {
        self.target
    }

    pub fn row_ids(&self) -> &[RowId] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> DbResult<Object> {
        let row = self.rows.get(index).copied().ok_or_else(|| {
            DbError::invalid_argument(format!(
                "Index {} out of range for list of {}",
                index,
                self.rows.len()
            ))
        })?;
        Ok(Object::new(self.db.clone(), self.target, row, self.epoch))
    }

    pub fn iter(&self) -> impl Iterator<Item = Object> + '_ {
        self.rows
            .iter()
            .map(|row| Object::new(self.db.clone(), self.target, *row, self.epoch))
    }

    /// Sub-query over the linked rows, in list order
    pub fn where_(&self) -> DbResult<Query> {
        let current = self.db.snapshot()?.table(self.target)?.epoch();
        if current != self.epoch {
            return Err(DbError::invalid_state(
                "Link target table was cleared after this list was read",
            ));
        }
        Ok(Query::scoped(self.db.clone(), self.target, self.epoch, &self.rows))
    }
}
