//! Result sets
//!
//! An ordered, de-duplicated sequence of row-ids produced by one evaluation
//! pass. Membership never changes after materialization; re-sorting yields
//! a new result set with the same members.

use super::builder::Query;
use super::evaluator::RowSource;
use super::sorter::{SortDescriptor, SortDirection};
use crate::errors::{DbError, DbResult};
use crate::object::Object;
use crate::schema::TableId;
use crate::store::{Database, RowId, WriteTransaction};

/// Materialized query result
#[derive(Debug, Clone)]
pub struct Results {
    db: Database,
    table: TableId,
    epoch: u64,
    rows: Vec<RowId>,
}

impl Results {
    pub(crate) fn new(db: Database, table: TableId, epoch: u64, rows: Vec<RowId>) -> Self {
        Self {
            db,
            table,
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

    pub fn table_id(&self) -> TableId {
        self.table
    }

    /// Member row-ids in result order
    pub fn row_ids(&self) -> &[RowId] {
        &self.rows
    }

    /// Object at `index`.
    ///
    /// InvalidArgument when out of range, InvalidState when the table was
    /// cleared after these results were produced.
    pub fn get(&self, index: usize) -> DbResult<Object> {
        self.check_epoch()?;
        let row = self.rows.get(index).copied().ok_or_else(|| {
            DbError::invalid_argument(format!(
                "Index {} out of range for {} results",
                index,
                self.rows.len()
            ))
        })?;
        Ok(self.object(row))
    }

    pub fn first(&self) -> DbResult<Option<Object>> {
        self.check_epoch()?;
        Ok(self.rows.first().map(|row| self.object(*row)))
    }

    pub fn last(&self) -> DbResult<Option<Object>> {
        self.check_epoch()?;
        Ok(self.rows.last().map(|row| self.object(*row)))
    }

    /// Objects in result order
    pub fn iter(&self) -> impl Iterator<Item = Object> + '_ {
        self.rows.iter().map(|row| self.object(*row))
    }

    /// Ascending sort on one field
    pub fn sort(&self, field: &str) -> DbResult<Results> {
        self.sort_by(field, SortDirection::Asc)
    }

    pub fn sort_by(&self, field: &str, direction: SortDirection) -> DbResult<Results> {
        self.sort_multi(Some(&[field]), Some(&[direction]))
    }

    /// Multi-key sort; the result keeps exactly these members
    pub fn sort_multi(
        &self,
        fields: Option<&[&str]>,
        directions: Option<&[SortDirection]>,
    ) -> DbResult<Results> {
        let descriptor = SortDescriptor::build(
            self.db.schema(),
            self.table,
            fields,
            directions,
            self.db.config().max_sort_keys,
        )?;
        self.check_epoch()?;
        let snapshot = self.db.snapshot()?;
        let mut rows = self.rows.clone();
        descriptor.sort(&*snapshot, &mut rows)?;
        self.db.metrics().increment_sorts();
        Ok(Results::new(self.db.clone(), self.table, self.epoch, rows))
    }

    /// Sub-query over exactly these rows, frozen at this call
    pub fn where_(&self) -> DbResult<Query> {
        self.check_epoch()?;
        Ok(Query::scoped(self.db.clone(), self.table, self.epoch, &self.rows))
    }

    /// Deletes every member row inside `txn`, returning how many were removed
    pub fn clear(&self, txn: &mut WriteTransaction<'_>) -> DbResult<usize> {
        if txn.database().id() != self.db.id() {
            return Err(DbError::invalid_argument(
                "Results belong to a different database",
            ));
        }
        txn.delete_rows(self.table, self.epoch, &self.rows)
    }

    fn object(&self, row: RowId) -> Object {
        Object::new(self.db.clone(), self.table, row, self.epoch)
    }

    fn check_epoch(&self) -> DbResult<()> {
        let snapshot = self.db.snapshot()?;
        if snapshot.table(self.table)?.epoch() != self.epoch {
            let name = snapshot.table_schema(self.table)?.name.clone();
            return Err(DbError::invalid_state(format!(
                "Table '{}' was cleared after these results were produced",
                name
            )));
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Results {
    type Item = Object;
    type IntoIter = Box<dyn Iterator<Item = Object> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
