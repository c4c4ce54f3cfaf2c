//! Write transaction
//!
//! Mutations are applied to a private staged snapshot. `commit` publishes
//! it atomically; `rollback`, or dropping the transaction, discards it.
//! Readers never observe a partially applied transaction.

use super::database::{Database, WriterGuard};
use super::snapshot::Snapshot;
use super::value::RowId;
use crate::errors::{DbError, DbResult};
use crate::object::{Object, ObjectMut};
use crate::observability::Severity;
use crate::schema::TableId;

/// The single active write transaction of a database
#[derive(Debug)]
pub struct WriteTransaction<'db> {
    db: &'db Database,
    _writer: WriterGuard<'db>,
    staged: Snapshot,
    finished: bool,
}

impl<'db> WriteTransaction<'db> {
    pub(crate) fn new(db: &'db Database, writer: WriterGuard<'db>, staged: Snapshot) -> Self {
        Self {
            db,
            _writer: writer,
            staged,
            finished: false,
        }
    }

    pub fn database(&self) -> &Database {
        self.db
    }

    /// Appends a row with default values to `table`
    pub fn create_object(&mut self, table: &str) -> DbResult<ObjectMut<'_>> {
        let schema = self.db.schema_arc();
        let id = schema.resolve_table(table)?;
        let row = self.staged.table_mut(id)?.insert_default(schema.table(id)?);
        Ok(ObjectMut::new(self.db, schema, &mut self.staged, id, row))
    }

    /// Opens an existing object for modification
    pub fn edit(&mut self, object: &Object) -> DbResult<ObjectMut<'_>> {
        self.check_owned(object)?;
        self.staged
            .live_row(object.table_id(), object.epoch(), object.row_id())?;
        Ok(ObjectMut::new(
            self.db,
            self.db.schema_arc(),
            &mut self.staged,
            object.table_id(),
            object.row_id(),
        ))
    }

    /// Deletes one object; links pointing at it are cleared
    pub fn delete(&mut self, object: &Object) -> DbResult<()> {
        self.check_owned(object)?;
        self.staged
            .live_row(object.table_id(), object.epoch(), object.row_id())?;
        self.staged
            .delete_rows(object.table_id(), &[object.row_id()])?;
        Ok(())
    }

    /// Deletes rows of a table, skipping ids that are already gone
    pub(crate) fn delete_rows(&mut self, table: TableId, epoch: u64, rows: &[RowId]) -> DbResult<usize> {
        if self.staged.table(table)?.epoch() != epoch {
            return Err(DbError::invalid_state(
                "Table was cleared after these rows were obtained",
            ));
        }
        self.staged.delete_rows(table, rows)
    }

    /// Removes every row of `table`; outstanding handles become invalid
    pub fn clear(&mut self, table: &str) -> DbResult<usize> {
        let id = self.db.schema().resolve_table(table)?;
        self.staged.clear_table(id)
    }

    /// Publishes the staged state, returning the new snapshot version
    pub fn commit(mut self) -> DbResult<u64> {
        self.finished = true;
        let staged = std::mem::replace(&mut self.staged, Snapshot::empty(self.db.schema_arc()));
        let version = self.db.publish(staged)?;
        self.db.metrics().increment_commits();
        let version_str = version.to_string();
        self.db.log(
            Severity::Trace,
            "TRANSACTION_COMMIT",
            &[("database", self.db.name()), ("version", &version_str)],
        );
        Ok(version)
    }

    /// Discards every staged change
    pub fn rollback(mut self) {
        self.finish_rollback();
    }

    fn finish_rollback(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.db.metrics().increment_rollbacks();
        self.db.log(
            Severity::Trace,
            "TRANSACTION_ROLLBACK",
            &[("database", self.db.name())],
        );
    }

    fn check_owned(&self, object: &Object) -> DbResult<()> {
        if !self.db.same_instance(object.database_id()) {
            return Err(DbError::invalid_argument(
                "Object belongs to a different database",
            ));
        }
        Ok(())
    }
}

impl Drop for WriteTransaction<'_> {
    fn drop(&mut self) {
        self.finish_rollback();
    }
}

#[cfg(test)]
mod tests {
    use crate::config::DatabaseConfig;
    use crate::schema::{ColumnType, SchemaRegistry, TableSchema};
    use crate::store::Database;

    fn open() -> Database {
        let schema = SchemaRegistry::new()
            .with_table(TableSchema::new("Dog").column("name", ColumnType::String))
            .unwrap();
        Database::open(DatabaseConfig::default(), schema).unwrap()
    }

    #[test]
    fn test_rollback_discards_changes() {
        let db = open();
        let mut txn = db.begin_write().unwrap();
        txn.create_object("Dog").unwrap();
        txn.rollback();

        assert_eq!(db.all_objects("Dog").unwrap().len(), 0);
        assert_eq!(db.metrics().snapshot().rollbacks, 1);
    }

    #[test]
    fn test_drop_rolls_back() {
        let db = open();
        {
            let mut txn = db.begin_write().unwrap();
            txn.create_object("Dog").unwrap();
        }
        assert_eq!(db.all_objects("Dog").unwrap().len(), 0);
    }

    #[test]
    fn test_readers_do_not_see_staged_rows() {
        let db = open();
        let mut txn = db.begin_write().unwrap();
        txn.create_object("Dog").unwrap();
        assert_eq!(db.all_objects("Dog").unwrap().len(), 0);
        txn.commit().unwrap();
        assert_eq!(db.all_objects("Dog").unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_table_rejected() {
        let db = open();
        let mut txn = db.begin_write().unwrap();
        assert!(txn.create_object("Cat").unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_clear_counts_rows() {
        let db = open();
        let mut txn = db.begin_write().unwrap();
        txn.create_object("Dog").unwrap();
        txn.create_object("Dog").unwrap();
        assert_eq!(txn.clear("Dog").unwrap(), 2);
        txn.commit().unwrap();
        assert!(db.all_objects("Dog").unwrap().is_empty());
    }
}
