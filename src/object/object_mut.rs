//! Mutable object handle
//!
//! Field-name based setters over one row of a write transaction's staged
//! snapshot. Every write is checked against the declared column type;
//! link writes also check the target table and that the target is live.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::object::Object;
use crate::errors::{DbError, DbResult};
use crate::row::{CheckedRow, RowAccess, RowAccessMut};
use crate::schema::{ColumnType, SchemaRegistry, TableId};
use crate::store::{Database, RowId, Snapshot, Value};

/// One row being edited inside a write transaction
#[derive(Debug)]
pub struct ObjectMut<'t> {
    db: &'t Database,
    schema: Arc<SchemaRegistry>,
    staged: &'t mut Snapshot,
    table: TableId,
    row: RowId,
}

impl<'t> ObjectMut<'t> {
    pub(crate) fn new(
        db: &'t Database,
        schema: Arc<SchemaRegistry>,
        staged: &'t mut Snapshot,
        table: TableId,
        row: RowId,
    ) -> Self {
        Self {
            db,
            schema,
            staged,
            table,
            row,
        }
    }

    pub fn row_id(&self) -> RowId {
        self.row
    }

    pub fn table_id(&self) -> TableId {
        self.table
    }

    pub fn table_name(&self) -> &str {
        self.schema
            .table(self.table)
            .map(|t| t.name.as_str())
            .unwrap_or_default()
    }

    /// Handle for this row, usable once the transaction commits
    pub fn to_object(&self) -> DbResult<Object> {
        let epoch = self.staged.table(self.table)?.epoch();
        Ok(Object::new(self.db.clone(), self.table, self.row, epoch))
    }

    pub fn field_names(&self) -> Vec<String> {
        self.schema
            .table(self.table)
            .map(|t| t.field_names())
            .unwrap_or_default()
    }

    pub fn has_field(&self, field: &str) -> bool {
        !field.is_empty() && self.schema.resolve_column(self.table, field).is_ok()
    }

    // =========================================================================
    // Getters over the staged row
    // =========================================================================

    pub fn is_null(&self, field: &str) -> DbResult<bool> {
        let row = self.row()?;
        row.is_null_link(row.column_index(field)?)
    }

    pub fn get_boolean(&self, field: &str) -> DbResult<bool> {
        let row = self.row()?;
        row.get_bool(row.column_index(field)?)
    }

    pub fn get_short(&self, field: &str) -> DbResult<i16> {
        Ok(self.get_long(field)? as i16)
    }

    pub fn get_int(&self, field: &str) -> DbResult<i32> {
        Ok(self.get_long(field)? as i32)
    }

    pub fn get_long(&self, field: &str) -> DbResult<i64> {
        let row = self.row()?;
        row.get_long(row.column_index(field)?)
    }

    pub fn get_float(&self, field: &str) -> DbResult<f32> {
        let row = self.row()?;
        row.get_float(row.column_index(field)?)
    }

    pub fn get_double(&self, field: &str) -> DbResult<f64> {
        let row = self.row()?;
        row.get_double(row.column_index(field)?)
    }

    pub fn get_string(&self, field: &str) -> DbResult<String> {
        let row = self.row()?;
        Ok(row.get_string(row.column_index(field)?)?.to_string())
    }

    pub fn get_bytes(&self, field: &str) -> DbResult<Vec<u8>> {
        let row = self.row()?;
        Ok(row.get_binary(row.column_index(field)?)?.to_vec())
    }

    pub fn get_date(&self, field: &str) -> DbResult<DateTime<Utc>> {
        let row = self.row()?;
        row.get_date(row.column_index(field)?)
    }

    pub fn get_object(&self, field: &str) -> DbResult<Option<Object>> {
        let row = self.row()?;
        let column = row.column_index(field)?;
        let target_row = match row.get_link(column)? {
            Some(id) => id,
            None => return Ok(None),
        };
        let target = self.schema.link_target(self.table, column)?;
        let epoch = self.staged.table(target)?.epoch();
        Ok(Some(Object::new(self.db.clone(), target, target_row, epoch)))
    }

    // =========================================================================
    // Setters
    // =========================================================================

    pub fn set_boolean(&mut self, field: &str, value: bool) -> DbResult<&mut Self> {
        self.set(field, Value::Bool(value))
    }

    pub fn set_short(&mut self, field: &str, value: i16) -> DbResult<&mut Self> {
        self.set(field, Value::from(value))
    }

    pub fn set_int(&mut self, field: &str, value: i32) -> DbResult<&mut Self> {
        self.set(field, Value::from(value))
    }

    pub fn set_long(&mut self, field: &str, value: i64) -> DbResult<&mut Self> {
        self.set(field, Value::Int(value))
    }

    pub fn set_float(&mut self, field: &str, value: f32) -> DbResult<&mut Self> {
        self.set(field, Value::Float(value))
    }

    pub fn set_double(&mut self, field: &str, value: f64) -> DbResult<&mut Self> {
        self.set(field, Value::Double(value))
    }

    pub fn set_string(&mut self, field: &str, value: &str) -> DbResult<&mut Self> {
        self.set(field, Value::from(value))
    }

    pub fn set_binary(&mut self, field: &str, value: &[u8]) -> DbResult<&mut Self> {
        self.set(field, Value::from(value))
    }

    pub fn set_date(&mut self, field: &str, value: DateTime<Utc>) -> DbResult<&mut Self> {
        self.set(field, Value::Date(value))
    }

    /// Points a link column at `target`, or nulls it
    pub fn set_object(&mut self, field: &str, target: Option<&Object>) -> DbResult<&mut Self> {
        let column = self.schema.resolve_column(self.table, field)?;
        let link = match target {
            Some(object) => {
                let table = self.schema.link_target(self.table, column)?;
                Some(self.live_target(field, table, object)?)
            }
            None => None,
        };
        let mut row = self.row_mut()?;
        row.set_link(column, link)?;
        Ok(self)
    }

    /// Replaces the whole content of a link list column
    pub fn set_list(&mut self, field: &str, objects: &[Object]) -> DbResult<&mut Self> {
        let column = self.schema.resolve_column(self.table, field)?;
        let table = self.schema.link_target(self.table, column)?;
        let mut ids = Vec::with_capacity(objects.len());
        for object in objects {
            ids.push(self.live_target(field, table, object)?);
        }
        let mut row = self.row_mut()?;
        *row.link_list_mut(column)? = ids;
        Ok(self)
    }

    /// Editable view of a link list column
    pub fn link_list(&mut self, field: &str) -> DbResult<LinkListMut<'_, 't>> {
        let column = self.schema.resolve_column(self.table, field)?;
        let column_type = self.schema.column_type(self.table, column)?;
        if column_type != ColumnType::LinkList {
            return Err(DbError::type_mismatch(
                field,
                format!("declared as {} but accessed as linklist", column_type.type_name()),
            ));
        }
        let target = self.schema.link_target(self.table, column)?;
        Ok(LinkListMut {
            object: self,
            field: field.to_string(),
            column,
            target,
        })
    }

    fn set(&mut self, field: &str, value: Value) -> DbResult<&mut Self> {
        let mut row = self.row_mut()?;
        let column = row.column_index(field)?;
        row.set_value(column, value)?;
        Ok(self)
    }

    /// Checks that `object` is a live row of `table` in this database
    fn live_target(&self, field: &str, table: TableId, object: &Object) -> DbResult<RowId> {
        if object.database_id() != self.db.id() {
            return Err(DbError::invalid_argument(
                "Object belongs to a different database",
            ));
        }
        if object.table_id() != table {
            return Err(DbError::type_mismatch(
                field,
                format!(
                    "links to '{}', not '{}'",
                    self.schema.table(table)?.name,
                    object.table_name()
                ),
            ));
        }
        self.staged
            .live_row(object.table_id(), object.epoch(), object.row_id())?;
        Ok(object.row_id())
    }

    fn row(&self) -> DbResult<CheckedRow<'_>> {
        let table_schema = self.schema.table(self.table)?;
        let cells = self
            .staged
            .table(self.table)?
            .cells(self.row)
            .ok_or_else(|| self.deleted())?;
        Ok(CheckedRow::new(table_schema, self.row, cells))
    }

    fn row_mut(&mut self) -> DbResult<CheckedRow<'_, &mut [Value]>> {
        let deleted = self.deleted();
        let table_schema = self.schema.table(self.table)?;
        let cells = self
            .staged
            .table_mut(self.table)?
            .cells_mut(self.row)
            .ok_or(deleted)?;
        Ok(CheckedRow::new(table_schema, self.row, cells))
    }

    fn deleted(&self) -> DbError {
        DbError::invalid_state(format!(
            "Row {} of '{}' has been deleted",
            self.row,
            self.table_name()
        ))
    }
}

/// Editable link list of an `ObjectMut`
pub struct LinkListMut<'o, 't> {
    object: &'o mut ObjectMut<'t>,
    field: String,
    column: usize,
    target: TableId,
}

impl LinkListMut<'_, '_> {
    pub fn len(&self) -> DbResult<usize> {
        Ok(self.row_ids()?.len())
    }

    pub fn is_empty(&self) -> DbResult<bool> {
        Ok(self.len()? == 0)
    }

    pub fn row_ids(&self) -> DbResult<Vec<RowId>> {
        let row = self.object.row()?;
        Ok(row.get_link_list(self.column)?.to_vec())
    }

    /// Appends a link to `object`
    pub fn add(&mut self, object: &Object) -> DbResult<()> {
        let id = self.object.live_target(&self.field, self.target, object)?;
        self.edit(|ids| {
            ids.push(id);
            Ok(())
        })
    }

    /// Inserts a link at `index`; `index == len` appends
    pub fn insert(&mut self, index: usize, object: &Object) -> DbResult<()> {
        let id = self.object.live_target(&self.field, self.target, object)?;
        self.edit(|ids| {
            if index > ids.len() {
                return Err(out_of_range(index, ids.len()));
            }
            ids.insert(index, id);
            Ok(())
        })
    }

    /// Removes the link at `index`, returning the row it pointed to
    pub fn remove(&mut self, index: usize) -> DbResult<RowId> {
        self.edit(|ids| {
            if index >= ids.len() {
                return Err(out_of_range(index, ids.len()));
            }
            Ok(ids.remove(index))
        })
    }

    /// Removes every link; the linked rows themselves are untouched
    pub fn clear(&mut self) -> DbResult<()> {
        self.edit(|ids| {
            ids.clear();
            Ok(())
        })
    }

    fn edit<T>(&mut self, f: impl FnOnce(&mut Vec<RowId>) -> DbResult<T>) -> DbResult<T> {
        let column = self.column;
        let mut row = self.object.row_mut()?;
        f(row.link_list_mut(column)?)
    }
}

fn out_of_range(index: usize, len: usize) -> DbError {
    DbError::invalid_argument(format!(
        "Index {} out of range for list of {}",
        index, len
    ))
}
