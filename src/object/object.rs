//! Dynamic object handle
//!
//! Schema-less access to one committed row by field name. Every call goes
//! through a `CheckedRow` over the current snapshot, so unknown fields,
//! mismatched accessor types and invalidated rows are all reported rather
//! than read as stale data.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::list::List;
use crate::errors::DbResult;
use crate::row::{CheckedRow, RowAccess};
use crate::schema::{ColumnType, TableId};
use crate::store::{Database, RowId, Value};

/// Handle to one row of a table
#[derive(Debug, Clone)]
pub struct Object {
    db: Database,
    table: TableId,
    row: RowId,
    epoch: u64,
}

impl Object {
    pub(crate) fn new(db: Database, table: TableId, row: RowId, epoch: u64) -> Self {
        Self {
            db,
            table,
            row,
            epoch,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub(crate) fn database_id(&self) -> Uuid {
        self.db.id()
    }

    pub fn table_id(&self) -> TableId {
        self.table
    }

    pub fn row_id(&self) -> RowId {
        self.row
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn table_name(&self) -> &str {
        self.db
            .schema()
            .table(self.table)
            .map(|t| t.name.as_str())
            .unwrap_or_default()
    }

    /// True while the row exists and its table was not cleared
    pub fn is_valid(&self) -> bool {
        self.with_row(|_| Ok(())).is_ok()
    }

    /// Field names in schema order
    pub fn field_names(&self) -> Vec<String> {
        self.db
            .schema()
            .table(self.table)
            .map(|t| t.field_names())
            .unwrap_or_default()
    }

    /// An empty name is never a field
    pub fn has_field(&self, field: &str) -> bool {
        !field.is_empty()
            && self
                .db
                .schema()
                .table(self.table)
                .map(|t| t.column_index(field).is_some())
                .unwrap_or(false)
    }

    /// Whether a link column is null; any other column type is rejected
    pub fn is_null(&self, field: &str) -> DbResult<bool> {
        self.with_row(|row| row.is_null_link(row.column_index(field)?))
    }

    pub fn get_boolean(&self, field: &str) -> DbResult<bool> {
        self.with_row(|row| row.get_bool(row.column_index(field)?))
    }

    /// Narrowing read of an int column
    pub fn get_short(&self, field: &str) -> DbResult<i16> {
        Ok(self.get_long(field)? as i16)
    }

    /// Narrowing read of an int column
    pub fn get_int(&self, field: &str) -> DbResult<i32> {
        Ok(self.get_long(field)? as i32)
    }

    pub fn get_long(&self, field: &str) -> DbResult<i64> {
        self.with_row(|row| row.get_long(row.column_index(field)?))
    }

    pub fn get_float(&self, field: &str) -> DbResult<f32> {
        self.with_row(|row| row.get_float(row.column_index(field)?))
    }

    pub fn get_double(&self, field: &str) -> DbResult<f64> {
        self.with_row(|row| row.get_double(row.column_index(field)?))
    }

    pub fn get_string(&self, field: &str) -> DbResult<String> {
        self.with_row(|row| Ok(row.get_string(row.column_index(field)?)?.to_string()))
    }

    pub fn get_bytes(&self, field: &str) -> DbResult<Vec<u8>> {
        self.with_row(|row| Ok(row.get_binary(row.column_index(field)?)?.to_vec()))
    }

    pub fn get_date(&self, field: &str) -> DbResult<DateTime<Utc>> {
        self.with_row(|row| row.get_date(row.column_index(field)?))
    }

    /// Linked object, `None` for a null link
    pub fn get_object(&self, field: &str) -> DbResult<Option<Object>> {
        let snapshot = self.db.snapshot()?;
        let (schema, _) = snapshot.table_with_schema(self.table)?;
        let cells = snapshot.live_row(self.table, self.epoch, self.row)?;
        let row = CheckedRow::new(schema, self.row, cells);
        let column = row.column_index(field)?;
        let target_row = match row.get_link(column)? {
            Some(id) => id,
            None => return Ok(None),
        };
        let target = snapshot.schema().link_target(self.table, column)?;
        let epoch = snapshot.table(target)?.epoch();
        Ok(Some(Object::new(self.db.clone(), target, target_row, epoch)))
    }

    /// Snapshot of a link list column
    pub fn get_list(&self, field: &str) -> DbResult<List> {
        let snapshot = self.db.snapshot()?;
        let (schema, _) = snapshot.table_with_schema(self.table)?;
        let cells = snapshot.live_row(self.table, self.epoch, self.row)?;
        let row = CheckedRow::new(schema, self.row, cells);
        let column = row.column_index(field)?;
        let ids = row.get_link_list(column)?.to_vec();
        let target = snapshot.schema().link_target(self.table, column)?;
        let epoch = snapshot.table(target)?.epoch();
        Ok(List::new(self.db.clone(), target, epoch, ids))
    }

    /// Declared type of a field
    pub fn field_type(&self, field: &str) -> DbResult<ColumnType> {
        let schema = self.db.schema();
        let column = schema.resolve_column(self.table, field)?;
        schema.column_type(self.table, column)
    }

    fn with_row<T>(&self, f: impl FnOnce(&CheckedRow<'_>) -> DbResult<T>) -> DbResult<T> {
        let snapshot = self.db.snapshot()?;
        let (schema, _) = snapshot.table_with_schema(self.table)?;
        let cells = snapshot.live_row(self.table, self.epoch, self.row)?;
        let row = CheckedRow::new(schema, self.row, cells);
        f(&row)
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.db.id() == other.db.id() && self.table == other.table && self.row == other.row
    }
}

impl Eq for Object {}

impl Hash for Object {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.db.id().hash(state);
        self.table.hash(state);
        self.row.hash(state);
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = match self.db.snapshot() {
            Ok(s) => s,
            Err(_) => return write!(f, "{} = invalid", self.table_name()),
        };
        let (schema, cells) = match (
            snapshot.schema().table(self.table),
            snapshot.live_row(self.table, self.epoch, self.row),
        ) {
            (Ok(schema), Ok(cells)) => (schema, cells),
            _ => return write!(f, "{} = invalid", self.table_name()),
        };

        write!(f, "{} = [", schema.name)?;
        for (i, (def, value)) in schema.columns.iter().zip(cells).enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            let target = def.target.as_deref().unwrap_or_default();
            match value {
                Value::Link(Some(_)) => write!(f, "{{{}:{}}}", def.name, target)?,
                Value::LinkList(ids) => write!(f, "{{{}:List<{}>[{}]}}", def.name, target, ids.len())?,
                other => write!(f, "{{{}:{}}}", def.name, other)?,
            }
        }
        write!(f, "]")
    }
}
