//! Checked row accessor
//!
//! Re-validates column existence and declared type on every call. This is
//! the view handed out wherever field references come from outside the
//! crate (dynamic objects, externally supplied names).

use super::access::{RowAccess, RowAccessMut};
use crate::errors::{DbError, DbResult};
use crate::schema::{ColumnType, TableSchema};
use crate::store::{RowId, Value};

/// Row view that validates every access against the schema
#[derive(Debug)]
pub struct CheckedRow<'a, C = &'a [Value]> {
    schema: &'a TableSchema,
    row_id: RowId,
    cells: C,
}

impl<'a, C: AsRef<[Value]>> CheckedRow<'a, C> {
    pub fn new(schema: &'a TableSchema, row_id: RowId, cells: C) -> Self {
        Self {
            schema,
            row_id,
            cells,
        }
    }
}

impl<'a, C: AsRef<[Value]>> RowAccess for CheckedRow<'a, C> {
    fn schema(&self) -> &TableSchema {
        self.schema
    }

    fn row_id(&self) -> RowId {
        self.row_id
    }

    fn check(&self, column: usize, expected: ColumnType) -> DbResult<()> {
        let def = self.schema.column_at(column).ok_or_else(|| {
            DbError::invalid_argument(format!(
                "Column index {} out of range for '{}'",
                column, self.schema.name
            ))
        })?;
        if def.column_type != expected {
            return Err(DbError::type_mismatch(
                def.name.as_str(),
                format!(
                    "declared as {} but accessed as {}",
                    def.column_type.type_name(),
                    expected.type_name()
                ),
            ));
        }
        Ok(())
    }

    fn value(&self, column: usize) -> DbResult<&Value> {
        self.cells.as_ref().get(column).ok_or_else(|| {
            DbError::invalid_argument(format!(
                "Column index {} out of range for '{}'",
                column, self.schema.name
            ))
        })
    }
}

impl<'a, C: AsRef<[Value]> + AsMut<[Value]>> RowAccessMut for CheckedRow<'a, C> {
    fn value_mut(&mut self, column: usize) -> DbResult<&mut Value> {
        let name = &self.schema.name;
        self.cells.as_mut().get_mut(column).ok_or_else(|| {
            DbError::invalid_argument(format!(
                "Column index {} out of range for '{}'",
                column, name
            ))
        })
    }
}
