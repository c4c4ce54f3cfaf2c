//! Unchecked row accessor
//!
//! Used on internal paths where the column index and its type were already
//! verified (query evaluation, sorting). `check` is a no-op; a cell of the
//! wrong variant still surfaces as an error rather than a bogus value.

use super::access::{RowAccess, RowAccessMut};
use crate::errors::{DbError, DbResult};
use crate::schema::{ColumnType, TableSchema};
use crate::store::{RowId, Value};

/// Row view that trusts its caller's column indexes
#[derive(Debug)]
pub struct UncheckedRow<'a, C = &'a [Value]> {
    schema: &'a TableSchema,
    row_id: RowId,
    cells: C,
}

impl<'a, C: AsRef<[Value]>> UncheckedRow<'a, C> {
    pub fn new(schema: &'a TableSchema, row_id: RowId, cells: C) -> Self {
        Self {
            schema,
            row_id,
            cells,
        }
    }
}

impl<'a, C: AsRef<[Value]>> RowAccess for UncheckedRow<'a, C> {
    fn schema(&self) -> &TableSchema {
        self.schema
    }

    fn row_id(&self) -> RowId {
        self.row_id
    }

    #[inline]
    fn check(&self, _column: usize, _expected: ColumnType) -> DbResult<()> {
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

impl<'a, C: AsRef<[Value]> + AsMut<[Value]>> RowAccessMut for UncheckedRow<'a, C> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    fn schema() -> TableSchema {
        TableSchema::new("AllTypes")
            .column("columnLong", ColumnType::Int)
            .column("columnFloat", ColumnType::Float)
    }

    #[test]
    fn test_typed_reads() {
        let schema = schema();
        let cells = vec![Value::Int(7), Value::Float(1.5)];
        let row = UncheckedRow::new(&schema, RowId(0), cells.as_slice());
        assert_eq!(row.get_long(0).unwrap(), 7);
        assert_eq!(row.get_float(1).unwrap(), 1.5);
    }

    #[test]
    fn test_wrong_variant_is_error_not_garbage() {
        let schema = schema();
        let cells = vec![Value::Int(7), Value::Float(1.5)];
        let row = UncheckedRow::new(&schema, RowId(0), cells.as_slice());
        assert!(row.get_float(0).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_write_through_mutable_cells() {
        let schema = schema();
        let mut cells = vec![Value::Int(7), Value::Float(1.5)];
        let mut row = UncheckedRow::new(&schema, RowId(0), cells.as_mut_slice());
        row.set_long(0, 42).unwrap();
        assert_eq!(cells[0], Value::Int(42));
    }
}
