//! Row access interface
//!
//! Typed getters and setters are provided on top of two primitives:
//! `value`/`value_mut` to reach a cell and `check` to validate a column
//! before touching it. Implementations differ only in what `check` does.

use chrono::{DateTime, Utc};

use crate::errors::{DbError, DbResult};
use crate::schema::{ColumnType, TableSchema};
use crate::store::{RowId, Value};

/// Read access to one row
pub trait RowAccess {
    /// Schema of the table the row belongs to
    fn schema(&self) -> &TableSchema;

    fn row_id(&self) -> RowId;

    /// Validates that `column` exists and is declared as `expected`
    fn check(&self, column: usize, expected: ColumnType) -> DbResult<()>;

    /// Raw cell at `column`
    fn value(&self, column: usize) -> DbResult<&Value>;

    /// Resolves a field name; always validated regardless of implementation
    fn column_index(&self, field: &str) -> DbResult<usize> {
        let schema = self.schema();
        schema
            .column_index(field)
            .ok_or_else(|| DbError::unknown_field(field, &schema.name))
    }

    fn column_count(&self) -> usize {
        self.schema().column_count()
    }

    fn column_name(&self, column: usize) -> Option<&str> {
        self.schema().column_at(column).map(|c| c.name.as_str())
    }

    fn has_field(&self, field: &str) -> bool {
        self.schema().column_index(field).is_some()
    }

    fn get_bool(&self, column: usize) -> DbResult<bool> {
        self.check(column, ColumnType::Bool)?;
        let value = self.value(column)?;
        value
            .as_bool()
            .ok_or_else(|| mismatch(self.schema(), column, ColumnType::Bool, value))
    }

    fn get_long(&self, column: usize) -> DbResult<i64> {
        self.check(column, ColumnType::Int)?;
        let value = self.value(column)?;
        value
            .as_long()
            .ok_or_else(|| mismatch(self.schema(), column, ColumnType::Int, value))
    }

    fn get_float(&self, column: usize) -> DbResult<f32> {
        self.check(column, ColumnType::Float)?;
        let value = self.value(column)?;
        value
            .as_float()
            .ok_or_else(|| mismatch(self.schema(), column, ColumnType::Float, value))
    }

    fn get_double(&self, column: usize) -> DbResult<f64> {
        self.check(column, ColumnType::Double)?;
        let value = self.value(column)?;
        value
            .as_double()
            .ok_or_else(|| mismatch(self.schema(), column, ColumnType::Double, value))
    }

    fn get_string(&self, column: usize) -> DbResult<&str> {
        self.check(column, ColumnType::String)?;
        let value = self.value(column)?;
        value
            .as_str()
            .ok_or_else(|| mismatch(self.schema(), column, ColumnType::String, value))
    }

    fn get_binary(&self, column: usize) -> DbResult<&[u8]> {
        self.check(column, ColumnType::Binary)?;
        let value = self.value(column)?;
        value
            .as_bytes()
            .ok_or_else(|| mismatch(self.schema(), column, ColumnType::Binary, value))
    }

    fn get_date(&self, column: usize) -> DbResult<DateTime<Utc>> {
        self.check(column, ColumnType::Date)?;
        let value = self.value(column)?;
        value
            .as_date()
            .ok_or_else(|| mismatch(self.schema(), column, ColumnType::Date, value))
    }

    /// Target row of a link, `None` when the link is null
    fn get_link(&self, column: usize) -> DbResult<Option<RowId>> {
        self.check(column, ColumnType::Link)?;
        let value = self.value(column)?;
        value
            .as_link()
            .ok_or_else(|| mismatch(self.schema(), column, ColumnType::Link, value))
    }

    fn get_link_list(&self, column: usize) -> DbResult<&[RowId]> {
        self.check(column, ColumnType::LinkList)?;
        let value = self.value(column)?;
        value
            .as_link_list()
            .ok_or_else(|| mismatch(self.schema(), column, ColumnType::LinkList, value))
    }

    fn is_null_link(&self, column: usize) -> DbResult<bool> {
        Ok(self.get_link(column)?.is_none())
    }
}

/// Write access to one row
pub trait RowAccessMut: RowAccess {
    fn value_mut(&mut self, column: usize) -> DbResult<&mut Value>;

    /// Replaces a cell; the new value must have the column's type
    fn set_value(&mut self, column: usize, value: Value) -> DbResult<()> {
        let expected = value.column_type();
        self.check(column, expected)?;
        let cell = self.value_mut(column)?;
        if cell.column_type() != expected {
            let found = cell.column_type();
            return Err(DbError::invalid_argument(format!(
                "Column {} holds {} values, not {}",
                column,
                found.type_name(),
                expected.type_name()
            )));
        }
        *cell = value;
        Ok(())
    }

    fn set_bool(&mut self, column: usize, value: bool) -> DbResult<()> {
        self.set_value(column, Value::Bool(value))
    }

    fn set_long(&mut self, column: usize, value: i64) -> DbResult<()> {
        self.set_value(column, Value::Int(value))
    }

    fn set_float(&mut self, column: usize, value: f32) -> DbResult<()> {
        self.set_value(column, Value::Float(value))
    }

    fn set_double(&mut self, column: usize, value: f64) -> DbResult<()> {
        self.set_value(column, Value::Double(value))
    }

    fn set_string(&mut self, column: usize, value: &str) -> DbResult<()> {
        self.set_value(column, Value::String(value.to_string()))
    }

    fn set_binary(&mut self, column: usize, value: &[u8]) -> DbResult<()> {
        self.set_value(column, Value::Binary(value.to_vec()))
    }

    fn set_date(&mut self, column: usize, value: DateTime<Utc>) -> DbResult<()> {
        self.set_value(column, Value::Date(value))
    }

    fn set_link(&mut self, column: usize, target: Option<RowId>) -> DbResult<()> {
        self.set_value(column, Value::Link(target))
    }

    /// Mutable link list; edits apply in place
    fn link_list_mut(&mut self, column: usize) -> DbResult<&mut Vec<RowId>> {
        self.check(column, ColumnType::LinkList)?;
        match self.value_mut(column)? {
            Value::LinkList(ids) => Ok(ids),
            other => Err(DbError::invalid_argument(format!(
                "Column {} holds {} values, not linklist",
                column,
                other.column_type().type_name()
            ))),
        }
    }
}

fn mismatch(schema: &TableSchema, column: usize, wanted: ColumnType, found: &Value) -> DbError {
    let name = schema
        .column_at(column)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| column.to_string());
    DbError::type_mismatch(
        name,
        format!(
            "requested {} but the column holds {}",
            wanted.type_name(),
            found.column_type().type_name()
        ),
    )
}
