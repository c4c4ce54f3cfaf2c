//! Sort engine
//!
//! N-key stable sort over a row-id sequence. The first key is primary,
//! later keys break ties, and rows equal on every key keep their input
//! order. Descriptors are validated before any row is touched.

use std::cmp::Ordering;

use super::compare;
use super::evaluator::RowSource;
use crate::errors::{DbError, DbResult};
use crate::schema::{SchemaRegistry, TableId};
use crate::store::RowId;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Maps the boolean flag form (`true` is ascending)
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        }
    }
}

/// One resolved sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub column: usize,
    pub direction: SortDirection,
}

/// Validated, ordered sort keys for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortDescriptor {
    table: TableId,
    keys: Vec<SortKey>,
}

impl SortDescriptor {
    /// Validates field and direction arrays into a descriptor.
    ///
    /// Fails with InvalidArgument when either array is missing, the arrays
    /// are empty or differ in length, there are more than `max_keys` keys,
    /// or a field is unknown or not sortable.
    pub fn build(
        schema: &SchemaRegistry,
        table: TableId,
        fields: Option<&[&str]>,
        directions: Option<&[SortDirection]>,
        max_keys: usize,
    ) -> DbResult<Self> {
        let fields = fields.ok_or_else(|| DbError::invalid_argument("Sort fields are missing"))?;
        let directions =
            directions.ok_or_else(|| DbError::invalid_argument("Sort directions are missing"))?;

        if fields.is_empty() {
            return Err(DbError::invalid_argument(
                "Sort requires at least one field",
            ));
        }
        if fields.len() != directions.len() {
            return Err(DbError::invalid_argument(format!(
                "Number of sort fields ({}) and directions ({}) differ",
                fields.len(),
                directions.len()
            )));
        }
        if fields.len() > max_keys {
            return Err(DbError::invalid_argument(format!(
                "Sort descriptor has {} keys, at most {} are allowed",
                fields.len(),
                max_keys
            )));
        }

        let mut keys = Vec::with_capacity(fields.len());
        for (field, direction) in fields.iter().zip(directions) {
            let column = schema.resolve_column(table, field)?;
            let column_type = schema.column_type(table, column)?;
            if !column_type.is_sortable() {
                return Err(DbError::type_mismatch(
                    *field,
                    format!("{} columns cannot be sorted", column_type.type_name()),
                ));
            }
            keys.push(SortKey {
                field: field.to_string(),
                column,
                direction: *direction,
            });
        }
        Ok(Self { table, keys })
    }

    pub fn table(&self) -> TableId {
        self.table
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Stable-sorts `rows` in place. Every row must be live in `source`.
    pub fn sort<S: RowSource>(&self, source: &S, rows: &mut [RowId]) -> DbResult<()> {
        let schema = source.table_schema(self.table)?;
        for row in rows.iter() {
            if source.row(self.table, *row).is_none() {
                return Err(DbError::invalid_state(format!(
                    "Row {} of '{}' has been deleted",
                    row, schema.name
                )));
            }
        }

        rows.sort_by(|a, b| {
            let (a_cells, b_cells) = match (source.row(self.table, *a), source.row(self.table, *b)) {
                (Some(a), Some(b)) => (a, b),
                _ => return Ordering::Equal,
            };
            for key in &self.keys {
                let ordering = match (a_cells.get(key.column), b_cells.get(key.column)) {
                    (Some(x), Some(y)) => compare::sort_order(x, y),
                    _ => Ordering::Equal,
                };
                let ordering = match key.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::schema::{ColumnType, TableSchema};
    use crate::store::{Snapshot, Value};

    fn registry() -> (SchemaRegistry, TableId) {
        let registry = SchemaRegistry::new()
            .with_table(
                TableSchema::new("AllTypes")
                    .column("columnLong", ColumnType::Int)
                    .column("columnString", ColumnType::String)
                    .column("columnBinary", ColumnType::Binary),
            )
            .unwrap();
        let table = registry.resolve_table("AllTypes").unwrap();
        (registry, table)
    }

    #[test]
    fn test_build_rejects_malformed_descriptors() {
        fn rejected(fields: Option<&[&str]>, dirs: Option<&[SortDirection]>) {
            let (registry, table) = registry();
            let err = SortDescriptor::build(&registry, table, fields, dirs, 16).unwrap_err();
            assert!(err.is_invalid_argument(), "{:?}", err);
        }

        use SortDirection::{Asc, Desc};
        rejected(Some(&[]), Some(&[]));
        rejected(Some(&["columnLong"]), Some(&[Asc, Desc]));
        rejected(None, Some(&[Asc]));
        rejected(Some(&["columnLong"]), None);
        rejected(Some(&["notAField"]), Some(&[Asc]));
        rejected(Some(&["columnBinary"]), Some(&[Asc]));
    }

    #[test]
    fn test_direction_from_ascending_flag() {
        let dirs: Vec<SortDirection> = [true, false]
            .into_iter()
            .map(SortDirection::from_ascending)
            .collect();
        assert_eq!(dirs, vec![SortDirection::Asc, SortDirection::Desc]);

        let (registry, table) = registry();
        let descriptor = SortDescriptor::build(
            &registry,
            table,
            Some(&["columnLong", "columnString"]),
            Some(&dirs),
            16,
        )
        .unwrap();
        assert_eq!(descriptor.keys()[1].direction, SortDirection::Desc);
    }

    #[test]
    fn test_build_enforces_key_limit() {
        let (registry, table) = registry();
        let fields = ["columnLong", "columnString"];
        let dirs = [SortDirection::Asc, SortDirection::Asc];
        assert!(SortDescriptor::build(&registry, table, Some(&fields), Some(&dirs), 1).is_err());
        assert!(SortDescriptor::build(&registry, table, Some(&fields), Some(&dirs), 2).is_ok());
    }

    #[test]
    fn test_multi_key_stable_sort() {
        let (registry, table) = registry();
        let registry = Arc::new(registry);
        let mut snap = Snapshot::empty(Arc::clone(&registry));
        let schema = registry.table(table).unwrap();
        let data = [(1, "b"), (0, "z"), (1, "a"), (0, "z"), (1, "a")];
        let mut rows = Vec::new();
        for (long, string) in data {
            let t = snap.table_mut(table).unwrap();
            let row = t.insert_default(schema);
            let cells = t.cells_mut(row).unwrap();
            cells[0] = Value::Int(long);
            cells[1] = Value::from(string);
            rows.push(row);
        }

        let descriptor = SortDescriptor::build(
            &registry,
            table,
            Some(&["columnLong", "columnString"]),
            Some(&[SortDirection::Desc, SortDirection::Asc]),
            16,
        )
        .unwrap();
        let mut sorted = rows.clone();
        descriptor.sort(&snap, &mut sorted).unwrap();

        assert_eq!(sorted, vec![rows[2], rows[4], rows[0], rows[1], rows[3]]);
    }
}
