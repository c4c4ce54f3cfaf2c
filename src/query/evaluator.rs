//! Predicate tree evaluation
//!
//! Evaluates a reduced `Expr` over a domain of row-ids:
//! - AND narrows the candidate set child by child
//! - OR is the union of its children, kept in domain order
//! - NOT is the domain minus the rows its child matches
//!
//! The domain is either the whole table in table order or the frozen
//! row-id sequence of a sub-query. Output order always follows the domain.

use std::collections::HashSet;

use super::ast::{Comparison, Expr};
use super::compare;
use crate::errors::{DbError, DbResult};
use crate::row::{RowAccess, UncheckedRow};
use crate::schema::{TableId, TableSchema};
use crate::store::{RowId, Snapshot, Value};

/// Read side of the Table Store as seen by evaluation and sorting
pub trait RowSource {
    /// Schema of a table
    fn table_schema(&self, table: TableId) -> DbResult<&TableSchema>;

    /// Cells of a live row, `None` when the row does not exist
    fn row(&self, table: TableId, row: RowId) -> Option<&[Value]>;

    /// Every live row-id of a table, in table order
    fn row_ids(&self, table: TableId) -> DbResult<Vec<RowId>>;
}

impl RowSource for Snapshot {
    fn table_schema(&self, table: TableId) -> DbResult<&TableSchema> {
        self.schema().table(table)
    }

    fn row(&self, table: TableId, row: RowId) -> Option<&[Value]> {
        self.table(table).ok().and_then(|t| t.cells(row))
    }

    fn row_ids(&self, table: TableId) -> DbResult<Vec<RowId>> {
        Ok(self.table(table)?.row_ids().collect())
    }
}

/// Evaluates predicate trees against one table of a row source
pub struct Evaluator<'a, S: RowSource> {
    source: &'a S,
    table: TableId,
}

impl<'a, S: RowSource> Evaluator<'a, S> {
    pub fn new(source: &'a S, table: TableId) -> Self {
        Self { source, table }
    }

    /// Returns the rows of `domain` matching `expr`, in domain order
    pub fn evaluate(&self, expr: &Expr, domain: &[RowId]) -> DbResult<Vec<RowId>> {
        match expr {
            Expr::All => Ok(domain.to_vec()),
            Expr::Compare(cmp) => {
                let mut hits = Vec::new();
                for &row in domain {
                    if self.matches(cmp, row)? {
                        hits.push(row);
                    }
                }
                Ok(hits)
            }
            Expr::And(children) => {
                let mut candidates = domain.to_vec();
                for child in children {
                    if candidates.is_empty() {
                        break;
                    }
                    candidates = self.evaluate(child, &candidates)?;
                }
                Ok(candidates)
            }
            Expr::Or(children) => {
                let mut matched: HashSet<RowId> = HashSet::new();
                let mut remaining = domain.to_vec();
                for child in children {
                    if remaining.is_empty() {
                        break;
                    }
                    matched.extend(self.evaluate(child, &remaining)?);
                    remaining.retain(|r| !matched.contains(r));
                }
                Ok(domain.iter().copied().filter(|r| matched.contains(r)).collect())
            }
            Expr::Not(child) => {
                let excluded: HashSet<RowId> = self.evaluate(child, domain)?.into_iter().collect();
                Ok(domain.iter().copied().filter(|r| !excluded.contains(r)).collect())
            }
        }
    }

    /// Returns the first row of `domain` matching `expr`
    pub fn find_first(&self, expr: &Expr, domain: &[RowId]) -> DbResult<Option<RowId>> {
        for &row in domain {
            if !self.evaluate(expr, std::slice::from_ref(&row))?.is_empty() {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }

    fn matches(&self, cmp: &Comparison, row: RowId) -> DbResult<bool> {
        let schema = self.source.table_schema(self.table)?;
        let cells = self.source.row(self.table, row).ok_or_else(|| {
            DbError::invalid_state(format!("Row {} of '{}' has been deleted", row, schema.name))
        })?;
        let accessor = UncheckedRow::new(schema, row, cells);
        let literal = cmp.literal.as_ref();

        let hop = match cmp.path.hop {
            None => {
                let cell = accessor.value(cmp.path.column)?;
                return Ok(compare::matches(cmp.op, cmp.case, cell, literal));
            }
            Some(hop) => hop,
        };

        let single;
        let linked: &[RowId] = if hop.many {
            accessor.get_link_list(hop.column)?
        } else {
            single = accessor.get_link(hop.column)?;
            match &single {
                Some(id) => std::slice::from_ref(id),
                None => &[],
            }
        };

        let target_schema = self.source.table_schema(cmp.path.table)?;
        for &id in linked {
            let target_cells = match self.source.row(cmp.path.table, id) {
                Some(cells) => cells,
                None => continue,
            };
            let target = UncheckedRow::new(target_schema, id, target_cells);
            if compare::matches(cmp.op, cmp.case, target.value(cmp.path.column)?, literal) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::query::ast::{Case, ColumnPath, CompareOp};
    use crate::schema::{ColumnType, SchemaRegistry, TableSchema};

    fn snapshot_with_longs(values: &[i64]) -> (Snapshot, TableId) {
        let registry = SchemaRegistry::new()
            .with_table(TableSchema::new("AllTypes").column("columnLong", ColumnType::Int))
            .unwrap();
        let table = registry.resolve_table("AllTypes").unwrap();
        let registry = Arc::new(registry);
        let mut snap = Snapshot::empty(Arc::clone(&registry));
        let schema = registry.table(table).unwrap();
        for v in values {
            let t = snap.table_mut(table).unwrap();
            let row = t.insert_default(schema);
            t.cells_mut(row).unwrap()[0] = Value::Int(*v);
        }
        (snap, table)
    }

    fn long_cmp(table: TableId, op: CompareOp, v: i64) -> Expr {
        Expr::Compare(Comparison {
            path: ColumnPath {
                field: "columnLong".into(),
                hop: None,
                table,
                column: 0,
                column_type: ColumnType::Int,
            },
            op,
            literal: Some(Value::Int(v)),
            case: Case::Sensitive,
        })
    }

    fn values(snap: &Snapshot, table: TableId, rows: &[RowId]) -> Vec<i64> {
        rows.iter()
            .map(|r| snap.row(table, *r).unwrap()[0].as_long().unwrap())
            .collect()
    }

    #[test]
    fn test_or_not_group() {
        let (snap, table) = snapshot_with_longs(&(0..10).collect::<Vec<_>>());
        let expr = Expr::Or(vec![
            long_cmp(table, CompareOp::Equal, 5),
            Expr::Not(Box::new(long_cmp(table, CompareOp::Greater, 2))),
        ]);
        let eval = Evaluator::new(&snap, table);
        let domain = snap.row_ids(table).unwrap();
        let hits = eval.evaluate(&expr, &domain).unwrap();
        assert_eq!(values(&snap, table, &hits), vec![0, 1, 2, 5]);
    }

    #[test]
    fn test_and_narrows() {
        let (snap, table) = snapshot_with_longs(&(0..10).collect::<Vec<_>>());
        let expr = Expr::And(vec![
            long_cmp(table, CompareOp::GreaterEqual, 3),
            long_cmp(table, CompareOp::LessEqual, 6),
        ]);
        let domain = snap.row_ids(table).unwrap();
        let hits = Evaluator::new(&snap, table).evaluate(&expr, &domain).unwrap();
        assert_eq!(values(&snap, table, &hits), vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_domain_order_preserved() {
        let (snap, table) = snapshot_with_longs(&[0, 1, 2, 3]);
        let mut domain = snap.row_ids(table).unwrap();
        domain.reverse();
        let hits = Evaluator::new(&snap, table)
            .evaluate(&Expr::All, &domain)
            .unwrap();
        assert_eq!(values(&snap, table, &hits), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_find_first() {
        let (snap, table) = snapshot_with_longs(&[7, 8, 9]);
        let domain = snap.row_ids(table).unwrap();
        let eval = Evaluator::new(&snap, table);
        let first = eval
            .find_first(&long_cmp(table, CompareOp::Greater, 7), &domain)
            .unwrap();
        assert_eq!(first, Some(domain[1]));
        let none = eval
            .find_first(&long_cmp(table, CompareOp::Greater, 100), &domain)
            .unwrap();
        assert_eq!(none, None);
    }
}
