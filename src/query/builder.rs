//! Fluent predicate builder
//!
//! A `Query` turns a linear call sequence into a predicate tree:
//! - Adjacent conditions are joined by an implicit AND
//! - `or()` joins the previous and the next condition with OR
//! - `not()` negates exactly the next condition or group
//! - `begin_group()`/`end_group()` make a block one atomic term
//!
//! NOT binds tightest, then AND, then OR.
//!
//! Field names and literal types are validated at each comparison call.
//! Grammar faults from the infallible connectors (`or`, `not`,
//! `begin_group`) are held back and surface at the next fallible call.

use std::collections::HashSet;
use std::sync::Arc;

use super::ast::{Case, ColumnPath, CompareOp, Comparison, Expr, LinkHop};
use super::evaluator::{Evaluator, RowSource};
use super::results::Results;
use super::sorter::{SortDescriptor, SortDirection};
use crate::errors::{DbError, DbResult};
use crate::object::Object;
use crate::observability::Severity;
use crate::schema::{ColumnType, TableId};
use crate::store::{Database, RowId, Snapshot, Value};

/// Builder grammar state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// At the start of the query or of a group
    ExpectTerm,
    /// A condition or group was just completed
    AfterTerm,
    /// `not()` is waiting for its condition or group
    PendingNegation,
    /// `or()` is waiting for its right-hand condition
    PendingConnector,
}

/// One open group: an OR of AND-branches
#[derive(Debug, Clone)]
struct Frame {
    branches: Vec<Vec<Expr>>,
    negated: bool,
}

impl Frame {
    fn new(negated: bool) -> Self {
        Self {
            branches: vec![Vec::new()],
            negated,
        }
    }

    fn push(&mut self, term: Expr) {
        if let Some(branch) = self.branches.last_mut() {
            branch.push(term);
        }
    }

    fn reduce(&self) -> Expr {
        let mut alternatives: Vec<Expr> = self
            .branches
            .iter()
            .map(|branch| match branch.len() {
                0 => Expr::All,
                1 => branch[0].clone(),
                _ => Expr::And(branch.clone()),
            })
            .collect();
        let expr = if alternatives.len() == 1 {
            alternatives.remove(0)
        } else {
            Expr::Or(alternatives)
        };
        if self.negated {
            Expr::Not(Box::new(expr))
        } else {
            expr
        }
    }
}

/// Evaluation domain frozen at sub-query creation
#[derive(Debug, Clone)]
struct Scope {
    epoch: u64,
    rows: Arc<[RowId]>,
}

/// Query over one table, or over a frozen subset of its rows
#[derive(Debug, Clone)]
pub struct Query {
    db: Database,
    table: TableId,
    scope: Option<Scope>,
    frames: Vec<Frame>,
    state: State,
    fault: Option<DbError>,
}

impl Query {
    pub(crate) fn new(db: Database, table: &str) -> DbResult<Self> {
        let table = db.schema().resolve_table(table)?;
        Ok(Self::with_scope(db, table, None))
    }

    /// Sub-query restricted to `rows`, in that order, first occurrence wins
    pub(crate) fn scoped(db: Database, table: TableId, epoch: u64, rows: &[RowId]) -> Self {
        let mut seen = HashSet::with_capacity(rows.len());
        let unique: Vec<RowId> = rows.iter().copied().filter(|r| seen.insert(*r)).collect();
        let scope = Scope {
            epoch,
            rows: Arc::from(unique),
        };
        Self::with_scope(db, table, Some(scope))
    }

    fn with_scope(db: Database, table: TableId, scope: Option<Scope>) -> Self {
        Self {
            db,
            table,
            scope,
            frames: vec![Frame::new(false)],
            state: State::ExpectTerm,
            fault: None,
        }
    }

    pub fn table_id(&self) -> TableId {
        self.table
    }

    pub fn table_name(&self) -> &str {
        self.db
            .schema()
            .table(self.table)
            .map(|t| t.name.as_str())
            .unwrap_or_default()
    }

    /// Number of groups opened and not yet closed
    pub fn group_depth(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    pub fn is_scoped(&self) -> bool {
        self.scope.is_some()
    }

    // =========================================================================
    // Comparisons
    // =========================================================================

    pub fn equal_to<V: Into<Value>>(self, field: &str, value: V) -> DbResult<Self> {
        self.compare(field, CompareOp::Equal, Some(value.into()), Case::Sensitive)
    }

    /// String equality with explicit case handling
    pub fn equal_to_case(self, field: &str, value: &str, case: Case) -> DbResult<Self> {
        self.compare(field, CompareOp::Equal, Some(Value::from(value)), case)
    }

    pub fn not_equal_to<V: Into<Value>>(self, field: &str, value: V) -> DbResult<Self> {
        self.compare(field, CompareOp::NotEqual, Some(value.into()), Case::Sensitive)
    }

    pub fn not_equal_to_case(self, field: &str, value: &str, case: Case) -> DbResult<Self> {
        self.compare(field, CompareOp::NotEqual, Some(Value::from(value)), case)
    }

    pub fn greater_than<V: Into<Value>>(self, field: &str, value: V) -> DbResult<Self> {
        self.compare(field, CompareOp::Greater, Some(value.into()), Case::Sensitive)
    }

    pub fn greater_than_or_equal_to<V: Into<Value>>(self, field: &str, value: V) -> DbResult<Self> {
        self.compare(field, CompareOp::GreaterEqual, Some(value.into()), Case::Sensitive)
    }

    pub fn less_than<V: Into<Value>>(self, field: &str, value: V) -> DbResult<Self> {
        self.compare(field, CompareOp::Less, Some(value.into()), Case::Sensitive)
    }

    pub fn less_than_or_equal_to<V: Into<Value>>(self, field: &str, value: V) -> DbResult<Self> {
        self.compare(field, CompareOp::LessEqual, Some(value.into()), Case::Sensitive)
    }

    /// Inclusive range: `field >= low AND field <= high`, as one term
    pub fn between<V: Into<Value>>(mut self, field: &str, low: V, high: V) -> DbResult<Self> {
        self.take_fault()?;
        let low = self.comparison(field, CompareOp::GreaterEqual, Some(low.into()), Case::Sensitive);
        let low = self.checked(low)?;
        let high = self.comparison(field, CompareOp::LessEqual, Some(high.into()), Case::Sensitive);
        let high = self.checked(high)?;
        self.push_term(Expr::And(vec![Expr::Compare(low), Expr::Compare(high)]));
        Ok(self)
    }

    pub fn begins_with(self, field: &str, value: &str) -> DbResult<Self> {
        self.begins_with_case(field, value, Case::Sensitive)
    }

    pub fn begins_with_case(self, field: &str, value: &str, case: Case) -> DbResult<Self> {
        self.compare(field, CompareOp::BeginsWith, Some(Value::from(value)), case)
    }

    pub fn ends_with(self, field: &str, value: &str) -> DbResult<Self> {
        self.ends_with_case(field, value, Case::Sensitive)
    }

    pub fn ends_with_case(self, field: &str, value: &str, case: Case) -> DbResult<Self> {
        self.compare(field, CompareOp::EndsWith, Some(Value::from(value)), case)
    }

    pub fn contains(self, field: &str, value: &str) -> DbResult<Self> {
        self.contains_case(field, value, Case::Sensitive)
    }

    pub fn contains_case(self, field: &str, value: &str, case: Case) -> DbResult<Self> {
        self.compare(field, CompareOp::Contains, Some(Value::from(value)), case)
    }

    /// Matches rows whose link column is null
    pub fn is_null(self, field: &str) -> DbResult<Self> {
        self.compare(field, CompareOp::IsNull, None, Case::Sensitive)
    }

    pub fn is_not_null(self, field: &str) -> DbResult<Self> {
        self.compare(field, CompareOp::IsNotNull, None, Case::Sensitive)
    }

    // =========================================================================
    // Connectors and groups
    // =========================================================================

    /// Joins the previous and the next condition with OR
    pub fn or(mut self) -> Self {
        if self.state != State::AfterTerm {
            self.record_fault("or() must follow a condition or group");
            return self;
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.branches.push(Vec::new());
        }
        self.state = State::PendingConnector;
        self
    }

    /// Negates the next condition or group
    pub fn not(mut self) -> Self {
        if self.state == State::PendingNegation {
            self.record_fault("not() must be followed by a condition or group, not another not()");
            return self;
        }
        self.state = State::PendingNegation;
        self
    }

    pub fn begin_group(mut self) -> Self {
        let negated = self.state == State::PendingNegation;
        self.frames.push(Frame::new(negated));
        self.state = State::ExpectTerm;
        self
    }

    pub fn end_group(mut self) -> DbResult<Self> {
        self.take_fault()?;
        if self.frames.len() < 2 {
            return Err(self.reject(DbError::unsupported(
                "end_group() without a matching begin_group()",
            )));
        }
        self.check_no_pending()?;
        if let Some(frame) = self.frames.pop() {
            let term = frame.reduce();
            if let Some(parent) = self.frames.last_mut() {
                parent.push(term);
            }
        }
        self.state = State::AfterTerm;
        Ok(self)
    }

    // =========================================================================
    // Terminals
    // =========================================================================

    /// Validates the grammar and returns the reduced predicate tree
    pub fn predicate(&self) -> DbResult<Expr> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }
        if self.frames.len() != 1 {
            return Err(DbError::unsupported(format!(
                "{} group(s) left open",
                self.group_depth()
            )));
        }
        if let Some(err) = self.pending_error() {
            return Err(err);
        }
        Ok(self.frames[0].reduce())
    }

    /// Every matching row, in domain order. Zero matches is not an error.
    pub fn find_all(&self) -> DbResult<Results> {
        self.execute(None)
    }

    /// First matching row in domain order, `None` when nothing matches
    pub fn find_first(&self) -> DbResult<Option<Object>> {
        let expr = self.checked(self.predicate())?;
        let snapshot = self.db.snapshot()?;
        let (epoch, domain) = self.checked(self.domain(&snapshot))?;
        let first = Evaluator::new(&*snapshot, self.table).find_first(&expr, &domain);
        let first = self.checked(first)?;
        self.record(domain.len(), usize::from(first.is_some()), false);
        Ok(first.map(|row| Object::new(self.db.clone(), self.table, row, epoch)))
    }

    /// One evaluation pass followed by one sort pass
    pub fn find_all_sorted(
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
        );
        let descriptor = self.checked(descriptor)?;
        self.execute(Some(&descriptor))
    }

    pub fn find_all_sorted_by(&self, field: &str, direction: SortDirection) -> DbResult<Results> {
        self.find_all_sorted(Some(&[field]), Some(&[direction]))
    }

    /// Number of matching rows
    pub fn count(&self) -> DbResult<usize> {
        let expr = self.checked(self.predicate())?;
        let snapshot = self.db.snapshot()?;
        let (_, domain) = self.checked(self.domain(&snapshot))?;
        let hits = Evaluator::new(&*snapshot, self.table).evaluate(&expr, &domain);
        let hits = self.checked(hits)?;
        self.record(domain.len(), hits.len(), false);
        Ok(hits.len())
    }

    fn execute(&self, sort: Option<&SortDescriptor>) -> DbResult<Results> {
        let expr = self.checked(self.predicate())?;
        let snapshot = self.db.snapshot()?;
        let (epoch, domain) = self.checked(self.domain(&snapshot))?;
        let hits = Evaluator::new(&*snapshot, self.table).evaluate(&expr, &domain);
        let mut hits = self.checked(hits)?;
        if let Some(descriptor) = sort {
            descriptor.sort(&*snapshot, &mut hits)?;
            self.db.metrics().increment_sorts();
        }
        self.record(domain.len(), hits.len(), sort.is_some());
        Ok(Results::new(self.db.clone(), self.table, epoch, hits))
    }

    /// Rows the query runs over, plus the table epoch they belong to
    fn domain(&self, snapshot: &Snapshot) -> DbResult<(u64, Vec<RowId>)> {
        let table = snapshot.table(self.table)?;
        match &self.scope {
            None => Ok((table.epoch(), snapshot.row_ids(self.table)?)),
            Some(scope) => {
                if scope.epoch != table.epoch() {
                    return Err(DbError::invalid_state(format!(
                        "Table '{}' was cleared after this sub-query was created",
                        self.table_name()
                    )));
                }
                let rows = scope.rows.iter().copied().filter(|r| table.contains(*r)).collect();
                Ok((scope.epoch, rows))
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn compare(
        mut self,
        field: &str,
        op: CompareOp,
        literal: Option<Value>,
        case: Case,
    ) -> DbResult<Self> {
        self.take_fault()?;
        let cmp = self.comparison(field, op, literal, case);
        let cmp = self.checked(cmp)?;
        self.push_term(Expr::Compare(cmp));
        Ok(self)
    }

    /// Resolves and type checks one comparison
    fn comparison(
        &self,
        field: &str,
        op: CompareOp,
        literal: Option<Value>,
        case: Case,
    ) -> DbResult<Comparison> {
        let path = self.resolve_path(field)?;
        let column_type = path.column_type;

        if op.is_null_test() {
            if path.hop.is_some() || column_type != ColumnType::Link {
                return Err(DbError::type_mismatch(
                    field,
                    format!("{} columns are never null", column_type.type_name()),
                ));
            }
            return Ok(Comparison {
                path,
                op,
                literal: None,
                case,
            });
        }

        if column_type.is_link() {
            return Err(DbError::type_mismatch(
                field,
                format!(
                    "{} columns only support null tests and link paths",
                    column_type.type_name()
                ),
            ));
        }

        let literal = literal.ok_or_else(|| {
            DbError::invalid_argument(format!("Operator {} requires a value", op.op_name()))
        })?;
        if literal.column_type() != column_type {
            return Err(DbError::type_mismatch(
                field,
                format!(
                    "column is {} but the value is {}",
                    column_type.type_name(),
                    literal.column_type().type_name()
                ),
            ));
        }
        if op.is_range() && !column_type.is_ordered() {
            return Err(DbError::type_mismatch(
                field,
                format!("{} columns do not support {}", column_type.type_name(), op.op_name()),
            ));
        }
        if op.is_substring() && column_type != ColumnType::String {
            return Err(DbError::type_mismatch(
                field,
                format!("{} requires a string column", op.op_name()),
            ));
        }

        Ok(Comparison {
            path,
            op,
            literal: Some(literal),
            case,
        })
    }

    /// Resolves `field` or a single-hop `link.field` path
    fn resolve_path(&self, field: &str) -> DbResult<ColumnPath> {
        let schema = self.db.schema();
        let table_schema = schema.table(self.table)?;

        if let Some(column) = table_schema.column_index(field) {
            return Ok(ColumnPath {
                field: field.to_string(),
                hop: None,
                table: self.table,
                column,
                column_type: schema.column_type(self.table, column)?,
            });
        }

        let (link, rest) = field
            .split_once('.')
            .ok_or_else(|| DbError::unknown_field(field, &table_schema.name))?;
        let link_column = table_schema
            .column_index(link)
            .ok_or_else(|| DbError::unknown_field(field, &table_schema.name))?;
        let link_type = schema.column_type(self.table, link_column)?;
        if !link_type.is_link() {
            return Err(DbError::type_mismatch(
                field,
                format!("'{}' is {}, not a link", link, link_type.type_name()),
            ));
        }

        let target = schema.link_target(self.table, link_column)?;
        let target_schema = schema.table(target)?;
        let column = target_schema
            .column_index(rest)
            .ok_or_else(|| DbError::unknown_field(field, &target_schema.name))?;
        let column_type = schema.column_type(target, column)?;
        if column_type.is_link() {
            return Err(DbError::invalid_argument(format!(
                "Field path '{}' crosses more than one link",
                field
            )));
        }

        Ok(ColumnPath {
            field: field.to_string(),
            hop: Some(LinkHop {
                column: link_column,
                many: link_type == ColumnType::LinkList,
            }),
            table: target,
            column,
            column_type,
        })
    }

    fn push_term(&mut self, term: Expr) {
        let term = if self.state == State::PendingNegation {
            Expr::Not(Box::new(term))
        } else {
            term
        };
        if let Some(frame) = self.frames.last_mut() {
            frame.push(term);
        }
        self.state = State::AfterTerm;
    }

    fn pending_error(&self) -> Option<DbError> {
        match self.state {
            State::PendingNegation => Some(DbError::unsupported(
                "not() must be followed by a condition or group",
            )),
            State::PendingConnector => Some(DbError::unsupported(
                "or() must be followed by a condition or group",
            )),
            State::ExpectTerm | State::AfterTerm => None,
        }
    }

    fn check_no_pending(&self) -> DbResult<()> {
        match self.pending_error() {
            Some(err) => Err(self.reject(err)),
            None => Ok(()),
        }
    }

    fn record_fault(&mut self, reason: &str) {
        if self.fault.is_none() {
            self.fault = Some(DbError::unsupported(reason));
        }
    }

    fn take_fault(&mut self) -> DbResult<()> {
        match self.fault.take() {
            Some(fault) => Err(self.reject(fault)),
            None => Ok(()),
        }
    }

    fn checked<T>(&self, result: DbResult<T>) -> DbResult<T> {
        result.map_err(|e| self.reject(e))
    }

    /// Counts and logs a rejected query, passing the error through
    fn reject(&self, err: DbError) -> DbError {
        self.db.metrics().increment_queries_rejected();
        self.db.log(
            Severity::Warn,
            "QUERY_REJECTED",
            &[
                ("code", err.code().code()),
                ("reason", err.message()),
                ("table", self.table_name()),
            ],
        );
        err
    }

    fn record(&self, scanned: usize, matched: usize, sorted: bool) {
        self.db.metrics().record_query(scanned as u64, matched as u64);
        let scanned = scanned.to_string();
        let matched = matched.to_string();
        self.db.log(
            Severity::Trace,
            "QUERY_EXECUTED",
            &[
                ("matched", &matched),
                ("scanned", &scanned),
                ("sorted", if sorted { "true" } else { "false" }),
                ("table", self.table_name()),
            ],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::errors::ErrorCode;
    use crate::schema::{SchemaRegistry, TableSchema};

    fn open(values: &[i64]) -> Database {
        let schema = SchemaRegistry::new()
            .with_table(
                TableSchema::new("AllTypes")
                    .column("columnLong", ColumnType::Int)
                    .column("columnString", ColumnType::String)
                    .column("columnBinary", ColumnType::Binary)
                    .link("other", "AllTypes"),
            )
            .unwrap();
        let db = Database::open(DatabaseConfig::default(), schema).unwrap();
        let mut txn = db.begin_write().unwrap();
        for v in values {
            txn.create_object("AllTypes")
                .unwrap()
                .set_long("columnLong", *v)
                .unwrap();
        }
        txn.commit().unwrap();
        db
    }

    fn longs(results: &Results) -> Vec<i64> {
        results
            .iter()
            .map(|o| o.get_long("columnLong").unwrap())
            .collect()
    }

    // =========================================================================
    // Grammar
    // =========================================================================

    #[test]
    fn test_empty_query_matches_everything() {
        let db = open(&[1, 2, 3]);
        let query = db.query("AllTypes").unwrap();
        assert_eq!(query.predicate().unwrap(), Expr::All);
        assert_eq!(query.count().unwrap(), 3);
    }

    #[test]
    fn test_dangling_not_is_unsupported() {
        let db = open(&[1]);
        let err = db.query("AllTypes").unwrap().not().find_all().unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedOperation);
    }

    #[test]
    fn test_double_not_is_unsupported() {
        let db = open(&[1]);
        let err = db
            .query("AllTypes")
            .unwrap()
            .not()
            .not()
            .equal_to("columnLong", 1)
            .unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_leading_or_is_unsupported() {
        let db = open(&[1]);
        let err = db
            .query("AllTypes")
            .unwrap()
            .or()
            .equal_to("columnLong", 1)
            .unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_trailing_or_is_unsupported() {
        let db = open(&[1]);
        let query = db
            .query("AllTypes")
            .unwrap()
            .equal_to("columnLong", 1)
            .unwrap()
            .or();
        assert!(query.find_all().unwrap_err().is_unsupported());
    }

    #[test]
    fn test_unbalanced_groups() {
        let db = open(&[1]);
        let err = db.query("AllTypes").unwrap().end_group().unwrap_err();
        assert!(err.is_unsupported());

        let open_group = db
            .query("AllTypes")
            .unwrap()
            .begin_group()
            .equal_to("columnLong", 1)
            .unwrap();
        assert_eq!(open_group.group_depth(), 1);
        assert!(open_group.find_all().unwrap_err().is_unsupported());
    }

    #[test]
    fn test_not_inside_group_must_be_completed() {
        let db = open(&[1]);
        let err = db
            .query("AllTypes")
            .unwrap()
            .begin_group()
            .not()
            .end_group()
            .unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_empty_group_matches_everything() {
        let db = open(&[1, 2]);
        let results = db
            .query("AllTypes")
            .unwrap()
            .begin_group()
            .end_group()
            .unwrap()
            .find_all()
            .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_or_binds_looser_than_and() {
        let db = open(&(0..10).collect::<Vec<_>>());
        // (long > 7 AND long < 9) OR long == 1
        let results = db
            .query("AllTypes")
            .unwrap()
            .greater_than("columnLong", 7)
            .unwrap()
            .less_than("columnLong", 9)
            .unwrap()
            .or()
            .equal_to("columnLong", 1)
            .unwrap()
            .find_all()
            .unwrap();
        assert_eq!(longs(&results), vec![1, 8]);
    }

    #[test]
    fn test_not_applies_to_next_term_only() {
        let db = open(&(0..10).collect::<Vec<_>>());
        let results = db
            .query("AllTypes")
            .unwrap()
            .not()
            .less_than("columnLong", 3)
            .unwrap()
            .less_than("columnLong", 6)
            .unwrap()
            .find_all()
            .unwrap();
        assert_eq!(longs(&results), vec![3, 4, 5]);
    }

    #[test]
    fn test_not_between_negates_whole_range() {
        let db = open(&(0..10).collect::<Vec<_>>());
        let results = db
            .query("AllTypes")
            .unwrap()
            .not()
            .between("columnLong", 2, 7)
            .unwrap()
            .find_all()
            .unwrap();
        assert_eq!(longs(&results), vec![0, 1, 8, 9]);
    }

    #[test]
    fn test_nested_groups() {
        let db = open(&(0..10).collect::<Vec<_>>());
        // long < 8 AND NOT (long == 2 OR (long > 4 AND long < 7))
        let results = db
            .query("AllTypes")
            .unwrap()
            .less_than("columnLong", 8)
            .unwrap()
            .not()
            .begin_group()
            .equal_to("columnLong", 2)
            .unwrap()
            .or()
            .begin_group()
            .greater_than("columnLong", 4)
            .unwrap()
            .less_than("columnLong", 7)
            .unwrap()
            .end_group()
            .unwrap()
            .end_group()
            .unwrap()
            .find_all()
            .unwrap();
        assert_eq!(longs(&results), vec![0, 1, 3, 4, 7]);
    }

    // =========================================================================
    // Field and type validation
    // =========================================================================

    #[test]
    fn test_unknown_field_names_field_and_table() {
        let db = open(&[]);
        let err = db
            .query("AllTypes")
            .unwrap()
            .equal_to("NotAField", 13)
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(err.field(), Some("NotAField"));
        assert!(err.message().contains("AllTypes"));
    }

    #[test]
    fn test_literal_type_must_match() {
        let db = open(&[]);
        let query = db.query("AllTypes").unwrap();
        assert!(query
            .clone()
            .equal_to("columnLong", 1.0f64)
            .unwrap_err()
            .is_invalid_argument());
        assert!(query
            .clone()
            .equal_to("columnString", 1)
            .unwrap_err()
            .is_invalid_argument());
    }

    #[test]
    fn test_operator_type_rules() {
        let db = open(&[]);
        let query = db.query("AllTypes").unwrap();
        assert!(query.clone().greater_than("columnString", "a").is_err());
        assert!(query.clone().contains("columnLong", "1").is_err());
        assert!(query.clone().is_null("columnLong").is_err());
        assert!(query.clone().equal_to("columnBinary", vec![1u8, 2]).is_ok());
        assert!(query.clone().greater_than("columnBinary", vec![1u8]).is_err());
        assert!(query.clone().is_null("other").is_ok());
    }

    #[test]
    fn test_link_paths_are_single_hop() {
        let db = open(&[]);
        let query = db.query("AllTypes").unwrap();
        assert!(query.clone().equal_to("other.columnLong", 1).is_ok());
        assert!(query
            .clone()
            .equal_to("other.other.columnLong", 1)
            .unwrap_err()
            .is_invalid_argument());
        assert!(query
            .clone()
            .equal_to("columnLong.columnLong", 1)
            .unwrap_err()
            .is_invalid_argument());
    }

    #[test]
    fn test_rejections_are_counted() {
        let db = open(&[]);
        let _ = db.query("AllTypes").unwrap().equal_to("nope", 1);
        let _ = db.query("AllTypes").unwrap().not().find_all();
        assert_eq!(db.metrics().snapshot().queries_rejected, 2);
    }

    #[test]
    fn test_query_can_be_reused() {
        let db = open(&(0..5).collect::<Vec<_>>());
        let query = db
            .query("AllTypes")
            .unwrap()
            .greater_than("columnLong", 2)
            .unwrap();
        assert_eq!(query.count().unwrap(), 2);
        assert_eq!(query.find_all().unwrap().len(), 2);
        let first = query.find_first().unwrap().unwrap();
        assert_eq!(first.get_long("columnLong").unwrap(), 3);
    }
}
