//! Predicate tree structures
//!
//! The builder reduces its linear call sequence into an `Expr` tree. Every
//! column reference in the tree has already been resolved and type checked.

use crate::schema::{ColumnType, TableId};
use crate::store::Value;

/// Case handling for string operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Case {
    #[default]
    Sensitive,
    Insensitive,
}

impl Case {
    /// Maps the boolean flag form used by the builder
    pub fn from_sensitive(sensitive: bool) -> Self {
        if sensitive {
            Case::Sensitive
        } else {
            Case::Insensitive
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    BeginsWith,
    Contains,
    EndsWith,
    IsNull,
    IsNotNull,
}

impl CompareOp {
    /// Returns the operation name for log output
    pub fn op_name(&self) -> &'static str {
        match self {
            CompareOp::Equal => "eq",
            CompareOp::NotEqual => "ne",
            CompareOp::Greater => "gt",
            CompareOp::GreaterEqual => "gte",
            CompareOp::Less => "lt",
            CompareOp::LessEqual => "lte",
            CompareOp::BeginsWith => "begins_with",
            CompareOp::Contains => "contains",
            CompareOp::EndsWith => "ends_with",
            CompareOp::IsNull => "is_null",
            CompareOp::IsNotNull => "is_not_null",
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(
            self,
            CompareOp::Greater | CompareOp::GreaterEqual | CompareOp::Less | CompareOp::LessEqual
        )
    }

    pub fn is_substring(&self) -> bool {
        matches!(
            self,
            CompareOp::BeginsWith | CompareOp::Contains | CompareOp::EndsWith
        )
    }

    pub fn is_null_test(&self) -> bool {
        matches!(self, CompareOp::IsNull | CompareOp::IsNotNull)
    }
}

/// The link column a path crosses before reaching its leaf column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkHop {
    /// Link or link list column in the queried table
    pub column: usize,
    /// True for a link list: any linked row may match
    pub many: bool,
}

/// A resolved column reference, optionally one link hop away
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPath {
    /// Field reference as written by the caller
    pub field: String,
    pub hop: Option<LinkHop>,
    /// Table holding the leaf column
    pub table: TableId,
    pub column: usize,
    pub column_type: ColumnType,
}

/// One resolved comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub path: ColumnPath,
    pub op: CompareOp,
    /// `None` only for null tests
    pub literal: Option<Value>,
    pub case: Case,
}

/// Reduced predicate tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Matches every row of the domain (empty query or empty group)
    All,
    Compare(Comparison),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    /// Number of comparisons in the tree
    pub fn comparison_count(&self) -> usize {
        match self {
            Expr::All => 0,
            Expr::Compare(_) => 1,
            Expr::And(children) | Expr::Or(children) => {
                children.iter().map(Expr::comparison_count).sum()
            }
            Expr::Not(child) => child.comparison_count(),
        }
    }
}
