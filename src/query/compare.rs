//! Comparator library
//!
//! Per-type matchers used by the evaluator and the sort engine.
//!
//! - Equality and ordering require both sides to be the same variant
//! - Strings compare by code point unless a case-insensitive operator is used
//! - Case folding is one-way: both sides are lowered with the same fold
//!   before comparison. Only Latin-script code points are folded; every
//!   other script compares exactly.

use std::borrow::Cow;
use std::cmp::Ordering;

use super::ast::{Case, CompareOp};
use crate::store::Value;

/// Code point ranges whose letters take part in case folding
fn is_foldable(c: char) -> bool {
    matches!(c as u32, 0x0000..=0x024F | 0x1E00..=0x1EFF)
}

fn changes_on_fold(c: char) -> bool {
    let mut lower = c.to_lowercase();
    !(lower.next() == Some(c) && lower.next().is_none())
}

/// Folds Latin-script letters to lower case, leaving other scripts intact
pub fn fold_case(s: &str) -> Cow<'_, str> {
    if !s.chars().any(|c| is_foldable(c) && changes_on_fold(c)) {
        return Cow::Borrowed(s);
    }
    let mut folded = String::with_capacity(s.len());
    for c in s.chars() {
        if is_foldable(c) {
            folded.extend(c.to_lowercase());
        } else {
            folded.push(c);
        }
    }
    Cow::Owned(folded)
}

fn fold_pair<'a>(haystack: &'a str, needle: &'a str, case: Case) -> (Cow<'a, str>, Cow<'a, str>) {
    match case {
        Case::Sensitive => (Cow::Borrowed(haystack), Cow::Borrowed(needle)),
        Case::Insensitive => (fold_case(haystack), fold_case(needle)),
    }
}

pub fn string_equals(a: &str, b: &str, case: Case) -> bool {
    let (a, b) = fold_pair(a, b, case);
    a == b
}

pub fn begins_with(haystack: &str, needle: &str, case: Case) -> bool {
    let (h, n) = fold_pair(haystack, needle, case);
    h.starts_with(n.as_ref())
}

pub fn ends_with(haystack: &str, needle: &str, case: Case) -> bool {
    let (h, n) = fold_pair(haystack, needle, case);
    h.ends_with(n.as_ref())
}

pub fn contains(haystack: &str, needle: &str, case: Case) -> bool {
    let (h, n) = fold_pair(haystack, needle, case);
    h.contains(n.as_ref())
}

/// Floating point order shared by range operators, equality and sorting.
/// NaN equals NaN and sorts above every number; zeros of either sign are equal.
fn float_order(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Value order for range operators; `None` when the values are unordered
/// (different variants, non-ordered types)
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => Some(float_order(f64::from(*a), f64::from(*b))),
        (Value::Double(a), Value::Double(b)) => Some(float_order(*a, *b)),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Total order used by the sort engine
pub fn sort_order(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Float(a), Value::Float(b)) => float_order(f64::from(*a), f64::from(*b)),
        (Value::Double(a), Value::Double(b)) => float_order(*a, *b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Date(a), Value::Date(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

/// Equality between a cell and a literal of the same variant
pub fn values_equal(cell: &Value, literal: &Value, case: Case) -> bool {
    match (cell, literal) {
        (Value::String(a), Value::String(b)) => string_equals(a, b, case),
        (Value::Float(a), Value::Float(b)) => {
            float_order(f64::from(*a), f64::from(*b)) == Ordering::Equal
        }
        (Value::Double(a), Value::Double(b)) => float_order(*a, *b) == Ordering::Equal,
        _ => cell == literal,
    }
}

/// Applies one operator to a cell. Null links never match a value test.
pub fn matches(op: CompareOp, case: Case, cell: &Value, literal: Option<&Value>) -> bool {
    match op {
        CompareOp::IsNull => matches!(cell, Value::Link(None)),
        CompareOp::IsNotNull => matches!(cell, Value::Link(Some(_))),
        _ => {
            let literal = match literal {
                Some(l) => l,
                None => return false,
            };
            if matches!(cell, Value::Link(None)) {
                return false;
            }
            match op {
                CompareOp::Equal => values_equal(cell, literal, case),
                CompareOp::NotEqual => cell.column_type() == literal.column_type()
                    && !values_equal(cell, literal, case),
                CompareOp::Greater => compare_values(cell, literal) == Some(Ordering::Greater),
                CompareOp::GreaterEqual => matches!(
                    compare_values(cell, literal),
                    Some(Ordering::Greater | Ordering::Equal)
                ),
                CompareOp::Less => compare_values(cell, literal) == Some(Ordering::Less),
                CompareOp::LessEqual => matches!(
                    compare_values(cell, literal),
                    Some(Ordering::Less | Ordering::Equal)
                ),
                CompareOp::BeginsWith | CompareOp::Contains | CompareOp::EndsWith => {
                    match (cell.as_str(), literal.as_str()) {
                        (Some(h), Some(n)) => match op {
                            CompareOp::BeginsWith => begins_with(h, n, case),
                            CompareOp::Contains => contains(h, n, case),
                            _ => ends_with(h, n, case),
                        },
                        _ => false,
                    }
                }
                CompareOp::IsNull | CompareOp::IsNotNull => false,
            }
        }
    }
}
