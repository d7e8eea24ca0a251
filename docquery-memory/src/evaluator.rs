//! Filter and sort evaluation for in-memory documents.
//!
//! This module interprets the filter and sort documents produced by the query compiler (and any
//! hand-written equivalents) against stored BSON documents.

use std::cmp::Ordering;

use bson::{Binary, Bson, Decimal128, Document, Timestamp, datetime::DateTime, oid::ObjectId};
use regex::{Regex, RegexBuilder};

use docquery_core::error::{DocQueryError, DocQueryResult};

use crate::path::values_at;

/// Type-erased, comparable representation of BSON values.
///
/// Integers compare exactly with each other and against doubles, so `Int32(3)`, `Int64(3)` and
/// `Double(3.0)` are equal while distinct longs beyond the exact range of a double stay distinct.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Lower bound of every value
    MinKey,
    /// Null value
    Null,
    /// Int32 or Int64 value
    Integer(i64),
    /// Double value
    Double(f64),
    /// Decimal128 value, compared by its encoding
    Decimal(Decimal128),
    /// String or symbol value
    String(&'a str),
    /// Embedded document, fields in stored order
    Map(Vec<(&'a str, Comparable<'a>)>),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Binary data
    Binary(&'a Binary),
    /// Object identifier
    ObjectId(ObjectId),
    /// Boolean value
    Bool(bool),
    /// DateTime value
    DateTime(DateTime),
    /// Internal timestamp
    Timestamp(Timestamp),
    /// Any other BSON value, compared structurally
    Other(&'a Bson),
    /// Upper bound of every value
    MaxKey,
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::MinKey => Comparable::MinKey,
            Bson::MaxKey => Comparable::MaxKey,
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Integer(i64::from(*value)),
            Bson::Int64(value) => Comparable::Integer(*value),
            Bson::Double(value) => Comparable::Double(*value),
            Bson::Decimal128(value) => Comparable::Decimal(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::Timestamp(value) => Comparable::Timestamp(*value),
            Bson::String(value) | Bson::Symbol(value) => Comparable::String(value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::Binary(value) => Comparable::Binary(value),
            Bson::Array(arr) => Comparable::Array(arr.iter().map(Comparable::from).collect()),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect(),
            ),
            other => Comparable::Other(other),
        }
    }
}

impl<'a> Comparable<'a> {
    /// Position of this value's type in the cross-type sort order.
    fn rank(&self) -> u8 {
        match self {
            Comparable::MinKey => 0,
            Comparable::Null => 1,
            Comparable::Integer(_) | Comparable::Double(_) | Comparable::Decimal(_) => 2,
            Comparable::String(_) => 3,
            Comparable::Map(_) => 4,
            Comparable::Array(_) => 5,
            Comparable::Binary(_) => 6,
            Comparable::ObjectId(_) => 7,
            Comparable::Bool(_) => 8,
            Comparable::DateTime(_) => 9,
            Comparable::Timestamp(_) => 10,
            Comparable::Other(Bson::RegularExpression(_)) => 11,
            Comparable::Other(_) => 12,
            Comparable::MaxKey => 13,
        }
    }

    /// Total order used for sorting; values of different types order by type.
    pub(crate) fn total_cmp(&self, other: &Self) -> Ordering {
        self.rank()
            .cmp(&other.rank())
            .then_with(|| self.partial_cmp(other).unwrap_or(Ordering::Equal))
    }
}

/// Exact comparison of an integer with a double. NaN is unordered.
fn cmp_integer_double(integer: i64, double: f64) -> Option<Ordering> {
    if double.is_nan() {
        return None;
    }
    // 2^63 is exactly representable; every i64 is below it and at or above its negation.
    if double >= 9_223_372_036_854_775_808.0 {
        return Some(Ordering::Less);
    }
    if double < -9_223_372_036_854_775_808.0 {
        return Some(Ordering::Greater);
    }

    let whole = double.trunc();
    Some(integer.cmp(&(whole as i64)).then_with(|| {
        let fraction = double - whole;
        if fraction > 0.0 {
            Ordering::Less
        } else if fraction < 0.0 {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }))
}

fn cmp_binary(a: &Binary, b: &Binary) -> Ordering {
    a.bytes
        .len()
        .cmp(&b.bytes.len())
        .then_with(|| u8::from(a.subtype).cmp(&u8::from(b.subtype)))
        .then_with(|| a.bytes.cmp(&b.bytes))
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Decimal(a), Comparable::Decimal(b)) => a.bytes() == b.bytes(),
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => self.partial_cmp(other) == Some(Ordering::Equal),
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::MinKey, Comparable::MinKey)
            | (Comparable::MaxKey, Comparable::MaxKey)
            | (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Integer(a), Comparable::Integer(b)) => a.partial_cmp(b),
            (Comparable::Double(a), Comparable::Double(b)) => a.partial_cmp(b),
            (Comparable::Integer(a), Comparable::Double(b)) => cmp_integer_double(*a, *b),
            (Comparable::Double(a), Comparable::Integer(b)) => {
                cmp_integer_double(*b, *a).map(Ordering::reverse)
            }
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::Timestamp(a), Comparable::Timestamp(b)) => {
                (a.time, a.increment).partial_cmp(&(b.time, b.increment))
            }
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            (Comparable::Binary(a), Comparable::Binary(b)) => Some(cmp_binary(a, b)),
            (Comparable::Array(a), Comparable::Array(b)) => Some(
                a.iter()
                    .zip(b)
                    .map(|(x, y)| x.total_cmp(y))
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or_else(|| a.len().cmp(&b.len())),
            ),
            (Comparable::Map(a), Comparable::Map(b)) => Some(
                a.iter()
                    .zip(b)
                    .map(|((xk, xv), (yk, yv))| {
                        xv.rank()
                            .cmp(&yv.rank())
                            .then_with(|| xk.cmp(yk))
                            .then_with(|| xv.total_cmp(yv))
                    })
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or_else(|| a.len().cmp(&b.len())),
            ),
            _ => None,
        }
    }
}

/// Returns `true` if two BSON values are equal under numeric normalization.
pub(crate) fn bson_eq(left: &Bson, right: &Bson) -> bool {
    Comparable::from(left) == Comparable::from(right)
}

/// Evaluates filter documents against a single stored document.
pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Returns `true` if the document satisfies every clause of `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`DocQueryError::Execution`] for unknown operators and malformed operands.
    pub fn evaluate(&self, filter: &Document) -> DocQueryResult<bool> {
        for (key, condition) in filter {
            let matched = match key.as_str() {
                "$and" => {
                    let mut all = true;
                    for clause in clauses(key, condition)? {
                        if !self.evaluate(clause)? {
                            all = false;
                            break;
                        }
                    }
                    all
                }
                "$or" => {
                    let mut any = false;
                    for clause in clauses(key, condition)? {
                        if self.evaluate(clause)? {
                            any = true;
                            break;
                        }
                    }
                    any
                }
                "$nor" => {
                    let mut none = true;
                    for clause in clauses(key, condition)? {
                        if self.evaluate(clause)? {
                            none = false;
                            break;
                        }
                    }
                    none
                }
                op if op.starts_with('$') => {
                    return Err(DocQueryError::Execution(format!(
                        "unknown top level operator: {op}"
                    )));
                }
                field => self.evaluate_field(field, condition)?,
            };

            if !matched {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Returns the documents of `documents` that satisfy `filter`, in their original order.
    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Document>,
        filter: &Document,
    ) -> DocQueryResult<Vec<Document>> {
        let mut matched = Vec::new();

        for document in documents {
            if DocumentEvaluator::new(document).evaluate(filter)? {
                matched.push(document.clone());
            }
        }

        Ok(matched)
    }

    fn evaluate_field(&self, field: &str, condition: &Bson) -> DocQueryResult<bool> {
        let values = values_at(self.document, field);

        match condition {
            Bson::Document(operators) if is_operator_document(operators) => {
                for (op, operand) in operators {
                    if op == "$options" {
                        continue;
                    }

                    if !evaluate_operator(&values, op, operand, operators)? {
                        return Ok(false);
                    }
                }

                Ok(true)
            }
            _ => Ok(equals_any(&values, condition)),
        }
    }
}

fn clauses<'b>(key: &str, condition: &'b Bson) -> DocQueryResult<Vec<&'b Document>> {
    let items = match condition {
        Bson::Array(items) if !items.is_empty() => items,
        _ => {
            return Err(DocQueryError::Execution(format!(
                "{key} argument must be a non-empty array"
            )));
        }
    };

    items
        .iter()
        .map(|item| match item {
            Bson::Document(clause) => Ok(clause),
            _ => Err(DocQueryError::Execution(format!(
                "{key} argument's entries must be objects"
            ))),
        })
        .collect()
}

fn is_operator_document(document: &Document) -> bool {
    document.keys().next().is_some_and(|key| key.starts_with('$'))
}

fn evaluate_operator(
    values: &[&Bson],
    op: &str,
    operand: &Bson,
    operators: &Document,
) -> DocQueryResult<bool> {
    match op {
        "$eq" => Ok(equals_any(values, operand)),
        "$ne" => Ok(!equals_any(values, operand)),
        "$gt" => Ok(compares_any(values, operand, |o| o == Ordering::Greater)),
        "$gte" => Ok(compares_any(values, operand, |o| o != Ordering::Less)),
        "$lt" => Ok(compares_any(values, operand, |o| o == Ordering::Less)),
        "$lte" => Ok(compares_any(values, operand, |o| o != Ordering::Greater)),
        "$in" => Ok(set_operand(op, operand)?
            .iter()
            .any(|candidate| equals_any(values, candidate))),
        "$nin" => Ok(!set_operand(op, operand)?
            .iter()
            .any(|candidate| equals_any(values, candidate))),
        "$exists" => Ok(values.is_empty() != is_truthy(operand)),
        "$regex" => {
            let regex = compile_regex(operand, operators.get("$options"))?;

            Ok(any_element(values, |value| match value {
                Bson::String(text) => regex.is_match(text),
                _ => false,
            }))
        }
        _ => Err(DocQueryError::Execution(format!("unknown operator: {op}"))),
    }
}

/// Applies `predicate` to each value and, for array values, to each of their elements.
fn any_element(values: &[&Bson], predicate: impl Fn(&Bson) -> bool) -> bool {
    values.iter().any(|value| {
        predicate(value)
            || match value {
                Bson::Array(items) => items.iter().any(&predicate),
                _ => false,
            }
    })
}

fn equals_any(values: &[&Bson], operand: &Bson) -> bool {
    if values.is_empty() {
        return matches!(operand, Bson::Null);
    }

    let expected = Comparable::from(operand);

    any_element(values, |value| Comparable::from(value) == expected)
}

fn compares_any(values: &[&Bson], operand: &Bson, accept: impl Fn(Ordering) -> bool) -> bool {
    let bound = Comparable::from(operand);

    any_element(values, |value| {
        Comparable::from(value)
            .partial_cmp(&bound)
            .is_some_and(&accept)
    })
}

fn set_operand<'b>(op: &str, operand: &'b Bson) -> DocQueryResult<&'b [Bson]> {
    match operand {
        Bson::Array(items) => Ok(items),
        _ => Err(DocQueryError::Execution(format!("{op} needs an array"))),
    }
}

fn is_truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(value) => *value,
        Bson::Int32(value) => *value != 0,
        Bson::Int64(value) => *value != 0,
        Bson::Double(value) => *value != 0.0,
        Bson::Null => false,
        _ => true,
    }
}

fn compile_regex(pattern: &Bson, options: Option<&Bson>) -> DocQueryResult<Regex> {
    let pattern = match pattern {
        Bson::String(pattern) => pattern,
        _ => {
            return Err(DocQueryError::Execution(
                "$regex has to be a string".to_string(),
            ));
        }
    };
    let options = match options {
        Some(Bson::String(options)) => options.as_str(),
        _ => "",
    };

    RegexBuilder::new(pattern)
        .case_insensitive(options.contains('i'))
        .multi_line(options.contains('m'))
        .dot_matches_new_line(options.contains('s'))
        .ignore_whitespace(options.contains('x'))
        .build()
        .map_err(|e| DocQueryError::Execution(format!("invalid regular expression: {e}")))
}

/// Stable, compound sort of `documents` by a sort specification such as `{"age": -1, "name": 1}`.
///
/// Missing fields sort as null.
pub(crate) fn sort_documents(documents: &mut [Document], sort: &Document) -> DocQueryResult<()> {
    let keys = sort
        .iter()
        .map(|(field, direction)| match direction_of(direction) {
            Some(descending) => Ok((field.as_str(), descending)),
            None => Err(DocQueryError::Execution(format!(
                "invalid sort direction for field '{field}'"
            ))),
        })
        .collect::<DocQueryResult<Vec<_>>>()?;

    documents.sort_by(|a, b| {
        keys.iter().fold(Ordering::Equal, |ordering, (field, descending)| {
            ordering.then_with(|| {
                let left = sort_value(a, field);
                let right = sort_value(b, field);
                let ordering = left.total_cmp(&right);

                if *descending { ordering.reverse() } else { ordering }
            })
        })
    });

    Ok(())
}

fn sort_value<'d>(document: &'d Document, field: &str) -> Comparable<'d> {
    values_at(document, field)
        .first()
        .map(|value| Comparable::from(*value))
        .unwrap_or(Comparable::Null)
}

/// Returns `Some(true)` for a descending direction and `Some(false)` for an ascending one.
fn direction_of(direction: &Bson) -> Option<bool> {
    let value = match direction {
        Bson::Int32(value) => *value as i64,
        Bson::Int64(value) => *value,
        Bson::Double(value) => *value as i64,
        _ => return None,
    };

    match value {
        1 => Some(false),
        -1 => Some(true),
        _ => None,
    }
}
