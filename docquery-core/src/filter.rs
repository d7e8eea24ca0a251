//! Predicate construction for queries and `$match` stages.
//!
//! A [`Filter`] is an ordered list of [`Term`]s that are always combined with logical AND. There is
//! deliberately no OR or nesting: a filter with zero terms matches every document, a filter with N
//! terms matches a document iff all N terms hold.
//!
//! The comparison methods live on the [`FilterBuilder`] trait so that the same vocabulary is
//! available on a bare [`Filter`] and on a collection-bound [`Query`](crate::query::Query).
//!
//! ```ignore
//! use docquery::prelude::*;
//!
//! let adults_named_trevor = Filter::new()
//!     .eq("name", "Trevor")
//!     .gte("age", 18)
//!     .none_of("status", ["banned", "deleted"]);
//! ```

use bson::{Bson, Document};

use crate::compile;

/// Field comparison operators for predicate terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    /// Equal to (exact match).
    Eq,
    /// Not equal to.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
    /// Equal to any of the values in a set.
    In,
    /// Equal to none of the values in a set.
    NotIn,
    /// Matches a regular expression pattern.
    Regex,
}

impl FieldOp {
    /// Returns the query operator this comparison compiles to.
    pub fn operator(&self) -> &'static str {
        match self {
            FieldOp::Eq => "$eq",
            FieldOp::Ne => "$ne",
            FieldOp::Gt => "$gt",
            FieldOp::Gte => "$gte",
            FieldOp::Lt => "$lt",
            FieldOp::Lte => "$lte",
            FieldOp::In => "$in",
            FieldOp::NotIn => "$nin",
            FieldOp::Regex => "$regex",
        }
    }
}

/// One `(field, operator, operand)` condition of a filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    /// Dotted path of the field to compare.
    pub field: String,
    /// The comparison operator.
    pub op: FieldOp,
    /// The operand. Set operators carry a `Bson::Array`.
    pub value: Bson,
}

impl Term {
    /// Creates a new predicate term.
    pub fn new(field: impl Into<String>, op: FieldOp, value: impl Into<Bson>) -> Self {
        Term { field: field.into(), op, value: value.into() }
    }
}

/// Conjunctive set of predicate terms.
///
/// Field paths and operand types are not validated; mistakes surface when the backend executes
/// the compiled filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    terms: Vec<Term>,
}

impl Filter {
    /// Creates an empty filter that matches every document.
    pub fn new() -> Self {
        Filter { terms: Vec::new() }
    }

    /// Returns the accumulated terms in insertion order.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Returns `true` if no term has been added.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Returns the number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Compiles this filter into a query document.
    ///
    /// An empty filter compiles to `{}`, otherwise to `{"$and": [...]}`.
    pub fn to_document(&self) -> Document {
        compile::render_filter(&self.terms)
    }
}

impl FromIterator<Term> for Filter {
    fn from_iter<I: IntoIterator<Item = Term>>(iter: I) -> Self {
        Filter { terms: iter.into_iter().collect() }
    }
}

/// Chainable predicate vocabulary shared by every value that accumulates filter terms.
///
/// Implementors only provide [`with_term`](FilterBuilder::with_term); each comparison appends one
/// term and hands back the extended value.
pub trait FilterBuilder: Sized {
    /// Appends a term to the filter.
    fn with_term(self, term: Term) -> Self;

    /// Matches documents where `field` equals `value`.
    fn eq(self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.with_term(Term::new(field, FieldOp::Eq, value))
    }

    /// Matches documents where `field` does not equal `value`.
    fn ne(self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.with_term(Term::new(field, FieldOp::Ne, value))
    }

    /// Matches documents where `field` is greater than `value`.
    fn gt(self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.with_term(Term::new(field, FieldOp::Gt, value))
    }

    /// Matches documents where `field` is greater than or equal to `value`.
    fn gte(self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.with_term(Term::new(field, FieldOp::Gte, value))
    }

    /// Matches documents where `field` is less than `value`.
    fn lt(self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.with_term(Term::new(field, FieldOp::Lt, value))
    }

    /// Matches documents where `field` is less than or equal to `value`.
    fn lte(self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.with_term(Term::new(field, FieldOp::Lte, value))
    }

    /// Matches documents where `field` equals any of `values`.
    fn any_of<V>(self, field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self
    where
        V: Into<Bson>,
    {
        self.with_term(Term::new(field, FieldOp::In, collect_array(values)))
    }

    /// Matches documents where `field` equals none of `values`.
    fn none_of<V>(self, field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self
    where
        V: Into<Bson>,
    {
        self.with_term(Term::new(field, FieldOp::NotIn, collect_array(values)))
    }

    /// Matches documents where the string `field` matches the regular expression `pattern`.
    fn regex(self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.with_term(Term::new(field, FieldOp::Regex, pattern.into()))
    }
}

impl FilterBuilder for Filter {
    fn with_term(mut self, term: Term) -> Self {
        self.terms.push(term);
        self
    }
}

pub(crate) fn collect_array<V: Into<Bson>>(values: impl IntoIterator<Item = V>) -> Bson {
    Bson::Array(values.into_iter().map(Into::into).collect())
}
