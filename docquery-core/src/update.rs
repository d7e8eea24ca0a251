//! Update expression construction.
//!
//! An [`Update`] records update operations in call order. They compile into a single update
//! document grouped by operator:
//!
//! - `set` → `{"$set": {field: value}}`
//! - `inc` → `{"$inc": {field: delta}}`
//! - `push` → `{"$push": {field: {"$each": [values]}}}`
//! - `pull` → `{"$pull": {field: {"$in": [values]}}}`
//! - `unset` → `{"$unset": {field: ""}}`
//!
//! Within an operator, a repeated `set`, `inc` or `unset` of the same field replaces the earlier
//! entry, while repeated `push` and `pull` on the same field extend its value list.

use bson::{Bson, Document};

use crate::compile;

/// A single queued update operation.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// Sets `field` to `value`, creating it if absent.
    Set { field: String, value: Bson },
    /// Adds `delta` to the numeric `field`, creating it if absent.
    Inc { field: String, delta: Bson },
    /// Appends every value to the array `field`, each as its own element.
    Push { field: String, values: Vec<Bson> },
    /// Removes every element of the array `field` equal to any of `values`.
    Pull { field: String, values: Vec<Bson> },
    /// Removes `field` from the document.
    Unset { field: String },
}

impl UpdateOp {
    /// Returns the update operator this operation compiles under.
    pub fn operator(&self) -> &'static str {
        match self {
            UpdateOp::Set { .. } => "$set",
            UpdateOp::Inc { .. } => "$inc",
            UpdateOp::Push { .. } => "$push",
            UpdateOp::Pull { .. } => "$pull",
            UpdateOp::Unset { .. } => "$unset",
        }
    }

    /// Returns the field this operation targets.
    pub fn field(&self) -> &str {
        match self {
            UpdateOp::Set { field, .. }
            | UpdateOp::Inc { field, .. }
            | UpdateOp::Push { field, .. }
            | UpdateOp::Pull { field, .. }
            | UpdateOp::Unset { field } => field,
        }
    }
}

/// Ordered list of update operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    ops: Vec<UpdateOp>,
}

impl Update {
    pub fn new() -> Self {
        Update { ops: Vec::new() }
    }

    /// Returns the queued operations in call order.
    pub fn ops(&self) -> &[UpdateOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Compiles the queued operations into an update document.
    pub fn to_document(&self) -> Document {
        compile::render_update(&self.ops)
    }
}

/// Chainable update vocabulary shared by every value that accumulates update operations.
pub trait UpdateBuilder: Sized {
    /// Appends an update operation.
    fn with_op(self, op: UpdateOp) -> Self;

    /// Sets `field` to `value`.
    fn set(self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.with_op(UpdateOp::Set { field: field.into(), value: value.into() })
    }

    /// Increments the numeric `field` by `delta`. A negative delta decrements.
    fn inc(self, field: impl Into<String>, delta: impl Into<Bson>) -> Self {
        self.with_op(UpdateOp::Inc { field: field.into(), delta: delta.into() })
    }

    /// Appends each of `values` to the array `field`.
    fn push<V>(self, field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self
    where
        V: Into<Bson>,
    {
        self.with_op(UpdateOp::Push { field: field.into(), values: into_values(values) })
    }

    /// Removes all elements of the array `field` that equal any of `values`.
    fn pull<V>(self, field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self
    where
        V: Into<Bson>,
    {
        self.with_op(UpdateOp::Pull { field: field.into(), values: into_values(values) })
    }

    /// Removes `field` from matched documents.
    fn unset(self, field: impl Into<String>) -> Self {
        self.with_op(UpdateOp::Unset { field: field.into() })
    }
}

impl UpdateBuilder for Update {
    fn with_op(mut self, op: UpdateOp) -> Self {
        self.ops.push(op);
        self
    }
}

fn into_values<V: Into<Bson>>(values: impl IntoIterator<Item = V>) -> Vec<Bson> {
    values.into_iter().map(Into::into).collect()
}
