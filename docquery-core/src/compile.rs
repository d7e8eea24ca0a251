//! Rendering of accumulated builder state into the documents a backend executes.
//!
//! Policies:
//!
//! - An empty term list renders to `{}`, which matches every document in scope.
//! - Sort keys render to an ordered document; a repeated key keeps its first position and takes
//!   the latest direction.
//! - Limit and offset are only rendered when greater than zero.

use bson::{Bson, Document, doc};

use crate::{
    backend::{CountOptions, FindOneOptions, FindOptions},
    filter::Term,
    pipeline::Stage,
    sort::Sort,
    update::UpdateOp,
};

/// Renders predicate terms into a filter document.
pub fn render_filter(terms: &[Term]) -> Document {
    if terms.is_empty() {
        return Document::new();
    }

    doc! {
        "$and": terms
            .iter()
            .map(|term| doc! { term.field.as_str(): { term.op.operator(): term.value.clone() } })
            .collect::<Vec<_>>(),
    }
}

/// Renders sort keys into a sort document, or `None` when there are no keys.
pub fn render_sort(keys: &[Sort]) -> Option<Document> {
    if keys.is_empty() {
        return None;
    }

    let mut sort = Document::new();
    for key in keys {
        sort.insert(key.field.as_str(), key.direction);
    }

    Some(sort)
}

/// Renders update operations into an update document grouped by operator.
pub fn render_update(ops: &[UpdateOp]) -> Document {
    let mut operators: Vec<(&'static str, Document)> = Vec::new();

    for op in ops {
        let index = match operators.iter().position(|(name, _)| *name == op.operator()) {
            Some(index) => index,
            None => {
                operators.push((op.operator(), Document::new()));
                operators.len() - 1
            }
        };
        let fields = &mut operators[index].1;

        match op {
            UpdateOp::Set { field, value } => {
                fields.insert(field.as_str(), value.clone());
            }
            UpdateOp::Inc { field, delta } => {
                fields.insert(field.as_str(), delta.clone());
            }
            UpdateOp::Push { field, values } => extend_modifier(fields, field, "$each", values),
            UpdateOp::Pull { field, values } => extend_modifier(fields, field, "$in", values),
            UpdateOp::Unset { field } => {
                fields.insert(field.as_str(), "");
            }
        }
    }

    operators
        .into_iter()
        .map(|(name, fields)| (name.to_string(), Bson::Document(fields)))
        .collect()
}

fn extend_modifier(fields: &mut Document, field: &str, modifier: &str, values: &[Bson]) {
    if let Some(Bson::Document(existing)) = fields.get_mut(field) {
        if let Some(Bson::Array(list)) = existing.get_mut(modifier) {
            list.extend(values.iter().cloned());
            return;
        }
    }

    fields.insert(field, doc! { modifier: values.to_vec() });
}

/// Renders pipeline stages into native stage documents.
pub fn render_pipeline(stages: &[Stage]) -> Vec<Document> {
    stages.iter().map(render_stage).collect()
}

fn render_stage(stage: &Stage) -> Document {
    match stage {
        Stage::Match(filter) => doc! { "$match": render_filter(filter.terms()) },
        Stage::Sort(key) => doc! { "$sort": { key.field.as_str(): key.direction } },
        Stage::Limit(limit) => doc! { "$limit": to_i64(*limit) },
        Stage::Skip(skip) => doc! { "$skip": to_i64(*skip) },
        Stage::Lookup { from, local_field, foreign_field, as_field } => doc! {
            "$lookup": {
                "from": from.as_str(),
                "localField": local_field.as_str(),
                "foreignField": foreign_field.as_str(),
                "as": as_field.as_str(),
            }
        },
        Stage::Unwind(field) => {
            let path = match field.starts_with('$') {
                true => field.clone(),
                false => format!("${field}"),
            };
            doc! { "$unwind": path }
        }
    }
}

/// Options for a multi-document find: sort, limit and offset.
pub fn find_options(sort: &[Sort], limit: u64, offset: u64) -> FindOptions {
    FindOptions {
        sort: render_sort(sort),
        limit: positive(limit),
        skip: positive(offset),
    }
}

/// Options for a single-document find: sort and offset. Limit does not apply.
pub fn find_one_options(sort: &[Sort], offset: u64) -> FindOneOptions {
    FindOneOptions {
        sort: render_sort(sort),
        skip: positive(offset),
    }
}

/// Options for a count: limit and offset. Sort does not apply.
pub fn count_options(limit: u64, offset: u64) -> CountOptions {
    CountOptions {
        limit: positive(limit),
        skip: positive(offset),
    }
}

fn positive(value: u64) -> Option<u64> {
    (value > 0).then_some(value)
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
