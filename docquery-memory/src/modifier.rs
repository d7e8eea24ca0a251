//! Application of update documents (`$set`, `$inc`, `$push`, `$pull`, `$unset`) to stored
//! documents, and seeding of upserted documents from a filter.

use bson::{Bson, Document, oid::ObjectId};

use docquery_core::{
    collection::ID_FIELD,
    error::{DocQueryError, DocQueryResult},
};

use crate::{
    evaluator::bson_eq,
    path::{get_path, parent_mut, remove_path, set_path},
};

/// Checks that `update` only holds known update operators, each with a document of fields.
pub(crate) fn validate_update(update: &Document) -> DocQueryResult<()> {
    if update.is_empty() {
        return Err(DocQueryError::Execution(
            "update document must not be empty".to_string(),
        ));
    }

    for (op, fields) in update {
        match op.as_str() {
            "$set" | "$inc" | "$push" | "$pull" | "$unset" => {}
            op if op.starts_with('$') => {
                return Err(DocQueryError::Execution(format!(
                    "unknown update operator: {op}"
                )));
            }
            _ => {
                return Err(DocQueryError::Execution(
                    "update document must contain only update operators".to_string(),
                ));
            }
        }

        if !matches!(fields, Bson::Document(_)) {
            return Err(DocQueryError::Execution(format!(
                "modifiers for {op} must be an object"
            )));
        }
    }

    Ok(())
}

/// Applies `update` to `document` in place.
///
/// Returns `true` if the document changed. An existing `_id` is immutable: an update that would
/// change or remove it fails. On error the document may be partially updated; callers apply
/// updates to a copy.
pub(crate) fn apply_update(document: &mut Document, update: &Document) -> DocQueryResult<bool> {
    validate_update(update)?;

    let before = document.clone();

    for (op, fields) in update {
        let Bson::Document(fields) = fields else {
            continue;
        };

        for (path, value) in fields {
            match op.as_str() {
                "$set" => set_path(document, path, value.clone())?,
                "$inc" => increment(document, path, value)?,
                "$push" => push(document, path, value)?,
                "$pull" => pull(document, path, value)?,
                "$unset" => {
                    remove_path(document, path)?;
                }
                _ => {}
            }
        }
    }

    if before.contains_key(ID_FIELD) && document.get(ID_FIELD) != before.get(ID_FIELD) {
        return Err(DocQueryError::Execution(format!(
            "performing an update on the path '{ID_FIELD}' would modify the immutable field '{ID_FIELD}'"
        )));
    }

    Ok(*document != before)
}

fn increment(document: &mut Document, path: &str, delta: &Bson) -> DocQueryResult<()> {
    if !is_number(delta) {
        return Err(DocQueryError::Execution(format!(
            "cannot increment with non-numeric argument: {{{path}: {delta}}}"
        )));
    }

    let current = get_path(document, path).cloned();
    let updated = match current {
        None => delta.clone(),
        Some(current) => add_numbers(&current, delta).ok_or_else(|| {
            DocQueryError::Execution(format!(
                "cannot apply $inc to a value of non-numeric type at '{path}'"
            ))
        })?,
    };

    set_path(document, path, updated)
}

fn is_number(value: &Bson) -> bool {
    matches!(value, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_))
}

fn add_numbers(left: &Bson, right: &Bson) -> Option<Bson> {
    match (left, right) {
        (Bson::Int32(a), Bson::Int32(b)) => Some(
            a.checked_add(*b)
                .map(Bson::Int32)
                .unwrap_or(Bson::Int64(*a as i64 + *b as i64)),
        ),
        (Bson::Int32(a), Bson::Int64(b)) => Some(Bson::Int64(*a as i64 + b)),
        (Bson::Int64(a), Bson::Int32(b)) => Some(Bson::Int64(a + *b as i64)),
        (Bson::Int64(a), Bson::Int64(b)) => Some(Bson::Int64(a + b)),
        (Bson::Double(a), other) => as_f64(other).map(|b| Bson::Double(a + b)),
        (other, Bson::Double(b)) => as_f64(other).map(|a| Bson::Double(a + b)),
        _ => None,
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(value) => Some(*value as f64),
        Bson::Int64(value) => Some(*value as f64),
        Bson::Double(value) => Some(*value),
        _ => None,
    }
}

/// Returns the values carried by a `{"$each": [...]}` / `{"$in": [...]}` modifier, or the bare
/// value itself.
fn modifier_values(value: &Bson, modifier: &str) -> DocQueryResult<Vec<Bson>> {
    match value {
        Bson::Document(inner) if inner.contains_key(modifier) => match inner.get(modifier) {
            Some(Bson::Array(items)) => Ok(items.clone()),
            _ => Err(DocQueryError::Execution(format!(
                "the argument to {modifier} must be an array"
            ))),
        },
        other => Ok(vec![other.clone()]),
    }
}

fn push(document: &mut Document, path: &str, value: &Bson) -> DocQueryResult<()> {
    let values = modifier_values(value, "$each")?;

    if let Some((parent, field)) = parent_mut(document, path, true)? {
        match parent.get_mut(field) {
            None => {
                parent.insert(field, Bson::Array(values));
            }
            Some(Bson::Array(items)) => items.extend(values),
            Some(_) => {
                return Err(DocQueryError::Execution(format!(
                    "the field '{path}' must be an array"
                )));
            }
        }
    }

    Ok(())
}

fn pull(document: &mut Document, path: &str, value: &Bson) -> DocQueryResult<()> {
    let values = modifier_values(value, "$in")?;

    if let Some((parent, field)) = parent_mut(document, path, false)? {
        match parent.get_mut(field) {
            None => {}
            Some(Bson::Array(items)) => {
                items.retain(|item| !values.iter().any(|value| bson_eq(item, value)));
            }
            Some(_) => {
                return Err(DocQueryError::Execution(format!(
                    "cannot apply $pull to a non-array value at '{path}'"
                )));
            }
        }
    }

    Ok(())
}

/// Builds the document an upsert inserts when nothing matched `filter`.
///
/// Equality conditions of the filter (`{f: v}`, `{f: {"$eq": v}}`, and those nested in `$and`)
/// seed the document, `update` is applied on top, and an `_id` is generated if none was given.
pub(crate) fn upsert_document(filter: &Document, update: &Document) -> DocQueryResult<Document> {
    let mut seed = Document::new();
    seed_from_filter(filter, &mut seed)?;
    apply_update(&mut seed, update)?;

    Ok(with_identifier(seed))
}

/// Moves `_id` to the front of `document`, generating an [`ObjectId`] if it has none.
pub(crate) fn with_identifier(mut document: Document) -> Document {
    let id = document
        .remove(ID_FIELD)
        .unwrap_or_else(|| Bson::ObjectId(ObjectId::new()));

    let mut identified = Document::new();
    identified.insert(ID_FIELD, id);

    for (key, value) in document {
        identified.insert(key, value);
    }

    identified
}

fn seed_from_filter(filter: &Document, seed: &mut Document) -> DocQueryResult<()> {
    for (key, condition) in filter {
        if key == "$and" {
            if let Bson::Array(clauses) = condition {
                for clause in clauses {
                    if let Bson::Document(clause) = clause {
                        seed_from_filter(clause, seed)?;
                    }
                }
            }
            continue;
        }

        if key.starts_with('$') {
            continue;
        }

        match condition {
            Bson::Document(operators) if operators.keys().any(|k| k.starts_with('$')) => {
                if let Some(value) = operators.get("$eq") {
                    set_path(seed, key, value.clone())?;
                }
            }
            value => set_path(seed, key, value.clone())?,
        }
    }

    Ok(())
}
