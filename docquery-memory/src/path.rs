//! Dotted field path resolution over BSON documents.

use bson::{Bson, Document};

use docquery_core::error::{DocQueryError, DocQueryResult};

/// Collects every value addressed by `path`.
///
/// Arrays met along the way are traversed: a numeric segment indexes into the array, any other
/// segment is applied to each embedded document. A missing field yields no values.
pub(crate) fn values_at<'a>(document: &'a Document, path: &str) -> Vec<&'a Bson> {
    let segments = path.split('.').collect::<Vec<_>>();
    let mut out = Vec::new();

    if let Some((head, rest)) = segments.split_first() {
        if let Some(value) = document.get(*head) {
            resolve(value, rest, &mut out);
        }
    }

    out
}

fn resolve<'a>(value: &'a Bson, segments: &[&str], out: &mut Vec<&'a Bson>) {
    let Some((head, rest)) = segments.split_first() else {
        out.push(value);
        return;
    };

    match value {
        Bson::Document(document) => {
            if let Some(child) = document.get(*head) {
                resolve(child, rest, out);
            }
        }
        Bson::Array(items) => match head.parse::<usize>() {
            Ok(index) => {
                if let Some(item) = items.get(index) {
                    resolve(item, rest, out);
                }
            }
            Err(_) => {
                for item in items.iter().filter(|item| matches!(item, Bson::Document(_))) {
                    resolve(item, segments, out);
                }
            }
        },
        _ => {}
    }
}

/// Returns the single value stored at `path`, following embedded documents only.
pub(crate) fn get_path<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let (head, rest) = match path.split_once('.') {
        Some(split) => split,
        None => return document.get(path),
    };

    match document.get(head)? {
        Bson::Document(child) => get_path(child, rest),
        _ => None,
    }
}

/// Finds the document holding the last segment of `path`, and that segment.
///
/// With `create`, missing intermediate documents are inserted. Traversing through a value that
/// is not a document is an error when creating and yields `None` otherwise.
pub(crate) fn parent_mut<'d, 'p>(
    document: &'d mut Document,
    path: &'p str,
    create: bool,
) -> DocQueryResult<Option<(&'d mut Document, &'p str)>> {
    let Some((head, rest)) = path.split_once('.') else {
        return Ok(Some((document, path)));
    };

    if !document.contains_key(head) {
        if !create {
            return Ok(None);
        }

        document.insert(head, Document::new());
    }

    match document.get_mut(head) {
        Some(Bson::Document(child)) => parent_mut(child, rest, create),
        _ if !create => Ok(None),
        _ => Err(DocQueryError::Execution(format!(
            "cannot create field '{rest}' in element '{head}' which is not a document"
        ))),
    }
}

/// Stores `value` at `path`, creating intermediate documents as needed.
pub(crate) fn set_path(document: &mut Document, path: &str, value: Bson) -> DocQueryResult<()> {
    if let Some((parent, field)) = parent_mut(document, path, true)? {
        parent.insert(field, value);
    }

    Ok(())
}

/// Removes the value at `path`, returning it if it existed.
pub(crate) fn remove_path(document: &mut Document, path: &str) -> DocQueryResult<Option<Bson>> {
    Ok(parent_mut(document, path, false)?.and_then(|(parent, field)| parent.remove(field)))
}
