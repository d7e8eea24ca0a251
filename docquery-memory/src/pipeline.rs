//! Aggregation pipeline execution over in-memory collections.

use std::collections::HashMap;

use bson::{Bson, Document};

use docquery_core::error::{DocQueryError, DocQueryResult};

use crate::{
    evaluator::{DocumentEvaluator, bson_eq, sort_documents},
    path::{get_path, set_path, values_at},
};

/// Runs `stages` in order over `documents`. Collections referenced by `$lookup` are read from
/// `collections`.
pub(crate) fn run_pipeline(
    documents: Vec<Document>,
    stages: &[Document],
    collections: &HashMap<String, Vec<Document>>,
) -> DocQueryResult<Vec<Document>> {
    stages
        .iter()
        .try_fold(documents, |documents, stage| run_stage(documents, stage, collections))
}

fn run_stage(
    documents: Vec<Document>,
    stage: &Document,
    collections: &HashMap<String, Vec<Document>>,
) -> DocQueryResult<Vec<Document>> {
    let mut entries = stage.iter();
    let (name, body) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        _ => {
            return Err(DocQueryError::Execution(
                "a pipeline stage specification must contain exactly one field".to_string(),
            ));
        }
    };

    match name.as_str() {
        "$match" => DocumentEvaluator::filter_documents(&documents, stage_document(name, body)?),
        "$sort" => {
            let mut documents = documents;
            sort_documents(&mut documents, stage_document(name, body)?)?;
            Ok(documents)
        }
        "$limit" => match stage_count(name, body)? {
            0 => Err(DocQueryError::Execution(
                "the limit must be positive".to_string(),
            )),
            limit => Ok(documents.into_iter().take(limit).collect()),
        },
        "$skip" => {
            let skip = stage_count(name, body)?;
            Ok(documents.into_iter().skip(skip).collect())
        }
        "$lookup" => lookup(documents, stage_document(name, body)?, collections),
        "$unwind" => unwind(documents, body),
        _ => Err(DocQueryError::Execution(format!(
            "unrecognized pipeline stage name: '{name}'"
        ))),
    }
}

fn stage_document<'s>(name: &str, body: &'s Bson) -> DocQueryResult<&'s Document> {
    match body {
        Bson::Document(document) => Ok(document),
        _ => Err(DocQueryError::Execution(format!(
            "the {name} stage specification must be an object"
        ))),
    }
}

fn stage_count(name: &str, body: &Bson) -> DocQueryResult<usize> {
    let count = match body {
        Bson::Int32(value) => *value as i64,
        Bson::Int64(value) => *value,
        Bson::Double(value) if value.fract() == 0.0 => *value as i64,
        _ => {
            return Err(DocQueryError::Execution(format!(
                "invalid argument to {name} stage: expected a number"
            )));
        }
    };

    usize::try_from(count).map_err(|_| {
        DocQueryError::Execution(format!(
            "invalid argument to {name} stage: expected a non-negative number"
        ))
    })
}

fn lookup(
    documents: Vec<Document>,
    body: &Document,
    collections: &HashMap<String, Vec<Document>>,
) -> DocQueryResult<Vec<Document>> {
    let field = |name: &str| {
        body.get_str(name).map_err(|_| {
            DocQueryError::Execution(format!("$lookup argument '{name}' must be a string"))
        })
    };
    let from = field("from")?;
    let local_field = field("localField")?;
    let foreign_field = field("foreignField")?;
    let as_field = field("as")?;

    let foreign = collections.get(from).map(Vec::as_slice).unwrap_or_default();

    documents
        .into_iter()
        .map(|mut document| -> DocQueryResult<Document> {
            let local = join_keys(&document, local_field);
            let joined = foreign
                .iter()
                .filter(|candidate| {
                    join_keys(candidate, foreign_field)
                        .iter()
                        .any(|key| local.iter().any(|local| bson_eq(key, local)))
                })
                .cloned()
                .map(Bson::Document)
                .collect::<Vec<_>>();

            set_path(&mut document, as_field, Bson::Array(joined))?;
            Ok(document)
        })
        .collect()
}

/// Values a document contributes to a join: array fields contribute each element and a missing
/// field joins as null.
fn join_keys(document: &Document, path: &str) -> Vec<Bson> {
    let values = values_at(document, path);

    if values.is_empty() {
        return vec![Bson::Null];
    }

    values
        .into_iter()
        .flat_map(|value| match value {
            Bson::Array(items) => items.clone(),
            other => vec![other.clone()],
        })
        .collect()
}

fn unwind(documents: Vec<Document>, body: &Bson) -> DocQueryResult<Vec<Document>> {
    let (path, preserve) = match body {
        Bson::String(path) => (path.as_str(), false),
        Bson::Document(options) => (
            options.get_str("path").map_err(|_| {
                DocQueryError::Execution("$unwind requires a path".to_string())
            })?,
            options
                .get_bool("preserveNullAndEmptyArrays")
                .unwrap_or(false),
        ),
        _ => {
            return Err(DocQueryError::Execution(
                "expected either a string or an object as specification for $unwind stage"
                    .to_string(),
            ));
        }
    };
    let field = path.strip_prefix('$').ok_or_else(|| {
        DocQueryError::Execution(format!(
            "path option to $unwind stage should be prefixed with a '$': {path}"
        ))
    })?;

    let mut unwound = Vec::with_capacity(documents.len());

    for document in documents {
        match get_path(&document, field).cloned() {
            Some(Bson::Array(items)) if !items.is_empty() => {
                for item in items {
                    let mut copy = document.clone();
                    set_path(&mut copy, field, item)?;
                    unwound.push(copy);
                }
            }
            None | Some(Bson::Null) | Some(Bson::Array(_)) => {
                if preserve {
                    unwound.push(document);
                }
            }
            Some(_) => unwound.push(document),
        }
    }

    Ok(unwound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn collections() -> HashMap<String, Vec<Document>> {
        HashMap::from([(
            "cars".to_string(),
            vec![
                doc! { "_id": 1, "owner": "trevor", "color": "red" },
                doc! { "_id": 2, "owner": "trevor", "color": "blue" },
                doc! { "_id": 3, "owner": "rose", "color": "green" },
            ],
        )])
    }

    fn people() -> Vec<Document> {
        vec![
            doc! { "_id": "trevor", "age": 30 },
            doc! { "_id": "rose", "age": 25 },
            doc! { "_id": "ann", "age": 40 },
        ]
    }

    #[test]
    fn lookup_then_unwind() {
        let stages = vec![
            doc! { "$lookup": { "from": "cars", "localField": "_id", "foreignField": "owner", "as": "cars" } },
            doc! { "$unwind": "$cars" },
            doc! { "$sort": { "cars._id": 1 } },
        ];

        let output = run_pipeline(people(), &stages, &collections()).unwrap();
        let colors = output
            .iter()
            .map(|d| d.get_document("cars").unwrap().get_str("color").unwrap())
            .collect::<Vec<_>>();

        assert_eq!(colors, vec!["red", "blue", "green"]);
    }

    #[test]
    fn lookup_without_matches_yields_empty_array() {
        let stages = vec![
            doc! { "$match": { "_id": "ann" } },
            doc! { "$lookup": { "from": "cars", "localField": "_id", "foreignField": "owner", "as": "cars" } },
        ];

        let output = run_pipeline(people(), &stages, &collections()).unwrap();

        assert_eq!(output, vec![doc! { "_id": "ann", "age": 40, "cars": [] }]);
    }

    #[test]
    fn unwind_drops_empty_arrays_unless_preserved() {
        let documents = vec![doc! { "n": 1, "tags": [] }, doc! { "n": 2, "tags": ["a", "b"] }];

        let dropped = run_pipeline(documents.clone(), &[doc! { "$unwind": "$tags" }], &HashMap::new()).unwrap();
        assert_eq!(dropped.len(), 2);

        let kept = run_pipeline(
            documents,
            &[doc! { "$unwind": { "path": "$tags", "preserveNullAndEmptyArrays": true } }],
            &HashMap::new(),
        )
        .unwrap();
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn skip_and_limit_slice_in_stage_order() {
        let stages = vec![
            doc! { "$sort": { "age": 1 } },
            doc! { "$skip": 1_i64 },
            doc! { "$limit": 1_i64 },
        ];

        let output = run_pipeline(people(), &stages, &HashMap::new()).unwrap();

        assert_eq!(output, vec![doc! { "_id": "trevor", "age": 30 }]);
    }

    #[test]
    fn zero_limit_is_rejected() {
        let err = run_pipeline(people(), &[doc! { "$limit": 0_i64 }], &HashMap::new()).unwrap_err();

        assert!(matches!(err, DocQueryError::Execution(_)));
    }

    #[test]
    fn unknown_stage_is_rejected() {
        let err = run_pipeline(people(), &[doc! { "$facet": {} }], &HashMap::new()).unwrap_err();

        assert!(matches!(err, DocQueryError::Execution(_)));
    }
}
