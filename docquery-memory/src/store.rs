//! In-memory storage implementation of the [`Backend`] trait.
//!
//! Collections are kept as vectors of BSON documents in insertion order behind an async-aware
//! read-write lock.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::Document;
use futures::{StreamExt, stream};
use mea::rwlock::RwLock;
use tracing::debug;

use docquery_core::{
    backend::{
        Backend, BackendBuilder, CountOptions, DeleteSummary, DocumentCursor, FindOneOptions,
        FindOptions, UpdateSummary,
    },
    collection::ID_FIELD,
    error::{DocQueryError, DocQueryResult},
};

use crate::{
    evaluator::{DocumentEvaluator, sort_documents},
    modifier::{apply_update, upsert_document, validate_update, with_identifier},
    pipeline::run_pipeline,
};

type StoreMap = HashMap<String, Vec<Document>>;

/// Thread-safe in-memory document database.
///
/// `InMemoryBackend` is cloneable and uses an `Arc`-wrapped internal state, allowing it to be
/// shared across async tasks. Clones share the same underlying data.
///
/// Every operation scans the whole collection; there are no indexes. Unique `_id` values are
/// checked by [`InMemoryBackend::insert_many`] only.
///
/// # Example
///
/// ```ignore
/// use docquery_memory::InMemoryBackend;
/// use docquery_core::database::Database;
///
/// let database = Database::new(InMemoryBackend::new());
/// let people = database.collection("people");
/// people.save(1, &doc! { "name": "Trevor" }).await?;
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryBackend {
    /// collection name -> documents in insertion order
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryBackend`.
    pub fn builder() -> InMemoryBackendBuilder {
        InMemoryBackendBuilder::default()
    }

    /// Appends raw documents to a collection, generating `_id` values where missing.
    ///
    /// # Errors
    ///
    /// Returns [`DocQueryError::Execution`] if a document reuses an existing `_id`; no document is
    /// inserted in that case.
    pub async fn insert_many(
        &self,
        collection: &str,
        documents: impl IntoIterator<Item = Document>,
    ) -> DocQueryResult<()> {
        let mut store = self.store.write().await;
        let stored = store.entry(collection.to_string()).or_default();
        let mut inserted: Vec<Document> = Vec::new();

        for document in documents {
            let document = with_identifier(document);
            let id = document.get(ID_FIELD);

            if stored.iter().chain(inserted.iter()).any(|existing| existing.get(ID_FIELD) == id) {
                return Err(DocQueryError::Execution(format!(
                    "duplicate key in collection '{collection}': {}",
                    id.map(ToString::to_string).unwrap_or_default()
                )));
            }

            inserted.push(document);
        }

        debug!(collection, count = inserted.len(), "inserted documents");

        stored.extend(inserted);

        Ok(())
    }

    /// Applies `update` to the matching documents, or inserts a seeded document when nothing
    /// matched and `upsert` is set.
    async fn update(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        upsert: bool,
        multi: bool,
    ) -> DocQueryResult<UpdateSummary> {
        validate_update(&update)?;

        let mut store = self.store.write().await;
        let stored = store.entry(collection.to_string()).or_default();

        let mut matched = Vec::new();
        for (index, document) in stored.iter().enumerate() {
            if DocumentEvaluator::new(document).evaluate(&filter)? {
                matched.push(index);

                if !multi {
                    break;
                }
            }
        }

        if matched.is_empty() {
            if !upsert {
                return Ok(UpdateSummary::default());
            }

            let document = upsert_document(&filter, &update)?;
            let upserted_id = document.get(ID_FIELD).cloned();

            stored.push(document);

            return Ok(UpdateSummary {
                matched_count: 0,
                modified_count: 0,
                upserted_id,
            });
        }

        let mut updated = Vec::with_capacity(matched.len());
        for index in &matched {
            let mut document = stored[*index].clone();
            let changed = apply_update(&mut document, &update)?;
            updated.push((*index, document, changed));
        }

        let mut modified_count = 0;
        for (index, document, changed) in updated {
            if changed {
                stored[index] = document;
                modified_count += 1;
            }
        }

        Ok(UpdateSummary {
            matched_count: matched.len() as u64,
            modified_count,
            upserted_id: None,
        })
    }

    async fn delete(&self, collection: &str, filter: Document, multi: bool) -> DocQueryResult<DeleteSummary> {
        let mut store = self.store.write().await;
        let Some(stored) = store.get_mut(collection) else {
            return Ok(DeleteSummary::default());
        };

        let mut doomed = Vec::new();
        for (index, document) in stored.iter().enumerate() {
            if DocumentEvaluator::new(document).evaluate(&filter)? {
                doomed.push(index);

                if !multi {
                    break;
                }
            }
        }

        for index in doomed.iter().rev() {
            stored.remove(*index);
        }

        let deleted_count = doomed.len() as u64;

        Ok(DeleteSummary { deleted_count })
    }

    async fn matching(
        &self,
        collection: &str,
        filter: &Document,
        sort: Option<&Document>,
    ) -> DocQueryResult<Vec<Document>> {
        let store = self.store.read().await;
        let Some(stored) = store.get(collection) else {
            return Ok(Vec::new());
        };

        let mut documents = DocumentEvaluator::filter_documents(stored, filter)?;

        if let Some(sort) = sort {
            sort_documents(&mut documents, sort)?;
        }

        Ok(documents)
    }
}

fn into_cursor(documents: Vec<Document>) -> DocumentCursor {
    stream::iter(documents.into_iter().map(Ok)).boxed()
}

fn window(documents: Vec<Document>, skip: Option<u64>, limit: Option<u64>) -> Vec<Document> {
    documents
        .into_iter()
        .skip(skip.unwrap_or(0) as usize)
        .take(limit.map(|limit| limit as usize).unwrap_or(usize::MAX))
        .collect()
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> DocQueryResult<DocumentCursor> {
        let documents = self
            .matching(collection, &filter, options.sort.as_ref())
            .await?;

        Ok(into_cursor(window(documents, options.skip, options.limit)))
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        options: FindOneOptions,
    ) -> DocQueryResult<Option<Document>> {
        let documents = self
            .matching(collection, &filter, options.sort.as_ref())
            .await?;

        Ok(window(documents, options.skip, Some(1)).into_iter().next())
    }

    async fn count(
        &self,
        collection: &str,
        filter: Document,
        options: CountOptions,
    ) -> DocQueryResult<u64> {
        let documents = self.matching(collection, &filter, None).await?;

        Ok(window(documents, options.skip, options.limit).len() as u64)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> DocQueryResult<UpdateSummary> {
        self.update(collection, filter, update, upsert, false).await
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> DocQueryResult<UpdateSummary> {
        self.update(collection, filter, update, upsert, true).await
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> DocQueryResult<DeleteSummary> {
        self.delete(collection, filter, false).await
    }

    async fn delete_many(&self, collection: &str, filter: Document) -> DocQueryResult<DeleteSummary> {
        self.delete(collection, filter, true).await
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> DocQueryResult<DocumentCursor> {
        let store = self.store.read().await;
        let documents = store.get(collection).cloned().unwrap_or_default();

        Ok(into_cursor(run_pipeline(documents, &pipeline, &store)?))
    }
}

/// Builder for constructing [`InMemoryBackend`] instances.
///
/// ```ignore
/// use docquery_memory::InMemoryBackend;
/// use docquery_core::backend::BackendBuilder;
///
/// let backend = InMemoryBackend::builder().build().await?;
/// ```
#[derive(Default)]
pub struct InMemoryBackendBuilder {
    seed: Vec<(String, Vec<Document>)>,
}

impl InMemoryBackendBuilder {
    /// Preloads `documents` into `collection` when the backend is built.
    pub fn with_documents(
        mut self,
        collection: impl Into<String>,
        documents: impl IntoIterator<Item = Document>,
    ) -> Self {
        self.seed
            .push((collection.into(), documents.into_iter().collect()));
        self
    }
}

#[async_trait]
impl BackendBuilder for InMemoryBackendBuilder {
    type Backend = InMemoryBackend;

    async fn build(self) -> DocQueryResult<Self::Backend> {
        let backend = InMemoryBackend::new();

        for (collection, documents) in self.seed {
            backend.insert_many(&collection, documents).await?;
        }

        Ok(backend)
    }
}
