//! Backend abstraction: the narrow interface between the query layer and a document database.
//!
//! The query layer compiles builders into BSON documents and hands them to a [`Backend`]. A
//! backend owns connection management, the wire protocol and cursor iteration; it reports
//! failures as [`DocQueryError::Execution`](crate::error::DocQueryError::Execution) and is never
//! retried by this layer.
//!
//! # Traits
//!
//! - [`Backend`]: find, count, update, delete and aggregate against a named collection
//! - [`BackendBuilder`]: factory trait for creating backend instances

use async_trait::async_trait;
use bson::{Bson, Document};
use futures::stream::BoxStream;
use std::fmt::Debug;

use crate::error::DocQueryResult;

/// A lazily evaluated sequence of matched documents.
///
/// Item errors are execution errors raised while iterating.
pub type DocumentCursor = BoxStream<'static, DocQueryResult<Document>>;

/// Options for a multi-document find.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Compound sort document, keys in priority order.
    pub sort: Option<Document>,
    /// Maximum number of documents to return.
    pub limit: Option<u64>,
    /// Number of matching documents to skip.
    pub skip: Option<u64>,
}

/// Options for a single-document find.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOneOptions {
    pub sort: Option<Document>,
    pub skip: Option<u64>,
}

/// Options for a count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountOptions {
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

/// Outcome of an update or upsert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSummary {
    /// Number of documents that matched the filter.
    pub matched_count: u64,
    /// Number of documents that were actually changed.
    pub modified_count: u64,
    /// Identifier of the document created by an upsert, if one was created.
    pub upserted_id: Option<Bson>,
}

impl UpdateSummary {
    /// Returns `true` if the operation neither changed nor created a document.
    pub fn is_noop(&self) -> bool {
        self.modified_count == 0 && self.upserted_id.is_none()
    }
}

/// Outcome of a delete.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteSummary {
    /// Number of documents removed.
    pub deleted_count: u64,
}

/// Abstract interface for document database backends.
///
/// All methods take compiled documents and the target collection name. Implementations must be
/// thread-safe; the query layer adds no locking of its own.
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    /// Runs a find and returns a cursor over the matched documents.
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> DocQueryResult<DocumentCursor>;

    /// Runs a find for at most one document. `Ok(None)` means nothing matched.
    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        options: FindOneOptions,
    ) -> DocQueryResult<Option<Document>>;

    /// Counts the documents matching `filter`, honouring skip and limit.
    async fn count(
        &self,
        collection: &str,
        filter: Document,
        options: CountOptions,
    ) -> DocQueryResult<u64>;

    /// Applies `update` to the first document matching `filter`.
    ///
    /// With `upsert`, a new document is created when nothing matches.
    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> DocQueryResult<UpdateSummary>;

    /// Applies `update` to every document matching `filter`.
    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> DocQueryResult<UpdateSummary>;

    /// Deletes the first document matching `filter`.
    async fn delete_one(&self, collection: &str, filter: Document) -> DocQueryResult<DeleteSummary>;

    /// Deletes every document matching `filter`.
    async fn delete_many(&self, collection: &str, filter: Document) -> DocQueryResult<DeleteSummary>;

    /// Runs an aggregation pipeline and returns a cursor over its output.
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> DocQueryResult<DocumentCursor>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> DocQueryResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
pub trait BackendBuilder {
    type Backend: Backend;

    async fn build(self) -> DocQueryResult<Self::Backend>;
}
