//! Collection-bound query construction and execution.
//!
//! A [`Query`] accumulates predicate terms, sort keys, pagination and update operations, then
//! runs one of its terminals against the collection it was created from:
//!
//! | Terminal | Filter | Options | Returns |
//! |---|---|---|---|
//! | [`find`](Query::find) | predicate | sort, limit, offset | multiple output |
//! | [`find_one`](Query::find_one) | predicate | sort, offset | single output |
//! | [`count`](Query::count) | predicate | limit, offset | `u64` |
//! | [`update`](Query::update) / [`update_one`](Query::update_one) | predicate | | [`UpdateSummary`] |
//! | [`save`](Query::save) | predicate | upsert | [`UpdateSummary`] |
//! | [`delete_one`](Query::delete_one) / [`delete_many`](Query::delete_many) | predicate | | [`DeleteSummary`] |
//!
//! Builder methods consume the query and return the extended value. Clone a query to reuse it as
//! the base of several derived queries; derivations never affect the base.
//!
//! ```ignore
//! use docquery::prelude::*;
//!
//! let oldest_trevor: Vec<Person> = people
//!     .query()
//!     .eq("name", "Trevor")
//!     .desc("age")
//!     .limit(1)
//!     .find()
//!     .await
//!     .consume()
//!     .await?;
//!
//! people.query().eq("name", "Trevor").inc("age", 1).update().await?;
//! ```

use bson::{Document, ser::serialize_to_document};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
    backend::{Backend, DeleteSummary, UpdateSummary},
    collection::Collection,
    compile,
    error::{DocQueryError, DocQueryResult},
    filter::{Filter, FilterBuilder, Term},
    output::{MultipleOutput, QueryOutput, SingleOutput},
    page::{Page, PageRequest},
    sort::{Sort, SortDirection},
    update::{Update, UpdateBuilder, UpdateOp},
};

/// A query bound to a collection.
#[derive(Debug)]
pub struct Query<'a, B: Backend> {
    collection: Collection<'a, B>,
    filter: Filter,
    sort: Vec<Sort>,
    limit: u64,
    offset: u64,
    update: Update,
}

impl<'a, B: Backend> Clone for Query<'a, B> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            filter: self.filter.clone(),
            sort: self.sort.clone(),
            limit: self.limit,
            offset: self.offset,
            update: self.update.clone(),
        }
    }
}

impl<'a, B: Backend> Query<'a, B> {
    pub(crate) fn new(collection: Collection<'a, B>) -> Self {
        Self {
            collection,
            filter: Filter::new(),
            sort: Vec::new(),
            limit: 0,
            offset: 0,
            update: Update::new(),
        }
    }

    /// Appends every term of `filter` to this query.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter
            .terms()
            .iter()
            .cloned()
            .fold(self.filter, <Filter as FilterBuilder>::with_term);
        self
    }

    /// Appends a sort key. Keys apply in call order; later keys break ties of earlier ones.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(Sort::new(field, direction));
        self
    }

    /// Appends an ascending sort key.
    pub fn asc(self, field: impl Into<String>) -> Self {
        self.sort(field, SortDirection::Asc)
    }

    /// Appends a descending sort key.
    pub fn desc(self, field: impl Into<String>) -> Self {
        self.sort(field, SortDirection::Desc)
    }

    /// Sets the maximum number of documents to return. `0` means unbounded; the latest call wins.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the number of matching documents to skip. `0` means none; the latest call wins.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Returns the name of the bound collection.
    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }

    /// Returns the accumulated predicate terms.
    pub fn terms(&self) -> &[Term] {
        self.filter.terms()
    }

    /// Returns the accumulated sort keys.
    pub fn sort_keys(&self) -> &[Sort] {
        &self.sort
    }

    /// Returns the queued update operations.
    pub fn update_ops(&self) -> &[UpdateOp] {
        self.update.ops()
    }

    /// Compiles the predicate into a filter document. No terms compile to `{}`.
    pub fn filter_document(&self) -> Document {
        self.filter.to_document()
    }

    /// Compiles the queued update operations into an update document.
    pub fn update_document(&self) -> Document {
        self.update.to_document()
    }

    /// Runs a find with sort, limit and offset applied.
    pub async fn find(&self) -> QueryOutput {
        let filter = self.filter_document();
        let options = compile::find_options(&self.sort, self.limit, self.offset);

        debug!(collection = %self.collection_name(), %filter, ?options, "find");

        MultipleOutput::new(
            self.collection
                .backend()
                .find(self.collection_name(), filter, options)
                .await,
        )
        .into()
    }

    /// Runs a find for the first matching document, with sort and offset applied.
    pub async fn find_one(&self) -> QueryOutput {
        let filter = self.filter_document();
        let options = compile::find_one_options(&self.sort, self.offset);

        debug!(collection = %self.collection_name(), %filter, ?options, "find_one");

        SingleOutput::new(
            self.collection
                .backend()
                .find_one(self.collection_name(), filter, options)
                .await,
        )
        .into()
    }

    /// Counts matching documents, with limit and offset applied.
    pub async fn count(&self) -> DocQueryResult<u64> {
        let filter = self.filter_document();
        let options = compile::count_options(self.limit, self.offset);

        debug!(collection = %self.collection_name(), %filter, ?options, "count");

        self.collection
            .backend()
            .count(self.collection_name(), filter, options)
            .await
    }

    /// Applies the queued update operations to every matching document.
    ///
    /// # Errors
    ///
    /// Returns [`DocQueryError::InvalidUpdate`] if no operation was queued.
    pub async fn update(&self) -> DocQueryResult<UpdateSummary> {
        let (filter, update) = self.compile_update()?;

        debug!(collection = %self.collection_name(), %filter, %update, "update_many");

        let summary = self
            .collection
            .backend()
            .update_many(self.collection_name(), filter, update, false)
            .await?;

        if summary.matched_count == 0 {
            warn!(collection = %self.collection_name(), "update matched no documents");
        }

        Ok(summary)
    }

    /// Applies the queued update operations to the first matching document.
    pub async fn update_one(&self) -> DocQueryResult<UpdateSummary> {
        let (filter, update) = self.compile_update()?;

        debug!(collection = %self.collection_name(), %filter, %update, "update_one");

        self.collection
            .backend()
            .update_one(self.collection_name(), filter, update, false)
            .await
    }

    /// Upserts `document` against the predicate: every top-level field of `document` is set on the
    /// first match, or a new document is created when nothing matches.
    ///
    /// Queued update operations are not applied.
    pub async fn save<T: Serialize>(&self, document: &T) -> DocQueryResult<UpdateSummary> {
        let fields = serialize_to_document(document)?;
        self.collection
            .upsert_fields(self.filter_document(), fields)
            .await
    }

    /// Deletes the first matching document.
    pub async fn delete_one(&self) -> DocQueryResult<DeleteSummary> {
        let filter = self.filter_document();

        debug!(collection = %self.collection_name(), %filter, "delete_one");

        self.collection
            .backend()
            .delete_one(self.collection_name(), filter)
            .await
    }

    /// Deletes every matching document.
    pub async fn delete_many(&self) -> DocQueryResult<DeleteSummary> {
        let filter = self.filter_document();

        debug!(collection = %self.collection_name(), %filter, "delete_many");

        self.collection
            .backend()
            .delete_many(self.collection_name(), filter)
            .await
    }

    /// Fetches one page of matching documents along with the total match count.
    ///
    /// The query's own limit and offset are replaced by the ones derived from `request`.
    pub async fn page<T: DeserializeOwned>(&self, request: PageRequest) -> DocQueryResult<Page<T>> {
        let total = self.clone().limit(0).offset(0).count().await?;
        let items: Vec<T> = self
            .clone()
            .offset(request.offset())
            .limit(request.per_page)
            .find()
            .await
            .consume()
            .await?;

        Ok(request.page_of(items, total))
    }

    fn compile_update(&self) -> DocQueryResult<(Document, Document)> {
        if self.update.is_empty() {
            return Err(DocQueryError::InvalidUpdate(
                "no update operations were queued".to_string(),
            ));
        }

        Ok((self.filter_document(), self.update_document()))
    }
}

impl<'a, B: Backend> FilterBuilder for Query<'a, B> {
    fn with_term(mut self, term: Term) -> Self {
        self.filter = self.filter.with_term(term);
        self
    }
}

impl<'a, B: Backend> UpdateBuilder for Query<'a, B> {
    fn with_op(mut self, op: UpdateOp) -> Self {
        self.update = self.update.with_op(op);
        self
    }
}
