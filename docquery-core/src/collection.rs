//! Collection handles: the entry point for queries, aggregations and identity operations.
//!
//! # Example
//!
//! ```ignore
//! use docquery::prelude::*;
//! use bson::oid::ObjectId;
//!
//! let people = database.collection("people");
//! let id = ObjectId::new();
//!
//! people.save(id, &person).await?;
//! let found: Person = people.find_by_id(id).await.consume().await?;
//! let adults: Vec<Person> = people.query().gte("age", 18).find().await.consume().await?;
//! ```

use bson::{Bson, Document, doc, ser::serialize_to_document};
use serde::Serialize;
use tracing::debug;

use crate::{
    aggregate::Aggregate,
    backend::{Backend, FindOneOptions, UpdateSummary},
    entity::{Entity, EntityExt},
    error::{DocQueryError, DocQueryResult},
    filter::FilterBuilder,
    output::{QueryOutput, SingleOutput},
    pipeline::Pipeline,
    query::Query,
};

/// Name of the identity field every stored document carries.
pub const ID_FIELD: &str = "_id";

/// A named collection with a reference to a backend.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the backend reference
/// * `B` - The backend type
#[derive(Debug)]
pub struct Collection<'a, B: Backend> {
    name: String,
    backend: &'a B,
}

impl<'a, B: Backend> Clone for Collection<'a, B> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            backend: self.backend,
        }
    }
}

impl<'a, B: Backend> Collection<'a, B> {
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn backend(&self) -> &'a B {
        self.backend
    }

    /// Starts an empty query that matches every document of this collection.
    pub fn query(&self) -> Query<'a, B> {
        Query::new(self.clone())
    }

    /// Starts an empty aggregation pipeline on this collection.
    pub fn aggregate(&self) -> Aggregate<'a, B> {
        Aggregate::new(self.clone(), Pipeline::new())
    }

    /// Binds an already built pipeline to this collection.
    pub fn aggregate_with(&self, pipeline: Pipeline) -> Aggregate<'a, B> {
        Aggregate::new(self.clone(), pipeline)
    }

    /// Looks up the document whose `_id` equals `id`.
    pub async fn find_by_id(&self, id: impl Into<Bson>) -> QueryOutput {
        let id: Bson = id.into();
        let filter = doc! { ID_FIELD: id };

        debug!(collection = %self.name, %filter, "find_by_id");

        SingleOutput::new(
            self.backend
                .find_one(&self.name, filter, FindOneOptions::default())
                .await,
        )
        .into()
    }

    /// Looks up the first document whose `field` equals `value`.
    pub async fn find_one_by(&self, field: impl Into<String>, value: impl Into<Bson>) -> QueryOutput {
        self.query().eq(field, value).find_one().await
    }

    /// Looks up every document whose `field` equals `value`.
    pub async fn find_by(&self, field: impl Into<String>, value: impl Into<Bson>) -> QueryOutput {
        self.query().eq(field, value).find().await
    }

    /// Upserts `data` under the identifier `id`.
    ///
    /// Every top-level field of `data` is set on the stored document; fields not present in `data`
    /// are left as they are. A new document is created when no document has this identifier. An
    /// `_id` field inside `data` is ignored in favour of `id`.
    pub async fn save<T: Serialize>(
        &self,
        id: impl Into<Bson>,
        data: &T,
    ) -> DocQueryResult<UpdateSummary> {
        let id: Bson = id.into();
        let mut fields = serialize_to_document(data)?;
        fields.remove(ID_FIELD);

        self.upsert_fields(doc! { ID_FIELD: id }, fields).await
    }

    /// Upserts an [`Entity`] under its own identifier.
    pub async fn save_entity<E: Entity>(&self, entity: &E) -> DocQueryResult<UpdateSummary> {
        let mut fields = entity.to_document()?;
        fields.remove(ID_FIELD);

        self.upsert_fields(doc! { ID_FIELD: entity.id() }, fields).await
    }

    pub(crate) async fn upsert_fields(
        &self,
        filter: Document,
        fields: Document,
    ) -> DocQueryResult<UpdateSummary> {
        if fields.is_empty() {
            return Err(DocQueryError::InvalidUpdate(
                "saved document has no fields to set".to_string(),
            ));
        }

        let update = doc! { "$set": fields };

        debug!(collection = %self.name, %filter, %update, "upsert");

        self.backend
            .update_one(&self.name, filter, update, true)
            .await
    }
}
