//! Uniform consumption of query outcomes.
//!
//! Every read terminal returns a [`QueryOutput`], either a [`SingleOutput`] or a
//! [`MultipleOutput`]. Both are consumed once through [`QueryOutput::consume`], which decodes the
//! outcome into a caller-chosen type:
//!
//! - a single output decodes into `T` and fails with [`DocQueryError::NotFound`] when nothing
//!   matched;
//! - a multiple output decodes the whole sequence into `T` (usually `Vec<U>`); no match yields an
//!   empty sequence, never `NotFound`.
//!
//! An execution error raised while running the query is stored in the output and returned
//! verbatim by `consume`, ahead of any decode attempt.
//!
//! ```ignore
//! let person: Person = people.query().eq("name", "Trevor").find_one().await.consume().await?;
//! let everyone: Vec<Person> = people.query().find().await.consume().await?;
//! ```

use bson::{Bson, Document, de::deserialize_from_bson, de::deserialize_from_document};
use futures::TryStreamExt;
use serde::de::DeserializeOwned;

use crate::{
    backend::DocumentCursor,
    error::{DocQueryError, DocQueryResult},
};

/// Outcome of a single-document lookup.
#[derive(Debug)]
pub struct SingleOutput {
    document: DocQueryResult<Option<Document>>,
}

impl SingleOutput {
    pub fn new(document: DocQueryResult<Option<Document>>) -> Self {
        Self { document }
    }

    /// Returns the matched document without decoding it.
    ///
    /// # Errors
    ///
    /// Returns the stored execution error, or [`DocQueryError::NotFound`] if nothing matched.
    pub fn into_document(self) -> DocQueryResult<Document> {
        self.document?.ok_or(DocQueryError::NotFound)
    }

    /// Decodes the matched document into `T`.
    pub fn consume<T: DeserializeOwned>(self) -> DocQueryResult<T> {
        deserialize_from_document(self.into_document()?)
            .map_err(|e| DocQueryError::Decode(e.to_string()))
    }
}

/// Outcome of a multi-document find or an aggregation.
pub struct MultipleOutput {
    cursor: DocQueryResult<DocumentCursor>,
}

impl MultipleOutput {
    pub fn new(cursor: DocQueryResult<DocumentCursor>) -> Self {
        Self { cursor }
    }

    /// Drains the cursor into raw documents.
    pub async fn into_documents(self) -> DocQueryResult<Vec<Document>> {
        self.cursor?.try_collect().await
    }

    /// Decodes the full sequence of matched documents into `T`.
    ///
    /// `T` must deserialize from a sequence, e.g. `Vec<U>`.
    pub async fn consume<T: DeserializeOwned>(self) -> DocQueryResult<T> {
        let documents = self.into_documents().await?;

        deserialize_from_bson(Bson::Array(documents.into_iter().map(Bson::Document).collect()))
            .map_err(|e| DocQueryError::Decode(e.to_string()))
    }
}

impl std::fmt::Debug for MultipleOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.cursor {
            Ok(_) => f.debug_struct("MultipleOutput").field("cursor", &"..").finish(),
            Err(error) => f.debug_struct("MultipleOutput").field("error", error).finish(),
        }
    }
}

/// The outcome of a read terminal.
#[derive(Debug)]
pub enum QueryOutput {
    Single(SingleOutput),
    Multiple(MultipleOutput),
}

impl QueryOutput {
    /// Decodes the outcome into `T`.
    ///
    /// # Errors
    ///
    /// - the stored execution error, if the query failed to run
    /// - [`DocQueryError::NotFound`] for a single output that matched nothing
    /// - [`DocQueryError::Decode`] if the matched data does not fit `T`
    pub async fn consume<T: DeserializeOwned>(self) -> DocQueryResult<T> {
        match self {
            QueryOutput::Single(output) => output.consume(),
            QueryOutput::Multiple(output) => output.consume().await,
        }
    }

    /// Returns the matched documents without decoding them.
    ///
    /// A single output yields exactly one document or [`DocQueryError::NotFound`].
    pub async fn into_documents(self) -> DocQueryResult<Vec<Document>> {
        match self {
            QueryOutput::Single(output) => Ok(vec![output.into_document()?]),
            QueryOutput::Multiple(output) => output.into_documents().await,
        }
    }

    pub fn is_single(&self) -> bool {
        matches!(self, QueryOutput::Single(_))
    }
}

impl From<SingleOutput> for QueryOutput {
    fn from(output: SingleOutput) -> Self {
        QueryOutput::Single(output)
    }
}

impl From<MultipleOutput> for QueryOutput {
    fn from(output: MultipleOutput) -> Self {
        QueryOutput::Multiple(output)
    }
}
