//! Typed documents that know their collection and identity.

use bson::{Bson, Document, de::deserialize_from_document, ser::serialize_to_document};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{DocQueryError, DocQueryResult};

/// A serializable type stored in a fixed collection under a unique `_id`.
///
/// # Example
///
/// ```ignore
/// use docquery::prelude::*;
/// use bson::{Bson, oid::ObjectId};
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Person {
///     #[serde(rename = "_id")]
///     pub id: ObjectId,
///     pub name: String,
/// }
///
/// impl Entity for Person {
///     fn id(&self) -> Bson {
///         self.id.into()
///     }
///
///     fn collection_name() -> &'static str {
///         "people"
///     }
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Returns this value's identifier, matched against the `_id` field.
    fn id(&self) -> Bson;

    /// Returns the name of the collection this type is stored in.
    fn collection_name() -> &'static str;
}

/// BSON conversions for every [`Entity`].
pub trait EntityExt: Entity {
    /// Serializes this value into a document.
    ///
    /// # Errors
    ///
    /// Returns [`DocQueryError::Serialization`] if the value does not serialize to a document.
    fn to_document(&self) -> DocQueryResult<Document>;

    /// Decodes a value from a document.
    ///
    /// # Errors
    ///
    /// Returns [`DocQueryError::Decode`] if the document does not fit the type.
    fn from_document(document: Document) -> DocQueryResult<Self>;
}

impl<E: Entity> EntityExt for E {
    fn to_document(&self) -> DocQueryResult<Document> {
        Ok(serialize_to_document(self)?)
    }

    fn from_document(document: Document) -> DocQueryResult<Self> {
        deserialize_from_document(document).map_err(|e| DocQueryError::Decode(e.to_string()))
    }
}
