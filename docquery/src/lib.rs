//! Main docquery crate: fluent queries, updates and aggregations over document databases.
//!
//! This crate is the primary entry point for users of docquery. It re-exports the core builders
//! and result types and gives access to the available backends.
//!
//! # Features
//!
//! - **Fluent predicates** - Chain `eq`, `gt`, `any_of`, `regex` and friends instead of writing
//!   nested filter documents by hand
//! - **Updates** - Queue `set`, `inc`, `push`, `pull` and `unset` operations and apply them to
//!   one or all matches
//! - **Aggregation** - Build `$match`, `$sort`, `$limit`, `$skip`, `$lookup` and `$unwind` pipelines
//! - **Uniform results** - Every read returns a [`QueryOutput`](output::QueryOutput) consumed
//!   into any deserializable type, with a single not-found error
//!
//! # Quick Start
//!
//! ```ignore
//! use docquery::{prelude::*, memory::InMemoryBackend};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Person {
//!     #[serde(rename = "_id")]
//!     pub id: i32,
//!     pub name: String,
//!     pub age: i32,
//! }
//!
//! #[tokio::main]
//! async fn main() -> DocQueryResult<()> {
//!     let database = Database::connect(InMemoryBackend::builder()).await?;
//!     let people = database.collection("people");
//!
//!     people.save(1, &Person { id: 1, name: "Trevor".into(), age: 30 }).await?;
//!
//!     // Base queries can be cloned and extended independently
//!     let adults = people.query().gte("age", 18);
//!     let oldest: Person = adults.clone().desc("age").find_one().await.consume().await?;
//!     let named: Vec<Person> = adults.regex("name", "^T").find().await.consume().await?;
//!
//!     people.query().eq("name", "Trevor").inc("age", 1).update().await?;
//!
//!     database.shutdown().await
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory backend for development and testing
//! - [`mongodb`] - MongoDB backend (requires `mongodb` feature)

pub mod prelude;

pub use docquery_core::{
    aggregate, backend, collection, compile, database, entity, error, filter, output, page,
    pipeline, query, sort, update,
};

// Re-export BSON types for convenience
pub use bson;

/// In-memory backend implementations.
pub mod memory {
    pub use docquery_memory::{InMemoryBackend, InMemoryBackendBuilder};
}

/// MongoDB backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docquery_mongodb::{MongoBackend, MongoBackendBuilder, MongoConfig, SharedClient, connect};
}
