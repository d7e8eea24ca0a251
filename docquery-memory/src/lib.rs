//! In-memory backend for docquery.
//!
//! This crate provides a thread-safe, in-memory implementation of the `Backend` trait. It
//! interprets the same filter, sort, update and pipeline documents a MongoDB server would receive,
//! which makes it suitable for tests and development without a running database.
//!
//! # Supported operators
//!
//! - **Filters** - `$and`, `$or`, `$nor`, implicit equality, `$eq`, `$ne`, `$gt`, `$gte`, `$lt`,
//!   `$lte`, `$in`, `$nin`, `$exists`, `$regex` with `$options`
//! - **Updates** - `$set`, `$inc`, `$push` (with `$each`), `$pull` (with `$in`), `$unset`
//! - **Pipelines** - `$match`, `$sort`, `$limit`, `$skip`, `$lookup`, `$unwind`
//!
//! Dotted field paths address embedded documents, and conditions on array fields match when any
//! element matches.
//!
//! # Quick Start
//!
//! ```ignore
//! use docquery::prelude::*;
//! use docquery::memory::InMemoryBackend;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let database = Database::connect(InMemoryBackend::builder()).await?;
//!     let people = database.collection("people");
//!
//!     people.save(1, &doc! { "name": "Trevor", "age": 30 }).await?;
//!
//!     let name: String = people
//!         .find_by_id(1)
//!         .await
//!         .consume::<Document>()
//!         .await?
//!         .get_str("name")?
//!         .to_string();
//!
//!     Ok(())
//! }
//! ```

mod evaluator;
mod modifier;
mod path;
mod pipeline;
pub mod store;

pub use store::{InMemoryBackend, InMemoryBackendBuilder};
