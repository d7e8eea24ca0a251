//! A fluent query, update and aggregation builder for document databases.
//!
//! This crate is the core of the docquery project and provides:
//!
//! - **Predicates** ([`filter`]) - Conjunctive filter terms built through chained calls
//! - **Sorting** ([`sort`]) - Sort keys and directions
//! - **Updates** ([`update`]) - `$set`, `$inc`, `$push`, `$pull` and `$unset` operations
//! - **Pipelines** ([`pipeline`]) - Aggregation stages in execution order
//! - **Compilation** ([`compile`]) - Rendering of builders into wire-level documents
//! - **Backend abstraction** ([`backend`]) - The trait every database driver implements
//! - **Queries and aggregations** ([`query`], [`aggregate`]) - Collection-bound builders with terminals
//! - **Results** ([`output`]) - Uniform consumption of single and multiple results
//! - **Collections and databases** ([`collection`], [`database`]) - Entry points
//! - **Error handling** ([`error`]) - The error taxonomy shared by every operation
//!
//! # Example
//!
//! ```ignore
//! use docquery::prelude::*;
//!
//! let people = database.collection("people");
//!
//! let adults: Vec<Person> = people
//!     .query()
//!     .gte("age", 18)
//!     .desc("age")
//!     .limit(10)
//!     .find()
//!     .await
//!     .consume()
//!     .await?;
//!
//! people.query().eq("name", "Trevor").set("age", 31).update().await?;
//! ```

pub mod aggregate;
pub mod backend;
pub mod collection;
pub mod compile;
pub mod database;
pub mod entity;
pub mod error;
pub mod filter;
pub mod output;
pub mod page;
pub mod pipeline;
pub mod query;
pub mod sort;
pub mod update;
