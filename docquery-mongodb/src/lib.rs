//! MongoDB backend implementation for docquery.
//!
//! This crate provides a MongoDB-based implementation of the `Backend` trait. Compiled filter,
//! sort, update and pipeline documents are passed to the official driver unchanged.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docquery = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! Connection settings are described by [`MongoConfig`], which can be deserialized from the
//! application's configuration or assembled through [`MongoBackendBuilder`]. A [`SharedClient`]
//! lets several backends reuse a single client created on first use.
//!
//! # Example
//!
//! ```ignore
//! use docquery::{prelude::*, mongodb::MongoBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let database = Database::connect(
//!         MongoBackend::builder("mongodb://localhost:27017", "my_database").max_pool_size(20),
//!     )
//!     .await?;
//!
//!     let people = database.collection("people");
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod store;

pub use client::{SharedClient, connect};
pub use config::MongoConfig;
pub use store::{MongoBackend, MongoBackendBuilder};
