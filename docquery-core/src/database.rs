//! The database handle that owns a backend and hands out collections.
//!
//! # Example
//!
//! ```ignore
//! use docquery::prelude::*;
//! use docquery::memory::InMemoryBackend;
//!
//! let database = Database::connect(InMemoryBackend::builder()).await?;
//! let people = database.collection("people");
//! ```

use crate::{
    backend::{Backend, BackendBuilder},
    collection::Collection,
    entity::Entity,
    error::DocQueryResult,
};

/// A database bound to a specific backend implementation.
///
/// # Type Parameters
///
/// * `B` - The backend implementation type
#[derive(Debug)]
pub struct Database<B: Backend> {
    backend: B,
}

impl<B: Backend> Database<B> {
    /// Creates a new database with the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Builds the backend with `builder` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns whatever error the builder reports while initializing the backend.
    pub async fn connect<T>(builder: T) -> DocQueryResult<Self>
    where
        T: BackendBuilder<Backend = B>,
    {
        Ok(Self::new(builder.build().await?))
    }

    /// Gets a collection with the given name.
    pub fn collection(&self, name: &str) -> Collection<'_, B> {
        Collection::new(name.to_string(), &self.backend)
    }

    /// Gets the collection an [`Entity`] type is stored in.
    pub fn collection_for<E: Entity>(&self) -> Collection<'_, B> {
        self.collection(E::collection_name())
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Shuts the backend down, consuming the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to shut down cleanly.
    pub async fn shutdown(self) -> DocQueryResult<()> {
        self.backend.shutdown().await
    }
}
