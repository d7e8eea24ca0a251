use async_trait::async_trait;
use bson::Document;
use futures::{StreamExt, TryStreamExt};
use mongodb::{
    Client, Collection as MongoCollection,
    options::{
        CountOptions as MongoCountOptions, FindOneOptions as MongoFindOneOptions,
        FindOptions as MongoFindOptions,
    },
    results::UpdateResult,
};
use tracing::info;

use docquery_core::{
    backend::{
        Backend, BackendBuilder, CountOptions, DeleteSummary, DocumentCursor, FindOneOptions,
        FindOptions, UpdateSummary,
    },
    error::{DocQueryError, DocQueryResult},
};

use crate::{
    client::{SharedClient, connect},
    config::MongoConfig,
};

fn execution(e: mongodb::error::Error) -> DocQueryError {
    DocQueryError::Execution(e.to_string())
}

fn into_cursor(cursor: mongodb::Cursor<Document>) -> DocumentCursor {
    cursor.map_err(execution).boxed()
}

fn into_summary(result: UpdateResult) -> UpdateSummary {
    UpdateSummary {
        matched_count: result.matched_count,
        modified_count: result.modified_count,
        upserted_id: result.upserted_id,
    }
}

#[derive(Debug)]
pub struct MongoBackend {
    client: Client,
    database: String,
}

impl MongoBackend {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(uri: &str, database: &str) -> MongoBackendBuilder<'static> {
        MongoBackendBuilder::new(uri, database)
    }

    /// Returns the underlying driver client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }
}

#[async_trait]
impl Backend for MongoBackend {
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> DocQueryResult<DocumentCursor> {
        let mut find_options = MongoFindOptions::default();
        find_options.sort = options.sort;
        find_options.skip = options.skip;
        find_options.limit = options
            .limit
            .map(|limit| i64::try_from(limit).unwrap_or(i64::MAX));

        Ok(into_cursor(
            self.get_collection(collection)
                .find(filter)
                .with_options(find_options)
                .await
                .map_err(execution)?,
        ))
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        options: FindOneOptions,
    ) -> DocQueryResult<Option<Document>> {
        let mut find_options = MongoFindOneOptions::default();
        find_options.sort = options.sort;
        find_options.skip = options.skip;

        self.get_collection(collection)
            .find_one(filter)
            .with_options(find_options)
            .await
            .map_err(execution)
    }

    async fn count(
        &self,
        collection: &str,
        filter: Document,
        options: CountOptions,
    ) -> DocQueryResult<u64> {
        let mut count_options = MongoCountOptions::default();
        count_options.limit = options.limit;
        count_options.skip = options.skip;

        self.get_collection(collection)
            .count_documents(filter)
            .with_options(count_options)
            .await
            .map_err(execution)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> DocQueryResult<UpdateSummary> {
        Ok(into_summary(
            self.get_collection(collection)
                .update_one(filter, update)
                .upsert(upsert)
                .await
                .map_err(execution)?,
        ))
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> DocQueryResult<UpdateSummary> {
        Ok(into_summary(
            self.get_collection(collection)
                .update_many(filter, update)
                .upsert(upsert)
                .await
                .map_err(execution)?,
        ))
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> DocQueryResult<DeleteSummary> {
        let result = self
            .get_collection(collection)
            .delete_one(filter)
            .await
            .map_err(execution)?;

        Ok(DeleteSummary {
            deleted_count: result.deleted_count,
        })
    }

    async fn delete_many(&self, collection: &str, filter: Document) -> DocQueryResult<DeleteSummary> {
        let result = self
            .get_collection(collection)
            .delete_many(filter)
            .await
            .map_err(execution)?;

        Ok(DeleteSummary {
            deleted_count: result.deleted_count,
        })
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> DocQueryResult<DocumentCursor> {
        Ok(into_cursor(
            self.get_collection(collection)
                .aggregate(pipeline)
                .await
                .map_err(execution)?,
        ))
    }

    async fn shutdown(self) -> DocQueryResult<()> {
        self.client.shutdown().await;

        info!(database = %self.database, "MongoDB client shut down");

        Ok(())
    }
}

/// Builds a [`MongoBackend`] from a [`MongoConfig`], optionally through a [`SharedClient`].
pub struct MongoBackendBuilder<'a> {
    config: MongoConfig,
    shared: Option<&'a SharedClient>,
}

impl<'a> MongoBackendBuilder<'a> {
    pub fn new(uri: &str, database: &str) -> Self {
        Self::from_config(MongoConfig::new(uri, database))
    }

    pub fn from_config(config: MongoConfig) -> Self {
        Self {
            config,
            shared: None,
        }
    }

    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.config.app_name = Some(app_name.into());
        self
    }

    pub fn max_pool_size(mut self, size: u32) -> Self {
        self.config.max_pool_size = Some(size);
        self
    }

    pub fn min_pool_size(mut self, size: u32) -> Self {
        self.config.min_pool_size = Some(size);
        self
    }

    pub fn connect_timeout_ms(mut self, timeout: u64) -> Self {
        self.config.connect_timeout_ms = Some(timeout);
        self
    }

    /// Reuses the client held by `shared` instead of connecting a new one.
    pub fn shared(mut self, shared: &'a SharedClient) -> Self {
        self.shared = Some(shared);
        self
    }
}

#[async_trait]
impl<'a> BackendBuilder for MongoBackendBuilder<'a> {
    type Backend = MongoBackend;

    async fn build(self) -> DocQueryResult<Self::Backend> {
        let client = match self.shared {
            Some(shared) => shared.get_or_connect(&self.config).await?,
            None => connect(&self.config).await?,
        };

        Ok(MongoBackend::new(client, self.config.database))
    }
}
