//! Capability traits bound to the official MongoDB driver.

use async_trait::async_trait;
use bson::{Bson, Document};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection as DriverCollection,
    options::{ClientOptions, FindOptions},
};
use tracing::debug;

use pipelayer_core::{
    backend::{CollectionSource, DocumentCollection, FindRequest},
    error::{PipelineError, PipelineResult},
};

use crate::format;

/// A MongoDB database acting as a collection source.
#[derive(Debug, Clone)]
pub struct MongoSource {
    client: Client,
    database: String,
}

impl MongoSource {
    /// Wraps an already-connected client.
    pub fn new(client: Client, database: impl Into<String>) -> Self {
        Self { client, database: database.into() }
    }

    /// Starts a builder from a connection string and database name.
    pub fn builder(dsn: &str, database: &str) -> MongoSourceBuilder {
        MongoSourceBuilder::new(dsn, database)
    }
}

#[async_trait]
impl CollectionSource for MongoSource {
    type Collection = MongoCollectionHandle;

    async fn collection(&self, name: &str) -> PipelineResult<MongoCollectionHandle> {
        Ok(MongoCollectionHandle {
            collection: self.client.database(&self.database).collection(name),
        })
    }
}

/// A resolved handle to one MongoDB collection.
#[derive(Debug, Clone)]
pub struct MongoCollectionHandle {
    collection: DriverCollection<Document>,
}

#[async_trait]
impl DocumentCollection for MongoCollectionHandle {
    async fn find(&self, filter: Document, request: FindRequest) -> PipelineResult<Vec<Document>> {
        let mut options = FindOptions::default();
        options.skip = request.skip;
        options.limit = request.limit;
        options.sort = request.sort;
        options.projection = request.projection;

        self.collection
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| PipelineError::Backend(e.to_string()))?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(|e| PipelineError::Backend(e.to_string()))
    }

    async fn count(&self, filter: Document) -> PipelineResult<u64> {
        self.collection
            .count_documents(filter)
            .await
            .map_err(|e| PipelineError::Backend(e.to_string()))
    }

    async fn aggregate(&self, stages: Vec<Document>) -> PipelineResult<Vec<Document>> {
        self.collection
            .aggregate(stages)
            .await
            .map_err(|e| PipelineError::Backend(e.to_string()))?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(|e| PipelineError::Backend(e.to_string()))
    }

    async fn insert_many(&self, documents: Vec<Document>) -> PipelineResult<Vec<Bson>> {
        let total = documents.len();
        let result = self
            .collection
            .insert_many(documents)
            .await
            .map_err(|e| PipelineError::Backend(e.to_string()))?;

        // the driver reports assigned keys by input index
        Ok((0..total)
            .map(|index| result.inserted_ids.get(&index).cloned().unwrap_or(Bson::Null))
            .collect())
    }

    async fn replace_one(&self, filter: Document, document: Document) -> PipelineResult<()> {
        let result = self
            .collection
            .replace_one(filter.clone(), document)
            .await
            .map_err(|e| PipelineError::Backend(e.to_string()))?;

        if result.matched_count == 0 {
            let id = filter
                .get(format::STORAGE_ID)
                .cloned()
                .map(format::from_storage_id)
                .map(|value| match value {
                    Bson::String(text) => text,
                    other => other.to_string(),
                })
                .unwrap_or_default();
            return Err(PipelineError::DocumentNotFound(id, self.collection.name().to_string()));
        }

        Ok(())
    }

    async fn update_many(&self, filter: Document, update: Document) -> PipelineResult<u64> {
        Ok(self
            .collection
            .update_many(filter, update)
            .await
            .map_err(|e| PipelineError::Backend(e.to_string()))?
            .modified_count)
    }

    async fn delete_many(&self, filter: Document) -> PipelineResult<u64> {
        Ok(self
            .collection
            .delete_many(filter)
            .await
            .map_err(|e| PipelineError::Backend(e.to_string()))?
            .deleted_count)
    }
}

/// Builder for [`MongoSource`] instances.
pub struct MongoSourceBuilder {
    dsn: String,
    database: String,
}

impl MongoSourceBuilder {
    /// Creates a builder from a connection string and database name.
    pub fn new(dsn: &str, database: &str) -> Self {
        Self { dsn: dsn.to_string(), database: database.to_string() }
    }

    /// Parses the connection string and builds the source. The client
    /// connects lazily; a bad connection string fails here, a dead server
    /// surfaces on the first store call.
    pub async fn build(self) -> PipelineResult<MongoSource> {
        debug!(database = %self.database, "initializing mongodb source");
        Ok(MongoSource::new(
            Client::with_options(
                ClientOptions::parse(&self.dsn)
                    .await
                    .map_err(|e| PipelineError::Initialization(e.to_string()))?,
            )
            .map_err(|e| PipelineError::Initialization(e.to_string()))?,
            self.database,
        ))
    }
}
