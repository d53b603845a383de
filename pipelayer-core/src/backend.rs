//! Storage capability surface consumed by pipeline adapters.
//!
//! This module defines the minimal set of operations an adapter needs from
//! its storage collaborator. Connection management, retries and cursor wire
//! details stay on the collaborator's side of the boundary; the adapter only
//! sees resolved collection handles and materialized document batches.
//!
//! # Traits
//!
//! - [`CollectionSource`]: resolves named collection handles, awaiting
//!   backend readiness
//! - [`DocumentCollection`]: the per-collection operations (filtered finds,
//!   aggregation, batched inserts, bulk updates and deletes)

use async_trait::async_trait;
use bson::{Bson, Document};

use crate::error::PipelineResult;

/// Cursor shaping applied to a filtered find: offset, bound, order and
/// projection, each only applied when set.
#[derive(Debug, Clone, Default)]
pub struct FindRequest {
    /// Number of documents to skip.
    pub skip: Option<u64>,
    /// Maximum number of documents to return.
    pub limit: Option<i64>,
    /// Order document (`field -> 1/-1`).
    pub sort: Option<Document>,
    /// Opaque projection document.
    pub projection: Option<Document>,
}

/// A resolved handle to one backend collection.
///
/// All documents crossing this boundary are in storage shape (primary key
/// under `_id`, native identifier values). Bulk mutation calls report counts
/// only, never document contents; the adapter layers its snapshot/refetch
/// orchestration on top of that.
///
/// Implementations must be safe to use from concurrent async tasks. Each call
/// gets whatever atomicity the store natively offers for that single call; no
/// cross-call ordering is guaranteed.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Runs a filtered find and materializes the matching documents.
    async fn find(&self, filter: Document, request: FindRequest) -> PipelineResult<Vec<Document>>;

    /// Counts all documents matching `filter`, independent of any cursor
    /// shaping.
    async fn count(&self, filter: Document) -> PipelineResult<u64>;

    /// Runs an aggregation stage sequence and materializes its output.
    async fn aggregate(&self, stages: Vec<Document>) -> PipelineResult<Vec<Document>>;

    /// Inserts a batch of documents, returning the assigned primary keys in
    /// input order. A failure fails the whole batch.
    async fn insert_many(&self, documents: Vec<Document>) -> PipelineResult<Vec<Bson>>;

    /// Replaces the single document matching `filter` with `document`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DocumentNotFound`](crate::error::PipelineError::DocumentNotFound)
    /// when no document matches.
    async fn replace_one(&self, filter: Document, document: Document) -> PipelineResult<()>;

    /// Applies an update instruction to every document matching `filter`,
    /// returning the count of documents actually modified (which may be less
    /// than the match count when documents already equal the target values).
    async fn update_many(&self, filter: Document, update: Document) -> PipelineResult<u64>;

    /// Deletes every document matching `filter`, returning the deleted count.
    async fn delete_many(&self, filter: Document) -> PipelineResult<u64>;
}

/// Resolves handles to named collections within a storage backend.
///
/// `collection` is the adapter's single readiness suspension point: it
/// resolves once the underlying store handle is usable, or fails permanently
/// with the collaborator's initialization error. The pipeline layer performs
/// no retry of its own.
#[async_trait]
pub trait CollectionSource: Send + Sync {
    /// The collection handle type produced by this source.
    type Collection: DocumentCollection;

    /// Resolves a handle to the named collection.
    async fn collection(&self, name: &str) -> PipelineResult<Self::Collection>;
}
