//! The CRUD pipeline contract.
//!
//! The contract is split into two static traits so an adapter's capabilities
//! are part of its type:
//!
//! - [`ReadPipeline`] - read-only adapters (e.g. aggregation-backed views)
//!   implement only this; mutation entry points do not exist on them
//! - [`Pipeline`] - full adapters add create/replace/patch/delete
//!
//! For contexts that need runtime polymorphism over adapters of mixed
//! capability, [`DynPipeline`] is the object-safe surface carrying all five
//! operations. Its mutation methods default to a
//! [`NotSupported`](crate::error::PipelineError::NotSupported) error naming
//! the operation and the concrete adapter, raised before any store call;
//! full adapters override them.

use async_trait::async_trait;
use bson::Document;

use crate::{
    envelope::ResultSet,
    error::{PipelineError, PipelineResult},
    options::{DeleteOptions, PatchOptions, ReadOptions},
};

/// Read side of the pipeline contract.
#[async_trait]
pub trait ReadPipeline: Send + Sync {
    /// Finds documents matching the domain query.
    ///
    /// The query maps field names to either a scalar match value or an array
    /// of acceptable values ("field is one of these").
    async fn read(&self, query: Document, options: ReadOptions) -> PipelineResult<ResultSet>;
}

/// Full pipeline contract: read plus the four mutations.
#[async_trait]
pub trait Pipeline: ReadPipeline {
    /// Creates the given documents, returning them with identifiers assigned
    /// where the input lacked one. `meta` is empty.
    async fn create(&self, documents: Vec<Document>) -> PipelineResult<ResultSet>;

    /// Replaces the document with the given identifier wholesale. The
    /// replacement's identifier defaults to `id` when absent. `meta` is empty.
    async fn replace(&self, id: &str, document: Document) -> PipelineResult<ResultSet>;

    /// Modifies documents matching the query. `values` is a partial domain
    /// document where `null` means "remove this field". Returns the matched
    /// documents in their post-mutation state; `meta` carries the count of
    /// documents actually modified.
    async fn patch(
        &self,
        query: Document,
        values: Document,
        options: PatchOptions,
    ) -> PipelineResult<ResultSet>;

    /// Deletes documents matching the query, returning their pre-deletion
    /// contents; `meta` carries the deleted count.
    async fn delete(&self, query: Document, options: DeleteOptions) -> PipelineResult<ResultSet>;
}

/// Object-safe pipeline surface for dynamic dispatch over adapters of mixed
/// capability.
#[async_trait]
pub trait DynPipeline: Send + Sync {
    /// Name of the concrete adapter type, used in `NotSupported` errors.
    fn adapter_name(&self) -> &'static str;

    /// Finds documents matching the domain query.
    async fn read(&self, query: Document, options: ReadOptions) -> PipelineResult<ResultSet>;

    /// Creates the given documents. Read-only adapters fail with
    /// [`NotSupported`](PipelineError::NotSupported).
    async fn create(&self, _documents: Vec<Document>) -> PipelineResult<ResultSet> {
        Err(PipelineError::not_supported("create", self.adapter_name()))
    }

    /// Replaces the document with the given identifier. Read-only adapters
    /// fail with [`NotSupported`](PipelineError::NotSupported).
    async fn replace(&self, _id: &str, _document: Document) -> PipelineResult<ResultSet> {
        Err(PipelineError::not_supported("replace", self.adapter_name()))
    }

    /// Modifies documents matching the query. Read-only adapters fail with
    /// [`NotSupported`](PipelineError::NotSupported).
    async fn patch(
        &self,
        _query: Document,
        _values: Document,
        _options: PatchOptions,
    ) -> PipelineResult<ResultSet> {
        Err(PipelineError::not_supported("patch", self.adapter_name()))
    }

    /// Deletes documents matching the query. Read-only adapters fail with
    /// [`NotSupported`](PipelineError::NotSupported).
    async fn delete(&self, _query: Document, _options: DeleteOptions) -> PipelineResult<ResultSet> {
        Err(PipelineError::not_supported("delete", self.adapter_name()))
    }
}
