//! The full CRUD adapter over a single backend collection.

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use tracing::debug;

use pipelayer_core::{
    backend::{CollectionSource, DocumentCollection, FindRequest},
    envelope::{ResultSet, meta},
    error::PipelineResult,
    options::{DeleteOptions, PatchOptions, ReadOptions, sort_document},
    pipeline::{DynPipeline, Pipeline, ReadPipeline},
    schema::{ModelSchema, OutputFilter},
};

use crate::{
    format::{self, DOMAIN_ID, STORAGE_ID},
    patch::to_patch_update,
};

/// Pipeline adapter that stores its data in one collection of a
/// MongoDB-shaped backend.
///
/// Every operation awaits the source's collection handle, converts shapes
/// through the [`format`] transforms, issues the store calls and returns a
/// `{data, meta}` result set restricted to the model's declared fields.
///
/// Patch and delete use a find-then-mutate(-then-refetch) sequence because
/// the backend's bulk update and delete calls report counts only, not
/// document contents. The sequence is not transactional: a concurrent writer
/// may alter documents between the initial find and the refetch, so patched
/// `data` reflects whatever state the refetch observes.
pub struct MongoPipeline<S: CollectionSource> {
    source: S,
    collection_name: String,
    output: OutputFilter,
}

impl<S: CollectionSource> MongoPipeline<S> {
    /// Creates an adapter over `collection_name`, filtering its output by
    /// `schema`.
    pub fn new(source: S, collection_name: impl Into<String>, schema: ModelSchema) -> Self {
        Self {
            source,
            collection_name: collection_name.into(),
            output: OutputFilter::new(schema),
        }
    }

    /// Name of the backing collection.
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    async fn collection(&self) -> PipelineResult<S::Collection> {
        self.source.collection(&self.collection_name).await
    }

    /// Narrows a matched batch down to a primary-key membership filter.
    fn matched_ids_filter(matched: &[Document]) -> Document {
        let ids: Vec<Bson> = matched
            .iter()
            .filter_map(|entry| entry.get(STORAGE_ID).cloned())
            .collect();
        doc! { STORAGE_ID: { "$in": ids } }
    }

    fn to_domain(&self, documents: Vec<Document>) -> Vec<Document> {
        self.output
            .apply(documents.into_iter().map(format::to_domain_document).collect())
    }
}

fn count_meta(key: &str, count: i64) -> Document {
    let mut meta = Document::new();
    meta.insert(key, count);
    meta
}

#[async_trait]
impl<S: CollectionSource> ReadPipeline for MongoPipeline<S> {
    async fn read(&self, query: Document, options: ReadOptions) -> PipelineResult<ResultSet> {
        options.validate()?;
        let collection = self.collection().await?;
        let filter = format::to_storage_query(query);

        let mut request = FindRequest::default();
        if options.skip > 0 {
            request.skip = Some(options.skip);
        }
        if options.limit > 0 {
            request.limit = Some(options.limit as i64);
        }
        if let Some(projection) = &options.projection {
            request.projection = Some(projection.clone());
        }
        if !options.sort.is_empty() {
            request.sort = Some(sort_document(&options.sort));
        }

        let matched = collection.find(filter.clone(), request).await?;
        debug!(collection = %self.collection_name, matched = matched.len(), "read");

        let mut meta = Document::new();
        if options.with_count {
            meta.insert(meta::COUNT, collection.count(filter).await? as i64);
        }

        Ok(ResultSet { data: self.to_domain(matched), meta })
    }
}

#[async_trait]
impl<S: CollectionSource> Pipeline for MongoPipeline<S> {
    async fn create(&self, documents: Vec<Document>) -> PipelineResult<ResultSet> {
        let collection = self.collection().await?;
        let storage: Vec<Document> = documents
            .iter()
            .cloned()
            .map(format::to_storage_document)
            .collect();
        let assigned = collection.insert_many(storage).await?;
        debug!(collection = %self.collection_name, created = assigned.len(), "create");

        // inputs without an explicit identifier take the store-assigned one
        let data = documents
            .into_iter()
            .zip(assigned)
            .map(|(mut document, key)| {
                if !document.contains_key(DOMAIN_ID) {
                    document.insert(DOMAIN_ID, format::from_storage_id(key));
                }
                document
            })
            .collect();

        Ok(ResultSet { data: self.output.apply(data), meta: Document::new() })
    }

    async fn replace(&self, id: &str, mut document: Document) -> PipelineResult<ResultSet> {
        let collection = self.collection().await?;
        if !document.contains_key(DOMAIN_ID) {
            document.insert(DOMAIN_ID, id);
        }
        let filter = doc! { STORAGE_ID: format::to_storage_id(id) };
        collection
            .replace_one(filter, format::to_storage_document(document.clone()))
            .await?;
        debug!(collection = %self.collection_name, %id, "replace");

        Ok(ResultSet { data: self.output.apply(vec![document]), meta: Document::new() })
    }

    async fn patch(
        &self,
        query: Document,
        values: Document,
        options: PatchOptions,
    ) -> PipelineResult<ResultSet> {
        options.validate()?;
        let collection = self.collection().await?;

        let mut request = FindRequest { limit: Some(options.limit as i64), ..FindRequest::default() };
        if options.skip > 0 {
            request.skip = Some(options.skip);
        }
        let matched = collection.find(format::to_storage_query(query), request).await?;

        if matched.is_empty() {
            return Ok(ResultSet { data: Vec::new(), meta: count_meta(meta::UPDATED_COUNT, 0) });
        }

        let narrowed = Self::matched_ids_filter(&matched);
        let update = to_patch_update(format::to_storage_document(values));
        let updated = collection.update_many(narrowed.clone(), update).await?;
        debug!(collection = %self.collection_name, matched = matched.len(), updated, "patch");

        // data is the full matched set in post-mutation state; updated may be
        // lower when matched documents already equalled the target values
        let refetched = collection
            .find(
                narrowed,
                FindRequest { limit: Some(matched.len() as i64), ..FindRequest::default() },
            )
            .await?;

        Ok(ResultSet {
            data: self.to_domain(refetched),
            meta: count_meta(meta::UPDATED_COUNT, updated as i64),
        })
    }

    async fn delete(&self, query: Document, options: DeleteOptions) -> PipelineResult<ResultSet> {
        options.validate()?;
        let collection = self.collection().await?;

        let request = FindRequest { limit: Some(options.limit as i64), ..FindRequest::default() };
        let matched = collection.find(format::to_storage_query(query), request).await?;

        if matched.is_empty() {
            return Ok(ResultSet { data: Vec::new(), meta: count_meta(meta::DELETED_COUNT, 0) });
        }

        let deleted = collection.delete_many(Self::matched_ids_filter(&matched)).await?;
        debug!(collection = %self.collection_name, deleted, "delete");

        Ok(ResultSet {
            data: self.to_domain(matched),
            meta: count_meta(meta::DELETED_COUNT, deleted as i64),
        })
    }
}

#[async_trait]
impl<S: CollectionSource> DynPipeline for MongoPipeline<S> {
    fn adapter_name(&self) -> &'static str {
        "MongoPipeline"
    }

    async fn read(&self, query: Document, options: ReadOptions) -> PipelineResult<ResultSet> {
        ReadPipeline::read(self, query, options).await
    }

    async fn create(&self, documents: Vec<Document>) -> PipelineResult<ResultSet> {
        Pipeline::create(self, documents).await
    }

    async fn replace(&self, id: &str, document: Document) -> PipelineResult<ResultSet> {
        Pipeline::replace(self, id, document).await
    }

    async fn patch(
        &self,
        query: Document,
        values: Document,
        options: PatchOptions,
    ) -> PipelineResult<ResultSet> {
        Pipeline::patch(self, query, values, options).await
    }

    async fn delete(&self, query: Document, options: DeleteOptions) -> PipelineResult<ResultSet> {
        Pipeline::delete(self, query, options).await
    }
}
