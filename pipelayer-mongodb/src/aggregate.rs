//! Read-only adapter backed by a caller-supplied aggregation pipeline.

use async_trait::async_trait;
use bson::{Document, doc};
use tracing::debug;

use pipelayer_core::{
    backend::{CollectionSource, DocumentCollection},
    envelope::{ResultSet, meta},
    error::PipelineResult,
    options::{ReadOptions, sort_document},
    pipeline::{DynPipeline, ReadPipeline},
    schema::{ModelSchema, OutputFilter},
};

use crate::format;

/// Produces an ordered aggregation stage sequence for a read query.
pub type StageFn = Box<dyn Fn(&Document) -> Vec<Document> + Send + Sync>;

/// Pipeline adapter whose result set is computed by an injected aggregation
/// stage sequence instead of a plain filter.
///
/// The caller's stages run first; query fields not declared in the extra
/// query schema are applied afterwards as a trailing `$match` stage, so
/// generic filtering always happens last. Read options become trailing
/// `$skip`/`$limit`/`$project`/`$sort` stages in that conditional order.
///
/// This adapter is read-only by construction: it implements only
/// [`ReadPipeline`], so mutation entry points do not exist on it. Behind the
/// dynamic [`DynPipeline`] surface, mutations fail with a `NotSupported`
/// error naming the operation, before any store call.
pub struct MongoAggregatePipeline<S: CollectionSource> {
    source: S,
    collection_name: String,
    output: OutputFilter,
    result_stages: StageFn,
    meta_stages: Option<StageFn>,
    extra_query: Option<ModelSchema>,
}

impl<S: CollectionSource> MongoAggregatePipeline<S> {
    /// Creates an aggregation-backed adapter over `collection_name`.
    /// `result_stages` maps each read query to the stage sequence producing
    /// the base result set.
    pub fn new(
        source: S,
        collection_name: impl Into<String>,
        schema: ModelSchema,
        result_stages: impl Fn(&Document) -> Vec<Document> + Send + Sync + 'static,
    ) -> Self {
        Self {
            source,
            collection_name: collection_name.into(),
            output: OutputFilter::new(schema),
            result_stages: Box::new(result_stages),
            meta_stages: None,
            extra_query: None,
        }
    }

    /// Adds a stage sequence producing exactly one summary document, merged
    /// into `meta` on every read.
    pub fn with_meta_stages(
        mut self,
        stages: impl Fn(&Document) -> Vec<Document> + Send + Sync + 'static,
    ) -> Self {
        self.meta_stages = Some(Box::new(stages));
        self
    }

    /// Declares extra query fields consumed by the stage functions. Declared
    /// fields are stripped from the trailing `$match`; everything else in
    /// the query is still applied as a generic filter.
    pub fn with_extra_query_schema(mut self, schema: ModelSchema) -> Self {
        self.extra_query = Some(schema);
        self
    }

    /// Name of the backing collection.
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    fn residual_query(&self, query: &Document) -> Document {
        match &self.extra_query {
            Some(extra) => query
                .iter()
                .filter(|(key, _)| !extra.declares(key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            None => query.clone(),
        }
    }
}

#[async_trait]
impl<S: CollectionSource> ReadPipeline for MongoAggregatePipeline<S> {
    async fn read(&self, query: Document, options: ReadOptions) -> PipelineResult<ResultSet> {
        options.validate()?;
        let collection = self.source.collection(&self.collection_name).await?;

        let mut stages = (self.result_stages)(&query);
        stages.push(doc! { "$match": format::to_storage_query(self.residual_query(&query)) });
        if options.skip > 0 {
            stages.push(doc! { "$skip": options.skip as i64 });
        }
        if options.limit > 0 {
            stages.push(doc! { "$limit": options.limit as i64 });
        }
        if let Some(projection) = &options.projection {
            stages.push(doc! { "$project": projection.clone() });
        }
        if !options.sort.is_empty() {
            stages.push(doc! { "$sort": sort_document(&options.sort) });
        }

        let produced = collection.aggregate(stages).await?;
        debug!(collection = %self.collection_name, produced = produced.len(), "aggregate read");

        let mut meta = Document::new();
        if options.with_count {
            // the aggregation's own cardinality, not a separate count query
            meta.insert(meta::COUNT, produced.len() as i64);
        }
        if let Some(meta_stages) = &self.meta_stages {
            let summary = collection.aggregate(meta_stages(&query)).await?;
            if let Some(entry) = summary.into_iter().next() {
                for (key, value) in entry {
                    meta.insert(key, value);
                }
            }
        }

        let data = self
            .output
            .apply(produced.into_iter().map(format::to_domain_document).collect());
        Ok(ResultSet { data, meta })
    }
}

#[async_trait]
impl<S: CollectionSource> DynPipeline for MongoAggregatePipeline<S> {
    fn adapter_name(&self) -> &'static str {
        "MongoAggregatePipeline"
    }

    async fn read(&self, query: Document, options: ReadOptions) -> PipelineResult<ResultSet> {
        ReadPipeline::read(self, query, options).await
    }
}
