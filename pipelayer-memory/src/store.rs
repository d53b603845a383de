//! In-memory implementation of the storage capability surface.

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::{Bson, Document, doc, oid::ObjectId};
use mea::rwlock::RwLock;

use pipelayer_core::{
    backend::{CollectionSource, DocumentCollection, FindRequest},
    error::{PipelineError, PipelineResult},
};

use crate::matcher::{compare_values, matches};

type StoreMap = HashMap<String, Vec<Document>>;

/// Thread-safe in-memory collection source.
///
/// Collections keep their documents in insertion order, which stands in for
/// the backend's natural order. The source is cloneable; clones share the
/// same underlying data.
///
/// Queries scan every document in a collection. That is fine for the small
/// datasets this source is meant for (development and tests).
#[derive(Default, Clone, Debug)]
pub struct MemorySource {
    store: Arc<RwLock<StoreMap>>,
}

impl MemorySource {
    /// Creates a new empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a collection's raw storage documents, in insertion order.
    /// Useful in tests for asserting on stored state.
    pub async fn dump(&self, collection: &str) -> Vec<Document> {
        self.store
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl CollectionSource for MemorySource {
    type Collection = MemoryCollection;

    async fn collection(&self, name: &str) -> PipelineResult<MemoryCollection> {
        Ok(MemoryCollection {
            name: name.to_string(),
            store: Arc::clone(&self.store),
        })
    }
}

/// A handle to one in-memory collection.
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    name: String,
    store: Arc<RwLock<StoreMap>>,
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    async fn find(&self, filter: Document, request: FindRequest) -> PipelineResult<Vec<Document>> {
        let store = self.store.read().await;
        let documents = store.get(&self.name).map(Vec::as_slice).unwrap_or(&[]);

        let mut matched: Vec<Document> = documents
            .iter()
            .filter(|document| matches(document, &filter))
            .cloned()
            .collect();

        if let Some(sort) = &request.sort {
            sort_documents(&mut matched, sort);
        }
        let skip = request.skip.unwrap_or(0) as usize;
        let limit = request.limit.map(|limit| limit.max(0) as usize).unwrap_or(usize::MAX);

        Ok(matched
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|document| project(document, request.projection.as_ref()))
            .collect())
    }

    async fn count(&self, filter: Document) -> PipelineResult<u64> {
        let store = self.store.read().await;
        let documents = store.get(&self.name).map(Vec::as_slice).unwrap_or(&[]);
        Ok(documents.iter().filter(|document| matches(document, &filter)).count() as u64)
    }

    async fn aggregate(&self, stages: Vec<Document>) -> PipelineResult<Vec<Document>> {
        let mut documents = self
            .store
            .read()
            .await
            .get(&self.name)
            .cloned()
            .unwrap_or_default();

        for stage in &stages {
            documents = run_stage(documents, stage)?;
        }
        Ok(documents)
    }

    async fn insert_many(&self, documents: Vec<Document>) -> PipelineResult<Vec<Bson>> {
        let mut store = self.store.write().await;
        let collection = store.entry(self.name.clone()).or_default();

        let mut assigned = Vec::with_capacity(documents.len());
        for mut document in documents {
            let key = match document.get("_id") {
                Some(value) => value.clone(),
                None => {
                    let key = Bson::ObjectId(ObjectId::new());
                    document.insert("_id", key.clone());
                    key
                }
            };
            if collection.iter().any(|existing| existing.get("_id") == Some(&key)) {
                return Err(PipelineError::Backend(format!(
                    "duplicate key in {}: {}",
                    self.name, key
                )));
            }
            collection.push(document);
            assigned.push(key);
        }
        Ok(assigned)
    }

    async fn replace_one(&self, filter: Document, mut document: Document) -> PipelineResult<()> {
        let mut store = self.store.write().await;
        let collection = store.entry(self.name.clone()).or_default();

        match collection.iter_mut().find(|existing| matches(existing, &filter)) {
            Some(existing) => {
                if !document.contains_key("_id") {
                    if let Some(key) = existing.get("_id").cloned() {
                        document.insert("_id", key);
                    }
                }
                *existing = document;
                Ok(())
            }
            None => Err(PipelineError::DocumentNotFound(
                describe_filter_id(&filter),
                self.name.clone(),
            )),
        }
    }

    async fn update_many(&self, filter: Document, update: Document) -> PipelineResult<u64> {
        let mut store = self.store.write().await;
        let collection = store.entry(self.name.clone()).or_default();

        let mut modified = 0;
        for existing in collection.iter_mut().filter(|document| matches(document, &filter)) {
            let before = existing.clone();
            apply_update(existing, &update);
            if *existing != before {
                modified += 1;
            }
        }
        Ok(modified)
    }

    async fn delete_many(&self, filter: Document) -> PipelineResult<u64> {
        let mut store = self.store.write().await;
        let collection = store.entry(self.name.clone()).or_default();

        let before = collection.len();
        collection.retain(|document| !matches(document, &filter));
        Ok((before - collection.len()) as u64)
    }
}

fn describe_filter_id(filter: &Document) -> String {
    match filter.get("_id") {
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        Some(Bson::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn apply_update(document: &mut Document, update: &Document) {
    if let Some(Bson::Document(set)) = update.get("$set") {
        for (field, value) in set {
            document.insert(field.clone(), value.clone());
        }
    }
    if let Some(Bson::Document(unset)) = update.get("$unset") {
        for (field, _) in unset {
            document.remove(field);
        }
    }
}

fn sort_documents(documents: &mut [Document], sort: &Document) {
    documents.sort_by(|left, right| {
        for (field, direction) in sort {
            let mut ordering = compare_values(left.get(field), right.get(field));
            if is_descending(direction) {
                ordering = ordering.reverse();
            }
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn is_descending(direction: &Bson) -> bool {
    stage_number(direction).map(|value| value < 0).unwrap_or(false)
}

fn stage_number(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(value) => Some(*value as i64),
        Bson::Int64(value) => Some(*value),
        Bson::Double(value) => Some(*value as i64),
        _ => None,
    }
}

/// Include-style projection: keeps the listed fields; `_id` stays unless
/// explicitly excluded.
fn project(document: Document, projection: Option<&Document>) -> Document {
    let Some(projection) = projection else {
        return document;
    };
    let include_id = projection.get("_id").map(is_truthy).unwrap_or(true);

    let mut projected = Document::new();
    if include_id {
        if let Some(key) = document.get("_id") {
            projected.insert("_id", key.clone());
        }
    }
    for (field, flag) in projection {
        if field == "_id" || !is_truthy(flag) {
            continue;
        }
        if let Some(value) = document.get(field) {
            projected.insert(field.clone(), value.clone());
        }
    }
    projected
}

fn is_truthy(value: &Bson) -> bool {
    !matches!(
        value,
        Bson::Boolean(false) | Bson::Int32(0) | Bson::Int64(0) | Bson::Null
    ) && !matches!(value, Bson::Double(d) if *d == 0.0)
}

fn run_stage(documents: Vec<Document>, stage: &Document) -> PipelineResult<Vec<Document>> {
    let (name, spec) = stage
        .iter()
        .next()
        .ok_or_else(|| PipelineError::Backend("empty aggregation stage".to_string()))?;

    match name.as_str() {
        "$match" => {
            let filter = spec
                .as_document()
                .ok_or_else(|| PipelineError::Backend("$match requires a document".to_string()))?;
            Ok(documents
                .into_iter()
                .filter(|document| matches(document, filter))
                .collect())
        }
        "$sort" => {
            let sort = spec
                .as_document()
                .ok_or_else(|| PipelineError::Backend("$sort requires a document".to_string()))?;
            let mut documents = documents;
            sort_documents(&mut documents, sort);
            Ok(documents)
        }
        "$skip" => {
            let skip = stage_number(spec)
                .ok_or_else(|| PipelineError::Backend("$skip requires a number".to_string()))?;
            Ok(documents.into_iter().skip(skip.max(0) as usize).collect())
        }
        "$limit" => {
            let limit = stage_number(spec)
                .ok_or_else(|| PipelineError::Backend("$limit requires a number".to_string()))?;
            Ok(documents.into_iter().take(limit.max(0) as usize).collect())
        }
        "$count" => {
            let field = spec
                .as_str()
                .ok_or_else(|| PipelineError::Backend("$count requires a field name".to_string()))?;
            Ok(vec![doc! { field: documents.len() as i64 }])
        }
        "$project" => {
            let projection = spec
                .as_document()
                .ok_or_else(|| PipelineError::Backend("$project requires a document".to_string()))?;
            Ok(documents
                .into_iter()
                .map(|document| project(document, Some(projection)))
                .collect())
        }
        other => Err(PipelineError::Backend(format!(
            "unsupported aggregation stage: {other}"
        ))),
    }
}
