//! End-to-end adapter tests driven through the in-memory collection source.

use bson::{Bson, Document, doc};
use pipelayer_core::{
    error::PipelineError,
    options::{DeleteOptions, PatchOptions, ReadOptions, Sort},
    pipeline::{Pipeline, ReadPipeline},
    schema::ModelSchema,
};
use pipelayer_memory::MemorySource;
use pipelayer_mongodb::{MongoAggregatePipeline, MongoPipeline};

const COLLECTION: &str = "test";

fn model() -> ModelSchema {
    ModelSchema::builder()
        .field("id")
        .field("myString")
        .field("myNumber")
        .build()
}

fn pipeline(source: &MemorySource) -> MongoPipeline<MemorySource> {
    MongoPipeline::new(source.clone(), COLLECTION, model())
}

fn is_hex_id(value: &str) -> bool {
    value.len() == 24 && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[tokio::test]
async fn create_assigns_identifier_and_read_returns_it() {
    let source = MemorySource::new();
    let pipeline = pipeline(&source);

    let created = pipeline
        .create(vec![doc! { "myString": "test", "myNumber": 2 }])
        .await
        .unwrap();
    assert_eq!(created.data.len(), 1);
    assert!(created.meta.is_empty());
    let id = created.data[0].get_str("id").unwrap();
    assert!(is_hex_id(id), "assigned id should be 24 hex chars, got {id}");

    let read = pipeline.read(Document::new(), ReadOptions::default()).await.unwrap();
    assert_eq!(read.data, created.data);
    assert!(read.meta.is_empty());
}

#[tokio::test]
async fn read_filters_by_explicit_identifier() {
    let source = MemorySource::new();
    let pipeline = pipeline(&source);

    pipeline
        .create(vec![
            doc! { "id": "id1", "myString": "first", "myNumber": 1 },
            doc! { "id": "id2", "myString": "second", "myNumber": 2 },
        ])
        .await
        .unwrap();

    let read = pipeline.read(doc! { "id": "id2" }, ReadOptions::default()).await.unwrap();
    assert_eq!(read.data.len(), 1);
    assert_eq!(read.data[0].get_str("id").unwrap(), "id2");
    assert_eq!(read.data[0].get_str("myString").unwrap(), "second");
}

#[tokio::test]
async fn read_finds_store_assigned_identifiers() {
    let source = MemorySource::new();
    let pipeline = pipeline(&source);

    let created = pipeline
        .create(vec![
            doc! { "myString": "one", "myNumber": 1 },
            doc! { "myString": "two", "myNumber": 2 },
        ])
        .await
        .unwrap();
    let id = created.data[1].get_str("id").unwrap().to_string();

    // the hex string converts back to the native identifier in the filter
    let read = pipeline.read(doc! { "id": id }, ReadOptions::default()).await.unwrap();
    assert_eq!(read.data.len(), 1);
    assert_eq!(read.data[0].get_str("myString").unwrap(), "two");
}

#[tokio::test]
async fn read_filters_by_identifier_array() {
    let source = MemorySource::new();
    let pipeline = pipeline(&source);

    pipeline
        .create(vec![
            doc! { "id": "id1", "myString": "first", "myNumber": 1 },
            doc! { "id": "id2", "myString": "second", "myNumber": 2 },
            doc! { "id": "id3", "myString": "third", "myNumber": 3 },
        ])
        .await
        .unwrap();

    let read = pipeline
        .read(doc! { "id": ["id1", "id3"] }, ReadOptions::default())
        .await
        .unwrap();
    assert_eq!(read.data.len(), 2);
    assert_eq!(read.data[0].get_str("id").unwrap(), "id1");
    assert_eq!(read.data[1].get_str("id").unwrap(), "id3");
}

#[tokio::test]
async fn read_applies_skip_limit_sort_and_count() {
    let source = MemorySource::new();
    let pipeline = pipeline(&source);

    pipeline
        .create(
            (1..=5)
                .map(|n| doc! { "myString": "n", "myNumber": n })
                .collect(),
        )
        .await
        .unwrap();

    let options = ReadOptions {
        skip: 1,
        limit: 2,
        with_count: true,
        sort: vec![Sort::descending("myNumber")],
        ..ReadOptions::default()
    };
    let read = pipeline.read(Document::new(), options).await.unwrap();

    let numbers: Vec<i32> = read
        .data
        .iter()
        .map(|entry| entry.get_i32("myNumber").unwrap())
        .collect();
    assert_eq!(numbers, vec![4, 3]);
    // the count covers every match, independent of skip and limit
    assert_eq!(read.meta.get_i64("count").unwrap(), 5);
}

#[tokio::test]
async fn read_forwards_projection() {
    let source = MemorySource::new();
    let pipeline = pipeline(&source);

    pipeline
        .create(vec![doc! { "myString": "kept", "myNumber": 1 }])
        .await
        .unwrap();

    let options = ReadOptions {
        projection: Some(doc! { "myNumber": 1, "_id": 0 }),
        ..ReadOptions::default()
    };
    let read = pipeline.read(Document::new(), options).await.unwrap();
    assert_eq!(read.data, vec![doc! { "myNumber": 1 }]);
}

#[tokio::test]
async fn read_rejects_out_of_range_limit() {
    let source = MemorySource::new();
    let pipeline = pipeline(&source);
    let err = pipeline
        .read(Document::new(), ReadOptions { limit: 10_001, ..ReadOptions::default() })
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidOptions(_)));
}

#[tokio::test]
async fn output_is_restricted_to_declared_fields() {
    let source = MemorySource::new();
    let pipeline = pipeline(&source);

    let created = pipeline
        .create(vec![doc! { "myString": "x", "myNumber": 1, "stray": true }])
        .await
        .unwrap();
    assert!(!created.data[0].contains_key("stray"));

    // the undeclared field is stored, it is just never returned
    let stored = source.dump(COLLECTION).await;
    assert_eq!(stored[0].get_bool("stray").unwrap(), true);

    let read = pipeline.read(Document::new(), ReadOptions::default()).await.unwrap();
    assert!(!read.data[0].contains_key("stray"));
}

#[tokio::test]
async fn patch_reports_modified_count_and_returns_matched_set() {
    let source = MemorySource::new();
    let pipeline = pipeline(&source);

    // the first matched document already carries the target value
    pipeline
        .create(vec![
            doc! { "myString": "group", "myNumber": 9 },
            doc! { "myString": "group", "myNumber": 1 },
            doc! { "myString": "group", "myNumber": 2 },
        ])
        .await
        .unwrap();

    let result = pipeline
        .patch(
            doc! { "myString": "group" },
            doc! { "myNumber": 9 },
            PatchOptions { skip: 0, limit: 2 },
        )
        .await
        .unwrap();

    assert_eq!(result.meta.get_i64("updatedCount").unwrap(), 1);
    assert_eq!(result.data.len(), 2);
    for entry in &result.data {
        assert_eq!(entry.get_i32("myNumber").unwrap(), 9);
    }

    // the third matching document stayed out of the bounded batch
    let stored = source.dump(COLLECTION).await;
    assert_eq!(stored[2].get_i32("myNumber").unwrap(), 2);
}

#[tokio::test]
async fn patch_honors_skip() {
    let source = MemorySource::new();
    let pipeline = pipeline(&source);

    pipeline
        .create(vec![
            doc! { "myString": "a", "myNumber": 1 },
            doc! { "myString": "a", "myNumber": 2 },
        ])
        .await
        .unwrap();

    let result = pipeline
        .patch(
            doc! { "myString": "a" },
            doc! { "myNumber": 7 },
            PatchOptions { skip: 1, limit: 1 },
        )
        .await
        .unwrap();
    assert_eq!(result.data.len(), 1);
    assert_eq!(result.meta.get_i64("updatedCount").unwrap(), 1);

    let stored = source.dump(COLLECTION).await;
    assert_eq!(stored[0].get_i32("myNumber").unwrap(), 1);
    assert_eq!(stored[1].get_i32("myNumber").unwrap(), 7);
}

#[tokio::test]
async fn patch_null_value_removes_the_field() {
    let source = MemorySource::new();
    let pipeline = pipeline(&source);

    pipeline
        .create(vec![doc! { "id": "id1", "myString": "x", "myNumber": 1 }])
        .await
        .unwrap();

    let result = pipeline
        .patch(doc! { "id": "id1" }, doc! { "myNumber": Bson::Null }, PatchOptions::default())
        .await
        .unwrap();

    assert_eq!(result.meta.get_i64("updatedCount").unwrap(), 1);
    assert!(!result.data[0].contains_key("myNumber"));
    assert_eq!(result.data[0].get_str("myString").unwrap(), "x");
}

#[tokio::test]
async fn patch_and_delete_short_circuit_on_zero_matches() {
    let source = MemorySource::new();
    let pipeline = pipeline(&source);

    pipeline
        .create(vec![doc! { "myString": "present", "myNumber": 1 }])
        .await
        .unwrap();
    let before = source.dump(COLLECTION).await;

    let patched = pipeline
        .patch(doc! { "myString": "missing" }, doc! { "myNumber": 5 }, PatchOptions::default())
        .await
        .unwrap();
    assert!(patched.data.is_empty());
    assert_eq!(patched.meta, doc! { "updatedCount": 0_i64 });

    let deleted = pipeline
        .delete(doc! { "myString": "missing" }, DeleteOptions::default())
        .await
        .unwrap();
    assert!(deleted.data.is_empty());
    assert_eq!(deleted.meta, doc! { "deletedCount": 0_i64 });

    // no mutating call reached the store
    assert_eq!(source.dump(COLLECTION).await, before);
}

#[tokio::test]
async fn delete_returns_predeletion_documents() {
    let source = MemorySource::new();
    let pipeline = pipeline(&source);

    pipeline
        .create(vec![
            doc! { "myString": "a", "myNumber": 1 },
            doc! { "myString": "a", "myNumber": 2 },
            doc! { "myString": "a", "myNumber": 3 },
        ])
        .await
        .unwrap();

    let result = pipeline
        .delete(doc! { "myString": "a" }, DeleteOptions { limit: 2 })
        .await
        .unwrap();

    assert_eq!(result.meta.get_i64("deletedCount").unwrap(), 2);
    let numbers: Vec<i32> = result
        .data
        .iter()
        .map(|entry| entry.get_i32("myNumber").unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2]);

    let remaining = source.dump(COLLECTION).await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].get_i32("myNumber").unwrap(), 3);
}

#[tokio::test]
async fn replace_defaults_identifier_and_overwrites() {
    let source = MemorySource::new();
    let pipeline = pipeline(&source);

    let created = pipeline
        .create(vec![doc! { "myString": "before", "myNumber": 1 }])
        .await
        .unwrap();
    let id = created.data[0].get_str("id").unwrap().to_string();

    let replaced = pipeline
        .replace(&id, doc! { "myString": "after", "myNumber": 7 })
        .await
        .unwrap();
    assert!(replaced.meta.is_empty());
    assert_eq!(replaced.data[0].get_str("id").unwrap(), id);
    assert_eq!(replaced.data[0].get_str("myString").unwrap(), "after");

    let read = pipeline.read(doc! { "id": id }, ReadOptions::default()).await.unwrap();
    assert_eq!(read.data[0].get_str("myString").unwrap(), "after");
    assert_eq!(read.data[0].get_i32("myNumber").unwrap(), 7);
}

#[tokio::test]
async fn replace_surfaces_missing_documents() {
    let source = MemorySource::new();
    let pipeline = pipeline(&source);

    let err = pipeline
        .replace("aaaaaaaaaaaaaaaaaaaaaaaa", doc! { "myString": "x", "myNumber": 1 })
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::DocumentNotFound(_, _)));

    // a malformed identifier is a plain no-match, not a hard failure
    let err = pipeline
        .replace("not-an-identifier", doc! { "myString": "x", "myNumber": 1 })
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::DocumentNotFound(_, _)));
}

fn aggregate_view(source: &MemorySource) -> MongoAggregatePipeline<MemorySource> {
    MongoAggregatePipeline::new(source.clone(), COLLECTION, model(), |query: &Document| {
        let minimum = query.get("minNumber").cloned().unwrap_or(Bson::Int32(0));
        vec![doc! { "$match": { "myNumber": { "$gte": minimum } } }]
    })
    .with_extra_query_schema(ModelSchema::builder().field("minNumber").build())
}

async fn seed_aggregate(source: &MemorySource) {
    pipeline(source)
        .create(vec![
            doc! { "myString": "a", "myNumber": 1 },
            doc! { "myString": "a", "myNumber": 2 },
            doc! { "myString": "b", "myNumber": 3 },
        ])
        .await
        .unwrap();
}

#[tokio::test]
async fn aggregate_runs_caller_stages_then_trailing_match() {
    let source = MemorySource::new();
    seed_aggregate(&source).await;
    let view = aggregate_view(&source);

    // the caller stage consumes minNumber; the rest of the query filters last
    let read = view
        .read(doc! { "minNumber": 2, "myString": "a" }, ReadOptions::default())
        .await
        .unwrap();
    assert_eq!(read.data.len(), 1);
    assert_eq!(read.data[0].get_str("myString").unwrap(), "a");
    assert_eq!(read.data[0].get_i32("myNumber").unwrap(), 2);
}

#[tokio::test]
async fn aggregate_reports_cardinality_and_merges_meta_stages() {
    let source = MemorySource::new();
    seed_aggregate(&source).await;
    let view = aggregate_view(&source).with_meta_stages(|_query: &Document| {
        vec![doc! { "$count": "total" }]
    });

    let read = view
        .read(
            doc! { "minNumber": 2 },
            ReadOptions { with_count: true, ..ReadOptions::default() },
        )
        .await
        .unwrap();
    assert_eq!(read.data.len(), 2);
    // count reflects the aggregation's own cardinality
    assert_eq!(read.meta.get_i64("count").unwrap(), 2);
    // the meta pipeline's summary document is merged in
    assert_eq!(read.meta.get_i64("total").unwrap(), 3);
}

#[tokio::test]
async fn aggregate_variant_rejects_mutations_dynamically() {
    use pipelayer_core::pipeline::DynPipeline;

    let source = MemorySource::new();
    let view = aggregate_view(&source);

    let err = DynPipeline::create(&view, vec![doc! { "myString": "x" }])
        .await
        .unwrap_err();
    match err {
        PipelineError::NotSupported { operation, adapter } => {
            assert_eq!(operation, "create");
            assert_eq!(adapter, "MongoAggregatePipeline");
        }
        other => panic!("expected NotSupported, got {other:?}"),
    }

    let err = DynPipeline::patch(&view, Document::new(), Document::new(), PatchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NotSupported { operation: "patch", .. }));

    let err = DynPipeline::delete(&view, Document::new(), DeleteOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NotSupported { operation: "delete", .. }));

    let err = DynPipeline::replace(&view, "id", Document::new()).await.unwrap_err();
    assert!(matches!(err, PipelineError::NotSupported { operation: "replace", .. }));
}

#[tokio::test]
async fn dyn_pipelines_dispatch_over_mixed_capabilities() {
    use pipelayer_core::pipeline::DynPipeline;

    let source = MemorySource::new();
    seed_aggregate(&source).await;

    let adapters: Vec<Box<dyn DynPipeline>> = vec![
        Box::new(pipeline(&source)),
        Box::new(aggregate_view(&source)),
    ];

    for adapter in &adapters {
        let read = DynPipeline::read(adapter.as_ref(), Document::new(), ReadOptions::default())
            .await
            .unwrap();
        assert_eq!(read.data.len(), 3);
    }

    // only the full adapter accepts mutations through the dynamic surface
    assert!(
        DynPipeline::create(adapters[0].as_ref(), vec![doc! { "myString": "d", "myNumber": 4 }])
            .await
            .is_ok()
    );
    assert!(
        DynPipeline::create(adapters[1].as_ref(), vec![doc! { "myString": "e", "myNumber": 5 }])
            .await
            .is_err()
    );
}
