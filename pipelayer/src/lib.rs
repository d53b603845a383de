//! Main pipelayer crate: a CRUD pipeline adapter layer for document stores.
//!
//! A pipeline exposes a uniform create/read/replace/patch/delete contract
//! over a document-oriented backend. The adapter translates between the
//! domain document shape (string `id` field) and the backend's storage shape
//! (`_id` primary key, native object identifiers), and returns every result
//! as a `{data, meta}` envelope.
//!
//! # Quick Start
//!
//! ```ignore
//! use pipelayer::{prelude::*, memory::MemorySource, mongodb::MongoPipeline};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> PipelineResult<()> {
//!     let schema = ModelSchema::builder()
//!         .field("id")
//!         .field("name")
//!         .build();
//!     let pipeline = MongoPipeline::new(MemorySource::new(), "users", schema);
//!
//!     // create assigns an identifier when the input has none
//!     let created = pipeline.create(vec![doc! { "name": "Alice" }]).await?;
//!     let id = created.data[0].get_str("id").unwrap().to_string();
//!
//!     // query by the domain identifier
//!     let read = pipeline.read(doc! { "id": id }, ReadOptions::default()).await?;
//!     assert_eq!(read.data.len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! # Read-only aggregation views
//!
//! `MongoAggregatePipeline` substitutes the filter-based read with a
//! caller-supplied aggregation stage sequence. It implements only
//! [`ReadPipeline`](pipeline::ReadPipeline); the mutation entry points do not
//! exist on it. Behind the dynamic [`DynPipeline`](pipeline::DynPipeline)
//! surface, its mutations fail with a `NotSupported` error naming the
//! operation and the adapter.
//!
//! # Backends
//!
//! - [`memory`] - in-memory collection source for development and testing
//! - [`mongodb`] - the MongoDB adapter and driver binding (requires the
//!   `mongodb` feature)

pub mod prelude;

pub use pipelayer_core::{backend, envelope, error, options, pipeline, schema};

// Re-export BSON types for convenience
pub use bson;

/// In-memory collection source implementations.
pub mod memory {
    pub use pipelayer_memory::{MemoryCollection, MemorySource};
}

/// MongoDB adapter and driver binding.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use pipelayer_mongodb::{
        MongoAggregatePipeline, MongoCollectionHandle, MongoPipeline, MongoSource,
        MongoSourceBuilder,
    };
}
