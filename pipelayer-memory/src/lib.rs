//! In-memory collection source for pipelayer.
//!
//! This crate implements the storage capability surface entirely in memory,
//! with async-aware read-write locks and insertion-ordered collections. It is
//! intended for development and testing; the operator subset it evaluates
//! (`$in`, comparisons, `$exists`, `$set`/`$unset`, a handful of aggregation
//! stages) covers what the pipeline adapters actually emit.
//!
//! # Quick Start
//!
//! ```ignore
//! use pipelayer_memory::MemorySource;
//! use pipelayer_core::backend::{CollectionSource, DocumentCollection, FindRequest};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = MemorySource::new();
//!     let users = source.collection("users").await?;
//!     users.insert_many(vec![doc! { "name": "Alice" }]).await?;
//!     let found = users.find(doc! { "name": "Alice" }, FindRequest::default()).await?;
//!     assert_eq!(found.len(), 1);
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as pipelayer_memory;

pub mod matcher;
pub mod store;

pub use store::{MemoryCollection, MemorySource};
