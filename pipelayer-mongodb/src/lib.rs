//! MongoDB-shaped adapter for the pipelayer CRUD contract.
//!
//! This crate translates between the domain document shape (string `id`
//! field) and the storage shape (`_id` primary key, object identifiers) and
//! orchestrates the store calls behind each contract operation:
//!
//! - **Format translation** ([`format`]) - recursive document/query
//!   reshaping, identifier remapping and membership-filter expansion
//! - **Patch compilation** ([`patch`]) - null-vs-value split into a
//!   `$set`/`$unset` update instruction
//! - **Adapter** ([`adapter`]) - the full CRUD adapter, including the
//!   find-then-mutate-then-refetch orchestration for patch and delete
//! - **Aggregation variant** ([`aggregate`]) - a read-only adapter whose
//!   result set comes from a caller-supplied aggregation stage sequence
//! - **Driver binding** ([`driver`]) - the capability traits implemented on
//!   the official MongoDB driver
//!
//! # Example
//!
//! ```ignore
//! use pipelayer_mongodb::{MongoPipeline, MongoSource};
//! use pipelayer_core::{pipeline::Pipeline, schema::ModelSchema};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = MongoSource::builder("mongodb://localhost:27017", "app")
//!         .build()
//!         .await?;
//!     let users = MongoPipeline::new(
//!         source,
//!         "users",
//!         ModelSchema::builder().field("id").field("name").build(),
//!     );
//!
//!     let created = users.create(vec![doc! { "name": "Alice" }]).await?;
//!     println!("assigned id: {:?}", created.data[0].get("id"));
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as pipelayer_mongodb;

pub mod adapter;
pub mod aggregate;
pub mod driver;
pub mod format;
pub mod patch;

pub use adapter::MongoPipeline;
pub use aggregate::MongoAggregatePipeline;
pub use driver::{MongoCollectionHandle, MongoSource, MongoSourceBuilder};
