//! Core abstractions for the pipelayer project: a generic CRUD contract over
//! document-oriented storage backends.
//!
//! This crate provides:
//!
//! - **Pipeline contract** ([`pipeline`]) - The create/read/replace/patch/delete
//!   traits every adapter implements, in read-only and full flavors
//! - **Result envelope** ([`envelope`]) - The `{data, meta}` pair returned by
//!   every operation
//! - **Operation options** ([`options`]) - Validated skip/limit/sort/projection
//!   parameters for read, patch and delete
//! - **Model schema** ([`schema`]) - The immutable model description and the
//!   output filter derived from it
//! - **Backend capability surface** ([`backend`]) - The minimal set of store
//!   operations an adapter needs from its storage collaborator
//! - **Error handling** ([`error`]) - Error types and result alias
//!
//! # Example
//!
//! ```ignore
//! use pipelayer_core::{pipeline::Pipeline, schema::ModelSchema};
//! use bson::doc;
//!
//! let schema = ModelSchema::builder()
//!     .field("id")
//!     .field("name")
//!     .build();
//!
//! let created = adapter.create(vec![doc! { "name": "Alice" }]).await?;
//! println!("assigned id: {:?}", created.data[0].get("id"));
//! # Ok::<(), pipelayer_core::error::PipelineError>(())
//! ```

#[allow(unused_extern_crates)]
extern crate self as pipelayer_core;

pub mod backend;
pub mod envelope;
pub mod error;
pub mod options;
pub mod pipeline;
pub mod schema;
