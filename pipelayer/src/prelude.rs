//! Convenient re-exports of commonly used types from pipelayer.
//!
//! Import this prelude module to quickly access the most frequently used
//! types and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use pipelayer::prelude::*;
//! ```

pub use pipelayer_core::{
    backend::{CollectionSource, DocumentCollection, FindRequest},
    envelope::{ResultSet, meta},
    error::{PipelineError, PipelineResult},
    options::{DeleteOptions, PatchOptions, ReadOptions, Sort, SortDirection},
    pipeline::{DynPipeline, Pipeline, ReadPipeline},
    schema::{ModelSchema, ModelSchemaBuilder, OutputFilter},
};
