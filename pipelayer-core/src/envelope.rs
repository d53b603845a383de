//! Result envelope returned by every pipeline operation.

use bson::Document;
use serde::{Deserialize, Serialize};

/// Meta key names shared between operations.
///
/// `meta` is a plain document so adapters can extend it (the aggregation
/// variant merges a caller-produced summary document into it); the keys the
/// base operations emit are fixed here.
pub mod meta {
    /// Count of all documents matching the read query, set when `withCount`
    /// is requested.
    pub const COUNT: &str = "count";
    /// Count of documents actually modified by a patch operation.
    pub const UPDATED_COUNT: &str = "updatedCount";
    /// Count of documents deleted by a delete operation.
    pub const DELETED_COUNT: &str = "deletedCount";
}

/// The `{data, meta}` pair every pipeline operation resolves to.
///
/// `data` holds domain-shaped documents; `meta` is operation-specific and
/// always present, possibly empty.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Domain documents produced by the operation.
    pub data: Vec<Document>,
    /// Operation metadata (match counts, mutation counts, summaries).
    pub meta: Document,
}

impl ResultSet {
    /// Creates a result set from its parts.
    pub fn new(data: Vec<Document>, meta: Document) -> Self {
        Self { data, meta }
    }

    /// A result set with no documents and empty metadata.
    pub fn empty() -> Self {
        Self::default()
    }
}
