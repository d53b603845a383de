//! Operation options for read, patch and delete.
//!
//! Every options struct carries the contract's defaults through its `Default`
//! implementation (and serde, for options arriving as documents) and enforces
//! its range bounds through [`validate`](ReadOptions::validate), called by
//! adapters before any store call is issued.

use bson::Document;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Upper bound on the number of documents a read may return.
pub const READ_LIMIT_MAX: u64 = 10_000;
/// Upper bound on the number of documents a patch or delete may affect.
pub const MUTATION_LIMIT_MAX: u64 = 100;

/// Sort direction for read results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Ascending,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Descending,
}

impl SortDirection {
    /// The backend's numeric rendering of this direction.
    pub fn as_i32(self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

/// Sort specification: which field to order by, and in which direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sort {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

impl Sort {
    /// Creates a sort specification.
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self { field: field.into(), direction }
    }

    /// Ascending sort on `field`.
    pub fn ascending(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Ascending)
    }

    /// Descending sort on `field`.
    pub fn descending(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Descending)
    }
}

/// Renders sort specifications as the backend's `field -> 1/-1` order document.
pub fn sort_document(sorts: &[Sort]) -> Document {
    let mut document = Document::new();
    for sort in sorts {
        document.insert(sort.field.clone(), sort.direction.as_i32());
    }
    document
}

/// Options accepted by the read operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReadOptions {
    /// Offset of the first document to return.
    pub skip: u64,
    /// Number of documents to return; 0 means no limit.
    pub limit: u64,
    /// Whether `meta` should contain the count of all documents matching the
    /// query, independent of skip and limit.
    pub with_count: bool,
    /// Sort order of the results.
    pub sort: Vec<Sort>,
    /// Opaque projection forwarded to the backend.
    pub projection: Option<Document>,
}

impl ReadOptions {
    /// Checks the option ranges, rejecting out-of-bound values before any
    /// store call.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.limit > READ_LIMIT_MAX {
            return Err(PipelineError::InvalidOptions(format!(
                "read limit {} exceeds maximum {}",
                self.limit, READ_LIMIT_MAX
            )));
        }
        Ok(())
    }
}

/// Options accepted by the patch operation, bounding how many matching
/// documents are affected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchOptions {
    /// Offset of the first document to modify.
    pub skip: u64,
    /// Number of documents to modify, between 1 and 100.
    pub limit: u64,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self { skip: 0, limit: 1 }
    }
}

impl PatchOptions {
    /// Checks the option ranges.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.limit < 1 || self.limit > MUTATION_LIMIT_MAX {
            return Err(PipelineError::InvalidOptions(format!(
                "patch limit {} must be between 1 and {}",
                self.limit, MUTATION_LIMIT_MAX
            )));
        }
        Ok(())
    }
}

/// Options accepted by the delete operation. The limit bounds the matched
/// set; it does not alter how the deleted count is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteOptions {
    /// Number of documents to delete, between 1 and 100.
    pub limit: u64,
}

impl Default for DeleteOptions {
    fn default() -> Self {
        Self { limit: 1 }
    }
}

impl DeleteOptions {
    /// Checks the option ranges.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.limit < 1 || self.limit > MUTATION_LIMIT_MAX {
            return Err(PipelineError::InvalidOptions(format!(
                "delete limit {} must be between 1 and {}",
                self.limit, MUTATION_LIMIT_MAX
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn read_options_defaults() {
        let options = ReadOptions::default();
        assert_eq!(options.skip, 0);
        assert_eq!(options.limit, 0);
        assert!(!options.with_count);
        assert!(options.sort.is_empty());
        assert!(options.projection.is_none());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn read_options_rejects_oversized_limit() {
        let options = ReadOptions { limit: READ_LIMIT_MAX + 1, ..ReadOptions::default() };
        assert!(matches!(options.validate(), Err(PipelineError::InvalidOptions(_))));
    }

    #[test]
    fn patch_options_defaults_and_bounds() {
        let options = PatchOptions::default();
        assert_eq!(options.skip, 0);
        assert_eq!(options.limit, 1);
        assert!(options.validate().is_ok());

        assert!(PatchOptions { skip: 0, limit: 0 }.validate().is_err());
        assert!(PatchOptions { skip: 0, limit: 101 }.validate().is_err());
        assert!(PatchOptions { skip: 0, limit: 100 }.validate().is_ok());
    }

    #[test]
    fn delete_options_defaults_and_bounds() {
        assert_eq!(DeleteOptions::default().limit, 1);
        assert!(DeleteOptions { limit: 0 }.validate().is_err());
        assert!(DeleteOptions { limit: 100 }.validate().is_ok());
    }

    #[test]
    fn read_options_deserialize_from_wire_shape() {
        let options: ReadOptions = serde_json::from_value(serde_json::json!({
            "skip": 5,
            "withCount": true,
        }))
        .unwrap();
        assert_eq!(options.skip, 5);
        assert_eq!(options.limit, 0);
        assert!(options.with_count);
    }

    #[test]
    fn sort_document_renders_directions_in_order() {
        let sorts = [Sort::descending("createdAt"), Sort::ascending("name")];
        assert_eq!(sort_document(&sorts), doc! { "createdAt": -1, "name": 1 });
    }
}
