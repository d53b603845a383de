//! Patch compilation: turning a partial document into an update instruction.

use bson::{Bson, Document};

/// Compiles a storage-translated partial document into a `$set`/`$unset`
/// update instruction.
///
/// Only top-level fields are split: a null value marks the field for
/// removal, any other value (including a whole nested document) is set
/// as-is. There are no deep-merge semantics. Empty parts are omitted, so a
/// patch with no null fields produces a `$set`-only instruction.
pub fn to_patch_update(values: Document) -> Document {
    let mut set = Document::new();
    let mut unset = Document::new();
    for (field, value) in values {
        match value {
            Bson::Null => {
                unset.insert(field, "");
            }
            other => {
                set.insert(field, other);
            }
        }
    }

    let mut update = Document::new();
    if !set.is_empty() {
        update.insert("$set", set);
    }
    if !unset.is_empty() {
        update.insert("$unset", unset);
    }
    update
}
