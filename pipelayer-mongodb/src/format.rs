//! Structural translation between domain and storage document shapes.
//!
//! The domain side names its identifier `id` and carries it as a 24-character
//! hex string; the storage side names it `_id` and carries a native object
//! identifier. Translation is a pair of pure, total transforms over
//! arbitrarily nested BSON, built from a deep value map and a deep key map.
//! A string that does not match the identifier shape is never reinterpreted:
//! it passes through unchanged and, used in a filter, simply matches nothing.

use bson::{Bson, Document, doc, oid::ObjectId};

/// Domain-facing identifier field name.
pub const DOMAIN_ID: &str = "id";
/// Storage primary-key field name.
pub const STORAGE_ID: &str = "_id";

/// Returns true when `value` has the shape of an object identifier rendered
/// as hex: exactly 24 characters, each a digit or lowercase `a`-`f`.
pub fn is_object_id_hex(value: &str) -> bool {
    value.len() == 24 && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Deep value map: arrays and documents are rebuilt from transformed
/// children and then passed to `transform` themselves; scalars are the base
/// case.
fn deep_map<F>(value: Bson, transform: &F) -> Bson
where
    F: Fn(Bson) -> Bson,
{
    match value {
        Bson::Array(items) => transform(Bson::Array(
            items
                .into_iter()
                .map(|item| deep_map(item, transform))
                .collect(),
        )),
        Bson::Document(entries) => transform(Bson::Document(
            entries
                .into_iter()
                .map(|(key, item)| (key, deep_map(item, transform)))
                .collect(),
        )),
        scalar => transform(scalar),
    }
}

/// Deep key map: renames keys at every nesting level, leaving values
/// untouched.
fn deep_map_keys<F>(value: Bson, rename: &F) -> Bson
where
    F: Fn(String) -> String,
{
    match value {
        Bson::Array(items) => Bson::Array(
            items
                .into_iter()
                .map(|item| deep_map_keys(item, rename))
                .collect(),
        ),
        Bson::Document(entries) => Bson::Document(
            entries
                .into_iter()
                .map(|(key, item)| (rename(key), deep_map_keys(item, rename)))
                .collect(),
        ),
        scalar => scalar,
    }
}

fn rename(from: &'static str, to: &'static str) -> impl Fn(String) -> String {
    move |key| if key == from { to.to_string() } else { key }
}

fn parse_object_id(text: String) -> Bson {
    match ObjectId::parse_str(&text) {
        Ok(oid) => Bson::ObjectId(oid),
        Err(_) => Bson::String(text),
    }
}

fn into_document(value: Bson) -> Document {
    // the transforms never turn a top-level document into anything else
    match value {
        Bson::Document(entries) => entries,
        _ => Document::new(),
    }
}

/// Translates a domain query to storage shape: renames `id` to `_id` at
/// every nesting level, then converts identifier-shaped strings to native
/// identifiers and wraps array values in a `$in` membership filter. The
/// rename runs first so renamed values are still checked.
pub fn to_storage_query(query: Document) -> Document {
    let renamed = deep_map_keys(Bson::Document(query), &rename(DOMAIN_ID, STORAGE_ID));
    into_document(deep_map(renamed, &|value| match value {
        Bson::String(text) if is_object_id_hex(&text) => parse_object_id(text),
        Bson::Array(items) => Bson::Document(doc! { "$in": items }),
        other => other,
    }))
}

/// Translates a domain document to storage shape: converts identifier-shaped
/// strings to native identifiers, then renames `id` to `_id`. Unlike the
/// query path, arrays are preserved as-is (a document is written, not
/// filtered) and value conversion runs before the rename so an explicit
/// caller-supplied identifier is carried exactly.
pub fn to_storage_document(document: Document) -> Document {
    let converted = deep_map(Bson::Document(document), &|value| match value {
        Bson::String(text) if is_object_id_hex(&text) => parse_object_id(text),
        other => other,
    });
    into_document(deep_map_keys(converted, &rename(DOMAIN_ID, STORAGE_ID)))
}

/// Translates a storage document back to domain shape: renders native
/// identifiers as hex strings, then renames `_id` to `id`.
pub fn to_domain_document(document: Document) -> Document {
    let converted = deep_map(Bson::Document(document), &|value| match value {
        Bson::ObjectId(oid) => Bson::String(oid.to_hex()),
        other => other,
    });
    into_document(deep_map_keys(converted, &rename(STORAGE_ID, DOMAIN_ID)))
}

/// Converts a single domain identifier to its storage value. A string that
/// fails the shape check stays a plain string, which matches nothing at
/// query time rather than raising an error.
pub fn to_storage_id(id: &str) -> Bson {
    if is_object_id_hex(id) {
        parse_object_id(id.to_string())
    } else {
        Bson::String(id.to_string())
    }
}

/// Converts a storage-assigned primary key to its domain value.
pub fn from_storage_id(key: Bson) -> Bson {
    match key {
        Bson::ObjectId(oid) => Bson::String(oid.to_hex()),
        other => other,
    }
}
