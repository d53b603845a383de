//! Storage-filter evaluation for the in-memory source.
//!
//! Filters arrive in the backend's native shape: a document mapping field
//! names to either a plain value (equality) or an operator document such as
//! `{ "$in": [...] }`. This module evaluates that subset against stored
//! documents and provides the value ordering used for sorting.

use std::{cmp::Ordering, collections::HashMap};

use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};

/// Normalized, comparable view of a BSON value.
///
/// Integers and doubles collapse to `f64` so mixed numeric types compare
/// naturally; object identifiers compare by their byte order.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null or an uncomparable type
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (all integers and floats normalized to f64)
    Number(f64),
    /// DateTime value
    DateTime(DateTime),
    /// Object identifier
    ObjectId(&'a ObjectId),
    /// String value
    String(&'a str),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Map/Object of comparable values
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::ObjectId(value) => Comparable::ObjectId(value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(items) => Comparable::Array(items.iter().map(Comparable::from).collect()),
            Bson::Document(entries) => Comparable::Map(
                entries
                    .iter()
                    .map(|(key, value)| (key.as_str(), Comparable::from(value)))
                    .collect(),
            ),
            _ => Comparable::Null,
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Orders two optional field values for sorting; a missing field sorts as
/// null, uncomparable pairs as equal.
pub(crate) fn compare_values(left: Option<&Bson>, right: Option<&Bson>) -> Ordering {
    let left = left.map(Comparable::from).unwrap_or(Comparable::Null);
    let right = right.map(Comparable::from).unwrap_or(Comparable::Null);
    left.partial_cmp(&right).unwrap_or(Ordering::Equal)
}

/// Returns true when `document` satisfies every field condition in `filter`.
pub(crate) fn matches(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(field, condition)| field_matches(document, field, condition))
}

fn field_matches(document: &Document, field: &str, condition: &Bson) -> bool {
    let value = document.get(field);
    match condition {
        Bson::Document(operators) if is_operator_document(operators) => operators
            .iter()
            .all(|(operator, operand)| operator_matches(value, operator, operand)),
        expected => value
            .map(|actual| Comparable::from(actual) == Comparable::from(expected))
            .unwrap_or(false),
    }
}

fn is_operator_document(document: &Document) -> bool {
    !document.is_empty() && document.keys().all(|key| key.starts_with('$'))
}

fn operator_matches(value: Option<&Bson>, operator: &str, operand: &Bson) -> bool {
    match operator {
        "$exists" => {
            let should_exist = !matches!(operand, Bson::Boolean(false));
            value.is_some() == should_exist
        }
        "$in" => match (value, operand) {
            (Some(actual), Bson::Array(candidates)) => in_matches(actual, candidates),
            _ => false,
        },
        "$eq" => value
            .map(|actual| Comparable::from(actual) == Comparable::from(operand))
            .unwrap_or(false),
        "$ne" => value
            .map(|actual| Comparable::from(actual) != Comparable::from(operand))
            .unwrap_or(true),
        "$gt" | "$gte" | "$lt" | "$lte" => value
            .and_then(|actual| Comparable::from(actual).partial_cmp(&Comparable::from(operand)))
            .map(|ordering| match operator {
                "$gt" => ordering == Ordering::Greater,
                "$gte" => ordering != Ordering::Less,
                "$lt" => ordering == Ordering::Less,
                _ => ordering != Ordering::Greater,
            })
            .unwrap_or(false),
        _ => false,
    }
}

/// Membership test: the field equals one of the candidates, or is an array
/// containing one of them.
fn in_matches(actual: &Bson, candidates: &[Bson]) -> bool {
    if candidates
        .iter()
        .any(|candidate| Comparable::from(actual) == Comparable::from(candidate))
    {
        return true;
    }
    match actual {
        Bson::Array(items) => items.iter().any(|item| {
            candidates
                .iter()
                .any(|candidate| Comparable::from(item) == Comparable::from(candidate))
        }),
        _ => false,
    }
}
