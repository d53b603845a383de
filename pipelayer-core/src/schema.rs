//! Model schema description and the output filter derived from it.
//!
//! The model schema is the adapter's view of the schema collaborator: an
//! immutable description exposing whether the model accepts arbitrary extra
//! fields and, if not, the declared field-name set. The [`OutputFilter`]
//! restricts every returned document to that set.

use bson::Document;
use once_cell::sync::OnceCell;

/// Immutable description of a domain model's declared shape.
///
/// Constructed once per adapter through [`ModelSchema::builder`] and never
/// modified afterwards.
///
/// # Example
///
/// ```ignore
/// use pipelayer_core::schema::ModelSchema;
///
/// let schema = ModelSchema::builder()
///     .field("id")
///     .field("name")
///     .field("email")
///     .build();
/// assert!(schema.declares("email"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSchema {
    fields: Vec<String>,
    additional_properties: bool,
}

impl ModelSchema {
    /// Creates a new schema builder.
    pub fn builder() -> ModelSchemaBuilder {
        ModelSchemaBuilder::new()
    }

    /// The declared field names, in declaration order.
    pub fn field_names(&self) -> &[String] {
        &self.fields
    }

    /// Whether documents may carry fields beyond the declared set.
    pub fn allows_additional_properties(&self) -> bool {
        self.additional_properties
    }

    /// Whether `field` is part of the declared set.
    pub fn declares(&self, field: &str) -> bool {
        self.fields.iter().any(|name| name == field)
    }
}

/// Builder for [`ModelSchema`] instances.
#[derive(Debug, Clone, Default)]
pub struct ModelSchemaBuilder {
    fields: Vec<String>,
    additional_properties: bool,
}

impl ModelSchemaBuilder {
    /// Creates a builder with no declared fields and additional properties
    /// disallowed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field. Duplicate declarations are ignored.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.fields.contains(&name) {
            self.fields.push(name);
        }
        self
    }

    /// Sets whether documents may carry undeclared fields.
    pub fn additional_properties(mut self, allowed: bool) -> Self {
        self.additional_properties = allowed;
        self
    }

    /// Builds and returns the final schema.
    pub fn build(self) -> ModelSchema {
        ModelSchema {
            fields: self.fields,
            additional_properties: self.additional_properties,
        }
    }
}

/// Restricts returned documents to the model's declared field set.
///
/// When the schema allows additional properties, documents pass through
/// unchanged. Otherwise the declared field list is computed once, lazily, and
/// every document is rebuilt keeping only the keys present in both the
/// document and that list. Key presence is preserved per document: a field
/// absent from the source stays absent, it is not defaulted.
///
/// The cached list is derived from an immutable schema, so a redundant
/// concurrent computation produces an identical value; no lock is needed.
#[derive(Debug)]
pub struct OutputFilter {
    schema: ModelSchema,
    keys: OnceCell<Vec<String>>,
}

impl OutputFilter {
    /// Creates a filter for the given model schema.
    pub fn new(schema: ModelSchema) -> Self {
        Self { schema, keys: OnceCell::new() }
    }

    /// The schema this filter was built from.
    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    /// Applies the filter to a batch of documents.
    pub fn apply(&self, documents: Vec<Document>) -> Vec<Document> {
        if self.schema.allows_additional_properties() {
            return documents;
        }
        let keys = self.keys.get_or_init(|| self.schema.field_names().to_vec());
        documents
            .into_iter()
            .map(|document| {
                let mut filtered = Document::new();
                for key in keys {
                    if let Some(value) = document.get(key) {
                        filtered.insert(key.clone(), value.clone());
                    }
                }
                filtered
            })
            .collect()
    }
}
