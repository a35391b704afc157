//! In-memory sources for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;

use catmig_model::ObjectType;

use crate::error::{Result, StandardsError};
use crate::reference::ReferenceRow;
use crate::schema::SchemaSource;
use crate::source::ReferenceDataSource;

#[derive(Debug, Default)]
pub struct StaticReferenceDataSource {
    tables: HashMap<String, Vec<ReferenceRow>>,
}

impl StaticReferenceDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table<'a>(
        mut self,
        name: &str,
        rows: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>,
    ) -> Self {
        let rows = rows
            .into_iter()
            .map(|(code, id, label)| ReferenceRow::new(code, id, label))
            .collect();
        self.tables.insert(name.to_string(), rows);
        self
    }
}

impl ReferenceDataSource for StaticReferenceDataSource {
    fn fetch(&self, table: &str) -> Result<Vec<ReferenceRow>> {
        self.tables
            .get(table)
            .cloned()
            .ok_or_else(|| StandardsError::TableUnavailable {
                table: table.to_string(),
                message: "not registered".to_string(),
            })
    }
}

/// Counts fetches so tests can check caching.
#[derive(Debug, Default)]
pub struct InMemorySchemaSource {
    schemas: HashMap<ObjectType, Value>,
    documents: HashMap<String, Value>,
    fetches: AtomicUsize,
}

impl InMemorySchemaSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, object_type: ObjectType, schema: Value) -> Self {
        self.schemas.insert(object_type, schema);
        self
    }

    pub fn with_document(mut self, name: &str, document: Value) -> Self {
        self.documents.insert(name.to_string(), document);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl SchemaSource for InMemorySchemaSource {
    fn fetch(&self, object_type: ObjectType) -> Result<Value> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.schemas
            .get(&object_type)
            .cloned()
            .ok_or_else(|| StandardsError::SchemaUnavailable {
                object_type,
                message: "not registered".to_string(),
            })
    }

    fn fetch_document(&self, name: &str) -> Result<Value> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.documents
            .get(name)
            .cloned()
            .ok_or_else(|| StandardsError::SchemaDocumentUnavailable {
                name: name.to_string(),
                message: "not registered".to_string(),
            })
    }
}
