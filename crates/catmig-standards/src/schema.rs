//! Target schemas, one JSON Schema document per object type.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::debug;

use catmig_model::ObjectType;

use crate::error::{Result, StandardsError};

/// Supplier of target schema documents.
pub trait SchemaSource: Send + Sync {
    fn fetch(&self, object_type: ObjectType) -> Result<Value>;

    /// A document a schema points at with a `$ref`, e.g. `uuid.json`.
    fn fetch_document(&self, name: &str) -> Result<Value> {
        Err(StandardsError::SchemaDocumentUnavailable {
            name: name.to_string(),
            message: "this source serves no referenced documents".to_string(),
        })
    }
}

/// Reads `<object_type>.json` from a directory, e.g. `holdings.json`.
/// Referenced documents are read relative to the same directory.
#[derive(Debug, Clone)]
pub struct DirectorySchemaSource {
    root: PathBuf,
}

impl DirectorySchemaSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SchemaSource for DirectorySchemaSource {
    fn fetch(&self, object_type: ObjectType) -> Result<Value> {
        let path = self.root.join(format!("{}.json", object_type.as_str()));
        if !path.is_file() {
            return Err(StandardsError::SchemaUnavailable {
                object_type,
                message: format!("{} does not exist", path.display()),
            });
        }
        read_json(path)
    }

    fn fetch_document(&self, name: &str) -> Result<Value> {
        let relative = Path::new(name);
        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
        {
            return Err(StandardsError::SchemaDocumentUnavailable {
                name: name.to_string(),
                message: "must be a path inside the schema directory".to_string(),
            });
        }
        let path = self.root.join(relative);
        if !path.is_file() {
            return Err(StandardsError::SchemaDocumentUnavailable {
                name: name.to_string(),
                message: format!("{} does not exist", path.display()),
            });
        }
        read_json(path)
    }
}

fn read_json(path: PathBuf) -> Result<Value> {
    let text = std::fs::read_to_string(&path).map_err(|error| StandardsError::io(&path, error))?;
    serde_json::from_str(&text).map_err(|error| StandardsError::Json {
        path,
        message: error.to_string(),
    })
}

/// Fetches each schema at most once and shares it afterwards.
pub struct SchemaCache<S> {
    source: S,
    schemas: RwLock<HashMap<ObjectType, Arc<Value>>>,
    documents: RwLock<HashMap<String, Arc<Value>>>,
}

impl<S: SchemaSource> SchemaCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            schemas: RwLock::new(HashMap::new()),
            documents: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, object_type: ObjectType) -> Result<Arc<Value>> {
        if let Some(schema) = self.read_cached(object_type) {
            return Ok(schema);
        }
        let document = self.source.fetch(object_type)?;
        if !document.is_object() {
            return Err(StandardsError::InvalidSchema {
                object_type,
                message: "schema document must be a JSON object".to_string(),
            });
        }
        debug!(object_type = %object_type, "schema loaded");
        let mut schemas = self
            .schemas
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let schema = schemas
            .entry(object_type)
            .or_insert_with(|| Arc::new(document));
        Ok(Arc::clone(schema))
    }

    /// Every document `schema` reaches through `$ref`s to other files,
    /// following references inside those documents too. Keys are the
    /// names as written before `#`.
    pub fn referenced_documents(&self, schema: &Value) -> Result<BTreeMap<String, Arc<Value>>> {
        let mut found = BTreeMap::new();
        let mut pending: Vec<String> = external_references(schema).into_iter().collect();
        while let Some(name) = pending.pop() {
            if found.contains_key(&name) {
                continue;
            }
            let document = self.document(&name)?;
            pending.extend(
                external_references(&document)
                    .into_iter()
                    .filter(|next| !found.contains_key(next)),
            );
            found.insert(name, document);
        }
        Ok(found)
    }

    fn document(&self, name: &str) -> Result<Arc<Value>> {
        let cached = self
            .documents
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(name)
            .cloned();
        if let Some(document) = cached {
            return Ok(document);
        }
        let document = Arc::new(self.source.fetch_document(name)?);
        debug!(name, "referenced schema document loaded");
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(Arc::clone(
            documents.entry(name.to_string()).or_insert(document),
        ))
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn read_cached(&self, object_type: ObjectType) -> Option<Arc<Value>> {
        self.schemas
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&object_type)
            .cloned()
    }
}

/// Document names of `$ref`s that leave the current document.
pub fn external_references(schema: &Value) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    collect_references(schema, &mut names);
    names
}

fn collect_references(value: &Value, names: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match (key.as_str(), child) {
                    ("$ref", Value::String(reference)) => {
                        let document = reference.split('#').next().unwrap_or_default();
                        if !document.is_empty() {
                            names.insert(document.to_string());
                        }
                    }
                    ("enum" | "const" | "default" | "examples", _) => {}
                    _ => collect_references(child, names),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, names);
            }
        }
        _ => {}
    }
}

impl<S> std::fmt::Debug for SchemaCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCache").finish_non_exhaustive()
    }
}
