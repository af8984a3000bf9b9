//! Dataset record type
//!
//! Records travel through every stage as plain JSON objects: the scripts
//! that produce them add fields (`id`, vector fields, `@search.action`)
//! without a fixed schema, and the store and index consume them verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Field name Azure AI Search reads to decide what to do with a document
pub const SEARCH_ACTION_FIELD: &str = "@search.action";

/// A single dataset record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// The record's primary key, if one has been assigned
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.0.insert("id".to_string(), Value::String(id.into()));
    }

    /// Text value of a field, or an error naming the field when it is
    /// missing or not a string
    pub fn text(&self, field: &str) -> Result<&str> {
        match self.0.get(field) {
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(Error::InvalidInput(format!(
                "field '{}' of record {} is not text: {}",
                field,
                self.describe(),
                other
            ))),
            None => Err(Error::InvalidInput(format!(
                "record {} has no field '{}'",
                self.describe(),
                field
            ))),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn set_vector(&mut self, field: &str, vector: Vec<f32>) {
        let values = vector.into_iter().map(Value::from).collect();
        self.0.insert(field.to_string(), Value::Array(values));
    }

    /// Read a vector field back as `f32`s
    pub fn vector(&self, field: &str) -> Option<Vec<f32>> {
        self.0
            .get(field)?
            .as_array()?
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32))
            .collect()
    }

    /// Mark the record so the search service uploads it when indexed
    pub fn mark_for_upload(&mut self) {
        self.0.insert(
            SEARCH_ACTION_FIELD.to_string(),
            Value::String("upload".to_string()),
        );
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    fn describe(&self) -> String {
        match self.id() {
            Some(id) => format!("'{}'", id),
            None => "(no id)".to_string(),
        }
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
