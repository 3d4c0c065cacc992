//! Decoding of vertices and edges returned by AGE.
//!
//! A vertex column arrives as
//! `{"id": 844424930131969, "label": "Product", "properties": {...}}`;
//! edges additionally carry `start_id` and `end_id`.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::AppError;

/// A graph vertex.
#[derive(Debug, Clone, Deserialize)]
pub struct Node {
    /// Backend-internal identity, not the domain `id` property.
    #[serde(rename = "id", default)]
    pub graph_id: i64,
    pub label: String,
    #[serde(default)]
    pub properties: Map<String, JsonValue>,
}

/// A graph edge.
#[derive(Debug, Clone, Deserialize)]
pub struct Edge {
    #[serde(rename = "id", default)]
    pub graph_id: i64,
    pub label: String,
    #[serde(default)]
    pub start_id: i64,
    #[serde(default)]
    pub end_id: i64,
    #[serde(default)]
    pub properties: Map<String, JsonValue>,
}

fn property<T: DeserializeOwned>(
    properties: &Map<String, JsonValue>,
    label: &str,
    key: &str,
) -> Result<T, AppError> {
    let value = properties
        .get(key)
        .ok_or_else(|| AppError::Internal(format!("{} has no property '{}'", label, key)))?;
    serde_json::from_value(value.clone()).map_err(|e| {
        AppError::Internal(format!("{}.{} did not deserialize: {}", label, key, e))
    })
}

fn property_opt<T: DeserializeOwned>(
    properties: &Map<String, JsonValue>,
    label: &str,
    key: &str,
) -> Result<Option<T>, AppError> {
    match properties.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|e| {
            AppError::Internal(format!("{}.{} did not deserialize: {}", label, key, e))
        }),
    }
}

fn into_model<T: DeserializeOwned>(
    properties: Map<String, JsonValue>,
    label: &str,
) -> Result<T, AppError> {
    serde_json::from_value(JsonValue::Object(properties))
        .map_err(|e| AppError::Internal(format!("{} did not map to model: {}", label, e)))
}

impl Node {
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, AppError> {
        property(&self.properties, &self.label, key)
    }

    pub fn get_opt<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        property_opt(&self.properties, &self.label, key)
    }

    /// Deserializes the property map into a model.
    pub fn into_model<T: DeserializeOwned>(self) -> Result<T, AppError> {
        into_model(self.properties, &self.label)
    }
}

impl Edge {
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, AppError> {
        property(&self.properties, &self.label, key)
    }

    pub fn get_opt<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        property_opt(&self.properties, &self.label, key)
    }

    pub fn into_model<T: DeserializeOwned>(self) -> Result<T, AppError> {
        into_model(self.properties, &self.label)
    }
}
