#![deny(missing_docs)]

//! # OpenAPI Shims
//!
//! Loose structures over the parts of an OpenAPI document the loader checks.
//! Everything is optional so that missing fields become validation messages
//! instead of deserialization failures.

use indexmap::IndexMap;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// The document root.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ShimOpenApi {
    /// OpenAPI version (3.x).
    #[serde(default, deserialize_with = "version_string")]
    pub openapi: Option<String>,
    /// Swagger version (2.0).
    #[serde(default, deserialize_with = "version_string")]
    pub swagger: Option<String>,
    /// API metadata.
    pub info: Option<ShimInfo>,
    /// Reusable components (OAS 3).
    pub components: Option<Value>,
    /// Schema definitions (Swagger 2.0).
    pub definitions: Option<IndexMap<String, Value>>,
    /// Path items in document order.
    pub paths: Option<ShimPaths>,
    /// Webhooks (OAS 3.1+).
    pub webhooks: Option<Value>,
    /// Server list (OAS 3).
    pub servers: Option<Vec<ShimServer>>,
    /// Tag declarations.
    pub tags: Option<Vec<ShimTag>>,
}

impl ShimOpenApi {
    /// True for OAS 3.x documents.
    pub fn is_oas3(&self) -> bool {
        self.openapi.is_some()
    }
}

/// The Info Object.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ShimInfo {
    /// API title.
    pub title: Option<String>,
    /// API version.
    #[serde(default, deserialize_with = "version_string")]
    pub version: Option<String>,
}

/// Accepts a version written as a string or as an unquoted YAML number
/// (`openapi: 3.0` reads back as `"3.0"`).
fn version_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(version)) => Ok(Some(version)),
        Some(Value::Number(version)) => Ok(Some(version.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "version must be a string, found {}",
            other
        ))),
    }
}

/// The Paths Object, split into path items and `x-` extensions.
#[derive(Debug, Clone, Default)]
pub(crate) struct ShimPaths {
    /// Path items keyed by template, in document order.
    pub items: IndexMap<String, Value>,
}

impl ShimPaths {
    /// Returns true when no concrete path items are present.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'de> Deserialize<'de> for ShimPaths {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = IndexMap::<String, Value>::deserialize(deserializer)?;
        let mut items = IndexMap::new();
        for (key, value) in raw {
            if key.starts_with("x-") {
                continue;
            }
            if !value.is_object() {
                return Err(DeError::custom(format!(
                    "Path item '{}' must be an object",
                    key
                )));
            }
            items.insert(key, value);
        }
        Ok(ShimPaths { items })
    }
}

/// A Server Object.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ShimServer {
    /// Server URL, possibly templated.
    pub url: String,
    /// Template variables.
    pub variables: Option<IndexMap<String, ShimServerVariable>>,
}

/// A Server Variable Object.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ShimServerVariable {
    /// Allowed values.
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<String>>,
    /// Default value.
    pub default: String,
}

/// A Tag Object.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ShimTag {
    /// Tag name.
    pub name: String,
    /// Parent tag (OAS 3.2).
    pub parent: Option<String>,
}
