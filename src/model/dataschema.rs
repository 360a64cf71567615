//! Runtime data contracts

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::meta::{Identifiable, Meta};
use super::Defaults;

/// A JSON-Schema-like document describing variables supplied at execution time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dataschema {
    pub meta: Meta,
    pub data: Map<String, Value>,
}

impl Dataschema {
    pub fn new(meta: Meta, data: Map<String, Value>) -> Self {
        Self { meta, data }
    }

    /// The `properties` mapping, if present and well-formed
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.data.get("properties").and_then(Value::as_object)
    }

    /// Names declared under `data.properties`, in key order
    pub fn property_names(&self) -> Vec<&str> {
        self.properties()
            .map(|props| props.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// The schema-declared `default` for one property
    fn schema_default(&self, property: &str) -> Option<&Value> {
        self.properties()?.get(property)?.get("default")
    }

    /// All schema-declared defaults
    pub fn schema_defaults(&self) -> Defaults {
        self.property_names()
            .into_iter()
            .filter_map(|name| {
                self.schema_default(name)
                    .map(|value| (name.to_string(), value.clone()))
            })
            .collect()
    }

    /// Property names listed in `data.required`
    pub fn required(&self) -> Vec<&str> {
        self.data
            .get("required")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

impl Identifiable for Dataschema {
    fn meta(&self) -> &Meta {
        &self.meta
    }
}
