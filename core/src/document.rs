//! Opaque JSON documents exchanged with the backend.
//!
//! # Design
//! Responses are not re-typed: each endpoint returns a different shape and the
//! client trusts the backend's schema. A `Document` is simply a parsed JSON
//! object. Callers that want structure layer it on with `project`.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ClientError;

/// A parsed JSON object whose shape is not validated by the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Parse a response body. Anything other than a top-level JSON object is
    /// rejected, including an empty body.
    pub fn parse(text: &str) -> Result<Self, ClientError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ClientError::Deserialization(e.to_string()))?;
        Self::try_from(value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String-valued field, `None` if absent or not a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn to_json_string(&self) -> String {
        // A map of `Value`s always serializes.
        serde_json::to_string(&self.0).unwrap_or_default()
    }

    /// Deserialize the document into a caller-defined type.
    pub fn project<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| ClientError::Deserialization(e.to_string()))
    }
}

impl TryFrom<Value> for Document {
    type Error = ClientError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Document(map)),
            other => Err(ClientError::Deserialization(format!(
                "expected a JSON object, got {}",
                kind(&other)
            ))),
        }
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Document(map)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json_string())
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_object() {
        let doc = Document::parse(r#"{"sessionid":"abc","user":{"id":1}}"#).unwrap();
        assert_eq!(doc.get_str("sessionid"), Some("abc"));
        assert_eq!(doc.get("user").unwrap()["id"], 1);
    }

    #[test]
    fn parse_rejects_array() {
        let err = Document::parse("[1,2,3]").unwrap_err();
        assert!(matches!(err, ClientError::Deserialization(ref m) if m.contains("an array")));
    }

    #[test]
    fn parse_rejects_empty_body() {
        assert!(matches!(
            Document::parse("").unwrap_err(),
            ClientError::Deserialization(_)
        ));
    }

    #[test]
    fn get_str_ignores_non_strings() {
        let doc = Document::parse(r#"{"sessionid":42}"#).unwrap();
        assert_eq!(doc.get_str("sessionid"), None);
        assert_eq!(doc.get_str("missing"), None);
    }

    #[test]
    fn project_into_typed_record() {
        #[derive(Deserialize)]
        struct Product {
            id: u64,
            name: String,
        }

        let doc = Document::parse(r#"{"id":7,"name":"Milk","extra":true}"#).unwrap();
        let product: Product = doc.project().unwrap();
        assert_eq!(product.id, 7);
        assert_eq!(product.name, "Milk");

        let bad = Document::parse(r#"{"id":"seven"}"#).unwrap();
        assert!(bad.project::<Product>().is_err());
    }

    #[test]
    fn map_conversions_keep_every_field() {
        let mut map = Map::new();
        map.insert("id".to_string(), Value::from(7));
        map.insert("name".to_string(), Value::from("Brunost"));

        let doc = Document::from(map.clone());
        assert_eq!(doc.as_map(), &map);
        assert_eq!(doc.as_map().len(), 2);
        assert_eq!(doc.into_value(), Value::Object(map));
    }

    #[test]
    fn display_is_compact_json() {
        let doc = Document::parse(r#"{ "a" : 1 }"#).unwrap();
        assert_eq!(doc.to_string(), r#"{"a":1}"#);
    }
}
