//! Conversion between plain JSON and Firestore's typed value encoding.
//!
//! Firestore REST wraps every value in a single-key object naming its type,
//! e.g. `{"stringValue": "Ayşe"}`. Documents carry a top-level `fields` map.

use anyhow::{Result, anyhow};
use serde_json::{Map, Number, Value, json};

pub fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or(0.0) }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn encode_fields(map: &Map<String, Value>) -> Value {
    let fields: Map<String, Value> = map.iter().map(|(k, v)| (k.clone(), encode(v))).collect();
    Value::Object(fields)
}

/// Wrap a JSON object as a Firestore document body. Non-object roots are
/// rejected since a document is always a field map.
pub fn encode_document(root: &Value) -> Result<Value> {
    let map = root
        .as_object()
        .ok_or_else(|| anyhow!("firestore document root must be an object"))?;
    Ok(json!({ "fields": encode_fields(map) }))
}

pub fn decode(value: &Value) -> Result<Value> {
    let obj = value
        .as_object()
        .ok_or_else(|| anyhow!("firestore value must be an object"))?;
    let (kind, inner) = obj
        .iter()
        .next()
        .ok_or_else(|| anyhow!("firestore value has no type tag"))?;
    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| anyhow!("booleanValue is not a bool")),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                other => other.as_i64(),
            };
            parsed
                .map(|i| Value::Number(i.into()))
                .ok_or_else(|| anyhow!("integerValue is not an integer"))
        }
        "doubleValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<f64>().ok(),
                other => other.as_f64(),
            };
            parsed
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| anyhow!("doubleValue is not a finite number"))
        }
        "stringValue" | "timestampValue" | "referenceValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| anyhow!("{kind} is not a string")),
        "arrayValue" => {
            let values = match inner.get("values") {
                Some(Value::Array(values)) => values.iter().map(decode).collect::<Result<_>>()?,
                _ => Vec::new(),
            };
            Ok(Value::Array(values))
        }
        "mapValue" => match inner.get("fields") {
            Some(fields) => decode_fields(fields),
            None => Ok(Value::Object(Map::new())),
        },
        other => Err(anyhow!("unsupported firestore value type `{other}`")),
    }
}

pub fn decode_fields(fields: &Value) -> Result<Value> {
    let map = fields
        .as_object()
        .ok_or_else(|| anyhow!("firestore fields must be an object"))?;
    let mut out = Map::new();
    for (key, value) in map {
        out.insert(key.clone(), decode(value)?);
    }
    Ok(Value::Object(out))
}

/// Plain JSON for a fetched document. A document with no fields decodes to
/// an empty object.
pub fn decode_document(document: &Value) -> Result<Value> {
    match document.get("fields") {
        Some(fields) => decode_fields(fields),
        None => Ok(Value::Object(Map::new())),
    }
}
