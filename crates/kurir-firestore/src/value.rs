// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Codec between plain JSON and the Firestore REST value representation.
//!
//! Firestore documents wrap every value in a typed envelope
//! (`{"stringValue": ...}`, `{"integerValue": "42"}`, ...). The domain
//! models speak plain JSON, so this module translates in both directions.
//! Integers ride as decimal strings per the REST protocol; RFC 3339
//! timestamps are stored as plain strings and round-trip through either
//! `stringValue` or `timestampValue`.

use serde_json::{Map, Value, json};

/// Encodes a plain JSON map into a Firestore `fields` object.
pub fn to_fields(map: &Map<String, Value>) -> Value {
    let mut fields = Map::new();
    for (key, value) in map {
        fields.insert(key.clone(), encode(value));
    }
    Value::Object(fields)
}

/// Decodes a Firestore document (`{"name": ..., "fields": {...}}`) into a
/// plain JSON map. Documents without fields decode to an empty map.
pub fn from_document(document: &Value) -> Map<String, Value> {
    let mut map = Map::new();
    if let Some(fields) = document.get("fields").and_then(Value::as_object) {
        for (key, value) in fields {
            map.insert(key.clone(), decode(value));
        }
    }
    map
}

/// Encodes one plain JSON value into its Firestore envelope.
pub fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({"nullValue": null}),
        Value::Bool(b) => json!({"booleanValue": b}),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({"integerValue": i.to_string()})
            } else {
                json!({"doubleValue": n.as_f64()})
            }
        }
        Value::String(s) => json!({"stringValue": s}),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode).collect();
            json!({"arrayValue": {"values": values}})
        }
        Value::Object(map) => json!({"mapValue": {"fields": to_fields(map)}}),
    }
}

/// Decodes one Firestore value envelope back into plain JSON. Unknown
/// envelopes decode to null rather than failing the document.
pub fn decode(value: &Value) -> Value {
    let Some(map) = value.as_object() else {
        return Value::Null;
    };

    if let Some((kind, inner)) = map.iter().next() {
        match kind.as_str() {
            "nullValue" => Value::Null,
            "booleanValue" => inner.clone(),
            "integerValue" => inner
                .as_str()
                .and_then(|s| s.parse::<i64>().ok())
                .map(Value::from)
                .or_else(|| inner.as_i64().map(Value::from))
                .unwrap_or(Value::Null),
            "doubleValue" => inner.clone(),
            "stringValue" | "timestampValue" => inner.clone(),
            "arrayValue" => {
                let items = inner
                    .get("values")
                    .and_then(Value::as_array)
                    .map(|values| values.iter().map(decode).collect())
                    .unwrap_or_default();
                Value::Array(items)
            }
            "mapValue" => Value::Object(from_document(inner)),
            _ => Value::Null,
        }
    } else {
        Value::Null
    }
}
