//! Typed objects handed to hooks, and the codec that builds them.
//!
//! The platform's JSON carries type annotations (`{"__type": "Date", …}`,
//! `{"__type": "Pointer", …}`). Decoding and encoding them is the SDK's
//! business and sits behind [`ObjectCodec`]; the gateway only wraps a decoded
//! value in a [`CloudObject`] and attaches hook bookkeeping to it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Side-channel passed to every function and hook invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationMeta {
    pub remote_address: Option<String>,
}

// ── Codec ─────────────────────────────────────────────────────────────────────

/// How an outgoing value is encoded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EncodeMode {
    /// Type-less literal JSON: objects become bare field maps, dates become
    /// ISO strings.
    Plain,
    /// Keeps every `__type` annotation so the client can rebuild typed values.
    FullyTyped,
}

/// Decodes platform JSON into typed values and encodes them back.
pub trait ObjectCodec: Send + Sync + 'static {
    fn decode(&self, json: Value) -> Value;
    fn encode(&self, value: Value, mode: EncodeMode) -> Value;
}

/// Codec that keeps values in their annotated JSON form.
///
/// Decoding is the identity. Plain encoding removes the annotations.
#[derive(Clone, Copy, Debug, Default)]
pub struct TypedJsonCodec;

impl ObjectCodec for TypedJsonCodec {
    fn decode(&self, json: Value) -> Value {
        json
    }

    fn encode(&self, value: Value, mode: EncodeMode) -> Value {
        match mode {
            EncodeMode::FullyTyped => value,
            EncodeMode::Plain => strip_annotations(value),
        }
    }
}

fn strip_annotations(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(strip_annotations).collect()),
        Value::Object(mut map) => {
            match map.get("__type").and_then(Value::as_str) {
                Some("Date") => {
                    if let Some(iso) = map.remove("iso") {
                        return iso;
                    }
                }
                Some("Object" | "Pointer") => {
                    map.remove("__type");
                    map.remove("className");
                }
                _ => {}
            }
            Value::Object(map.into_iter().map(|(k, v)| (k, strip_annotations(v))).collect())
        }
        other => other,
    }
}

// ── CloudObject ───────────────────────────────────────────────────────────────

/// Markers the storage API attaches to objects it sends to hooks, so that a
/// hook saving the same object does not trigger itself again.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HookMarker {
    Before,
    After,
    AfterUpdate,
}

impl HookMarker {
    pub const ALL: [HookMarker; 3] = [Self::Before, Self::After, Self::AfterUpdate];

    /// Wire name of the marker field.
    pub fn key(self) -> &'static str {
        match self {
            Self::Before      => "__before",
            Self::After       => "__after",
            Self::AfterUpdate => "__after_update",
        }
    }
}

/// A decoded platform object (a row of some class, or a user).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CloudObject {
    class_name: Option<String>,
    fields: Map<String, Value>,
    before: Option<Value>,
    after: Option<Value>,
    after_update: Option<Value>,
    updated_keys: Option<Vec<String>>,
}

impl CloudObject {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self { class_name: Some(class_name.into()), ..Self::default() }
    }

    /// Wraps a decoded value. `className` is lifted out, `__type` dropped;
    /// a non-object value yields an object without fields.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            return Self::default();
        };
        fields.remove("__type");
        let class_name = match fields.remove("className") {
            Some(Value::String(name)) => Some(name),
            _ => None,
        };
        Self { class_name, fields, ..Self::default() }
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.fields.get("objectId").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn hook_marker(&self, marker: HookMarker) -> Option<&Value> {
        match marker {
            HookMarker::Before      => self.before.as_ref(),
            HookMarker::After       => self.after.as_ref(),
            HookMarker::AfterUpdate => self.after_update.as_ref(),
        }
    }

    pub fn set_hook_marker(&mut self, marker: HookMarker, value: Value) {
        let slot = match marker {
            HookMarker::Before      => &mut self.before,
            HookMarker::After       => &mut self.after,
            HookMarker::AfterUpdate => &mut self.after_update,
        };
        *slot = Some(value);
    }

    /// Keys changed by the update that triggered a `beforeUpdate` /
    /// `afterUpdate` hook.
    pub fn updated_keys(&self) -> Option<&[String]> {
        self.updated_keys.as_deref()
    }

    pub fn set_updated_keys(&mut self, keys: Vec<String>) {
        self.updated_keys = Some(keys);
    }

    /// Fully annotated JSON form, hook markers included. `updated_keys` is
    /// request-local and not part of the object's data.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        if let Some(class_name) = &self.class_name {
            out.insert("__type".to_owned(), Value::from("Object"));
            out.insert("className".to_owned(), Value::from(class_name.as_str()));
        }
        out.extend(self.fields.clone());
        for marker in HookMarker::ALL {
            if let Some(value) = self.hook_marker(marker) {
                out.insert(marker.key().to_owned(), value.clone());
            }
        }
        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn from_value_lifts_class_name() {
        let obj = CloudObject::from_value(json!({
            "__type": "Object", "className": "Todo", "objectId": "1", "title": "x"
        }));
        assert_eq!(obj.class_name(), Some("Todo"));
        assert_eq!(obj.id(), Some("1"));
        assert_eq!(obj.get("title"), Some(&json!("x")));
        assert!(obj.get("__type").is_none());
    }

    #[test]
    fn markers_round_trip_through_to_value() {
        let mut obj = CloudObject::new("Todo");
        obj.set("title", "x");
        obj.set_hook_marker(HookMarker::Before, json!("sig"));
        obj.set_updated_keys(vec!["title".into()]);

        assert_eq!(obj.hook_marker(HookMarker::Before), Some(&json!("sig")));
        assert_eq!(obj.hook_marker(HookMarker::After), None);
        assert_eq!(obj.to_value(), json!({
            "__type": "Object", "className": "Todo", "title": "x", "__before": "sig"
        }));
    }

    #[test]
    fn meta_uses_platform_field_names() {
        let meta = InvocationMeta { remote_address: Some("203.0.113.7".into()) };
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value, json!({"remoteAddress": "203.0.113.7"}));
        assert_eq!(serde_json::from_value::<InvocationMeta>(value).unwrap(), meta);
    }

    #[test]
    fn plain_encoding_drops_annotations() {
        let typed = json!({
            "__type": "Object",
            "className": "Todo",
            "owner": {"__type": "Pointer", "className": "_User", "objectId": "u1"},
            "due": {"__type": "Date", "iso": "2024-01-01T00:00:00.000Z"},
            "tags": [{"__type": "Date", "iso": "2024-01-02T00:00:00.000Z"}],
        });
        let plain = TypedJsonCodec.encode(typed.clone(), EncodeMode::Plain);
        assert_eq!(plain, json!({
            "owner": {"objectId": "u1"},
            "due": "2024-01-01T00:00:00.000Z",
            "tags": ["2024-01-02T00:00:00.000Z"],
        }));
        assert_eq!(TypedJsonCodec.encode(typed.clone(), EncodeMode::FullyTyped), typed);
    }
}
