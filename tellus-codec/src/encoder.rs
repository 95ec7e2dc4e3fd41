use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use tellus_model::{field, wire, Telemetry, TypeRegistry};
use tellus_types::{EntityId, TelemetryResult, Value};

/// Turns an entity graph into a wire payload.
///
/// Implementations hold no per-call mutable state and may be shared by
/// every delivery worker.
pub trait Encoder: Send + Sync {
    fn encode(&self, entity: &dyn Telemetry) -> TelemetryResult<Vec<u8>>;
}

/// JSON encoder driven by a [`TypeRegistry`].
#[derive(Debug, Clone)]
pub struct JsonEncoder {
    registry: Arc<TypeRegistry>,
}

impl JsonEncoder {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Encodes `entity` and its children into a JSON tree.
    pub fn encode_value(&self, entity: &dyn Telemetry) -> JsonValue {
        JsonValue::Object(self.encode_node(entity, None))
    }

    /// Depth-first, pre-order. `container` is the id of the enclosing node,
    /// `None` at the root.
    fn encode_node(&self, entity: &dyn Telemetry, container: Option<EntityId>) -> Map<String, JsonValue> {
        let mut obj = Map::new();
        let kind = entity.kind_name();
        let tag = self.registry.tag_for_kind(kind).unwrap_or(kind);
        obj.insert(wire::TYPE.to_string(), JsonValue::String(tag.to_string()));

        // Nesting already says who the parent is.
        let implicit_parent = container.is_some() && entity.parent_id() == container;

        let info = entity.info();
        for (name, value) in info.fields().into_iter().chain(entity.typed_fields()) {
            if implicit_parent && name == field::PARENT_ID {
                continue;
            }
            obj.insert(self.wire_key(name), self.encode_field(&value));
        }
        let container_text = container.map(|id| JsonValue::String(id.to_string()));
        for (name, value) in info.extensions() {
            let encoded = self.encode_field(value);
            if implicit_parent && name == field::PARENT_ID && container_text.as_ref() == Some(&encoded) {
                continue;
            }
            let key = self.wire_key(name);
            if needs_escape(name, &key) {
                obj.insert(escaped(name), encoded);
                continue;
            }
            match obj.get(&key) {
                None => {
                    obj.insert(key, encoded);
                }
                // Same text as the field it shadows, which is how a generic
                // record mirrors its header.
                Some(existing) if *existing == encoded => {}
                Some(_) => {
                    obj.insert(escaped(name), encoded);
                }
            }
        }

        if let Some(children) = entity.as_container().map(|c| c.children()) {
            if !children.is_empty() {
                let id = entity.entity_id();
                let encoded = children
                    .iter()
                    .map(|child| JsonValue::Object(self.encode_node(child.as_ref(), Some(id))))
                    .collect();
                obj.insert(wire::CHILD.to_string(), JsonValue::Array(encoded));
            }
        }
        obj
    }

    fn wire_key(&self, name: &str) -> String {
        self.registry.wire_key(name).unwrap_or(name).to_string()
    }

    fn encode_field(&self, value: &Value) -> JsonValue {
        match value {
            Value::Text(s) => JsonValue::String(s.clone()),
            Value::Array(items) => {
                JsonValue::Array(items.iter().map(|v| self.encode_field(v)).collect())
            }
            Value::Bean(bean) if self.registry.is_bean_type(bean.bean_type()) => {
                let mut obj = Map::new();
                obj.insert(
                    wire::TYPE.to_string(),
                    JsonValue::String(bean.bean_type().to_string()),
                );
                for (name, prop) in bean.properties() {
                    obj.insert(name, self.encode_field(&prop));
                }
                JsonValue::Object(obj)
            }
            other => JsonValue::String(other.to_string()),
        }
    }
}

/// Extension keys that would read back as something else.
fn needs_escape(name: &str, key: &str) -> bool {
    key == wire::TYPE || key == wire::CHILD || name.starts_with(wire::ESCAPE)
}

/// `~name`: decoded verbatim into the extension map.
fn escaped(name: &str) -> String {
    format!("{}{name}", wire::ESCAPE)
}

impl Encoder for JsonEncoder {
    fn encode(&self, entity: &dyn Telemetry) -> TelemetryResult<Vec<u8>> {
        Ok(serde_json::to_vec(&self.encode_value(entity))?)
    }
}
