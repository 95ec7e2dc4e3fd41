use serde_json::{Deserializer, Map, Value as JsonValue};
use std::collections::HashMap;
use std::sync::Arc;
use tellus_model::{wire, GenericRecord, Resolution, Telemetry, TypeRegistry};
use tellus_types::{
    default_error_handler, SharedErrorHandler, TelemetryError, TelemetryResult, Value,
};
use tracing::{debug, trace};

/// JSON decoder that rebuilds typed entity graphs.
///
/// Structural problems inside a payload (unknown tags, unsettable fields,
/// unparseable values) are reported to the error handler and decoding goes
/// on with the next field or sibling. Only a payload that is not a JSON
/// object at all fails the whole decode.
///
/// Tag resolutions, hits and misses alike, are cached for the lifetime of
/// the decoder. Use one decoder per thread.
pub struct JsonDecoder {
    registry: Arc<TypeRegistry>,
    handler: SharedErrorHandler,
    cache: HashMap<String, Option<Resolution>>,
}

impl JsonDecoder {
    /// Creates a decoder that logs structural problems.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self::with_error_handler(registry, default_error_handler())
    }

    pub fn with_error_handler(registry: Arc<TypeRegistry>, handler: SharedErrorHandler) -> Self {
        Self {
            registry,
            handler,
            cache: HashMap::new(),
        }
    }

    /// Decodes a single payload.
    pub fn decode(&mut self, payload: &[u8]) -> TelemetryResult<Box<dyn Telemetry>> {
        match serde_json::from_slice::<JsonValue>(payload) {
            Ok(value) => self.decode_value(&value),
            Err(e) => Err(self.report(e.into())),
        }
    }

    /// Decodes a concatenation of payloads, such as a file written by a
    /// writer sink.
    ///
    /// A payload that is valid JSON but not an object yields an error in its
    /// slot and decoding continues. A syntax error ends the stream.
    pub fn decode_stream(&mut self, payload: &[u8]) -> Vec<TelemetryResult<Box<dyn Telemetry>>> {
        let mut out = Vec::new();
        for item in Deserializer::from_slice(payload).into_iter::<JsonValue>() {
            match item {
                Ok(value) => out.push(self.decode_value(&value)),
                Err(e) => {
                    out.push(Err(self.report(e.into())));
                    break;
                }
            }
        }
        out
    }

    /// Decodes an already parsed JSON tree.
    pub fn decode_value(&mut self, value: &JsonValue) -> TelemetryResult<Box<dyn Telemetry>> {
        match value {
            JsonValue::Object(obj) => Ok(self.decode_node(obj)),
            other => Err(self.report(TelemetryError::Codec(format!(
                "expected an object at the root, found {}",
                json_kind(other)
            )))),
        }
    }

    fn decode_node(&mut self, obj: &Map<String, JsonValue>) -> Box<dyn Telemetry> {
        let mut node = self.instantiate(obj);
        let target = node.kind_name().to_string();
        let registry = Arc::clone(&self.registry);

        // Fields first: identity must be in place before children link to it.
        for (key, raw) in obj {
            if key == wire::TYPE || key == wire::CHILD {
                continue;
            }
            let Some(value) = self.field_value(raw) else {
                continue;
            };
            if let Some(name) = key.strip_prefix(wire::ESCAPE) {
                node.info_mut().set_extension(name, value);
                continue;
            }
            let name = registry.field_name(key).unwrap_or(key);
            if let Err(e) = node.set_field(name, value) {
                self.report(e.into_telemetry(&target));
            }
        }

        match obj.get(wire::CHILD) {
            None | Some(JsonValue::Null) => {}
            Some(JsonValue::Array(children)) => {
                for raw in children {
                    let JsonValue::Object(child_obj) = raw else {
                        self.report(TelemetryError::Codec(format!(
                            "child of {target} is {}, not an object",
                            json_kind(raw)
                        )));
                        continue;
                    };
                    let child = self.decode_node(child_obj);
                    match node.as_container_mut() {
                        Some(container) => container.add_child(child),
                        None => {
                            self.report(TelemetryError::MissingProperty {
                                name: wire::CHILD.to_string(),
                                target: target.clone(),
                            });
                        }
                    }
                }
            }
            Some(other) => {
                self.report(TelemetryError::Codec(format!(
                    "{} of {target} is {}, not an array",
                    wire::CHILD,
                    json_kind(other)
                )));
            }
        }
        node
    }

    /// Builds the zero value for the node's tag, or a generic record.
    fn instantiate(&mut self, obj: &Map<String, JsonValue>) -> Box<dyn Telemetry> {
        let Some(tag) = obj.get(wire::TYPE).and_then(JsonValue::as_str) else {
            self.report(TelemetryError::MissingProperty {
                name: wire::TYPE.to_string(),
                target: "entity".to_string(),
            });
            return Box::new(GenericRecord::new(""));
        };
        match self.resolve(tag) {
            Some(Resolution::Kind(factory)) => factory(),
            _ => {
                debug!(tag, "decoding unresolved tag as a generic record");
                self.report(TelemetryError::UnknownType {
                    tag: tag.to_string(),
                });
                Box::new(GenericRecord::new(tag))
            }
        }
    }

    /// Converts a wire value into a field value. `None` means "skip".
    fn field_value(&mut self, raw: &JsonValue) -> Option<Value> {
        match raw {
            JsonValue::Null => None,
            JsonValue::String(s) => Some(Value::Text(s.clone())),
            JsonValue::Bool(b) => Some(Value::Text(b.to_string())),
            JsonValue::Number(n) => Some(Value::Text(n.to_string())),
            JsonValue::Array(items) => Some(Value::Array(
                items.iter().filter_map(|item| self.field_value(item)).collect(),
            )),
            JsonValue::Object(obj) => self.decode_bean(obj),
        }
    }

    fn decode_bean(&mut self, obj: &Map<String, JsonValue>) -> Option<Value> {
        let tag = obj.get(wire::TYPE).and_then(JsonValue::as_str).unwrap_or_default();
        let Some(Resolution::Bean(factory)) = self.resolve(tag) else {
            self.report(TelemetryError::UnknownType {
                tag: tag.to_string(),
            });
            return None;
        };
        let mut bean = factory();
        for (key, raw) in obj {
            if key == wire::TYPE {
                continue;
            }
            let Some(value) = self.field_value(raw) else {
                continue;
            };
            if let Err(e) = bean.set_property(key, value) {
                self.report(e.into_telemetry(tag));
            }
        }
        Some(Value::Bean(Arc::from(bean)))
    }

    fn resolve(&mut self, tag: &str) -> Option<Resolution> {
        if let Some(cached) = self.cache.get(tag) {
            return *cached;
        }
        let found = self.registry.resolve(tag);
        if found.is_none() {
            trace!(tag, "type tag did not resolve");
        }
        self.cache.insert(tag.to_string(), found);
        found
    }

    fn report(&self, error: TelemetryError) -> TelemetryError {
        self.handler.on_error(&error);
        error
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
