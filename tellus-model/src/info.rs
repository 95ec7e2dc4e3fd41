use crate::fields::field;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Write as _;
use tellus_types::{EntityId, FieldError, FromWire, Timestamp, Value};

/// Fields every telemetry entity carries, plus its open extension map.
///
/// Only the identifier and timestamp are always present. Everything an
/// application attaches beyond the well-known fields goes into the
/// extension map and passes through the codec unmapped.
#[derive(Debug, Clone)]
pub struct EntityInfo {
    entity_id: EntityId,
    timestamp: Timestamp,
    parent_id: Option<EntityId>,
    reporting_node: Option<String>,
    execution_context: Option<String>,
    message: Option<String>,
    extensions: BTreeMap<String, Value>,
}

impl EntityInfo {
    /// Creates a root entity with fresh identity, stamped now.
    pub fn new() -> Self {
        Self {
            entity_id: EntityId::new(),
            timestamp: Timestamp::now(),
            parent_id: None,
            reporting_node: None,
            execution_context: None,
            message: None,
            extensions: BTreeMap::new(),
        }
    }

    /// Creates an entity linked to a logical parent.
    ///
    /// The link is identity-only; the entity is not nested anywhere.
    pub fn with_parent(parent: EntityId) -> Self {
        Self {
            parent_id: Some(parent),
            ..Self::new()
        }
    }

    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn parent_id(&self) -> Option<EntityId> {
        self.parent_id
    }

    /// Links this entity to `parent` unless it already has a parent.
    ///
    /// Returns whether the link was applied.
    pub fn link_parent(&mut self, parent: EntityId) -> bool {
        if self.parent_id.is_some() {
            return false;
        }
        self.parent_id = Some(parent);
        true
    }

    pub fn reporting_node(&self) -> Option<&str> {
        self.reporting_node.as_deref()
    }

    pub fn set_reporting_node(&mut self, node: impl Into<String>) {
        self.reporting_node = Some(node.into());
    }

    pub fn execution_context(&self) -> Option<&str> {
        self.execution_context.as_deref()
    }

    pub fn set_execution_context(&mut self, context: impl Into<String>) {
        self.execution_context = Some(context.into());
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    /// Stores an error and its source chain as the message, one cause per line.
    pub fn set_error_as_message(&mut self, error: &dyn Error) {
        let mut text = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            let _ = write!(text, "\ncaused by: {cause}");
            source = cause.source();
        }
        self.message = Some(text);
    }

    pub fn extensions(&self) -> &BTreeMap<String, Value> {
        &self.extensions
    }

    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }

    /// Sets an application extension field, returning any previous value.
    pub fn set_extension(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.extensions.insert(key.into(), value.into())
    }

    pub fn remove_extension(&mut self, key: &str) -> Option<Value> {
        self.extensions.remove(key)
    }

    /// Present well-known fields as internal name → value.
    pub fn fields(&self) -> Vec<(&'static str, Value)> {
        let mut out = vec![
            (field::ENTITY_ID, Value::Text(self.entity_id.to_string())),
            (field::TIMESTAMP, Value::from(self.timestamp.as_millis())),
        ];
        if let Some(parent) = self.parent_id {
            out.push((field::PARENT_ID, Value::Text(parent.to_string())));
        }
        if let Some(node) = &self.reporting_node {
            out.push((field::REPORTING_NODE, Value::Text(node.clone())));
        }
        if let Some(ctx) = &self.execution_context {
            out.push((field::EXECUTION_CONTEXT, Value::Text(ctx.clone())));
        }
        if let Some(msg) = &self.message {
            out.push((field::MESSAGE, Value::Text(msg.clone())));
        }
        out
    }

    /// Sets a field by internal name.
    ///
    /// This is the decode path, so it may overwrite identity and parent.
    /// Names that are not well-known become extension fields.
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldError> {
        match name {
            field::ENTITY_ID => self.entity_id = EntityId::from_wire(name, value)?,
            field::TIMESTAMP => self.timestamp = Timestamp::from_wire(name, value)?,
            field::PARENT_ID => self.parent_id = Some(EntityId::from_wire(name, value)?),
            field::REPORTING_NODE => self.reporting_node = Some(String::from_wire(name, value)?),
            field::EXECUTION_CONTEXT => {
                self.execution_context = Some(String::from_wire(name, value)?)
            }
            field::MESSAGE => self.message = Some(String::from_wire(name, value)?),
            _ => {
                self.extensions.insert(name.to_string(), value);
            }
        }
        Ok(())
    }
}

impl Default for EntityInfo {
    fn default() -> Self {
        Self::new()
    }
}
