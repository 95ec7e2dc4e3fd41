use crate::fields::field;
use crate::info::EntityInfo;
use crate::telemetry::{attach, Container, Telemetry};
use std::any::Any;
use tellus_types::{FieldError, Value};
use tracing::trace;

/// Fallback record for nodes whose wire tag resolves to no known kind.
///
/// Identity, timestamp and parent are parsed into the entity header when
/// they can be; every field, those three included, is also kept in the
/// extension map under its internal name so nothing on the wire is lost.
/// Children are preserved.
#[derive(Debug)]
pub struct GenericRecord {
    kind: String,
    info: EntityInfo,
    children: Vec<Box<dyn Telemetry>>,
}

impl GenericRecord {
    /// Creates an empty record for the unresolved wire tag `kind`.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            info: EntityInfo::new(),
            children: Vec::new(),
        }
    }
}

impl Telemetry for GenericRecord {
    fn kind_name(&self) -> &str {
        &self.kind
    }

    fn info(&self) -> &EntityInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut EntityInfo {
        &mut self.info
    }

    /// Never fails. A header field that does not parse keeps its generated
    /// value and survives only as an extension.
    fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldError> {
        if matches!(name, field::ENTITY_ID | field::TIMESTAMP | field::PARENT_ID) {
            if let Err(e) = self.info.set_field(name, value.clone()) {
                trace!(kind = %self.kind, error = %e, "generic record header left unparsed");
            }
        }
        self.info.set_extension(name, value);
        Ok(())
    }

    fn as_container(&self) -> Option<&dyn Container> {
        Some(self)
    }

    fn as_container_mut(&mut self) -> Option<&mut dyn Container> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Container for GenericRecord {
    fn add_child(&mut self, child: Box<dyn Telemetry>) {
        attach(self.info.entity_id(), &mut self.children, child);
    }

    fn children(&self) -> &[Box<dyn Telemetry>] {
        &self.children
    }
}
