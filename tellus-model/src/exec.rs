//! Execution containers: sessions and transactions.
//!
//! An [`ExecInfo`] times a unit of work from construction to
//! [`complete`](ExecInfo::complete) and owns the entities recorded inside it.

use crate::fields::field;
use crate::info::EntityInfo;
use crate::telemetry::{attach, Container, Telemetry};
use std::any::Any;
use std::ops::{Deref, DerefMut};
use std::time::Instant;
use tellus_types::{CompletionStatus, EntityId, FieldError, FromWire, Value};

/// State shared by every execution container.
#[derive(Debug)]
pub struct ExecInfo {
    info: EntityInfo,
    duration_nanos: Option<u64>,
    operation_name: Option<String>,
    status: Option<CompletionStatus>,
    children: Vec<Box<dyn Telemetry>>,
    started: Instant,
}

impl ExecInfo {
    pub fn new() -> Self {
        Self::from_info(EntityInfo::new())
    }

    pub fn with_parent(parent: EntityId) -> Self {
        Self::from_info(EntityInfo::with_parent(parent))
    }

    fn from_info(info: EntityInfo) -> Self {
        Self {
            info,
            duration_nanos: None,
            operation_name: None,
            status: None,
            children: Vec::new(),
            started: Instant::now(),
        }
    }

    pub fn info(&self) -> &EntityInfo {
        &self.info
    }

    pub fn info_mut(&mut self) -> &mut EntityInfo {
        &mut self.info
    }

    pub fn duration_nanos(&self) -> Option<u64> {
        self.duration_nanos
    }

    pub fn set_duration_nanos(&mut self, nanos: u64) {
        self.duration_nanos = Some(nanos);
    }

    pub fn operation_name(&self) -> Option<&str> {
        self.operation_name.as_deref()
    }

    pub fn set_operation_name(&mut self, name: impl Into<String>) {
        self.operation_name = Some(name.into());
    }

    pub fn status(&self) -> Option<CompletionStatus> {
        self.status
    }

    pub fn set_status(&mut self, status: CompletionStatus) {
        self.status = Some(status);
    }

    /// Restarts the duration clock.
    pub fn start_timer(&mut self) {
        self.started = Instant::now();
    }

    /// Records the elapsed time since construction (or the last
    /// [`start_timer`](Self::start_timer)) and defaults the status to
    /// `Unknown`. A later call overwrites the duration.
    pub fn complete(&mut self) {
        let elapsed = self.started.elapsed().as_nanos();
        self.duration_nanos = Some(u64::try_from(elapsed).unwrap_or(u64::MAX));
        if self.status.is_none() {
            self.status = Some(CompletionStatus::Unknown);
        }
    }

    pub fn children(&self) -> &[Box<dyn Telemetry>] {
        &self.children
    }

    pub fn add_child(&mut self, child: Box<dyn Telemetry>) {
        attach(self.info.entity_id(), &mut self.children, child);
    }

    /// Adds a child and hands back a typed reference to it.
    pub fn adopt<T: Telemetry>(&mut self, child: T) -> &mut T {
        self.add_child(Box::new(child));
        self.children
            .last_mut()
            .and_then(|c| c.as_any_mut().downcast_mut::<T>())
            .expect("child was pushed just above")
    }

    /// Duration, operation name and status, when present. Container kinds
    /// built on `ExecInfo` forward their [`Telemetry::typed_fields`] here.
    pub fn typed_fields(&self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        if let Some(nanos) = self.duration_nanos {
            out.push((field::DURATION, Value::from(nanos)));
        }
        if let Some(name) = &self.operation_name {
            out.push((field::OPERATION_NAME, Value::Text(name.clone())));
        }
        if let Some(status) = self.status {
            out.push((field::STATUS, Value::Text(status.to_string())));
        }
        out
    }

    /// Counterpart of [`typed_fields`](Self::typed_fields); anything else
    /// goes to the entity header.
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldError> {
        match name {
            field::DURATION => self.duration_nanos = Some(u64::from_wire(name, value)?),
            field::OPERATION_NAME => self.operation_name = Some(String::from_wire(name, value)?),
            field::STATUS => self.status = Some(CompletionStatus::from_wire(name, value)?),
            _ => return self.info.set_field(name, value),
        }
        Ok(())
    }
}

impl Default for ExecInfo {
    fn default() -> Self {
        Self::new()
    }
}

/// A timed container that can sit on an execution stack.
///
/// Sessions and transactions implement it; so can application kinds built
/// around their own [`ExecInfo`].
pub trait Execution: Telemetry + Container {
    fn exec(&self) -> &ExecInfo;

    fn exec_mut(&mut self) -> &mut ExecInfo;
}

/// Root container: one per logical unit of application activity.
#[derive(Debug, Default)]
pub struct Session {
    exec: ExecInfo,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Deref for Session {
    type Target = ExecInfo;

    fn deref(&self) -> &ExecInfo {
        &self.exec
    }
}

impl DerefMut for Session {
    fn deref_mut(&mut self) -> &mut ExecInfo {
        &mut self.exec
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.exec.info.entity_id() == other.exec.info.entity_id()
    }
}

impl Telemetry for Session {
    fn kind_name(&self) -> &str {
        "Session"
    }

    fn info(&self) -> &EntityInfo {
        &self.exec.info
    }

    fn info_mut(&mut self) -> &mut EntityInfo {
        &mut self.exec.info
    }

    fn typed_fields(&self) -> Vec<(&'static str, Value)> {
        self.exec.typed_fields()
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldError> {
        self.exec.set_field(name, value)
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

impl Container for Session {
    fn add_child(&mut self, child: Box<dyn Telemetry>) {
        self.exec.add_child(child);
    }

    fn children(&self) -> &[Box<dyn Telemetry>] {
        self.exec.children()
    }
}

impl Execution for Session {
    fn exec(&self) -> &ExecInfo {
        &self.exec
    }

    fn exec_mut(&mut self) -> &mut ExecInfo {
        &mut self.exec
    }
}

/// Nested container for one operation against a resource.
#[derive(Debug, Default)]
pub struct Transaction {
    exec: ExecInfo,
    resource_id: Option<String>,
    parameters: Option<Vec<Value>>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: EntityId) -> Self {
        Self {
            exec: ExecInfo::with_parent(parent),
            ..Self::default()
        }
    }

    pub fn resource_id(&self) -> Option<&str> {
        self.resource_id.as_deref()
    }

    pub fn set_resource_id(&mut self, resource: impl Into<String>) {
        self.resource_id = Some(resource.into());
    }

    pub fn parameters(&self) -> Option<&[Value]> {
        self.parameters.as_deref()
    }

    pub fn set_parameters<T: Into<Value>>(&mut self, params: impl IntoIterator<Item = T>) {
        self.parameters = Some(params.into_iter().map(Into::into).collect());
    }
}

impl Deref for Transaction {
    type Target = ExecInfo;

    fn deref(&self) -> &ExecInfo {
        &self.exec
    }
}

impl DerefMut for Transaction {
    fn deref_mut(&mut self) -> &mut ExecInfo {
        &mut self.exec
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.exec.info.entity_id() == other.exec.info.entity_id()
    }
}

impl Telemetry for Transaction {
    fn kind_name(&self) -> &str {
        "Transaction"
    }

    fn info(&self) -> &EntityInfo {
        &self.exec.info
    }

    fn info_mut(&mut self) -> &mut EntityInfo {
        &mut self.exec.info
    }

    fn typed_fields(&self) -> Vec<(&'static str, Value)> {
        let mut out = self.exec.typed_fields();
        if let Some(resource) = &self.resource_id {
            out.push((field::RESOURCE_ID, Value::Text(resource.clone())));
        }
        if let Some(params) = &self.parameters {
            out.push((field::PARAMETERS, Value::Array(params.clone())));
        }
        out
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldError> {
        match name {
            field::RESOURCE_ID => self.resource_id = Some(String::from_wire(name, value)?),
            field::PARAMETERS => self.parameters = Some(Vec::<Value>::from_wire(name, value)?),
            _ => return self.exec.set_field(name, value),
        }
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

impl Container for Transaction {
    fn add_child(&mut self, child: Box<dyn Telemetry>) {
        self.exec.add_child(child);
    }

    fn children(&self) -> &[Box<dyn Telemetry>] {
        self.exec.children()
    }
}

impl Execution for Transaction {
    fn exec(&self) -> &ExecInfo {
        &self.exec
    }

    fn exec_mut(&mut self) -> &mut ExecInfo {
        &mut self.exec
    }
}
