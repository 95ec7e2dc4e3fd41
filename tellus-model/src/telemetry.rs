use crate::info::EntityInfo;
use std::any::Any;
use std::fmt;
use tellus_types::{EntityId, FieldError, Timestamp, Value};

/// A telemetry artifact: anything that can be captured, linked into the
/// containment graph and shipped.
///
/// Concrete kinds expose their well-known fields through
/// [`typed_fields`](Telemetry::typed_fields) and accept them back through
/// [`set_field`](Telemetry::set_field); the codec needs nothing else.
pub trait Telemetry: Any + Send + fmt::Debug {
    /// Runtime type name. Registered kinds map it to a wire tag.
    fn kind_name(&self) -> &str;

    fn info(&self) -> &EntityInfo;

    fn info_mut(&mut self) -> &mut EntityInfo;

    /// Kind-specific fields that are present, as internal name → value.
    /// The common [`EntityInfo`] fields are not included.
    fn typed_fields(&self) -> Vec<(&'static str, Value)> {
        Vec::new()
    }

    /// Sets a field by internal name. Unknown names land in the extension map.
    fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldError> {
        self.info_mut().set_field(name, value)
    }

    fn as_container(&self) -> Option<&dyn Container> {
        None
    }

    fn as_container_mut(&mut self) -> Option<&mut dyn Container> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn entity_id(&self) -> EntityId {
        self.info().entity_id()
    }

    fn parent_id(&self) -> Option<EntityId> {
        self.info().parent_id()
    }

    fn timestamp(&self) -> Timestamp {
        self.info().timestamp()
    }

    fn message(&self) -> Option<&str> {
        self.info().message()
    }

    fn set_message(&mut self, message: &str) {
        self.info_mut().set_message(message);
    }

    fn extension(&self, key: &str) -> Option<&Value> {
        self.info().extension(key)
    }

    fn set_extension(&mut self, key: &str, value: Value) -> Option<Value> {
        self.info_mut().set_extension(key, value)
    }
}

impl dyn Telemetry {
    pub fn is<T: Telemetry>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Telemetry>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Telemetry>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Two records are the same logical entity iff their identifiers match.
    pub fn same_entity(&self, other: &dyn Telemetry) -> bool {
        self.entity_id() == other.entity_id()
    }
}

/// Capability of owning child entities.
pub trait Container {
    /// Takes ownership of `child` and links it to this container.
    ///
    /// A child that already declares a logical parent keeps it.
    fn add_child(&mut self, child: Box<dyn Telemetry>);

    /// Children in insertion order.
    fn children(&self) -> &[Box<dyn Telemetry>];
}

/// Shared `add_child` body for containers that hold a plain child vector.
pub(crate) fn attach(
    owner: EntityId,
    children: &mut Vec<Box<dyn Telemetry>>,
    mut child: Box<dyn Telemetry>,
) {
    child.info_mut().link_parent(owner);
    children.push(child);
}
