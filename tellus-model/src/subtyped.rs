//! Point-in-time records qualified by an application-defined subtype.

use crate::fields::field;
use crate::info::EntityInfo;
use crate::telemetry::Telemetry;
use std::any::Any;
use std::ops::{Deref, DerefMut};
use tellus_types::{EntityId, FieldError, FromWire, Value};

/// Entity fields plus the application-chosen subtype.
#[derive(Debug, Clone, Default)]
pub struct SubTypedInfo {
    info: EntityInfo,
    subtype: Option<String>,
}

impl SubTypedInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: EntityId) -> Self {
        Self {
            info: EntityInfo::with_parent(parent),
            subtype: None,
        }
    }

    pub fn info(&self) -> &EntityInfo {
        &self.info
    }

    pub fn info_mut(&mut self) -> &mut EntityInfo {
        &mut self.info
    }

    pub fn subtype(&self) -> Option<&str> {
        self.subtype.as_deref()
    }

    pub fn set_subtype(&mut self, subtype: impl Into<String>) {
        self.subtype = Some(subtype.into());
    }

    fn typed_fields(&self) -> Vec<(&'static str, Value)> {
        self.subtype
            .iter()
            .map(|s| (field::SUBTYPE, Value::Text(s.clone())))
            .collect()
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldError> {
        if name == field::SUBTYPE {
            self.subtype = Some(String::from_wire(name, value)?);
            Ok(())
        } else {
            self.info.set_field(name, value)
        }
    }
}

/// Something that happened at a point in time.
#[derive(Debug, Clone, Default)]
pub struct Event {
    inner: SubTypedInfo,
}

/// A fact or snapshot observed at a point in time.
#[derive(Debug, Clone, Default)]
pub struct State {
    inner: SubTypedInfo,
}

macro_rules! subtyped_kind {
    ($kind:ident, $name:literal) => {
        impl $kind {
            pub fn new() -> Self {
                Self::default()
            }

            /// Creates a record with the given subtype.
            pub fn typed(subtype: impl Into<String>) -> Self {
                let mut record = Self::default();
                record.inner.set_subtype(subtype);
                record
            }

            /// Creates a record linked to a logical parent without nesting it.
            pub fn with_parent(parent: EntityId) -> Self {
                Self {
                    inner: SubTypedInfo::with_parent(parent),
                }
            }
        }

        impl Deref for $kind {
            type Target = SubTypedInfo;

            fn deref(&self) -> &SubTypedInfo {
                &self.inner
            }
        }

        impl DerefMut for $kind {
            fn deref_mut(&mut self) -> &mut SubTypedInfo {
                &mut self.inner
            }
        }

        impl PartialEq for $kind {
            fn eq(&self, other: &Self) -> bool {
                self.inner.info.entity_id() == other.inner.info.entity_id()
            }
        }

        impl Telemetry for $kind {
            fn kind_name(&self) -> &str {
                $name
            }

            fn info(&self) -> &EntityInfo {
                &self.inner.info
            }

            fn info_mut(&mut self) -> &mut EntityInfo {
                &mut self.inner.info
            }

            fn typed_fields(&self) -> Vec<(&'static str, Value)> {
                self.inner.typed_fields()
            }

            fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldError> {
                self.inner.set_field(name, value)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }
    };
}

subtyped_kind!(Event, "Event");
subtyped_kind!(State, "State");
