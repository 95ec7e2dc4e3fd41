//! Registry of entity kinds, bean types and wire field keys.
//!
//! The registry is assembled once at startup through `&mut self`
//! registration calls and then shared read-only (typically behind an
//! `Arc`). Lookups never fail loudly: an unknown tag or key simply yields
//! `None` and the caller takes its fallback path.

use crate::exec::{Session, Transaction};
use crate::fields::{tag, CORE_NAMESPACE, STANDARD_FIELDS};
use crate::subtyped::{Event, State};
use crate::telemetry::Telemetry;
use std::collections::HashMap;
use tellus_types::Bean;

/// Constructs the zero value of an entity kind.
pub type KindFactory = fn() -> Box<dyn Telemetry>;

/// Constructs the zero value of a bean type.
pub type BeanFactory = fn() -> Box<dyn Bean>;

/// What a wire tag resolved to.
#[derive(Clone, Copy)]
pub enum Resolution {
    Kind(KindFactory),
    Bean(BeanFactory),
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolution::Kind(_) => f.write_str("Resolution::Kind"),
            Resolution::Bean(_) => f.write_str("Resolution::Bean"),
        }
    }
}

/// Bidirectional kind ↔ tag and field ↔ wire-key tables plus the namespace
/// search path used to resolve tags that are not registered kind tags.
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    tag_to_kind: HashMap<String, KindFactory>,
    kind_to_tag: HashMap<String, String>,
    qualified: HashMap<String, Resolution>,
    field_to_wire: HashMap<String, String>,
    wire_to_field: HashMap<String, String>,
    bean_types: HashMap<String, String>,
    namespaces: Vec<String>,
}

fn new_session() -> Box<dyn Telemetry> {
    Box::new(Session::new())
}

fn new_transaction() -> Box<dyn Telemetry> {
    Box::new(Transaction::new())
}

fn new_event() -> Box<dyn Telemetry> {
    Box::new(Event::new())
}

fn new_state() -> Box<dyn Telemetry> {
    Box::new(State::new())
}

/// Last `::`-separated segment of a qualified name.
fn simple_name(qualified: &str) -> &str {
    qualified.rsplit("::").next().unwrap_or(qualified)
}

/// Everything before the last `::`, if any.
fn namespace_of(qualified: &str) -> Option<&str> {
    qualified.rsplit_once("::").map(|(ns, _)| ns)
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in kinds and field keys.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry
            .register_kind("tellus::Session", tag::SESSION, new_session)
            .register_kind("tellus::Transaction", tag::TRANSACTION, new_transaction)
            .register_kind("tellus::Event", tag::EVENT, new_event)
            .register_kind("tellus::State", tag::STATE, new_state)
            .add_search_namespace(CORE_NAMESPACE);
        for (internal, wire) in STANDARD_FIELDS {
            registry.register_field_mapping(internal, wire);
        }
        registry
    }

    /// Registers an entity kind under its qualified name and wire tag.
    ///
    /// The last segment of `qualified_name` must equal the kind's
    /// [`Telemetry::kind_name`]; the encoder uses it to find the tag.
    pub fn register_kind(
        &mut self,
        qualified_name: &str,
        wire_tag: &str,
        factory: KindFactory,
    ) -> &mut Self {
        self.tag_to_kind.insert(wire_tag.to_string(), factory);
        self.kind_to_tag
            .insert(simple_name(qualified_name).to_string(), wire_tag.to_string());
        self.qualified
            .insert(qualified_name.to_string(), Resolution::Kind(factory));
        self
    }

    /// Registers a compact wire key for a well-known field.
    pub fn register_field_mapping(&mut self, internal: &str, wire_key: &str) -> &mut Self {
        self.field_to_wire
            .insert(internal.to_string(), wire_key.to_string());
        self.wire_to_field
            .insert(wire_key.to_string(), internal.to_string());
        self
    }

    /// Registers a bean type so its values encode as structured objects.
    ///
    /// The namespace of `qualified_name` joins the search path, so the
    /// simple name written on the wire resolves back to this type.
    pub fn register_bean_type(&mut self, qualified_name: &str, factory: BeanFactory) -> &mut Self {
        self.bean_types.insert(
            simple_name(qualified_name).to_string(),
            qualified_name.to_string(),
        );
        self.qualified
            .insert(qualified_name.to_string(), Resolution::Bean(factory));
        if let Some(ns) = namespace_of(qualified_name) {
            self.add_search_namespace(ns);
        }
        self
    }

    /// Appends a namespace to the search path. Duplicates are ignored.
    pub fn add_search_namespace(&mut self, namespace: &str) -> &mut Self {
        if !self.namespaces.iter().any(|n| n == namespace) {
            self.namespaces.push(namespace.to_string());
        }
        self
    }

    pub fn kind_for_tag(&self, wire_tag: &str) -> Option<KindFactory> {
        self.tag_to_kind.get(wire_tag).copied()
    }

    pub fn tag_for_kind(&self, kind_name: &str) -> Option<&str> {
        self.kind_to_tag.get(kind_name).map(String::as_str)
    }

    pub fn wire_key(&self, internal: &str) -> Option<&str> {
        self.field_to_wire.get(internal).map(String::as_str)
    }

    pub fn field_name(&self, wire_key: &str) -> Option<&str> {
        self.wire_to_field.get(wire_key).map(String::as_str)
    }

    pub fn is_bean_type(&self, bean_type: &str) -> bool {
        self.bean_types.contains_key(bean_type)
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    /// Resolves a wire tag: kind tag table first, then the tag taken as a
    /// qualified name, then `<namespace>::<tag>` for each search namespace
    /// in registration order. First match wins.
    pub fn resolve(&self, wire_tag: &str) -> Option<Resolution> {
        if let Some(factory) = self.kind_for_tag(wire_tag) {
            return Some(Resolution::Kind(factory));
        }
        if let Some(found) = self.qualified.get(wire_tag) {
            return Some(*found);
        }
        self.namespaces
            .iter()
            .find_map(|ns| self.qualified.get(&format!("{ns}::{wire_tag}")).copied())
    }
}
