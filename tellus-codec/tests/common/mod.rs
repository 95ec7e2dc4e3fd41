//! Shared test helpers for codec tests.

#![allow(dead_code)]

use std::fmt;
use std::sync::{Arc, Mutex};
use tellus_model::TypeRegistry;
use tellus_types::{Bean, FieldError, FromWire, SharedErrorHandler, TelemetryError, Value};

/// A small registered bean type.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Bean for Point {
    fn bean_type(&self) -> &'static str {
        "Point"
    }

    fn properties(&self) -> Vec<(String, Value)> {
        vec![("x".into(), self.x.into()), ("y".into(), self.y.into())]
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), FieldError> {
        match name {
            "x" => self.x = i64::from_wire(name, value)?,
            "y" => self.y = i64::from_wire(name, value)?,
            other => return Err(FieldError::Missing(other.to_string())),
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn new_point() -> Box<dyn Bean> {
    Box::new(Point::default())
}

/// Standard registry plus `geo::Point`.
pub fn registry() -> Arc<TypeRegistry> {
    let mut registry = TypeRegistry::standard();
    registry.register_bean_type("geo::Point", new_point);
    Arc::new(registry)
}

/// An error handler that records the display text of every report.
pub fn recording_handler() -> (SharedErrorHandler, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let handler: SharedErrorHandler = Arc::new(move |e: &TelemetryError| {
        sink.lock().unwrap().push(e.to_string());
    });
    (handler, seen)
}

pub fn point(x: i64, y: i64) -> Value {
    let bean: Arc<dyn Bean> = Arc::new(Point { x, y });
    Value::Bean(bean)
}
