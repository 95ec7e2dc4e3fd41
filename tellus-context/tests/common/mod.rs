//! Shared test helpers for context tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};
use tellus_codec::JsonEncoder;
use tellus_context::ContextConfig;
use tellus_delivery::mock::MemorySink;
use tellus_delivery::{DirectDispatcher, Dispatcher};
use tellus_model::{Telemetry, TypeRegistry};
use tellus_types::{default_error_handler, SharedErrorHandler, TelemetryError};

static TRACING: Once = Once::new();

/// Installs a test-writer subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Keeps every dispatched entity for structural inspection.
#[derive(Default)]
pub struct CapturingDispatcher {
    sent: Mutex<Vec<Box<dyn Telemetry>>>,
}

impl CapturingDispatcher {
    pub fn len(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Removes and returns everything dispatched so far.
    pub fn take(&self) -> Vec<Box<dyn Telemetry>> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
}

impl Dispatcher for CapturingDispatcher {
    fn send_telemetry(&self, entity: Box<dyn Telemetry>) {
        self.sent.lock().unwrap().push(entity);
    }
}

/// Encodes synchronously into an in-memory sink.
pub fn json_dispatcher() -> (Arc<dyn Dispatcher>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let encoder = Arc::new(JsonEncoder::new(Arc::new(TypeRegistry::standard())));
    let dispatcher = DirectDispatcher::new(encoder, sink.clone(), default_error_handler());
    (Arc::new(dispatcher), sink)
}

/// Parses every payload the sink has seen.
pub fn delivered_json(sink: &MemorySink) -> Vec<serde_json::Value> {
    sink.payloads()
        .iter()
        .map(|p| serde_json::from_slice(p).unwrap())
        .collect()
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

pub fn test_config() -> ContextConfig {
    ContextConfig {
        operation_name: Some("checkout".to_string()),
        reporting_node: Some("node-a".to_string()),
        process_id: Some(77),
    }
}
