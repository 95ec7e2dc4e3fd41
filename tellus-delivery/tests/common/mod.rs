//! Shared test helpers for delivery tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tellus_codec::{Encoder, JsonEncoder};
use tellus_delivery::mock::MemorySink;
use tellus_delivery::TelemetrySink;
use tellus_model::TypeRegistry;
use tellus_types::{SharedErrorHandler, TelemetryError, TelemetryResult};

pub fn encoder() -> Arc<dyn Encoder> {
    Arc::new(JsonEncoder::new(Arc::new(TypeRegistry::standard())))
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

/// A sink whose first delivery blocks until [`GatedSink::open`] is called.
///
/// Later deliveries pass straight through, so a caller-run delivery never
/// waits on the gate.
#[derive(Default)]
pub struct GatedSink {
    pub inner: MemorySink,
    open: Mutex<bool>,
    cond: Condvar,
    entered: AtomicUsize,
}

impl GatedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.cond.notify_all();
    }

    /// Waits until the first delivery is parked on the gate.
    pub fn wait_until_blocked(&self) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.entered.load(Ordering::SeqCst) == 0 {
            assert!(Instant::now() < deadline, "no delivery reached the gate");
            thread::sleep(Duration::from_millis(1));
        }
    }
}

impl TelemetrySink for GatedSink {
    fn deliver(&self, payload: &[u8]) -> TelemetryResult<()> {
        if self.entered.fetch_add(1, Ordering::SeqCst) == 0 {
            let mut open = self.open.lock().unwrap();
            while !*open {
                open = self.cond.wait(open).unwrap();
            }
        }
        self.inner.deliver(payload)
    }
}
