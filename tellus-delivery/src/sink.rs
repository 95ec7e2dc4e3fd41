//! Sink abstraction.
//!
//! A sink receives finished payloads from every delivery worker at once,
//! so implementations must be safe to call concurrently.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use tellus_types::{TelemetryError, TelemetryResult};

/// Destination for encoded telemetry payloads.
pub trait TelemetrySink: Send + Sync {
    /// Delivers one encoded payload. Failures are not retried.
    fn deliver(&self, payload: &[u8]) -> TelemetryResult<()>;
}

/// Writes each payload followed by a newline to any [`Write`].
///
/// The output of a file written this way can be read back with
/// `JsonDecoder::decode_stream`.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl WriterSink<File> {
    /// Opens `path` for appending, creating it if needed.
    pub fn append_file(path: impl AsRef<Path>) -> TelemetryResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write + Send> TelemetrySink for WriterSink<W> {
    fn deliver(&self, payload: &[u8]) -> TelemetryResult<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| TelemetryError::Sink("writer lock poisoned".to_string()))?;
        writer.write_all(payload)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// An in-memory sink for testing.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    /// One payload as the sink saw it.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Delivery {
        pub payload: Vec<u8>,
        /// Name of the thread that called `deliver`.
        pub thread: Option<String>,
    }

    /// Records every payload it is handed.
    #[derive(Debug, Default)]
    pub struct MemorySink {
        deliveries: Mutex<Vec<Delivery>>,
        failing: AtomicBool,
    }

    impl MemorySink {
        pub fn new() -> Self {
            Self::default()
        }

        /// Creates a sink whose every delivery fails.
        pub fn failing() -> Self {
            let sink = Self::default();
            sink.set_failing(true);
            sink
        }

        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn deliveries(&self) -> Vec<Delivery> {
            self.deliveries
                .lock()
                .map(|d| d.clone())
                .unwrap_or_default()
        }

        pub fn payloads(&self) -> Vec<Vec<u8>> {
            self.deliveries().into_iter().map(|d| d.payload).collect()
        }

        pub fn len(&self) -> usize {
            self.deliveries.lock().map(|d| d.len()).unwrap_or(0)
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    impl TelemetrySink for MemorySink {
        fn deliver(&self, payload: &[u8]) -> TelemetryResult<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(TelemetryError::Sink("mock sink is failing".to_string()));
            }
            let delivery = Delivery {
                payload: payload.to_vec(),
                thread: thread::current().name().map(str::to_owned),
            };
            self.deliveries
                .lock()
                .map_err(|_| TelemetryError::Sink("mock sink lock poisoned".to_string()))?
                .push(delivery);
            Ok(())
        }
    }
}
