use crate::sink::TelemetrySink;
use std::sync::Arc;
use tellus_codec::Encoder;
use tellus_model::Telemetry;
use tellus_types::{SharedErrorHandler, TelemetryResult};

/// Receives finished entities for delivery.
///
/// Implementations never block the caller indefinitely and never return
/// delivery failures to it.
pub trait Dispatcher: Send + Sync {
    fn send_telemetry(&self, entity: Box<dyn Telemetry>);
}

/// Encodes and delivers on the calling thread.
pub struct DirectDispatcher {
    encoder: Arc<dyn Encoder>,
    sink: Arc<dyn TelemetrySink>,
    handler: SharedErrorHandler,
}

impl DirectDispatcher {
    pub fn new(
        encoder: Arc<dyn Encoder>,
        sink: Arc<dyn TelemetrySink>,
        handler: SharedErrorHandler,
    ) -> Self {
        Self {
            encoder,
            sink,
            handler,
        }
    }

    /// Encodes and delivers one entity, returning the failure if any.
    pub fn deliver(&self, entity: &dyn Telemetry) -> TelemetryResult<()> {
        let payload = self.encoder.encode(entity)?;
        self.sink.deliver(&payload)
    }
}

impl Dispatcher for DirectDispatcher {
    fn send_telemetry(&self, entity: Box<dyn Telemetry>) {
        if let Err(e) = self.deliver(entity.as_ref()) {
            self.handler.on_error(&e);
        }
    }
}
