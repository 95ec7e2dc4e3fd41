//! Delivery of encoded telemetry to a sink.
//!
//! - [`TelemetrySink`]: where encoded payloads end up (a transport, a file)
//! - [`Dispatcher`]: what the execution context hands finished entities to
//! - [`DeliveryPipeline`]: bounded queue plus worker threads, with an
//!   [`OverflowPolicy`] deciding what happens when the queue is full
//! - [`DirectDispatcher`]: encode and deliver on the calling thread
//!
//! Delivery is best-effort. Failures go to the configured error handler
//! and never reach the producer.

mod config;
mod dispatch;
mod pipeline;
mod sink;

pub use config::{DeliveryConfig, OverflowPolicy};
pub use dispatch::{Dispatcher, DirectDispatcher};
pub use pipeline::{Admission, DeliveryPipeline, DeliveryStats};
pub use sink::{mock, TelemetrySink, WriterSink};
