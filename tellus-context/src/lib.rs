//! Execution context for tellus.
//!
//! A [`TelemetryContext`] keeps the stack of open containers for one flow
//! of control: the session at the bottom, nested transactions above it.
//! Events and states are recorded under whatever is on top. Ending the
//! session ships the whole tree to a
//! [`Dispatcher`](tellus_delivery::Dispatcher) and opens a fresh session.
//!
//! A context is not shared between threads; use one per request or worker.

mod config;
mod context;

pub use config::{ContextConfig, FALLBACK_REPORTING_NODE, PROCESS_ID_ENV};
pub use context::TelemetryContext;
