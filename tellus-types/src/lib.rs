//! Core type definitions for tellus.
//!
//! This crate defines the vocabulary shared by every other tellus crate:
//! - Entity identifiers (random UUIDs) and wall-clock timestamps
//! - Completion status of execution containers
//! - Extension values, the [`Bean`] capability and typed wire conversion
//! - The error taxonomy and the pluggable error callback
//!
//! Entity records themselves live in `tellus-model`.

mod error;
mod ids;
mod status;
mod timestamp;
mod value;

pub use error::{
    default_error_handler, ErrorHandler, FieldError, LogErrorHandler, SharedErrorHandler,
    StackImbalance, TelemetryError, TelemetryResult,
};
pub use ids::EntityId;
pub use status::{CompletionStatus, ParseStatusError};
pub use timestamp::Timestamp;
pub use value::{Bean, FromWire, Value};
