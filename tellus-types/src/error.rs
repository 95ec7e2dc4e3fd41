//! Error taxonomy and the error callback.
//!
//! Telemetry failures are local to one item and never cross into the
//! instrumented application's control flow. Every failure is handed to an
//! [`ErrorHandler`]; operations that return a value also return it as a
//! typed [`TelemetryError`].

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Errors raised anywhere in the capture, encode and delivery path.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Begin/end calls on the execution context did not balance.
    #[error("stack imbalance: {0}")]
    StackImbalance(StackImbalance),

    /// A wire type tag resolved to no registered kind or bean type.
    #[error("unknown type: {tag}")]
    UnknownType { tag: String },

    /// A decoded field has no settable slot on its target.
    #[error("missing property {name:?} on {target}")]
    MissingProperty { name: String, target: String },

    /// A decoded field could not be converted to its declared type.
    #[error("invalid value for {field:?}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// Malformed wire input.
    #[error("codec error: {0}")]
    Codec(String),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The sink failed to deliver a payload.
    #[error("sink error: {0}")]
    Sink(String),

    /// The delivery queue was shut down before the item was accepted.
    #[error("delivery queue closed")]
    QueueClosed,
}

/// The two ways the container stack can be unbalanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackImbalance {
    /// `end_transaction` with only the session open.
    UnmatchedEnd,
    /// `end_session` found transactions still open and closed them.
    DanglingTransactions { count: usize },
}

impl fmt::Display for StackImbalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackImbalance::UnmatchedEnd => f.write_str("end_transaction with no open transaction"),
            StackImbalance::DanglingTransactions { count } => {
                write!(f, "{count} transaction(s) still open at end_session")
            }
        }
    }
}

/// Failure of a single structural setter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("no settable field {0:?}")]
    Missing(String),

    #[error("invalid value for {field:?}: {reason}")]
    Invalid { field: String, reason: String },
}

impl FieldError {
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        FieldError::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Lifts this setter failure into the crate-wide taxonomy.
    pub fn into_telemetry(self, target: &str) -> TelemetryError {
        match self {
            FieldError::Missing(name) => TelemetryError::MissingProperty {
                name,
                target: target.to_string(),
            },
            FieldError::Invalid { field, reason } => TelemetryError::InvalidValue { field, reason },
        }
    }
}

/// Receives every failure in the telemetry path.
///
/// Handlers are called from producer threads and delivery workers alike and
/// must not panic.
pub trait ErrorHandler: Send + Sync {
    fn on_error(&self, error: &TelemetryError);
}

impl<F> ErrorHandler for F
where
    F: Fn(&TelemetryError) + Send + Sync,
{
    fn on_error(&self, error: &TelemetryError) {
        self(error)
    }
}

/// Default handler: logs the failure and moves on.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogErrorHandler;

impl ErrorHandler for LogErrorHandler {
    fn on_error(&self, error: &TelemetryError) {
        tracing::warn!(%error, "telemetry failure");
    }
}

/// Shared handle to an error handler.
pub type SharedErrorHandler = Arc<dyn ErrorHandler>;

/// Returns the default, logging, error handler.
pub fn default_error_handler() -> SharedErrorHandler {
    Arc::new(LogErrorHandler)
}
