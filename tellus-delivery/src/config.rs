//! Configuration for the delivery pipeline.

use serde::{Deserialize, Serialize};

/// Default number of delivery worker threads.
pub const DEFAULT_WORKERS: usize = 2;

/// Default maximum number of entities waiting for a worker.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// What `submit` does when the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Drop the new entity.
    #[default]
    Discard,
    /// Encode and deliver the new entity on the submitting thread.
    CallerRuns,
}

/// Configuration for [`DeliveryPipeline`](crate::DeliveryPipeline).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Worker thread count. Zero is treated as one.
    pub workers: usize,
    /// Queue capacity. Zero is treated as one.
    pub queue_capacity: usize,
    pub overflow: OverflowPolicy,
    /// Workers are named `<prefix>-<index>`.
    pub thread_name_prefix: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            overflow: OverflowPolicy::Discard,
            thread_name_prefix: "tellus-delivery".to_string(),
        }
    }
}
