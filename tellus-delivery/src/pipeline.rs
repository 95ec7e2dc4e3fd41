//! Bounded queue plus worker pool.
//!
//! Producers call [`DeliveryPipeline::submit`], which never waits for
//! queue space: the entity is queued, or the [`OverflowPolicy`] applies.
//! Workers are plain threads sharing one receiver. Each takes the next
//! entity, encodes it and hands the bytes to the sink. Ordering holds
//! within a worker only.

use crate::config::{DeliveryConfig, OverflowPolicy};
use crate::dispatch::Dispatcher;
use crate::sink::TelemetrySink;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use tellus_codec::Encoder;
use tellus_model::Telemetry;
use tellus_types::{SharedErrorHandler, TelemetryError, TelemetryResult};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, trace, warn};

type Job = Box<dyn Telemetry>;

/// What happened to a submitted entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Waiting for a worker.
    Queued,
    /// Queue full under [`OverflowPolicy::Discard`]; the entity was dropped.
    Discarded,
    /// Queue full under [`OverflowPolicy::CallerRuns`]; delivery was
    /// attempted on the submitting thread.
    RanOnCaller,
    /// The pipeline was shut down; the entity was dropped.
    Closed,
}

/// Snapshot of the pipeline counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub queued: u64,
    pub delivered: u64,
    pub discarded: u64,
    pub caller_runs: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    queued: AtomicU64,
    delivered: AtomicU64,
    discarded: AtomicU64,
    caller_runs: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> DeliveryStats {
        DeliveryStats {
            queued: self.queued.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            caller_runs: self.caller_runs.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Everything a delivery needs, shared by workers and callers.
struct Shared {
    encoder: Arc<dyn Encoder>,
    sink: Arc<dyn TelemetrySink>,
    handler: SharedErrorHandler,
    counters: Counters,
}

impl Shared {
    fn deliver(&self, entity: &dyn Telemetry) {
        let result = self
            .encoder
            .encode(entity)
            .and_then(|payload| self.sink.deliver(&payload));
        match result {
            Ok(()) => {
                self.counters.delivered.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                self.handler.on_error(&e);
            }
        }
    }

    fn report(&self, error: TelemetryError) {
        self.handler.on_error(&error);
    }
}

/// Asynchronous delivery through a bounded queue and a worker pool.
pub struct DeliveryPipeline {
    sender: RwLock<Option<mpsc::Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    shared: Arc<Shared>,
    overflow: OverflowPolicy,
}

impl DeliveryPipeline {
    /// Creates the queue and spawns the workers.
    pub fn start(
        config: DeliveryConfig,
        encoder: Arc<dyn Encoder>,
        sink: Arc<dyn TelemetrySink>,
        handler: SharedErrorHandler,
    ) -> TelemetryResult<Self> {
        let capacity = config.queue_capacity.max(1);
        let worker_count = config.workers.max(1);
        let (sender, receiver) = mpsc::channel::<Job>(capacity);
        let receiver = Arc::new(Mutex::new(receiver));
        let shared = Arc::new(Shared {
            encoder,
            sink,
            handler,
            counters: Counters::default(),
        });

        let mut workers = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let name = format!("{}-{index}", config.thread_name_prefix);
            let receiver = Arc::clone(&receiver);
            let shared = Arc::clone(&shared);
            let handle = thread::Builder::new()
                .name(name)
                .spawn(move || run_worker(receiver, shared))?;
            workers.push(handle);
        }
        debug!(
            workers = worker_count,
            capacity,
            overflow = ?config.overflow,
            "delivery pipeline started"
        );

        Ok(Self {
            sender: RwLock::new(Some(sender)),
            workers: Mutex::new(workers),
            shared,
            overflow: config.overflow,
        })
    }

    /// Offers an entity to the queue without waiting.
    pub fn submit(&self, entity: Box<dyn Telemetry>) -> Admission {
        let guard = match self.sender.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let Some(sender) = guard.as_ref() else {
            self.shared.report(TelemetryError::QueueClosed);
            return Admission::Closed;
        };

        match sender.try_send(entity) {
            Ok(()) => {
                self.shared.counters.queued.fetch_add(1, Ordering::Relaxed);
                Admission::Queued
            }
            Err(TrySendError::Full(entity)) => match self.overflow {
                OverflowPolicy::Discard => {
                    self.shared.counters.discarded.fetch_add(1, Ordering::Relaxed);
                    trace!(entity_id = %entity.entity_id(), "delivery queue full, discarding");
                    Admission::Discarded
                }
                OverflowPolicy::CallerRuns => {
                    drop(guard);
                    self.shared.counters.caller_runs.fetch_add(1, Ordering::Relaxed);
                    trace!(entity_id = %entity.entity_id(), "delivery queue full, running on caller");
                    self.shared.deliver(entity.as_ref());
                    Admission::RanOnCaller
                }
            },
            Err(TrySendError::Closed(_)) => {
                self.shared.report(TelemetryError::QueueClosed);
                Admission::Closed
            }
        }
    }

    pub fn stats(&self) -> DeliveryStats {
        self.shared.counters.snapshot()
    }

    /// Closes the queue, lets the workers drain it, and joins them.
    ///
    /// Later submissions are dropped with [`Admission::Closed`]. Calling
    /// this more than once is harmless.
    pub fn shutdown(&self) {
        let sender = match self.sender.write() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if sender.is_none() {
            return;
        }
        drop(sender);

        let workers = match self.workers.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for handle in workers {
            if handle.join().is_err() {
                warn!("delivery worker panicked");
            }
        }
        debug!(stats = ?self.stats(), "delivery pipeline stopped");
    }
}

impl Dispatcher for DeliveryPipeline {
    fn send_telemetry(&self, entity: Box<dyn Telemetry>) {
        self.submit(entity);
    }
}

impl Drop for DeliveryPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(receiver: Arc<Mutex<mpsc::Receiver<Job>>>, shared: Arc<Shared>) {
    trace!("delivery worker started");
    loop {
        // The lock is held only while waiting; delivery runs unlocked.
        let job = match receiver.lock() {
            Ok(mut rx) => rx.blocking_recv(),
            Err(poisoned) => poisoned.into_inner().blocking_recv(),
        };
        let Some(entity) = job else {
            break;
        };
        shared.deliver(entity.as_ref());
    }
    trace!("delivery worker stopped");
}
