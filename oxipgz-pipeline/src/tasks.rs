//! Ordered task pipeline: a worker pool feeding an ordered result collector.

use crate::results::{DrainCompleted, OrderedResultCollector, SlotHandle};
use crate::workers::{DisposeOptions, WorkerPool, WorkerTask, panic_message};
use oxipgz_core::{PgzError, Result};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, enabled, warn, Level};

/// Runs tasks on a worker pool and yields their results in submission order.
///
/// At most `capacity` results are in flight or waiting to be drained, so a
/// producer calling [`submit`](Self::submit) is throttled by the consumer.
pub struct OrderedTaskPipeline<R: Send + 'static> {
    pool: WorkerPool,
    collector: Arc<OrderedResultCollector<Result<R>>>,
}

impl<R: Send + 'static> OrderedTaskPipeline<R> {
    /// Create a pipeline with `threads` workers and `capacity` result slots.
    pub fn new(threads: usize, capacity: usize, recheck: Duration) -> Result<Self> {
        Ok(Self {
            collector: Arc::new(OrderedResultCollector::new(capacity, recheck)?),
            pool: WorkerPool::new(threads)?,
        })
    }

    /// Reserve the next result slot and schedule `work` to fill it.
    ///
    /// Blocks while the pipeline is at capacity. Fails once
    /// [`finish`](Self::finish) has been called.
    pub fn submit<F>(&self, id: impl Into<String>, work: F) -> Result<()>
    where
        F: FnOnce() -> Result<R> + Send + 'static,
    {
        let slot = self.collector.reserve_slot()?;
        let task = PipelineTask {
            id: id.into(),
            work: Some(work),
            slot: Some(slot),
        };
        self.pool.submit(Box::new(task))
    }

    /// Results in submission order. Each task's failure is yielded in its
    /// position.
    ///
    /// The sequence ends after [`finish`](Self::finish) once every submitted
    /// task has been yielded. Only one drain may be started.
    pub fn results(&self) -> Result<DrainCompleted<'_, Result<R>>> {
        self.collector.drain_completed()
    }

    /// Stop accepting tasks. Already submitted tasks still produce results.
    pub fn finish(&self) {
        self.collector.close();
    }

    /// Tasks waiting for a worker.
    pub fn queued(&self) -> usize {
        self.pool.queued()
    }

    /// Tasks currently executing.
    pub fn in_progress(&self) -> usize {
        self.pool.in_progress()
    }

    /// Finish the pipeline and stop its workers.
    ///
    /// Tasks that never ran complete their slots with
    /// [`PgzError::TaskCancelled`]. Results already produced stay drainable.
    pub fn dispose(&mut self, options: DisposeOptions) -> bool {
        self.finish();
        self.pool.dispose(options)
    }
}

impl<R: Send + 'static> std::fmt::Debug for OrderedTaskPipeline<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderedTaskPipeline")
            .field("pool", &self.pool)
            .field("collector", &self.collector)
            .finish()
    }
}

/// Pool task that fills its result slot exactly once, even if dropped unrun.
struct PipelineTask<R, F> {
    id: String,
    work: Option<F>,
    slot: Option<SlotHandle<Result<R>>>,
}

impl<R, F> WorkerTask for PipelineTask<R, F>
where
    R: Send + 'static,
    F: FnOnce() -> Result<R> + Send + 'static,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn run(mut self: Box<Self>) {
        let (Some(work), Some(slot)) = (self.work.take(), self.slot.take()) else {
            return;
        };

        let started = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|payload| {
            Err(PgzError::task_panicked(
                self.id.clone(),
                panic_message(payload.as_ref()),
            ))
        });

        if let Err(err) = &outcome {
            warn!(task = %self.id, error = %err, "task failed");
        } else if enabled!(Level::DEBUG) {
            debug!(task = %self.id, elapsed = ?started.elapsed(), "task finished");
        }
        slot.complete(outcome);
    }
}

impl<R, F> Drop for PipelineTask<R, F> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.complete(Err(PgzError::task_cancelled(self.id.clone())));
        }
    }
}
